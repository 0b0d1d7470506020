use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use stratus_cleanup::{CleanupError, HandlerInvoker};

use crate::{AwsClient, AwsResponse, Request, uri_encode};

const SERVICE: &str = "lambda";
const API_VERSION: &str = "2015-03-31";

/// Header set when the invoked function itself failed.
pub const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionErrorDocument {
    error_message: Option<String>,
    error_type: Option<String>,
}

/// A [`HandlerInvoker`] calling functions through the regional Invoke API.
#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: AwsClient,
}

impl LambdaInvoker {
    /// An invoker sending requests through `client`.
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HandlerInvoker for LambdaInvoker {
    async fn invoke(&self, function: &str, payload: String) -> Result<String, CleanupError> {
        let request = invoke_request(self.client.config().endpoint(SERVICE), function, payload);
        let response = self
            .client
            .send(SERVICE, request)
            .await
            .map_err(|error| CleanupError::Invocation {
                function: function.to_string(),
                reason: error.to_string(),
            })?;

        invocation_outcome(function, response)
    }
}

fn invoke_request(host: String, function: &str, payload: String) -> Request {
    let path = format!(
        "/{API_VERSION}/functions/{}/invocations",
        uri_encode(function, true)
    );
    Request::new(Method::POST, host, path)
        .with_header("x-amz-invocation-type", "RequestResponse")
        .with_body(payload)
}

/// The response document of a successful invocation, or the reason it
/// failed.
fn invocation_outcome(function: &str, response: AwsResponse) -> Result<String, CleanupError> {
    let failed = |reason: String| CleanupError::Invocation {
        function: function.to_string(),
        reason,
    };

    if !response.is_success() {
        return Err(failed(format!("HTTP {}: {}", response.status, response.body)));
    }
    if response.header(FUNCTION_ERROR_HEADER).is_some() {
        let reason = match serde_json::from_str::<FunctionErrorDocument>(&response.body) {
            Ok(FunctionErrorDocument {
                error_message: Some(message),
                error_type,
            }) => match error_type {
                Some(error_type) => format!("{error_type}: {message}"),
                None => message,
            },
            _ => response.body,
        };
        return Err(failed(reason));
    }
    Ok(response.body)
}
