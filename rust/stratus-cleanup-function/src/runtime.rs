//! Client for the function runtime interface: fetch the next invocation,
//! answer it, or report a failure.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::FunctionError;

/// Environment variable holding the runtime interface address.
pub const RUNTIME_API_ENV_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

/// Header carrying the id of the invocation being delivered.
pub const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";

const API_VERSION: &str = "2018-06-01";

/// One delivered invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Id to answer under.
    pub request_id: String,
    /// The raw event document.
    pub payload: String,
}

/// Something that answers invocations.
#[async_trait]
pub trait InvocationHandler: Send + Sync {
    /// Handle `payload` and return the response document.
    async fn handle(&self, payload: &str) -> Result<String, FunctionError>;
}

/// The `{errorMessage, errorType}` document reported for a failure.
pub fn error_document(failure: &FunctionError) -> Value {
    json!({
        "errorMessage": failure.to_string(),
        "errorType": failure.error_type(),
    })
}

/// Talks to the runtime interface of the current execution environment.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    http: reqwest::Client,
    base: String,
}

impl RuntimeClient {
    /// A client for the interface listening at `api` (`host:port`).
    pub fn new(api: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("http://{api}/{API_VERSION}/runtime"),
        }
    }

    /// A client for the interface named by `AWS_LAMBDA_RUNTIME_API`.
    pub fn from_env() -> Result<Self, FunctionError> {
        let api = std::env::var(RUNTIME_API_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(FunctionError::MissingEnvironment(RUNTIME_API_ENV_VAR))?;
        Ok(Self::new(api.trim()))
    }

    fn next_url(&self) -> String {
        format!("{}/invocation/next", self.base)
    }

    fn response_url(&self, request_id: &str) -> String {
        format!("{}/invocation/{request_id}/response", self.base)
    }

    fn error_url(&self, request_id: &str) -> String {
        format!("{}/invocation/{request_id}/error", self.base)
    }

    fn init_error_url(&self) -> String {
        format!("{}/init/error", self.base)
    }

    /// Block until the next invocation arrives.
    pub async fn next(&self) -> Result<Invocation, FunctionError> {
        let response = self.http.get(self.next_url()).send().await?;
        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let payload = response.text().await?;

        if !status.is_success() {
            return Err(FunctionError::Runtime {
                status: status.as_u16(),
                body: payload,
            });
        }
        let request_id = request_id.ok_or(FunctionError::MissingHeader(REQUEST_ID_HEADER))?;
        Ok(Invocation {
            request_id,
            payload,
        })
    }

    /// Answer invocation `request_id` with `body`.
    pub async fn respond(&self, request_id: &str, body: String) -> Result<(), FunctionError> {
        self.post(self.response_url(request_id), body).await
    }

    /// Report that invocation `request_id` failed.
    pub async fn fail(
        &self,
        request_id: &str,
        failure: &FunctionError,
    ) -> Result<(), FunctionError> {
        self.post(self.error_url(request_id), error_document(failure).to_string())
            .await
    }

    /// Report that the function could not start.
    pub async fn fail_init(&self, failure: &FunctionError) -> Result<(), FunctionError> {
        self.post(self.init_error_url(), error_document(failure).to_string())
            .await
    }

    async fn post(&self, url: String, body: String) -> Result<(), FunctionError> {
        let response = self.http.post(url).body(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FunctionError::Runtime {
                status: status.as_u16(),
                body: response.text().await?,
            })
        }
    }

    /// Answer invocations with `handler` until the interface fails.
    pub async fn serve<H>(&self, handler: &H) -> Result<(), FunctionError>
    where
        H: InvocationHandler + ?Sized,
    {
        loop {
            let invocation = self.next().await?;
            info!(request_id = %invocation.request_id, "invocation received");

            match handler.handle(&invocation.payload).await {
                Ok(body) => self.respond(&invocation.request_id, body).await?,
                Err(failure) => {
                    error!(
                        request_id = %invocation.request_id,
                        error = %failure,
                        "invocation failed"
                    );
                    self.fail(&invocation.request_id, &failure).await?;
                }
            }
        }
    }
}
