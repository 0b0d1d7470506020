use chrono::Utc;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::{AwsConfig, FunctionError, Request, Signer};

/// A response read to the end.
#[derive(Debug, Clone)]
pub struct AwsResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: String,
}

impl AwsResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The value of header `name`, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Sends signed requests to regional service endpoints.
#[derive(Debug, Clone)]
pub struct AwsClient {
    http: reqwest::Client,
    config: AwsConfig,
}

impl AwsClient {
    /// A client signing with `config`.
    pub fn new(config: AwsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// A client configured from the function environment.
    pub fn from_env() -> Result<Self, FunctionError> {
        Ok(Self::new(AwsConfig::from_env()?))
    }

    /// Region and credentials in use.
    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    /// Sign `request` for `service` and send it.
    pub async fn send(
        &self,
        service: &str,
        request: Request,
    ) -> Result<AwsResponse, FunctionError> {
        let signer = Signer::new(&self.config.credentials, &self.config.region, service);
        let headers = signer.sign(&request, Utc::now())?;

        let mut builder = self.http.request(request.method.clone(), request.url());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        debug!(service, host = %request.host, status, "service call answered");
        Ok(AwsResponse {
            status,
            headers,
            body,
        })
    }
}
