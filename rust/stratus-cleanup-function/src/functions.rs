use async_trait::async_trait;
use stratus_cleanup::{Cleanup, CleanupRequest, Router, serve_invocation};
use tracing::{info, warn};

use crate::{FunctionError, InvocationHandler, ResourceEvent, ResourceReply};

/// Delivers a [`ResourceReply`] to the URL named by its event.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    /// Upload `reply` to `url`.
    async fn send(&self, url: &str, reply: &ResourceReply) -> Result<(), FunctionError>;
}

/// Uploads replies with a plain `PUT`. The URL is presigned for an empty
/// content type, so none is sent.
#[derive(Debug, Clone, Default)]
pub struct HttpReplyTransport {
    http: reqwest::Client,
}

impl HttpReplyTransport {
    /// A transport with its own connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReplyTransport for HttpReplyTransport {
    async fn send(&self, url: &str, reply: &ResourceReply) -> Result<(), FunctionError> {
        let body = serde_json::to_string(reply)?;
        let response = self.http.put(url).body(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FunctionError::Upload {
                status: status.as_u16(),
                body: response.text().await?,
            })
        }
    }
}

/// The router entry point: answers lifecycle events and uploads the
/// outcome, success or failure, to the event's response URL.
#[derive(Debug, Clone)]
pub struct RouterFunction<C, T> {
    router: Router<C>,
    transport: T,
}

impl<C, T> RouterFunction<C, T>
where
    C: Cleanup,
    T: ReplyTransport,
{
    /// Route events with `router` and upload replies through `transport`.
    pub fn new(router: Router<C>, transport: T) -> Self {
        Self { router, transport }
    }

    /// The reply for one event document.
    pub async fn reply(
        &self,
        payload: &str,
    ) -> Result<(ResourceEvent, ResourceReply), FunctionError> {
        let event: ResourceEvent = serde_json::from_str(payload)?;

        let outcome = match serde_json::from_str::<CleanupRequest>(payload) {
            Ok(request) => self.router.handle(&request).await,
            Err(parse_error) => Err(parse_error.into()),
        };
        let reply = ResourceReply::new(&event, outcome.as_ref().cloned());
        Ok((event, reply))
    }
}

#[async_trait]
impl<C, T> InvocationHandler for RouterFunction<C, T>
where
    C: Cleanup,
    T: ReplyTransport,
{
    async fn handle(&self, payload: &str) -> Result<String, FunctionError> {
        let (event, reply) = self.reply(payload).await?;
        info!(
            request_id = %event.request_id,
            status = ?reply.status,
            physical_resource_id = %reply.physical_resource_id,
            "uploading reply"
        );

        self.transport
            .send(&event.response_url, &reply)
            .await
            .inspect_err(|upload_error| {
                warn!(request_id = %event.request_id, error = %upload_error, "reply not delivered");
            })?;
        Ok(serde_json::to_string(&reply)?)
    }
}

/// The handler entry point: empties the target carried by each
/// invocation and answers with the report.
#[derive(Debug, Clone)]
pub struct HandlerFunction<C> {
    cleanup: C,
}

impl<C> HandlerFunction<C>
where
    C: Cleanup,
{
    /// Serve invocations with `cleanup`.
    pub fn new(cleanup: C) -> Self {
        Self { cleanup }
    }
}

#[async_trait]
impl<C> InvocationHandler for HandlerFunction<C>
where
    C: Cleanup,
{
    async fn handle(&self, payload: &str) -> Result<String, FunctionError> {
        Ok(serve_invocation(&self.cleanup, payload).await?)
    }
}
