use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{Cleanup, CleanupError, CleanupReport, CleanupTarget};

/// Environment variable naming the handler function a router forwards to.
pub const HANDLER_FUNCTION_ENV_VAR: &str = "STRATUS_CLEANUP_HANDLER";

/// Synchronous invocation of a named function with a JSON payload.
#[async_trait]
pub trait HandlerInvoker: Send + Sync {
    /// Invoke `function` with `payload` and return its response document.
    async fn invoke(&self, function: &str, payload: String) -> Result<String, CleanupError>;
}

/// A [`Cleanup`] that forwards every target to a handler function.
///
/// The target travels as JSON and the handler answers with a serialized
/// [`CleanupReport`], see [`serve_invocation`].
#[derive(Debug, Clone)]
pub struct RemoteCleanup<I> {
    function: String,
    invoker: I,
}

impl<I> RemoteCleanup<I>
where
    I: HandlerInvoker,
{
    /// Forward to `function` through `invoker`.
    pub fn new(function: impl Into<String>, invoker: I) -> Self {
        Self {
            function: function.into(),
            invoker,
        }
    }

    /// Forward to the function named by `STRATUS_CLEANUP_HANDLER`.
    pub fn from_env(invoker: I) -> Result<Self, CleanupError> {
        Self::from_lookup(|key| std::env::var(key).ok(), invoker)
    }

    /// Like [`RemoteCleanup::from_env`], reading variables through `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        invoker: I,
    ) -> Result<Self, CleanupError> {
        let function = lookup(HANDLER_FUNCTION_ENV_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(CleanupError::MissingEnvironment(HANDLER_FUNCTION_ENV_VAR))?;
        Ok(Self::new(function, invoker))
    }

    /// The handler function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The underlying invoker.
    pub fn invoker(&self) -> &I {
        &self.invoker
    }
}

#[async_trait]
impl<I> Cleanup for RemoteCleanup<I>
where
    I: HandlerInvoker,
{
    async fn empty(&self, target: &CleanupTarget) -> Result<CleanupReport, CleanupError> {
        let payload = serde_json::to_string(target)?;
        debug!(function = %self.function, container = %target.name, "forwarding to handler");

        let response = self.invoker.invoke(&self.function, payload).await?;
        Ok(serde_json::from_str(&response)?)
    }
}

/// Handle one forwarded invocation: parse the target, empty it with
/// `cleanup` and serialize the report.
pub async fn serve_invocation<C>(cleanup: &C, payload: &str) -> Result<String, CleanupError>
where
    C: Cleanup + ?Sized,
{
    let target: CleanupTarget = serde_json::from_str(payload).inspect_err(|parse_error| {
        warn!(error = %parse_error, "rejecting malformed handler payload");
    })?;
    let report = cleanup.empty(&target).await?;
    Ok(serde_json::to_string(&report)?)
}

/// A [`HandlerInvoker`] that serves one function name in process.
///
/// Clones share the invocation log.
#[derive(Debug, Clone)]
pub struct LocalInvoker<C> {
    function: String,
    cleanup: C,
    invocations: Arc<RwLock<Vec<String>>>,
}

impl<C> LocalInvoker<C>
where
    C: Cleanup,
{
    /// Serve invocations of `function` with `cleanup`.
    pub fn new(function: impl Into<String>, cleanup: C) -> Self {
        Self {
            function: function.into(),
            cleanup,
            invocations: Arc::default(),
        }
    }

    /// Payloads received so far, in order.
    pub async fn invocations(&self) -> Vec<String> {
        self.invocations.read().await.clone()
    }
}

#[async_trait]
impl<C> HandlerInvoker for LocalInvoker<C>
where
    C: Cleanup,
{
    async fn invoke(&self, function: &str, payload: String) -> Result<String, CleanupError> {
        if function != self.function {
            return Err(CleanupError::Invocation {
                function: function.to_string(),
                reason: "function not found".into(),
            });
        }
        self.invocations.write().await.push(payload.clone());

        serve_invocation(&self.cleanup, &payload)
            .await
            .map_err(|cleanup_error| CleanupError::Invocation {
                function: function.to_string(),
                reason: cleanup_error.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CleanupHandler, CleanupSettings, ContentKind, MemoryContentStore};
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_requires_the_handler_function_name() {
        let invoker = LocalInvoker::new("handler", NoopCleanup);

        let missing = RemoteCleanup::from_lookup(|_| None, invoker.clone());
        let blank = RemoteCleanup::from_lookup(|_| Some("  ".into()), invoker);

        assert!(matches!(
            missing,
            Err(CleanupError::MissingEnvironment(HANDLER_FUNCTION_ENV_VAR))
        ));
        assert!(blank.is_err());
    }

    #[tokio::test]
    async fn it_round_trips_targets_and_reports() -> TestResult {
        let store = MemoryContentStore::new(ContentKind::Bucket);
        store.insert("site", ["a", "b"]).await;
        let handler = CleanupHandler::new(store.clone(), CleanupSettings::default());
        let remote = RemoteCleanup::from_lookup(
            |key| (key == HANDLER_FUNCTION_ENV_VAR).then(|| "site-cleaner".to_string()),
            LocalInvoker::new("site-cleaner", handler),
        )?;

        let report = remote
            .empty(&CleanupTarget::new("site", ContentKind::Bucket))
            .await?;

        assert_eq!(report.deleted, 2);
        assert_eq!(
            remote.invoker().invocations().await,
            vec![r#"{"name":"site","kind":"bucket"}"#.to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_reports_handler_failures_as_invocation_errors() {
        let store = MemoryContentStore::new(ContentKind::Bucket);
        store.insert("site", ["a"]).await;
        store.deny_access("site").await;
        let handler = CleanupHandler::new(store, CleanupSettings::default());
        let remote = RemoteCleanup::new("site-cleaner", LocalInvoker::new("site-cleaner", handler));

        let result = remote
            .empty(&CleanupTarget::new("site", ContentKind::Bucket))
            .await;

        assert!(matches!(
            result,
            Err(CleanupError::Invocation { ref function, .. }) if function == "site-cleaner"
        ));
    }

    #[tokio::test]
    async fn it_rejects_malformed_payloads() {
        let result = serve_invocation(&NoopCleanup, r#"{"name":"site"}"#).await;

        assert!(matches!(result, Err(CleanupError::InvalidRequest(_))));
    }

    #[derive(Clone)]
    struct NoopCleanup;

    #[async_trait]
    impl Cleanup for NoopCleanup {
        async fn empty(&self, _: &CleanupTarget) -> Result<CleanupReport, CleanupError> {
            Ok(CleanupReport::default())
        }
    }
}
