use thiserror::Error;

use crate::ContentKind;

/// Failures reported by a [`ContentStore`](crate::ContentStore).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The container does not exist (any more).
    #[error("Container '{0}' not found")]
    NotFound(String),

    /// The caller lacks permission for the operation.
    #[error("Access denied to '{container}' during {operation}")]
    AccessDenied {
        /// Container the operation targeted.
        container: String,
        /// Operation that was refused.
        operation: String,
    },

    /// The store could not be reached or failed transiently.
    #[error("Store unavailable for '{container}': {reason}")]
    Unavailable {
        /// Container the operation targeted.
        container: String,
        /// What went wrong.
        reason: String,
    },
}

/// Failures while handling a cleanup invocation.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// The request document could not be parsed.
    #[error("Invalid cleanup request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// A required resource property was not supplied.
    #[error("Missing resource property '{0}'")]
    MissingProperty(&'static str),

    /// A resource property had the wrong shape.
    #[error("Invalid resource property '{key}': {reason}")]
    InvalidProperty {
        /// The property key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The request names a kind the handler was not deployed for.
    #[error("Handler empties {expected} resources, request targets a {found}")]
    KindMismatch {
        /// Kind served by the handler's store.
        expected: ContentKind,
        /// Kind named by the request.
        found: ContentKind,
    },

    /// A required environment variable is unset or empty.
    #[error("Environment variable '{0}' is not set")]
    MissingEnvironment(&'static str),

    /// The forwarded invocation of a handler function failed.
    #[error("Invocation of '{function}' failed: {reason}")]
    Invocation {
        /// Function that was invoked.
        function: String,
        /// What the invoker or the function reported.
        reason: String,
    },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CleanupError {
    /// True for failures that a redelivery of the same event may fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, CleanupError::Store(StoreError::Unavailable { .. }))
    }
}
