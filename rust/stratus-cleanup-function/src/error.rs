use stratus_cleanup::CleanupError;
use thiserror::Error;

/// Failures of the function entry points and their service clients.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// A required environment variable is unset or empty.
    #[error("Environment variable '{0}' is not set")]
    MissingEnvironment(&'static str),

    /// An HTTP exchange failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The runtime interface answered with an unexpected status.
    #[error("Runtime interface answered {status}: {body}")]
    Runtime {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The orchestrator refused an uploaded reply.
    #[error("Reply upload answered {status}: {body}")]
    Upload {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// A response lacked a header the protocol requires.
    #[error("Response is missing header '{0}'")]
    MissingHeader(&'static str),

    /// The signing key could not be derived.
    #[error("Failed to sign request: {0}")]
    Signing(#[from] hmac::digest::InvalidLength),

    /// A JSON document could not be read or written.
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Cleanup failed.
    #[error(transparent)]
    Cleanup(#[from] CleanupError),
}

impl FunctionError {
    /// Short name reported as the `errorType` of a failed invocation.
    pub fn error_type(&self) -> &'static str {
        match self {
            FunctionError::MissingEnvironment(_) => "Configuration",
            FunctionError::Http(_) => "Http",
            FunctionError::Runtime { .. } => "Runtime",
            FunctionError::Upload { .. } => "Upload",
            FunctionError::MissingHeader(_) => "Protocol",
            FunctionError::Signing(_) => "Signing",
            FunctionError::Json(_) => "InvalidJson",
            FunctionError::Cleanup(_) => "Cleanup",
        }
    }
}
