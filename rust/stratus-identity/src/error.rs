use thiserror::Error;

/// Errors produced while parsing or resolving identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The string does not have the `arn:partition:service:region:account:resource` shape.
    #[error("Malformed ARN '{arn}': {reason}")]
    Malformed {
        /// The offending input.
        arn: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A token has no provisioned value yet.
    #[error("Token '${{{key}}}' has not been provisioned")]
    UnresolvedToken {
        /// The token key (`LogicalId` or `LogicalId.Attribute`).
        key: String,
    },

    /// A `${` was opened but never closed.
    #[error("Unterminated token in '{0}'")]
    UnterminatedToken(String),
}
