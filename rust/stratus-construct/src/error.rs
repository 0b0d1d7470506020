use stratus_identity::IdentityError;
use stratus_policy::GrantError;
use thiserror::Error;

/// Errors raised while declaring constructs or rendering templates.
#[derive(Debug, Error)]
pub enum ConstructError {
    /// Two constructs were declared with the same path.
    #[error("Construct '{0}' is already declared")]
    DuplicateId(String),

    /// A construct path is empty or contains characters that cannot appear
    /// in a logical id.
    #[error("Invalid construct id '{id}': {reason}")]
    InvalidId {
        /// The offending path.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A required property was not supplied.
    #[error("Construct '{construct}' requires property '{property}'")]
    MissingProperty {
        /// Path of the construct.
        construct: String,
        /// The property name.
        property: &'static str,
    },

    /// A property was supplied with an unusable value.
    #[error("Construct '{construct}' has an invalid '{property}': {reason}")]
    InvalidProperty {
        /// Path of the construct.
        construct: String,
        /// The property name.
        property: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A container image identifier does not match an accepted registry
    /// shape.
    #[error("Invalid image identifier '{identifier}': {reason}")]
    InvalidImageIdentifier {
        /// The identifier as given.
        identifier: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A deletion policy flag was not recognized.
    #[error("Unknown deletion policy '{0}'")]
    UnknownDeletionPolicy(String),

    /// Granting permissions failed.
    #[error(transparent)]
    Grant(#[from] GrantError),

    /// Resolving an identifier failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Rendering JSON failed.
    #[error("Failed to render template: {0}")]
    Render(#[from] serde_json::Error),
}
