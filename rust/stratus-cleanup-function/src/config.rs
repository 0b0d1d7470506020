use tracing::debug;

use crate::FunctionError;

/// Region the function runs in.
pub const REGION_ENV_VAR: &str = "AWS_REGION";

/// Fallback for [`REGION_ENV_VAR`].
pub const DEFAULT_REGION_ENV_VAR: &str = "AWS_DEFAULT_REGION";

/// Access key id of the execution role's session.
pub const ACCESS_KEY_ID_ENV_VAR: &str = "AWS_ACCESS_KEY_ID";

/// Secret key of the execution role's session.
pub const SECRET_ACCESS_KEY_ENV_VAR: &str = "AWS_SECRET_ACCESS_KEY";

/// Session token of the execution role's session.
pub const SESSION_TOKEN_ENV_VAR: &str = "AWS_SESSION_TOKEN";

/// Keys requests are signed with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token of temporary credentials.
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where service calls go and how they are signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsConfig {
    /// Region of every endpoint.
    pub region: String,
    /// Signing keys.
    pub credentials: Credentials,
}

impl AwsConfig {
    /// Read region and credentials from the function environment.
    pub fn from_env() -> Result<Self, FunctionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`AwsConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FunctionError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| read(key).ok_or(FunctionError::MissingEnvironment(key));

        let region = read(REGION_ENV_VAR)
            .or_else(|| read(DEFAULT_REGION_ENV_VAR))
            .ok_or(FunctionError::MissingEnvironment(REGION_ENV_VAR))?;
        let credentials = Credentials {
            access_key_id: require(ACCESS_KEY_ID_ENV_VAR)?,
            secret_access_key: require(SECRET_ACCESS_KEY_ENV_VAR)?,
            session_token: read(SESSION_TOKEN_ENV_VAR),
        };

        debug!(%region, temporary = credentials.session_token.is_some(), "loaded credentials");
        Ok(Self {
            region,
            credentials,
        })
    }

    /// Regional endpoint host of `service`.
    pub fn endpoint(&self, service: &str) -> String {
        format!("{service}.{}.amazonaws.com", self.region)
    }
}
