use serde::{Deserialize, Serialize};

use crate::{Arn, ResourceIdentity};

/// Environment variable holding the partition (`aws`, `aws-cn`, `aws-us-gov`).
pub const PARTITION_ENV_VAR: &str = "STRATUS_PARTITION";

/// Environment variable holding the default account id.
pub const ACCOUNT_ENV_VAR: &str = "STRATUS_DEFAULT_ACCOUNT";

/// Environment variable holding the default region.
pub const REGION_ENV_VAR: &str = "STRATUS_DEFAULT_REGION";

/// The commercial partition.
pub const DEFAULT_PARTITION: &str = "aws";

/// Pseudo reference to the partition a template is deployed into.
pub const PSEUDO_PARTITION: &str = "${AWS::Partition}";

/// Pseudo reference to the account a template is deployed into.
pub const PSEUDO_ACCOUNT: &str = "${AWS::AccountId}";

/// Pseudo reference to the region a template is deployed into.
pub const PSEUDO_REGION: &str = "${AWS::Region}";

/// The ambient scope identifiers are resolved against.
///
/// An environment is either concrete (`Environment::new`) or agnostic, in
/// which case partition, account and region are pseudo references resolved
/// by the platform at deployment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    partition: String,
    account: String,
    region: String,
}

impl Environment {
    /// A concrete environment in the commercial partition.
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            partition: DEFAULT_PARTITION.into(),
            account: account.into(),
            region: region.into(),
        }
    }

    /// An environment whose values are only known at deployment time.
    pub fn agnostic() -> Self {
        Self {
            partition: PSEUDO_PARTITION.into(),
            account: PSEUDO_ACCOUNT.into(),
            region: PSEUDO_REGION.into(),
        }
    }

    /// Reads the environment from `STRATUS_PARTITION`,
    /// `STRATUS_DEFAULT_ACCOUNT` and `STRATUS_DEFAULT_REGION`.
    ///
    /// Unset account or region fall back to pseudo references, an unset
    /// partition falls back to the pseudo partition unless both account and
    /// region are concrete, in which case `aws` is assumed.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let account = lookup(ACCOUNT_ENV_VAR).filter(|value| !value.is_empty());
        let region = lookup(REGION_ENV_VAR).filter(|value| !value.is_empty());
        let partition = lookup(PARTITION_ENV_VAR).filter(|value| !value.is_empty());

        let partition = match (&partition, &account, &region) {
            (Some(partition), _, _) => partition.clone(),
            (None, Some(_), Some(_)) => DEFAULT_PARTITION.into(),
            _ => PSEUDO_PARTITION.into(),
        };

        Self {
            partition,
            account: account.unwrap_or_else(|| PSEUDO_ACCOUNT.into()),
            region: region.unwrap_or_else(|| PSEUDO_REGION.into()),
        }
    }

    /// Replace the partition.
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// The partition (`aws` or a pseudo reference).
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The account id (or a pseudo reference).
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The region (or a pseudo reference).
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Resolve an identity in this environment.
    pub fn resolve(&self, identity: &ResourceIdentity) -> Arn {
        identity.resolve(self)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::agnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn it_falls_back_to_pseudo_references() {
        let environment = Environment::from_lookup(lookup(&[]));
        assert_eq!(environment, Environment::agnostic());
    }

    #[test]
    fn it_assumes_commercial_partition_for_concrete_environments() {
        let environment = Environment::from_lookup(lookup(&[
            (ACCOUNT_ENV_VAR, "123456789012"),
            (REGION_ENV_VAR, "us-east-1"),
        ]));
        assert_eq!(environment, Environment::new("123456789012", "us-east-1"));
    }

    #[test]
    fn it_honors_explicit_partition() {
        let environment = Environment::from_lookup(lookup(&[
            (PARTITION_ENV_VAR, "aws-cn"),
            (REGION_ENV_VAR, "cn-north-1"),
        ]));
        assert_eq!(environment.partition(), "aws-cn");
        assert_eq!(environment.account(), PSEUDO_ACCOUNT);
        assert_eq!(environment.region(), "cn-north-1");
    }

    #[test]
    fn it_ignores_empty_values() {
        let environment = Environment::from_lookup(lookup(&[(ACCOUNT_ENV_VAR, "")]));
        assert_eq!(environment.account(), PSEUDO_ACCOUNT);
    }
}
