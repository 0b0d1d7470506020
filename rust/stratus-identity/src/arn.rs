use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{IdentityError, ProvisionedAttributes, contains_tokens};

/// A fully-qualified resource identifier.
///
/// An `Arn` is plain text. When it embeds [`Token`](crate::Token)s or pseudo
/// references it serializes as `{"Fn::Sub": "<text>"}` so the platform can
/// substitute them; a literal ARN serializes as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arn(String);

impl Arn {
    /// Wrap an already formatted identifier. No validation is performed.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier still contains placeholders.
    pub fn is_resolved(&self) -> bool {
        !contains_tokens(&self.0)
    }

    /// A new identifier with `suffix` appended to the resource part,
    /// e.g. `service/api` + `/*` → `service/api/*`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }

    /// Substitute provisioned values for every placeholder.
    pub fn resolve_tokens(
        &self,
        attributes: &ProvisionedAttributes,
    ) -> Result<Self, IdentityError> {
        Ok(Self(attributes.substitute(&self.0)?))
    }

    /// Split a literal identifier into its components.
    pub fn parse(value: &str) -> Result<ArnComponents, IdentityError> {
        let malformed = |reason: &str| IdentityError::Malformed {
            arn: value.to_string(),
            reason: reason.to_string(),
        };

        if contains_tokens(value) {
            return Err(malformed("contains unresolved tokens"));
        }

        let parts: Vec<&str> = value.splitn(6, ':').collect();
        let [prefix, partition, service, region, account, resource] = parts.as_slice() else {
            return Err(malformed("expected six ':' separated fields"));
        };

        if *prefix != "arn" {
            return Err(malformed("must start with 'arn'"));
        }
        if partition.is_empty() || service.is_empty() {
            return Err(malformed("partition and service are required"));
        }
        if resource.is_empty() {
            return Err(malformed("resource is required"));
        }

        Ok(ArnComponents {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            resource: resource.to_string(),
        })
    }
}

impl Display for Arn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Arn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ArnComponents> for Arn {
    fn from(components: ArnComponents) -> Self {
        Self(components.to_string())
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Rendered<'a> {
    Literal(&'a str),
    Substituted {
        #[serde(rename = "Fn::Sub")]
        template: &'a str,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Parsed {
    Literal(String),
    Substituted {
        #[serde(rename = "Fn::Sub")]
        template: String,
    },
}

impl Serialize for Arn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_resolved() {
            Rendered::Literal(&self.0).serialize(serializer)
        } else {
            Rendered::Substituted { template: &self.0 }.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Arn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Parsed::deserialize(deserializer)? {
            Parsed::Literal(value) => Self(value),
            Parsed::Substituted { template } => Self(template),
        })
    }
}

/// The fields of a literal identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnComponents {
    /// Partition, e.g. `aws`.
    pub partition: String,
    /// Service namespace, e.g. `iam`.
    pub service: String,
    /// Region, empty for partition-global resources.
    pub region: String,
    /// Account id, empty for bucket identifiers.
    pub account: String,
    /// Everything after the account field, e.g. `role/service-role/deployer`.
    pub resource: String,
}

impl ArnComponents {
    /// The resource type, i.e. the resource part before the first `/` or `:`.
    /// `None` when the resource part is a bare name.
    pub fn resource_type(&self) -> Option<&str> {
        self.resource
            .find(['/', ':'])
            .map(|index| &self.resource[..index])
    }

    /// The resource name, i.e. the resource part after the first `/` or `:`,
    /// or the whole resource part when it is a bare name.
    pub fn resource_name(&self) -> &str {
        match self.resource.find(['/', ':']) {
            Some(index) => &self.resource[index + 1..],
            None => &self.resource,
        }
    }
}

impl Display for ArnComponents {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}
