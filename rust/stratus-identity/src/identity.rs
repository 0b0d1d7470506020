use serde::{Deserialize, Serialize};

use crate::{Arn, Environment};

/// The name part of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceName {
    /// A specific resource. May embed tokens.
    Named(String),
    /// Every resource of the type (`*`). Only meaningful for broad
    /// create/list-style actions.
    Wildcard,
}

impl ResourceName {
    fn as_str(&self) -> &str {
        match self {
            ResourceName::Named(name) => name,
            ResourceName::Wildcard => "*",
        }
    }
}

/// How the resource part of an identifier is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArnLayout {
    /// `type/name`, used by most services.
    #[default]
    Slash,
    /// `type:name`, used e.g. by log groups and functions.
    Colon,
    /// `name` only, used by object-storage buckets.
    Bare,
}

/// Which region an identity lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionScope {
    /// The environment's region.
    #[default]
    Environment,
    /// No region: the resource is global within its partition.
    Global,
    /// A specific region, regardless of the environment.
    Explicit(String),
}

/// Everything needed to compute a resource's identifier, apart from the
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    service: String,
    resource_type: String,
    resource_name: Option<ResourceName>,
    region: RegionScope,
    account_scoped: bool,
    layout: ArnLayout,
}

impl ResourceIdentity {
    /// Start an identity for `resource_type` in the `service` namespace.
    pub fn new(service: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            resource_type: resource_type.into(),
            resource_name: None,
            region: RegionScope::Environment,
            account_scoped: true,
            layout: ArnLayout::Slash,
        }
    }

    /// Name a specific resource.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(ResourceName::Named(name.into()));
        self
    }

    /// Cover every resource of this type.
    pub fn wildcard(mut self) -> Self {
        self.resource_name = Some(ResourceName::Wildcard);
        self
    }

    /// Drop the region field (IAM, edge distributions, buckets).
    pub fn global(mut self) -> Self {
        self.region = RegionScope::Global;
        self
    }

    /// Pin the identity to a specific region.
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = RegionScope::Explicit(region.into());
        self
    }

    /// Drop the account field (buckets).
    pub fn without_account(mut self) -> Self {
        self.account_scoped = false;
        self
    }

    /// Choose how the resource part is laid out.
    pub fn layout(mut self, layout: ArnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The service namespace.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The resource type.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The resource name, if any.
    pub fn resource_name(&self) -> Option<&ResourceName> {
        self.resource_name.as_ref()
    }

    /// Whether this identity covers every resource of its type.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.resource_name, Some(ResourceName::Wildcard))
    }

    /// Compute the identifier in `environment`.
    pub fn resolve(&self, environment: &Environment) -> Arn {
        let region = match &self.region {
            RegionScope::Environment => environment.region(),
            RegionScope::Global => "",
            RegionScope::Explicit(region) => region.as_str(),
        };
        let account = if self.account_scoped {
            environment.account()
        } else {
            ""
        };

        let resource = match (&self.resource_name, self.layout) {
            (None, _) => self.resource_type.clone(),
            (Some(name), ArnLayout::Slash) => format!("{}/{}", self.resource_type, name.as_str()),
            (Some(name), ArnLayout::Colon) => format!("{}:{}", self.resource_type, name.as_str()),
            (Some(name), ArnLayout::Bare) => name.as_str().to_string(),
        };

        Arn::from_raw(format!(
            "arn:{}:{}:{}:{}:{}",
            environment.partition(),
            self.service,
            region,
            account,
            resource
        ))
    }
}

/// Resolve an identifier from its parts.
///
/// `region` of `None` denotes a partition-global resource. This is a pure
/// function of its inputs; no validation is performed.
pub fn resolve(
    service: &str,
    resource_type: &str,
    resource_name: ResourceName,
    environment: &Environment,
    region: Option<&str>,
) -> Arn {
    let identity = ResourceIdentity {
        service: service.to_string(),
        resource_type: resource_type.to_string(),
        resource_name: Some(resource_name),
        region: match region {
            Some(region) => RegionScope::Explicit(region.to_string()),
            None => RegionScope::Global,
        },
        account_scoped: true,
        layout: ArnLayout::Slash,
    };

    identity.resolve(environment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment() -> Environment {
        Environment::new("123456789012", "us-east-1")
    }

    #[test]
    fn it_resolves_regional_identities() {
        let arn = ResourceIdentity::new("apprunner", "service")
            .named("api")
            .resolve(&environment());

        assert_eq!(arn.as_str(), "arn:aws:apprunner:us-east-1:123456789012:service/api");
    }

    #[test]
    fn it_resolves_global_identities_without_region() {
        let arn = ResourceIdentity::new("cloudfront", "distribution")
            .named("E2QWRUHAPOMQZL")
            .global()
            .resolve(&environment());

        assert_eq!(
            arn.as_str(),
            "arn:aws:cloudfront::123456789012:distribution/E2QWRUHAPOMQZL"
        );
    }

    #[test]
    fn it_resolves_bare_bucket_identities() {
        let arn = ResourceIdentity::new("s3", "bucket")
            .named("site")
            .global()
            .without_account()
            .layout(ArnLayout::Bare)
            .resolve(&environment());

        assert_eq!(arn.as_str(), "arn:aws:s3:::site");
    }

    #[test]
    fn it_resolves_colon_layouts() {
        let arn = ResourceIdentity::new("lambda", "function")
            .named("cleanup")
            .layout(ArnLayout::Colon)
            .resolve(&environment());

        assert_eq!(arn.as_str(), "arn:aws:lambda:us-east-1:123456789012:function:cleanup");
    }

    #[test]
    fn it_uses_explicit_regions() {
        let arn = ResourceIdentity::new("ecr", "repository")
            .named("images")
            .in_region("eu-central-1")
            .resolve(&environment());

        assert_eq!(arn.as_str(), "arn:aws:ecr:eu-central-1:123456789012:repository/images");
    }

    #[test]
    fn it_marks_wildcards() {
        let identity = ResourceIdentity::new("iam", "role").wildcard();
        assert!(identity.is_wildcard());
        assert_eq!(
            identity.global().resolve(&environment()).as_str(),
            "arn:aws:iam::123456789012:role/*"
        );
    }
}
