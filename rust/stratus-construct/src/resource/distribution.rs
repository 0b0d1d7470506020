use serde::Serialize;
use serde_json::{Map, Value, json};
use stratus_identity::{Arn, ResourceIdentity, Token};
use stratus_policy::{Capability, Grant, GrantError, Grantable, Principal, ResourceKind};
use tracing::debug;

use crate::{ConstructError, ResourceDeclaration, Stack, Synthesize, Template, substituted};

/// Object served for requests to the root path. Not configurable.
pub const DEFAULT_ROOT_OBJECT: &str = "index.html";

/// Which edge locations serve the distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PriceClass {
    /// North America and Europe.
    #[serde(rename = "PriceClass_100")]
    PriceClass100,
    /// Adds Asia, the Middle East and Africa.
    #[default]
    #[serde(rename = "PriceClass_200")]
    PriceClass200,
    /// Every edge location.
    #[serde(rename = "PriceClass_All")]
    PriceClassAll,
}

/// One routing behavior. A behavior without a path pattern is the default
/// (catch-all) behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Behavior {
    /// Request path pattern, `None` for the default behavior.
    pub path_pattern: Option<String>,
    /// Compress responses.
    pub compress: bool,
}

impl Behavior {
    /// The catch-all behavior.
    pub fn default_behavior() -> Self {
        Self {
            path_pattern: None,
            compress: true,
        }
    }

    /// Whether this is the catch-all behavior.
    pub fn is_default(&self) -> bool {
        self.path_pattern.is_none()
    }

    fn to_value(&self, origin_id: &str) -> Value {
        let mut behavior = Map::new();
        if let Some(pattern) = &self.path_pattern {
            behavior.insert("PathPattern".into(), json!(pattern));
        }
        behavior.insert("TargetOriginId".into(), json!(origin_id));
        behavior.insert("ViewerProtocolPolicy".into(), json!("redirect-to-https"));
        behavior.insert("AllowedMethods".into(), json!(["GET", "HEAD"]));
        behavior.insert("CachedMethods".into(), json!(["GET", "HEAD"]));
        behavior.insert("Compress".into(), json!(self.compress));
        behavior.insert(
            "ForwardedValues".into(),
            json!({ "QueryString": false, "Cookies": { "Forward": "none" } }),
        );
        Value::Object(behavior)
    }
}

/// A private bucket origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3OriginSource {
    /// Regional domain name of the bucket. May contain placeholders.
    pub domain_name: String,
    /// Id of the origin access identity reading the bucket.
    pub origin_access_identity: Option<String>,
}

/// An origin and the behaviors routed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfiguration {
    /// Where content comes from.
    pub origin: S3OriginSource,
    /// Routing behaviors for this origin.
    pub behaviors: Vec<Behavior>,
}

/// Properties of a [`Distribution`].
///
/// There is no default-root-object property: every distribution serves
/// [`DEFAULT_ROOT_OBJECT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionProps {
    /// Origins with their behaviors. Exactly one behavior overall must be
    /// the default behavior.
    pub origin_configs: Vec<SourceConfiguration>,
    /// Edge locations to serve from.
    pub price_class: PriceClass,
    /// Free-form comment.
    pub comment: Option<String>,
}

/// An edge content distribution.
#[derive(Debug, Clone)]
pub struct Distribution {
    logical_id: String,
    arn: Arn,
    props: DistributionProps,
}

impl Distribution {
    /// Declare a distribution at `path`.
    ///
    /// Fails unless exactly one behavior is the default behavior.
    pub fn new(
        stack: &mut Stack,
        path: &str,
        props: DistributionProps,
    ) -> Result<Self, ConstructError> {
        if props.origin_configs.is_empty() {
            return Err(ConstructError::MissingProperty {
                construct: path.to_string(),
                property: "origin_configs",
            });
        }
        let defaults = props
            .origin_configs
            .iter()
            .flat_map(|config| &config.behaviors)
            .filter(|behavior| behavior.is_default())
            .count();
        if defaults != 1 {
            return Err(ConstructError::InvalidProperty {
                construct: path.to_string(),
                property: "behaviors",
                reason: format!("expected exactly one default behavior, found {defaults}"),
            });
        }

        let logical_id = stack.allocate(path)?;
        let arn = ResourceIdentity::new("cloudfront", "distribution")
            .named(Token::reference(&logical_id).to_string())
            .global()
            .resolve(stack.environment());

        debug!(%logical_id, origins = props.origin_configs.len(), "declared distribution");
        Ok(Self {
            logical_id,
            arn,
            props,
        })
    }

    /// The distribution's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The distribution's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// The distribution id.
    pub fn distribution_id(&self) -> Token {
        Token::reference(&self.logical_id)
    }

    /// The domain name content is served from.
    pub fn domain_name(&self) -> Token {
        Token::attribute(&self.logical_id, "DomainName")
    }

    /// Always [`DEFAULT_ROOT_OBJECT`].
    pub fn default_root_object(&self) -> &'static str {
        DEFAULT_ROOT_OBJECT
    }

    /// The declared properties.
    pub fn props(&self) -> &DistributionProps {
        &self.props
    }

    /// Allow `principal` to invalidate cached content.
    pub fn grant_invalidate(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Invalidate)
    }

    fn distribution_config(&self) -> Value {
        let mut origins = Vec::new();
        let mut default_behavior = Value::Null;
        let mut cache_behaviors = Vec::new();

        for (index, config) in self.props.origin_configs.iter().enumerate() {
            let origin_id = format!("origin{}", index + 1);
            let origin_access_identity = config
                .origin
                .origin_access_identity
                .as_ref()
                .map(|id| format!("origin-access-identity/cloudfront/{id}"))
                .unwrap_or_default();
            origins.push(json!({
                "Id": origin_id,
                "DomainName": substituted(&config.origin.domain_name),
                "S3OriginConfig": {
                    "OriginAccessIdentity": substituted(&origin_access_identity),
                },
            }));

            for behavior in &config.behaviors {
                if behavior.is_default() {
                    default_behavior = behavior.to_value(&origin_id);
                } else {
                    cache_behaviors.push(behavior.to_value(&origin_id));
                }
            }
        }

        let mut config = Map::new();
        config.insert("Enabled".into(), json!(true));
        config.insert("DefaultRootObject".into(), json!(DEFAULT_ROOT_OBJECT));
        config.insert("PriceClass".into(), json!(self.props.price_class));
        config.insert("HttpVersion".into(), json!("http2"));
        config.insert("Origins".into(), Value::Array(origins));
        config.insert("DefaultCacheBehavior".into(), default_behavior);
        if !cache_behaviors.is_empty() {
            config.insert("CacheBehaviors".into(), Value::Array(cache_behaviors));
        }
        if let Some(comment) = &self.props.comment {
            config.insert("Comment".into(), json!(comment));
        }
        Value::Object(config)
    }
}

impl Grantable for Distribution {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Distribution
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }
}

impl Synthesize for Distribution {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        template.add_resource(
            &self.logical_id,
            ResourceDeclaration::new(
                "AWS::CloudFront::Distribution",
                json!({ "DistributionConfig": self.distribution_config() }),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stratus_identity::Environment;
    use stratus_policy::PolicyHolder;
    use testresult::TestResult;

    fn origin(behaviors: Vec<Behavior>) -> SourceConfiguration {
        SourceConfiguration {
            origin: S3OriginSource {
                domain_name: "${Site.RegionalDomainName}".into(),
                origin_access_identity: None,
            },
            behaviors,
        }
    }

    fn props(behaviors: Vec<Behavior>) -> DistributionProps {
        DistributionProps {
            origin_configs: vec![origin(behaviors)],
            price_class: PriceClass::default(),
            comment: None,
        }
    }

    #[test]
    fn it_requires_exactly_one_default_behavior() {
        let mut stack = Stack::new("Test", Environment::agnostic());

        let none = Distribution::new(
            &mut stack,
            "None",
            props(vec![Behavior {
                path_pattern: Some("/api/*".into()),
                compress: false,
            }]),
        );
        let two = Distribution::new(
            &mut stack,
            "Two",
            props(vec![Behavior::default_behavior(), Behavior::default_behavior()]),
        );

        assert!(matches!(none, Err(ConstructError::InvalidProperty { .. })));
        assert!(matches!(two, Err(ConstructError::InvalidProperty { .. })));
    }

    #[test]
    fn it_grants_invalidation_on_a_global_identifier() -> TestResult {
        let mut stack = Stack::new("Test", Environment::new("123456789012", "us-east-1"));
        let distribution =
            Distribution::new(&mut stack, "Edge", props(vec![Behavior::default_behavior()]))?;
        let mut deployer = PolicyHolder::new("Deployer");

        let receipt = distribution.grant_invalidate(&mut deployer)?;

        assert_eq!(receipt.actions(), &["cloudfront:CreateInvalidation"]);
        assert_eq!(
            receipt.resources()[0].as_str(),
            format!(
                "arn:aws:cloudfront::123456789012:distribution/${{{}}}",
                distribution.logical_id()
            )
        );
        Ok(())
    }
}
