use serde::Serialize;
use serde_json::{Map, Value, json};
use stratus_cleanup::ContentKind;
use stratus_identity::{Arn, ArnLayout, ResourceIdentity, Token};
use stratus_policy::{
    Capability, Grant, GrantError, Grantable, POLICY_VERSION, PolicyStatement, Principal,
    ResourceKind,
};
use tracing::debug;

use crate::{
    ConstructError, DeletionPolicy, LifecycleGuard, Removable, ResourceDeclaration, Stack,
    Synthesize, Template, child_path, guard::synthesize_guarded, substituted,
};

/// Properties of a [`Bucket`].
#[derive(Debug, Clone, Default)]
pub struct BucketProps {
    /// Physical name. Generated by the platform when `None`.
    pub bucket_name: Option<String>,
    /// Retain (default) or destroy on teardown. Destroy attaches a
    /// [`LifecycleGuard`] that empties the bucket first.
    pub deletion_policy: DeletionPolicy,
}

/// Who a resource policy statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyPrincipal {
    /// A canonical user id, as issued to origin access identities.
    CanonicalUser(String),
    /// A platform service.
    Service(String),
    /// An account, role or user identifier.
    Arn(Arn),
}

impl PolicyPrincipal {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        Ok(match self {
            PolicyPrincipal::CanonicalUser(id) => json!({ "CanonicalUser": substituted(id) }),
            PolicyPrincipal::Service(service) => json!({ "Service": service }),
            PolicyPrincipal::Arn(arn) => json!({ "AWS": serde_json::to_value(arn)? }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResourcePolicyStatement {
    principal: PolicyPrincipal,
    statement: PolicyStatement,
}

#[derive(Serialize)]
struct RenderedStatement<'a> {
    #[serde(rename = "Principal")]
    principal: Value,
    #[serde(flatten)]
    statement: &'a PolicyStatement,
}

/// An object-storage bucket.
#[derive(Debug, Clone)]
pub struct Bucket {
    path: String,
    logical_id: String,
    policy_logical_id: String,
    name: String,
    arn: Arn,
    props: BucketProps,
    resource_policy: Vec<ResourcePolicyStatement>,
    guard: Option<LifecycleGuard>,
}

impl Bucket {
    /// Declare a bucket at `path`.
    pub fn new(stack: &mut Stack, path: &str, props: BucketProps) -> Result<Self, ConstructError> {
        props.deletion_policy.require_snapshot_free(path)?;
        let logical_id = stack.allocate(path)?;
        let policy_logical_id = stack.allocate(&child_path(path, "Policy"))?;
        let name = props
            .bucket_name
            .clone()
            .unwrap_or_else(|| Token::reference(&logical_id).to_string());
        let arn = ResourceIdentity::new("s3", "")
            .named(&name)
            .global()
            .without_account()
            .layout(ArnLayout::Bare)
            .resolve(stack.environment());

        let mut bucket = Self {
            path: path.to_string(),
            logical_id,
            policy_logical_id,
            name,
            arn,
            props,
            resource_policy: Vec::new(),
            guard: None,
        };
        bucket.guard = LifecycleGuard::attach(stack, &bucket, bucket.props.deletion_policy)?;

        debug!(
            logical_id = %bucket.logical_id,
            policy = %bucket.props.deletion_policy,
            guarded = bucket.guard.is_some(),
            "declared bucket"
        );
        Ok(bucket)
    }

    /// The bucket's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The bucket name, or a placeholder for a generated one.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bucket's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// Identifier covering every object in the bucket.
    pub fn objects_arn(&self) -> Arn {
        self.arn.with_suffix("/*")
    }

    /// Regional domain name, used as a distribution origin.
    pub fn regional_domain_name(&self) -> Token {
        Token::attribute(&self.logical_id, "RegionalDomainName")
    }

    /// The deletion policy.
    pub fn deletion_policy(&self) -> DeletionPolicy {
        self.props.deletion_policy
    }

    /// The guard, present only for a destroy policy.
    pub fn guard(&self) -> Option<&LifecycleGuard> {
        self.guard.as_ref()
    }

    /// Add a statement to the bucket's own policy.
    pub fn add_to_resource_policy<A>(
        &mut self,
        principal: PolicyPrincipal,
        actions: A,
        resources: Vec<Arn>,
    ) -> Result<(), GrantError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let actions: Vec<String> = actions.into_iter().map(Into::into).collect();
        if actions.is_empty() {
            return Err(GrantError::EmptyActions {
                principal: self.logical_id.clone(),
            });
        }
        if resources.is_empty() {
            return Err(GrantError::EmptyResources {
                principal: self.logical_id.clone(),
            });
        }

        self.resource_policy.push(ResourcePolicyStatement {
            principal,
            statement: PolicyStatement::allow(actions, resources),
        });
        Ok(())
    }

    /// Allow `principal` to read objects and list the bucket.
    pub fn grant_read(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Read)
    }

    /// Allow `principal` to list and delete every object.
    pub fn grant_empty(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Empty)
    }

    fn policy_declaration(&self) -> Result<ResourceDeclaration, ConstructError> {
        let statements = self
            .resource_policy
            .iter()
            .map(|entry| {
                serde_json::to_value(RenderedStatement {
                    principal: entry.principal.to_value()?,
                    statement: &entry.statement,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResourceDeclaration::new(
            "AWS::S3::BucketPolicy",
            json!({
                "Bucket": substituted(&self.name),
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": statements,
                },
            }),
        ))
    }
}

impl Grantable for Bucket {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Bucket
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }

    fn grant_targets(&self, _capability: Capability) -> Vec<Arn> {
        vec![self.arn.clone(), self.objects_arn()]
    }
}

impl Removable for Bucket {
    fn construct_path(&self) -> &str {
        &self.path
    }

    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn content_kind(&self) -> ContentKind {
        ContentKind::Bucket
    }

    fn physical_name(&self) -> String {
        self.name.clone()
    }
}

impl Synthesize for Bucket {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let mut properties = Map::new();
        if let Some(name) = &self.props.bucket_name {
            properties.insert("BucketName".into(), substituted(name));
        }
        let declaration = ResourceDeclaration::new("AWS::S3::Bucket", Value::Object(properties))
            .with_deletion_policy(self.props.deletion_policy);

        if !self.resource_policy.is_empty() {
            template.add_resource(&self.policy_logical_id, self.policy_declaration()?)?;
        }
        synthesize_guarded(template, &self.logical_id, declaration, self.guard.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stratus_identity::Environment;
    use stratus_policy::PolicyHolder;
    use testresult::TestResult;

    fn stack() -> Stack {
        Stack::new("Test", Environment::new("123456789012", "us-east-1"))
    }

    #[test]
    fn it_uses_bare_identifiers() -> TestResult {
        let mut stack = stack();
        let bucket = Bucket::new(
            &mut stack,
            "Site",
            BucketProps {
                bucket_name: Some("site-content".into()),
                ..BucketProps::default()
            },
        )?;

        assert_eq!(bucket.arn().as_str(), "arn:aws:s3:::site-content");
        assert_eq!(bucket.objects_arn().as_str(), "arn:aws:s3:::site-content/*");
        Ok(())
    }

    #[test]
    fn it_grants_on_the_bucket_and_its_objects() -> TestResult {
        let mut stack = stack();
        let bucket = Bucket::new(&mut stack, "Site", BucketProps::default())?;
        let mut reader = PolicyHolder::new("Reader");

        let receipt = bucket.grant_read(&mut reader)?;

        assert_eq!(receipt.actions(), &["s3:GetObject*", "s3:GetBucket*", "s3:List*"]);
        let resources: Vec<&str> = receipt.resources().iter().map(Arn::as_str).collect();
        assert_eq!(
            resources,
            vec![
                format!("arn:aws:s3:::${{{}}}", bucket.logical_id()),
                format!("arn:aws:s3:::${{{}}}/*", bucket.logical_id()),
            ]
        );
        Ok(())
    }

    #[test]
    fn it_renders_a_resource_policy() -> TestResult {
        let mut stack = stack();
        let mut bucket = Bucket::new(&mut stack, "Site", BucketProps::default())?;
        let objects = bucket.objects_arn();
        bucket.add_to_resource_policy(
            PolicyPrincipal::CanonicalUser("${Identity.S3CanonicalUserId}".into()),
            ["s3:GetObject"],
            vec![objects],
        )?;

        let template = stack.synthesize(&[&bucket])?;
        let (_, policy) = template
            .resources_of_type("AWS::S3::BucketPolicy")
            .next()
            .ok_or("bucket policy not rendered")?;

        assert_eq!(
            policy.properties()["PolicyDocument"]["Statement"][0],
            json!({
                "Principal": { "CanonicalUser": { "Fn::Sub": "${Identity.S3CanonicalUserId}" } },
                "Effect": "Allow",
                "Action": ["s3:GetObject"],
                "Resource": [{ "Fn::Sub": format!("arn:aws:s3:::${{{}}}/*", bucket.logical_id()) }],
            })
        );
        Ok(())
    }

    #[test]
    fn it_rejects_empty_resource_policy_statements() -> TestResult {
        let mut stack = stack();
        let mut bucket = Bucket::new(&mut stack, "Site", BucketProps::default())?;

        let result = bucket.add_to_resource_policy(
            PolicyPrincipal::Service("logging.s3.amazonaws.com".into()),
            Vec::<String>::new(),
            vec![bucket.arn().clone()],
        );

        assert!(matches!(result, Err(GrantError::EmptyActions { .. })));
        Ok(())
    }
}
