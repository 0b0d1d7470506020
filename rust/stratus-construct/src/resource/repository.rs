use serde_json::{Map, Value, json};
use stratus_cleanup::ContentKind;
use stratus_identity::{Arn, ResourceIdentity, Token};
use stratus_policy::{Capability, Grant, GrantError, Grantable, Principal, ResourceKind};
use tracing::debug;

use crate::{
    ConstructError, DeletionPolicy, LifecycleGuard, Removable, ResourceDeclaration, Stack,
    Synthesize, Template, guard::synthesize_guarded, resource::attribute_arn, substituted,
};

/// Properties of a [`Repository`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryProps {
    /// Physical name. Generated by the platform when `None`.
    pub repository_name: Option<String>,
    /// Retain (default) or destroy on teardown. Destroy attaches a
    /// [`LifecycleGuard`] that deletes every image first.
    pub deletion_policy: DeletionPolicy,
    /// Scan images for vulnerabilities when pushed.
    pub scan_on_push: bool,
}

/// A container image repository.
#[derive(Debug, Clone)]
pub struct Repository {
    path: String,
    logical_id: String,
    name: String,
    arn: Arn,
    props: RepositoryProps,
    guard: Option<LifecycleGuard>,
}

impl Repository {
    /// Declare a repository at `path`.
    pub fn new(
        stack: &mut Stack,
        path: &str,
        props: RepositoryProps,
    ) -> Result<Self, ConstructError> {
        props.deletion_policy.require_snapshot_free(path)?;
        let logical_id = stack.allocate(path)?;
        let (name, arn) = match &props.repository_name {
            Some(name) => (
                name.clone(),
                ResourceIdentity::new("ecr", "repository")
                    .named(name)
                    .resolve(stack.environment()),
            ),
            None => (
                Token::reference(&logical_id).to_string(),
                attribute_arn(&logical_id, "Arn"),
            ),
        };

        let mut repository = Self {
            path: path.to_string(),
            logical_id,
            name,
            arn,
            props,
            guard: None,
        };
        repository.guard =
            LifecycleGuard::attach(stack, &repository, repository.props.deletion_policy)?;

        debug!(
            logical_id = %repository.logical_id,
            policy = %repository.props.deletion_policy,
            guarded = repository.guard.is_some(),
            "declared repository"
        );
        Ok(repository)
    }

    /// The repository's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The repository name, or a placeholder for a generated one.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The repository's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// Registry URI images are pushed to and pulled from.
    pub fn repository_uri(&self) -> Token {
        Token::attribute(&self.logical_id, "RepositoryUri")
    }

    /// The deletion policy.
    pub fn deletion_policy(&self) -> DeletionPolicy {
        self.props.deletion_policy
    }

    /// The guard, present only for a destroy policy.
    pub fn guard(&self) -> Option<&LifecycleGuard> {
        self.guard.as_ref()
    }

    /// Allow `principal` to pull images.
    pub fn grant_pull(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Pull)
    }

    /// Allow `principal` to list and delete every image.
    pub fn grant_empty(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Empty)
    }
}

impl Grantable for Repository {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }
}

impl Removable for Repository {
    fn construct_path(&self) -> &str {
        &self.path
    }

    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn content_kind(&self) -> ContentKind {
        ContentKind::Repository
    }

    fn physical_name(&self) -> String {
        self.name.clone()
    }
}

impl Synthesize for Repository {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let mut properties = Map::new();
        if let Some(name) = &self.props.repository_name {
            properties.insert("RepositoryName".into(), substituted(name));
        }
        if self.props.scan_on_push {
            properties.insert(
                "ImageScanningConfiguration".into(),
                json!({ "ScanOnPush": true }),
            );
        }
        let declaration =
            ResourceDeclaration::new("AWS::ECR::Repository", Value::Object(properties))
                .with_deletion_policy(self.props.deletion_policy);

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

    #[test]
    fn it_grants_pull_on_a_named_repository() -> TestResult {
        let mut stack = Stack::new("Test", Environment::new("123456789012", "eu-west-1"));
        let repository = Repository::new(
            &mut stack,
            "Images",
            RepositoryProps {
                repository_name: Some("api".into()),
                ..RepositoryProps::default()
            },
        )?;
        let mut runner = PolicyHolder::new("Runner");

        let receipt = repository.grant_pull(&mut runner)?;

        assert_eq!(
            receipt.actions(),
            &[
                "ecr:BatchCheckLayerAvailability",
                "ecr:GetDownloadUrlForLayer",
                "ecr:BatchGetImage"
            ]
        );
        assert_eq!(
            receipt.resources()[0].as_str(),
            "arn:aws:ecr:eu-west-1:123456789012:repository/api"
        );
        Ok(())
    }
}
