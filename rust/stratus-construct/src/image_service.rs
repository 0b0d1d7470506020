use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use stratus_policy::{Grant, GrantError, Principal};
use tracing::info;

use crate::{
    ConstructError, ImageConfiguration, ImageRepositoryType, ImageSource, InstanceConfiguration,
    ManagedPolicy, Output, Role, RoleProps, ServiceOutputs, ServicePrincipal, ServiceRunner,
    ServiceRunnerProps, Stack, Synthesize, Template, child_path, substituted,
};

/// Managed policy attached to every image service access role.
pub const ECR_ACCESS_POLICY: &str = "service-role/AWSAppRunnerServicePolicyForECRAccess";

const PUBLIC_REGISTRY: &str = "public.ecr.aws";
const ACCOUNT_ID_LENGTH: usize = 12;

/// A container image reference in one of the accepted registry shapes:
///
/// - `<account>.dkr.ecr.<region>.amazonaws.com/<repository>[:tag|@digest]`
/// - `public.ecr.aws/<alias>/<repository>[:tag|@digest]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageIdentifier {
    identifier: String,
    repository_type: ImageRepositoryType,
}

impl ImageIdentifier {
    /// Validate `identifier` and classify its registry.
    pub fn parse(identifier: &str) -> Result<Self, ConstructError> {
        let invalid = |reason: &str| ConstructError::InvalidImageIdentifier {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        };

        if identifier.is_empty() || identifier.chars().any(char::is_whitespace) {
            return Err(invalid("empty or contains whitespace"));
        }
        let (registry, path) = identifier
            .split_once('/')
            .ok_or_else(|| invalid("missing repository"))?;
        let repository = without_reference(path);
        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("empty repository path"));
        }

        let repository_type = if registry == PUBLIC_REGISTRY {
            if repository.split('/').count() < 2 {
                return Err(invalid("expected public.ecr.aws/<alias>/<repository>"));
            }
            ImageRepositoryType::EcrPublic
        } else if is_private_registry(registry) {
            ImageRepositoryType::Ecr
        } else {
            return Err(invalid("unsupported registry"));
        };

        Ok(Self {
            identifier: identifier.to_string(),
            repository_type,
        })
    }

    /// The identifier as given.
    pub fn as_str(&self) -> &str {
        &self.identifier
    }

    /// Which registry the image lives in.
    pub fn repository_type(&self) -> ImageRepositoryType {
        self.repository_type
    }
}

impl FromStr for ImageIdentifier {
    type Err = ConstructError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for ImageIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Strip a trailing `@digest` or `:tag`.
fn without_reference(path: &str) -> &str {
    let path = path.split_once('@').map_or(path, |(path, _)| path);
    match path.rsplit_once(':') {
        Some((path, tag)) if !tag.contains('/') => path,
        _ => path,
    }
}

fn is_private_registry(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    match labels.as_slice() {
        [account, "dkr", "ecr", region, "amazonaws", "com"] => {
            account.len() == ACCOUNT_ID_LENGTH
                && account.bytes().all(|b| b.is_ascii_digit())
                && !region.is_empty()
        }
        _ => false,
    }
}

/// Properties of an [`ImageService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageServiceProps {
    /// Image to run, e.g. `public.ecr.aws/nginx/nginx:latest`.
    pub image_identifier: String,
    /// Physical service name. Generated when `None`.
    pub service_name: Option<String>,
    /// Port the container listens on.
    pub port: Option<u16>,
    /// Overrides the image's start command.
    pub start_command: Option<String>,
    /// Runtime environment variables.
    pub environment: BTreeMap<String, String>,
    /// Redeploy when the image tag is updated. Private images only.
    pub auto_deployments_enabled: bool,
    /// Instance sizing.
    pub instance: Option<InstanceConfiguration>,
}

impl ImageServiceProps {
    /// Run `image_identifier` with platform defaults.
    pub fn new(image_identifier: impl Into<String>) -> Self {
        Self {
            image_identifier: image_identifier.into(),
            service_name: None,
            port: None,
            start_command: None,
            environment: BTreeMap::new(),
            auto_deployments_enabled: false,
            instance: None,
        }
    }

    /// Give the service a physical name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Listen on `port`.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Start the container with `command`.
    pub fn with_start_command(mut self, command: impl Into<String>) -> Self {
        self.start_command = Some(command.into());
        self
    }

    /// Set a runtime environment variable.
    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Enable or disable automatic deployments.
    pub fn with_auto_deployments(mut self, enabled: bool) -> Self {
        self.auto_deployments_enabled = enabled;
        self
    }

    /// Size each instance.
    pub fn with_instance(mut self, cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        self.instance = Some(InstanceConfiguration {
            cpu: cpu.into(),
            memory: memory.into(),
        });
        self
    }
}

/// A container image run as a managed service.
///
/// Declares an access role trusted only by the platform's build agent with
/// exactly one managed policy, and the service itself. The service uses the
/// access role only for private images.
#[derive(Debug, Clone)]
pub struct ImageService {
    image: ImageIdentifier,
    access_role: Role,
    service: ServiceRunner,
}

impl ImageService {
    /// Declare the access role and service below `id`.
    pub fn new(
        stack: &mut Stack,
        id: &str,
        props: ImageServiceProps,
    ) -> Result<Self, ConstructError> {
        let image = ImageIdentifier::parse(&props.image_identifier)?;
        let service_path = child_path(id, "Service");

        let mut service_props = ServiceRunnerProps {
            service_name: props.service_name,
            image: ImageSource {
                identifier: image.as_str().to_string(),
                repository_type: image.repository_type(),
                configuration: ImageConfiguration {
                    port: props.port,
                    start_command: props.start_command,
                    environment: props.environment,
                },
            },
            auto_deployments_enabled: props.auto_deployments_enabled,
            access_role_arn: None,
            instance: props.instance,
        };
        service_props.validate(&service_path)?;
        if stack.contains(&service_path) {
            return Err(ConstructError::DuplicateId(service_path));
        }

        let access_role = Role::new(
            stack,
            &child_path(id, "AccessRole"),
            RoleProps::assumed_by(ServicePrincipal::new(ServicePrincipal::APP_RUNNER_BUILD))
                .with_managed_policy(ManagedPolicy::aws_managed(ECR_ACCESS_POLICY))
                .with_description(format!("Image pull access for {id}")),
        )?;

        if image.repository_type() == ImageRepositoryType::Ecr {
            service_props.access_role_arn = Some(access_role.arn().clone());
        }
        let service = ServiceRunner::new(stack, &service_path, service_props)?;

        info!(
            service = id,
            image = %image,
            logical_id = service.logical_id(),
            "declared image service"
        );
        Ok(Self {
            image,
            access_role,
            service,
        })
    }

    /// The validated image.
    pub fn image(&self) -> &ImageIdentifier {
        &self.image
    }

    /// The role the platform pulls images with.
    pub fn access_role(&self) -> &Role {
        &self.access_role
    }

    /// The underlying service.
    pub fn service(&self) -> &ServiceRunner {
        &self.service
    }

    /// Placeholders for the provisioned identifier, id, URL and status.
    pub fn outputs(&self) -> &ServiceOutputs {
        self.service.outputs()
    }

    /// See [`ServiceRunner::grant_read`].
    pub fn grant_read(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.service.grant_read(principal)
    }

    /// See [`ServiceRunner::grant_write`].
    pub fn grant_write(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.service.grant_write(principal)
    }

    /// See [`ServiceRunner::grant_operate`].
    pub fn grant_operate(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.service.grant_operate(principal)
    }

    /// See [`ServiceRunner::grant_read_write`].
    pub fn grant_read_write(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.service.grant_read_write(principal)
    }
}

impl Synthesize for ImageService {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        self.access_role.synthesize(template)?;
        self.service.synthesize(template)?;

        for (name, token) in self.outputs().entries() {
            template.add_output(
                format!("{}{name}", self.service.logical_id()),
                Output::new(substituted(&token.to_string()))
                    .with_description(format!("{name} of {}", self.image)),
            )?;
        }
        Ok(())
    }
}
