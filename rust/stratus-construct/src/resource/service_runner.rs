use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};
use stratus_identity::{
    Arn, Environment, IdentityError, ProvisionedAttributes, ResourceIdentity, Token,
};
use stratus_policy::{Capability, Grant, GrantError, Grantable, Principal, ResourceKind};
use tracing::debug;

use crate::{
    ConstructError, ResourceDeclaration, Stack, Synthesize, Template, grant_registered,
    resource::attribute_arn, substituted,
};

/// Registry an image is pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageRepositoryType {
    /// A private registry in the account. Requires an access role.
    #[serde(rename = "ECR")]
    Ecr,
    /// The public registry. Must not use an access role or automatic
    /// deployments.
    #[serde(rename = "ECR_PUBLIC")]
    EcrPublic,
}

/// How the container is started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageConfiguration {
    /// Port the container listens on.
    pub port: Option<u16>,
    /// Overrides the image's start command.
    pub start_command: Option<String>,
    /// Runtime environment variables.
    pub environment: BTreeMap<String, String>,
}

/// The image a service runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// Full image identifier, including tag or digest.
    pub identifier: String,
    /// Registry kind.
    pub repository_type: ImageRepositoryType,
    /// Start-up configuration.
    pub configuration: ImageConfiguration,
}

/// Compute size of each instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfiguration {
    /// vCPU, e.g. `1 vCPU`.
    pub cpu: String,
    /// Memory, e.g. `2 GB`.
    pub memory: String,
}

/// Properties of a [`ServiceRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRunnerProps {
    /// Physical name. Generated by the platform when `None`.
    pub service_name: Option<String>,
    /// What to run.
    pub image: ImageSource,
    /// Redeploy whenever the image tag is updated.
    pub auto_deployments_enabled: bool,
    /// Role used to pull private images.
    pub access_role_arn: Option<Arn>,
    /// Instance sizing. Platform defaults when `None`.
    pub instance: Option<InstanceConfiguration>,
}

impl ServiceRunnerProps {
    /// Check the registry rules without declaring anything.
    ///
    /// Public images can neither be deployed automatically nor pulled with
    /// an access role. `path` only names the construct in the error.
    pub fn validate(&self, path: &str) -> Result<(), ConstructError> {
        if self.image.repository_type != ImageRepositoryType::EcrPublic {
            return Ok(());
        }
        if self.auto_deployments_enabled {
            return Err(ConstructError::InvalidProperty {
                construct: path.to_string(),
                property: "auto_deployments_enabled",
                reason: "public images cannot be deployed automatically".into(),
            });
        }
        if self.access_role_arn.is_some() {
            return Err(ConstructError::InvalidProperty {
                construct: path.to_string(),
                property: "access_role_arn",
                reason: "public images are pulled without an access role".into(),
            });
        }
        Ok(())
    }
}

/// Attribute placeholders of a provisioned service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOutputs {
    /// The service identifier.
    pub arn: Token,
    /// The platform-assigned service id.
    pub id: Token,
    /// The public endpoint.
    pub url: Token,
    /// The current status.
    pub status: Token,
}

impl ServiceOutputs {
    fn new(logical_id: &str) -> Self {
        Self {
            arn: Token::attribute(logical_id, "ServiceArn"),
            id: Token::attribute(logical_id, "ServiceId"),
            url: Token::attribute(logical_id, "ServiceUrl"),
            status: Token::attribute(logical_id, "Status"),
        }
    }

    /// Every output with its name, in declaration order.
    pub fn entries(&self) -> [(&'static str, &Token); 4] {
        [
            ("ServiceArn", &self.arn),
            ("ServiceId", &self.id),
            ("ServiceUrl", &self.url),
            ("Status", &self.status),
        ]
    }

    /// The values assigned at provisioning time.
    pub fn resolve(
        &self,
        attributes: &ProvisionedAttributes,
    ) -> Result<ResolvedServiceOutputs, IdentityError> {
        let value = |token: &Token| {
            attributes
                .get(token)
                .map(str::to_string)
                .ok_or_else(|| IdentityError::UnresolvedToken { key: token.key() })
        };

        Ok(ResolvedServiceOutputs {
            arn: Arn::from_raw(value(&self.arn)?),
            id: value(&self.id)?,
            url: value(&self.url)?,
            status: value(&self.status)?,
        })
    }
}

/// Provisioned service attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServiceOutputs {
    /// The service identifier.
    pub arn: Arn,
    /// The platform-assigned service id.
    pub id: String,
    /// The public endpoint.
    pub url: String,
    /// The current status.
    pub status: String,
}

/// A managed container service.
///
/// Read, write and operate grants target the identifier with `/*`
/// appended, which covers the service's operations. A service with a
/// generated name is also granted on its bare identifier.
#[derive(Debug, Clone)]
pub struct ServiceRunner {
    logical_id: String,
    arn: Arn,
    named: bool,
    props: ServiceRunnerProps,
    outputs: ServiceOutputs,
}

impl ServiceRunner {
    /// Declare a service at `path`.
    pub fn new(
        stack: &mut Stack,
        path: &str,
        props: ServiceRunnerProps,
    ) -> Result<Self, ConstructError> {
        props.validate(path)?;

        let logical_id = stack.allocate(path)?;
        let (arn, named) = match &props.service_name {
            Some(name) => (service_identity(name).resolve(stack.environment()), true),
            None => (attribute_arn(&logical_id, "ServiceArn"), false),
        };
        let outputs = ServiceOutputs::new(&logical_id);

        debug!(%logical_id, image = %props.image.identifier, "declared service");
        Ok(Self {
            logical_id,
            arn,
            named,
            props,
            outputs,
        })
    }

    /// The service's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The service's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// The declared properties.
    pub fn props(&self) -> &ServiceRunnerProps {
        &self.props
    }

    /// Placeholders for the provisioned attributes.
    pub fn outputs(&self) -> &ServiceOutputs {
        &self.outputs
    }

    /// Allow `principal` to describe the service and its operations.
    pub fn grant_read(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Read)
    }

    /// Allow `principal` to change the service configuration.
    pub fn grant_write(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Write)
    }

    /// Allow `principal` to pause, resume and redeploy the service.
    pub fn grant_operate(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Operate)
    }

    /// [`ServiceRunner::grant_read`] and [`ServiceRunner::grant_write`] in
    /// one statement.
    pub fn grant_read_write(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::ReadWrite)
    }

    /// Allow `principal` to create services, connections and autoscaling
    /// configurations.
    pub fn grant_create(
        principal: &mut dyn Principal,
        environment: &Environment,
    ) -> Result<Grant, GrantError> {
        let resources = ["service", "connection", "autoscalingconfiguration"]
            .into_iter()
            .map(|resource_type| {
                ResourceIdentity::new("apprunner", resource_type)
                    .wildcard()
                    .resolve(environment)
            })
            .collect();
        grant_registered(principal, ResourceKind::ServiceRunner, Capability::Create, resources)
    }

    /// Allow `principal` to list every service.
    pub fn grant_list(
        principal: &mut dyn Principal,
        environment: &Environment,
    ) -> Result<Grant, GrantError> {
        let every_service = ResourceIdentity::new("apprunner", "service")
            .wildcard()
            .resolve(environment);
        grant_registered(
            principal,
            ResourceKind::ServiceRunner,
            Capability::List,
            vec![every_service],
        )
    }

    /// Allow `principal` to describe the service called `name`.
    pub fn grant_describe(
        principal: &mut dyn Principal,
        environment: &Environment,
        name: &str,
    ) -> Result<Grant, GrantError> {
        let service = service_identity(name).resolve(environment);
        grant_registered(
            principal,
            ResourceKind::ServiceRunner,
            Capability::Describe,
            vec![service],
        )
    }

    fn source_configuration(&self) -> Result<Value, ConstructError> {
        let image = &self.props.image;

        let mut image_configuration = Map::new();
        if let Some(port) = image.configuration.port {
            image_configuration.insert("Port".into(), json!(port.to_string()));
        }
        if let Some(command) = &image.configuration.start_command {
            image_configuration.insert("StartCommand".into(), json!(command));
        }
        if !image.configuration.environment.is_empty() {
            let variables: Vec<Value> = image
                .configuration
                .environment
                .iter()
                .map(|(name, value)| json!({ "Name": name, "Value": substituted(value) }))
                .collect();
            image_configuration.insert("RuntimeEnvironmentVariables".into(), json!(variables));
        }

        let mut source = Map::new();
        source.insert(
            "AutoDeploymentsEnabled".into(),
            json!(self.props.auto_deployments_enabled),
        );
        if let Some(role) = &self.props.access_role_arn {
            source.insert(
                "AuthenticationConfiguration".into(),
                json!({ "AccessRoleArn": serde_json::to_value(role)? }),
            );
        }
        source.insert(
            "ImageRepository".into(),
            json!({
                "ImageIdentifier": image.identifier,
                "ImageRepositoryType": image.repository_type,
                "ImageConfiguration": image_configuration,
            }),
        );
        Ok(Value::Object(source))
    }
}

fn service_identity(name: &str) -> ResourceIdentity {
    ResourceIdentity::new("apprunner", "service").named(name)
}

impl Grantable for ServiceRunner {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ServiceRunner
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }

    fn grant_targets(&self, capability: Capability) -> Vec<Arn> {
        match capability {
            Capability::Read | Capability::Write | Capability::Operate | Capability::ReadWrite => {
                let children = self.arn.with_suffix("/*");
                if self.named {
                    vec![children]
                } else {
                    vec![self.arn.clone(), children]
                }
            }
            _ => vec![self.identity()],
        }
    }
}

impl Synthesize for ServiceRunner {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let mut properties = Map::new();
        if let Some(name) = &self.props.service_name {
            properties.insert("ServiceName".into(), substituted(name));
        }
        properties.insert("SourceConfiguration".into(), self.source_configuration()?);
        if let Some(instance) = &self.props.instance {
            properties.insert(
                "InstanceConfiguration".into(),
                json!({ "Cpu": instance.cpu, "Memory": instance.memory }),
            );
        }

        template.add_resource(
            &self.logical_id,
            ResourceDeclaration::new("AWS::AppRunner::Service", Value::Object(properties)),
        )
    }
}
