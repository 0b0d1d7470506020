use serde_json::{Map, Value, json};
use stratus_identity::{Arn, Environment, ResourceIdentity};
use stratus_policy::{
    Capability, Grant, GrantError, Grantable, PolicyDocument, Principal, ResourceKind,
};
use tracing::debug;

use crate::{
    ConstructError, ResourceDeclaration, Stack, Synthesize, Template, grant_registered,
    resource::attribute_arn, substituted,
};

/// Path prefix of roles created for (and assumed by) platform services.
pub const SERVICE_ROLE_PREFIX: &str = "service-role/";

/// A platform service allowed to assume a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipal(String);

impl ServicePrincipal {
    /// The serverless function runtime.
    pub const LAMBDA: &'static str = "lambda.amazonaws.com";

    /// The container service's image build and pull agent.
    pub const APP_RUNNER_BUILD: &'static str = "build.apprunner.amazonaws.com";

    /// A principal for `service`, e.g. `lambda.amazonaws.com`.
    pub fn new(service: impl Into<String>) -> Self {
        Self(service.into())
    }

    /// The service host name.
    pub fn service(&self) -> &str {
        &self.0
    }

    fn trust_policy(&self) -> Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": self.0 },
                "Action": "sts:AssumeRole",
            }]
        })
    }
}

/// A policy maintained by the platform, attached by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPolicy {
    name: String,
}

impl ManagedPolicy {
    /// A platform-managed policy such as
    /// `service-role/AWSLambdaBasicExecutionRole`.
    pub fn aws_managed(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The policy name, including any path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The policy's identifier. Managed policies live in the `aws` account
    /// and carry no region.
    pub fn arn(&self, environment: &Environment) -> Arn {
        Arn::from_raw(format!(
            "arn:{}:iam::aws:policy/{}",
            environment.partition(),
            self.name
        ))
    }
}

/// Properties of a [`Role`].
#[derive(Debug, Clone)]
pub struct RoleProps {
    /// Physical name. Generated by the platform when `None`.
    pub role_name: Option<String>,
    /// The only principal allowed to assume the role.
    pub assumed_by: ServicePrincipal,
    /// Platform-managed policies to attach.
    pub managed_policies: Vec<ManagedPolicy>,
    /// Free-form description.
    pub description: Option<String>,
}

impl RoleProps {
    /// An unnamed role assumable by `principal`.
    pub fn assumed_by(principal: ServicePrincipal) -> Self {
        Self {
            role_name: None,
            assumed_by: principal,
            managed_policies: Vec::new(),
            description: None,
        }
    }

    /// Give the role a fixed name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.role_name = Some(name.into());
        self
    }

    /// Attach a managed policy.
    pub fn with_managed_policy(mut self, policy: ManagedPolicy) -> Self {
        self.managed_policies.push(policy);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An identity role: a principal that owns its inline policy document.
#[derive(Debug, Clone)]
pub struct Role {
    logical_id: String,
    arn: Arn,
    props: RoleProps,
    managed_policy_arns: Vec<Arn>,
    document: PolicyDocument,
}

impl Role {
    /// Declare a role at `path`.
    pub fn new(stack: &mut Stack, path: &str, props: RoleProps) -> Result<Self, ConstructError> {
        let logical_id = stack.allocate(path)?;
        let arn = match &props.role_name {
            Some(name) => role_identity(name).resolve(stack.environment()),
            None => attribute_arn(&logical_id, "Arn"),
        };
        let managed_policy_arns = props
            .managed_policies
            .iter()
            .map(|policy| policy.arn(stack.environment()))
            .collect();

        debug!(%logical_id, assumed_by = props.assumed_by.service(), "declared role");
        Ok(Self {
            logical_id,
            arn,
            props,
            managed_policy_arns,
            document: PolicyDocument::default(),
        })
    }

    /// The role's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The role's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// The principal trusted to assume the role.
    pub fn assumed_by(&self) -> &ServicePrincipal {
        &self.props.assumed_by
    }

    /// Identifiers of the attached managed policies.
    pub fn managed_policy_arns(&self) -> &[Arn] {
        &self.managed_policy_arns
    }

    /// Allow `principal` to read this role.
    pub fn grant_get(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Get)
    }

    /// Allow `principal` to hand this role to a service.
    pub fn grant_pass(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Pass)
    }

    /// Allow `principal` to create any role in the account.
    pub fn grant_create(
        principal: &mut dyn Principal,
        environment: &Environment,
    ) -> Result<Grant, GrantError> {
        let every_role = ResourceIdentity::new("iam", "role")
            .wildcard()
            .global()
            .resolve(environment);
        grant_registered(principal, ResourceKind::Role, Capability::Create, vec![every_role])
    }
}

fn role_identity(name: &str) -> ResourceIdentity {
    ResourceIdentity::new("iam", "role").named(name).global()
}

impl Principal for Role {
    fn principal_id(&self) -> &str {
        &self.logical_id
    }

    fn policy_document(&self) -> &PolicyDocument {
        &self.document
    }

    fn policy_document_mut(&mut self) -> &mut PolicyDocument {
        &mut self.document
    }
}

impl Grantable for Role {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Role
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }
}

impl Synthesize for Role {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let mut properties = Map::new();
        properties.insert(
            "AssumeRolePolicyDocument".into(),
            self.props.assumed_by.trust_policy(),
        );
        if let Some(name) = &self.props.role_name {
            properties.insert("RoleName".into(), substituted(name));
        }
        if let Some(description) = &self.props.description {
            properties.insert("Description".into(), Value::String(description.clone()));
        }
        if !self.managed_policy_arns.is_empty() {
            properties.insert(
                "ManagedPolicyArns".into(),
                serde_json::to_value(&self.managed_policy_arns)?,
            );
        }
        if !self.document.is_empty() {
            properties.insert(
                "Policies".into(),
                json!([{
                    "PolicyName": format!("{}Policy", self.logical_id),
                    "PolicyDocument": serde_json::to_value(&self.document)?,
                }]),
            );
        }

        template.add_resource(
            &self.logical_id,
            ResourceDeclaration::new("AWS::IAM::Role", Value::Object(properties)),
        )
    }
}

/// A role declared elsewhere, referenced by name.
///
/// Service roles live under the `service-role/` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReference {
    arn: Arn,
}

impl RoleReference {
    /// Reference the role `name`, under `service-role/` when `service_role`.
    pub fn new(environment: &Environment, name: &str, service_role: bool) -> Self {
        let full_name = if service_role {
            format!("{SERVICE_ROLE_PREFIX}{name}")
        } else {
            name.to_string()
        };
        Self {
            arn: role_identity(&full_name).resolve(environment),
        }
    }

    /// The referenced role's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// Allow `principal` to read the role.
    pub fn grant_get(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Get)
    }

    /// Allow `principal` to hand the role to a service.
    pub fn grant_pass(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Pass)
    }
}

impl Grantable for RoleReference {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Role
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }
}
