use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use stratus_identity::{Arn, Token};
use stratus_policy::{Capability, Grant, GrantError, Grantable, Principal, ResourceKind};
use tracing::debug;

use crate::{
    ConstructError, ResourceDeclaration, Stack, Synthesize, Template, resource::attribute_arn,
    substituted,
};

/// Where a function's code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionCode {
    /// A zip archive in object storage.
    Asset {
        /// Bucket holding the archive. May contain placeholders.
        bucket: String,
        /// Object key of the archive.
        key: String,
    },
}

impl FunctionCode {
    fn to_value(&self) -> Value {
        match self {
            FunctionCode::Asset { bucket, key } => json!({
                "S3Bucket": substituted(bucket),
                "S3Key": key,
            }),
        }
    }
}

/// Properties of a [`Function`].
#[derive(Debug, Clone)]
pub struct FunctionProps {
    /// The code to run.
    pub code: FunctionCode,
    /// Runtime identifier, e.g. `provided.al2023`.
    pub runtime: String,
    /// Entry point within the code.
    pub handler: String,
    /// Execution role.
    pub role: Arn,
    /// Timeout in seconds.
    pub timeout_seconds: u32,
    /// Memory in megabytes.
    pub memory_size: u32,
    /// Environment variables. Values may contain placeholders.
    pub environment: BTreeMap<String, String>,
}

impl FunctionProps {
    /// A function running `code` as `role`, with platform defaults for
    /// everything else.
    pub fn new(code: FunctionCode, role: Arn) -> Self {
        Self {
            code,
            runtime: "provided.al2023".into(),
            handler: "bootstrap".into(),
            role,
            timeout_seconds: 3,
            memory_size: 128,
            environment: BTreeMap::new(),
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Add an environment variable.
    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// A serverless function.
#[derive(Debug, Clone)]
pub struct Function {
    logical_id: String,
    arn: Arn,
    props: FunctionProps,
    dependencies: Vec<String>,
}

impl Function {
    /// Declare a function at `path`.
    pub fn new(
        stack: &mut Stack,
        path: &str,
        props: FunctionProps,
    ) -> Result<Self, ConstructError> {
        let logical_id = stack.allocate(path)?;
        let arn = attribute_arn(&logical_id, "Arn");
        debug!(%logical_id, runtime = %props.runtime, "declared function");

        Ok(Self {
            logical_id,
            arn,
            props,
            dependencies: Vec::new(),
        })
    }

    /// Require `logical_id` to be created before this function.
    pub fn add_dependency(&mut self, logical_id: impl Into<String>) {
        self.dependencies.push(logical_id.into());
    }

    /// The function's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The function's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// The generated function name.
    pub fn name(&self) -> Token {
        Token::reference(&self.logical_id)
    }

    /// The declared properties.
    pub fn props(&self) -> &FunctionProps {
        &self.props
    }

    /// Allow `principal` to invoke this function.
    pub fn grant_invoke(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::Invoke)
    }
}

impl Grantable for Function {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Function
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }
}

impl Synthesize for Function {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let mut properties = Map::new();
        properties.insert("Code".into(), self.props.code.to_value());
        properties.insert("Runtime".into(), json!(self.props.runtime));
        properties.insert("Handler".into(), json!(self.props.handler));
        properties.insert("Role".into(), serde_json::to_value(&self.props.role)?);
        properties.insert("Timeout".into(), json!(self.props.timeout_seconds));
        properties.insert("MemorySize".into(), json!(self.props.memory_size));
        if !self.props.environment.is_empty() {
            let variables: Map<String, Value> = self
                .props
                .environment
                .iter()
                .map(|(key, value)| (key.clone(), substituted(value)))
                .collect();
            properties.insert("Environment".into(), json!({ "Variables": variables }));
        }

        let declaration = self.dependencies.iter().fold(
            ResourceDeclaration::new("AWS::Lambda::Function", Value::Object(properties)),
            |declaration, dependency| declaration.depends_on(dependency),
        );
        template.add_resource(&self.logical_id, declaration)
    }
}
