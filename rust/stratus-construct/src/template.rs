use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use stratus_identity::contains_tokens;

use crate::{ConstructError, DeletionPolicy};

/// Template format version emitted in every template.
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Render a string that may contain `${...}` placeholders.
///
/// Plain strings stay strings; anything with a placeholder becomes
/// `{"Fn::Sub": "..."}`.
pub fn substituted(value: &str) -> Value {
    if contains_tokens(value) {
        json!({ "Fn::Sub": value })
    } else {
        Value::String(value.to_string())
    }
}

/// Something that renders declarations into a [`Template`].
pub trait Synthesize {
    /// Add this construct's declarations (and those of its children).
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError>;
}

/// One declared resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDeclaration {
    #[serde(rename = "Type")]
    resource_type: String,

    #[serde(rename = "Properties", skip_serializing_if = "is_empty_object")]
    properties: Value,

    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,

    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    deletion_policy: Option<DeletionPolicy>,

    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none")]
    update_replace_policy: Option<DeletionPolicy>,
}

fn is_empty_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

impl ResourceDeclaration {
    /// A declaration of `resource_type` with `properties`.
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    /// Require `logical_id` to exist first (and be deleted after this one).
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
        self
    }

    /// Set both the deletion and update-replace policy.
    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    /// The platform resource type, e.g. `AWS::S3::Bucket`.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// All properties.
    pub fn properties(&self) -> &Value {
        &self.properties
    }

    /// One top-level property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Explicit dependencies.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    /// The deletion policy, if one was set.
    pub fn deletion_policy(&self) -> Option<DeletionPolicy> {
        self.deletion_policy
    }
}

/// A named template output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    #[serde(rename = "Value")]
    value: Value,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Output {
    /// An output of `value`.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The output's value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The rendered declarations of one stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    description: Option<String>,
    resources: BTreeMap<String, ResourceDeclaration>,
    outputs: BTreeMap<String, Output>,
}

impl Template {
    /// An empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Declare a resource under `logical_id`.
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        declaration: ResourceDeclaration,
    ) -> Result<(), ConstructError> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(ConstructError::DuplicateId(logical_id));
        }
        self.resources.insert(logical_id, declaration);
        Ok(())
    }

    /// Declare an output under `name`.
    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        output: Output,
    ) -> Result<(), ConstructError> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(ConstructError::DuplicateId(name));
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    /// The declaration for `logical_id`.
    pub fn resource(&self, logical_id: &str) -> Option<&ResourceDeclaration> {
        self.resources.get(logical_id)
    }

    /// All declarations, ordered by logical id.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceDeclaration)> {
        self.resources
            .iter()
            .map(|(logical_id, declaration)| (logical_id.as_str(), declaration))
    }

    /// Declarations of one resource type.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ResourceDeclaration)> {
        self.resources()
            .filter(move |(_, declaration)| declaration.resource_type == resource_type)
    }

    /// The output named `name`.
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The template as a JSON value.
    pub fn to_json(&self) -> Result<Value, ConstructError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Serialize)]
struct Rendered<'a> {
    #[serde(rename = "AWSTemplateFormatVersion")]
    version: &'static str,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(rename = "Resources")]
    resources: &'a BTreeMap<String, ResourceDeclaration>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    outputs: &'a BTreeMap<String, Output>,
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Rendered {
            version: TEMPLATE_FORMAT_VERSION,
            description: self.description.as_deref(),
            resources: &self.resources,
            outputs: &self.outputs,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_substitutes_only_placeholders() {
        assert_eq!(substituted("index.html"), json!("index.html"));
        assert_eq!(
            substituted("${Site.Arn}/*"),
            json!({ "Fn::Sub": "${Site.Arn}/*" })
        );
    }

    #[test]
    fn it_refuses_duplicate_logical_ids() {
        let mut template = Template::new();
        let declaration = ResourceDeclaration::new("AWS::S3::Bucket", json!({}));

        assert!(template.add_resource("Site", declaration.clone()).is_ok());
        assert!(matches!(
            template.add_resource("Site", declaration),
            Err(ConstructError::DuplicateId(id)) if id == "Site"
        ));
    }

    #[test]
    fn it_renders_declarations() -> TestResult {
        let mut template = Template::new();
        template.add_resource(
            "Site",
            ResourceDeclaration::new("AWS::S3::Bucket", json!({}))
                .depends_on("Other")
                .depends_on("Other")
                .with_deletion_policy(DeletionPolicy::Retain),
        )?;

        assert_eq!(
            template.to_json()?,
            json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Resources": {
                    "Site": {
                        "Type": "AWS::S3::Bucket",
                        "DependsOn": ["Other"],
                        "DeletionPolicy": "Retain",
                        "UpdateReplacePolicy": "Retain"
                    }
                }
            })
        );
        Ok(())
    }
}
