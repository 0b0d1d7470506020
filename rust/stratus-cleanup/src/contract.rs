use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::CleanupError;

/// Property key carrying the target's physical name.
pub const RESOURCE_NAME_PROPERTY: &str = "resourceName";

/// Property key carrying the target's [`ContentKind`].
pub const RESOURCE_KIND_PROPERTY: &str = "resourceKind";

/// Lifecycle event delivered by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    /// The trigger record was created.
    Create,
    /// The trigger record's properties changed.
    Update,
    /// The trigger record (and so its target) is being deleted.
    Delete,
}

impl Display for RequestType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RequestType::Create => "Create",
            RequestType::Update => "Update",
            RequestType::Delete => "Delete",
        })
    }
}

/// A resource property value. The orchestrator only ever sends strings and
/// numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(serde_json::Number),
}

impl PropertyValue {
    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            PropertyValue::Number(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        PropertyValue::Number(value.into())
    }
}

/// Kinds of containers the handler knows how to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// An object-storage bucket.
    Bucket,
    /// A container image repository.
    Repository,
}

impl ContentKind {
    /// The value used for the `resourceKind` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Bucket => "bucket",
            ContentKind::Repository => "repository",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = CleanupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bucket" => Ok(ContentKind::Bucket),
            "repository" => Ok(ContentKind::Repository),
            other => Err(CleanupError::InvalidProperty {
                key: RESOURCE_KIND_PROPERTY,
                reason: format!("unknown kind '{other}'"),
            }),
        }
    }
}

/// One lifecycle event, as delivered to the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRequest {
    /// Which lifecycle transition this is.
    #[serde(rename = "RequestType")]
    pub request_type: RequestType,

    /// Input properties recorded on the trigger.
    #[serde(rename = "ResourceProperties", default)]
    pub resource_properties: BTreeMap<String, PropertyValue>,

    /// Physical id assigned on create; absent on the first create.
    #[serde(
        rename = "PhysicalResourceId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub physical_resource_id: Option<String>,
}

impl CleanupRequest {
    /// A request carrying the properties of `target`.
    pub fn new(request_type: RequestType, target: &CleanupTarget) -> Self {
        let mut resource_properties = BTreeMap::new();
        resource_properties.insert(
            RESOURCE_NAME_PROPERTY.to_string(),
            PropertyValue::from(target.name.as_str()),
        );
        resource_properties.insert(
            RESOURCE_KIND_PROPERTY.to_string(),
            PropertyValue::from(target.kind.as_str()),
        );
        Self {
            request_type,
            resource_properties,
            physical_resource_id: None,
        }
    }

    /// Set the physical id echoed back by the orchestrator.
    pub fn with_physical_resource_id(mut self, id: impl Into<String>) -> Self {
        self.physical_resource_id = Some(id.into());
        self
    }

    /// The container this request is about.
    pub fn target(&self) -> Result<CleanupTarget, CleanupError> {
        CleanupTarget::from_properties(&self.resource_properties)
    }
}

/// Result returned to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Physical id of the trigger record.
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,

    /// Attributes exposed on the trigger record.
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, PropertyValue>>,
}

/// Name and kind of the container to empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CleanupTarget {
    /// Physical name (bucket name, repository name).
    pub name: String,
    /// What sort of container it is.
    pub kind: ContentKind,
}

impl CleanupTarget {
    /// A target named `name`.
    pub fn new(name: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Read `resourceName` and `resourceKind` from trigger properties.
    pub fn from_properties(
        properties: &BTreeMap<String, PropertyValue>,
    ) -> Result<Self, CleanupError> {
        let name = string_property(properties, RESOURCE_NAME_PROPERTY)?;
        if name.is_empty() {
            return Err(CleanupError::InvalidProperty {
                key: RESOURCE_NAME_PROPERTY,
                reason: "empty name".into(),
            });
        }
        let kind = string_property(properties, RESOURCE_KIND_PROPERTY)?.parse()?;

        Ok(Self::new(name, kind))
    }
}

fn string_property<'a>(
    properties: &'a BTreeMap<String, PropertyValue>,
    key: &'static str,
) -> Result<&'a str, CleanupError> {
    properties
        .get(key)
        .ok_or(CleanupError::MissingProperty(key))?
        .as_str()
        .ok_or_else(|| CleanupError::InvalidProperty {
            key,
            reason: "expected a string".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_reads_orchestrator_casing() -> TestResult {
        let request: CleanupRequest = serde_json::from_value(serde_json::json!({
            "RequestType": "Delete",
            "ServiceToken": "arn:aws:lambda:us-east-1:1:function:router",
            "PhysicalResourceId": "site-bucket",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:us-east-1:1:function:router",
                "resourceName": "site-bucket",
                "resourceKind": "bucket",
                "batch": 5
            }
        }))?;

        assert_eq!(request.request_type, RequestType::Delete);
        assert_eq!(request.physical_resource_id.as_deref(), Some("site-bucket"));
        assert_eq!(
            request.target()?,
            CleanupTarget::new("site-bucket", ContentKind::Bucket)
        );
        assert_eq!(
            request.resource_properties.get("batch"),
            Some(&PropertyValue::from(5u64))
        );
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_request_types() {
        let result = serde_json::from_str::<CleanupRequest>(r#"{"RequestType": "Rollback"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn it_reports_missing_and_malformed_properties() {
        let mut properties = BTreeMap::new();
        assert!(matches!(
            CleanupTarget::from_properties(&properties),
            Err(CleanupError::MissingProperty(RESOURCE_NAME_PROPERTY))
        ));

        properties.insert(RESOURCE_NAME_PROPERTY.to_string(), PropertyValue::from(7u64));
        assert!(matches!(
            CleanupTarget::from_properties(&properties),
            Err(CleanupError::InvalidProperty {
                key: RESOURCE_NAME_PROPERTY,
                ..
            })
        ));

        properties.insert(RESOURCE_NAME_PROPERTY.to_string(), PropertyValue::from("x"));
        properties.insert(RESOURCE_KIND_PROPERTY.to_string(), PropertyValue::from("queue"));
        assert!(matches!(
            CleanupTarget::from_properties(&properties),
            Err(CleanupError::InvalidProperty {
                key: RESOURCE_KIND_PROPERTY,
                ..
            })
        ));
    }

    #[test]
    fn it_omits_absent_data() -> TestResult {
        let response = CleanupResponse {
            physical_resource_id: "images".into(),
            data: None,
        };
        assert_eq!(
            serde_json::to_value(&response)?,
            serde_json::json!({ "PhysicalResourceId": "images" })
        );
        Ok(())
    }
}
