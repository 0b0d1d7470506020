use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stratus_cleanup::{CleanupError, CleanupResponse, PropertyValue};

/// Routing fields of a lifecycle event, read next to the
/// [`CleanupRequest`](stratus_cleanup::CleanupRequest) from the same
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceEvent {
    /// Presigned URL the outcome is uploaded to.
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    /// Stack the trigger belongs to.
    pub stack_id: String,
    /// Id of this lifecycle request.
    pub request_id: String,
    /// Logical id of the trigger in its template.
    pub logical_resource_id: String,
    /// Physical id assigned on create.
    #[serde(default)]
    pub physical_resource_id: Option<String>,
}

/// Outcome of a lifecycle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplyStatus {
    /// The request succeeded.
    Success,
    /// The request failed; the orchestrator rolls back.
    Failed,
}

/// The document uploaded to an event's response URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceReply {
    /// Success or failure.
    pub status: ReplyStatus,
    /// Human readable explanation, shown in stack events.
    pub reason: String,
    /// Physical id of the trigger.
    pub physical_resource_id: String,
    /// Echoed from the event.
    pub stack_id: String,
    /// Echoed from the event.
    pub request_id: String,
    /// Echoed from the event.
    pub logical_resource_id: String,
    /// Attributes exposed on the trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, PropertyValue>>,
}

impl ResourceReply {
    /// The reply to `event` given how handling it went.
    pub fn new(event: &ResourceEvent, outcome: Result<CleanupResponse, &CleanupError>) -> Self {
        let (status, reason, physical_resource_id, data) = match outcome {
            Ok(response) => (
                ReplyStatus::Success,
                "OK".to_string(),
                response.physical_resource_id,
                response.data,
            ),
            Err(failure) => (
                ReplyStatus::Failed,
                failure.to_string(),
                event
                    .physical_resource_id
                    .clone()
                    .unwrap_or_else(|| event.logical_resource_id.clone()),
                None,
            ),
        };

        Self {
            status,
            reason,
            physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data,
        }
    }
}
