use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::{Cleanup, CleanupError, CleanupRequest, CleanupResponse, PropertyValue, RequestType};

/// Key under `Data` reporting how many items a delete removed.
pub const DELETED_ITEMS_ATTRIBUTE: &str = "DeletedItems";

/// Entry point for lifecycle events.
///
/// Create and update are acknowledged without touching storage. Delete
/// forwards the target to the wrapped [`Cleanup`] and fails if it fails,
/// which blocks deletion of the guarded resource.
#[derive(Debug, Clone)]
pub struct Router<C> {
    cleanup: C,
}

impl<C> Router<C>
where
    C: Cleanup,
{
    /// A router delivering deletes to `cleanup`.
    pub fn new(cleanup: C) -> Self {
        Self { cleanup }
    }

    /// The wrapped cleanup.
    pub fn cleanup(&self) -> &C {
        &self.cleanup
    }

    /// Handle one lifecycle event.
    pub async fn handle(&self, request: &CleanupRequest) -> Result<CleanupResponse, CleanupError> {
        let target = request.target()?;
        info!(
            request_type = %request.request_type,
            container = %target.name,
            kind = %target.kind,
            "received lifecycle event"
        );

        let physical_resource_id = request
            .physical_resource_id
            .clone()
            .unwrap_or_else(|| target.name.clone());

        match request.request_type {
            RequestType::Create | RequestType::Update => {
                debug!(%physical_resource_id, "nothing to do");
                Ok(CleanupResponse {
                    physical_resource_id,
                    data: None,
                })
            }
            RequestType::Delete => {
                let report = self.cleanup.empty(&target).await.inspect_err(|cleanup_error| {
                    error!(container = %target.name, error = %cleanup_error, "cleanup failed");
                })?;

                let mut data = BTreeMap::new();
                data.insert(
                    DELETED_ITEMS_ATTRIBUTE.to_string(),
                    PropertyValue::from(report.deleted as u64),
                );
                Ok(CleanupResponse {
                    physical_resource_id,
                    data: Some(data),
                })
            }
        }
    }

    /// Parse a JSON event, handle it and serialize the response.
    pub async fn handle_json(&self, event: &str) -> Result<String, CleanupError> {
        let request: CleanupRequest = serde_json::from_str(event)?;
        let response = self.handle(&request).await?;
        Ok(serde_json::to_string(&response)?)
    }
}
