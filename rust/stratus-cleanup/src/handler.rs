use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{CleanupError, CleanupSettings, CleanupTarget, ContentStore, ItemId, StoreError};

/// Outcome of emptying one container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Items found by the listing.
    pub listed: usize,
    /// Items passed to successful deletion calls.
    pub deleted: usize,
    /// Deletion calls made.
    pub batches: usize,
    /// True when the container no longer existed.
    pub absent: bool,
}

/// Something that can empty a [`CleanupTarget`].
#[async_trait]
pub trait Cleanup: Send + Sync {
    /// Remove every item from `target`.
    ///
    /// Must be safe to call repeatedly: an already empty or missing target
    /// is a success.
    async fn empty(&self, target: &CleanupTarget) -> Result<CleanupReport, CleanupError>;
}

/// Empties containers in a [`ContentStore`].
///
/// Every invocation lists the container from scratch and keeps no state
/// between calls, so redelivered events converge on an empty container.
#[derive(Debug, Clone)]
pub struct CleanupHandler<S> {
    store: S,
    settings: CleanupSettings,
}

impl<S> CleanupHandler<S>
where
    S: ContentStore,
{
    /// A handler over `store`.
    pub fn new(store: S, settings: CleanupSettings) -> Self {
        Self { store, settings }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn list_all(&self, container: &str) -> Result<Option<Vec<ItemId>>, StoreError> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = match self.store.list(container, token.as_deref()).await {
                Ok(page) => page,
                Err(StoreError::NotFound(_)) => return Ok(None),
                Err(error) => return Err(error),
            };
            debug!(
                container,
                count = page.items.len(),
                more = page.next_token.is_some(),
                "listed page"
            );
            items.extend(page.items);

            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(Some(items)),
            }
        }
    }

    async fn delete_all(
        &self,
        target: &CleanupTarget,
        items: &[ItemId],
        report: &mut CleanupReport,
    ) -> Result<(), StoreError> {
        let batch_size = self.settings.batch_size(target.kind);

        for batch in items.chunks(batch_size) {
            match self.store.delete(&target.name, batch).await {
                Ok(()) => {
                    report.batches += 1;
                    report.deleted += batch.len();
                    debug!(container = %target.name, count = batch.len(), "deleted batch");
                }
                Err(StoreError::NotFound(_)) => {
                    report.absent = true;
                    return Ok(());
                }
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S> Cleanup for CleanupHandler<S>
where
    S: ContentStore,
{
    async fn empty(&self, target: &CleanupTarget) -> Result<CleanupReport, CleanupError> {
        let expected = self.store.kind();
        if target.kind != expected {
            return Err(CleanupError::KindMismatch {
                expected,
                found: target.kind,
            });
        }

        let mut report = CleanupReport::default();

        let items = match self.list_all(&target.name).await {
            Ok(Some(items)) => items,
            Ok(None) => {
                info!(
                    container = %target.name,
                    kind = %target.kind,
                    "container absent, nothing to empty"
                );
                report.absent = true;
                return Ok(report);
            }
            Err(store_error) => {
                error!(container = %target.name, error = %store_error, "listing failed");
                return Err(store_error.into());
            }
        };
        report.listed = items.len();

        if let Err(store_error) = self.delete_all(target, &items, &mut report).await {
            error!(
                container = %target.name,
                deleted = report.deleted,
                error = %store_error,
                "deletion failed"
            );
            return Err(store_error.into());
        }

        info!(
            container = %target.name,
            kind = %target.kind,
            deleted = report.deleted,
            batches = report.batches,
            "container emptied"
        );
        Ok(report)
    }
}
