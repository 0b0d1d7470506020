use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{ContentKind, ContentStore, ItemId, ListPage, StoreError};

/// Default number of items per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A call observed by a [`MemoryContentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// A listing of one page.
    List {
        /// Container listed.
        container: String,
        /// Continuation token passed in.
        token: Option<String>,
    },
    /// A batch deletion.
    Delete {
        /// Container targeted.
        container: String,
        /// Number of items in the batch.
        count: usize,
    },
}

#[derive(Debug)]
struct DeleteFault {
    remaining: usize,
    error: StoreError,
}

/// A [`ContentStore`] backed by a [`HashMap`] of containers, kept in memory.
///
/// Clones share state, so a test can keep a handle while the handler owns
/// another. Items list in sorted order and the continuation token is the last
/// item of the previous page.
#[derive(Debug, Clone)]
pub struct MemoryContentStore {
    kind: ContentKind,
    page_size: usize,
    containers: Arc<RwLock<HashMap<String, BTreeSet<ItemId>>>>,
    denied: Arc<RwLock<HashSet<String>>>,
    delete_fault: Arc<RwLock<Option<DeleteFault>>>,
    operations: Arc<RwLock<Vec<StoreOperation>>>,
}

impl MemoryContentStore {
    /// An empty store serving containers of `kind`.
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            page_size: DEFAULT_PAGE_SIZE,
            containers: Arc::default(),
            denied: Arc::default(),
            delete_fault: Arc::default(),
            operations: Arc::default(),
        }
    }

    /// Use `page_size` items per listing page (at least one).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create `container` if needed and add `items` to it.
    pub async fn insert<I>(&self, container: &str, items: I)
    where
        I: IntoIterator,
        I::Item: Into<ItemId>,
    {
        let mut containers = self.containers.write().await;
        containers
            .entry(container.to_string())
            .or_default()
            .extend(items.into_iter().map(Into::into));
    }

    /// Remove `container` altogether.
    pub async fn remove_container(&self, container: &str) {
        self.containers.write().await.remove(container);
    }

    /// Refuse every operation on `container` from now on.
    pub async fn deny_access(&self, container: &str) {
        self.denied.write().await.insert(container.to_string());
    }

    /// Let `successes` more deletion calls through, then fail the next one
    /// with `error`. Calls after the failure succeed again.
    pub async fn fail_delete_after(&self, successes: usize, error: StoreError) {
        *self.delete_fault.write().await = Some(DeleteFault {
            remaining: successes,
            error,
        });
    }

    /// Items currently in `container`, sorted. Empty if it does not exist.
    pub async fn items(&self, container: &str) -> Vec<ItemId> {
        self.containers
            .read()
            .await
            .get(container)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call made so far, in order.
    pub async fn operations(&self) -> Vec<StoreOperation> {
        self.operations.read().await.clone()
    }

    async fn check_access(&self, container: &str, operation: &str) -> Result<(), StoreError> {
        if self.denied.read().await.contains(container) {
            return Err(StoreError::AccessDenied {
                container: container.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    async fn take_delete_fault(&self) -> Option<StoreError> {
        let mut fault = self.delete_fault.write().await;
        match fault.as_mut() {
            Some(pending) if pending.remaining > 0 => {
                pending.remaining -= 1;
                None
            }
            Some(_) => fault.take().map(|pending| pending.error),
            None => None,
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    fn kind(&self) -> ContentKind {
        self.kind
    }

    async fn list(&self, container: &str, token: Option<&str>) -> Result<ListPage, StoreError> {
        self.operations.write().await.push(StoreOperation::List {
            container: container.to_string(),
            token: token.map(str::to_string),
        });
        self.check_access(container, "list").await?;

        let containers = self.containers.read().await;
        let items = containers
            .get(container)
            .ok_or_else(|| StoreError::NotFound(container.to_string()))?;

        let after = token.map(ItemId::from);
        let mut remaining = items
            .iter()
            .filter(|item| after.as_ref().is_none_or(|after| *item > after));

        let page: Vec<ItemId> = remaining.by_ref().take(self.page_size).cloned().collect();
        let next_token = match (remaining.next(), page.last()) {
            (Some(_), Some(last)) => Some(last.as_str().to_string()),
            _ => None,
        };

        Ok(ListPage {
            items: page,
            next_token,
        })
    }

    async fn delete(&self, container: &str, items: &[ItemId]) -> Result<(), StoreError> {
        self.operations.write().await.push(StoreOperation::Delete {
            container: container.to_string(),
            count: items.len(),
        });
        self.check_access(container, "delete").await?;
        if let Some(error) = self.take_delete_fault().await {
            return Err(error);
        }

        let mut containers = self.containers.write().await;
        let stored = containers
            .get_mut(container)
            .ok_or_else(|| StoreError::NotFound(container.to_string()))?;
        for item in items {
            stored.remove(item);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[tokio::test]
    async fn it_paginates_in_sorted_order() -> TestResult {
        let store = MemoryContentStore::new(ContentKind::Bucket).with_page_size(2);
        store.insert("site", ["c", "a", "b"]).await;

        let first = store.list("site", None).await?;
        assert_eq!(first.items, vec![ItemId::from("a"), ItemId::from("b")]);
        assert_eq!(first.next_token.as_deref(), Some("b"));

        let second = store.list("site", first.next_token.as_deref()).await?;
        assert_eq!(second.items, vec![ItemId::from("c")]);
        assert_eq!(second.next_token, None);
        Ok(())
    }

    #[tokio::test]
    async fn it_reports_missing_containers() {
        let store = MemoryContentStore::new(ContentKind::Repository);

        assert_eq!(
            store.list("gone", None).await,
            Err(StoreError::NotFound("gone".into()))
        );
    }

    #[tokio::test]
    async fn it_ignores_items_that_are_already_gone() -> TestResult {
        let store = MemoryContentStore::new(ContentKind::Bucket);
        store.insert("site", ["a"]).await;

        store.delete("site", &[ItemId::from("a"), ItemId::from("z")]).await?;

        assert!(store.items("site").await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn it_fails_one_deletion_after_the_allowed_successes() -> TestResult {
        let store = MemoryContentStore::new(ContentKind::Bucket);
        store.insert("site", ["a", "b", "c"]).await;
        let outage = StoreError::Unavailable {
            container: "site".into(),
            reason: "throttled".into(),
        };
        store.fail_delete_after(1, outage.clone()).await;

        store.delete("site", &[ItemId::from("a")]).await?;
        assert_eq!(store.delete("site", &[ItemId::from("b")]).await, Err(outage));
        store.delete("site", &[ItemId::from("c")]).await?;

        assert_eq!(store.items("site").await, vec![ItemId::from("b")]);
        Ok(())
    }
}
