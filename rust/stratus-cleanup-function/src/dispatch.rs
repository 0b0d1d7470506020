use async_trait::async_trait;
use stratus_cleanup::{Cleanup, CleanupError, CleanupReport, CleanupTarget, ContentKind};

/// A [`Cleanup`] that sends each target to the cleanup for its kind.
#[derive(Debug, Clone)]
pub struct KindDispatch<B, R> {
    bucket: B,
    repository: R,
}

impl<B, R> KindDispatch<B, R>
where
    B: Cleanup,
    R: Cleanup,
{
    /// Empty buckets with `bucket` and repositories with `repository`.
    pub fn new(bucket: B, repository: R) -> Self {
        Self { bucket, repository }
    }
}

#[async_trait]
impl<B, R> Cleanup for KindDispatch<B, R>
where
    B: Cleanup,
    R: Cleanup,
{
    async fn empty(&self, target: &CleanupTarget) -> Result<CleanupReport, CleanupError> {
        match target.kind {
            ContentKind::Bucket => self.bucket.empty(target).await,
            ContentKind::Repository => self.repository.empty(target).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stratus_cleanup::{CleanupHandler, CleanupSettings, MemoryContentStore};
    use testresult::TestResult;

    #[tokio::test]
    async fn it_empties_each_kind_in_its_own_store() -> TestResult {
        let buckets = MemoryContentStore::new(ContentKind::Bucket);
        let repositories = MemoryContentStore::new(ContentKind::Repository);
        buckets.insert("shared", ["index.html"]).await;
        repositories.insert("shared", ["sha256:a", "sha256:b"]).await;
        let dispatch = KindDispatch::new(
            CleanupHandler::new(buckets.clone(), CleanupSettings::default()),
            CleanupHandler::new(repositories.clone(), CleanupSettings::default()),
        );

        let report = dispatch
            .empty(&CleanupTarget::new("shared", ContentKind::Repository))
            .await?;

        assert_eq!(report.deleted, 2);
        assert!(repositories.items("shared").await.is_empty());
        assert_eq!(buckets.items("shared").await.len(), 1);
        Ok(())
    }
}
