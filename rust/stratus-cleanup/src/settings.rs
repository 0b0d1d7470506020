use tracing::warn;

use crate::ContentKind;

/// Environment variable overriding the deletion batch size for every kind.
pub const BATCH_SIZE_ENV_VAR: &str = "STRATUS_CLEANUP_BATCH_SIZE";

/// Most images accepted by one repository batch deletion.
pub const REPOSITORY_BATCH_LIMIT: usize = 100;

/// Most objects accepted by one bucket batch deletion.
pub const BUCKET_BATCH_LIMIT: usize = 1000;

/// Tunables for [`CleanupHandler`](crate::CleanupHandler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupSettings {
    repository_batch_size: usize,
    bucket_batch_size: usize,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            repository_batch_size: REPOSITORY_BATCH_LIMIT,
            bucket_batch_size: BUCKET_BATCH_LIMIT,
        }
    }
}

impl CleanupSettings {
    /// Defaults, with the batch size taken from
    /// `STRATUS_CLEANUP_BATCH_SIZE` when it holds a positive integer.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let settings = Self::default();
        let Some(raw) = lookup(BATCH_SIZE_ENV_VAR) else {
            return settings;
        };

        match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => settings.with_batch_size(size),
            _ => {
                warn!(var = BATCH_SIZE_ENV_VAR, value = %raw, "ignoring invalid batch size");
                settings
            }
        }
    }

    /// Use `size` for every kind. Zero is treated as one.
    pub fn with_batch_size(self, size: usize) -> Self {
        let size = size.max(1);
        Self {
            repository_batch_size: size,
            bucket_batch_size: size,
        }
    }

    /// Items per deletion call for `kind`.
    pub fn batch_size(&self, kind: ContentKind) -> usize {
        match kind {
            ContentKind::Repository => self.repository_batch_size,
            ContentKind::Bucket => self.bucket_batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_uses_platform_limits_by_default() {
        let settings = CleanupSettings::from_lookup(|_| None);
        assert_eq!(settings.batch_size(ContentKind::Repository), 100);
        assert_eq!(settings.batch_size(ContentKind::Bucket), 1000);
    }

    #[test]
    fn it_reads_the_batch_size_override() {
        let settings = CleanupSettings::from_lookup(|key| {
            (key == BATCH_SIZE_ENV_VAR).then(|| " 25 ".to_string())
        });
        assert_eq!(settings.batch_size(ContentKind::Repository), 25);
        assert_eq!(settings.batch_size(ContentKind::Bucket), 25);
    }

    #[test]
    fn it_ignores_unusable_overrides() {
        for raw in ["0", "-3", "many"] {
            let settings = CleanupSettings::from_lookup(|_| Some(raw.to_string()));
            assert_eq!(settings, CleanupSettings::default());
        }
    }
}
