use std::collections::BTreeSet;

use stratus_identity::Environment;
use tracing::debug;

use crate::{ConstructError, Synthesize, Template};

/// Separator between the segments of a construct path.
pub const PATH_SEPARATOR: char = '/';

/// Prefix of the default bucket for function code archives.
pub const ASSET_BUCKET_PREFIX: &str = "stratus-assets";

const HASH_LENGTH: usize = 8;

/// Join a child id onto its scope's path.
pub fn child_path(scope: &str, id: &str) -> String {
    format!("{scope}{PATH_SEPARATOR}{id}")
}

/// The deployment unit constructs are declared in.
///
/// A stack owns the [`Environment`] identifiers resolve against and the set
/// of construct paths declared so far. Every construct registers its path on
/// creation and receives a logical id unique within the stack.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    environment: Environment,
    asset_bucket: String,
    paths: BTreeSet<String>,
    logical_ids: BTreeSet<String>,
}

impl Stack {
    /// An empty stack deployed into `environment`.
    pub fn new(name: impl Into<String>, environment: Environment) -> Self {
        let asset_bucket = format!(
            "{ASSET_BUCKET_PREFIX}-{}-{}",
            environment.account(),
            environment.region()
        );
        Self {
            name: name.into(),
            environment,
            asset_bucket,
            paths: BTreeSet::new(),
            logical_ids: BTreeSet::new(),
        }
    }

    /// An empty stack whose environment comes from the process environment.
    pub fn from_env(name: impl Into<String>) -> Self {
        Self::new(name, Environment::from_env())
    }

    /// The stack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The environment identifiers resolve against.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Use `bucket` for function code archives instead of the default
    /// `stratus-assets-<account>-<region>`.
    pub fn with_asset_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.asset_bucket = bucket.into();
        self
    }

    /// Bucket holding function code archives.
    pub fn asset_bucket(&self) -> &str {
        &self.asset_bucket
    }

    /// Whether `path` has been declared.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Register a construct path and return its logical id.
    ///
    /// The logical id is the path's alphanumeric characters followed by
    /// eight hex digits of the path's hash, so it is stable across runs and
    /// distinct for distinct paths.
    pub fn allocate(&mut self, path: &str) -> Result<String, ConstructError> {
        validate_path(path)?;
        if self.paths.contains(path) {
            return Err(ConstructError::DuplicateId(path.to_string()));
        }

        let logical_id = logical_id(path);
        if !self.logical_ids.insert(logical_id.clone()) {
            return Err(ConstructError::DuplicateId(path.to_string()));
        }
        self.paths.insert(path.to_string());

        debug!(stack = %self.name, path, %logical_id, "allocated logical id");
        Ok(logical_id)
    }

    /// Render `constructs` into a fresh template.
    pub fn synthesize(&self, constructs: &[&dyn Synthesize]) -> Result<Template, ConstructError> {
        let mut template = Template::new();
        for construct in constructs {
            construct.synthesize(&mut template)?;
        }
        debug!(stack = %self.name, resources = template.len(), "synthesized template");
        Ok(template)
    }
}

fn validate_path(path: &str) -> Result<(), ConstructError> {
    let invalid = |reason: &str| ConstructError::InvalidId {
        id: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("empty"));
    }
    for segment in path.split(PATH_SEPARATOR) {
        if segment.is_empty() {
            return Err(invalid("empty path segment"));
        }
        if !segment.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("segments need at least one letter or digit"));
        }
        if let Some(c) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(invalid(&format!("unsupported character '{c}'")));
        }
    }
    Ok(())
}

fn logical_id(path: &str) -> String {
    let readable: String = path.chars().filter(char::is_ascii_alphanumeric).collect();
    let hash = blake3::hash(path.as_bytes()).to_hex();
    format!("{readable}{}", hash.as_str()[..HASH_LENGTH].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> Stack {
        Stack::new("Test", Environment::new("123456789012", "us-east-1"))
    }

    #[test]
    fn it_derives_stable_logical_ids() -> Result<(), ConstructError> {
        let first = stack().allocate("Site/Source")?;
        let second = stack().allocate("Site/Source")?;

        assert_eq!(first, second);
        assert!(first.starts_with("SiteSource"));
        assert_eq!(first.len(), "SiteSource".len() + 8);
        Ok(())
    }

    #[test]
    fn it_distinguishes_paths_with_the_same_letters() -> Result<(), ConstructError> {
        let mut stack = stack();
        let nested = stack.allocate("Site/Source")?;
        let flat = stack.allocate("SiteSource")?;

        assert_ne!(nested, flat);
        Ok(())
    }

    #[test]
    fn it_rejects_duplicate_and_invalid_paths() -> Result<(), ConstructError> {
        let mut stack = stack();
        stack.allocate("Site")?;

        assert!(matches!(
            stack.allocate("Site"),
            Err(ConstructError::DuplicateId(path)) if path == "Site"
        ));
        for path in ["", "Site//Source", "Site/a b", "Site/--"] {
            assert!(
                matches!(stack.allocate(path), Err(ConstructError::InvalidId { .. })),
                "{path}"
            );
        }
        Ok(())
    }
}
