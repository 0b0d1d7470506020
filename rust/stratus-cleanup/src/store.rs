use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ContentKind, StoreError};

/// Identifier of one stored item: an object key or an image digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap an identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Items on this page.
    pub items: Vec<ItemId>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Storage that holds removable items in named containers.
///
/// Listing is paginated: pass the `next_token` of one page to fetch the
/// next. Deleting items that are already gone is not an error.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The kind of container this store serves.
    fn kind(&self) -> ContentKind;

    /// List one page of items in `container`.
    async fn list(&self, container: &str, token: Option<&str>) -> Result<ListPage, StoreError>;

    /// Delete `items` from `container`.
    async fn delete(&self, container: &str, items: &[ItemId]) -> Result<(), StoreError>;
}
