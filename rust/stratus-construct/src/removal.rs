use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::ConstructError;

/// What happens to a resource when it is removed from the template or the
/// stack is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeletionPolicy {
    /// Keep the resource (and its contents).
    #[default]
    Retain,
    /// Delete the resource. Removable storage gets a lifecycle guard that
    /// empties it first.
    #[serde(rename = "Delete")]
    Destroy,
    /// Snapshot, then delete. Only meaningful for snapshot-capable kinds.
    Snapshot,
}

impl DeletionPolicy {
    /// True only for [`DeletionPolicy::Destroy`].
    pub fn is_destroy(&self) -> bool {
        matches!(self, DeletionPolicy::Destroy)
    }

    /// Fail for [`DeletionPolicy::Snapshot`] on `construct`, a kind that
    /// cannot be snapshotted.
    pub(crate) fn require_snapshot_free(&self, construct: &str) -> Result<(), ConstructError> {
        match self {
            DeletionPolicy::Snapshot => Err(ConstructError::InvalidProperty {
                construct: construct.to_string(),
                property: "deletion_policy",
                reason: "snapshots are not supported for this resource kind".into(),
            }),
            DeletionPolicy::Retain | DeletionPolicy::Destroy => Ok(()),
        }
    }
}

impl Display for DeletionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DeletionPolicy::Retain => "retain",
            DeletionPolicy::Destroy => "destroy",
            DeletionPolicy::Snapshot => "snapshot",
        })
    }
}

impl FromStr for DeletionPolicy {
    type Err = ConstructError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(DeletionPolicy::Retain),
            "destroy" | "delete" => Ok(DeletionPolicy::Destroy),
            "snapshot" => Ok(DeletionPolicy::Snapshot),
            _ => Err(ConstructError::UnknownDeletionPolicy(value.to_string())),
        }
    }
}
