use thiserror::Error;

use crate::{Capability, ResourceKind};

/// Errors raised while building grants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrantError {
    /// A grant was requested with no actions.
    #[error("Cannot grant to '{principal}': no actions given")]
    EmptyActions {
        /// The principal the grant was meant for.
        principal: String,
    },

    /// A grant was requested with no resources.
    #[error("Cannot grant to '{principal}': no resources given")]
    EmptyResources {
        /// The principal the grant was meant for.
        principal: String,
    },

    /// The registry has no action set for this pair.
    #[error("No '{capability}' capability is registered for {kind} resources")]
    UnknownCapability {
        /// Resource kind that was asked.
        kind: ResourceKind,
        /// Capability that was asked.
        capability: Capability,
    },
}
