//! Wrappers around single platform resources.
//!
//! Each wrapper declares one resource, resolves its identity and exposes the
//! capabilities the registry lists for its kind as thin `grant_*` methods.

mod role;
pub use role::*;

mod user;
pub use user::*;

mod function;
pub use function::*;

mod bucket;
pub use bucket::*;

mod repository;
pub use repository::*;

mod origin_access_identity;
pub use origin_access_identity::*;

mod distribution;
pub use distribution::*;

mod service_runner;
pub use service_runner::*;

use stratus_identity::{Arn, Token};
use stratus_policy::{Capability, Grant, GrantError, Principal, ResourceKind, grant, registry};

/// Grant the registered actions for (`kind`, `capability`) on `resources`.
///
/// Used by grants that do not target a single declared resource, such as
/// wildcard create and list permissions.
pub fn grant_registered(
    principal: &mut dyn Principal,
    kind: ResourceKind,
    capability: Capability,
    resources: Vec<Arn>,
) -> Result<Grant, GrantError> {
    let actions = registry::lookup(kind, capability)?;
    grant(principal, actions.actions(), resources)
}

pub(crate) fn attribute_arn(logical_id: &str, attribute: &str) -> Arn {
    Arn::from_raw(Token::attribute(logical_id, attribute).to_string())
}
