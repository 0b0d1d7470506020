use stratus_identity::Arn;
use tracing::debug;

use crate::{Capability, Grant, GrantError, Principal, ResourceKind, registry};

/// A resource that can hand out permissions on itself.
///
/// Implementors provide their kind and ARN; the curated grants come for free
/// from the registry. Resources whose capabilities target something other
/// than their own ARN (a wildcard over the service, the objects of a bucket)
/// override [`Grantable::grant_targets`].
pub trait Grantable {
    /// Registry key for this resource.
    fn kind(&self) -> ResourceKind;

    /// The resource's own ARN.
    fn identity(&self) -> Arn;

    /// ARNs a capability grant applies to. Defaults to the resource itself.
    fn grant_targets(&self, _capability: Capability) -> Vec<Arn> {
        vec![self.identity()]
    }

    /// Allow `actions` on this resource.
    fn grant(&self, principal: &mut dyn Principal, actions: &[&str]) -> Result<Grant, GrantError> {
        crate::grant(principal, actions.iter().copied(), [self.identity()])
    }

    /// Allow the registered action set for `capability`.
    fn grant_capability(
        &self,
        principal: &mut dyn Principal,
        capability: Capability,
    ) -> Result<Grant, GrantError> {
        let actions = registry::lookup(self.kind(), capability)?;
        debug!(
            kind = %self.kind(),
            %capability,
            principal = principal.principal_id(),
            "granting capability"
        );
        crate::grant(principal, actions.actions(), self.grant_targets(capability))
    }
}
