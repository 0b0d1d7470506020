use serde::Serialize;
use stratus_identity::Arn;

/// Statement effect. Grants only ever allow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Permit the listed actions on the listed resources.
    #[default]
    Allow,
}

/// One allow rule: every action applies to every resource.
///
/// Statements are built once by [`grant`](crate::grant) and have no mutating
/// API afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    effect: Effect,
    #[serde(rename = "Action")]
    actions: Vec<String>,
    #[serde(rename = "Resource")]
    resources: Vec<Arn>,
}

impl PolicyStatement {
    /// An allow statement as-is. [`grant`](crate::grant) is the validated
    /// way to attach one to a principal; this constructor exists for
    /// resource policies, which name their principal separately.
    pub fn allow(actions: Vec<String>, resources: Vec<Arn>) -> Self {
        Self {
            effect: Effect::Allow,
            actions,
            resources,
        }
    }

    /// The effect, always [`Effect::Allow`].
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Actions in the order they were granted.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Resources in the order they were granted.
    pub fn resources(&self) -> &[Arn] {
        &self.resources
    }
}
