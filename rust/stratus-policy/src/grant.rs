use stratus_identity::Arn;
use tracing::debug;

use crate::{GrantError, PolicyStatement, Principal};

/// Receipt for one attached statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    principal_id: String,
    index: usize,
    statement: PolicyStatement,
}

impl Grant {
    /// The principal that received the statement.
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    /// Position of the statement in the principal's document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The attached statement.
    pub fn statement(&self) -> &PolicyStatement {
        &self.statement
    }

    /// Shorthand for `statement().actions()`.
    pub fn actions(&self) -> &[String] {
        self.statement.actions()
    }

    /// Shorthand for `statement().resources()`.
    pub fn resources(&self) -> &[Arn] {
        self.statement.resources()
    }
}

/// Attach one statement allowing `actions` on `resources` to `principal`.
///
/// All actions and resources end up in a single statement, in the order
/// given. Nothing is deduplicated, within a call or across calls.
///
/// # Errors
///
/// Fails without touching the document when either list is empty.
pub fn grant<P, A, R>(principal: &mut P, actions: A, resources: R) -> Result<Grant, GrantError>
where
    P: Principal + ?Sized,
    A: IntoIterator,
    A::Item: Into<String>,
    R: IntoIterator<Item = Arn>,
{
    let actions: Vec<String> = actions.into_iter().map(Into::into).collect();
    let resources: Vec<Arn> = resources.into_iter().collect();

    if actions.is_empty() {
        return Err(GrantError::EmptyActions {
            principal: principal.principal_id().to_string(),
        });
    }
    if resources.is_empty() {
        return Err(GrantError::EmptyResources {
            principal: principal.principal_id().to_string(),
        });
    }

    debug!(
        principal = principal.principal_id(),
        actions = ?actions,
        resources = resources.len(),
        "attaching policy statement"
    );

    let statement = PolicyStatement::allow(actions, resources);
    let index = principal
        .policy_document_mut()
        .add_statement(statement.clone());

    Ok(Grant {
        principal_id: principal.principal_id().to_string(),
        index,
        statement,
    })
}
