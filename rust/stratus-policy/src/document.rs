use serde::{Serialize, Serializer};

use crate::PolicyStatement;

/// Policy language version emitted in every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The statements attached to one principal.
///
/// Statements are only ever appended; nothing merges, reorders or edits
/// them in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Append a statement and return its position.
    pub fn add_statement(&mut self, statement: PolicyStatement) -> usize {
        self.statements.push(statement);
        self.statements.len() - 1
    }

    /// All statements in attachment order.
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// True when nothing has been granted.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Serialize)]
struct Rendered<'a> {
    #[serde(rename = "Version")]
    version: &'static str,
    #[serde(rename = "Statement")]
    statements: &'a [PolicyStatement],
}

impl Serialize for PolicyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Rendered {
            version: POLICY_VERSION,
            statements: &self.statements,
        }
        .serialize(serializer)
    }
}
