use crate::PolicyDocument;

/// An identity that can hold permissions.
///
/// The principal owns its [`PolicyDocument`]. Grants borrow the principal
/// mutably, so only the grantee's own document is ever written to.
pub trait Principal {
    /// A stable, human readable id (usually the construct's logical id).
    fn principal_id(&self) -> &str;

    /// The statements granted so far.
    fn policy_document(&self) -> &PolicyDocument;

    /// Mutable access used by [`grant`](crate::grant) to append statements.
    fn policy_document_mut(&mut self) -> &mut PolicyDocument;
}

/// A bare principal: an id and a document.
///
/// Useful for identities managed elsewhere (an imported role, a build
/// agent) whose statements are rendered by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyHolder {
    id: String,
    document: PolicyDocument,
}

impl PolicyHolder {
    /// An empty document owned by `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document: PolicyDocument::default(),
        }
    }
}

impl Principal for PolicyHolder {
    fn principal_id(&self) -> &str {
        &self.id
    }

    fn policy_document(&self) -> &PolicyDocument {
        &self.document
    }

    fn policy_document_mut(&mut self) -> &mut PolicyDocument {
        &mut self.document
    }
}
