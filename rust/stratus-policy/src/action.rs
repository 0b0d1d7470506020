/// A named, fixed, ordered collection of permission actions.
///
/// A set is stored as one or more parts so that composite capabilities
/// (read-write) reuse the exact lists of their components. Flattening keeps
/// every action of every part, in order.
#[derive(Debug, PartialEq, Eq)]
pub struct ActionSet {
    name: &'static str,
    parts: &'static [&'static [&'static str]],
}

impl ActionSet {
    /// A set made of `parts`, in order.
    pub const fn new(name: &'static str, parts: &'static [&'static [&'static str]]) -> Self {
        Self { name, parts }
    }

    /// The set's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Every action, part by part.
    pub fn actions(&self) -> impl Iterator<Item = &'static str> {
        self.parts.iter().flat_map(|part| part.iter().copied())
    }

    /// Number of actions, counting repeats across parts.
    pub fn len(&self) -> usize {
        self.parts.iter().map(|part| part.len()).sum()
    }

    /// True for a set without actions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `action` appears in any part.
    pub fn contains(&self, action: &str) -> bool {
        self.actions().any(|candidate| candidate == action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READ: &[&str] = &["svc:Get", "svc:List"];
    const WRITE: &[&str] = &["svc:Put"];
    static READ_WRITE: ActionSet = ActionSet::new("read-write", &[READ, WRITE]);

    #[test]
    fn it_flattens_parts_in_order() {
        assert_eq!(
            READ_WRITE.actions().collect::<Vec<_>>(),
            vec!["svc:Get", "svc:List", "svc:Put"]
        );
        assert_eq!(READ_WRITE.len(), 3);
        assert!(READ_WRITE.contains("svc:Put"));
        assert!(!READ_WRITE.contains("svc:Delete"));
    }
}
