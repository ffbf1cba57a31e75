//! Registry of user-derived columns
//!
//! Membership here is the only thing that makes a column removable.

/// Names of custom variables in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomRegistry {
    names: Vec<String>,
}

impl CustomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a custom variable. Returns false if it was already registered.
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.is_custom(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    #[must_use]
    pub fn is_custom(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Forget a custom variable. Returns false if it was not registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Registered names in creation order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
