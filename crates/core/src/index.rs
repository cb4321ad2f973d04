//! Local membership index
//!
//! A set of physical object names the store knows to exist. It answers
//! membership questions without a backend round trip and is kept in step with
//! every write and delete the owning store performs. Writers in other
//! sessions are not observed; call `HierarchicalStore::rebuild_index` to
//! resynchronize.

use std::collections::HashSet;

/// Set of known physical object names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyIndex {
    names: HashSet<String>,
}

impl KeyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is a known object
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record a written object
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Forget a deleted object
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Number of known objects
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no object is known
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for KeyIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
