//! Groups.

use serde::{Deserialize, Serialize};

use crate::value::{Value, Vars};

/// A group declaration: identity, parent links, and variables.
///
/// Groups form a directed acyclic graph through their parent lists; a group
/// may have multiple parents and parents may be shared between groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group identifier within an inventory.
    pub name: String,

    /// Parent groups in declared order. Order matters for precedence;
    /// duplicates collapse to the first occurrence.
    #[serde(default)]
    pub parents: Vec<String>,

    /// Group-scoped variables.
    #[serde(default)]
    pub vars: Vars,
}

impl Group {
    /// Creates an empty group with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            vars: Vars::new(),
        }
    }

    /// Appends a parent link, keeping declared order and ignoring
    /// duplicates.
    pub fn push_parent(&mut self, parent: impl Into<String>) {
        let parent = parent.into();
        if !self.parents.iter().any(|p| *p == parent) {
            self.parents.push(parent);
        }
    }

    /// Sets a group variable.
    pub fn set_var(&mut self, key: impl Into<String>, value: Value) {
        self.vars.insert(key.into(), value);
    }
}
