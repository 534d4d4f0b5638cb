//! Branch pointers
//!
//! Branches are movable names for snapshot identities; exactly one is
//! active and gets advanced by each successful commit.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VcsError};
use crate::hash::Hash;

/// Branch pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name
    pub name: String,
    /// Points to current snapshot identity
    pub head: Hash,
}

impl Branch {
    pub fn id(&self) -> &str {
        &self.name
    }
}

/// All branches plus the active one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTable {
    branches: BTreeMap<String, Hash>,
    active: String,
}

impl BranchTable {
    pub fn all(&self) -> &BTreeMap<String, Hash> {
        &self.branches
    }

    pub fn names(&self) -> Vec<&str> {
        self.branches.keys().map(|s| s.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Branch> {
        self.branches.get(name).map(|&head| Branch {
            name: name.to_string(),
            head,
        })
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> Result<Branch> {
        self.get(&self.active)
            .ok_or_else(|| VcsError::UnknownBranch(self.active.clone()))
    }

    /// Create `name` pointing at `at`; optionally make it the active branch.
    pub fn create(&mut self, name: &str, at: Hash, make_active: bool) -> Result<Branch> {
        if self.branches.contains_key(name) {
            return Err(VcsError::BranchExists(name.to_string()));
        }
        self.branches.insert(name.to_string(), at);
        if make_active {
            self.active = name.to_string();
        }
        info!("created branch {name} at {}", at.short());
        Ok(Branch {
            name: name.to_string(),
            head: at,
        })
    }

    /// Move the active branch to `to`.
    pub fn advance_active(&mut self, to: Hash) -> Result<()> {
        let head = self
            .branches
            .get_mut(&self.active)
            .ok_or_else(|| VcsError::UnknownBranch(self.active.clone()))?;
        *head = to;
        Ok(())
    }

    /// Switch the active branch
    pub fn checkout(&mut self, name: &str) -> Result<()> {
        if !self.branches.contains_key(name) {
            return Err(VcsError::UnknownBranch(name.to_string()));
        }
        self.active = name.to_string();
        Ok(())
    }
}
