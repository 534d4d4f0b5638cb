//! Content-addressed snapshot store
//!
//! Persisted mapping from snapshot identity to snapshot, together with the
//! branch pointers. Both live in one `history` record so inserting a
//! snapshot and advancing the active branch land in the same atomic write.
//! Append-only: nothing here removes a snapshot.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::branch::BranchTable;
use crate::codec::{self, KIND_HISTORY};
use crate::commit::Commit;
use crate::error::Result;
use crate::hash::Hash;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStore {
    snapshots: BTreeMap<Hash, Commit>,
    branches: BranchTable,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        codec::read_record(path, KIND_HISTORY)
    }

    pub fn save(&self, path: &Path, fsync: bool) -> Result<()> {
        codec::write_record(path, KIND_HISTORY, self, fsync)
    }

    /// Store a snapshot, returns its identity
    pub fn insert(&mut self, commit: Commit) -> Result<Hash> {
        let id = commit.identity()?;
        self.snapshots.entry(id).or_insert(commit);
        Ok(id)
    }

    /// Retrieve a snapshot by identity
    pub fn get(&self, id: &Hash) -> Option<&Commit> {
        self.snapshots.get(id)
    }

    /// Get parent identities
    pub fn parents(&self, id: &Hash) -> Option<&[Hash]> {
        self.snapshots.get(id).map(|c| c.parents())
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.snapshots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// List all stored snapshot identities.
    pub fn all_hashes(&self) -> Vec<Hash> {
        self.snapshots.keys().copied().collect()
    }

    pub fn branches(&self) -> &BranchTable {
        &self.branches
    }

    pub fn branches_mut(&mut self) -> &mut BranchTable {
        &mut self.branches
    }

    /// Identity the active branch points at
    pub fn head_hash(&self) -> Result<Hash> {
        Ok(self.branches.active()?.head)
    }

    /// First-parent history from `from`, newest first.
    ///
    /// Stops at the root or at the first identity missing from the store.
    pub fn ancestors(&self, from: Hash) -> Vec<(Hash, &Commit)> {
        let mut out = Vec::new();
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let Some(commit) = self.snapshots.get(&id) else {
                break;
            };
            out.push((id, commit));
            cursor = commit.parents().first().copied();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::PendingChanges;

    fn child_of(parent: &Commit, parent_id: Hash, name: &str, bytes: &[u8]) -> Commit {
        let mut pending = PendingChanges::default();
        pending.staged.insert(name.to_string(), Hash::of(bytes));
        Commit::child("t", &format!("add {name}"), parent, vec![parent_id], false, &pending)
            .unwrap()
    }

    #[test]
    fn test_store_and_retrieve() {
        let mut store = SnapshotStore::new();
        let root = Commit::root("t0");
        let id = store.insert(root.clone()).unwrap();
        assert!(store.contains(&id));
        assert_eq!(store.get(&id), Some(&root));
        assert_eq!(id, root.identity().unwrap());
    }

    #[test]
    fn test_parent_tracking() {
        let mut store = SnapshotStore::new();
        let root = Commit::root("t0");
        let h0 = store.insert(root.clone()).unwrap();
        let h1 = store.insert(child_of(&root, h0, "a.txt", b"a")).unwrap();
        assert_eq!(store.parents(&h1).unwrap(), &[h0]);
        assert_eq!(store.parents(&h0).unwrap(), &[] as &[Hash]);
    }

    #[test]
    fn test_store_count() {
        let mut store = SnapshotStore::new();
        assert!(store.is_empty());
        store.insert(Commit::root("t0")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_same_snapshot_twice() {
        let mut store = SnapshotStore::new();
        let a = store.insert(Commit::root("t0")).unwrap();
        let b = store.insert(Commit::root("t0")).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_all_hashes_matches_len() {
        let mut store = SnapshotStore::new();
        let root = Commit::root("t0");
        let h0 = store.insert(root.clone()).unwrap();
        let h1 = store.insert(child_of(&root, h0, "a.txt", b"a")).unwrap();
        let hashes = store.all_hashes();
        assert_eq!(hashes.len(), store.len());
        assert!(hashes.contains(&h0));
        assert!(hashes.contains(&h1));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let mut store = SnapshotStore::new();
        let root = Commit::root("t0");
        let h0 = store.insert(root.clone()).unwrap();
        let c1 = child_of(&root, h0, "a.txt", b"a");
        let h1 = store.insert(c1.clone()).unwrap();
        let h2 = store.insert(child_of(&c1, h1, "b.txt", b"b")).unwrap();

        let ids: Vec<Hash> = store.ancestors(h2).into_iter().map(|(h, _)| h).collect();
        assert_eq!(ids, vec![h2, h1, h0]);
    }

    #[test]
    fn test_ancestors_of_unknown_is_empty() {
        let store = SnapshotStore::new();
        assert!(store.ancestors(Hash::of(b"nope")).is_empty());
    }

    #[test]
    fn test_save_and_load_with_branches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = SnapshotStore::new();
        let h0 = store.insert(Commit::root("t0")).unwrap();
        store.branches_mut().create("master", h0, true).unwrap();
        store.save(&path, false).unwrap();

        let back = SnapshotStore::load(&path).unwrap();
        assert_eq!(back, store);
        assert_eq!(back.head_hash().unwrap(), h0);
    }

    #[test]
    fn test_head_without_branches_fails() {
        let store = SnapshotStore::new();
        assert!(store.head_hash().is_err());
    }
}
