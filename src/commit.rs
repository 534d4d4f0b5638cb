//! Commit and repository model
//!
//! Snapshots (commits) are immutable and fully materialized: each one maps
//! every tracked file name to its content hash, so no snapshot depends on
//! replaying its ancestors. Branches are movable pointers.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::branch::Branch;
use crate::codec;
use crate::config::RepoConfig;
use crate::diff::{diff_contents, ContentChange};
use crate::error::{io_at, Result, VcsError};
use crate::hash::Hash;
use crate::meta::RepoMeta;
use crate::objects::ObjectStore;
use crate::stage::{base_name, PendingChanges, StageOutcome, StagingArea};
use crate::store::SnapshotStore;

/// Message carried by every root snapshot
pub const INITIAL_MESSAGE: &str = "initial commit";

/// A snapshot in the history DAG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    message: String,
    timestamp: String,
    contents: BTreeMap<String, Hash>,
    parents: Vec<Hash>,
    is_merge: bool,
}

impl Commit {
    /// The parentless, empty first snapshot of a repository.
    pub fn root(timestamp: &str) -> Self {
        Self {
            message: String::from(INITIAL_MESSAGE),
            timestamp: timestamp.to_string(),
            contents: BTreeMap::new(),
            parents: Vec::new(),
            is_merge: false,
        }
    }

    /// Build a snapshot on top of `parent` (the first entry of `parents`).
    ///
    /// `contents` = parent's contents, overlaid with `changes.staged`, minus
    /// every name in `changes.removals`. `parent` must be the snapshot
    /// `parents[0]` names.
    pub fn child(
        timestamp: &str,
        message: &str,
        parent: &Commit,
        parents: Vec<Hash>,
        is_merge: bool,
        changes: &PendingChanges,
    ) -> Result<Self> {
        check_request(message, changes, parents.len())?;
        let base = parent.identity()?;
        if base != parents[0] {
            return Err(VcsError::ParentMismatch {
                expected: parents[0],
                found: base,
            });
        }

        let mut contents = parent.contents.clone();
        for (name, hash) in &changes.staged {
            contents.insert(name.clone(), *hash);
        }
        for name in &changes.removals {
            contents.remove(name);
        }

        Ok(Self {
            message: message.to_string(),
            timestamp: timestamp.to_string(),
            contents,
            parents,
            is_merge,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Every tracked file name → content hash
    pub fn contents(&self) -> &BTreeMap<String, Hash> {
        &self.contents
    }

    pub fn parents(&self) -> &[Hash] {
        &self.parents
    }

    /// Fixed two-slot parent view; the root yields `[None, None]`.
    pub fn parent_slots(&self) -> [Option<Hash>; 2] {
        [self.parents.first().copied(), self.parents.get(1).copied()]
    }

    pub fn is_merge(&self) -> bool {
        self.is_merge
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Content hash of the serialized snapshot; the store key.
    pub fn identity(&self) -> Result<Hash> {
        Ok(Hash::of(&codec::canonical_bytes(self)?))
    }
}

/// Validation shared by every non-root snapshot, in reporting order.
fn check_request(message: &str, changes: &PendingChanges, parent_count: usize) -> Result<()> {
    if message.is_empty() {
        return Err(VcsError::EmptyMessage);
    }
    if changes.is_empty() {
        return Err(VcsError::NoChanges);
    }
    if !(1..=2).contains(&parent_count) {
        return Err(VcsError::InvalidParents(parent_count));
    }
    Ok(())
}

/// Repository: manages branches, snapshots, and the staging area
///
/// Holds no live copy of the history: every query reloads it from disk,
/// every mutation writes it back before returning.
pub struct Repository {
    config: RepoConfig,
    meta: RepoMeta,
    stage: StagingArea,
    objects: ObjectStore,
}

impl Repository {
    /// True once `init` has completed for this configuration.
    pub fn is_initialized(config: &RepoConfig) -> Result<bool> {
        Ok(Self::load_marker(config)?.is_some())
    }

    /// The metadata record, or `None` if it is missing or not a record at all
    /// (an init that never finished writing it). A record of another kind
    /// or version is still an error.
    fn load_marker(config: &RepoConfig) -> Result<Option<RepoMeta>> {
        let path = config.meta_path();
        match RepoMeta::load(&path) {
            Err(VcsError::Schema { found, .. }) if found == codec::UNRECOGNIZED => {
                warn!("ignoring undecodable {}", path.display());
                Ok(None)
            }
            other => other,
        }
    }

    /// Create the repository: root snapshot, default branch, empty stage.
    pub fn init(config: RepoConfig, timestamp: &str) -> Result<Self> {
        let repo_dir = config.repo_dir();
        if Self::is_initialized(&config)? {
            return Err(VcsError::AlreadyInitialized(repo_dir));
        }
        fs::create_dir_all(&repo_dir).map_err(io_at(&repo_dir))?;

        let mut store = SnapshotStore::new();
        let root = store.insert(Commit::root(timestamp))?;
        store
            .branches_mut()
            .create(&config.default_branch, root, true)?;
        store.save(&config.history_path(), config.fsync)?;

        let stage = StagingArea::create(config.stage_path(), config.fsync)?;
        let objects = ObjectStore::new(config.objects_dir(), config.fsync);

        // marker goes last: a crash before this point leaves "not initialized"
        let meta = RepoMeta {
            root,
            default_branch: config.default_branch.clone(),
            created: timestamp.to_string(),
        };
        meta.save(&config.meta_path(), config.fsync)?;

        info!(
            "initialized repository at {} (root {}, branch {})",
            repo_dir.display(),
            root.short(),
            config.default_branch
        );
        Ok(Self {
            config,
            meta,
            stage,
            objects,
        })
    }

    /// Attach to an initialized repository.
    pub fn open(config: RepoConfig) -> Result<Self> {
        let meta = Self::load_marker(&config)?
            .ok_or_else(|| VcsError::NotInitialized(config.repo_dir()))?;
        let stage = StagingArea::open(config.stage_path(), config.fsync)?;
        let objects = ObjectStore::new(config.objects_dir(), config.fsync);
        Ok(Self {
            config,
            meta,
            stage,
            objects,
        })
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn staging(&mut self) -> &mut StagingArea {
        &mut self.stage
    }

    fn load_store(&self) -> Result<SnapshotStore> {
        SnapshotStore::load(&self.config.history_path())
    }

    // ── Staging ────────────────────────────────────────────────────────

    /// Stage a working-directory file (relative to the work dir, or absolute)
    /// and keep its bytes in the object store.
    ///
    /// The file is read once; its bytes are stored before the stage records
    /// their hash, so a staged hash always has a readable blob.
    pub fn add(&mut self, path: &Path) -> Result<StageOutcome> {
        let full = self.config.work_path(path);
        if !full.is_file() {
            return Err(VcsError::FileNotFound(full));
        }
        let name = base_name(&full)?;
        let head = self.head()?;
        let bytes = fs::read(&full).map_err(io_at(&full))?;
        let hash = self.objects.put(&bytes)?;
        self.stage.stage_content(&name, hash, &head)
    }

    /// Stage `name` for removal from the next snapshot.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.stage.stage_for_removal(name)
    }

    pub fn unstage(&mut self, name: &str) -> Result<bool> {
        self.stage.unstage(name)
    }

    // ── Snapshots ──────────────────────────────────────────────────────

    /// Build a snapshot from the staging area, persist it and advance the
    /// active branch to it. The staging area is left as is.
    ///
    /// Nothing is written unless every check passes.
    pub fn record_snapshot(
        &mut self,
        timestamp: &str,
        message: &str,
        parents: &[Hash],
        is_merge: bool,
    ) -> Result<Hash> {
        let changes = self.stage.pending()?;
        check_request(message, &changes, parents.len())?;

        let mut store = self.load_store()?;
        for id in parents {
            if !store.contains(id) {
                return Err(VcsError::UnknownSnapshot(*id));
            }
        }
        let parent = store
            .get(&parents[0])
            .ok_or(VcsError::UnknownSnapshot(parents[0]))?;

        let commit = Commit::child(timestamp, message, parent, parents.to_vec(), is_merge, &changes)?;
        let id = store.insert(commit)?;
        store.branches_mut().advance_active(id)?;
        store.save(&self.config.history_path(), self.config.fsync)?;

        info!(
            "[{} {}] {}",
            store.branches().active_name(),
            id.short(),
            message
        );
        Ok(id)
    }

    /// Commit the staged changes on top of HEAD, then clear the stage.
    pub fn commit(&mut self, timestamp: &str, message: &str) -> Result<Hash> {
        let head = self.head_hash()?;
        let id = self.record_snapshot(timestamp, message, &[head], false)?;
        self.clear_after(id);
        Ok(id)
    }

    /// Record a merge snapshot with parents `[HEAD, branch HEAD]`.
    ///
    /// The caller stages the merged result; no content merging happens here.
    pub fn merge_commit(&mut self, timestamp: &str, message: &str, branch: &str) -> Result<Hash> {
        let store = self.load_store()?;
        let head = store.head_hash()?;
        let other = store
            .branches()
            .get(branch)
            .ok_or_else(|| VcsError::UnknownBranch(branch.to_string()))?
            .head;
        let id = self.record_snapshot(timestamp, message, &[head, other], true)?;
        self.clear_after(id);
        Ok(id)
    }

    /// `id` is already durable and its branch has moved: a failed clear is
    /// logged, not returned, and the leftover entries stay until the next one.
    fn clear_after(&mut self, id: Hash) {
        if let Err(e) = self.stage.clear() {
            warn!("committed {} but could not clear the stage: {e}", id.short());
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Get current HEAD identity
    pub fn head_hash(&self) -> Result<Hash> {
        self.load_store()?.head_hash()
    }

    /// Get current HEAD snapshot
    pub fn head(&self) -> Result<Commit> {
        let store = self.load_store()?;
        let id = store.head_hash()?;
        store.get(&id).cloned().ok_or(VcsError::UnknownSnapshot(id))
    }

    pub fn root_hash(&self) -> Hash {
        self.meta.root
    }

    /// Root snapshot, resolved from disk.
    pub fn root(&self) -> Result<Commit> {
        let root = self.meta.root;
        self.get_commit(&root)?.ok_or(VcsError::UnknownSnapshot(root))
    }

    /// Get commit by identity
    pub fn get_commit(&self, id: &Hash) -> Result<Option<Commit>> {
        Ok(self.load_store()?.get(id).cloned())
    }

    /// Total commit count
    pub fn commit_count(&self) -> Result<usize> {
        Ok(self.load_store()?.len())
    }

    /// First-parent history from HEAD, newest first.
    pub fn log(&self) -> Result<Vec<(Hash, Commit)>> {
        let store = self.load_store()?;
        let head = store.head_hash()?;
        Ok(store
            .ancestors(head)
            .into_iter()
            .map(|(id, c)| (id, c.clone()))
            .collect())
    }

    /// Diff between two commits
    pub fn diff(&self, from: &Hash, to: &Hash) -> Result<Vec<ContentChange>> {
        let store = self.load_store()?;
        let a = store.get(from).ok_or(VcsError::UnknownSnapshot(*from))?;
        let b = store.get(to).ok_or(VcsError::UnknownSnapshot(*to))?;
        Ok(diff_contents(a.contents(), b.contents()))
    }

    /// Bytes recorded for a content hash, if they were staged here.
    pub fn read_blob(&self, hash: &Hash) -> Result<Option<Vec<u8>>> {
        self.objects.get(hash)
    }

    // ── Branches ───────────────────────────────────────────────────────

    /// Create a new branch at current HEAD
    pub fn create_branch(&mut self, name: &str) -> Result<Branch> {
        let mut store = self.load_store()?;
        let head = store.head_hash()?;
        let branch = store.branches_mut().create(name, head, false)?;
        store.save(&self.config.history_path(), self.config.fsync)?;
        Ok(branch)
    }

    /// Switch the active branch. Only the pointer moves; the working
    /// directory and staging area are untouched.
    pub fn checkout(&mut self, name: &str) -> Result<()> {
        let mut store = self.load_store()?;
        store.branches_mut().checkout(name)?;
        store.save(&self.config.history_path(), self.config.fsync)?;
        info!("switched to branch {name}");
        Ok(())
    }

    /// List branches
    pub fn branch_names(&self) -> Result<Vec<String>> {
        Ok(self
            .load_store()?
            .branches()
            .names()
            .into_iter()
            .map(String::from)
            .collect())
    }

    /// Current branch name
    pub fn current_branch(&self) -> Result<String> {
        Ok(self.load_store()?.branches().active_name().to_string())
    }
}
