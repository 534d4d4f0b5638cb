//! Staging area
//!
//! File-backed record of pending additions/modifications and pending
//! removals relative to the head snapshot. Every call reloads the whole
//! record from disk first and every mutation writes the whole record back,
//! so the file is the only source of truth between commands.
//!
//! Author: Moroya Sakamoto

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::codec::{self, KIND_STAGE};
use crate::commit::Commit;
use crate::error::{Result, VcsError};
use crate::hash::{hash_file, Hash};

/// Persisted body of the staging record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChanges {
    /// File name → content hash; last write wins
    pub staged: BTreeMap<String, Hash>,
    /// File names to drop from the next snapshot
    pub removals: BTreeSet<String>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.removals.is_empty()
    }
}

/// What `stage_file` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Recorded as a pending addition/modification
    Staged(Hash),
    /// Matches the head snapshot; any pending entry was dropped
    Unchanged,
}

pub struct StagingArea {
    path: PathBuf,
    fsync: bool,
    pending: PendingChanges,
}

impl StagingArea {
    /// Create an empty staging record at `path`, replacing any existing one.
    pub fn create(path: impl Into<PathBuf>, fsync: bool) -> Result<Self> {
        let area = Self {
            path: path.into(),
            fsync,
            pending: PendingChanges::default(),
        };
        area.persist()?;
        Ok(area)
    }

    /// Attach to an existing staging record.
    pub fn open(path: impl Into<PathBuf>, fsync: bool) -> Result<Self> {
        let mut area = Self {
            path: path.into(),
            fsync,
            pending: PendingChanges::default(),
        };
        area.reload()?;
        Ok(area)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stage the file at `path` under its base name.
    ///
    /// If `head` already records the same content for that name the file is
    /// unchanged: a pending entry for it is cancelled instead of recorded.
    pub fn stage_file(&mut self, path: &Path, head: &Commit) -> Result<StageOutcome> {
        if !path.is_file() {
            return Err(VcsError::FileNotFound(path.to_path_buf()));
        }
        let name = base_name(path)?;
        let hash = hash_file(path)?;
        self.stage_content(&name, hash, head)
    }

    /// Stage already-hashed content under `name`, with the same head
    /// comparison as [`StagingArea::stage_file`].
    pub fn stage_content(&mut self, name: &str, hash: Hash, head: &Commit) -> Result<StageOutcome> {
        self.reload()?;
        let outcome = if head.contents().get(name) == Some(&hash) {
            if self.pending.staged.remove(name).is_some() {
                debug!("{name} matches head again, dropped pending entry");
            }
            StageOutcome::Unchanged
        } else {
            self.pending.staged.insert(name.to_string(), hash);
            StageOutcome::Staged(hash)
        };
        self.persist()?;
        Ok(outcome)
    }

    /// Mark `name` for removal from the next snapshot.
    pub fn stage_for_removal(&mut self, name: &str) -> Result<()> {
        self.reload()?;
        self.pending.removals.insert(name.to_string());
        self.persist()
    }

    /// Drop a pending addition/modification. Pending removals are untouched.
    /// Returns whether an entry was present.
    pub fn unstage(&mut self, name: &str) -> Result<bool> {
        self.reload()?;
        let existed = self.pending.staged.remove(name).is_some();
        self.persist()?;
        Ok(existed)
    }

    /// Reset both pending sets together.
    pub fn clear(&mut self) -> Result<()> {
        self.pending = PendingChanges::default();
        self.persist()
    }

    pub fn current_staged(&mut self) -> Result<BTreeMap<String, Hash>> {
        self.reload()?;
        Ok(self.pending.staged.clone())
    }

    pub fn current_removals(&mut self) -> Result<BTreeSet<String>> {
        self.reload()?;
        Ok(self.pending.removals.clone())
    }

    /// Both pending sets as last persisted.
    pub fn pending(&mut self) -> Result<PendingChanges> {
        self.reload()?;
        Ok(self.pending.clone())
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        self.reload()?;
        Ok(self.pending.is_empty())
    }

    fn reload(&mut self) -> Result<()> {
        self.pending = codec::read_record(&self.path, KIND_STAGE)?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        codec::write_record(&self.path, KIND_STAGE, &self.pending, self.fsync)
    }
}

/// Final path component as UTF-8.
pub(crate) fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| VcsError::InvalidPath(path.to_path_buf()))
}
