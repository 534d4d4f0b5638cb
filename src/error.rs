//! Error taxonomy
//!
//! Validation rejections (empty message, nothing staged, missing file)
//! are raised before any durable write and are never retryable.
//! Everything else reports a broken or foreign repository directory.
//!
//! Author: Moroya Sakamoto

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::hash::Hash;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, VcsError>;

#[derive(Debug, Error)]
pub enum VcsError {
    /// Commit attempted with an empty message
    #[error("please enter a commit message")]
    EmptyMessage,

    /// Non-root commit attempted with nothing staged on either axis
    #[error("no changes added to the commit")]
    NoChanges,

    /// Staging requested for a path that is not a file in the working directory
    #[error("file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("not a repository: {} has no metadata record", .0.display())]
    NotInitialized(PathBuf),

    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("unknown snapshot {0}")]
    UnknownSnapshot(Hash),

    #[error("no such branch: {0}")]
    UnknownBranch(String),

    #[error("a branch named {0} already exists")]
    BranchExists(String),

    /// A non-root snapshot needs one parent, or two for a merge
    #[error("a snapshot needs one or two parents, got {0}")]
    InvalidParents(usize),

    /// The base snapshot handed to `Commit::child` is not `parents[0]`
    #[error("base snapshot {found} is not the first parent {expected}")]
    ParentMismatch { expected: Hash, found: Hash },

    #[error("path has no usable file name: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("malformed hash: {0:?}")]
    BadHash(String),

    /// Persisted record has the wrong kind or an unsupported version
    #[error("{}: expected {expected} record, found {found}", .path.display())]
    Schema {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl VcsError {
    /// True for user-facing rejections of an invalid request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            VcsError::EmptyMessage
                | VcsError::NoChanges
                | VcsError::FileNotFound(_)
                | VcsError::InvalidParents(_)
                | VcsError::UnknownBranch(_)
                | VcsError::BranchExists(_)
        )
    }
}

/// Attach a path to an `io::Error`: `.map_err(io_at(&path))`.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(io::Error) -> VcsError + '_ {
    move |source| VcsError::Io {
        path: path.to_path_buf(),
        source,
    }
}
