//! snapvcs: Snapshot Version Control
//!
//! An immutable commit graph built from a mutable staging area, persisted
//! to a content-addressed store keyed by SHA-256:
//! - Staging area of pending additions/modifications and removals
//! - Fully materialized snapshots (name → content hash, no deltas)
//! - Append-only snapshot store with branch pointers
//! - Versioned on-disk records, written atomically
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`branch`] | Branch pointers and the active branch |
//! | [`codec`] | Versioned JSON record envelopes and atomic writes |
//! | [`commit`] | Snapshot construction and the repository façade |
//! | [`config`] | Repository configuration and on-disk layout |
//! | [`diff`] | Diff between two snapshot content mappings |
//! | [`error`] | Error taxonomy |
//! | [`hash`] | SHA-256 content hashes |
//! | [`meta`] | Initialization marker / root identity record |
//! | [`objects`] | Blob store for staged file bytes |
//! | [`stage`] | File-backed staging area |
//! | [`store`] | Content-addressed snapshot store |
//!
//! # Quick Start
//!
//! ```no_run
//! use snapvcs::{RepoConfig, Repository};
//! use std::path::Path;
//!
//! # fn main() -> snapvcs::Result<()> {
//! let mut repo = Repository::init(RepoConfig::new("."), "Thu Jan 01 00:00:00 1970 +0000")?;
//! repo.add(Path::new("a.txt"))?;
//! let id = repo.commit("Fri Jan 02 00:00:00 1970 +0000", "Add a")?;
//! assert_eq!(repo.head_hash()?, id);
//! # Ok(())
//! # }
//! ```
//!
//! Author: Moroya Sakamoto

pub mod branch;
pub mod codec;
pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod hash;
pub mod meta;
pub mod objects;
pub mod stage;
pub mod store;

pub use branch::{Branch, BranchTable};
pub use commit::{Commit, Repository, INITIAL_MESSAGE};
pub use config::RepoConfig;
pub use diff::{diff_contents, ContentChange};
pub use error::{Result, VcsError};
pub use hash::{hash_file, Hash};
pub use meta::RepoMeta;
pub use objects::ObjectStore;
pub use stage::{PendingChanges, StageOutcome, StagingArea};
pub use store::SnapshotStore;
