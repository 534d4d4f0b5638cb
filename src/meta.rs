//! Repository metadata record
//!
//! Written last during `init`; its presence is what makes a directory a
//! repository. It also pins the root snapshot identity so the root can be
//! resolved from disk in any process.
//!
//! Author: Moroya Sakamoto

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{self, KIND_META};
use crate::error::Result;
use crate::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMeta {
    /// Identity of the root snapshot
    pub root: Hash,
    /// Branch created at init
    pub default_branch: String,
    /// Timestamp supplied to `init`
    pub created: String,
}

impl RepoMeta {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        codec::read_record_opt(path, KIND_META)
    }

    pub fn save(&self, path: &Path, fsync: bool) -> Result<()> {
        codec::write_record(path, KIND_META, self, fsync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_meta_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RepoMeta::load(&dir.path().join("meta.json")).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let meta = RepoMeta {
            root: Hash::of(b"root"),
            default_branch: String::from("master"),
            created: String::from("Thu Jan 1 00:00:00 1970 +0000"),
        };
        meta.save(&path, false).unwrap();
        assert_eq!(RepoMeta::load(&path).unwrap(), Some(meta));
    }

    #[test]
    fn test_zero_length_meta_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            RepoMeta::load(&path),
            Err(crate::error::VcsError::Schema { .. })
        ));
    }
}
