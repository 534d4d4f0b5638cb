//! Repository configuration and on-disk layout.
//!
//! Env overrides (read by [`RepoConfig::from_env`]):
//! - `SNAPVCS_DIR`: metadata directory. Absolute paths are used as is,
//!   relative ones are resolved against the work dir. Empty is ignored.
//! - `SNAPVCS_DEFAULT_BRANCH`: name of the branch created at init.
//! - `SNAPVCS_FSYNC`: `1|true|yes|on` fsyncs every record write.
//!
//! Layout under the metadata directory:
//!   meta.json     initialization marker + root identity
//!   history.json  snapshots + branch pointers (one record)
//!   stage.json    pending additions / removals
//!   objects/      staged file bytes by content hash
//!
//! Author: Moroya Sakamoto

use std::path::{Path, PathBuf};

pub const DEFAULT_META_DIR: &str = ".snapvcs";
pub const DEFAULT_BRANCH: &str = "master";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoConfig {
    /// Working directory the repository tracks.
    pub work_dir: PathBuf,
    /// Metadata directory, relative to `work_dir` unless absolute.
    pub meta_dir: PathBuf,
    /// Branch created (and made active) by `init`.
    pub default_branch: String,
    /// fsync every record before renaming it into place.
    pub fsync: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            meta_dir: PathBuf::from(DEFAULT_META_DIR),
            default_branch: String::from(DEFAULT_BRANCH),
            fsync: false,
        }
    }
}

impl RepoConfig {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults for `work_dir`, overridden from the environment.
    pub fn from_env(work_dir: impl Into<PathBuf>) -> Self {
        let mut cfg = Self::new(work_dir);

        if let Ok(v) = std::env::var("SNAPVCS_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.meta_dir = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("SNAPVCS_DEFAULT_BRANCH") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.default_branch = s.to_string();
            }
        }

        if let Ok(v) = std::env::var("SNAPVCS_FSYNC") {
            cfg.fsync = parse_flag(&v);
        }

        cfg
    }

    pub fn with_meta_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.meta_dir = dir.into();
        self
    }

    pub fn with_default_branch(mut self, name: impl Into<String>) -> Self {
        self.default_branch = name.into();
        self
    }

    pub fn with_fsync(mut self, on: bool) -> Self {
        self.fsync = on;
        self
    }

    /// Resolved metadata directory.
    pub fn repo_dir(&self) -> PathBuf {
        if self.meta_dir.is_absolute() {
            self.meta_dir.clone()
        } else {
            self.work_dir.join(&self.meta_dir)
        }
    }

    pub fn meta_path(&self) -> PathBuf {
        self.repo_dir().join("meta.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.repo_dir().join("history.json")
    }

    pub fn stage_path(&self) -> PathBuf {
        self.repo_dir().join("stage.json")
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.repo_dir().join("objects")
    }

    /// Resolve `name` against the working directory.
    pub fn work_path(&self, name: &Path) -> PathBuf {
        self.work_dir.join(name)
    }
}

fn parse_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}
