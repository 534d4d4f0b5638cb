//! Blob store for staged file contents
//!
//! Objects live at `objects/<hh>/<rest>` keyed by the SHA-256 of their
//! bytes. An object is written once; re-putting identical bytes is a no-op.
//!
//! Author: Moroya Sakamoto

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::codec::write_atomic;
use crate::error::{io_at, Result};
use crate::hash::Hash;

pub struct ObjectStore {
    dir: PathBuf,
    fsync: bool,
}

impl ObjectStore {
    pub fn new(dir: impl Into<PathBuf>, fsync: bool) -> Self {
        Self {
            dir: dir.into(),
            fsync,
        }
    }

    /// Store `bytes`, returning their hash.
    pub fn put(&self, bytes: &[u8]) -> Result<Hash> {
        let hash = Hash::of(bytes);
        let path = self.object_path(&hash);
        if !path.exists() {
            write_atomic(&path, bytes, self.fsync)?;
            debug!("stored object {} ({} bytes)", hash.short(), bytes.len());
        }
        Ok(hash)
    }

    pub fn put_file(&self, path: &Path) -> Result<Hash> {
        let bytes = fs::read(path).map_err(io_at(path))?;
        self.put(&bytes)
    }

    pub fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(hash);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_at(&path)(e)),
        }
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.object_path(hash).exists()
    }

    fn object_path(&self, hash: &Hash) -> PathBuf {
        let hex = hash.to_hex();
        let (hh, rest) = hex.split_at(2);
        self.dir.join(hh).join(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"), false);
        let h = store.put(b"hello").unwrap();
        assert_eq!(h, Hash::of(b"hello"));
        assert!(store.contains(&h));
        assert_eq!(store.get(&h).unwrap().as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_fan_out_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path(), false);
        let h = store.put(b"x").unwrap();
        let hex = h.to_hex();
        assert!(dir.path().join(&hex[..2]).join(&hex[2..]).is_file());
    }

    #[test]
    fn test_put_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path(), false);
        assert_eq!(store.put(b"same").unwrap(), store.put(b"same").unwrap());
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path(), false);
        assert!(store.get(&Hash::of(b"never")).unwrap().is_none());
        assert!(!store.contains(&Hash::of(b"never")));
    }

    #[test]
    fn test_put_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"abc").unwrap();
        let store = ObjectStore::new(dir.path().join("objects"), false);
        assert_eq!(store.put_file(&file).unwrap(), Hash::of(b"abc"));
    }
}
