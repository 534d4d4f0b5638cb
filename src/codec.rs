//! Record codec: versioned JSON envelopes for persisted state
//!
//! Every file the repository writes is a single record:
//!
//! ```text
//! { "kind": "history", "version": 1, "body": { ... } }
//! ```
//!
//! Reads check `kind` and `version` before touching the body, so a foreign
//! or future-format file is reported instead of silently misread.
//! Writes go through a temporary sibling and `rename`.
//!
//! Author: Moroya Sakamoto

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_at, Result, VcsError};

// ── Record kinds ───────────────────────────────────────────────────────

pub const KIND_META: &str = "meta";
pub const KIND_HISTORY: &str = "history";
pub const KIND_STAGE: &str = "stage";

/// Current on-disk format version for every record kind.
pub const FORMAT_VERSION: u32 = 1;

/// `found` of a `Schema` error whose bytes are not an envelope at all.
pub const UNRECOGNIZED: &str = "unrecognized data";

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    kind: &'a str,
    version: u32,
    body: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    kind: String,
    version: u32,
    body: Value,
}

// ── Encoding ───────────────────────────────────────────────────────────

/// Compact deterministic encoding used to derive identities.
///
/// Determinism relies on callers using ordered maps (`BTreeMap`/`BTreeSet`).
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Wrap `value` in an envelope of the given kind.
pub fn encode_record<T: Serialize>(kind: &str, value: &T) -> Result<Vec<u8>> {
    let env = EnvelopeOut {
        kind,
        version: FORMAT_VERSION,
        body: value,
    };
    Ok(serde_json::to_vec_pretty(&env)?)
}

/// Unwrap an envelope, checking kind and version. `path` is only used for errors.
pub fn decode_record<T: DeserializeOwned>(path: &Path, kind: &str, bytes: &[u8]) -> Result<T> {
    let env: EnvelopeIn = serde_json::from_slice(bytes).map_err(|_| VcsError::Schema {
        path: path.to_path_buf(),
        expected: kind.to_string(),
        found: String::from(UNRECOGNIZED),
    })?;
    if env.kind != kind || env.version != FORMAT_VERSION {
        return Err(VcsError::Schema {
            path: path.to_path_buf(),
            expected: format!("{kind} v{FORMAT_VERSION}"),
            found: format!("{} v{}", env.kind, env.version),
        });
    }
    Ok(serde_json::from_value(env.body)?)
}

// ── File I/O ───────────────────────────────────────────────────────────

/// Replace the file at `path` with a freshly encoded record.
pub fn write_record<T: Serialize>(path: &Path, kind: &str, value: &T, fsync: bool) -> Result<()> {
    let bytes = encode_record(kind, value)?;
    write_atomic(path, &bytes, fsync)?;
    debug!("wrote {} record ({} bytes) to {}", kind, bytes.len(), path.display());
    Ok(())
}

pub fn read_record<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let bytes = fs::read(path).map_err(io_at(path))?;
    decode_record(path, kind, &bytes)
}

/// Like [`read_record`], but a missing file yields `None`.
pub fn read_record_opt<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => decode_record(path, kind, &bytes).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_at(path)(e)),
    }
}

/// Write `bytes` through `<path>.tmp` and rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8], fsync: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_at(parent))?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(io_at(&tmp))?;
        f.write_all(bytes).map_err(io_at(&tmp))?;
        if fsync {
            f.sync_all().map_err(io_at(&tmp))?;
        }
    }
    fs::rename(&tmp, path).map_err(io_at(path))?;
    Ok(())
}
