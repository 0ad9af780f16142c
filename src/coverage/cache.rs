// src/coverage/cache.rs

//! On-disk form of a coverage session.
//!
//! The cache file is a JSON envelope around the serialized session record:
//!
//! ```json
//! { "format": "phpguard-coverage-session", "version": 1,
//!   "checksum": "<blake3 hex of payload>", "payload": "<record json>" }
//! ```
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a concurrent reader sees either the old file or the new one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::coverage::accumulator::Accumulator;
use crate::coverage::filter::CoverageFilter;
use crate::coverage::options::CoverageOptions;
use crate::errors::Result;

/// Default cache directory, relative to the project root.
pub const CACHE_DIR_NAME: &str = ".phpguard";
pub const CACHE_FILE_NAME: &str = "coverage_session.dat";
pub const CACHE_FORMAT: &str = "phpguard-coverage-session";
pub const CACHE_VERSION: u32 = 1;

/// Everything about a session that survives the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub accumulator: Accumulator,
    pub filter: CoverageFilter,
    pub options: CoverageOptions,
    pub path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    checksum: String,
    payload: String,
}

/// `<dir>/coverage_session.dat`
pub fn cache_file(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILE_NAME)
}

/// Atomically replace `file` with `record`.
pub fn save(file: &Path, record: &SessionRecord) -> Result<()> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let payload = serde_json::to_string(record)?;
    let envelope = Envelope {
        format: CACHE_FORMAT.to_string(),
        version: CACHE_VERSION,
        checksum: blake3::hash(payload.as_bytes()).to_hex().to_string(),
        payload,
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut tmp, &envelope)?;
    tmp.flush()?;
    tmp.persist(file).map_err(|e| e.error)?;

    debug!(?file, "saved coverage session");
    Ok(())
}

/// Read a record back.
///
/// `Ok(None)` when the file is absent, or when it is unreadable as a
/// session: truncated, another format or version, or a checksum mismatch.
/// Those cases are logged and treated like a missing cache. I/O errors on an
/// existing file are returned.
pub fn load(file: &Path) -> Result<Option<SessionRecord>> {
    let contents = match fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let envelope: Envelope = match serde_json::from_str(&contents) {
        Ok(env) => env,
        Err(err) => {
            warn!(?file, error = %err, "ignoring unreadable coverage cache");
            return Ok(None);
        }
    };

    if envelope.format != CACHE_FORMAT || envelope.version != CACHE_VERSION {
        warn!(
            ?file,
            format = %envelope.format,
            version = envelope.version,
            expected = CACHE_VERSION,
            "ignoring incompatible coverage cache"
        );
        return Ok(None);
    }

    let actual = blake3::hash(envelope.payload.as_bytes()).to_hex().to_string();
    if actual != envelope.checksum {
        warn!(?file, "ignoring coverage cache with checksum mismatch");
        return Ok(None);
    }

    match serde_json::from_str::<SessionRecord>(&envelope.payload) {
        Ok(record) => Ok(Some(record)),
        Err(err) => {
            warn!(?file, error = %err, "ignoring undecodable coverage cache payload");
            Ok(None)
        }
    }
}
