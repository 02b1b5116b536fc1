//! Snapshot file for a single vector index handle.
//!
//! # Format
//!
//! ```text
//! [magic:"TDBX"][version:u32][crc32:u32][length:u64][json body:length]
//! ```
//!
//! The body is written to a sibling temp file and renamed into place.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

const MAGIC: &[u8; 4] = b"TDBX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Serializes `value` into a framed index file at `path`.
pub fn write<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let body = serde_json::to_vec(value)
        .map_err(|e| Error::Io(format!("serialize index failed: {}", e)))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    bytes.extend_from_slice(&(body.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&body);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Io(format!("create dir failed: {}", e)))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes).map_err(|e| Error::Io(format!("write index failed: {}", e)))?;
    fs::rename(&tmp, path).map_err(|e| Error::Io(format!("rename index failed: {}", e)))?;
    Ok(())
}

/// Reads and validates a framed index file.
pub fn read<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| Error::Io(format!("read index {} failed: {}", path.display(), e)))?;
    decode(&bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Corrupted("index file is truncated".into()));
    }
    if &bytes[0..4] != MAGIC {
        return Err(Error::Corrupted("not a tandemdb index file".into()));
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(Error::Corrupted(format!(
            "unsupported index format version {}",
            version
        )));
    }
    let expected_crc = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[12..HEADER_LEN]);
    let length = u64::from_le_bytes(len_bytes);

    let body = &bytes[HEADER_LEN..];
    if body.len() as u64 != length {
        return Err(Error::Corrupted(format!(
            "index body length {} does not match header {}",
            body.len(),
            length
        )));
    }
    let actual_crc = crc32fast::hash(body);
    if actual_crc != expected_crc {
        return Err(Error::Corrupted(format!(
            "index checksum mismatch: expected {}, got {}",
            expected_crc, actual_crc
        )));
    }

    serde_json::from_slice(body).map_err(|e| Error::Corrupted(format!("index body: {}", e)))
}
