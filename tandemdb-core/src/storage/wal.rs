//! Write-ahead log of serde-encoded records.
//!
//! Every record is framed and checksummed before it is considered written,
//! so a replay on open restores the last consistent state.
//!
//! # Format
//!
//! ```text
//! [checksum:u32][length:u32][json record:length]
//! ```
//!
//! A frame cut short at the end of the file (a torn final write) ends the
//! replay. A complete frame whose checksum does not match is corruption.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sync mode for WAL writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Sync after every write (safest, slowest).
    Immediate,
    /// Sync after a batch of writes.
    #[default]
    Batched,
    /// Don't sync (fastest, risk of data loss on crash).
    NoSync,
}

/// Write-ahead log for records of type `E`.
pub struct Wal<E> {
    path: PathBuf,
    writer: BufWriter<File>,
    sync_mode: SyncMode,
    /// Number of entries since last sync.
    entries_since_sync: usize,
    /// Batch size for syncing.
    batch_size: usize,
    _record: PhantomData<fn(E)>,
}

impl<E> Wal<E>
where
    E: Serialize + DeserializeOwned,
{
    /// Opens or creates a WAL file for appending.
    pub fn open<P: AsRef<Path>>(path: P, sync_mode: SyncMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = open_append(&path)?;

        Ok(Self {
            path,
            writer,
            sync_mode,
            entries_since_sync: 0,
            batch_size: 100,
            _record: PhantomData,
        })
    }

    /// Appends one record.
    pub fn append(&mut self, entry: &E) -> Result<()> {
        write_frame(&mut self.writer, entry)?;
        self.entries_since_sync += 1;

        match self.sync_mode {
            SyncMode::Immediate => self.sync()?,
            SyncMode::Batched if self.entries_since_sync >= self.batch_size => self.sync()?,
            SyncMode::Batched => self.flush()?,
            SyncMode::NoSync => {}
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::Io(format!("flush failed: {}", e)))
    }

    /// Forces a sync to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.flush()?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| Error::Io(format!("sync failed: {}", e)))?;
        self.entries_since_sync = 0;
        Ok(())
    }

    /// Replaces the whole log with `entries`.
    ///
    /// The new log is written to a sibling file and renamed over the old one,
    /// so a crash mid-rewrite leaves the previous log intact.
    pub fn rewrite(&mut self, entries: &[E]) -> Result<()> {
        self.sync()?;

        let tmp = self.path.with_extension("compact");
        {
            let file = File::create(&tmp)
                .map_err(|e| Error::Io(format!("failed to create {}: {}", tmp.display(), e)))?;
            let mut writer = BufWriter::new(file);
            for entry in entries {
                write_frame(&mut writer, entry)?;
            }
            writer
                .flush()
                .map_err(|e| Error::Io(format!("flush failed: {}", e)))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| Error::Io(format!("sync failed: {}", e)))?;
        }

        fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Io(format!("failed to replace WAL: {}", e)))?;
        self.writer = open_append(&self.path)?;
        self.entries_since_sync = 0;
        Ok(())
    }

    /// Reads all records from the WAL for recovery.
    pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<E>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)
            .map_err(|e| Error::Io(format!("failed to open WAL for read: {}", e)))?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();

        loop {
            let mut header = [0u8; 8];
            match read_full(&mut reader, &mut header)? {
                0 => break,
                8 => {}
                _ => {
                    tracing::warn!(path = %path.display(), "ignoring torn WAL frame header");
                    break;
                }
            }
            let expected_checksum = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

            let mut data = vec![0u8; length];
            if read_full(&mut reader, &mut data)? != length {
                tracing::warn!(path = %path.display(), "ignoring torn WAL frame");
                break;
            }

            let actual_checksum = crc32fast::hash(&data);
            if actual_checksum != expected_checksum {
                return Err(Error::Corrupted(format!(
                    "WAL checksum mismatch: expected {}, got {}",
                    expected_checksum, actual_checksum
                )));
            }

            let entry = serde_json::from_slice(&data)
                .map_err(|e| Error::Corrupted(format!("WAL record is unreadable: {}", e)))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Returns the path to the WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Io(format!("failed to open WAL: {}", e)))?;
    Ok(BufWriter::new(file))
}

fn write_frame<W: Write, E: Serialize>(writer: &mut W, entry: &E) -> Result<()> {
    let data = serde_json::to_vec(entry)
        .map_err(|e| Error::Io(format!("WAL serialization failed: {}", e)))?;
    let checksum = crc32fast::hash(&data);
    let length = u32::try_from(data.len())
        .map_err(|_| Error::Io("WAL record exceeds 4 GiB".into()))?;

    // Write: [checksum:4][length:4][data:length]
    writer
        .write_all(&checksum.to_le_bytes())
        .and_then(|_| writer.write_all(&length.to_le_bytes()))
        .and_then(|_| writer.write_all(&data))
        .map_err(|e| Error::Io(format!("WAL write failed: {}", e)))
}

/// Reads until `buf` is full or EOF; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(format!("WAL read failed: {}", e))),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Record {
        Put { key: String, value: i64 },
        Clear,
    }

    fn temp_wal_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join("tandemdb_test_wal");
        fs::create_dir_all(&dir).unwrap();
        dir.join(format!("test_{}_{}.wal", std::process::id(), id))
    }

    fn put(key: &str, value: i64) -> Record {
        Record::Put {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn test_wal_append_and_read() {
        let path = temp_wal_path();
        let _ = fs::remove_file(&path);

        {
            let mut wal = Wal::open(&path, SyncMode::Immediate).unwrap();
            wal.append(&put("a", 1)).unwrap();
            wal.append(&put("b", 2)).unwrap();
            wal.append(&Record::Clear).unwrap();
        }

        let entries: Vec<Record> = Wal::read_all(&path).unwrap();
        assert_eq!(entries, vec![put("a", 1), put("b", 2), Record::Clear]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wal_rewrite() {
        let path = temp_wal_path();
        let _ = fs::remove_file(&path);

        {
            let mut wal = Wal::open(&path, SyncMode::Immediate).unwrap();
            wal.append(&put("a", 1)).unwrap();
            wal.append(&put("a", 2)).unwrap();
            wal.rewrite(&[put("a", 2)]).unwrap();
            wal.append(&put("b", 3)).unwrap();
        }

        let entries: Vec<Record> = Wal::read_all(&path).unwrap();
        assert_eq!(entries, vec![put("a", 2), put("b", 3)]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wal_missing_and_empty_file() {
        let path = temp_wal_path();
        let _ = fs::remove_file(&path);
        assert!(Wal::<Record>::read_all(&path).unwrap().is_empty());

        File::create(&path).unwrap();
        assert!(Wal::<Record>::read_all(&path).unwrap().is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wal_torn_tail_is_ignored() {
        let path = temp_wal_path();
        let _ = fs::remove_file(&path);

        {
            let mut wal = Wal::open(&path, SyncMode::Immediate).unwrap();
            wal.append(&put("a", 1)).unwrap();
            wal.append(&put("b", 2)).unwrap();
        }
        let len = fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 3).unwrap();

        let entries: Vec<Record> = Wal::read_all(&path).unwrap();
        assert_eq!(entries, vec![put("a", 1)]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wal_detects_corruption() {
        let path = temp_wal_path();
        let _ = fs::remove_file(&path);

        {
            let mut wal = Wal::open(&path, SyncMode::Immediate).unwrap();
            wal.append(&put("a", 1)).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 2;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Wal::<Record>::read_all(&path),
            Err(Error::Corrupted(_))
        ));

        fs::remove_file(&path).unwrap();
    }
}
