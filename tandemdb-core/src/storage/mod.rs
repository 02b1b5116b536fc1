//! On-disk formats.
//!
//! - [`wal`]: checksummed write-ahead log backing the durable metadata store
//! - [`index_file`]: framed snapshot of a vector index handle

pub mod index_file;
pub mod wal;

pub use wal::{SyncMode, Wal};
