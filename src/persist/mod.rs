pub mod hostfile;
pub mod sqlite;

use crate::core::store::{DirectorySnapshotV1, StoreError};

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    Message(String),
}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl From<StoreError> for PersistError {
    fn from(value: StoreError) -> Self {
        Self::Message(format!("store error: {value:?}"))
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Destination for full directory snapshots.
pub trait SnapshotSink: Send {
    fn write_snapshot(&mut self, snapshot: &DirectorySnapshotV1) -> PersistResult<()>;
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
