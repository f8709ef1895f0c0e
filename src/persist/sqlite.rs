//! SQLite-backed store of directory snapshots.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::core::store::{DirectorySnapshotV1, RouteMap};

use super::{PersistError, PersistResult, SnapshotSink};

const SNAPSHOT_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotEnvelope {
    format_version: u16,
    snapshot: DirectorySnapshotV1,
}

/// SQLite implementation of [`crate::persist::SnapshotSink`].
///
/// Keeps url-bearing entries that the override file never carries, so a
/// restart can come up with the full directory before the host files are
/// re-read.
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Opens or creates a store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    pub fn write_snapshot(&mut self, snapshot: &DirectorySnapshotV1) -> PersistResult<()> {
        let env = SnapshotEnvelope {
            format_version: SNAPSHOT_FORMAT_VERSION,
            snapshot: snapshot.clone(),
        };
        let payload = serde_json::to_vec(&env)?;
        self.conn.execute(
            "INSERT INTO snapshots(ts_ms, alias_count, payload) VALUES (?1, ?2, ?3)",
            params![now_ms() as i64, snapshot.aliases.len() as i64, payload],
        )?;
        Ok(())
    }

    pub fn load_latest_snapshot(&self) -> PersistResult<Option<DirectorySnapshotV1>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        let env: SnapshotEnvelope = serde_json::from_slice(&payload)?;
        if env.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(PersistError::Message(format!(
                "unsupported snapshot format version: {}",
                env.format_version
            )));
        }
        Ok(Some(env.snapshot))
    }

    /// Rebuilds a map from the latest snapshot, or an empty one.
    pub fn load_map(&self) -> PersistResult<RouteMap> {
        match self.load_latest_snapshot()? {
            Some(snapshot) => Ok(RouteMap::from_snapshot(snapshot)?),
            None => Ok(RouteMap::new()),
        }
    }

    /// Deletes all but the newest `keep` snapshots.
    pub fn prune_keep(&mut self, keep: usize) -> PersistResult<usize> {
        let count = self.conn.execute(
            "DELETE FROM snapshots \
             WHERE id NOT IN (SELECT id FROM snapshots ORDER BY id DESC LIMIT ?1)",
            params![keep as i64],
        )?;
        Ok(count)
    }

    pub fn snapshot_count(&self) -> PersistResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl SnapshotSink for SqliteSnapshotStore {
    fn write_snapshot(&mut self, snapshot: &DirectorySnapshotV1) -> PersistResult<()> {
        SqliteSnapshotStore::write_snapshot(self, snapshot)
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
