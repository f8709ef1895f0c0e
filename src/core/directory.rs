use std::{
    fs::File,
    io::{BufWriter, Write},
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::debug;

use crate::{
    core::store::{DirectorySnapshotV1, RouteMap, StoreError},
    host::HostRecord,
    persist::{
        PersistResult,
        hostfile::{merge_file, render_override, HostFiles, LoadError, LoadStats},
    },
    types::{BaseIdentity, Callsign, Port},
};

/// Thread-safe callsign directory backed by the two host files.
///
/// Every operation holds one lock over both maps for its whole duration,
/// file operations included.
#[derive(Debug, Default)]
pub struct RouteDirectory {
    map: Mutex<RouteMap>,
    files: HostFiles,
}

impl RouteDirectory {
    pub fn new(files: HostFiles) -> Self {
        Self::with_map(RouteMap::new(), files)
    }

    pub fn with_map(map: RouteMap, files: HostFiles) -> Self {
        Self {
            map: Mutex::new(map),
            files,
        }
    }

    /// Resolves an exact, previously registered callsign.
    pub fn find(&self, callsign: &str) -> Option<Arc<HostRecord>> {
        self.lock().find(callsign)
    }

    /// Resolves the root station of `callsign`, registered or not.
    pub fn find_base(&self, callsign: &str) -> Option<Arc<HostRecord>> {
        self.lock().find_base(callsign)
    }

    /// Replaces the record for the base of `callsign`. Malformed callsigns
    /// are dropped and yield `None`.
    pub fn update(
        &self,
        callsign: &str,
        url: &str,
        ip4addr: &str,
        ip6addr: &str,
        port: Port,
    ) -> Option<BaseIdentity> {
        self.lock().update(callsign, url, ip4addr, ip6addr, port)
    }

    /// Clears the directory and loads the distribution file, then the
    /// override file on top of it.
    ///
    /// Stops at the first file that fails to parse; entries applied before
    /// the failure stay in place.
    pub fn read_all(&self) -> Result<LoadStats, LoadError> {
        let mut map = self.lock();
        map.clear();
        let mut stats = LoadStats::default();
        for path in self.files.load_order() {
            stats += merge_file(&mut map, &path, self.files.policy)?;
        }
        debug!(aliases = map.len(), hosts = map.host_count(), "host files reloaded");
        Ok(stats)
    }

    /// Merges one file from the configured directory without clearing.
    pub fn load_file(&self, name: &str) -> Result<LoadStats, LoadError> {
        let path = self.files.path_of(name);
        let mut map = self.lock();
        merge_file(&mut map, &path, self.files.policy)
    }

    /// Rewrites the override file with every alias that has no url.
    pub fn save(&self) -> PersistResult<usize> {
        let path = self.files.override_path();
        let mut out = BufWriter::new(File::create(&path)?);
        let map = self.lock();
        let (body, written) = render_override(&map);
        out.write_all(body.as_bytes())?;
        out.flush()?;
        debug!(path = %path.display(), written, "override file saved");
        Ok(written)
    }

    pub fn keys(&self) -> Vec<Callsign> {
        self.lock().keys()
    }

    /// Removes an alias. The base record it pointed at is kept.
    pub fn erase(&self, callsign: &str) -> bool {
        self.lock().erase(callsign)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> DirectorySnapshotV1 {
        self.lock().export_snapshot()
    }

    /// Replaces the whole directory with `snapshot`.
    pub fn restore(&self, snapshot: DirectorySnapshotV1) -> Result<(), StoreError> {
        let restored = RouteMap::from_snapshot(snapshot)?;
        *self.lock() = restored;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, RouteMap> {
        // No operation leaves the maps half-updated, so a poisoned guard is still consistent.
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
