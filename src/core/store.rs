use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    host::HostRecord,
    types::{lookup_base, split_base, BaseIdentity, Callsign, Port},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DanglingAlias { callsign: Callsign, base: BaseIdentity },
}

/// Serializable image of both maps, sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectorySnapshotV1 {
    pub aliases: Vec<(Callsign, BaseIdentity)>,
    pub hosts: Vec<(BaseIdentity, HostRecord)>,
}

/// Unsynchronized alias and host maps.
///
/// Callers that share a `RouteMap` across threads go through
/// [`crate::core::directory::RouteDirectory`] or the runtime handle.
#[derive(Debug, Default, Clone)]
pub struct RouteMap {
    hosts: HashMap<BaseIdentity, Arc<HostRecord>>,
    aliases: HashMap<Callsign, BaseIdentity>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshotV1) -> Result<Self, StoreError> {
        let mut map = Self::new();
        for (base, host) in snapshot.hosts {
            map.hosts.insert(base, Arc::new(host));
        }
        for (callsign, base) in snapshot.aliases {
            if !map.hosts.contains_key(&base) {
                return Err(StoreError::DanglingAlias { callsign, base });
            }
            map.aliases.insert(callsign, base);
        }
        Ok(map)
    }

    pub fn export_snapshot(&self) -> DirectorySnapshotV1 {
        let mut aliases: Vec<_> = self
            .aliases
            .iter()
            .map(|(cs, base)| (cs.clone(), base.clone()))
            .collect();
        aliases.sort();
        let mut hosts: Vec<_> = self
            .hosts
            .iter()
            .map(|(base, host)| (base.clone(), HostRecord::clone(host)))
            .collect();
        hosts.sort_by(|a, b| a.0.cmp(&b.0));
        DirectorySnapshotV1 { aliases, hosts }
    }

    pub fn find(&self, callsign: &str) -> Option<Arc<HostRecord>> {
        let base = self.aliases.get(callsign)?;
        self.hosts.get(base).cloned()
    }

    pub fn find_base(&self, callsign: &str) -> Option<Arc<HostRecord>> {
        let base = lookup_base(callsign)?;
        self.hosts.get(base).cloned()
    }

    /// Installs a fresh record for the base of `callsign`.
    ///
    /// Returns the base identity the record was stored under, or `None` when
    /// the callsign has no usable delimiter and nothing was stored.
    pub fn update(
        &mut self,
        callsign: &str,
        url: &str,
        ip4addr: &str,
        ip6addr: &str,
        port: Port,
    ) -> Option<BaseIdentity> {
        let Some(derived) = split_base(callsign) else {
            debug!(callsign, "dropping update for malformed callsign");
            return None;
        };

        let base = match self.aliases.get(callsign) {
            Some(existing) => existing.clone(),
            None => {
                let base = derived.to_string();
                self.aliases.insert(callsign.to_string(), base.clone());
                base
            }
        };

        let host = HostRecord::from_fields(url, ip4addr, ip6addr, port);
        self.hosts.insert(base.clone(), Arc::new(host));
        Some(base)
    }

    pub fn erase(&mut self, callsign: &str) -> bool {
        self.aliases.remove(callsign).is_some()
    }

    pub fn keys(&self) -> Vec<Callsign> {
        self.aliases.keys().cloned().collect()
    }

    /// Iterates aliases with the record their base resolves to.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, &HostRecord)> + '_ {
        self.aliases.iter().filter_map(|(cs, base)| {
            self.hosts.get(base).map(|host| (cs.as_str(), host.as_ref()))
        })
    }

    pub fn clear(&mut self) {
        self.hosts.clear();
        self.aliases.clear();
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }
}
