//! Neighbor snapshot
//!
//! Keeps the NEIGH_TABLE entries whose MAC is reachable through a retained
//! FDB binding on the same VLAN.

use crate::dump::DumpRecord;
use crate::error::Result;
use crate::fdb::FdbSnapshot;
use crate::records::NeighRecord;
use crate::store::{load_objects, FieldMap, StateStore};
use crate::tables::{TableKey, APP_NEIGH_TABLE_NAME};
use crate::types::{NeighborEntry, VlanId, VlanMac};
use tracing::{debug, info, instrument};

/// Neighbors selected for the dump and for re-announcement
#[derive(Debug, Clone, Default)]
pub struct NeighborSnapshot {
    records: Vec<DumpRecord>,
    neighbors: Vec<NeighborEntry>,
}

impl NeighborSnapshot {
    /// Reads every NEIGH_TABLE entry in one pipeline and filters it against `fdb`.
    #[instrument(skip_all, fields(db = %store.namespace()))]
    pub async fn build<S>(store: &mut S, fdb: &FdbSnapshot) -> Result<Self>
    where
        S: StateStore + ?Sized,
    {
        let pattern = format!("{}:*", APP_NEIGH_TABLE_NAME);
        let objects = load_objects(store, &pattern).await?;
        let total = objects.len();

        let snapshot = Self::from_objects(fdb, objects);
        info!(total, kept = snapshot.neighbors.len(), "Neighbor snapshot built");
        Ok(snapshot)
    }

    /// Filters `(key, fields)` pairs, keeping enumeration order.
    pub fn from_objects<I>(fdb: &FdbSnapshot, objects: I) -> Self
    where
        I: IntoIterator<Item = (String, FieldMap)>,
    {
        let mut snapshot = Self::default();

        for (key, fields) in objects {
            let (interface, ip) = match key.parse::<TableKey>() {
                Ok(TableKey::Neigh { interface, ip }) => (interface, ip),
                _ => {
                    debug!(key = %key, "Skipping malformed neighbor key");
                    continue;
                }
            };
            let Ok(vlan) = VlanId::from_interface_name(&interface) else {
                debug!(key = %key, "Skipping neighbor on non-VLAN interface");
                continue;
            };
            let record = match NeighRecord::from_fields(&fields) {
                Ok(record) => record,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping neighbor");
                    continue;
                }
            };
            if !fdb.is_retained(&VlanMac::new(vlan, record.mac)) {
                debug!(key = %key, mac = %record.mac, "Neighbor MAC not in FDB");
                continue;
            }

            snapshot.neighbors.push(NeighborEntry {
                vlan,
                mac: record.mac,
                ip,
            });
            snapshot.records.push(DumpRecord::new(key, fields));
        }

        snapshot
    }

    /// `arp.json` records, raw field maps included
    pub fn records(&self) -> &[DumpRecord] {
        &self.records
    }

    /// Kept neighbors in enumeration order
    pub fn neighbors(&self) -> &[NeighborEntry] {
        &self.neighbors
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
