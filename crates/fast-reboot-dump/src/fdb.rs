//! Forwarding database snapshot
//!
//! Turns ASIC_DB FDB entries into FDB_TABLE records keyed by VLAN and MAC,
//! with the egress interface resolved through the [`Topology`].

use crate::dump::DumpRecord;
use crate::error::Result;
use crate::records::{FdbAttributes, FdbKeyObject};
use crate::store::{scan_all, FieldMap, StateStore};
use crate::tables::{fields, TableKey, ASIC_FDB_ENTRY_PREFIX};
use crate::topology::Topology;
use crate::types::{FdbEntry, VlanMac};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Unicast FDB entries that resolved to a VLAN and an interface
#[derive(Debug, Clone, Default)]
pub struct FdbSnapshot {
    entries: Vec<FdbEntry>,
    retained: HashSet<VlanMac>,
    egress: HashMap<VlanMac, String>,
}

impl FdbSnapshot {
    /// Scans every FDB entry and reads their attributes in one pipeline.
    #[instrument(skip(store, topology), fields(db = %store.namespace()))]
    pub async fn build<S>(store: &mut S, topology: &Topology, scan_count: usize) -> Result<Self>
    where
        S: StateStore + ?Sized,
    {
        let pattern = format!("{}*", ASIC_FDB_ENTRY_PREFIX);
        let keys = scan_all(store, &pattern, scan_count).await?;
        let values = store.get_all_batch(&keys).await?;

        let snapshot = Self::from_objects(topology, keys.into_iter().zip(values));
        info!(entries = snapshot.entries.len(), "FDB snapshot built");
        Ok(snapshot)
    }

    /// Builds the snapshot from `(key, fields)` pairs in enumeration order.
    ///
    /// Entries are dropped when the MAC is not unicast, the key or attributes
    /// are malformed, the VLAN or bridge port is unknown, or the (VLAN, MAC)
    /// pair was already seen.
    pub fn from_objects<I>(topology: &Topology, objects: I) -> Self
    where
        I: IntoIterator<Item = (String, FieldMap)>,
    {
        let mut snapshot = Self::default();

        for (key, fields) in objects {
            let Some(json) = key.strip_prefix(ASIC_FDB_ENTRY_PREFIX) else {
                debug!(key = %key, "Skipping key outside FDB entry table");
                continue;
            };
            let key_object = match FdbKeyObject::parse(json) {
                Ok(key_object) => key_object,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping FDB entry");
                    continue;
                }
            };
            if !key_object.mac.is_unicast() {
                continue;
            }
            let attrs = match FdbAttributes::from_fields(&fields) {
                Ok(attrs) => attrs,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping FDB entry");
                    continue;
                }
            };

            let Some(vlan) = topology.vlan_for_oid(&key_object.bvid) else {
                debug!(key = %key, bvid = %key_object.bvid, "Unknown VLAN object");
                continue;
            };
            let Some(port) = topology.interface_for_bridge_port(&attrs.bridge_port_id) else {
                debug!(
                    key = %key,
                    bridge_port = %attrs.bridge_port_id,
                    "Unknown bridge port"
                );
                continue;
            };

            let entry = FdbEntry {
                vlan,
                mac: key_object.mac,
                entry_type: attrs.entry_type,
                port: port.to_string(),
            };
            if !snapshot.retained.insert(entry.key()) {
                debug!(vlan = %vlan, mac = %entry.mac, "Duplicate FDB entry");
                continue;
            }
            snapshot.egress.insert(entry.key(), entry.port.clone());
            snapshot.entries.push(entry);
        }

        snapshot
    }

    pub fn entries(&self) -> &[FdbEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a (VLAN, MAC) pair made it into the snapshot
    pub fn is_retained(&self, key: &VlanMac) -> bool {
        self.retained.contains(key)
    }

    /// Interface a (VLAN, MAC) pair was learned on
    pub fn egress_interface(&self, key: &VlanMac) -> Option<&str> {
        self.egress.get(key).map(String::as_str)
    }

    /// `fdb.json` records, in snapshot order
    pub fn records(&self) -> Vec<DumpRecord> {
        self.entries
            .iter()
            .map(|entry| {
                let key = TableKey::Fdb {
                    vlan: entry.vlan,
                    mac: entry.mac,
                };
                let values = FieldMap::from([
                    (fields::TYPE.to_string(), entry.entry_type.to_string()),
                    (fields::PORT.to_string(), entry.port.clone()),
                ]);
                DumpRecord::new(key.to_string(), values)
            })
            .collect()
    }
}
