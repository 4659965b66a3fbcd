//! Resolution of the ASIC_DB object graph
//!
//! Bridge port oid -> port oid -> host interface name, and VLAN oid <-> VLAN id.

use crate::error::Result;
use crate::records::{BridgePortRecord, HostIfRecord, VlanRecord};
use crate::store::{load_objects, FieldMap, StateStore};
use crate::tables::{oid_pattern, ASIC_BRIDGE_PORT_PREFIX, ASIC_HOSTIF_PREFIX, ASIC_VLAN_PREFIX};
use crate::types::{ObjectId, VlanId};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Lookup tables derived from ASIC_DB topology objects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    bridge_port_to_interface: HashMap<ObjectId, String>,
    vlan_id_to_oid: HashMap<VlanId, ObjectId>,
    oid_to_vlan_id: HashMap<ObjectId, VlanId>,
}

impl Topology {
    /// Reads bridge ports, host interfaces and VLANs, one pipelined batch per
    /// object type.
    #[instrument(skip_all, fields(db = %store.namespace()))]
    pub async fn load<S>(store: &mut S) -> Result<Self>
    where
        S: StateStore + ?Sized,
    {
        let bridge_ports = load_objects(store, &oid_pattern(ASIC_BRIDGE_PORT_PREFIX)).await?;
        let hostifs = load_objects(store, &oid_pattern(ASIC_HOSTIF_PREFIX)).await?;
        let vlans = load_objects(store, &oid_pattern(ASIC_VLAN_PREFIX)).await?;

        let topology = Self::from_objects(&bridge_ports, &hostifs, &vlans);
        info!(
            bridge_ports = topology.bridge_port_to_interface.len(),
            vlans = topology.vlan_id_to_oid.len(),
            "Topology resolved"
        );
        Ok(topology)
    }

    /// Builds the lookup tables from `(key, fields)` pairs of each object type.
    ///
    /// Malformed objects are skipped. Input is expected in key order; when two
    /// objects claim the same VLAN id the later key wins.
    pub fn from_objects(
        bridge_ports: &[(String, FieldMap)],
        hostifs: &[(String, FieldMap)],
        vlans: &[(String, FieldMap)],
    ) -> Self {
        let mut port_to_interface = HashMap::new();
        for (key, fields) in hostifs {
            match HostIfRecord::from_fields(fields) {
                Ok(hostif) => {
                    port_to_interface.insert(hostif.obj_id, hostif.name);
                }
                Err(e) => debug!(key = %key, error = %e, "Skipping host interface"),
            }
        }

        let mut bridge_port_to_interface = HashMap::new();
        for (key, fields) in bridge_ports {
            let record = match BridgePortRecord::from_fields(fields) {
                Ok(record) => record,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping bridge port");
                    continue;
                }
            };
            let Some(port_id) = record.port() else {
                continue;
            };
            match port_to_interface.get(port_id) {
                Some(name) => {
                    let bridge_port = object_id(ASIC_BRIDGE_PORT_PREFIX, key);
                    bridge_port_to_interface.insert(bridge_port, name.clone());
                }
                None => warn!(
                    bridge_port = %key,
                    port = %port_id,
                    "Bridge port has no host interface, dropping"
                ),
            }
        }

        let mut vlan_id_to_oid = HashMap::new();
        let mut oid_to_vlan_id = HashMap::new();
        for (key, fields) in vlans {
            match VlanRecord::from_fields(fields) {
                Ok(vlan) => {
                    let oid = object_id(ASIC_VLAN_PREFIX, key);
                    vlan_id_to_oid.insert(vlan.vlan_id, oid.clone());
                    oid_to_vlan_id.insert(oid, vlan.vlan_id);
                }
                Err(e) => debug!(key = %key, error = %e, "Skipping VLAN"),
            }
        }

        Self {
            bridge_port_to_interface,
            vlan_id_to_oid,
            oid_to_vlan_id,
        }
    }

    /// Interface name behind a bridge port
    pub fn interface_for_bridge_port(&self, bridge_port: &ObjectId) -> Option<&str> {
        self.bridge_port_to_interface
            .get(bridge_port)
            .map(String::as_str)
    }

    /// VLAN id of a VLAN object
    pub fn vlan_for_oid(&self, oid: &ObjectId) -> Option<VlanId> {
        self.oid_to_vlan_id.get(oid).copied()
    }

    /// VLAN object carrying a VLAN id
    pub fn oid_for_vlan(&self, vlan: VlanId) -> Option<&ObjectId> {
        self.vlan_id_to_oid.get(&vlan)
    }

    pub fn bridge_port_count(&self) -> usize {
        self.bridge_port_to_interface.len()
    }

    pub fn vlan_count(&self) -> usize {
        self.vlan_id_to_oid.len()
    }
}

/// Strips the object type prefix, leaving `oid:0x...`
fn object_id(prefix: &str, key: &str) -> ObjectId {
    ObjectId::new(key.strip_prefix(prefix).unwrap_or(key))
}
