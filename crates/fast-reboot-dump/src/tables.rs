//! Table names, key layouts and field names read or written by fast-reboot-dump

use crate::types::{MacAddress, ParseError, VlanId};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// ASIC_DB bridge port objects
pub const ASIC_BRIDGE_PORT_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_BRIDGE_PORT:";

/// ASIC_DB host interface objects
pub const ASIC_HOSTIF_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_HOSTIF:";

/// ASIC_DB VLAN objects
pub const ASIC_VLAN_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_VLAN:";

/// ASIC_DB FDB entries; the remainder of the key is a JSON object
pub const ASIC_FDB_ENTRY_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY:";

/// APPL_DB FDB table name
pub const APP_FDB_TABLE_NAME: &str = "FDB_TABLE";

/// APPL_DB neighbor table name
pub const APP_NEIGH_TABLE_NAME: &str = "NEIGH_TABLE";

/// APPL_DB route table name
pub const APP_ROUTE_TABLE_NAME: &str = "ROUTE_TABLE";

/// IPv4 default route prefix
pub const IPV4_DEFAULT_PREFIX: &str = "0.0.0.0/0";

/// IPv6 default route prefix
pub const IPV6_DEFAULT_PREFIX: &str = "::/0";

/// Key pattern matching every object whose key starts with `prefix` followed by an oid
pub fn oid_pattern(prefix: &str) -> String {
    format!("{}oid:*", prefix)
}

/// SAI attribute names
pub mod attrs {
    pub const BRIDGE_PORT_TYPE: &str = "SAI_BRIDGE_PORT_ATTR_TYPE";
    pub const BRIDGE_PORT_PORT_ID: &str = "SAI_BRIDGE_PORT_ATTR_PORT_ID";
    /// Only bridge ports of this type are backed by a port object
    pub const BRIDGE_PORT_TYPE_PORT: &str = "SAI_BRIDGE_PORT_TYPE_PORT";

    pub const HOSTIF_OBJ_ID: &str = "SAI_HOSTIF_ATTR_OBJ_ID";
    pub const HOSTIF_NAME: &str = "SAI_HOSTIF_ATTR_NAME";

    pub const VLAN_ID: &str = "SAI_VLAN_ATTR_VLAN_ID";

    pub const FDB_ENTRY_TYPE: &str = "SAI_FDB_ENTRY_ATTR_TYPE";
    pub const FDB_ENTRY_BRIDGE_PORT_ID: &str = "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID";
}

/// APPL_DB field names
pub mod fields {
    /// NEIGH_TABLE resolved MAC
    pub const NEIGH: &str = "neigh";
    /// FDB_TABLE entry type
    pub const TYPE: &str = "type";
    /// FDB_TABLE egress port
    pub const PORT: &str = "port";
}

/// Key of a record written to one of the dump artifacts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    /// `FDB_TABLE:Vlan<N>:<aa-bb-cc-dd-ee-ff>`
    Fdb { vlan: VlanId, mac: MacAddress },
    /// `NEIGH_TABLE:<ifname>:<ip>`
    Neigh { interface: String, ip: IpAddr },
    /// `ROUTE_TABLE:<prefix>`
    Route { prefix: String },
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKey::Fdb { vlan, mac } => write!(
                f,
                "{}:{}:{}",
                APP_FDB_TABLE_NAME,
                vlan.interface_name(),
                mac.to_hyphenated()
            ),
            TableKey::Neigh { interface, ip } => {
                write!(f, "{}:{}:{}", APP_NEIGH_TABLE_NAME, interface, ip)
            }
            TableKey::Route { prefix } => write!(f, "{}:{}", APP_ROUTE_TABLE_NAME, prefix),
        }
    }
}

impl FromStr for TableKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTableKey(s.to_string());
        let (table, rest) = s.split_once(':').ok_or_else(invalid)?;

        match table {
            APP_FDB_TABLE_NAME => {
                let (vlan, mac) = rest.split_once(':').ok_or_else(invalid)?;
                Ok(TableKey::Fdb {
                    vlan: VlanId::from_interface_name(vlan)?,
                    mac: mac.parse()?,
                })
            }
            APP_NEIGH_TABLE_NAME => {
                // Everything after the interface name is the address, IPv6 colons included
                let (interface, ip) = rest.split_once(':').ok_or_else(invalid)?;
                if interface.is_empty() {
                    return Err(invalid());
                }
                Ok(TableKey::Neigh {
                    interface: interface.to_string(),
                    ip: ip.parse().map_err(|_| invalid())?,
                })
            }
            APP_ROUTE_TABLE_NAME if !rest.is_empty() => Ok(TableKey::Route {
                prefix: rest.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}
