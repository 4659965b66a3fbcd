//! Typed views of the store records the snapshot builders consume
//!
//! Each record is validated from a raw [`FieldMap`] (or key) exactly once.
//! A [`RecordError`] means the record is malformed; callers skip it.

use crate::store::FieldMap;
use crate::tables::attrs;
use crate::types::{FdbType, MacAddress, ObjectId, ParseError, VlanId};
use serde::Deserialize;
use thiserror::Error;

/// Why a store record could not be used
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid key object: {0}")]
    KeyObject(#[from] serde_json::Error),
}

fn required<'a>(fields: &'a FieldMap, name: &'static str) -> Result<&'a str, RecordError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or(RecordError::MissingField(name))
}

/// `SAI_OBJECT_TYPE_BRIDGE_PORT` attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgePortRecord {
    pub bridge_port_type: String,
    pub port_id: Option<ObjectId>,
}

impl BridgePortRecord {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, RecordError> {
        Ok(Self {
            bridge_port_type: required(fields, attrs::BRIDGE_PORT_TYPE)?.to_string(),
            port_id: fields
                .get(attrs::BRIDGE_PORT_PORT_ID)
                .map(|oid| ObjectId::new(oid.as_str())),
        })
    }

    /// Underlying port, for bridge ports of type PORT only
    pub fn port(&self) -> Option<&ObjectId> {
        if self.bridge_port_type == attrs::BRIDGE_PORT_TYPE_PORT {
            self.port_id.as_ref()
        } else {
            None
        }
    }
}

/// `SAI_OBJECT_TYPE_HOSTIF` attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIfRecord {
    /// Port (or LAG) the host interface is attached to
    pub obj_id: ObjectId,
    /// Kernel netdev name
    pub name: String,
}

impl HostIfRecord {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, RecordError> {
        let name = required(fields, attrs::HOSTIF_NAME)?;
        if name.is_empty() {
            return Err(RecordError::MissingField(attrs::HOSTIF_NAME));
        }
        Ok(Self {
            obj_id: ObjectId::new(required(fields, attrs::HOSTIF_OBJ_ID)?),
            name: name.to_string(),
        })
    }
}

/// `SAI_OBJECT_TYPE_VLAN` attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanRecord {
    pub vlan_id: VlanId,
}

impl VlanRecord {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, RecordError> {
        Ok(Self {
            vlan_id: required(fields, attrs::VLAN_ID)?.parse()?,
        })
    }
}

/// JSON object embedded in an FDB entry key, e.g.
/// `{"bvid":"oid:0x26000000000013","mac":"00:11:22:33:44:55","switch_id":"oid:0x21000000000000"}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FdbKeyObject {
    pub mac: MacAddress,
    pub bvid: ObjectId,
}

impl FdbKeyObject {
    /// Parses the part of the key after the FDB entry prefix
    pub fn parse(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `SAI_OBJECT_TYPE_FDB_ENTRY` attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbAttributes {
    pub entry_type: FdbType,
    pub bridge_port_id: ObjectId,
}

impl FdbAttributes {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, RecordError> {
        Ok(Self {
            entry_type: FdbType::from_sai(required(fields, attrs::FDB_ENTRY_TYPE)?)?,
            bridge_port_id: ObjectId::new(required(fields, attrs::FDB_ENTRY_BRIDGE_PORT_ID)?),
        })
    }
}

/// NEIGH_TABLE fields used for filtering; the rest are dumped untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighRecord {
    pub mac: MacAddress,
}

impl NeighRecord {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, RecordError> {
        Ok(Self {
            mac: required(fields, crate::tables::fields::NEIGH)?.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bridge_port_type_filter() {
        let port = BridgePortRecord::from_fields(&fields(&[
            (attrs::BRIDGE_PORT_TYPE, "SAI_BRIDGE_PORT_TYPE_PORT"),
            (attrs::BRIDGE_PORT_PORT_ID, "oid:0x1000000000002"),
        ]))
        .unwrap();
        assert_eq!(port.port(), Some(&ObjectId::from("oid:0x1000000000002")));

        let router = BridgePortRecord::from_fields(&fields(&[
            (attrs::BRIDGE_PORT_TYPE, "SAI_BRIDGE_PORT_TYPE_1Q_ROUTER"),
            (attrs::BRIDGE_PORT_PORT_ID, "oid:0x1000000000002"),
        ]))
        .unwrap();
        assert_eq!(router.port(), None);

        assert!(BridgePortRecord::from_fields(&FieldMap::new()).is_err());
    }

    #[test]
    fn test_hostif_requires_name_and_obj() {
        let hostif = HostIfRecord::from_fields(&fields(&[
            (attrs::HOSTIF_OBJ_ID, "oid:0x1000000000002"),
            (attrs::HOSTIF_NAME, "Ethernet0"),
        ]))
        .unwrap();
        assert_eq!(hostif.name, "Ethernet0");

        assert!(HostIfRecord::from_fields(&fields(&[(attrs::HOSTIF_NAME, "Ethernet0")])).is_err());
        assert!(HostIfRecord::from_fields(&fields(&[
            (attrs::HOSTIF_OBJ_ID, "oid:0x1"),
            (attrs::HOSTIF_NAME, ""),
        ]))
        .is_err());
    }

    #[test]
    fn test_vlan_record() {
        let vlan = VlanRecord::from_fields(&fields(&[(attrs::VLAN_ID, "1000")])).unwrap();
        assert_eq!(vlan.vlan_id.as_u16(), 1000);

        assert!(VlanRecord::from_fields(&fields(&[(attrs::VLAN_ID, "0")])).is_err());
        assert!(VlanRecord::from_fields(&FieldMap::new()).is_err());
    }

    #[test]
    fn test_fdb_key_object() {
        let key = FdbKeyObject::parse(
            r#"{"bvid":"oid:0x26000000000013","mac":"AA:BB:CC:DD:EE:FF","switch_id":"oid:0x21000000000000"}"#,
        )
        .unwrap();
        assert_eq!(key.bvid, ObjectId::from("oid:0x26000000000013"));
        assert_eq!(key.mac.to_string(), "aa:bb:cc:dd:ee:ff");

        assert!(FdbKeyObject::parse(r#"{"mac":"aa:bb:cc:dd:ee:ff"}"#).is_err());
        assert!(FdbKeyObject::parse(r#"{"bvid":"oid:0x1","mac":"zz"}"#).is_err());
        assert!(FdbKeyObject::parse("not json").is_err());
    }

    #[test]
    fn test_fdb_attributes() {
        let parsed = FdbAttributes::from_fields(&fields(&[
            (attrs::FDB_ENTRY_TYPE, "SAI_FDB_ENTRY_TYPE_DYNAMIC"),
            (attrs::FDB_ENTRY_BRIDGE_PORT_ID, "oid:0x3a000000000616"),
        ]))
        .unwrap();
        assert_eq!(parsed.entry_type, FdbType::Dynamic);

        let err = FdbAttributes::from_fields(&fields(&[(
            attrs::FDB_ENTRY_TYPE,
            "SAI_FDB_ENTRY_TYPE_DYNAMIC",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::MissingField(attrs::FDB_ENTRY_BRIDGE_PORT_ID)
        ));
    }

    #[test]
    fn test_neigh_record_normalizes_mac() {
        let neigh = NeighRecord::from_fields(&fields(&[
            ("neigh", "AA:BB:CC:DD:EE:FF"),
            ("family", "IPv4"),
        ]))
        .unwrap();
        assert_eq!(neigh.mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }
}
