//! Core types for the forwarding-state snapshot
//!
//! Values read from the store are parsed into these types at the boundary;
//! everything downstream works on typed data only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Parse failures for snapshot types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(String),

    #[error("invalid FDB entry type: {0}")]
    InvalidFdbType(String),

    #[error("invalid table key: {0}")]
    InvalidTableKey(String),
}

/// A 48-bit Ethernet MAC address.
///
/// Displays in the canonical lower-case colon form (`aa:bb:cc:dd:ee:ff`).
/// Parsing accepts colon or hyphen separators in either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if the least significant bit of the first octet is clear.
    ///
    /// Only unicast addresses take part in FDB and neighbor processing.
    pub const fn is_unicast(&self) -> bool {
        self.0[0] & 0x01 == 0
    }

    /// Hyphen-separated form used in FDB_TABLE keys (`aa-bb-cc-dd-ee-ff`).
    pub fn to_hyphenated(&self) -> String {
        format!(
            "{:02x}-{:02x}-{:02x}-{:02x}-{:02x}-{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

/// IEEE 802.1Q VLAN identifier (1-4094).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID.
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID.
    pub const MAX: u16 = 4094;

    /// Creates a new VLAN ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the VLAN ID is not in the valid range (1-4094).
    pub fn new(id: u16) -> Result<Self, ParseError> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(VlanId(id))
        } else {
            Err(ParseError::InvalidVlanId(id.to_string()))
        }
    }

    /// Returns the VLAN ID as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Name of the VLAN's L3 interface (`Vlan<N>`).
    pub fn interface_name(&self) -> String {
        format!("Vlan{}", self.0)
    }

    /// Parses a `Vlan<N>` interface name.
    pub fn from_interface_name(name: &str) -> Result<Self, ParseError> {
        let id = name
            .strip_prefix("Vlan")
            .ok_or_else(|| ParseError::InvalidVlanId(name.to_string()))?;
        id.parse()
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = ParseError;

    /// Accepts canonical decimal only, so the id renders back to `s`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidVlanId(s.to_string());
        if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let id: u16 = s.parse().map_err(|_| invalid())?;
        VlanId::new(id)
    }
}

/// Opaque SAI object handle as stored in ASIC_DB (e.g. `oid:0x3a000000000616`).
///
/// Only ever compared for equality and used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(oid: impl Into<String>) -> Self {
        Self(oid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// FDB entry type as written to FDB_TABLE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FdbType {
    Dynamic,
    Static,
}

impl FdbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FdbType::Dynamic => "dynamic",
            FdbType::Static => "static",
        }
    }

    /// Maps the `SAI_FDB_ENTRY_ATTR_TYPE` value.
    pub fn from_sai(value: &str) -> Result<Self, ParseError> {
        match value {
            "SAI_FDB_ENTRY_TYPE_DYNAMIC" => Ok(FdbType::Dynamic),
            "SAI_FDB_ENTRY_TYPE_STATIC" => Ok(FdbType::Static),
            other => Err(ParseError::InvalidFdbType(other.to_string())),
        }
    }
}

impl fmt::Display for FdbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (VLAN, MAC) pair identifying one forwarding binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VlanMac {
    pub vlan: VlanId,
    pub mac: MacAddress,
}

impl VlanMac {
    pub fn new(vlan: VlanId, mac: MacAddress) -> Self {
        Self { vlan, mac }
    }
}

/// One learned forwarding binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbEntry {
    pub vlan: VlanId,
    pub mac: MacAddress,
    pub entry_type: FdbType,
    /// Egress interface name
    pub port: String,
}

impl FdbEntry {
    pub fn key(&self) -> VlanMac {
        VlanMac::new(self.vlan, self.mac)
    }
}

/// Neighbor selected for re-announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub vlan: VlanId,
    pub mac: MacAddress,
    pub ip: IpAddr,
}

impl NeighborEntry {
    pub fn key(&self) -> VlanMac {
        VlanMac::new(self.vlan, self.mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(mac.to_hyphenated(), "aa-bb-cc-dd-ee-ff");

        let hyphen: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(mac, hyphen);
    }

    #[test]
    fn test_mac_invalid() {
        assert!("invalid".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("gg:11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("0:11:22:33:44:55".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_mac_unicast() {
        let multicast: MacAddress = "01:00:5e:00:00:01".parse().unwrap();
        assert!(!multicast.is_unicast());

        let broadcast: MacAddress = "ff:ff:ff:ff:ff:ff".parse().unwrap();
        assert!(!broadcast.is_unicast());

        let unicast: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert!(unicast.is_unicast());
    }

    #[test]
    fn test_vlan_id_range() {
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(1).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(4095).is_err());
        assert_eq!("1000".parse::<VlanId>().unwrap().as_u16(), 1000);
    }

    #[test]
    fn test_vlan_interface_name() {
        let vlan = VlanId::new(10).unwrap();
        assert_eq!(vlan.interface_name(), "Vlan10");
        assert_eq!(VlanId::from_interface_name("Vlan10").unwrap(), vlan);
        assert!(VlanId::from_interface_name("Ethernet0").is_err());
        assert!(VlanId::from_interface_name("Vlan").is_err());
    }

    #[test]
    fn test_vlan_non_canonical_rejected() {
        for name in ["Vlan010", "Vlan+10", "Vlan 10", "Vlan10 ", "Vlan0", "Vlan99999"] {
            assert!(VlanId::from_interface_name(name).is_err(), "{}", name);
        }
        assert!(" 10".parse::<VlanId>().is_err());
    }

    #[test]
    fn test_fdb_type_from_sai() {
        assert_eq!(
            FdbType::from_sai("SAI_FDB_ENTRY_TYPE_STATIC").unwrap(),
            FdbType::Static
        );
        assert_eq!(
            FdbType::from_sai("SAI_FDB_ENTRY_TYPE_DYNAMIC").unwrap(),
            FdbType::Dynamic
        );
        assert!(FdbType::from_sai("SAI_FDB_ENTRY_TYPE_UNKNOWN").is_err());
        assert_eq!(FdbType::Static.to_string(), "static");
    }

    #[test]
    fn test_neighbor_key() {
        let vlan = VlanId::new(10).unwrap();
        let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let entry = NeighborEntry {
            vlan,
            mac,
            ip: "fc00::5".parse().unwrap(),
        };
        assert_eq!(entry.key(), VlanMac::new(vlan, mac));
    }
}
