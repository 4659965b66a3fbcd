//! A real SIGINT delivered while announcements are being sent
//!
//! Kept in its own test binary: the handler is process-wide.

#![cfg(target_os = "linux")]

use nix::sys::signal::{raise, Signal};
use sonic_fast_reboot_dump::error::EXIT_INTERRUPTED;
use sonic_fast_reboot_dump::{
    pipeline, Announcer, DumpConfig, DumpError, FrameSocket, HostInterfaces, Interrupt,
    LinkLayer, MacAddress, MemoryConnector, MemoryStore, Namespace, Result,
};
use std::cell::Cell;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::rc::Rc;
use tempfile::TempDir;

struct Vlan10Host;

impl HostInterfaces for Vlan10Host {
    fn mac_address(&self, _interface: &str) -> Result<MacAddress> {
        Ok(MacAddress::new([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]))
    }

    fn ipv4_address(&self, _interface: &str) -> Result<Ipv4Addr> {
        Ok(Ipv4Addr::new(10, 0, 0, 1))
    }

    fn ipv6_address(&self, interface: &str) -> Result<Ipv6Addr> {
        Err(DumpError::address_not_found(interface, "IPv6"))
    }
}

/// Raises SIGINT from inside every send
#[derive(Default)]
struct SignallingLink {
    sent: Rc<Cell<usize>>,
}

struct SignallingSocket {
    sent: Rc<Cell<usize>>,
}

impl FrameSocket for SignallingSocket {
    fn send(&mut self, _frame: &[u8]) -> Result<()> {
        self.sent.set(self.sent.get() + 1);
        raise(Signal::SIGINT).map_err(std::io::Error::from)?;
        Ok(())
    }
}

impl LinkLayer for SignallingLink {
    fn open(&self, _interface: &str) -> Result<Box<dyn FrameSocket>> {
        Ok(Box::new(SignallingSocket {
            sent: Rc::clone(&self.sent),
        }))
    }
}

fn stores() -> MemoryConnector {
    let mut asic = MemoryStore::new(Namespace::AsicDb);
    asic.insert(
        "ASIC_STATE:SAI_OBJECT_TYPE_BRIDGE_PORT:oid:0x3a01",
        [
            ("SAI_BRIDGE_PORT_ATTR_TYPE", "SAI_BRIDGE_PORT_TYPE_PORT"),
            ("SAI_BRIDGE_PORT_ATTR_PORT_ID", "oid:0x101"),
        ],
    );
    asic.insert(
        "ASIC_STATE:SAI_OBJECT_TYPE_HOSTIF:oid:0xd01",
        [
            ("SAI_HOSTIF_ATTR_OBJ_ID", "oid:0x101"),
            ("SAI_HOSTIF_ATTR_NAME", "Ethernet0"),
        ],
    );
    asic.insert(
        "ASIC_STATE:SAI_OBJECT_TYPE_VLAN:oid:0x2610",
        [("SAI_VLAN_ATTR_VLAN_ID", "10")],
    );

    let mut appl = MemoryStore::new(Namespace::ApplDb);
    for (mac, ip) in [("aa:bb:cc:dd:ee:01", "10.0.0.5"), ("aa:bb:cc:dd:ee:02", "10.0.0.6")] {
        asic.insert(
            format!(
                r#"ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY:{{"bvid":"oid:0x2610","mac":"{}"}}"#,
                mac
            ),
            [
                ("SAI_FDB_ENTRY_ATTR_TYPE", "SAI_FDB_ENTRY_TYPE_DYNAMIC"),
                ("SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID", "oid:0x3a01"),
            ],
        );
        appl.insert(
            format!("NEIGH_TABLE:Vlan10:{}", ip),
            [("neigh", mac), ("family", "IPv4")],
        );
    }
    MemoryConnector::new(asic, appl)
}

#[tokio::test]
async fn test_sigint_during_send_loop_aborts_run() {
    let interrupt = Interrupt::sigint().unwrap();
    let dir = TempDir::new().unwrap();
    let connector = stores();
    let link = SignallingLink::default();
    let announcer = Announcer::new(&Vlan10Host, &link);

    let err = pipeline::run(
        &connector,
        &DumpConfig::default(),
        dir.path(),
        Some(&announcer),
        &interrupt,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DumpError::Interrupted));
    assert_eq!(err.exit_code(), EXIT_INTERRUPTED);
    assert_eq!(link.sent.get(), 1);
}
