//! Neighbor re-announcement
//!
//! After a restart, every neighbor kept in the snapshot is sent one frame on
//! the interface its MAC was learned on: an ARP request for IPv4 neighbors and
//! a Neighbor Solicitation for IPv6 neighbors. Peers refresh their cache entry
//! for the switch without waiting for it to time out.

pub mod frame;
#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use self::linux::{PacketLinkLayer, SystemInterfaces};

use crate::error::Result;
use crate::fdb::FdbSnapshot;
use crate::interrupt::Interrupt;
use crate::types::{MacAddress, NeighborEntry, VlanId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{debug, info, instrument, trace};

/// Host network interface queries
#[cfg_attr(test, mockall::automock)]
pub trait HostInterfaces {
    /// Hardware address of `interface`
    fn mac_address(&self, interface: &str) -> Result<MacAddress>;

    /// First IPv4 address configured on `interface`
    fn ipv4_address(&self, interface: &str) -> Result<Ipv4Addr>;

    /// IPv6 address of `interface`, global scope preferred over link-local
    fn ipv6_address(&self, interface: &str) -> Result<Ipv6Addr>;
}

/// A link-layer socket bound to one interface
#[cfg_attr(test, mockall::automock)]
pub trait FrameSocket {
    /// Transmits one complete Ethernet frame
    fn send(&mut self, frame: &[u8]) -> Result<()>;
}

/// Opens link-layer sockets
#[cfg_attr(test, mockall::automock)]
pub trait LinkLayer {
    fn open(&self, interface: &str) -> Result<Box<dyn FrameSocket>>;
}

/// Frames sent by one announcement pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnounceSummary {
    pub arp_requests: usize,
    pub neighbor_solicitations: usize,
    /// Distinct egress interfaces a socket was opened on
    pub interfaces: usize,
}

/// Sends one announcement per neighbor.
///
/// # NIST Controls
/// - SC-5: DoS Protection - One frame per neighbor, one socket per interface
/// - SI-11: Error Handling - Any resolution or send failure aborts the pass
pub struct Announcer<'a> {
    host: &'a dyn HostInterfaces,
    link: &'a dyn LinkLayer,
    ndp: bool,
}

impl<'a> Announcer<'a> {
    pub fn new(host: &'a dyn HostInterfaces, link: &'a dyn LinkLayer) -> Self {
        Self {
            host,
            link,
            ndp: true,
        }
    }

    /// Enables or disables Neighbor Solicitations for IPv6 neighbors
    pub fn with_ndp(mut self, enabled: bool) -> Self {
        self.ndp = enabled;
        self
    }

    /// Announces `neighbors` on the interfaces recorded in `fdb`.
    ///
    /// VLAN source addresses and interface MACs are resolved up front; one
    /// socket per egress interface is opened and closed again before
    /// returning. `interrupt` is checked before every frame.
    #[instrument(skip_all, fields(neighbors = neighbors.len(), ndp = self.ndp))]
    pub fn announce(
        &self,
        neighbors: &[NeighborEntry],
        fdb: &FdbSnapshot,
        interrupt: &Interrupt,
    ) -> Result<AnnounceSummary> {
        let mut targets = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            if neighbor.ip.is_ipv6() && !self.ndp {
                continue;
            }
            match fdb.egress_interface(&neighbor.key()) {
                Some(interface) => targets.push((neighbor, interface)),
                None => debug!(
                    vlan = %neighbor.vlan,
                    mac = %neighbor.mac,
                    "No egress interface for neighbor"
                ),
            }
        }

        // Source addresses, only for the families each VLAN needs
        let mut ipv4_sources: HashMap<VlanId, Ipv4Addr> = HashMap::new();
        let mut ipv6_sources: HashMap<VlanId, Ipv6Addr> = HashMap::new();
        let mut requests = Vec::with_capacity(targets.len());
        for (neighbor, interface) in &targets {
            let vlan_interface = neighbor.vlan.interface_name();
            let request = match neighbor.ip {
                IpAddr::V4(target) => {
                    let source = match ipv4_sources.entry(neighbor.vlan) {
                        Entry::Occupied(slot) => *slot.get(),
                        Entry::Vacant(slot) => {
                            *slot.insert(self.host.ipv4_address(&vlan_interface)?)
                        }
                    };
                    Request::Arp { source, target }
                }
                IpAddr::V6(target) => {
                    let source = match ipv6_sources.entry(neighbor.vlan) {
                        Entry::Occupied(slot) => *slot.get(),
                        Entry::Vacant(slot) => {
                            *slot.insert(self.host.ipv6_address(&vlan_interface)?)
                        }
                    };
                    Request::Solicit { source, target }
                }
            };
            requests.push((*neighbor, *interface, request));
        }

        let mut sockets: Vec<(MacAddress, Box<dyn FrameSocket>)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut plan = Vec::with_capacity(requests.len());
        for (neighbor, interface, request) in requests {
            let slot = match slots.entry(interface) {
                Entry::Occupied(slot) => *slot.get(),
                Entry::Vacant(slot) => {
                    let mac = self.host.mac_address(interface)?;
                    let socket = self.link.open(interface)?;
                    debug!(interface = %interface, mac = %mac, "Opened raw socket");
                    sockets.push((mac, socket));
                    *slot.insert(sockets.len() - 1)
                }
            };
            plan.push((neighbor, interface, slot, request));
        }

        let mut summary = AnnounceSummary {
            interfaces: sockets.len(),
            ..AnnounceSummary::default()
        };

        for (neighbor, interface, slot, request) in plan {
            interrupt.check()?;
            let (egress_mac, socket) = &mut sockets[slot];
            match request {
                Request::Arp { source, target } => {
                    let frame = frame::arp_request(egress_mac, source, &neighbor.mac, target);
                    socket.send(&frame)?;
                    summary.arp_requests += 1;
                }
                Request::Solicit { source, target } => {
                    let frame =
                        frame::neighbor_solicitation(egress_mac, source, &neighbor.mac, target);
                    socket.send(&frame)?;
                    summary.neighbor_solicitations += 1;
                }
            }
            trace!(interface = %interface, ip = %neighbor.ip, "Announcement sent");
        }

        drop(sockets);

        info!(
            arp = summary.arp_requests,
            ndp = summary.neighbor_solicitations,
            interfaces = summary.interfaces,
            "Announcements sent"
        );
        Ok(summary)
    }
}

/// Frame to send to one neighbor, with its resolved source address
#[derive(Debug, Clone, Copy)]
enum Request {
    Arp { source: Ipv4Addr, target: Ipv4Addr },
    Solicit { source: Ipv6Addr, target: Ipv6Addr },
}
