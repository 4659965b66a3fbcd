//! Linux host interfaces and AF_PACKET raw sockets

use super::{FrameSocket, HostInterfaces, LinkLayer};
use crate::error::{DumpError, Result};
use crate::types::MacAddress;
use nix::ifaddrs::getifaddrs;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tracing::debug;

/// Interface addresses read with `getifaddrs(3)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl SystemInterfaces {
    pub fn new() -> Self {
        Self
    }

    fn addresses(&self, interface: &str) -> Result<Vec<nix::ifaddrs::InterfaceAddress>> {
        let addrs: Vec<_> = getifaddrs()
            .map_err(io::Error::from)?
            .filter(|ifa| ifa.interface_name == interface)
            .collect();
        if addrs.is_empty() {
            return Err(DumpError::InterfaceNotFound(interface.to_string()));
        }
        Ok(addrs)
    }
}

fn is_unicast_link_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

impl HostInterfaces for SystemInterfaces {
    fn mac_address(&self, interface: &str) -> Result<MacAddress> {
        self.addresses(interface)?
            .iter()
            .filter_map(|ifa| ifa.address.as_ref())
            .filter_map(|addr| addr.as_link_addr())
            .find_map(|link| link.addr())
            .map(MacAddress::new)
            .ok_or_else(|| DumpError::address_not_found(interface, "MAC"))
    }

    fn ipv4_address(&self, interface: &str) -> Result<Ipv4Addr> {
        self.addresses(interface)?
            .iter()
            .filter_map(|ifa| ifa.address.as_ref())
            .find_map(|addr| addr.as_sockaddr_in().map(|sin| *SocketAddrV4::from(*sin).ip()))
            .ok_or_else(|| DumpError::address_not_found(interface, "IPv4"))
    }

    fn ipv6_address(&self, interface: &str) -> Result<Ipv6Addr> {
        let candidates: Vec<Ipv6Addr> = self
            .addresses(interface)?
            .iter()
            .filter_map(|ifa| ifa.address.as_ref())
            .filter_map(|addr| addr.as_sockaddr_in6().map(|sin6| *SocketAddrV6::from(*sin6).ip()))
            .collect();

        candidates
            .iter()
            .find(|ip| !is_unicast_link_local(ip))
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| DumpError::address_not_found(interface, "IPv6"))
    }
}

/// Opens `AF_PACKET`/`SOCK_RAW` sockets bound to an interface
///
/// # NIST Controls
/// - SC-7: Boundary Protection - Frames leave only on the bound interface
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketLinkLayer;

impl PacketLinkLayer {
    pub fn new() -> Self {
        Self
    }
}

impl LinkLayer for PacketLinkLayer {
    fn open(&self, interface: &str) -> Result<Box<dyn FrameSocket>> {
        Ok(Box::new(PacketSocket::bind(interface)?))
    }
}

/// Raw socket bound to one interface; closed on drop
#[derive(Debug)]
struct PacketSocket {
    fd: OwnedFd,
    interface: String,
}

impl PacketSocket {
    fn bind(interface: &str) -> Result<Self> {
        let ifindex = nix::net::if_::if_nametoindex(interface)
            .map_err(|_| DumpError::InterfaceNotFound(interface.to_string()))?;

        let protocol = (libc::ETH_P_ALL as u16).to_be();

        // SAFETY: plain socket(2) call; the result is checked before use.
        let raw = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, i32::from(protocol)) };
        if raw < 0 {
            return Err(DumpError::socket("open", interface, io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly created descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let sockaddr = libc::sockaddr_ll {
            sll_family: libc::AF_PACKET as u16,
            sll_protocol: protocol,
            sll_ifindex: ifindex as i32,
            sll_hatype: 0,
            sll_pkttype: 0,
            sll_halen: 0,
            sll_addr: [0; 8],
        };
        // SAFETY: `sockaddr` is a valid sockaddr_ll and the length matches it.
        let ret = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &sockaddr as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(DumpError::socket("bind", interface, io::Error::last_os_error()));
        }

        debug!(interface, ifindex, "Bound AF_PACKET socket");
        Ok(Self {
            fd,
            interface: interface.to_string(),
        })
    }
}

impl FrameSocket for PacketSocket {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        // SAFETY: the buffer pointer and length come from a valid slice.
        let sent = unsafe {
            libc::send(
                self.fd.as_raw_fd(),
                frame.as_ptr().cast::<libc::c_void>(),
                frame.len(),
                0,
            )
        };
        if sent < 0 {
            return Err(DumpError::socket(
                "send",
                self.interface.as_str(),
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_local_detection() {
        assert!(is_unicast_link_local(&"fe80::1".parse().unwrap()));
        assert!(is_unicast_link_local(&"febf::1".parse().unwrap()));
        assert!(!is_unicast_link_local(&"fc00::1".parse().unwrap()));
        assert!(!is_unicast_link_local(&"2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_unknown_interface() {
        let host = SystemInterfaces::new();
        let err = host.mac_address("no-such-if0").unwrap_err();
        assert!(matches!(err, DumpError::InterfaceNotFound(_)));
    }

    #[test]
    fn test_loopback_has_ipv4() {
        let host = SystemInterfaces::new();
        // Every Linux host carries 127.0.0.1 on lo
        if let Ok(ip) = host.ipv4_address("lo") {
            assert!(ip.is_loopback());
        }
    }
}
