//! Link-layer announcement frames
//!
//! Both frames are unicast to the neighbor being refreshed and carry the
//! egress interface MAC as the sender hardware address.

use crate::types::MacAddress;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Ethernet + ARP request, padded to the Ethernet minimum
pub const ARP_FRAME_LEN: usize = 60;

/// Ethernet + IPv6 + ICMPv6 Neighbor Solicitation with one SLLA option
pub const NS_FRAME_LEN: usize = 86;

const ETH_HEADER_LEN: usize = 14;
const ETHERTYPE_ARP: [u8; 2] = [0x08, 0x06];
const ETHERTYPE_IPV6: [u8; 2] = [0x86, 0xdd];

/// hardware type Ethernet, protocol IPv4, hlen 6, plen 4, op request
const ARP_REQUEST_HEADER: [u8; 8] = [0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01];

const IPV6_HEADER_LEN: usize = 40;
const IPPROTO_ICMPV6: u8 = 58;
const NDP_HOP_LIMIT: u8 = 255;
const ICMPV6_NEIGHBOR_SOLICITATION: u8 = 135;
const NDP_OPT_SOURCE_LINK_ADDR: u8 = 1;
/// type(1) code(1) checksum(2) reserved(4) target(16) option(8)
const NS_PAYLOAD_LEN: usize = 32;

fn ethernet_header(frame: &mut [u8], dst: &MacAddress, src: &MacAddress, ethertype: [u8; 2]) {
    frame[0..6].copy_from_slice(dst.as_bytes());
    frame[6..12].copy_from_slice(src.as_bytes());
    frame[12..14].copy_from_slice(&ethertype);
}

/// Builds an ARP request from (`sender_mac`, `sender_ip`) to (`target_mac`, `target_ip`).
///
/// The target hardware address is filled in, so the request refreshes the
/// peer's cache entry for the sender without a broadcast.
pub fn arp_request(
    sender_mac: &MacAddress,
    sender_ip: Ipv4Addr,
    target_mac: &MacAddress,
    target_ip: Ipv4Addr,
) -> [u8; ARP_FRAME_LEN] {
    let mut frame = [0u8; ARP_FRAME_LEN];
    ethernet_header(&mut frame, target_mac, sender_mac, ETHERTYPE_ARP);

    let arp = &mut frame[ETH_HEADER_LEN..];
    arp[0..8].copy_from_slice(&ARP_REQUEST_HEADER);
    arp[8..14].copy_from_slice(sender_mac.as_bytes());
    arp[14..18].copy_from_slice(&sender_ip.octets());
    arp[18..24].copy_from_slice(target_mac.as_bytes());
    arp[24..28].copy_from_slice(&target_ip.octets());
    // Remaining 18 bytes stay zero as padding

    frame
}

/// Builds a unicast Neighbor Solicitation for `target_ip`.
///
/// The Source Link-Layer Address option carries `sender_mac`, which makes the
/// target update (or create) its cache entry for `sender_ip`.
pub fn neighbor_solicitation(
    sender_mac: &MacAddress,
    sender_ip: Ipv6Addr,
    target_mac: &MacAddress,
    target_ip: Ipv6Addr,
) -> [u8; NS_FRAME_LEN] {
    let mut frame = [0u8; NS_FRAME_LEN];
    ethernet_header(&mut frame, target_mac, sender_mac, ETHERTYPE_IPV6);

    let ip = &mut frame[ETH_HEADER_LEN..ETH_HEADER_LEN + IPV6_HEADER_LEN];
    // Version 6, traffic class 0, flow label 0
    ip[0] = 0x60;
    ip[4..6].copy_from_slice(&(NS_PAYLOAD_LEN as u16).to_be_bytes());
    ip[6] = IPPROTO_ICMPV6;
    ip[7] = NDP_HOP_LIMIT;
    ip[8..24].copy_from_slice(&sender_ip.octets());
    ip[24..40].copy_from_slice(&target_ip.octets());

    let icmp = &mut frame[ETH_HEADER_LEN + IPV6_HEADER_LEN..];
    icmp[0] = ICMPV6_NEIGHBOR_SOLICITATION;
    icmp[8..24].copy_from_slice(&target_ip.octets());
    icmp[24] = NDP_OPT_SOURCE_LINK_ADDR;
    // Option length in units of 8 octets
    icmp[25] = 1;
    icmp[26..32].copy_from_slice(sender_mac.as_bytes());

    let checksum = icmpv6_checksum(&sender_ip, &target_ip, icmp);
    icmp[2..4].copy_from_slice(&checksum.to_be_bytes());

    frame
}

/// One's complement sum of the IPv6 pseudo-header and `data`, not yet inverted
fn pseudo_header_sum(src: &Ipv6Addr, dst: &Ipv6Addr, data: &[u8]) -> u32 {
    let mut sum: u32 = 0;

    for chunk in src.octets().chunks(2).chain(dst.octets().chunks(2)) {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    let length = data.len() as u32;
    sum += length >> 16;
    sum += length & 0xffff;
    sum += u32::from(IPPROTO_ICMPV6);

    for chunk in data.chunks(2) {
        let word = match chunk {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from_be_bytes([*hi, 0]),
            _ => 0,
        };
        sum += u32::from(word);
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum
}

/// ICMPv6 checksum of `data`, whose checksum field must be zero
fn icmpv6_checksum(src: &Ipv6Addr, dst: &Ipv6Addr, data: &[u8]) -> u16 {
    !(pseudo_header_sum(src, dst, data) as u16)
}
