//! Typed packet header stack: build defaults, two-pass pack, sequential
//! unpack. Headers are kept in an owned vector, innermost first (payload to
//! wire); the wire order is the reverse.

pub mod arp;
pub mod checksum;
pub mod cookie;
pub mod eth;
pub mod icmp;
pub mod ip4;
pub mod raw;
pub mod tcp;
pub mod udp;

use crate::error::ScanError;
use arp::ArpHeader;
use eth::{EthHeader, ETHERTYPE_ARP, ETHERTYPE_IP};
use icmp::IcmpHeader;
use ip4::Ip4Header;
use raw::RawHeader;
use tcp::TcpHeader;
use udp::UdpHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PktType {
    None,
    Eth,
    Arp,
    Ip4,
    Icmp,
    Udp,
    Tcp,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    Eth(EthHeader),
    Arp(ArpHeader),
    Ip4(Ip4Header),
    Icmp(IcmpHeader),
    Udp(UdpHeader),
    Tcp(TcpHeader),
    Raw(RawHeader),
}

impl Header {
    pub fn pkt_type(&self) -> PktType {
        match self {
            Header::Eth(_) => PktType::Eth,
            Header::Arp(_) => PktType::Arp,
            Header::Ip4(_) => PktType::Ip4,
            Header::Icmp(_) => PktType::Icmp,
            Header::Udp(_) => PktType::Udp,
            Header::Tcp(_) => PktType::Tcp,
            Header::Raw(_) => PktType::Raw,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Header::Eth(_) => EthHeader::length(),
            Header::Arp(h) => h.length(),
            Header::Ip4(_) => Ip4Header::length(),
            Header::Icmp(_) => IcmpHeader::length(),
            Header::Udp(_) => UdpHeader::length(),
            Header::Tcp(_) => TcpHeader::length(),
            Header::Raw(h) => h.length(),
        }
    }
}

/// A header stack, innermost first. Owns its nodes; dropping it frees them.
pub type PacketStack = Vec<Header>;

/// Builds a fresh header of `ty` with protocol-correct defaults.
pub fn build(ty: PktType) -> Header {
    match ty {
        PktType::Eth => Header::Eth(EthHeader::new([0; 6], [0; 6], 0)),
        PktType::Arp => Header::Arp(ArpHeader::new(0, 0, 0, &[0; 16], &[0; 16], &[0; 16], &[0; 16])),
        PktType::Ip4 => Header::Ip4(Ip4Header::default()),
        PktType::Icmp => Header::Icmp(IcmpHeader::default()),
        PktType::Udp => Header::Udp(UdpHeader::default()),
        PktType::Tcp => Header::Tcp(TcpHeader::default()),
        PktType::Raw => Header::Raw(RawHeader::default()),
        PktType::None => unreachable!("cannot build a TYPE_NONE header"),
    }
}

/// Packs `stack` into `buf`, returning the number of bytes written.
pub fn pack(stack: &mut PacketStack, buf: &mut [u8]) -> Result<usize, ScanError> {
    // Fix-up pass: innermost to outermost.
    let mut plen: usize = 0;
    for i in 0..stack.len() {
        plen += stack[i].length();
        let prev_type = if i > 0 { Some(stack[i - 1].pkt_type()) } else { None };

        match &mut stack[i] {
            Header::Ip4(h) => {
                if let Some(pt) = prev_type {
                    h.proto = match pt {
                        PktType::Icmp => ip4::PROTO_ICMP,
                        PktType::Udp => ip4::PROTO_UDP,
                        PktType::Tcp => ip4::PROTO_TCP,
                        _ => h.proto,
                    };
                }
                h.len = plen as u16;
            }
            Header::Udp(h) => h.len = plen as u16,
            _ => {}
        }
    }

    if buf.len() < plen {
        return Err(ScanError::Pack(format!(
            "buffer of {} bytes too small for {plen}-byte packet",
            buf.len()
        )));
    }

    // Emit pass: subtract each header's length to find its wire offset,
    // walking the same innermost-to-outermost order (so wire offsets fall
    // out naturally without needing to reverse the iteration).
    let mut i = plen;
    for idx in 0..stack.len() {
        i -= stack[idx].length();
        let tail = &mut buf[i..plen];
        let inner_type = if idx > 0 { Some(stack[idx - 1].pkt_type()) } else { None };

        match &stack[idx] {
            Header::Eth(h) => {
                let ethertype = match inner_type {
                    Some(PktType::Arp) => ETHERTYPE_ARP,
                    Some(PktType::Ip4) => ETHERTYPE_IP,
                    _ => h.ethertype,
                };
                h.pack(tail, ethertype)?;
            }
            Header::Arp(h) => h.pack(tail)?,
            Header::Ip4(h) => h.pack(tail)?,
            Header::Icmp(h) => h.pack(tail)?,
            Header::Udp(h) => {
                let pseudo = pseudo_header_for(stack, idx);
                h.pack(tail, pseudo)?;
            }
            Header::Tcp(h) => {
                let pseudo = pseudo_header_for(stack, idx);
                h.pack(tail, pseudo)?;
            }
            Header::Raw(h) => h.pack(tail)?,
        }
    }

    Ok(plen)
}

fn pseudo_header_for(
    stack: &PacketStack,
    idx: usize,
) -> Option<(std::net::Ipv4Addr, std::net::Ipv4Addr, u8)> {
    match stack.get(idx + 1) {
        Some(Header::Ip4(ip4)) => Some((ip4.src, ip4.dst, ip4.proto)),
        _ => None,
    }
}

/// Unpacks `buf` into a header stack, dispatching Ethernet -> ARP/IPv4 ->
/// ICMP/UDP/TCP -> Raw (and ICMP-in-IP for types 3/4/5/11). Returns the
/// empty stack if the frame is too short or malformed at any step.
pub fn unpack(buf: &[u8]) -> PacketStack {
    let mut stack = PacketStack::new();

    if buf.len() < EthHeader::length() {
        return stack;
    }

    let mut next_type = PktType::Eth;
    let mut offset = 0usize;

    while offset < buf.len() && next_type != PktType::None {
        let remaining = &buf[offset..];

        let (header, advance, following) = match next_type {
            PktType::Eth => match EthHeader::unpack(remaining) {
                Ok(h) => {
                    let nt = match h.ethertype {
                        eth::ETHERTYPE_ARP => PktType::Arp,
                        eth::ETHERTYPE_IP => PktType::Ip4,
                        _ => PktType::None,
                    };
                    let len = EthHeader::length();
                    (Header::Eth(h), len, nt)
                }
                Err(_) => break,
            },
            PktType::Arp => match ArpHeader::unpack(remaining) {
                Ok(h) => {
                    let len = h.length();
                    (Header::Arp(h), len, PktType::None)
                }
                Err(_) => break,
            },
            PktType::Ip4 => match Ip4Header::unpack(remaining) {
                Ok(h) => {
                    let len = (h.ihl as usize) * 4;
                    let nt = Ip4Header::next_type_for_proto(h.proto);
                    (Header::Ip4(h), len, nt)
                }
                Err(_) => break,
            },
            PktType::Icmp => match IcmpHeader::unpack(remaining) {
                Ok(h) => {
                    let nt = if h.nests_ip4() { PktType::Ip4 } else { PktType::Raw };
                    let len = IcmpHeader::length();
                    (Header::Icmp(h), len, nt)
                }
                Err(_) => break,
            },
            PktType::Udp => match UdpHeader::unpack(remaining) {
                Ok(h) => {
                    let len = UdpHeader::length();
                    (Header::Udp(h), len, PktType::Raw)
                }
                Err(_) => break,
            },
            PktType::Tcp => match TcpHeader::unpack(remaining) {
                Ok(h) => {
                    let len = (h.doff as usize) * 4;
                    (Header::Tcp(h), len, PktType::Raw)
                }
                Err(_) => break,
            },
            PktType::Raw => {
                let h = RawHeader::unpack(remaining);
                let len = h.payload.len();
                (Header::Raw(h), len, PktType::None)
            }
            PktType::None => unreachable!(),
        };

        if advance == 0 && !matches!(next_type, PktType::Raw) {
            break;
        }

        stack.push(header);
        offset += advance;
        next_type = following;
    }

    stack
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn tcp_over_ip4_over_eth() -> PacketStack {
        let mut tcp = TcpHeader::default();
        tcp.sport = 1234;
        tcp.dport = 80;
        tcp.syn = true;

        let mut ip4 = Ip4Header::default();
        ip4.src = Ipv4Addr::new(10, 0, 0, 1);
        ip4.dst = Ipv4Addr::new(10, 0, 0, 2);

        let eth = EthHeader::new([0xaa; 6], [0xbb; 6], 0);

        vec![Header::Tcp(tcp), Header::Ip4(ip4), Header::Eth(eth)]
    }

    #[test]
    fn pack_tcp_over_ip4_matches_expected_layout() {
        let mut stack = tcp_over_ip4_over_eth();
        let mut buf = [0u8; 64];
        let n = pack(&mut stack, &mut buf).unwrap();
        assert_eq!(n, 54);

        let ethertype = u16::from_be_bytes([buf[12], buf[13]]);
        assert_eq!(ethertype, ETHERTYPE_IP);

        let proto = buf[14 + 9];
        assert_eq!(proto, ip4::PROTO_TCP);
    }

    #[test]
    fn pack_then_unpack_round_trips_field_values() {
        let mut stack = tcp_over_ip4_over_eth();
        let mut buf = [0u8; 64];
        let n = pack(&mut stack, &mut buf).unwrap();

        let unpacked = unpack(&buf[..n]);
        assert_eq!(unpacked.len(), 3);

        match &unpacked[0] {
            Header::Eth(h) => assert_eq!(h.ethertype, ETHERTYPE_IP),
            _ => panic!("expected eth first"),
        }
        match &unpacked[1] {
            Header::Ip4(h) => {
                assert_eq!(h.proto, ip4::PROTO_TCP);
                assert_eq!(h.src, Ipv4Addr::new(10, 0, 0, 1));
                assert_eq!(h.dst, Ipv4Addr::new(10, 0, 0, 2));
            }
            _ => panic!("expected ip4 second"),
        }
        match &unpacked[2] {
            Header::Tcp(h) => {
                assert_eq!(h.sport, 1234);
                assert_eq!(h.dport, 80);
                assert!(h.syn);
            }
            _ => panic!("expected tcp third"),
        }
    }

    #[test]
    fn pack_into_too_small_buffer_errors() {
        let mut stack = tcp_over_ip4_over_eth();
        let mut buf = [0u8; 10];
        assert!(pack(&mut stack, &mut buf).is_err());
    }

    #[test]
    fn unpack_of_short_buffer_is_empty() {
        let buf = [0u8; 4];
        assert!(unpack(&buf).is_empty());
    }

    #[test]
    fn unpack_unknown_ethertype_stops_at_eth() {
        let mut buf = [0u8; 14];
        buf[12..14].copy_from_slice(&0x9999u16.to_be_bytes());
        let stack = unpack(&buf);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn checksum_of_packed_ip4_header_verifies_to_zero() {
        let mut stack = tcp_over_ip4_over_eth();
        let mut buf = [0u8; 64];
        pack(&mut stack, &mut buf).unwrap();
        assert_eq!(checksum::checksum(&buf[14..34]), 0);
    }
}
