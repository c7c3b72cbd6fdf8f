//! UDP header.

use crate::error::ScanError;
use crate::pkt::checksum;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UdpHeader {
    pub sport: u16,
    pub dport: u16,
    pub len: u16,
    pub chksum: u16,
}

impl UdpHeader {
    pub const fn length() -> usize {
        8
    }

    /// `buf` is this header plus any trailing payload; `pseudo` is the
    /// enclosing IPv4 header's (src, dst, proto) used to seed the checksum.
    pub fn pack(&self, buf: &mut [u8], pseudo: Option<(Ipv4Addr, Ipv4Addr, u8)>) -> Result<(), ScanError> {
        if buf.len() < Self::length() {
            return Err(ScanError::Pack("buffer too small for udp header".into()));
        }
        buf[0..2].copy_from_slice(&self.sport.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dport.to_be_bytes());
        buf[4..6].copy_from_slice(&self.len.to_be_bytes());
        buf[6..8].copy_from_slice(&[0, 0]);

        let csum = match pseudo {
            Some((src, dst, proto)) => checksum::checksum_with_pseudo(src, dst, proto, buf),
            None => checksum::checksum(buf),
        };
        buf[6..8].copy_from_slice(&csum.to_be_bytes());
        Ok(())
    }

    pub fn unpack(buf: &[u8]) -> Result<Self, ScanError> {
        if buf.len() < Self::length() {
            return Err(ScanError::Unpack("frame shorter than a udp header".into()));
        }
        Ok(UdpHeader {
            sport: u16::from_be_bytes([buf[0], buf[1]]),
            dport: u16::from_be_bytes([buf[2], buf[3]]),
            len: u16::from_be_bytes([buf[4], buf[5]]),
            chksum: u16::from_be_bytes([buf[6], buf[7]]),
        })
    }
}
