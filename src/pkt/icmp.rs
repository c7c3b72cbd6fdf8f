//! ICMPv4 header.

use crate::error::ScanError;
use crate::pkt::checksum;

pub const ICMP_ECHO: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub chksum: u16,
    pub id: u16,
    pub seq: u16,
}

impl Default for IcmpHeader {
    fn default() -> Self {
        IcmpHeader {
            icmp_type: ICMP_ECHO,
            code: 0,
            chksum: 0,
            id: 0,
            seq: 0,
        }
    }
}

impl IcmpHeader {
    pub const fn length() -> usize {
        8
    }

    /// `full` is the ICMP header plus any trailing payload already written
    /// at `buf[8..]`; the checksum covers all of it.
    pub fn pack(&self, buf: &mut [u8]) -> Result<(), ScanError> {
        if buf.len() < Self::length() {
            return Err(ScanError::Pack("buffer too small for icmp header".into()));
        }
        buf[0] = self.icmp_type;
        buf[1] = self.code;
        buf[2..4].copy_from_slice(&[0, 0]);
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.seq.to_be_bytes());

        let csum = checksum::checksum(buf);
        buf[2..4].copy_from_slice(&csum.to_be_bytes());
        Ok(())
    }

    pub fn unpack(buf: &[u8]) -> Result<Self, ScanError> {
        if buf.len() < Self::length() {
            return Err(ScanError::Unpack("frame shorter than an icmp header".into()));
        }
        Ok(IcmpHeader {
            icmp_type: buf[0],
            code: buf[1],
            chksum: u16::from_be_bytes([buf[2], buf[3]]),
            id: u16::from_be_bytes([buf[4], buf[5]]),
            seq: u16::from_be_bytes([buf[6], buf[7]]),
        })
    }

    /// ICMP types whose payload is another IPv4 header (ICMP-in-IP nesting).
    pub fn nests_ip4(&self) -> bool {
        matches!(self.icmp_type, 3 | 4 | 5 | 11)
    }
}
