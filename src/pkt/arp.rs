//! ARP header with variable-length hardware/protocol addresses.

use crate::error::ScanError;
use crate::pkt::eth::ETHERTYPE_IP;

pub const ARPHRD_ETHER: u16 = 1;
pub const ETHERTYPE_IPV6: u16 = 0x86dd;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpHeader {
    pub hwtype: u16,
    pub ptype: u16,
    pub op: u16,
    pub hwsrc: Vec<u8>,
    pub psrc: Vec<u8>,
    pub hwdst: Vec<u8>,
    pub pdst: Vec<u8>,
}

impl ArpHeader {
    /// Mirrors `pkt_build_arp`: address widths are derived from `hwtype`/`ptype`.
    pub fn new(
        hwtype: u16,
        ptype: u16,
        op: u16,
        hwsrc: &[u8],
        psrc: &[u8],
        hwdst: &[u8],
        pdst: &[u8],
    ) -> Self {
        let hwlen = if hwtype == ARPHRD_ETHER { 6 } else { 0 };
        let plen = match ptype {
            ETHERTYPE_IP => 4,
            ETHERTYPE_IPV6 => 16,
            _ => 0,
        };
        ArpHeader {
            hwtype,
            ptype,
            op,
            hwsrc: hwsrc[..hwlen].to_vec(),
            psrc: psrc[..plen].to_vec(),
            hwdst: hwdst[..hwlen].to_vec(),
            pdst: pdst[..plen].to_vec(),
        }
    }

    pub fn length(&self) -> usize {
        8 + self.hwsrc.len() * 2 + self.psrc.len() * 2
    }

    pub fn pack(&self, buf: &mut [u8]) -> Result<(), ScanError> {
        if buf.len() < self.length() {
            return Err(ScanError::Pack("buffer too small for arp header".into()));
        }
        buf[0..2].copy_from_slice(&self.hwtype.to_be_bytes());
        buf[2..4].copy_from_slice(&self.ptype.to_be_bytes());
        buf[4] = self.hwsrc.len() as u8;
        buf[5] = self.psrc.len() as u8;
        buf[6..8].copy_from_slice(&self.op.to_be_bytes());

        let mut i = 8;
        buf[i..i + self.hwsrc.len()].copy_from_slice(&self.hwsrc);
        i += self.hwsrc.len();
        buf[i..i + self.psrc.len()].copy_from_slice(&self.psrc);
        i += self.psrc.len();
        buf[i..i + self.hwdst.len()].copy_from_slice(&self.hwdst);
        i += self.hwdst.len();
        buf[i..i + self.pdst.len()].copy_from_slice(&self.pdst);
        Ok(())
    }

    pub fn unpack(buf: &[u8]) -> Result<Self, ScanError> {
        if buf.len() < 8 {
            return Err(ScanError::Unpack("frame shorter than an arp header".into()));
        }
        let hwtype = u16::from_be_bytes([buf[0], buf[1]]);
        let ptype = u16::from_be_bytes([buf[2], buf[3]]);
        let hwlen = buf[4] as usize;
        let plen = buf[5] as usize;
        let op = u16::from_be_bytes([buf[6], buf[7]]);

        let total = 8 + hwlen * 2 + plen * 2;
        if buf.len() < total {
            return Err(ScanError::Unpack("truncated arp addresses".into()));
        }

        let mut i = 8;
        let hwsrc = buf[i..i + hwlen].to_vec();
        i += hwlen;
        let psrc = buf[i..i + plen].to_vec();
        i += plen;
        let hwdst = buf[i..i + hwlen].to_vec();
        i += hwlen;
        let pdst = buf[i..i + plen].to_vec();

        Ok(ArpHeader {
            hwtype,
            ptype,
            op,
            hwsrc,
            psrc,
            hwdst,
            pdst,
        })
    }
}
