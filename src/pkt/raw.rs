//! Raw payload bytes — either a user-supplied payload to send, or whatever
//! bytes remain after the last header unpack recognized.

use crate::error::ScanError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHeader {
    pub payload: Vec<u8>,
}

impl RawHeader {
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn pack(&self, buf: &mut [u8]) -> Result<(), ScanError> {
        if buf.len() < self.payload.len() {
            return Err(ScanError::Pack("buffer too small for raw payload".into()));
        }
        buf[..self.payload.len()].copy_from_slice(&self.payload);
        Ok(())
    }

    pub fn unpack(buf: &[u8]) -> Self {
        RawHeader {
            payload: buf.to_vec(),
        }
    }
}
