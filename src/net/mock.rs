//! In-memory driver used by tests: injected frames land in a queue that
//! `capture` immediately serves back out, optionally transformed by a
//! caller-supplied responder. Mirrors the teacher's own test-double style of
//! building synthetic packets by hand rather than mocking a live socket.

use std::collections::VecDeque;

use super::Driver;
use crate::error::ScanError;

/// A scripted responder: given an injected frame, optionally produce a
/// reply frame that a later `capture()` call will return.
pub type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

pub struct MockDriver {
    tx_buf: Vec<u8>,
    injected: Vec<Vec<u8>>,
    rx_queue: VecDeque<Vec<u8>>,
    last_capture: Option<Vec<u8>>,
    responder: Option<Responder>,
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver {
            tx_buf: vec![0u8; 2048],
            injected: Vec::new(),
            rx_queue: VecDeque::new(),
            last_capture: None,
            responder: None,
        }
    }

    /// Installs a function that turns each injected frame into a reply the
    /// next `capture()` will surface.
    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Pushes a frame directly onto the capture queue, bypassing `inject`.
    pub fn push_capture(&mut self, frame: Vec<u8>) {
        self.rx_queue.push_back(frame);
    }

    /// All frames injected so far, in order.
    pub fn injected_frames(&self) -> &[Vec<u8>] {
        &self.injected
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MockDriver {
    fn get_buf(&mut self, len: usize) -> Result<&mut [u8], ScanError> {
        if len > self.tx_buf.len() {
            self.tx_buf.resize(len, 0);
        }
        Ok(&mut self.tx_buf[..len])
    }

    fn inject(&mut self, len: usize) -> Result<(), ScanError> {
        let frame = self.tx_buf[..len].to_vec();
        if let Some(responder) = self.responder.as_mut() {
            if let Some(reply) = responder(&frame) {
                self.rx_queue.push_back(reply);
            }
        }
        self.injected.push(frame);
        Ok(())
    }

    fn capture(&mut self) -> Option<&[u8]> {
        self.last_capture = self.rx_queue.pop_front();
        self.last_capture.as_deref()
    }

    fn release(&mut self) {
        self.last_capture = None;
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_frame_is_recorded() {
        let mut drv = MockDriver::new();
        let buf = drv.get_buf(4).unwrap();
        buf.copy_from_slice(&[1, 2, 3, 4]);
        drv.inject(4).unwrap();
        assert_eq!(drv.injected_frames(), &[vec![1, 2, 3, 4]]);
    }

    #[test]
    fn responder_produces_a_reply_frame() {
        let mut drv = MockDriver::new().with_responder(Box::new(|frame| {
            let mut reply = frame.to_vec();
            reply.push(0xff);
            Some(reply)
        }));
        let buf = drv.get_buf(2).unwrap();
        buf.copy_from_slice(&[9, 9]);
        drv.inject(2).unwrap();

        let captured = drv.capture().unwrap().to_vec();
        assert_eq!(captured, vec![9, 9, 0xff]);
        drv.release();
        assert!(drv.capture().is_none());
    }

    #[test]
    fn pushed_capture_is_served_fifo() {
        let mut drv = MockDriver::new();
        drv.push_capture(vec![1]);
        drv.push_capture(vec![2]);
        assert_eq!(drv.capture().unwrap(), &[1]);
        assert_eq!(drv.capture().unwrap(), &[2]);
    }
}
