//! Wait-free multi-producer / single-consumer queue of packet stacks,
//! sitting between the script bridge (producer, for script-enqueued
//! replies/retransmits) and the fused loop/sender worker (consumer).
//!
//! `crossbeam_queue::SegQueue` is an unbounded lock-free MPMC queue; used
//! here as an MP-SC by construction (exactly one thread ever calls `pop`).

use crossbeam_queue::SegQueue;

use crate::pkt::PacketStack;

#[derive(Default)]
pub struct PacketQueue {
    inner: SegQueue<PacketStack>,
}

impl PacketQueue {
    pub fn new() -> Self {
        PacketQueue {
            inner: SegQueue::new(),
        }
    }

    pub fn push(&self, stack: PacketStack) {
        self.inner.push(stack);
    }

    pub fn pop(&self) -> Option<PacketStack> {
        self.inner.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkt::{eth::EthHeader, Header};

    fn sample_stack() -> PacketStack {
        vec![Header::Eth(EthHeader::new([0; 6], [0; 6], 0))]
    }

    #[test]
    fn fifo_order_preserved() {
        let q = PacketQueue::new();
        q.push(sample_stack());
        q.push(sample_stack());
        assert!(!q.is_empty());
        assert!(q.pop().is_some());
        assert!(q.pop().is_some());
        assert!(q.pop().is_none());
    }
}
