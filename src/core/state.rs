//! Process-wide scan state shared by the three workers and the status line.
//! Counters are relaxed atomics (single writer each, tolerated tearing on
//! read); flags are atomic bools set cooperatively, never locked.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::ranges::RangeList;

pub struct ScanState {
    pub pkt_count: AtomicU64,
    pub pkt_probe: AtomicU64,
    pub pkt_sent: AtomicU64,
    pub pkt_recv: AtomicU64,

    pub done: AtomicBool,
    pub stop: AtomicBool,
    pub quiet: bool,

    pub local_mac: [u8; 6],
    pub local_addr: Ipv4Addr,
    pub gateway_mac: [u8; 6],
    pub gateway_addr: Ipv4Addr,

    pub targets: RangeList,
    pub ports: RangeList,

    pub seed: u64,
    pub rate: u64,
    pub wait: u64,
    pub count: u64,
    pub shuffle: bool,
}

impl ScanState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        targets: RangeList,
        ports: RangeList,
        local_mac: [u8; 6],
        local_addr: Ipv4Addr,
        gateway_mac: [u8; 6],
        gateway_addr: Ipv4Addr,
        seed: u64,
        rate: u64,
        wait: u64,
        count: u64,
        shuffle: bool,
        quiet: bool,
    ) -> Self {
        let total = targets.count() * ports.count() * count;
        ScanState {
            pkt_count: AtomicU64::new(total),
            pkt_probe: AtomicU64::new(0),
            pkt_sent: AtomicU64::new(0),
            pkt_recv: AtomicU64::new(0),
            done: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            quiet,
            local_mac,
            local_addr,
            gateway_mac,
            gateway_addr,
            targets,
            ports,
            seed,
            rate,
            wait,
            count,
            shuffle,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Decodes target cursor `i` into `(daddr, dport)` per the target/port
    /// index arithmetic: targets change fastest, and for `count > 1` the
    /// outer divisions collapse the index modulo `count`, yielding `count`
    /// consecutive repeats per (target, port) pair.
    pub fn decode_cursor(&self, slot: u64) -> Option<(Ipv4Addr, u16)> {
        let tgt_cnt = self.targets.count();
        if tgt_cnt == 0 || self.count == 0 {
            return None;
        }

        let daddr = self.targets.pick((slot % tgt_cnt) / self.count)?;
        let dport = self.ports.pick((slot / tgt_cnt) / self.count)?;

        Some((Ipv4Addr::from(daddr), dport as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state(count: u64) -> ScanState {
        let mut targets = RangeList::new();
        targets.add(1, 2); // two targets: 1, 2
        let mut ports = RangeList::new();
        ports.add(80, 80); // one port: 80

        ScanState::new(
            targets,
            ports,
            [0; 6],
            Ipv4Addr::new(10, 0, 0, 1),
            [0; 6],
            Ipv4Addr::new(10, 0, 0, 254),
            42,
            100,
            5,
            count,
            false,
            true,
        )
    }

    #[test]
    fn pkt_count_is_targets_times_ports_times_count() {
        let state = sample_state(3);
        assert_eq!(state.pkt_count.load(Ordering::Relaxed), 2 * 1 * 3);
    }

    #[test]
    fn decode_cursor_collapses_duplicates_under_count() {
        let state = sample_state(2);
        // With count=2: slots 0,1 -> target 1; slots 2,3 -> target 2.
        assert_eq!(state.decode_cursor(0).unwrap().0, Ipv4Addr::new(0, 0, 0, 1));
        assert_eq!(state.decode_cursor(1).unwrap().0, Ipv4Addr::new(0, 0, 0, 1));
        assert_eq!(state.decode_cursor(2).unwrap().0, Ipv4Addr::new(0, 0, 0, 2));
        assert_eq!(state.decode_cursor(3).unwrap().0, Ipv4Addr::new(0, 0, 0, 2));
    }

    #[test]
    fn flags_default_to_running() {
        let state = sample_state(1);
        assert!(!state.is_done());
        assert!(!state.is_stopped());
    }
}
