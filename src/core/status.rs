//! The status line: owns the termination sequence described in the
//! concurrency core (exit on full progress or `stop`, then count down
//! `wait` seconds, then set `done`). Line rendering itself is decorative;
//! the sequencing it performs is core behavior.

use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::config::STATUS_REFRESH_INTERVAL_MS;
use crate::core::state::ScanState;

/// Drives the scan to completion: prints progress (unless `quiet`) until all
/// probes are sent or a signal sets `stop`, waits `state.wait` seconds for
/// late replies, then sets `done` so both workers exit.
pub fn run(state: &ScanState, start: Instant) {
    let refresh = Duration::from_millis(STATUS_REFRESH_INTERVAL_MS);
    let mut last_tick = start;
    let mut last_sent = 0u64;

    loop {
        let now = Instant::now();
        let sent = state.pkt_sent.load(Ordering::Relaxed);
        let probe = state.pkt_probe.load(Ordering::Relaxed);
        let total = state.pkt_count.load(Ordering::Relaxed).max(1);

        if !state.quiet {
            let elapsed = now.duration_since(last_tick).as_secs_f64().max(0.001);
            let rate = (sent - last_sent) as f64 / elapsed;
            print_line(probe, total, sent, state.pkt_recv.load(Ordering::Relaxed), rate);
        }
        last_tick = now;
        last_sent = sent;

        if probe >= total || state.is_stopped() {
            break;
        }
        std::thread::sleep(refresh);
    }

    state.stop.store(true, Ordering::Relaxed);

    let mut remaining = state.wait;
    while remaining > 0 {
        if !state.quiet {
            eprint!("\rwaiting {remaining}s for late replies...          ");
            let _ = std::io::stderr().flush();
        }
        std::thread::sleep(Duration::from_secs(1));
        remaining -= 1;
    }

    if !state.quiet {
        eprintln!("\r                                                  \r");
    }
    state.done.store(true, Ordering::Relaxed);
}

fn print_line(probe: u64, total: u64, sent: u64, recv: u64, rate: f64) {
    let percent = probe as f64 * 100.0 / total as f64;
    eprint!(
        "\rProgress: {percent:6.2}%  Rate: {:6.2}kpps  Sent: {sent}  Replies: {recv}   ",
        rate / 1000.0
    );
    let _ = std::io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::RangeList;
    use std::net::Ipv4Addr;

    fn state(wait: u64, quiet: bool) -> ScanState {
        let mut targets = RangeList::new();
        targets.add(1, 1);
        let mut ports = RangeList::new();
        ports.add(80, 80);
        ScanState::new(
            targets,
            ports,
            [0; 6],
            Ipv4Addr::new(10, 0, 0, 1),
            [0; 6],
            Ipv4Addr::new(10, 0, 0, 254),
            1,
            0,
            wait,
            1,
            false,
            quiet,
        )
    }

    #[test]
    fn exits_immediately_when_probe_already_matches_total() {
        let state = state(0, true);
        state.pkt_probe.store(1, Ordering::Relaxed);
        run(&state, Instant::now());
        assert!(state.is_done());
    }

    #[test]
    fn sets_stop_before_the_wait_countdown() {
        let state = state(0, true);
        state.stop.store(true, Ordering::Relaxed);
        run(&state, Instant::now());
        assert!(state.is_stopped());
        assert!(state.is_done());
    }
}
