//! The fused generator/sender worker and the dedicated receiver worker.
//!
//! Each loads its own thread-local `ScriptState` (an interpreter is not
//! designed to be re-entrant across threads) and signals readiness on a
//! shared `Barrier` before touching the driver or the queue, mirroring the
//! source's `START_THREAD` handshake (`pthread_mutex`/`pthread_cond` per
//! worker) with an idiomatic `std::sync::Barrier`.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::core::bucket::TokenBucket;
use crate::core::queue::PacketQueue;
use crate::core::state::ScanState;
use crate::net::Driver;
use crate::pkt::{self, PacketStack};
use crate::script::ScriptState;
use crate::shuffle::Shuffle;

pub struct Workers {
    pub generator: JoinHandle<()>,
    pub receiver: JoinHandle<()>,
}

/// Spawns both workers. Callers must call `barrier.wait()` once they are
/// ready to start the status printer, after this returns.
#[allow(clippy::too_many_arguments)]
pub fn spawn(
    state: Arc<ScanState>,
    queue: Arc<PacketQueue>,
    driver: Arc<Mutex<Box<dyn Driver + Send>>>,
    script_path: PathBuf,
    start: Instant,
    barrier: Arc<Barrier>,
) -> Workers {
    let generator = {
        let state = Arc::clone(&state);
        let queue = Arc::clone(&queue);
        let driver = Arc::clone(&driver);
        let script_path = script_path.clone();
        let barrier = Arc::clone(&barrier);
        std::thread::Builder::new()
            .name("generator".into())
            .spawn(move || generator_loop(state, queue, driver, &script_path, start, barrier))
            .expect("failed to spawn generator worker")
    };

    let receiver = {
        let state = Arc::clone(&state);
        let queue = Arc::clone(&queue);
        let driver = Arc::clone(&driver);
        let barrier = Arc::clone(&barrier);
        std::thread::Builder::new()
            .name("receiver".into())
            .spawn(move || receiver_loop(state, queue, driver, &script_path, start, barrier))
            .expect("failed to spawn receiver worker")
    };

    Workers { generator, receiver }
}

fn generator_loop(
    state: Arc<ScanState>,
    queue: Arc<PacketQueue>,
    driver: Arc<Mutex<Box<dyn Driver + Send>>>,
    script_path: &Path,
    start: Instant,
    barrier: Arc<Barrier>,
) {
    let script = match ScriptState::load(script_path, Arc::clone(&state), Arc::clone(&queue), start) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("generator: script load failed: {e}");
            state.stop.store(true, Ordering::Relaxed);
            barrier.wait();
            return;
        }
    };

    let total = state.pkt_count.load(Ordering::Relaxed);
    let shuffler = state.shuffle.then(|| Shuffle::new(total.max(1), state.seed));
    let mut bucket = TokenBucket::new(state.rate);
    let mut cursor: u64 = 0;

    tracing::info!("generator worker ready");
    barrier.wait();

    while !state.is_done() {
        bucket.consume();

        if let Some(mut stack) = queue.pop() {
            send(&driver, &mut stack);
            state.pkt_sent.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        if cursor >= total || state.is_stopped() {
            continue;
        }

        let slot = match &shuffler {
            Some(s) => s.shuffle(cursor),
            None => cursor,
        };
        cursor += 1;

        let Some((daddr, dport)) = state.decode_cursor(slot) else {
            continue;
        };

        match script.call_loop(daddr, dport) {
            Ok(mut stack) => {
                send(&driver, &mut stack);
                state.pkt_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("generator: script.loop failed: {e}");
                state.stop.store(true, Ordering::Relaxed);
                break;
            }
        }
        state.pkt_probe.fetch_add(1, Ordering::Relaxed);
    }

    tracing::info!("generator worker exiting");
}

fn receiver_loop(
    state: Arc<ScanState>,
    queue: Arc<PacketQueue>,
    driver: Arc<Mutex<Box<dyn Driver + Send>>>,
    script_path: &Path,
    start: Instant,
    barrier: Arc<Barrier>,
) {
    let script = match ScriptState::load(script_path, Arc::clone(&state), queue, start) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("receiver: script load failed: {e}");
            state.stop.store(true, Ordering::Relaxed);
            barrier.wait();
            return;
        }
    };

    tracing::info!("receiver worker ready");
    barrier.wait();

    while !state.is_done() {
        let frame = {
            let mut driver = driver.lock().unwrap();
            driver.capture().map(<[u8]>::to_vec)
        };
        let Some(frame) = frame else {
            continue;
        };

        let stack = pkt::unpack(&frame);
        driver.lock().unwrap().release();

        if stack.is_empty() {
            continue;
        }

        match script.call_recv(&stack) {
            Ok(true) => {
                state.pkt_recv.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("receiver: script.recv failed: {e}");
                state.stop.store(true, Ordering::Relaxed);
                break;
            }
        }
    }

    tracing::info!("receiver worker exiting");
}

fn send(driver: &Mutex<Box<dyn Driver + Send>>, stack: &mut PacketStack) {
    let mut buf = [0u8; 2048];
    let len = match pkt::pack(stack, &mut buf) {
        Ok(len) => len,
        Err(e) => {
            tracing::debug!("send: pack failed: {e}");
            return;
        }
    };

    let mut driver = driver.lock().unwrap();
    let tx = match driver.get_buf(len) {
        Ok(tx) => tx,
        Err(e) => {
            tracing::debug!("send: get_buf failed: {e}");
            return;
        }
    };
    tx.copy_from_slice(&buf[..len]);

    if let Err(e) = driver.inject(len) {
        tracing::debug!("send: inject failed: {e}");
    }
}
