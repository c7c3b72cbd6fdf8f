use std::sync::{Arc, Barrier, Mutex};
use std::time::Instant;

use clap::Parser;
use probecraft::core::queue::PacketQueue;
use probecraft::core::state::ScanState;
use probecraft::core::{status, workers};
use probecraft::error::ScanError;
use probecraft::net::{af_packet::AfPacketDriver, mock::MockDriver, Driver};
use probecraft::{arp, cli, ranges, resolve, route};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "probecraft=info".into()),
        )
        .init();

    let args = cli::Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: cli::Args) -> Result<(), ScanError> {
    let targets = ranges::parse_targets(&args.targets)?;
    let ports = ranges::parse_ports(&args.ports)?;

    let route = route::default_route(&route::ProcNetRoute)?;

    let local_mac = resolve::ifname_to_mac(&route.if_name)?;
    let local_addr = args
        .local_addr
        .map(Ok)
        .unwrap_or_else(|| resolve::ifname_to_ip(&route.if_name))?;
    let gateway_addr = args.gateway_addr.unwrap_or(route.gateway);

    let mut driver: Box<dyn Driver + Send> = match args.netdev.as_deref() {
        Some("mock") => Box::new(MockDriver::new()),
        _ => Box::new(AfPacketDriver::open(&route.if_name)?),
    };

    let gateway_mac = arp::resolve_gateway_mac(driver.as_mut(), local_mac, local_addr, gateway_addr)?;

    let seed = args.seed.unwrap_or_else(cli::random_seed);

    let state = Arc::new(ScanState::new(
        targets,
        ports,
        local_mac,
        local_addr,
        gateway_mac,
        gateway_addr,
        seed,
        args.rate,
        args.wait,
        args.count,
        args.shuffle,
        args.quiet,
    ));

    install_signal_handlers(Arc::clone(&state))?;

    let queue = Arc::new(PacketQueue::new());
    let driver = Arc::new(Mutex::new(driver));
    let start = Instant::now();
    let barrier = Arc::new(Barrier::new(3));

    let handles = workers::spawn(
        Arc::clone(&state),
        queue,
        driver,
        args.script.clone(),
        start,
        Arc::clone(&barrier),
    );

    barrier.wait();
    status::run(&state, start);

    handles.generator.join().expect("generator worker panicked");
    handles.receiver.join().expect("receiver worker panicked");

    Ok(())
}

fn install_signal_handlers(state: Arc<ScanState>) -> Result<(), ScanError> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGHUP, SIGINT, SIGTERM])
        .map_err(|e| ScanError::Driver(format!("registering signal handler: {e}")))?;

    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if signals.forever().next().is_some() {
                tracing::warn!("received termination signal, stopping");
                state.stop.store(true, std::sync::atomic::Ordering::Relaxed);
            }
        })
        .expect("failed to spawn signal handler thread");

    Ok(())
}
