//! Command-line surface, via `clap`'s derive API. The flag table mirrors the
//! original's `getopt_long` table one-for-one; targets are a required
//! positional argument rather than a flag, matching `argv[1]` in the source.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_WAIT_SECS;

#[derive(Debug, Parser)]
#[command(name = "probecraft", about = "Asynchronous, scriptable raw-packet probe engine")]
pub struct Args {
    /// Target spec: comma-separated dotted-quad[/prefix] entries or hostnames.
    pub targets: String,

    /// Script file (required).
    #[arg(short = 'S', long)]
    pub script: PathBuf,

    /// Port spec.
    #[arg(short, long, default_value = "1")]
    pub ports: String,

    /// Packets per second, 0 = unlimited.
    #[arg(short, long, default_value_t = 100)]
    pub rate: u64,

    /// 64-bit seed; default is 8 bytes of OS entropy.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Seconds to wait for late replies after all probes are sent.
    #[arg(short, long, default_value_t = DEFAULT_WAIT_SECS)]
    pub wait: u64,

    /// Probes per (target, port).
    #[arg(short, long, default_value_t = 1)]
    pub count: u64,

    /// Override the local IP (default: resolved from the default route's interface).
    #[arg(short = 'l', long = "local-addr")]
    pub local_addr: Option<Ipv4Addr>,

    /// Override the gateway IP (default: the default route's gateway).
    #[arg(short = 'g', long = "gateway-addr")]
    pub gateway_addr: Option<Ipv4Addr>,

    /// Driver name selector.
    #[arg(short = 'n', long)]
    pub netdev: Option<String>,

    /// Enable permutation of probe order.
    #[arg(short = 'R', long)]
    pub shuffle: bool,

    /// Suppress the status line.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Returns a 64-bit seed from `/dev/urandom`, mirroring `get_entropy()`.
pub fn random_seed() -> u64 {
    rand::random()
}
