//! Library surface for the probe engine: packet model, range enumeration,
//! bijective shuffle, concurrency core, script bridge, and the external
//! collaborators (driver, route lookup, ARP discovery) the binary wires
//! together in `main`.

pub mod arp;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod net;
pub mod pkt;
pub mod ranges;
pub mod resolve;
pub mod route;
pub mod script;
pub mod shuffle;
