//! Default-route / egress-interface lookup. An external collaborator per
//! spec; here implemented by reading `/proc/net/route` rather than a full
//! netlink round-trip, which is the simpler of the two techniques the
//! upstream driver supports for a single longest-prefix lookup over a
//! handful of rows.

use std::net::Ipv4Addr;

use crate::error::ScanError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub if_name: String,
    pub gateway: Ipv4Addr,
}

/// Abstracts the route-table source so tests can substitute canned data
/// instead of reading the live `/proc/net/route`.
pub trait RouteSource {
    fn rows(&self) -> Result<String, ScanError>;
}

pub struct ProcNetRoute;

impl RouteSource for ProcNetRoute {
    fn rows(&self) -> Result<String, ScanError> {
        std::fs::read_to_string("/proc/net/route")
            .map_err(|e| ScanError::Route(format!("reading /proc/net/route: {e}")))
    }
}

/// Returns the default route (destination `00000000`) with the lowest
/// metric, as Linux exposes it in `/proc/net/route`: whitespace-separated
/// columns `Iface Destination Gateway Flags RefCnt Use Metric Mask MTU
/// Window IRTT`, with `Destination`/`Gateway` as little-endian hex u32.
pub fn default_route(source: &dyn RouteSource) -> Result<Route, ScanError> {
    let text = source.rows()?;
    parse_default_route(&text)
}

fn parse_default_route(text: &str) -> Result<Route, ScanError> {
    let mut best: Option<(u32, Route)> = None;

    for line in text.lines().skip(1) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 7 {
            continue;
        }
        if cols[1] != "00000000" {
            continue;
        }

        let gateway_hex = cols[2];
        let metric: u32 = cols[6].parse().unwrap_or(u32::MAX);

        let gateway = parse_hex_le_addr(gateway_hex)?;
        let route = Route {
            if_name: cols[0].to_string(),
            gateway,
        };

        match &best {
            Some((best_metric, _)) if *best_metric <= metric => {}
            _ => best = Some((metric, route)),
        }
    }

    best.map(|(_, r)| r)
        .ok_or_else(|| ScanError::Route("no default route found".into()))
}

fn parse_hex_le_addr(hex: &str) -> Result<Ipv4Addr, ScanError> {
    let raw = u32::from_str_radix(hex, 16)
        .map_err(|e| ScanError::Route(format!("malformed route address '{hex}': {e}")))?;
    Ok(Ipv4Addr::from(raw.to_le_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);
    impl RouteSource for Canned {
        fn rows(&self) -> Result<String, ScanError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn parses_default_route_from_proc_net_route() {
        let text = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
                     eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0\n\
                     eth0\t0000A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0\n";
        let route = default_route(&Canned(text)).unwrap();
        assert_eq!(route.if_name, "eth0");
        assert_eq!(route.gateway, Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn lowest_metric_wins_when_multiple_default_routes_exist() {
        let text = "Iface\tDestination\tGateway\tFlags\tRefCnt\tUse\tMetric\tMask\tMTU\tWindow\tIRTT\n\
                     eth0\t00000000\t0101A8C0\t0003\t0\t0\t600\t00000000\t0\t0\t0\n\
                     wlan0\t00000000\t0201A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0\n";
        let route = default_route(&Canned(text)).unwrap();
        assert_eq!(route.if_name, "wlan0");
        assert_eq!(route.gateway, Ipv4Addr::new(192, 168, 1, 2));
    }

    #[test]
    fn no_default_route_is_an_error() {
        let text = "Iface\tDestination\tGateway\tFlags\tRefCnt\tUse\tMetric\tMask\tMTU\tWindow\tIRTT\n\
                     eth0\t0000A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0\n";
        assert!(default_route(&Canned(text)).is_err());
    }
}
