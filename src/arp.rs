//! Gateway MAC resolution via ARP, run once at startup before any probe is
//! sent. Broadcasts a request, captures for a short window, retries on
//! timeout, gives up after `config::ARP_MAX_RETRIES`.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::config::{ARP_MAX_RETRIES, ARP_RETRY_TIMEOUT_SECS};
use crate::error::ScanError;
use crate::net::Driver;
use crate::pkt::arp::{ArpHeader, ARPHRD_ETHER};
use crate::pkt::eth::EthHeader;
use crate::pkt::{self, Header};

const BROADCAST_MAC: [u8; 6] = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
const ARPOP_REQUEST: u16 = 1;

/// Resolves `gateway_ip`'s MAC address by broadcasting an ARP request from
/// `(local_mac, local_ip)`. Retries up to `ARP_MAX_RETRIES` times, 1 second
/// capture window each.
pub fn resolve_gateway_mac(
    driver: &mut dyn Driver,
    local_mac: [u8; 6],
    local_ip: Ipv4Addr,
    gateway_ip: Ipv4Addr,
) -> Result<[u8; 6], ScanError> {
    let request = build_request(local_mac, local_ip, gateway_ip);

    let mut stack = request;
    let mut buf = vec![0u8; 64];
    let wire_len = pkt::pack(&mut stack, &mut buf)?;

    for attempt in 1..=ARP_MAX_RETRIES {
        tracing::debug!(attempt, "sending ARP request for {gateway_ip}");

        let tx = driver.get_buf(wire_len)?;
        tx.copy_from_slice(&buf[..wire_len]);
        driver.inject(wire_len)?;

        let deadline = Instant::now() + Duration::from_secs(ARP_RETRY_TIMEOUT_SECS);

        while Instant::now() < deadline {
            let Some(frame) = driver.capture() else {
                continue;
            };

            let reply = pkt::unpack(frame);
            driver.release();

            if let Some(mac) = matching_reply(&reply, local_ip, gateway_ip) {
                return Ok(mac);
            }
        }

        tracing::warn!(attempt, "no ARP reply from {gateway_ip} within {ARP_RETRY_TIMEOUT_SECS}s");
    }

    tracing::error!("gateway {gateway_ip} did not respond to ARP after {ARP_MAX_RETRIES} attempts");
    Err(ScanError::Arp(format!(
        "no ARP reply from {gateway_ip} after {ARP_MAX_RETRIES} attempts"
    )))
}

fn build_request(local_mac: [u8; 6], local_ip: Ipv4Addr, gateway_ip: Ipv4Addr) -> pkt::PacketStack {
    let arp = ArpHeader::new(
        ARPHRD_ETHER,
        crate::pkt::eth::ETHERTYPE_IP,
        ARPOP_REQUEST,
        &local_mac,
        &local_ip.octets(),
        &[0u8; 6],
        &gateway_ip.octets(),
    );
    let eth = EthHeader::new(local_mac, BROADCAST_MAC, crate::pkt::eth::ETHERTYPE_ARP);

    vec![Header::Arp(arp), Header::Eth(eth)]
}

fn matching_reply(stack: &pkt::PacketStack, local_ip: Ipv4Addr, gateway_ip: Ipv4Addr) -> Option<[u8; 6]> {
    let arp = stack.iter().find_map(|h| match h {
        Header::Arp(arp) => Some(arp),
        _ => None,
    })?;

    if arp.psrc != gateway_ip.octets() || arp.pdst != local_ip.octets() {
        return None;
    }

    let mut mac = [0u8; 6];
    mac.copy_from_slice(&arp.hwsrc[..6]);
    Some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::mock::MockDriver;

    #[test]
    fn resolves_gateway_mac_from_first_reply() {
        let local_mac = [0xaa; 6];
        let local_ip = Ipv4Addr::new(192, 168, 1, 10);
        let gateway_ip = Ipv4Addr::new(192, 168, 1, 1);
        let gateway_mac = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

        let mut driver = MockDriver::new().with_responder(Box::new(move |frame| {
            let mut stack = pkt::unpack(frame);
            if stack.is_empty() {
                return None;
            }
            let Header::Arp(req) = &stack.remove(0) else { return None };
            if req.pdst != gateway_ip.octets() {
                return None;
            }

            let reply_arp = ArpHeader::new(
                ARPHRD_ETHER,
                crate::pkt::eth::ETHERTYPE_IP,
                2,
                &gateway_mac,
                &gateway_ip.octets(),
                &local_mac,
                &local_ip.octets(),
            );
            let reply_eth = EthHeader::new(gateway_mac, local_mac, crate::pkt::eth::ETHERTYPE_ARP);
            let mut reply_stack = vec![Header::Arp(reply_arp), Header::Eth(reply_eth)];
            let mut buf = vec![0u8; 64];
            let n = pkt::pack(&mut reply_stack, &mut buf).ok()?;
            Some(buf[..n].to_vec())
        }));

        let mac = resolve_gateway_mac(&mut driver, local_mac, local_ip, gateway_ip).unwrap();
        assert_eq!(mac, gateway_mac);
        assert_eq!(driver.injected_frames().len(), 1);
    }

    #[test]
    fn gives_up_after_max_retries_with_no_reply() {
        let mut driver = MockDriver::new();
        let result = resolve_gateway_mac(
            &mut driver,
            [0xaa; 6],
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 254),
        );
        assert!(result.is_err());
    }
}
