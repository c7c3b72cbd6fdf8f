//! Interface introspection: MAC and local IPv4 address of a named netdev,
//! via the same `SIOCGIFHWADDR`/`SIOCGIFADDR` ioctls the upstream resolver
//! uses on Linux.

use std::net::Ipv4Addr;
use std::os::unix::io::AsRawFd;

use socket2::{Domain, Socket, Type};

use crate::error::ScanError;

fn ifreq_with_name(ifname: &str) -> Result<libc::ifreq, ScanError> {
    if ifname.len() >= libc::IFNAMSIZ {
        return Err(ScanError::Route(format!(
            "interface name '{ifname}' too long"
        )));
    }
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    for (dst, src) in ifr.ifr_name.iter_mut().zip(ifname.as_bytes()) {
        *dst = *src as libc::c_char;
    }
    Ok(ifr)
}

fn ioctl_socket() -> Result<Socket, ScanError> {
    Socket::new(Domain::IPV4, Type::STREAM, None)
        .map_err(|e| ScanError::Route(format!("socket(AF_INET): {e}")))
}

/// Hardware (MAC) address of `ifname`.
pub fn ifname_to_mac(ifname: &str) -> Result<[u8; 6], ScanError> {
    let socket = ioctl_socket()?;
    let mut ifr = ifreq_with_name(ifname)?;

    let rc = unsafe {
        libc::ioctl(socket.as_raw_fd(), libc::SIOCGIFHWADDR, &mut ifr as *mut _)
    };
    if rc < 0 {
        return Err(ScanError::Route(format!(
            "ioctl(SIOCGIFHWADDR) on '{ifname}': {}",
            std::io::Error::last_os_error()
        )));
    }

    let mut mac = [0u8; 6];
    let sa_data = unsafe { ifr.ifr_ifru.ifru_hwaddr.sa_data };
    for (dst, src) in mac.iter_mut().zip(sa_data.iter()) {
        *dst = *src as u8;
    }
    Ok(mac)
}

/// Local IPv4 address assigned to `ifname`.
pub fn ifname_to_ip(ifname: &str) -> Result<Ipv4Addr, ScanError> {
    let socket = ioctl_socket()?;
    let mut ifr = ifreq_with_name(ifname)?;

    let rc = unsafe { libc::ioctl(socket.as_raw_fd(), libc::SIOCGIFADDR, &mut ifr as *mut _) };
    if rc < 0 {
        return Err(ScanError::Route(format!(
            "ioctl(SIOCGIFADDR) on '{ifname}': {}",
            std::io::Error::last_os_error()
        )));
    }

    let sockaddr_in: libc::sockaddr_in =
        unsafe { std::mem::transmute_copy(&ifr.ifr_ifru.ifru_addr) };
    Ok(Ipv4Addr::from(sockaddr_in.sin_addr.s_addr.to_ne_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_too_long_is_rejected_before_any_syscall() {
        let long_name = "x".repeat(libc::IFNAMSIZ);
        assert!(ifreq_with_name(&long_name).is_err());
    }

    #[test]
    fn loopback_mac_lookup_does_not_panic() {
        // "lo" always exists on Linux; its MAC is all-zero but the ioctl
        // itself must succeed.
        let result = ifname_to_mac("lo");
        assert!(result.is_ok());
    }
}
