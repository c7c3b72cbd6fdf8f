//! Linux `AF_PACKET` raw-socket driver.
//!
//! A full ring-buffer implementation (`PACKET_TX_RING`/`PACKET_RX_RING`,
//! `TPACKET_V2`, mmap'd frames) is what the upstream driver this is modeled
//! on uses; this backend approximates it with a single raw socket plus a
//! short `poll()` timeout, which is a documented simplification (see
//! DESIGN.md) rather than a silently dropped feature — the `Driver` contract
//! the core depends on is identical either way.

use std::mem::MaybeUninit;
use std::os::unix::io::AsRawFd;

use socket2::{Domain, Protocol, Socket, Type};

use super::Driver;
use crate::config::CAPTURE_POLL_INTERVAL_MS;
use crate::error::ScanError;

const ETH_P_ALL: u16 = 0x0003;
const FRAME_LEN: usize = 2048;

pub struct AfPacketDriver {
    socket: Socket,
    tx_buf: Vec<u8>,
    rx_buf: Vec<u8>,
    rx_len: usize,
}

impl AfPacketDriver {
    pub fn open(ifname: &str) -> Result<Self, ScanError> {
        let socket = Socket::new(
            Domain::PACKET,
            Type::RAW,
            Some(Protocol::from(ETH_P_ALL.to_be() as i32)),
        )
        .map_err(|e| ScanError::Driver(format!("socket(AF_PACKET): {e}")))?;

        let ifindex = ifname_to_index(ifname)?;
        bind_to_index(&socket, ifindex)?;

        socket
            .set_nonblocking(true)
            .map_err(|e| ScanError::Driver(format!("set_nonblocking: {e}")))?;

        Ok(AfPacketDriver {
            socket,
            tx_buf: vec![0u8; FRAME_LEN],
            rx_buf: vec![0u8; FRAME_LEN],
            rx_len: 0,
        })
    }
}

impl Driver for AfPacketDriver {
    fn get_buf(&mut self, len: usize) -> Result<&mut [u8], ScanError> {
        if len > self.tx_buf.len() {
            return Err(ScanError::Driver(format!(
                "requested tx buffer of {len} bytes exceeds frame size {FRAME_LEN}"
            )));
        }
        Ok(&mut self.tx_buf[..len])
    }

    fn inject(&mut self, len: usize) -> Result<(), ScanError> {
        let buf: &[MaybeUninit<u8>] = unsafe {
            std::slice::from_raw_parts(self.tx_buf[..len].as_ptr().cast(), len)
        };
        loop {
            match self.socket.send(buf) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    poll_fd(self.socket.as_raw_fd(), CAPTURE_POLL_INTERVAL_MS as i32);
                }
                Err(e) => return Err(ScanError::Driver(format!("send(): {e}"))),
            }
        }
    }

    fn capture(&mut self) -> Option<&[u8]> {
        poll_fd(self.socket.as_raw_fd(), CAPTURE_POLL_INTERVAL_MS as i32);

        let buf: &mut [MaybeUninit<u8>] = unsafe {
            std::slice::from_raw_parts_mut(self.rx_buf.as_mut_ptr().cast(), self.rx_buf.len())
        };
        match self.socket.recv(buf) {
            Ok(n) => {
                self.rx_len = n;
                Some(&self.rx_buf[..n])
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                tracing::debug!("capture(): {e}");
                None
            }
        }
    }

    fn release(&mut self) {
        self.rx_len = 0;
    }

    fn name(&self) -> &'static str {
        "sock"
    }
}

fn ifname_to_index(ifname: &str) -> Result<u32, ScanError> {
    let cname = std::ffi::CString::new(ifname)
        .map_err(|_| ScanError::Driver("interface name contains a NUL byte".into()))?;
    let idx = unsafe { libc::if_nametoindex(cname.as_ptr()) };
    if idx == 0 {
        return Err(ScanError::Driver(format!("unknown interface '{ifname}'")));
    }
    Ok(idx)
}

fn bind_to_index(socket: &Socket, ifindex: u32) -> Result<(), ScanError> {
    let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
    addr.sll_family = libc::AF_PACKET as u16;
    addr.sll_protocol = ETH_P_ALL.to_be();
    addr.sll_ifindex = ifindex as i32;

    let rc = unsafe {
        libc::bind(
            socket.as_raw_fd(),
            &addr as *const _ as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_ll>() as u32,
        )
    };
    if rc < 0 {
        return Err(ScanError::Driver(format!(
            "bind(AF_PACKET): {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

fn poll_fd(fd: i32, timeout_ms: i32) {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc >= 0 {
            return;
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return;
        }
    }
}
