//! Lua script bridge. Each worker loads its own interpreter (the source
//! script is not designed to be re-entrant across threads), exposing the
//! callable surface scripts use to mint probes and classify replies.

mod headers;

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use mlua::{Lua, Variadic};

use crate::core::queue::PacketQueue;
use crate::core::state::ScanState;
use crate::error::ScanError;
use crate::pkt::{Header, PacketStack, PktType};

pub struct ScriptState {
    lua: Lua,
    has_recv: bool,
}

impl ScriptState {
    pub fn load(
        path: &std::path::Path,
        state: Arc<ScanState>,
        queue: Arc<PacketQueue>,
        start: Instant,
    ) -> Result<Self, ScanError> {
        let lua = Lua::new();
        register_globals(&lua, Arc::clone(&state), Arc::clone(&queue), start)
            .map_err(|e| ScanError::ScriptLoad(e.to_string()))?;

        let source = std::fs::read_to_string(path)
            .map_err(|e| ScanError::ScriptLoad(format!("reading {}: {e}", path.display())))?;

        lua.load(&source)
            .exec()
            .map_err(|e| ScanError::ScriptLoad(e.to_string()))?;

        let has_recv = lua.globals().get::<_, mlua::Value>("recv").ok()
            .map(|v| !matches!(v, mlua::Value::Nil))
            .unwrap_or(false);

        Ok(ScriptState { lua, has_recv })
    }

    /// Calls the script's `loop(daddr, dport)` entry point, returning the
    /// packet stack it minted (headers as returned, innermost first).
    pub fn call_loop(&self, daddr: Ipv4Addr, dport: u16) -> Result<PacketStack, ScanError> {
        let func: mlua::Function = self
            .lua
            .globals()
            .get("loop")
            .map_err(|e| ScanError::ScriptRuntime(format!("script has no 'loop' function: {e}")))?;

        let results: Variadic<mlua::Value> = func
            .call((daddr.to_string(), dport))
            .map_err(|e| ScanError::ScriptRuntime(e.to_string()))?;

        results
            .iter()
            .map(headers::lua_to_header)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ScanError::ScriptRuntime(e.to_string()))
    }

    /// Calls the script's `recv(pkts)` entry point, if defined, with the
    /// captured stack converted to header objects. Returns `false` (not a
    /// reply) when the script defines no `recv`.
    pub fn call_recv(&self, stack: &PacketStack) -> Result<bool, ScanError> {
        if !self.has_recv {
            return Ok(false);
        }

        let func: mlua::Function = self
            .lua
            .globals()
            .get("recv")
            .map_err(|e| ScanError::ScriptRuntime(e.to_string()))?;

        let table = self.lua.create_table().map_err(|e| ScanError::ScriptRuntime(e.to_string()))?;
        let mut next_index: i64 = 1;
        for header in stack.iter() {
            if matches!(header.pkt_type(), PktType::Eth | PktType::Arp) {
                continue;
            }
            let value = headers::header_to_lua(&self.lua, header)
                .map_err(|e| ScanError::ScriptRuntime(e.to_string()))?;
            table
                .set(next_index, value)
                .map_err(|e| ScanError::ScriptRuntime(e.to_string()))?;
            next_index += 1;
        }

        func.call::<_, bool>(table)
            .map_err(|e| ScanError::ScriptRuntime(e.to_string()))
    }
}

fn register_globals(
    lua: &Lua,
    state: Arc<ScanState>,
    queue: Arc<PacketQueue>,
    start: Instant,
) -> mlua::Result<()> {
    let globals = lua.globals();

    globals.set(
        "IP",
        lua.create_function(|_, ()| Ok(headers::Ip4Lua(crate::pkt::ip4::Ip4Header::default())))?,
    )?;
    globals.set(
        "ICMP",
        lua.create_function(|_, ()| Ok(headers::IcmpLua(crate::pkt::icmp::IcmpHeader::default())))?,
    )?;
    globals.set(
        "UDP",
        lua.create_function(|_, ()| Ok(headers::UdpLua(crate::pkt::udp::UdpHeader::default())))?,
    )?;
    globals.set(
        "TCP",
        lua.create_function(|_, ()| Ok(headers::TcpLua(crate::pkt::tcp::TcpHeader::default())))?,
    )?;
    globals.set(
        "Raw",
        lua.create_function(|_, ()| Ok(headers::RawLua(crate::pkt::raw::RawHeader::default())))?,
    )?;

    let seed = state.seed;
    globals.set(
        "cookie16",
        lua.create_function(move |_, (saddr, daddr, sport, dport): (String, String, u16, u16)| {
            let saddr = Ipv4Addr::from_str(&saddr).map_err(lua_err)?;
            let daddr = Ipv4Addr::from_str(&daddr).map_err(lua_err)?;
            Ok(crate::pkt::cookie::cookie16(saddr, daddr, sport, dport, seed))
        })?,
    )?;
    globals.set(
        "cookie32",
        lua.create_function(move |_, (saddr, daddr, sport, dport): (String, String, u16, u16)| {
            let saddr = Ipv4Addr::from_str(&saddr).map_err(lua_err)?;
            let daddr = Ipv4Addr::from_str(&daddr).map_err(lua_err)?;
            Ok(crate::pkt::cookie::cookie32(saddr, daddr, sport, dport, seed))
        })?,
    )?;

    globals.set(
        "get_time",
        lua.create_function(move |_, ()| Ok(start.elapsed().as_secs_f64()))?,
    )?;

    let local_addr = state.local_addr;
    globals.set(
        "get_addr",
        lua.create_function(move |_, ()| Ok(local_addr.to_string()))?,
    )?;

    globals.set(
        "print",
        lua.create_function(|_, args: Variadic<mlua::Value>| {
            let parts: Vec<String> = args.iter().map(lua_value_to_string).collect();
            println!("{}", parts.join("\t"));
            Ok(())
        })?,
    )?;

    let local_mac = state.local_mac;
    let gateway_mac = state.gateway_mac;
    globals.set(
        "send",
        lua.create_function(move |_, args: Variadic<mlua::Value>| {
            let mut stack: PacketStack = args
                .iter()
                .map(headers::lua_to_header)
                .collect::<Result<_, _>>()?;

            stack.push(Header::Eth(crate::pkt::eth::EthHeader::new(
                local_mac,
                gateway_mac,
                0,
            )));

            queue.push(stack);
            Ok(())
        })?,
    )?;

    Ok(())
}

fn lua_err(e: std::net::AddrParseError) -> mlua::Error {
    mlua::Error::RuntimeError(e.to_string())
}

fn lua_value_to_string(value: &mlua::Value) -> String {
    match value {
        mlua::Value::Nil => "nil".to_string(),
        mlua::Value::Boolean(b) => b.to_string(),
        mlua::Value::Integer(i) => i.to_string(),
        mlua::Value::Number(n) => n.to_string(),
        mlua::Value::String(s) => s.to_string_lossy().into_owned(),
        _ => "<value>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::RangeList;
    use std::time::Instant;

    fn state() -> Arc<ScanState> {
        let mut targets = RangeList::new();
        targets.add(0x0A000001, 0x0A000001);
        let mut ports = RangeList::new();
        ports.add(80, 80);
        Arc::new(ScanState::new(
            targets,
            ports,
            [0xaa; 6],
            Ipv4Addr::new(10, 0, 0, 1),
            [0xbb; 6],
            Ipv4Addr::new(10, 0, 0, 254),
            0xDEAD_BEEF,
            100,
            5,
            1,
            false,
            true,
        ))
    }

    fn write_script(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("probe.lua");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loop_builds_tcp_over_ip_stack() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            &dir,
            r#"
            function loop(daddr, dport)
                local ip = IP()
                ip.dst = daddr
                ip.src = get_addr()

                local tcp = TCP()
                tcp.dport = dport
                tcp.syn = true
                tcp.sport = cookie16(ip.src, ip.dst, 0, dport)

                return tcp, ip
            end
            "#,
        );

        let queue = Arc::new(PacketQueue::new());
        let s = ScriptState::load(&script, state(), queue, Instant::now()).unwrap();

        let stack = s.call_loop(Ipv4Addr::new(10, 0, 0, 1), 80).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0].pkt_type(), PktType::Tcp);
        assert_eq!(stack[1].pkt_type(), PktType::Ip4);

        match &stack[1] {
            Header::Ip4(h) => assert_eq!(h.dst, Ipv4Addr::new(10, 0, 0, 1)),
            _ => panic!("expected ip4"),
        }
    }

    #[test]
    fn recv_without_definition_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(&dir, "function loop(daddr, dport) return Raw() end");
        let queue = Arc::new(PacketQueue::new());
        let s = ScriptState::load(&script, state(), queue, Instant::now()).unwrap();

        let empty_stack: PacketStack = vec![];
        assert_eq!(s.call_recv(&empty_stack).unwrap(), false);
    }

    #[test]
    fn recv_sees_cookie_matching_reply() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            &dir,
            r#"
            function loop(daddr, dport) return Raw() end
            function recv(pkts)
                for i, p in ipairs(pkts) do
                    if p.syn ~= nil and p.dport == 80 then
                        return true
                    end
                end
                return false
            end
            "#,
        );
        let queue = Arc::new(PacketQueue::new());
        let s = ScriptState::load(&script, state(), queue, Instant::now()).unwrap();

        let mut tcp = crate::pkt::tcp::TcpHeader::default();
        tcp.dport = 80;
        tcp.syn = true;
        let stack = vec![Header::Tcp(tcp)];

        assert!(s.call_recv(&stack).unwrap());
    }
}
