//! `mlua::UserData` wrappers exposing each header type's named fields to
//! scripts, per the per-header field lists. Addresses are dotted-quad
//! strings on the Lua side; everything else is a plain integer or bool.

use std::net::Ipv4Addr;
use std::str::FromStr;

use mlua::{UserData, UserDataFields};

use crate::pkt::icmp::IcmpHeader;
use crate::pkt::ip4::Ip4Header;
use crate::pkt::raw::RawHeader;
use crate::pkt::tcp::TcpHeader;
use crate::pkt::udp::UdpHeader;
use crate::pkt::Header;

fn parse_addr(s: &str) -> mlua::Result<Ipv4Addr> {
    Ipv4Addr::from_str(s).map_err(|e| mlua::Error::RuntimeError(format!("bad address '{s}': {e}")))
}

#[derive(Clone)]
pub struct Ip4Lua(pub Ip4Header);

impl UserData for Ip4Lua {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("version", |_, h| Ok(h.0.version));
        fields.add_field_method_set("version", |_, h, v| Ok(h.0.version = v));
        fields.add_field_method_get("ihl", |_, h| Ok(h.0.ihl));
        fields.add_field_method_set("ihl", |_, h, v| Ok(h.0.ihl = v));
        fields.add_field_method_get("tos", |_, h| Ok(h.0.tos));
        fields.add_field_method_set("tos", |_, h, v| Ok(h.0.tos = v));
        fields.add_field_method_get("len", |_, h| Ok(h.0.len));
        fields.add_field_method_set("len", |_, h, v| Ok(h.0.len = v));
        fields.add_field_method_get("id", |_, h| Ok(h.0.id));
        fields.add_field_method_set("id", |_, h, v| Ok(h.0.id = v));
        fields.add_field_method_get("frag", |_, h| Ok(h.0.frag_off));
        fields.add_field_method_set("frag", |_, h, v| Ok(h.0.frag_off = v));
        fields.add_field_method_get("ttl", |_, h| Ok(h.0.ttl));
        fields.add_field_method_set("ttl", |_, h, v| Ok(h.0.ttl = v));
        fields.add_field_method_get("proto", |_, h| Ok(h.0.proto));
        fields.add_field_method_set("proto", |_, h, v| Ok(h.0.proto = v));
        fields.add_field_method_get("chksum", |_, h| Ok(h.0.chksum));
        fields.add_field_method_set("chksum", |_, h, v| Ok(h.0.chksum = v));
        fields.add_field_method_get("src", |_, h| Ok(h.0.src.to_string()));
        fields.add_field_method_set("src", |_, h, v: String| {
            h.0.src = parse_addr(&v)?;
            Ok(())
        });
        fields.add_field_method_get("dst", |_, h| Ok(h.0.dst.to_string()));
        fields.add_field_method_set("dst", |_, h, v: String| {
            h.0.dst = parse_addr(&v)?;
            Ok(())
        });
    }
}

#[derive(Clone)]
pub struct IcmpLua(pub IcmpHeader);

impl UserData for IcmpLua {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("type", |_, h| Ok(h.0.icmp_type));
        fields.add_field_method_set("type", |_, h, v| Ok(h.0.icmp_type = v));
        fields.add_field_method_get("code", |_, h| Ok(h.0.code));
        fields.add_field_method_set("code", |_, h, v| Ok(h.0.code = v));
        fields.add_field_method_get("chksum", |_, h| Ok(h.0.chksum));
        fields.add_field_method_set("chksum", |_, h, v| Ok(h.0.chksum = v));
        fields.add_field_method_get("id", |_, h| Ok(h.0.id));
        fields.add_field_method_set("id", |_, h, v| Ok(h.0.id = v));
        fields.add_field_method_get("seq", |_, h| Ok(h.0.seq));
        fields.add_field_method_set("seq", |_, h, v| Ok(h.0.seq = v));
    }
}

#[derive(Clone)]
pub struct UdpLua(pub UdpHeader);

impl UserData for UdpLua {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("sport", |_, h| Ok(h.0.sport));
        fields.add_field_method_set("sport", |_, h, v| Ok(h.0.sport = v));
        fields.add_field_method_get("dport", |_, h| Ok(h.0.dport));
        fields.add_field_method_set("dport", |_, h, v| Ok(h.0.dport = v));
        fields.add_field_method_get("len", |_, h| Ok(h.0.len));
        fields.add_field_method_set("len", |_, h, v| Ok(h.0.len = v));
        fields.add_field_method_get("chksum", |_, h| Ok(h.0.chksum));
        fields.add_field_method_set("chksum", |_, h, v| Ok(h.0.chksum = v));
    }
}

#[derive(Clone)]
pub struct TcpLua(pub TcpHeader);

impl UserData for TcpLua {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("sport", |_, h| Ok(h.0.sport));
        fields.add_field_method_set("sport", |_, h, v| Ok(h.0.sport = v));
        fields.add_field_method_get("dport", |_, h| Ok(h.0.dport));
        fields.add_field_method_set("dport", |_, h, v| Ok(h.0.dport = v));
        fields.add_field_method_get("seq", |_, h| Ok(h.0.seq));
        fields.add_field_method_set("seq", |_, h, v| Ok(h.0.seq = v));
        fields.add_field_method_get("ack_seq", |_, h| Ok(h.0.ack_seq));
        fields.add_field_method_set("ack_seq", |_, h, v| Ok(h.0.ack_seq = v));
        fields.add_field_method_get("doff", |_, h| Ok(h.0.doff));
        fields.add_field_method_set("doff", |_, h, v| Ok(h.0.doff = v));
        fields.add_field_method_get("fin", |_, h| Ok(h.0.fin));
        fields.add_field_method_set("fin", |_, h, v| Ok(h.0.fin = v));
        fields.add_field_method_get("syn", |_, h| Ok(h.0.syn));
        fields.add_field_method_set("syn", |_, h, v| Ok(h.0.syn = v));
        fields.add_field_method_get("rst", |_, h| Ok(h.0.rst));
        fields.add_field_method_set("rst", |_, h, v| Ok(h.0.rst = v));
        fields.add_field_method_get("psh", |_, h| Ok(h.0.psh));
        fields.add_field_method_set("psh", |_, h, v| Ok(h.0.psh = v));
        fields.add_field_method_get("ack", |_, h| Ok(h.0.ack));
        fields.add_field_method_set("ack", |_, h, v| Ok(h.0.ack = v));
        fields.add_field_method_get("urg", |_, h| Ok(h.0.urg));
        fields.add_field_method_set("urg", |_, h, v| Ok(h.0.urg = v));
        fields.add_field_method_get("ece", |_, h| Ok(h.0.ece));
        fields.add_field_method_set("ece", |_, h, v| Ok(h.0.ece = v));
        fields.add_field_method_get("cwr", |_, h| Ok(h.0.cwr));
        fields.add_field_method_set("cwr", |_, h, v| Ok(h.0.cwr = v));
        fields.add_field_method_get("ns", |_, h| Ok(h.0.ns));
        fields.add_field_method_set("ns", |_, h, v| Ok(h.0.ns = v));
        fields.add_field_method_get("window", |_, h| Ok(h.0.window));
        fields.add_field_method_set("window", |_, h, v| Ok(h.0.window = v));
        fields.add_field_method_get("chksum", |_, h| Ok(h.0.chksum));
        fields.add_field_method_set("chksum", |_, h, v| Ok(h.0.chksum = v));
        fields.add_field_method_get("urg_ptr", |_, h| Ok(h.0.urg_ptr));
        fields.add_field_method_set("urg_ptr", |_, h, v| Ok(h.0.urg_ptr = v));
    }
}

#[derive(Clone)]
pub struct RawLua(pub RawHeader);

impl UserData for RawLua {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("payload", |lua, h| lua.create_string(&h.0.payload));
        fields.add_field_method_set("payload", |_, h, v: mlua::String| {
            h.0.payload = v.as_bytes().to_vec();
            Ok(())
        });
    }
}

/// Converts an internal `Header` to its Lua-facing wrapper as an `AnyUserData`.
pub fn header_to_lua(lua: &mlua::Lua, header: &Header) -> mlua::Result<mlua::Value> {
    let value = match header {
        Header::Ip4(h) => mlua::Value::UserData(lua.create_userdata(Ip4Lua(*h))?),
        Header::Icmp(h) => mlua::Value::UserData(lua.create_userdata(IcmpLua(*h))?),
        Header::Udp(h) => mlua::Value::UserData(lua.create_userdata(UdpLua(*h))?),
        Header::Tcp(h) => mlua::Value::UserData(lua.create_userdata(TcpLua(*h))?),
        Header::Raw(h) => mlua::Value::UserData(lua.create_userdata(RawLua(h.clone()))?),
        Header::Eth(_) | Header::Arp(_) => mlua::Value::Nil,
    };
    Ok(value)
}

/// Recovers a `Header` from a Lua value previously produced by `IP()`,
/// `ICMP()`, `UDP()`, `TCP()`, or `Raw()`, after the script may have
/// mutated its fields.
pub fn lua_to_header(value: &mlua::Value) -> mlua::Result<Header> {
    let ud = value
        .as_userdata()
        .ok_or_else(|| mlua::Error::RuntimeError("expected a packet header object".into()))?;

    if let Ok(h) = ud.borrow::<Ip4Lua>() {
        return Ok(Header::Ip4(h.0));
    }
    if let Ok(h) = ud.borrow::<IcmpLua>() {
        return Ok(Header::Icmp(h.0));
    }
    if let Ok(h) = ud.borrow::<UdpLua>() {
        return Ok(Header::Udp(h.0));
    }
    if let Ok(h) = ud.borrow::<TcpLua>() {
        return Ok(Header::Tcp(h.0));
    }
    if let Ok(h) = ud.borrow::<RawLua>() {
        return Ok(Header::Raw(h.0.clone()));
    }

    Err(mlua::Error::RuntimeError(
        "unrecognized packet header object".into(),
    ))
}
