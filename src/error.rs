//! Unified error type for the probe engine.
//!
//! `ScanError` is the single error type that crosses every public boundary:
//! CLI validation, startup (route/ARP/script load), and the per-packet pack
//! and unpack paths. Each variant maps to one failure domain so callers can
//! match on `kind()` without string comparison.

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A target, port, or address argument failed to parse.
    #[error("parse error: {0}")]
    Parse(String),

    /// Default route or egress interface lookup failed.
    #[error("route error: {0}")]
    Route(String),

    /// Gateway MAC resolution via ARP failed.
    #[error("arp error: {0}")]
    Arp(String),

    /// The raw-frame driver failed to open, send, or receive.
    #[error("driver error: {0}")]
    Driver(String),

    /// The Lua script failed to load or compile.
    #[error("script load error: {0}")]
    ScriptLoad(String),

    /// The Lua script raised an error while running.
    #[error("script runtime error: {0}")]
    ScriptRuntime(String),

    /// A header stack could not be packed into bytes.
    #[error("pack error: {0}")]
    Pack(String),

    /// Raw bytes could not be unpacked into a header stack.
    #[error("unpack error: {0}")]
    Unpack(String),
}

impl ScanError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Parse(_) => "Parse",
            ScanError::Route(_) => "Route",
            ScanError::Arp(_) => "Arp",
            ScanError::Driver(_) => "Driver",
            ScanError::ScriptLoad(_) => "ScriptLoad",
            ScanError::ScriptRuntime(_) => "ScriptRuntime",
            ScanError::Pack(_) => "Pack",
            ScanError::Unpack(_) => "Unpack",
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Driver(err.to_string())
    }
}

impl From<mlua::Error> for ScanError {
    fn from(err: mlua::Error) -> Self {
        ScanError::ScriptRuntime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_returns_correct_variant_name() {
        assert_eq!(ScanError::Parse("bad cidr".into()).kind(), "Parse");
        assert_eq!(ScanError::Route("no default route".into()).kind(), "Route");
        assert_eq!(ScanError::Arp("no reply".into()).kind(), "Arp");
        assert_eq!(ScanError::Driver("open failed".into()).kind(), "Driver");
        assert_eq!(ScanError::ScriptLoad("syntax".into()).kind(), "ScriptLoad");
        assert_eq!(
            ScanError::ScriptRuntime("nil index".into()).kind(),
            "ScriptRuntime"
        );
        assert_eq!(ScanError::Pack("too short".into()).kind(), "Pack");
        assert_eq!(ScanError::Unpack("truncated".into()).kind(), "Unpack");
    }

    #[test]
    fn display_shows_message() {
        let err = ScanError::Route("no interface".into());
        assert_eq!(err.to_string(), "route error: no interface");
    }

    #[test]
    fn from_io_error_produces_driver_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ScanError = io_err.into();
        assert_eq!(err.kind(), "Driver");
        assert!(err.to_string().contains("denied"));
    }
}
