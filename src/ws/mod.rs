//! Target resolution (`ws://` / `wss://`) and the one-shot exchange.
//!
//! parse_target / from_host_port -> TargetSpec
//! session::exchange -> connect, send one frame, await one frame, close.
//!
use std::fmt;
use url::Url;

use crate::error::ClientError;

pub mod session;

pub use session::exchange;

/// Address of the project server when nothing else is configured.
pub const DEFAULT_URL: &str = "ws://localhost:5000";

/// Whether the connection is plaintext or TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Plain,
    Tls,
}

/// A validated WebSocket endpoint.
///
/// Retains the original input for diagnostics.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    original: String,
    url: Url,
}

impl TargetSpec {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> TargetKind {
        match self.url.scheme() {
            "wss" => TargetKind::Tls,
            _ => TargetKind::Plain,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.kind(), TargetKind::Tls)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

fn invalid(target: &str, reason: impl Into<String>) -> ClientError {
    ClientError::InvalidTarget {
        target: target.to_string(),
        reason: reason.into(),
    }
}

/// Parse a full endpoint URL. Only `ws` and `wss` are accepted.
///
/// Examples:
/// - "ws://localhost:5000"       -> plain
/// - "wss://projects.example/ws" -> TLS
/// - "http://localhost:5000"     -> rejected
pub fn parse_target(raw: &str) -> Result<TargetSpec, ClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(raw, "target string is empty"));
    }

    let url = Url::parse(trimmed).map_err(|e| invalid(raw, e.to_string()))?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(invalid(raw, format!("unsupported scheme '{other}' (use ws or wss)"))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(raw, "missing host"));
    }

    Ok(TargetSpec {
        original: raw.to_string(),
        url,
    })
}

/// Build an endpoint from its parts. Bare IPv6 hosts are bracketed.
pub fn from_host_port(
    host: &str,
    port: u16,
    tls: bool,
    path: Option<&str>,
) -> Result<TargetSpec, ClientError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(invalid(host, "host is empty"));
    }
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };
    let scheme = if tls { "wss" } else { "ws" };
    let path = path.map(str::trim).unwrap_or("");
    let sep = if path.is_empty() || path.starts_with('/') { "" } else { "/" };

    parse_target(&format!("{scheme}://{host}:{port}{sep}{path}"))
}
