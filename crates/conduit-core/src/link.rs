//! VLESS share-link parsing.
//!
//! Share links have the shape
//! `vless://userID@host:port?sni=..&pbk=..&sid=..&flow=..#label`.
//! The parser decomposes the URI manually: fragment first, then
//! userinfo, host:port, and query parameters.

use crate::error::{CoreError, Result};

/// Scheme prefix for supported share links.
pub const VLESS_SCHEME: &str = "vless://";

/// A parsed VLESS share link.
///
/// Immutable once parsed; `pbk` and `sid` are guaranteed non-empty.
/// No further validation is performed (UUID shape, host resolvability,
/// reachability are the caller's concern).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// Server hostname or IP.
    pub host: String,
    /// Server port (defaults to 443 when the link omits it).
    pub port: u16,
    /// User UUID from the userinfo component.
    pub user_id: String,
    /// Flow control mode (`flow` query parameter), if present.
    pub flow: Option<String>,
    /// TLS SNI (`sni` query parameter).
    pub server_name: String,
    /// REALITY public key (`pbk` query parameter).
    pub public_key: String,
    /// REALITY short ID (`sid` query parameter).
    pub short_id: String,
    /// Display label from the `#fragment`, if present.
    pub label: Option<String>,
}

impl ShareLink {
    /// Parses a raw share-link string.
    ///
    /// Absent port defaults to 443. Empty or absent `pbk`/`sid` is a
    /// [`CoreError::MissingField`] error: a config built without them
    /// would be unusable, so we refuse to produce one. Malformed or
    /// zero ports are rejected rather than defaulted.
    pub fn parse(raw: &str) -> Result<Self> {
        let rest = raw
            .trim()
            .strip_prefix(VLESS_SCHEME)
            .ok_or(CoreError::UnsupportedScheme)?;

        // Split off the display label first; '#' may not appear
        // percent-encoded elsewhere in a well-formed link.
        let (main_part, label) = match rest.rfind('#') {
            Some(idx) => {
                let label = urlencoding::decode(&rest[idx + 1..])
                    .map(|s| s.into_owned())
                    .unwrap_or_default();
                (&rest[..idx], (!label.is_empty()).then_some(label))
            }
            None => (rest, None),
        };

        let (addr_part, query) = main_part.split_once('?').unwrap_or((main_part, ""));

        let (user_id, server_port) = addr_part
            .split_once('@')
            .ok_or_else(|| CoreError::InvalidLink("missing '@' separator".to_string()))?;

        let (host, port) = match server_port.rsplit_once(':') {
            Some((host, port_str)) => {
                let port: u16 = port_str
                    .parse()
                    .map_err(|_| CoreError::InvalidPort(port_str.to_string()))?;
                if port == 0 {
                    return Err(CoreError::InvalidPort(port_str.to_string()));
                }
                (host, port)
            }
            None => (server_port, 443),
        };

        if host.is_empty() {
            return Err(CoreError::InvalidLink("empty host".to_string()));
        }

        let mut server_name = String::new();
        let mut public_key = String::new();
        let mut short_id = String::new();
        let mut flow = None;

        for param in query.split('&') {
            if let Some((key, value)) = param.split_once('=') {
                let value = urlencoding::decode(value).unwrap_or_default().to_string();
                match key {
                    "sni" => server_name = value,
                    "pbk" => public_key = value,
                    "sid" => short_id = value,
                    "flow" => flow = (!value.is_empty()).then_some(value),
                    _ => {}
                }
            }
        }

        if public_key.is_empty() {
            return Err(CoreError::MissingField("pbk"));
        }
        if short_id.is_empty() {
            return Err(CoreError::MissingField("sid"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            user_id: user_id.to_string(),
            flow,
            server_name,
            public_key,
            short_id,
            label,
        })
    }
}
