//! Engine configuration generation.
//!
//! Maps a parsed [`ShareLink`] onto the nested JSON document the proxy
//! engine expects: one local HTTP inbound without auth, one VLESS
//! outbound with a single target and user, and a REALITY transport
//! security block.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::link::ShareLink;

/// Local inbound listener port.
pub const LOCAL_HTTP_PORT: u16 = 10809;

/// Top-level engine configuration document.
///
/// Built in one shot from an already-validated link, so construction
/// cannot fail and the document is never partially populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    pub inbounds: Vec<Inbound>,
    pub outbounds: Vec<Outbound>,
}

/// Local listener entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inbound {
    pub port: u16,
    pub protocol: String,
    pub settings: InboundSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundSettings {
    pub auth: String,
}

/// Upstream entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outbound {
    pub protocol: String,
    pub settings: OutboundSettings,
    #[serde(rename = "streamSettings")]
    pub stream_settings: StreamSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundSettings {
    pub vnext: Vec<Vnext>,
}

/// A single upstream target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vnext {
    pub address: String,
    pub port: u16,
    pub users: Vec<User>,
}

/// A single user credential on an upstream target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub encryption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

/// Transport security parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamSettings {
    pub security: String,
    #[serde(rename = "realitySettings")]
    pub reality_settings: RealitySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealitySettings {
    #[serde(rename = "serverName")]
    pub server_name: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "shortId")]
    pub short_id: String,
}

impl EngineConfig {
    /// Builds the configuration document for a parsed link.
    pub fn for_link(link: &ShareLink) -> Self {
        Self {
            inbounds: vec![Inbound {
                port: LOCAL_HTTP_PORT,
                protocol: "http".to_string(),
                settings: InboundSettings {
                    auth: "noauth".to_string(),
                },
            }],
            outbounds: vec![Outbound {
                protocol: "vless".to_string(),
                settings: OutboundSettings {
                    vnext: vec![Vnext {
                        address: link.host.clone(),
                        port: link.port,
                        users: vec![User {
                            id: link.user_id.clone(),
                            encryption: "none".to_string(),
                            flow: link.flow.clone(),
                        }],
                    }],
                },
                stream_settings: StreamSettings {
                    security: "reality".to_string(),
                    reality_settings: RealitySettings {
                        server_name: link.server_name.clone(),
                        public_key: link.public_key.clone(),
                        short_id: link.short_id.clone(),
                    },
                },
            }],
        }
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        tracing::debug!("Wrote engine config to {}", path.display());
        Ok(())
    }
}
