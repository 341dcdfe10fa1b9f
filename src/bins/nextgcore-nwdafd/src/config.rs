//! NWDAF Configuration
//!
//! YAML configuration (`configuration:` section). A missing file falls back
//! to defaults; a file that exists but does not parse is an error.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use ogs_sbi::UriScheme;
use serde::Deserialize;
use thiserror::Error;

use crate::context::DEFAULT_SBI_PORT;
use crate::peer::{PeerAddress, PeerType, StaticPeerDirectory};
use crate::subscription::SmfEventProfile;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid SBI binding address {0}")]
    InvalidBinding(String),

    #[error("unsupported {field} scheme {scheme}: only cleartext http is served")]
    UnsupportedScheme { field: String, scheme: UriScheme },
}

/// Top level of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    configuration: NwdafConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SbiConfig {
    pub scheme: UriScheme,
    /// Address advertised to the NRF and used in callback URIs
    #[serde(rename = "registerIPv4")]
    pub register_ipv4: String,
    /// Address the notification server binds to
    #[serde(rename = "bindingIPv4")]
    pub binding_ipv4: String,
    /// 0 selects the default port
    pub port: u16,
}

impl Default for SbiConfig {
    fn default() -> Self {
        Self {
            scheme: UriScheme::Http,
            register_ipv4: "127.0.0.1".to_string(),
            binding_ipv4: "127.0.0.1".to_string(),
            port: DEFAULT_SBI_PORT,
        }
    }
}

impl SbiConfig {
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_SBI_PORT
        } else {
            self.port
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.binding_ipv4, self.effective_port());
        addr.parse().map_err(|_| ConfigError::InvalidBinding(addr))
    }
}

/// Peer addresses. A peer set to `null` is left unconfigured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeersConfig {
    pub amf: Option<PeerAddress>,
    pub smf: Option<PeerAddress>,
    pub udm: Option<PeerAddress>,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            amf: Some(PeerAddress::default_for(PeerType::Amf)),
            smf: Some(PeerAddress::default_for(PeerType::Smf)),
            udm: Some(PeerAddress::default_for(PeerType::Udm)),
        }
    }
}

impl PeersConfig {
    pub fn directory(&self) -> StaticPeerDirectory {
        [
            (PeerType::Amf, &self.amf),
            (PeerType::Smf, &self.smf),
            (PeerType::Udm, &self.udm),
        ]
        .into_iter()
        .fold(StaticPeerDirectory::new(), |dir, (peer, address)| match address {
            Some(address) => dir.with_peer(peer, address.clone()),
            None => dir,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NwdafConfig {
    /// NF instance id; generated when absent
    pub nf_id: Option<String>,
    pub nrf_uri: String,
    pub oauth2_required: bool,
    pub sbi: SbiConfig,
    pub peers: PeersConfig,
    pub smf_event_profile: SmfEventProfile,
    /// Grace delay between starting the server and subscribing
    pub subscribe_delay_ms: u64,
    /// Deadline for each outbound request
    pub request_timeout_ms: u64,
}

impl Default for NwdafConfig {
    fn default() -> Self {
        Self {
            nf_id: None,
            nrf_uri: "http://127.0.0.10:8000".to_string(),
            oauth2_required: false,
            sbi: SbiConfig::default(),
            peers: PeersConfig::default(),
            smf_event_profile: SmfEventProfile::default(),
            subscribe_delay_ms: 1000,
            request_timeout_ms: 5000,
        }
    }
}

impl NwdafConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        file.configuration.validate()?;
        Ok(file.configuration)
    }

    /// Reject endpoints that would need TLS
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sbi.scheme != UriScheme::Http {
            return Err(ConfigError::UnsupportedScheme {
                field: "sbi".to_string(),
                scheme: self.sbi.scheme,
            });
        }

        let peers = [
            (PeerType::Amf, &self.peers.amf),
            (PeerType::Smf, &self.peers.smf),
            (PeerType::Udm, &self.peers.udm),
        ];
        let endpoints = peers
            .into_iter()
            .filter_map(|(peer, address)| {
                address
                    .as_ref()
                    .map(|a| (format!("peers.{peer}"), a.uri.as_str()))
            })
            .chain(std::iter::once(("nrfUri".to_string(), self.nrf_uri.as_str())));
        for (field, uri) in endpoints {
            if uri.trim().to_ascii_lowercase().starts_with("https://") {
                return Err(ConfigError::UnsupportedScheme {
                    field,
                    scheme: UriScheme::Https,
                });
            }
        }
        Ok(())
    }

    /// Load the configuration file, using defaults when it cannot be read
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!(
                    "Could not read config file '{}': {e}. Using defaults.",
                    path.display()
                );
                return Ok(Self::default());
            }
        };

        let config = Self::from_yaml(&content)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn subscribe_delay(&self) -> Duration {
        Duration::from_millis(self.subscribe_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
