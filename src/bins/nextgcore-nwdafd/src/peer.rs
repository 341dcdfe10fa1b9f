//! Peer NF Directory
//!
//! Resolves the event exposure base address of the AMF, SMF and UDM the
//! NWDAF subscribes to. Addresses come from configuration; a dynamic NRF
//! discovery client can implement [`PeerDirectory`] instead.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use ogs_sbi::{NfType, SbiServiceType};
use serde::Deserialize;

use crate::error::DiscoveryError;

/// Peer network functions offering event exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerType {
    Amf,
    Smf,
    Udm,
}

impl PeerType {
    /// Every peer type, in subscription order
    pub const ALL: [PeerType; 3] = [PeerType::Amf, PeerType::Smf, PeerType::Udm];

    pub fn nf_type(&self) -> NfType {
        match self {
            Self::Amf => NfType::Amf,
            Self::Smf => NfType::Smf,
            Self::Udm => NfType::Udm,
        }
    }

    /// Event exposure service offered by the peer
    pub fn service(&self) -> SbiServiceType {
        match self {
            Self::Amf => SbiServiceType::NamfEvts,
            Self::Smf => SbiServiceType::NsmfEventExposure,
            Self::Udm => SbiServiceType::NudmEe,
        }
    }

    /// OAuth2 scope requested for subscriptions towards this peer
    pub fn scope(&self) -> &'static str {
        self.service().to_name()
    }

    /// Last path segment of the callback URI this peer notifies
    pub fn notification_leaf(&self) -> &'static str {
        match self {
            Self::Amf => "notifications",
            Self::Smf => "smf-notifications",
            Self::Udm => "udm-ee-notifications",
        }
    }

    /// Subscription collection path relative to the event exposure base
    pub fn subscription_path(&self) -> &'static str {
        match self {
            Self::Amf | Self::Smf => "/subscriptions",
            Self::Udm => "/anyUE/ee-subscriptions",
        }
    }
}

impl fmt::Display for PeerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nf_type())
    }
}

/// Configured location of a peer NF
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAddress {
    /// Event exposure API root, e.g. `http://127.0.0.18:8000/namf-evts/v1`
    pub uri: String,
    #[serde(default)]
    pub nf_instance_id: Option<String>,
}

impl PeerAddress {
    pub fn new(uri: impl Into<String>, nf_instance_id: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            nf_instance_id: nf_instance_id.map(String::from),
        }
    }

    /// Address used when nothing is configured for the peer type
    pub fn default_for(peer: PeerType) -> Self {
        match peer {
            PeerType::Amf => Self::new("http://127.0.0.18:8000/namf-evts/v1", Some("amf-1")),
            PeerType::Smf => {
                Self::new("http://127.0.0.2:8000/nsmf_event-exposure/v1", Some("smf-1"))
            }
            PeerType::Udm => Self::new("http://127.0.0.3:8000/nudm-ee/v1", Some("udm-1")),
        }
    }
}

/// A resolved peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub peer_type: PeerType,
    pub event_exposure_uri: String,
    pub nf_instance_id: Option<String>,
}

impl PeerDescriptor {
    /// Absolute URI of the subscription collection
    pub fn subscription_uri(&self) -> String {
        format!(
            "{}{}",
            self.event_exposure_uri.trim_end_matches('/'),
            self.peer_type.subscription_path()
        )
    }
}

/// Peer resolution
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    async fn resolve(&self, peer: PeerType) -> Result<PeerDescriptor, DiscoveryError>;
}

/// Directory backed by static configuration
#[derive(Debug, Clone, Default)]
pub struct StaticPeerDirectory {
    peers: HashMap<PeerType, PeerAddress>,
}

impl StaticPeerDirectory {
    /// Empty directory: every lookup fails with `NotFound`
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the default address of every peer type
    pub fn with_defaults() -> Self {
        PeerType::ALL
            .iter()
            .fold(Self::new(), |dir, &peer| dir.with_peer(peer, PeerAddress::default_for(peer)))
    }

    pub fn with_peer(mut self, peer: PeerType, address: PeerAddress) -> Self {
        self.peers.insert(peer, address);
        self
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[async_trait]
impl PeerDirectory for StaticPeerDirectory {
    async fn resolve(&self, peer: PeerType) -> Result<PeerDescriptor, DiscoveryError> {
        let address = self.peers.get(&peer).ok_or(DiscoveryError::NotFound(peer))?;
        validate_address(peer, &address.uri)?;

        log::debug!("[{peer}] resolved event exposure at {}", address.uri);
        Ok(PeerDescriptor {
            peer_type: peer,
            event_exposure_uri: address.uri.clone(),
            nf_instance_id: address.nf_instance_id.clone(),
        })
    }
}

fn validate_address(peer: PeerType, uri: &str) -> Result<(), DiscoveryError> {
    let invalid = |reason: &str| DiscoveryError::InvalidAddress {
        peer,
        address: uri.to_string(),
        reason: reason.to_string(),
    };

    if uri.starts_with("https://") {
        return Err(invalid("https is not supported, SBI runs over cleartext HTTP/2"));
    }
    let rest = uri
        .strip_prefix("http://")
        .ok_or_else(|| invalid("not an absolute http URI"))?;
    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() || authority.starts_with(':') {
        return Err(invalid("missing host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_type_names() {
        assert_eq!(PeerType::Amf.to_string(), "AMF");
        assert_eq!(PeerType::Smf.scope(), "nsmf-event-exposure");
        assert_eq!(PeerType::Udm.scope(), "nudm-ee");
        assert_eq!(PeerType::Amf.notification_leaf(), "notifications");
        assert_eq!(PeerType::Udm.nf_type(), NfType::Udm);
    }

    #[test]
    fn test_subscription_uri() {
        let descriptor = PeerDescriptor {
            peer_type: PeerType::Udm,
            event_exposure_uri: "http://127.0.0.3:8000/nudm-ee/v1/".to_string(),
            nf_instance_id: None,
        };
        assert_eq!(
            descriptor.subscription_uri(),
            "http://127.0.0.3:8000/nudm-ee/v1/anyUE/ee-subscriptions"
        );
    }

    #[tokio::test]
    async fn test_default_directory() {
        let directory = StaticPeerDirectory::with_defaults();
        assert_eq!(directory.len(), 3);

        let amf = directory.resolve(PeerType::Amf).await.unwrap();
        assert_eq!(amf.event_exposure_uri, "http://127.0.0.18:8000/namf-evts/v1");
        assert_eq!(amf.nf_instance_id.as_deref(), Some("amf-1"));
        assert_eq!(
            amf.subscription_uri(),
            "http://127.0.0.18:8000/namf-evts/v1/subscriptions"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_peer() {
        let directory = StaticPeerDirectory::new()
            .with_peer(PeerType::Amf, PeerAddress::default_for(PeerType::Amf));
        assert_eq!(
            directory.resolve(PeerType::Smf).await.unwrap_err(),
            DiscoveryError::NotFound(PeerType::Smf)
        );
    }

    #[tokio::test]
    async fn test_invalid_address() {
        for bad in ["", "127.0.0.2:8000/nsmf", "ftp://smf/x", "http:///nsmf", "http://:8000/x"] {
            let directory =
                StaticPeerDirectory::new().with_peer(PeerType::Smf, PeerAddress::new(bad, None));
            let err = directory.resolve(PeerType::Smf).await.unwrap_err();
            assert!(
                matches!(err, DiscoveryError::InvalidAddress { .. }),
                "{bad} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_https_address_rejected() {
        let directory = StaticPeerDirectory::new().with_peer(
            PeerType::Amf,
            PeerAddress::new("https://127.0.0.18:8000/namf-evts/v1", Some("amf-1")),
        );
        match directory.resolve(PeerType::Amf).await {
            Err(DiscoveryError::InvalidAddress { peer, reason, .. }) => {
                assert_eq!(peer, PeerType::Amf);
                assert!(reason.contains("https"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
