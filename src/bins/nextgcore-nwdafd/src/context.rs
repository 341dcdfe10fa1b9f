//! NWDAF Self Identity
//!
//! Identity and advertised endpoint of this NWDAF instance. Built once from
//! configuration and shared read-only by every component.

use ogs_sbi::{NfType, SbiServiceType, UriScheme};

use crate::config::NwdafConfig;
use crate::peer::PeerType;

/// API root of the notification endpoints
pub const NOTIFICATION_API_ROOT: &str = "/nnwdaf-events/v1";

/// Default SBI port when none is configured
pub const DEFAULT_SBI_PORT: u16 = 8001;

/// Heartbeat interval advertised in the NF profile (seconds)
const HEARTBEAT_TIMER: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfIdentity {
    pub nf_instance_id: String,
    pub scheme: UriScheme,
    pub advertised_address: String,
    pub advertised_port: u16,
    pub nrf_uri: String,
    pub token_required: bool,
}

impl SelfIdentity {
    pub fn new(nf_instance_id: impl Into<String>, nrf_uri: impl Into<String>) -> Self {
        Self {
            nf_instance_id: nf_instance_id.into(),
            scheme: UriScheme::Http,
            advertised_address: "127.0.0.1".to_string(),
            advertised_port: DEFAULT_SBI_PORT,
            nrf_uri: nrf_uri.into(),
            token_required: false,
        }
    }

    /// Build from configuration; generates an instance id when none is set.
    pub fn from_config(config: &NwdafConfig) -> Self {
        let nf_instance_id = config
            .nf_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("nwdaf-{}", uuid::Uuid::new_v4()));

        Self {
            nf_instance_id,
            scheme: config.sbi.scheme,
            advertised_address: config.sbi.register_ipv4.clone(),
            advertised_port: config.sbi.effective_port(),
            nrf_uri: config.nrf_uri.clone(),
            token_required: config.oauth2_required,
        }
    }

    pub fn with_advertised_endpoint(
        mut self,
        scheme: UriScheme,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        self.scheme = scheme;
        self.advertised_address = address.into();
        self.advertised_port = port;
        self
    }

    pub fn with_token_required(mut self, required: bool) -> Self {
        self.token_required = required;
        self
    }

    /// Callback URI handed to `peer` in its subscription
    pub fn callback_uri(&self, peer: PeerType) -> String {
        format!(
            "{}://{}:{}{}/{}",
            self.scheme,
            self.advertised_address,
            self.advertised_port,
            NOTIFICATION_API_ROOT,
            peer.notification_leaf()
        )
    }

    /// NF profile sent on NRF registration (TS 29.510 NFProfile)
    pub fn nf_profile(&self) -> serde_json::Value {
        let service = SbiServiceType::NnwdafEvents.to_name();
        serde_json::json!({
            "nfInstanceId": self.nf_instance_id,
            "nfType": NfType::Nwdaf.to_str(),
            "nfStatus": "REGISTERED",
            "heartBeatTimer": HEARTBEAT_TIMER,
            "ipv4Addresses": [self.advertised_address],
            "nfServices": [{
                "serviceInstanceId": "1",
                "serviceName": service,
                "versions": [{
                    "apiVersionInUri": "v1",
                    "apiFullVersion": "1.0.0",
                }],
                "scheme": self.scheme.as_str(),
                "nfServiceStatus": "REGISTERED",
                "ipEndPoints": [{
                    "ipv4Address": self.advertised_address,
                    "transport": "TCP",
                    "port": self.advertised_port,
                }],
            }],
            "customInfo": {
                "oauth2": self.token_required,
            },
        })
    }
}
