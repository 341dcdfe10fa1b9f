//! Event Exposure Subscription Manager
//!
//! Creates event subscriptions with the AMF (TS 29.518 Namf_EventExposure),
//! SMF (TS 29.508 Nsmf_EventExposure) and UDM (TS 29.503 Nudm_EE).
//! Each attempt resolves the peer, builds the peer specific body, fetches a
//! fresh token and POSTs the subscription once.

use std::sync::Arc;
use std::time::Duration;

use ogs_sbi::constants::{header, status};
use ogs_sbi::{NfType, SbiClient, SbiClientConfig, SbiRequest};
use serde::Deserialize;

use crate::context::SelfIdentity;
use crate::error::SubscriptionError;
use crate::peer::{PeerDirectory, PeerType};
use crate::token::TokenBroker;

/// AMF events subscribed to
const AMF_EVENTS: [&str; 3] = ["REGISTRATION_STATE_REPORT", "LOCATION_REPORT", "REACHABILITY_REPORT"];

/// UDM events subscribed to
const UDM_EVENTS: [&str; 2] = ["SUBSCRIPTION_DATA_CHANGE", "AMF_REGISTRATION_STATE"];

/// PDU session events requested from the SMF
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmfEventProfile {
    /// Establishment, modification and release
    #[default]
    Full,
    /// Establishment and release only
    SessionLifecycle,
}

impl SmfEventProfile {
    pub fn events(&self) -> &'static [&'static str] {
        match self {
            Self::Full => &[
                "PDU_SESSION_ESTABLISHMENT",
                "PDU_SESSION_MODIFICATION",
                "PDU_SESSION_RELEASE",
            ],
            Self::SessionLifecycle => &["PDU_SESSION_ESTABLISHMENT", "PDU_SESSION_RELEASE"],
        }
    }
}

/// Subscription request body, one shape per peer type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionBody {
    Amf {
        event_notify_uri: String,
    },
    Smf {
        notif_uri: String,
        events: &'static [&'static str],
    },
    Udm {
        notif_uri: String,
        nf_instance_id: String,
    },
}

impl SubscriptionBody {
    pub fn build(peer: PeerType, identity: &SelfIdentity, smf_profile: SmfEventProfile) -> Self {
        let callback = identity.callback_uri(peer);
        match peer {
            PeerType::Amf => Self::Amf {
                event_notify_uri: callback,
            },
            PeerType::Smf => Self::Smf {
                notif_uri: callback,
                events: smf_profile.events(),
            },
            PeerType::Udm => Self::Udm {
                notif_uri: callback,
                nf_instance_id: identity.nf_instance_id.clone(),
            },
        }
    }

    pub fn peer_type(&self) -> PeerType {
        match self {
            Self::Amf { .. } => PeerType::Amf,
            Self::Smf { .. } => PeerType::Smf,
            Self::Udm { .. } => PeerType::Udm,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Amf { event_notify_uri } => serde_json::json!({
                "subscription": {
                    "eventList": AMF_EVENTS
                        .iter()
                        .map(|event| serde_json::json!({ "type": event }))
                        .collect::<Vec<_>>(),
                    "eventNotifyUri": event_notify_uri,
                    "anyUE": true,
                }
            }),
            Self::Smf { notif_uri, events } => serde_json::json!({
                "notifUri": notif_uri,
                "eventList": events,
            }),
            Self::Udm {
                notif_uri,
                nf_instance_id,
            } => serde_json::json!({
                "eventList": UDM_EVENTS
                    .iter()
                    .map(|event| serde_json::json!({ "event": event }))
                    .collect::<Vec<_>>(),
                "notifUri": notif_uri,
                "nfInstanceId": nf_instance_id,
                "anyUE": true,
            }),
        }
    }
}

/// A subscription the peer accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionAck {
    pub peer_type: PeerType,
    pub status: u16,
    /// Subscription resource URI from the `Location` header
    pub location: Option<String>,
}

/// Per-peer outcome of the subscription fan-out
#[derive(Debug, Default)]
pub struct StartupReport {
    outcomes: Vec<(PeerType, Result<SubscriptionAck, SubscriptionError>)>,
}

impl StartupReport {
    pub fn outcomes(&self) -> &[(PeerType, Result<SubscriptionAck, SubscriptionError>)] {
        &self.outcomes
    }

    pub fn outcome(&self, peer: PeerType) -> Option<&Result<SubscriptionAck, SubscriptionError>> {
        self.outcomes
            .iter()
            .find(|(p, _)| *p == peer)
            .map(|(_, outcome)| outcome)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when every attempted peer accepted its subscription
    pub fn healthy(&self) -> bool {
        self.failed() == 0
    }
}

pub struct SubscriptionManager {
    identity: Arc<SelfIdentity>,
    directory: Arc<dyn PeerDirectory>,
    tokens: Arc<dyn TokenBroker>,
    smf_profile: SmfEventProfile,
    request_timeout: Duration,
}

impl SubscriptionManager {
    pub fn new(
        identity: Arc<SelfIdentity>,
        directory: Arc<dyn PeerDirectory>,
        tokens: Arc<dyn TokenBroker>,
    ) -> Self {
        Self {
            identity,
            directory,
            tokens,
            smf_profile: SmfEventProfile::default(),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_smf_profile(mut self, profile: SmfEventProfile) -> Self {
        self.smf_profile = profile;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn identity(&self) -> &SelfIdentity {
        &self.identity
    }

    /// Subscribe to the events of one peer
    pub async fn subscribe(&self, peer: PeerType) -> Result<SubscriptionAck, SubscriptionError> {
        let result = self.try_subscribe(peer).await;
        match &result {
            Ok(ack) => log::info!(
                "[{peer}] subscription created (status={}, location={})",
                ack.status,
                ack.location.as_deref().unwrap_or("-")
            ),
            Err(e) => log::error!("[{peer}] subscription failed ({}): {e}", e.kind()),
        }
        result
    }

    async fn try_subscribe(&self, peer: PeerType) -> Result<SubscriptionAck, SubscriptionError> {
        let descriptor = self.directory.resolve(peer).await?;
        let body = SubscriptionBody::build(peer, &self.identity, self.smf_profile);

        let credential = self
            .tokens
            .acquire(
                &self.identity.nf_instance_id,
                peer.nf_type(),
                descriptor.nf_instance_id.as_deref(),
                peer.scope(),
            )
            .await?;

        let uri = descriptor.subscription_uri();
        let config = SbiClientConfig::from_uri(&uri)
            .map_err(SubscriptionError::Transport)?
            .with_request_timeout(self.request_timeout);
        let client = SbiClient::new(config);

        let request = SbiRequest::post(uri.as_str())
            .with_json_body(&body.to_json())
            .map_err(|e| SubscriptionError::Transport(e.into()))?
            .with_bearer_token(credential.token())
            .with_header(header::NF_TYPE, NfType::Nwdaf.to_str())
            .with_header(header::NF_INSTANCE_ID, self.identity.nf_instance_id.as_str());

        log::debug!("[{peer}] POST {uri}");
        let response = client
            .send_request(request)
            .await
            .map_err(SubscriptionError::Transport)?;

        match response.status {
            status::OK | status::CREATED => Ok(SubscriptionAck {
                peer_type: peer,
                status: response.status,
                location: response.http.get_header(header::LOCATION).cloned(),
            }),
            other => Err(SubscriptionError::Rejected {
                status: other,
                body: response.text().to_string(),
            }),
        }
    }

    /// Subscribe to every peer concurrently and join the outcomes
    pub async fn subscribe_all(self: &Arc<Self>, peers: &[PeerType]) -> StartupReport {
        let tasks: Vec<_> = peers
            .iter()
            .map(|&peer| {
                let manager = Arc::clone(self);
                (peer, tokio::spawn(async move { manager.subscribe(peer).await }))
            })
            .collect();

        let mut report = StartupReport::default();
        for (peer, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = SubscriptionError::Aborted(e.to_string());
                    log::error!("[{peer}] subscription failed ({}): {err}", err.kind());
                    Err(err)
                }
            };
            report.outcomes.push((peer, outcome));
        }

        log::info!(
            "Peer subscriptions complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}
