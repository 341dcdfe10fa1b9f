//! NWDAF Error Types

use ogs_sbi::{SbiError, TokenResponseError};
use thiserror::Error;

use crate::nwdaf_sm::NwdafState;
use crate::peer::PeerType;

/// Token acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("NRF address is not configured")]
    MissingRegistry,

    #[error("token request transport failure: {0}")]
    Transport(#[from] SbiError),

    #[error("token request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(#[from] TokenResponseError),
}

/// Peer resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("no {0} instance configured")]
    NotFound(PeerType),

    #[error("invalid {peer} address '{address}': {reason}")]
    InvalidAddress {
        peer: PeerType,
        address: String,
        reason: String,
    },
}

/// Per-peer subscription errors
#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("discovery failed: {0}")]
    DiscoveryFailed(#[from] DiscoveryError),

    #[error("authorization failed: {0}")]
    AuthFailed(#[from] AuthError),

    #[error("subscription rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("subscription transport failure: {0}")]
    Transport(SbiError),

    #[error("subscription task aborted: {0}")]
    Aborted(String),
}

impl SubscriptionError {
    /// Short label used in logs and startup reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DiscoveryFailed(_) => "discovery-failed",
            Self::AuthFailed(_) => "auth-failed",
            Self::Rejected { .. } => "rejected",
            Self::Transport(_) => "transport",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// NRF registration errors
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("NRF request failed: {0}")]
    Transport(#[from] SbiError),

    #[error("NRF answered with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors raised by a report store backend. The message is passed through
/// to the notifying peer as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Inbound notification payload errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("missing request body")]
    MissingBody,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("mandatory IE missing: {0}")]
    MandatoryIeMissing(&'static str),

    #[error("unrecognized notification payload")]
    Unrecognized,
}

impl NotificationError {
    /// ProblemDetails cause
    pub fn cause(&self) -> &'static str {
        match self {
            Self::MissingBody => "MISSING_BODY",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::MandatoryIeMissing(_) => "MANDATORY_IE_MISSING",
            Self::Unrecognized => "UNRECOGNIZED_NOTIFICATION",
        }
    }
}

/// Lifecycle controller errors
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("NRF registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("notification server failure: {0}")]
    Server(SbiError),

    #[error("cannot {operation} in state {state:?}")]
    InvalidState {
        state: NwdafState,
        operation: &'static str,
    },
}
