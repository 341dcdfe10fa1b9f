//! SBI Types
//!
//! NF types, service names and URI schemes used on the Service Based Interface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SBI service types an analytics function produces or consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SbiServiceType {
    NnrfNfm,
    NnrfDisc,
    NnrfOauth2,
    NamfEvts,
    NsmfEventExposure,
    NudmEe,
    NnwdafEvents,
    NnwdafEventssubscription,
    NnwdafAnalyticsinfo,
}

impl SbiServiceType {
    /// Convert service type to service name string
    pub fn to_name(&self) -> &'static str {
        match self {
            Self::NnrfNfm => "nnrf-nfm",
            Self::NnrfDisc => "nnrf-disc",
            Self::NnrfOauth2 => "nnrf-oauth2",
            Self::NamfEvts => "namf-evts",
            Self::NsmfEventExposure => "nsmf-event-exposure",
            Self::NudmEe => "nudm-ee",
            Self::NnwdafEvents => "nnwdaf-events",
            Self::NnwdafEventssubscription => "nnwdaf-eventssubscription",
            Self::NnwdafAnalyticsinfo => "nnwdaf-analyticsinfo",
        }
    }

    /// Convert service name string to service type
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nnrf-nfm" => Some(Self::NnrfNfm),
            "nnrf-disc" => Some(Self::NnrfDisc),
            "nnrf-oauth2" => Some(Self::NnrfOauth2),
            "namf-evts" => Some(Self::NamfEvts),
            "nsmf-event-exposure" => Some(Self::NsmfEventExposure),
            "nudm-ee" => Some(Self::NudmEe),
            "nnwdaf-events" => Some(Self::NnwdafEvents),
            "nnwdaf-eventssubscription" => Some(Self::NnwdafEventssubscription),
            "nnwdaf-analyticsinfo" => Some(Self::NnwdafAnalyticsinfo),
            _ => None,
        }
    }
}

impl fmt::Display for SbiServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_name())
    }
}

/// NF Type enumeration - matches OpenAPI NFType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NfType {
    Nrf,
    Amf,
    Smf,
    Udm,
    Udr,
    Ausf,
    Pcf,
    Nef,
    Nwdaf,
    Scp,
}

impl NfType {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Nrf => "NRF",
            Self::Amf => "AMF",
            Self::Smf => "SMF",
            Self::Udm => "UDM",
            Self::Udr => "UDR",
            Self::Ausf => "AUSF",
            Self::Pcf => "PCF",
            Self::Nef => "NEF",
            Self::Nwdaf => "NWDAF",
            Self::Scp => "SCP",
        }
    }
}

impl fmt::Display for NfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// URI Scheme - matches OpenAPI UriScheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    #[default]
    Http,
    Https,
}

impl UriScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UriScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unknown URI scheme: {other}")),
        }
    }
}
