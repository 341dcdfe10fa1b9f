//! OAuth2 Client Credentials Messages for 5G SBA
//!
//! Request encoding and response parsing for the client credentials grant
//! (RFC 6749 Section 4.4) with the NRF acting as the authorization server
//! (3GPP TS 29.510).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NfType;

/// Token endpoint path on the NRF
pub const TOKEN_ENDPOINT: &str = "/oauth2/token";

/// OAuth2 access token request per RFC 6749 Section 4.4.2 and 3GPP TS 29.510.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    /// Grant type: must be "client_credentials"
    pub grant_type: String,
    /// NF type of the NF service consumer
    #[serde(rename = "nfType")]
    pub nf_type: NfType,
    /// NF type of the target NF service producer
    #[serde(rename = "targetNfType")]
    pub target_nf_type: NfType,
    /// NF Instance ID of the NF service consumer
    #[serde(rename = "nfInstanceId")]
    pub nf_instance_id: String,
    /// Target NF Instance ID (optional)
    #[serde(rename = "targetNfInstanceId", skip_serializing_if = "Option::is_none")]
    pub target_nf_instance_id: Option<String>,
    /// Requested scope (space-delimited NF service names)
    pub scope: String,
}

impl AccessTokenRequest {
    /// Create a new access token request for the given consumer/producer pair.
    pub fn new(
        nf_instance_id: impl Into<String>,
        nf_type: NfType,
        target_nf_type: NfType,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: "client_credentials".to_string(),
            nf_type,
            target_nf_type,
            nf_instance_id: nf_instance_id.into(),
            target_nf_instance_id: None,
            scope: scope.into(),
        }
    }

    /// Set the target NF instance ID.
    pub fn with_target_nf_instance_id(mut self, id: impl Into<String>) -> Self {
        self.target_nf_instance_id = Some(id.into());
        self
    }

    /// Encode the request as `application/x-www-form-urlencoded` body.
    ///
    /// Field order: grant_type, nfType, targetNfType, nfInstanceId,
    /// targetNfInstanceId (when known), scope.
    pub fn to_form_body(&self) -> String {
        let mut parts = vec![
            format!("grant_type={}", url_encode(&self.grant_type)),
            format!("nfType={}", url_encode(self.nf_type.to_str())),
            format!("targetNfType={}", url_encode(self.target_nf_type.to_str())),
            format!("nfInstanceId={}", url_encode(&self.nf_instance_id)),
        ];
        if let Some(ref id) = self.target_nf_instance_id {
            parts.push(format!("targetNfInstanceId={}", url_encode(id)));
        }
        parts.push(format!("scope={}", url_encode(&self.scope)));
        parts.join("&")
    }
}

/// Why a 2xx token response could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenResponseError {
    #[error("token response is not a JSON object")]
    NotAnObject,
    #[error("token response has no string access_token field")]
    MissingAccessToken,
    #[error("token response carries an empty access_token")]
    EmptyAccessToken,
}

/// OAuth2 access token response per RFC 6749 Section 4.4.3 and 3GPP TS 29.510.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    /// The access token (JWT in 5G SBA)
    pub access_token: String,
    /// Token type, normally "Bearer"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Lifetime of the token in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Scope granted (space-delimited NF service names)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AccessTokenResponse {
    /// Parse a token response body.
    ///
    /// Only `access_token` is mandatory; other members are picked up when
    /// they have the expected JSON type and ignored otherwise.
    pub fn from_body(body: &str) -> Result<Self, TokenResponseError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|_| TokenResponseError::NotAnObject)?;
        let object = value.as_object().ok_or(TokenResponseError::NotAnObject)?;

        let access_token = object
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(TokenResponseError::MissingAccessToken)?;
        if access_token.is_empty() {
            return Err(TokenResponseError::EmptyAccessToken);
        }

        Ok(Self {
            access_token: access_token.to_string(),
            token_type: object.get("token_type").and_then(|v| v.as_str()).map(String::from),
            expires_in: object.get("expires_in").and_then(|v| v.as_u64()),
            scope: object.get("scope").and_then(|v| v.as_str()).map(String::from),
        })
    }
}

/// OAuth2 error response per RFC 6749 Section 5.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenError {
    /// Error code
    pub error: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl AccessTokenError {
    /// Short description of an error body, falling back to the raw text
    pub fn describe(body: &str) -> String {
        match serde_json::from_str::<AccessTokenError>(body) {
            Ok(err) => match err.error_description {
                Some(desc) => format!("{}: {desc}", err.error),
                None => err.error,
            },
            Err(_) => body.to_string(),
        }
    }
}

/// Minimal percent-encoding for form values.
fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            ' ' => result.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                let encoded = c.encode_utf8(&mut buf);
                for &b in encoded.as_bytes() {
                    result.push('%');
                    result.push_str(&format!("{b:02X}"));
                }
            }
        }
    }
    result
}
