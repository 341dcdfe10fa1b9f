//! OAuth2 Token Broker
//!
//! Fetches access tokens from the NRF (client credentials grant,
//! TS 29.510 clause 5.4). Tokens are requested per call and never cached.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ogs_sbi::constants::content_type;
use ogs_sbi::oauth::TOKEN_ENDPOINT;
use ogs_sbi::{
    AccessTokenError, AccessTokenRequest, AccessTokenResponse, NfType, SbiClient,
    SbiClientConfig, SbiRequest,
};

use crate::error::AuthError;

/// Bearer token for a single request
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}

/// Token acquisition
#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Obtain a token allowing `requester` to call `scope` on a `target` NF
    async fn acquire(
        &self,
        requester: &str,
        target: NfType,
        target_instance_id: Option<&str>,
        scope: &str,
    ) -> Result<Credential, AuthError>;
}

/// Token broker talking to the NRF token endpoint
pub struct NrfTokenBroker {
    token_uri: String,
    client: SbiClient,
}

impl NrfTokenBroker {
    pub fn new(nrf_uri: &str, request_timeout: Duration) -> Result<Self, AuthError> {
        let nrf_uri = nrf_uri.trim();
        if nrf_uri.is_empty() {
            return Err(AuthError::MissingRegistry);
        }

        let config = SbiClientConfig::from_uri(nrf_uri)?.with_request_timeout(request_timeout);
        Ok(Self {
            token_uri: format!("{}{}", nrf_uri.trim_end_matches('/'), TOKEN_ENDPOINT),
            client: SbiClient::new(config),
        })
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }
}

#[async_trait]
impl TokenBroker for NrfTokenBroker {
    async fn acquire(
        &self,
        requester: &str,
        target: NfType,
        target_instance_id: Option<&str>,
        scope: &str,
    ) -> Result<Credential, AuthError> {
        let mut token_request = AccessTokenRequest::new(requester, NfType::Nwdaf, target, scope);
        if let Some(id) = target_instance_id {
            token_request = token_request.with_target_nf_instance_id(id);
        }

        let request = SbiRequest::post(self.token_uri.as_str())
            .with_body(token_request.to_form_body(), content_type::FORM_URLENCODED);

        log::debug!("Requesting {scope} token for {target} from {}", self.token_uri);
        let response = self.client.send_request(request).await?;

        if !response.is_success() {
            let body = response.text().to_string();
            log::warn!(
                "NRF refused {scope} token (status={}): {}",
                response.status,
                AccessTokenError::describe(&body)
            );
            return Err(AuthError::Rejected {
                status: response.status,
                body,
            });
        }

        let parsed = AccessTokenResponse::from_body(response.text())?;
        log::debug!(
            "Obtained {scope} token (expires_in={:?})",
            parsed.expires_in
        );
        Ok(Credential::new(parsed.access_token))
    }
}
