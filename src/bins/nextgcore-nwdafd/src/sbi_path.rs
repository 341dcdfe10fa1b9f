//! NWDAF SBI Path Functions
//!
//! NF management towards the NRF (TS 29.510 Nnrf_NFManagement).

use std::time::Duration;

use async_trait::async_trait;
use ogs_sbi::constants::status;
use ogs_sbi::{SbiClient, SbiClientConfig, SbiRequest, SbiServiceType};

use crate::context::SelfIdentity;
use crate::error::RegistrationError;
use crate::token::Credential;

/// NF instance registration with the NRF
#[async_trait]
pub trait NfRegistry: Send + Sync {
    /// NFRegister: PUT the NF profile
    async fn register(
        &self,
        identity: &SelfIdentity,
        credential: Option<&Credential>,
    ) -> Result<(), RegistrationError>;

    /// NFDeregister: DELETE the NF instance
    async fn deregister(&self, identity: &SelfIdentity) -> Result<(), RegistrationError>;
}

pub struct NrfRegistry {
    nrf_uri: String,
    client: SbiClient,
}

impl NrfRegistry {
    pub fn new(nrf_uri: &str, request_timeout: Duration) -> Result<Self, RegistrationError> {
        let config = SbiClientConfig::from_uri(nrf_uri)?.with_request_timeout(request_timeout);
        Ok(Self {
            nrf_uri: nrf_uri.trim_end_matches('/').to_string(),
            client: SbiClient::new(config),
        })
    }

    /// NF instance resource URI
    pub fn instance_uri(&self, nf_instance_id: &str) -> String {
        format!(
            "{}/{}/v1/nf-instances/{nf_instance_id}",
            self.nrf_uri,
            SbiServiceType::NnrfNfm.to_name()
        )
    }
}

#[async_trait]
impl NfRegistry for NrfRegistry {
    async fn register(
        &self,
        identity: &SelfIdentity,
        credential: Option<&Credential>,
    ) -> Result<(), RegistrationError> {
        let uri = self.instance_uri(&identity.nf_instance_id);
        let mut request = SbiRequest::put(uri.as_str())
            .with_json_body(&identity.nf_profile())
            .map_err(|e| RegistrationError::Transport(e.into()))?;
        if let Some(credential) = credential {
            request = request.with_bearer_token(credential.token());
        }

        log::debug!("NFRegister PUT {uri}");
        let response = self.client.send_request(request).await?;

        match response.status {
            status::OK | status::CREATED => {
                log::info!(
                    "NWDAF [{}] registered with NRF (status={})",
                    identity.nf_instance_id,
                    response.status
                );
                Ok(())
            }
            other => Err(RegistrationError::Rejected {
                status: other,
                body: response.text().to_string(),
            }),
        }
    }

    async fn deregister(&self, identity: &SelfIdentity) -> Result<(), RegistrationError> {
        let uri = self.instance_uri(&identity.nf_instance_id);
        log::debug!("NFDeregister DELETE {uri}");
        let response = self.client.send_request(SbiRequest::delete(uri.as_str())).await?;

        if response.is_success() {
            log::info!("NWDAF [{}] deregistered from NRF", identity.nf_instance_id);
            Ok(())
        } else {
            Err(RegistrationError::Rejected {
                status: response.status,
                body: response.text().to_string(),
            })
        }
    }
}
