//! NWDAF Lifecycle State Machine
//!
//! Startup: register with the NRF, start the notification server, wait a
//! grace delay, then subscribe to every peer concurrently. Shutdown:
//! deregister, then stop the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ogs_sbi::{NfType, SbiRequest, SbiServer, SbiServiceType};

use crate::config::{ConfigError, NwdafConfig};
use crate::context::SelfIdentity;
use crate::error::{AuthError, LifecycleError, RegistrationError};
use crate::peer::PeerType;
use crate::sbi_handler::NotificationRouter;
use crate::sbi_path::{NfRegistry, NrfRegistry};
use crate::store::{InMemoryReportStore, ReportStore};
use crate::subscription::{StartupReport, SubscriptionManager};
use crate::token::{NrfTokenBroker, TokenBroker};

/// NWDAF lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NwdafState {
    Uninitialized,
    Registered,
    Serving,
    SubscribingPeers,
    Running,
    Terminating,
    Terminated,
}

/// Errors building the lifecycle context from configuration
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("token broker: {0}")]
    TokenBroker(#[from] AuthError),

    #[error("NRF client: {0}")]
    Registry(#[from] RegistrationError),
}

/// NWDAF state machine context
pub struct NwdafSmContext {
    state: NwdafState,
    identity: Arc<SelfIdentity>,
    registry: Arc<dyn NfRegistry>,
    tokens: Arc<dyn TokenBroker>,
    subscriptions: Arc<SubscriptionManager>,
    router: Arc<NotificationRouter>,
    server: SbiServer,
    subscribe_delay: Duration,
    peers: Vec<PeerType>,
    local_addr: Option<SocketAddr>,
    startup_report: Option<StartupReport>,
}

impl NwdafSmContext {
    pub fn new(
        identity: Arc<SelfIdentity>,
        registry: Arc<dyn NfRegistry>,
        tokens: Arc<dyn TokenBroker>,
        subscriptions: Arc<SubscriptionManager>,
        router: Arc<NotificationRouter>,
        bind_addr: SocketAddr,
    ) -> Self {
        Self {
            state: NwdafState::Uninitialized,
            identity,
            registry,
            tokens,
            subscriptions,
            router,
            server: SbiServer::with_addr(bind_addr),
            subscribe_delay: Duration::from_secs(1),
            peers: PeerType::ALL.to_vec(),
            local_addr: None,
            startup_report: None,
        }
    }

    /// Wire the NRF backed components and an in-memory report store
    pub fn from_config(config: &NwdafConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let identity = Arc::new(SelfIdentity::from_config(config));
        let tokens: Arc<dyn TokenBroker> =
            Arc::new(NrfTokenBroker::new(&config.nrf_uri, config.request_timeout())?);
        let registry: Arc<dyn NfRegistry> =
            Arc::new(NrfRegistry::new(&config.nrf_uri, config.request_timeout())?);
        let store: Arc<dyn ReportStore> = Arc::new(InMemoryReportStore::new());

        let subscriptions = SubscriptionManager::new(
            identity.clone(),
            Arc::new(config.peers.directory()),
            tokens.clone(),
        )
        .with_smf_profile(config.smf_event_profile)
        .with_request_timeout(config.request_timeout());

        Ok(Self::new(
            identity,
            registry,
            tokens,
            Arc::new(subscriptions),
            Arc::new(NotificationRouter::new(store)),
            config.sbi.bind_addr()?,
        )
        .with_subscribe_delay(config.subscribe_delay()))
    }

    pub fn with_subscribe_delay(mut self, delay: Duration) -> Self {
        self.subscribe_delay = delay;
        self
    }

    /// Restrict the peers subscribed to at startup
    pub fn with_peers(mut self, peers: &[PeerType]) -> Self {
        self.peers = peers.to_vec();
        self
    }

    /// Get current state
    pub fn state(&self) -> NwdafState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == NwdafState::Running
    }

    pub fn identity(&self) -> &SelfIdentity {
        &self.identity
    }

    /// Address the notification server is bound to, once serving
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn startup_report(&self) -> Option<&StartupReport> {
        self.startup_report.as_ref()
    }

    fn transition(&mut self, to: NwdafState) {
        log::info!("NWDAF SM: {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    fn expect_state(&self, expected: NwdafState, operation: &'static str) -> Result<(), LifecycleError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LifecycleError::InvalidState {
                state: self.state,
                operation,
            })
        }
    }

    /// Run the whole startup sequence up to `Running`
    pub async fn start(&mut self) -> Result<&StartupReport, LifecycleError> {
        self.expect_state(NwdafState::Uninitialized, "start")?;
        self.register().await?;
        self.serve().await?;
        self.subscribe_peers().await
    }

    /// Uninitialized -> Registered
    pub async fn register(&mut self) -> Result<(), LifecycleError> {
        self.expect_state(NwdafState::Uninitialized, "register")?;

        let credential = if self.identity.token_required {
            match self
                .tokens
                .acquire(
                    &self.identity.nf_instance_id,
                    NfType::Nrf,
                    None,
                    SbiServiceType::NnrfNfm.to_name(),
                )
                .await
            {
                Ok(credential) => Some(credential),
                Err(e) => {
                    log::warn!("Registering without access token: {e}");
                    None
                }
            }
        } else {
            None
        };

        if let Err(e) = self.registry.register(&self.identity, credential.as_ref()).await {
            log::error!("Failed to register with NRF: {e}");
            return Err(e.into());
        }

        self.transition(NwdafState::Registered);
        Ok(())
    }

    /// Registered -> Serving
    pub async fn serve(&mut self) -> Result<SocketAddr, LifecycleError> {
        self.expect_state(NwdafState::Registered, "serve")?;

        let router = self.router.clone();
        let addr = self
            .server
            .start(move |request: SbiRequest| {
                let router = router.clone();
                async move { router.handle(request).await }
            })
            .await
            .map_err(LifecycleError::Server)?;

        log::info!("NWDAF notification server listening on {addr}");
        self.local_addr = Some(addr);
        self.transition(NwdafState::Serving);
        Ok(addr)
    }

    /// Serving -> SubscribingPeers -> Running
    pub async fn subscribe_peers(&mut self) -> Result<&StartupReport, LifecycleError> {
        self.expect_state(NwdafState::Serving, "subscribe to peers")?;

        if !self.subscribe_delay.is_zero() {
            log::debug!("Waiting {:?} before subscribing", self.subscribe_delay);
            tokio::time::sleep(self.subscribe_delay).await;
        }

        self.transition(NwdafState::SubscribingPeers);
        let report = self.subscriptions.subscribe_all(&self.peers).await;
        if !report.healthy() {
            log::warn!(
                "NWDAF running with {} of {} peer subscriptions failed",
                report.failed(),
                report.outcomes().len()
            );
        }

        self.transition(NwdafState::Running);
        Ok(self.startup_report.insert(report))
    }

    /// Deregister and stop serving. Deregistration failures are logged only.
    pub async fn terminate(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            NwdafState::Terminating | NwdafState::Terminated => {
                return Err(LifecycleError::InvalidState {
                    state: self.state,
                    operation: "terminate",
                })
            }
            NwdafState::Uninitialized => {
                self.transition(NwdafState::Terminated);
                return Ok(());
            }
            _ => {}
        }

        self.transition(NwdafState::Terminating);

        if let Err(e) = self.registry.deregister(&self.identity).await {
            log::warn!("NRF deregistration failed: {e}");
        }

        if let Err(e) = self.server.stop().await {
            log::warn!("Failed to stop notification server: {e}");
        }
        self.local_addr = None;

        self.transition(NwdafState::Terminated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::StaticPeerDirectory;
    use crate::token::Credential;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockRegistry {
        fail_register: bool,
        fail_deregister: bool,
        registered: AtomicUsize,
        with_token: AtomicUsize,
        deregistered: AtomicUsize,
    }

    #[async_trait]
    impl NfRegistry for MockRegistry {
        async fn register(
            &self,
            _identity: &SelfIdentity,
            credential: Option<&Credential>,
        ) -> Result<(), RegistrationError> {
            self.registered.fetch_add(1, Ordering::SeqCst);
            if credential.is_some() {
                self.with_token.fetch_add(1, Ordering::SeqCst);
            }
            if self.fail_register {
                return Err(RegistrationError::Rejected {
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(())
        }

        async fn deregister(&self, _identity: &SelfIdentity) -> Result<(), RegistrationError> {
            self.deregistered.fetch_add(1, Ordering::SeqCst);
            if self.fail_deregister {
                return Err(RegistrationError::Rejected {
                    status: 404,
                    body: String::new(),
                });
            }
            Ok(())
        }
    }

    struct FixedBroker {
        fail: bool,
    }

    #[async_trait]
    impl TokenBroker for FixedBroker {
        async fn acquire(
            &self,
            _requester: &str,
            _target: NfType,
            _target_instance_id: Option<&str>,
            _scope: &str,
        ) -> Result<Credential, AuthError> {
            if self.fail {
                Err(AuthError::MissingRegistry)
            } else {
                Ok(Credential::new("tok"))
            }
        }
    }

    fn context(registry: Arc<MockRegistry>, token_required: bool, broker_fails: bool) -> NwdafSmContext {
        let identity = Arc::new(
            SelfIdentity::new("nwdaf-1", "http://127.0.0.10:8000").with_token_required(token_required),
        );
        let tokens: Arc<dyn TokenBroker> = Arc::new(FixedBroker { fail: broker_fails });
        let subscriptions = Arc::new(SubscriptionManager::new(
            identity.clone(),
            Arc::new(StaticPeerDirectory::new()),
            tokens.clone(),
        ));
        let router = Arc::new(NotificationRouter::new(Arc::new(InMemoryReportStore::new())));
        NwdafSmContext::new(
            identity,
            registry,
            tokens,
            subscriptions,
            router,
            SocketAddr::from(([127, 0, 0, 1], 0)),
        )
        .with_subscribe_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_registration_failure_halts_startup() {
        let registry = Arc::new(MockRegistry {
            fail_register: true,
            ..Default::default()
        });
        let mut sm = context(registry.clone(), false, false);

        let err = sm.start().await.unwrap_err();
        assert!(matches!(err, LifecycleError::Registration(_)));
        assert_eq!(sm.state(), NwdafState::Uninitialized);
        assert!(sm.local_addr().is_none());
        assert!(sm.startup_report().is_none());
    }

    #[tokio::test]
    async fn test_start_reaches_running_despite_peer_failures() {
        let registry = Arc::new(MockRegistry::default());
        let mut sm = context(registry.clone(), false, false);

        let report = sm.start().await.unwrap();
        assert_eq!(report.failed(), 3);
        assert!(!report.healthy());
        assert!(sm.is_running());
        assert!(sm.local_addr().is_some());
        assert_eq!(registry.with_token.load(Ordering::SeqCst), 0);

        assert!(matches!(
            sm.start().await,
            Err(LifecycleError::InvalidState { state: NwdafState::Running, .. })
        ));

        sm.terminate().await.unwrap();
        assert_eq!(sm.state(), NwdafState::Terminated);
        assert_eq!(registry.deregistered.load(Ordering::SeqCst), 1);
        assert!(sm.terminate().await.is_err());
    }

    #[tokio::test]
    async fn test_token_attached_when_required() {
        let registry = Arc::new(MockRegistry::default());
        let mut sm = context(registry.clone(), true, false);
        sm.register().await.unwrap();
        assert_eq!(registry.with_token.load(Ordering::SeqCst), 1);
        assert_eq!(sm.state(), NwdafState::Registered);
    }

    #[tokio::test]
    async fn test_token_failure_registers_without_token() {
        let registry = Arc::new(MockRegistry::default());
        let mut sm = context(registry.clone(), true, true);
        sm.register().await.unwrap();
        assert_eq!(registry.registered.load(Ordering::SeqCst), 1);
        assert_eq!(registry.with_token.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_order_steps() {
        let registry = Arc::new(MockRegistry::default());
        let mut sm = context(registry, false, false);
        assert!(matches!(
            sm.serve().await,
            Err(LifecycleError::InvalidState { state: NwdafState::Uninitialized, .. })
        ));
        assert!(sm.subscribe_peers().await.is_err());
    }

    #[tokio::test]
    async fn test_deregistration_failure_not_fatal() {
        let registry = Arc::new(MockRegistry {
            fail_deregister: true,
            ..Default::default()
        });
        let mut sm = context(registry.clone(), false, false);
        sm.register().await.unwrap();
        sm.serve().await.unwrap();

        sm.terminate().await.unwrap();
        assert_eq!(sm.state(), NwdafState::Terminated);
        assert_eq!(registry.deregistered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_terminate_before_start() {
        let registry = Arc::new(MockRegistry::default());
        let mut sm = context(registry.clone(), false, false);
        sm.terminate().await.unwrap();
        assert_eq!(sm.state(), NwdafState::Terminated);
        assert_eq!(registry.deregistered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let sm = NwdafSmContext::from_config(&NwdafConfig::default()).unwrap();
        assert_eq!(sm.state(), NwdafState::Uninitialized);
        assert_eq!(sm.peers.len(), 3);
        assert_eq!(sm.subscribe_delay, Duration::from_secs(1));

        let config = NwdafConfig {
            nrf_uri: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            NwdafSmContext::from_config(&config),
            Err(SetupError::TokenBroker(AuthError::MissingRegistry))
        ));

        let mut config = NwdafConfig::default();
        config.sbi.scheme = ogs_sbi::UriScheme::Https;
        assert!(matches!(
            NwdafSmContext::from_config(&config),
            Err(SetupError::Config(ConfigError::UnsupportedScheme { .. }))
        ));
    }
}
