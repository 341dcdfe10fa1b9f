//! NextGCore NWDAF (Network Data Analytics Function)
//!
//! Event collection side of the NWDAF (TS 23.288):
//! - NRF registration and OAuth2 token acquisition
//! - Event exposure subscriptions with the AMF, SMF and UDM
//! - Notification endpoints that classify and store peer reports

pub mod config;
pub mod context;
pub mod error;
pub mod notification;
pub mod nwdaf_sm;
pub mod peer;
pub mod sbi_handler;
pub mod sbi_path;
pub mod store;
pub mod subscription;
pub mod token;


pub use config::{ConfigError, NwdafConfig, PeersConfig, SbiConfig};
pub use context::{SelfIdentity, DEFAULT_SBI_PORT, NOTIFICATION_API_ROOT};
pub use error::{
    AuthError, DiscoveryError, LifecycleError, NotificationError, RegistrationError, StoreError,
    SubscriptionError,
};
pub use notification::{LocationReport, NotificationEnvelope, RatType, SmfEvent, UdmEeEvent};
pub use nwdaf_sm::{NwdafSmContext, NwdafState, SetupError};
pub use peer::{PeerAddress, PeerDescriptor, PeerDirectory, PeerType, StaticPeerDirectory};
pub use sbi_handler::{NotificationRouter, NotificationSurface};
pub use sbi_path::{NfRegistry, NrfRegistry};
pub use store::{InMemoryReportStore, ReportKey, ReportKind, ReportStore, StoredReport};
pub use subscription::{
    SmfEventProfile, StartupReport, SubscriptionAck, SubscriptionBody, SubscriptionManager,
};
pub use token::{Credential, NrfTokenBroker, TokenBroker};
