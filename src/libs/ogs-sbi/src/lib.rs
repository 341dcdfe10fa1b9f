//! NextGCore SBI (Service Based Interface) Library
//!
//! HTTP/2 plumbing shared by the 5G core network functions, built on hyper.
//!
//! # Modules
//!
//! - [`types`] - NF types, service names and URI schemes
//! - [`constants`] - HTTP status codes, methods, headers and content types
//! - [`message`] - SBI request, response and ProblemDetails structures
//! - [`client`] - HTTP/2 client
//! - [`server`] - HTTP/2 server and error response helpers
//! - [`oauth`] - OAuth2 client credentials request/response messages
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use ogs_sbi::{SbiClient, SbiRequest};
//!
//! async fn example() {
//!     let client = SbiClient::with_host_port("127.0.0.10", 8000);
//!     let request = SbiRequest::delete("/nnrf-nfm/v1/nf-instances/nwdaf-1");
//!     let _response = client.send_request(request).await;
//! }
//! ```

pub mod constants;
pub mod error;
pub mod message;
pub mod oauth;
pub mod types;

pub mod client;
pub mod server;

pub use client::{SbiClient, SbiClientConfig};
pub use error::{SbiError, SbiResult};
pub use message::{ProblemDetails, SbiHeader, SbiHttpMessage, SbiRequest, SbiResponse};
pub use oauth::{AccessTokenError, AccessTokenRequest, AccessTokenResponse, TokenResponseError};
pub use server::{
    send_bad_request, send_error, send_internal_error, send_method_not_allowed, send_not_found,
    SbiRequestHandler, SbiServer, SbiServerConfig,
};
pub use types::{NfType, SbiServiceType, UriScheme};
