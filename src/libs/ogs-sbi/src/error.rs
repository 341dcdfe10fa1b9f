//! SBI Error Types
//!
//! Transport-level failures of the SBI client and server.

use thiserror::Error;

/// SBI Error type
#[derive(Error, Debug)]
pub enum SbiError {
    /// HTTP/2 connection error
    #[error("HTTP/2 connection error: {0}")]
    ConnectionError(String),

    /// Connect or request deadline expired
    #[error("Request timeout")]
    Timeout,

    /// Invalid URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// Client error
    #[error("Client error: {0}")]
    ClientError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Hyper error
    #[error("Hyper error: {0}")]
    HyperError(String),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request body that cannot be carried as text
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl SbiError {
    /// Status code to report when this error has to be turned into a response
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Timeout => 504,
            Self::InvalidUri(_)
            | Self::InvalidMethod(_)
            | Self::InvalidBody(_)
            | Self::SerializationError(_) => 400,
            Self::ConnectionError(_) | Self::HyperError(_) | Self::InvalidResponse(_) => 502,
            _ => 500,
        }
    }

    /// True when the failure happened before any byte reached the peer
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::IoError(_))
    }
}

/// Result type for SBI operations
pub type SbiResult<T> = Result<T, SbiError>;
