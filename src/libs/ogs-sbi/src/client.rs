//! SBI HTTP/2 Client
//!
//! HTTP/2 (prior knowledge) client used for NRF and peer NF requests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::http2::SendRequest;
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::{SbiError, SbiResult};
use crate::message::{SbiRequest, SbiResponse};
use crate::types::UriScheme;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT: u64 = 5;
/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// SBI Client configuration
#[derive(Debug, Clone)]
pub struct SbiClientConfig {
    /// URI scheme
    pub scheme: UriScheme,
    /// Target host (FQDN or IP)
    pub host: String,
    /// Target port
    pub port: u16,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout, covering send and body collection
    pub request_timeout: Duration,
}

impl Default for SbiClientConfig {
    fn default() -> Self {
        Self {
            scheme: UriScheme::Http,
            host: "localhost".to_string(),
            port: 80,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl SbiClientConfig {
    /// Create a new client configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Derive host and port from an absolute URI such as
    /// `http://127.0.0.18:8000/namf-evts/v1`. The path is ignored.
    pub fn from_uri(uri: &str) -> SbiResult<Self> {
        let parsed: Uri = uri
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{uri}: {e}")))?;

        let scheme = match parsed.scheme_str() {
            Some("http") => UriScheme::Http,
            Some("https") => {
                return Err(SbiError::InvalidUri(format!(
                    "{uri}: https is not supported by this client"
                )))
            }
            _ => return Err(SbiError::InvalidUri(format!("{uri}: missing http scheme"))),
        };
        let host = parsed
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SbiError::InvalidUri(format!("{uri}: missing host")))?;
        let port = parsed.port_u16().unwrap_or_else(|| scheme.default_port());

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            ..Default::default()
        })
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the base URI
    pub fn base_uri(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// SBI Client - HTTP/2 client for SBI communication
pub struct SbiClient {
    config: SbiClientConfig,
    /// Lazily established connection, reused while ready
    connection: Arc<Mutex<Option<SendRequest<Full<Bytes>>>>>,
}

impl SbiClient {
    /// Create a new SBI client
    pub fn new(config: SbiClientConfig) -> Self {
        Self {
            config,
            connection: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a client with host and port
    pub fn with_host_port(host: impl Into<String>, port: u16) -> Self {
        Self::new(SbiClientConfig::new(host, port))
    }

    /// Create a client for the authority of an absolute URI
    pub fn from_uri(uri: &str) -> SbiResult<Self> {
        Ok(Self::new(SbiClientConfig::from_uri(uri)?))
    }

    /// Get the client configuration
    pub fn config(&self) -> &SbiClientConfig {
        &self.config
    }

    async fn connect(&self) -> SbiResult<SendRequest<Full<Bytes>>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SbiError::Timeout)?
            .map_err(|e| SbiError::ConnectionError(format!("{addr}: {e}")))?;

        let io = TokioIo::new(stream);
        let (sender, conn) =
            hyper::client::conn::http2::handshake(hyper_util::rt::TokioExecutor::new(), io)
                .await
                .map_err(|e| SbiError::ConnectionError(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::debug!("HTTP/2 client connection closed: {e}");
            }
        });

        Ok(sender)
    }

    async fn get_connection(&self) -> SbiResult<SendRequest<Full<Bytes>>> {
        let mut conn_guard = self.connection.lock().await;

        if let Some(ref sender) = *conn_guard {
            if sender.is_ready() {
                return Ok(sender.clone());
            }
        }

        let sender = self.connect().await?;
        *conn_guard = Some(sender.clone());
        Ok(sender)
    }

    /// Send an SBI request and receive a response
    pub async fn send_request(&self, request: SbiRequest) -> SbiResult<SbiResponse> {
        let mut sender = self.get_connection().await?;

        let uri_str = if request.header.uri.starts_with("http") {
            request.header.uri.clone()
        } else {
            format!("{}{}", self.config.base_uri(), request.header.uri)
        };

        let uri_with_params = if request.http.params.is_empty() {
            uri_str
        } else {
            let params: Vec<String> = request
                .http
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            format!("{}?{}", uri_str, params.join("&"))
        };

        let uri: Uri = uri_with_params
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{uri_with_params}: {e}")))?;

        let method = match request.header.method.to_uppercase().as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            other => return Err(SbiError::InvalidMethod(other.to_string())),
        };

        let body = request
            .http
            .content
            .map(|c| Full::new(Bytes::from(c)))
            .unwrap_or_else(|| Full::new(Bytes::new()));

        let mut req_builder = Request::builder().method(method).uri(uri);
        for (key, value) in &request.http.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        let http_request = req_builder
            .body(body)
            .map_err(|e| SbiError::ClientError(e.to_string()))?;

        tokio::time::timeout(self.config.request_timeout, async move {
            let response = sender
                .send_request(http_request)
                .await
                .map_err(|e| SbiError::HyperError(e.to_string()))?;
            convert_response(response).await
        })
        .await
        .map_err(|_| SbiError::Timeout)?
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::get(path)).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: serde::Serialize>(&self, path: &str, body: &T) -> SbiResult<SbiResponse> {
        let request = SbiRequest::post(path).with_json_body(body)?;
        self.send_request(request).await
    }

    /// Send a PUT request with JSON body
    pub async fn put_json<T: serde::Serialize>(&self, path: &str, body: &T) -> SbiResult<SbiResponse> {
        let request = SbiRequest::put(path).with_json_body(body)?;
        self.send_request(request).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, path: &str) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::delete(path)).await
    }

    /// Drop the cached connection
    pub async fn close(&self) {
        let mut conn_guard = self.connection.lock().await;
        *conn_guard = None;
    }
}

async fn convert_response(response: hyper::Response<Incoming>) -> SbiResult<SbiResponse> {
    let status = response.status().as_u16();

    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(key.to_string(), v.to_string());
        }
    }

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| SbiError::InvalidResponse(e.to_string()))?
        .to_bytes();

    let mut sbi_response = SbiResponse::with_status(status);
    sbi_response.http.headers = headers;
    if !body_bytes.is_empty() {
        sbi_response.http.content = Some(String::from_utf8_lossy(&body_bytes).to_string());
    }

    Ok(sbi_response)
}
