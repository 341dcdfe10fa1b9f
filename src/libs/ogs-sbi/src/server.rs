//! SBI HTTP/2 Server
//!
//! HTTP/2 server that hands every request to an [`SbiRequestHandler`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http2;
use hyper::service::Service;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

use crate::constants::content_type;
use crate::error::{SbiError, SbiResult};
use crate::message::{ProblemDetails, SbiHeader, SbiHttpMessage, SbiRequest, SbiResponse};

/// Server configuration
#[derive(Debug, Clone)]
pub struct SbiServerConfig {
    /// Bind address
    pub addr: SocketAddr,
}

impl Default for SbiServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 7777)),
        }
    }
}

impl SbiServerConfig {
    /// Create a new server configuration
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Create configuration with host and port
    pub fn with_host_port(host: impl AsRef<str>, port: u16) -> SbiResult<Self> {
        let addr: SocketAddr = format!("{}:{}", host.as_ref(), port)
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("Invalid address: {e}")))?;
        Ok(Self::new(addr))
    }
}

/// Request handler trait
pub trait SbiRequestHandler: Send + Sync + 'static {
    /// Handle an incoming SBI request
    fn handle(&self, request: SbiRequest) -> Pin<Box<dyn Future<Output = SbiResponse> + Send>>;
}

/// Function-based request handler
impl<F, Fut> SbiRequestHandler for F
where
    F: Fn(SbiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SbiResponse> + Send + 'static,
{
    fn handle(&self, request: SbiRequest) -> Pin<Box<dyn Future<Output = SbiResponse> + Send>> {
        Box::pin(self(request))
    }
}

/// Hyper service wrapper
struct SbiService<H: SbiRequestHandler> {
    handler: Arc<H>,
}

impl<H: SbiRequestHandler> Clone for SbiService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<H: SbiRequestHandler> Service<Request<Incoming>> for SbiService<H> {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            let response = match convert_request(req).await {
                Ok(sbi_request) => handler.handle(sbi_request).await,
                Err(e) => {
                    log::warn!("Rejecting request: {e}");
                    send_bad_request(&format!("Unreadable request body: {e}"), Some("INVALID_BODY"))
                }
            };
            Ok(convert_response(response))
        })
    }
}

async fn convert_request(req: Request<Incoming>) -> SbiResult<SbiRequest> {
    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let mut http = SbiHttpMessage::new();
    for (key, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            http.set_header(key.to_string(), v.to_string());
        }
    }

    if let Some(query) = req.uri().query() {
        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                http.set_param(key.to_string(), value.to_string());
            }
        }
    }

    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| SbiError::InvalidBody(e.to_string()))?
        .to_bytes();
    if !bytes.is_empty() {
        // JSON payloads must be UTF-8 (RFC 8259)
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|e| SbiError::InvalidBody(format!("body is not UTF-8: {e}")))?;
        http.set_content(content);
    }

    Ok(SbiRequest {
        header: SbiHeader::with_method_uri(method, uri),
        http,
    })
}

fn convert_response(sbi_response: SbiResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(sbi_response.status);

    for (key, value) in &sbi_response.http.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let body = sbi_response
        .http
        .content
        .map(|c| Full::new(Bytes::from(c)))
        .unwrap_or_else(|| Full::new(Bytes::new()));

    builder.body(body).unwrap_or_else(|e| {
        log::error!("Failed to build SBI response: {e}");
        let mut fallback = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

enum ServerState {
    Stopped,
    Running(oneshot::Sender<()>),
}

/// SBI Server - HTTP/2 server for SBI communication
pub struct SbiServer {
    config: SbiServerConfig,
    state: Arc<Mutex<ServerState>>,
}

impl SbiServer {
    /// Create a new SBI server
    pub fn new(config: SbiServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ServerState::Stopped)),
        }
    }

    /// Create a server with address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self::new(SbiServerConfig::new(addr))
    }

    /// Get the server configuration
    pub fn config(&self) -> &SbiServerConfig {
        &self.config
    }

    /// Bind and start serving in a background task.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    pub async fn start<H: SbiRequestHandler>(&self, handler: H) -> SbiResult<SocketAddr> {
        let mut state = self.state.lock().await;

        if matches!(*state, ServerState::Running(_)) {
            return Err(SbiError::ServerError("Server already running".to_string()));
        }

        let listener = TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| SbiError::ServerError(format!("Failed to bind {}: {e}", self.config.addr)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        *state = ServerState::Running(shutdown_tx);
        drop(state);

        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer)) => {
                                let io = TokioIo::new(stream);
                                let service = SbiService {
                                    handler: handler.clone(),
                                };

                                tokio::spawn(async move {
                                    if let Err(e) = http2::Builder::new(
                                        hyper_util::rt::TokioExecutor::new()
                                    )
                                    .serve_connection(io, service)
                                    .await
                                    {
                                        log::debug!("HTTP/2 connection from {peer} ended: {e}");
                                    }
                                });
                            }
                            Err(e) => {
                                log::warn!("Accept error: {e}");
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
            log::debug!("SBI server on {local_addr} stopped accepting");
        });

        Ok(local_addr)
    }

    /// Stop accepting connections
    pub async fn stop(&self) -> SbiResult<()> {
        let mut state = self.state.lock().await;

        if let ServerState::Running(shutdown_tx) = std::mem::replace(&mut *state, ServerState::Stopped) {
            let _ = shutdown_tx.send(());
        }

        Ok(())
    }

    /// Check if the server is running
    pub async fn is_running(&self) -> bool {
        let state = self.state.lock().await;
        matches!(*state, ServerState::Running(_))
    }
}

/// Build a ProblemDetails error response
pub fn send_error(status: u16, title: &str, detail: &str, cause: Option<&str>) -> SbiResponse {
    let problem = ProblemDetails::with_status(status as i32)
        .with_title(title)
        .with_detail(detail);

    let problem = if let Some(c) = cause {
        problem.with_cause(c)
    } else {
        problem
    };

    match serde_json::to_string(&problem) {
        Ok(json) => SbiResponse::with_status(status).with_body(json, content_type::PROBLEM_JSON),
        Err(_) => SbiResponse::with_status(status),
    }
}

/// Send a 400 Bad Request error response
pub fn send_bad_request(detail: &str, cause: Option<&str>) -> SbiResponse {
    send_error(400, "Bad Request", detail, cause)
}

/// Send a 404 Not Found error response
pub fn send_not_found(detail: &str, cause: Option<&str>) -> SbiResponse {
    send_error(404, "Not Found", detail, cause)
}

/// Send a 405 Method Not Allowed error response
pub fn send_method_not_allowed(method: &str, resource: &str) -> SbiResponse {
    send_error(
        405,
        "Method Not Allowed",
        &format!("Method {method} not allowed for resource {resource}"),
        Some("METHOD_NOT_ALLOWED"),
    )
}

/// Send a 500 Internal Server Error response
pub fn send_internal_error(detail: &str) -> SbiResponse {
    send_error(500, "Internal Server Error", detail, Some("INTERNAL_ERROR"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SbiClient;

    #[test]
    fn test_server_config() {
        let config = SbiServerConfig::with_host_port("0.0.0.0", 8001).unwrap();
        assert_eq!(config.addr.port(), 8001);
        assert!(SbiServerConfig::with_host_port("not an ip", 8001).is_err());
    }

    #[test]
    fn test_send_error() {
        let response = send_error(404, "Not Found", "Resource not found", Some("NOT_FOUND"));
        assert_eq!(response.status, 404);
        let problem: ProblemDetails = response.json_body().unwrap();
        assert_eq!(problem.status, Some(404));
        assert_eq!(problem.cause.as_deref(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_start_stop_roundtrip() {
        let server = SbiServer::with_addr(SocketAddr::from(([127, 0, 0, 1], 0)));
        let addr = server
            .start(|request: SbiRequest| async move {
                let echo = request.http.get_header("NF-Type").cloned().unwrap_or_default();
                SbiResponse::ok().with_body(echo, "text/plain")
            })
            .await
            .unwrap();
        assert_ne!(addr.port(), 0);
        assert!(server.is_running().await);

        let client = SbiClient::with_host_port("127.0.0.1", addr.port());
        let response = client
            .send_request(SbiRequest::get("/echo").with_header("NF-Type", "NWDAF"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "NWDAF");

        server.stop().await.unwrap();
        assert!(!server.is_running().await);
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let server = SbiServer::with_addr(SocketAddr::from(([127, 0, 0, 1], 0)));
        server
            .start(|_request: SbiRequest| async { SbiResponse::no_content() })
            .await
            .unwrap();
        let second = server
            .start(|_request: SbiRequest| async { SbiResponse::no_content() })
            .await;
        assert!(second.is_err());
        server.stop().await.unwrap();
    }
}
