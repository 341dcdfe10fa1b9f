//! Mock NRF and peer NFs served by `ogs_sbi::SbiServer`

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use ogs_sbi::{SbiRequest, SbiResponse, SbiServer};

/// A request as seen by a mock
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    /// Value of a form field in an `application/x-www-form-urlencoded` body
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.body
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// HTTP/2 server answering every request with a fixed status and body
pub struct MockNf {
    server: SbiServer,
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockNf {
    pub async fn start(status: u16, body: &'static str) -> Self {
        Self::start_with(move |_request| (status, body)).await
    }

    /// Start with a responder choosing status and body per request
    pub async fn start_with<F>(responder: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, &'static str) + Send + Sync + 'static,
    {
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = requests.clone();
        let responder = Arc::new(responder);

        let server = SbiServer::with_addr(SocketAddr::from(([127, 0, 0, 1], 0)));
        let addr = server
            .start(move |request: SbiRequest| {
                let recorder = recorder.clone();
                let responder = responder.clone();
                async move {
                    let recorded = Recorded {
                        method: request.header.method.clone(),
                        path: request.header.path().to_string(),
                        headers: request
                            .http
                            .headers
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect(),
                        body: request.http.content.clone().unwrap_or_default(),
                    };
                    let (status, body) = responder(&recorded);
                    recorder.lock().unwrap().push(recorded);

                    let response = SbiResponse::with_status(status);
                    if body.is_empty() || status == 204 {
                        response
                    } else {
                        response.with_body(body, "application/json")
                    }
                }
            })
            .await
            .unwrap();

        Self {
            server,
            addr,
            requests,
        }
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub async fn stop(&self) {
        self.server.stop().await.unwrap();
    }
}

/// NRF issuing tokens for every scope except `denied_scope`, and accepting
/// NF registration
pub async fn mock_nrf(denied_scope: Option<&'static str>) -> MockNf {
    MockNf::start_with(move |request| match request.path.as_str() {
        "/oauth2/token" => {
            if denied_scope.is_some() && request.form_field("scope") == denied_scope {
                (403, r#"{"error":"invalid_scope"}"#)
            } else {
                (200, r#"{"access_token":"test-token","token_type":"Bearer","expires_in":3600}"#)
            }
        }
        path if path.starts_with("/nnrf-nfm/v1/nf-instances/") => match request.method.as_str() {
            "PUT" => (201, r#"{"nfStatus":"REGISTERED"}"#),
            "DELETE" => (204, ""),
            _ => (405, ""),
        },
        _ => (404, ""),
    })
    .await
}

/// POST raw bytes over HTTP/2 prior knowledge, bypassing `SbiClient`, which
/// only carries text bodies
pub async fn post_raw(addr: SocketAddr, path: &str, body: Vec<u8>) -> (u16, String) {
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper_util::rt::{TokioExecutor, TokioIo};

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) =
        hyper::client::conn::http2::handshake(TokioExecutor::new(), TokioIo::new(stream))
            .await
            .unwrap();
    tokio::spawn(conn);

    let request = hyper::Request::post(format!("http://{addr}{path}"))
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap();
    let response = sender.send_request(request).await.unwrap();
    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).to_string())
}

/// Accepts TCP connections and never answers on them
pub struct SilentNf {
    pub addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl SilentNf {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self { addr, task }
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for SilentNf {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Port nobody listens on
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
