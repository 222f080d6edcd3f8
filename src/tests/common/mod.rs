// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use reqwest::Client;

use crate::error::ExchangeError;
use crate::exchange::request::TokenRequest;
use crate::transport::{HttpTransport, TransportResponse};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub const OK_BODY: &str = r#"{"access_token": "ACCESS_TOKEN", "token_type": "bearer"}"#;
pub const INVALID_CLIENT_BODY: &str = r#"{"error": "invalid_client"}"#;

pub fn json_response(status: u16, body: &str) -> TransportResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    TransportResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers,
        body: body.to_owned(),
    }
}

type Responder = dyn Fn(&TokenRequest) -> Result<TransportResponse, ExchangeError> + Send + Sync;

/// In-memory transport that records every request and answers from a closure.
#[derive(Clone)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<TokenRequest>>>,
    responder: Arc<Responder>,
}

impl RecordingTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&TokenRequest) -> Result<TransportResponse, ExchangeError> + Send + Sync + 'static,
    {
        Self { requests: Arc::new(Mutex::new(Vec::new())), responder: Arc::new(responder) }
    }

    /// Accepts only credentials in the form body, like many older providers.
    pub fn params_only() -> Self {
        Self::new(|request| {
            if request.header("authorization").is_some() {
                Ok(json_response(401, INVALID_CLIENT_BODY))
            } else {
                Ok(json_response(200, OK_BODY))
            }
        })
    }

    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpTransport for RecordingTransport {
    async fn send(&self, request: TokenRequest) -> Result<TransportResponse, ExchangeError> {
        let response = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}
