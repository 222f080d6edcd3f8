//! HTTP transport seam.
//!
//! The exchanger only needs "send this request, give me status, headers and
//! body". Connection pooling, TLS and proxies belong to the implementation.

use std::future::Future;
use std::sync::OnceLock;

use http::{HeaderMap, StatusCode};
use reqwest::Client;
use tracing::debug;

use crate::error::ExchangeError;
use crate::exchange::request::TokenRequest;

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Process-wide reqwest client used by [`crate::retrieve_token`].
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(Client::new)
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub trait HttpTransport: Send + Sync {
    /// Issue one request and read the whole body. Dropping the returned
    /// future must abort the request.
    fn send(
        &self,
        request: TokenRequest,
    ) -> impl Future<Output = Result<TransportResponse, ExchangeError>> + Send;
}

impl HttpTransport for Client {
    async fn send(&self, request: TokenRequest) -> Result<TransportResponse, ExchangeError> {
        // the query may carry grant parameters
        debug!(
            host = request.url.host_str().unwrap_or_default(),
            path = request.url.path(),
            method = %request.method,
            "sending token request"
        );
        let mut builder = self
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(transport_error)?;

        Ok(TransportResponse { status, headers, body })
    }
}

fn transport_error(e: reqwest::Error) -> ExchangeError {
    ExchangeError::Transport(e.without_url().to_string())
}
