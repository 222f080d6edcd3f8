use chrono::Utc;
use reqwest::Client;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::cache::auth_style_cache::{get_auth_style_cache, AuthStyleCache};
use crate::config::styles::{AuthStyle, FormEncodingStyle};
use crate::error::ExchangeError;
use crate::exchange::negotiator::{negotiate, AttemptError};
use crate::exchange::request::{build_token_request, ClientCredentials, FormParams};
use crate::exchange::response::{is_style_rejection, parse_token_response, server_error};
use crate::observability::metrics::get_metrics;
use crate::token::token::Token;
use crate::transport::{shared_client, HttpTransport};

/// Everything needed for one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub credentials: ClientCredentials,
    pub token_url: String,
    pub params: FormParams,
    pub auth_style: AuthStyle,
    pub form_encoding: FormEncodingStyle,
}

impl ExchangeRequest {
    pub fn new(credentials: ClientCredentials, token_url: impl Into<String>) -> Self {
        Self {
            credentials,
            token_url: token_url.into(),
            params: FormParams::new(),
            auth_style: AuthStyle::Unknown,
            form_encoding: FormEncodingStyle::Enabled,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn auth_style(mut self, auth_style: AuthStyle) -> Self {
        self.auth_style = auth_style;
        self
    }

    pub fn form_encoding(mut self, form_encoding: FormEncodingStyle) -> Self {
        self.form_encoding = form_encoding;
        self
    }
}

/// Exchanges a grant for a token against one transport and style cache.
#[derive(Debug, Clone)]
pub struct TokenExchanger<T = Client> {
    transport: T,
    cache: AuthStyleCache,
}

impl TokenExchanger<Client> {
    /// Shared reqwest client and the process-wide style cache.
    pub async fn shared() -> Self {
        Self::new(shared_client().clone(), get_auth_style_cache().await.clone())
    }
}

impl<T: HttpTransport> TokenExchanger<T> {
    pub fn new(transport: T, cache: AuthStyleCache) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &AuthStyleCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the exchange. Returns [`ExchangeError::Cancelled`] as soon as
    /// `cancel` fires, even with a request in flight.
    pub async fn exchange(
        &self,
        cancel: &CancellationToken,
        request: &ExchangeRequest,
    ) -> Result<Token, ExchangeError> {
        let started = Instant::now();
        let metrics = get_metrics();

        let result = negotiate(&self.cache, &request.token_url, request.auth_style, move |style| {
            self.attempt(cancel, request, style)
        })
        .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => {
                metrics.exchange_failures.with_label_values(&[e.reason()]).inc();
                error!(token_url = %request.token_url, reason = e.reason(), error = %e, "token exchange failed");
                "failure"
            }
        };
        metrics
            .exchange_duration
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
        result
    }

    async fn attempt(
        &self,
        cancel: &CancellationToken,
        request: &ExchangeRequest,
        style: AuthStyle,
    ) -> Result<Token, AttemptError> {
        if cancel.is_cancelled() {
            return Err(AttemptError::Fatal(ExchangeError::Cancelled));
        }

        let http_request = build_token_request(
            &request.credentials,
            &request.token_url,
            &request.params,
            style,
            request.form_encoding,
        )
        .map_err(AttemptError::Fatal)?;

        get_metrics()
            .exchange_attempts
            .with_label_values(&[style.as_str()])
            .inc();
        debug!(token_url = %request.token_url, auth_style = %style, "token exchange attempt");

        // dropping the send future aborts the connection
        let response = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(AttemptError::Fatal(ExchangeError::Cancelled)),
            response = self.transport.send(http_request) => response.map_err(AttemptError::Fatal)?,
        };

        if !response.status.is_success() {
            let err = server_error(response.status, &response.headers, &response.body);
            return Err(if is_style_rejection(&err) {
                AttemptError::StyleRejected(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        parse_token_response(&response.headers, &response.body, Utc::now()).map_err(AttemptError::Fatal)
    }
}

/// Exchange a grant for a token using the shared client and the process-wide
/// auth style cache.
pub async fn retrieve_token(
    cancel: &CancellationToken,
    client_id: &str,
    client_secret: &str,
    token_url: &str,
    params: FormParams,
    auth_style: AuthStyle,
    form_encoding: FormEncodingStyle,
) -> Result<Token, ExchangeError> {
    let request = ExchangeRequest {
        credentials: ClientCredentials::new(client_id, client_secret),
        token_url: token_url.to_owned(),
        params,
        auth_style,
        form_encoding,
    };
    TokenExchanger::shared().await.exchange(cancel, &request).await
}
