//! Error types for token exchange.
//!
//! Every failure of an exchange surfaces as one [`ExchangeError`]; there is no
//! partial success.

use thiserror::Error;

/// Errors returned by [`crate::exchange::exchanger::TokenExchanger`] and the
/// helpers it is built from.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// `expires_in` was negative or not a number
    #[error("malformed expiry: {0}")]
    MalformedExpiry(String),

    /// Token endpoint answered with a non-2xx status
    #[error("token endpoint returned {status}: {}", summary(.error_code, .error_description, .body))]
    AuthServer {
        /// HTTP status code
        status: u16,
        /// Raw response body, kept for diagnostics
        body: String,
        /// RFC 6749 `error` field, when present
        error_code: Option<String>,
        /// RFC 6749 `error_description` field, when present
        error_description: Option<String>,
        /// RFC 6749 `error_uri` field, when present
        error_uri: Option<String>,
    },

    /// Caller cancelled before the response was fully read
    #[error("token exchange cancelled")]
    Cancelled,

    /// Network, DNS or TLS failure
    #[error("transport error: {0}")]
    Transport(String),

    /// 2xx response without an `access_token`
    #[error("server response missing access_token")]
    MissingAccessToken,

    /// 2xx response whose body could not be decoded
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The request could not be assembled (bad URL, bad header value)
    #[error("invalid token request: {0}")]
    InvalidRequest(String),

    #[error("invalid auth style: {0}")]
    InvalidAuthStyle(String),

    #[error("invalid form encoding style: {0}")]
    InvalidFormEncodingStyle(String),
}

impl ExchangeError {
    /// Short label used for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ExchangeError::MalformedExpiry(_) => "malformed_expiry",
            ExchangeError::AuthServer { .. } => "auth_server",
            ExchangeError::Cancelled => "cancelled",
            ExchangeError::Transport(_) => "transport",
            ExchangeError::MissingAccessToken => "missing_access_token",
            ExchangeError::InvalidResponse(_) => "invalid_response",
            ExchangeError::InvalidRequest(_) => "invalid_request",
            ExchangeError::InvalidAuthStyle(_) => "invalid_auth_style",
            ExchangeError::InvalidFormEncodingStyle(_) => "invalid_form_encoding_style",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ExchangeError::AuthServer { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn summary(code: &Option<String>, description: &Option<String>, body: &str) -> String {
    match (code, description) {
        (Some(code), Some(description)) => format!("{code}: {description}"),
        (Some(code), None) => code.to_owned(),
        _ => body.to_owned(),
    }
}
