//! Builds the outgoing token request for a resolved auth style.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use url::{form_urlencoded, Url};

use crate::config::styles::{AuthStyle, FormEncodingStyle};
use crate::error::ExchangeError;
use crate::utils::constants::CONTENT_TYPE_FORM;

/// Grant parameters (`grant_type`, `code`, `refresh_token`, ...). Ordered so
/// the encoded form is stable.
pub type FormParams = BTreeMap<String, String>;

#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self { client_id: client_id.into(), client_secret: client_secret.into() }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A fully built request, ready for any [`crate::transport::HttpTransport`].
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` means no body at all
    pub body: Option<String>,
}

impl TokenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded back into pairs; empty when there is no body.
    pub fn form(&self) -> Vec<(String, String)> {
        self.body
            .as_deref()
            .map(|body| form_urlencoded::parse(body.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }
}

/// Build the request for `auth_style`.
///
/// `Unknown` is rejected: the negotiator resolves it before this point.
pub fn build_token_request(
    credentials: &ClientCredentials,
    token_url: &str,
    params: &FormParams,
    auth_style: AuthStyle,
    form_encoding: FormEncodingStyle,
) -> Result<TokenRequest, ExchangeError> {
    let mut url = Url::parse(token_url)
        .map_err(|e| ExchangeError::InvalidRequest(format!("token url '{token_url}': {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let body = match auth_style {
        AuthStyle::Unknown => {
            return Err(ExchangeError::InvalidAuthStyle(
                "unknown auth style must be negotiated before building a request".to_owned(),
            ))
        }
        AuthStyle::InHeader => {
            headers.insert(AUTHORIZATION, basic_auth(credentials)?);
            match form_encoding {
                FormEncodingStyle::Enabled => Some(encode_form(params.iter())),
                FormEncodingStyle::Disabled => {
                    if !params.is_empty() {
                        url.query_pairs_mut().extend_pairs(params.iter());
                    }
                    None
                }
            }
        }
        AuthStyle::InParams => {
            let mut form = params.clone();
            form.insert("client_id".to_owned(), credentials.client_id.clone());
            if !credentials.client_secret.is_empty() {
                form.insert("client_secret".to_owned(), credentials.client_secret.clone());
            }
            Some(encode_form(form.iter()))
        }
    };

    if body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FORM));
    }

    Ok(TokenRequest { method: Method::POST, url, headers, body })
}

// Credentials are used verbatim: no URL escaping before base64.
fn basic_auth(credentials: &ClientCredentials) -> Result<HeaderValue, ExchangeError> {
    let pair = format!("{}:{}", credentials.client_id, credentials.client_secret);
    let encoded = base64::engine::general_purpose::STANDARD.encode(pair);
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| ExchangeError::InvalidRequest(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn encode_form<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
