//! Token endpoint response decoding.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::error::ExchangeError;
use crate::token::expiration::{parse_expires_in, parse_expires_in_str};
use crate::token::token::{RawFields, Token};
use crate::utils::constants::{CONTENT_TYPE_FORM, CONTENT_TYPE_TEXT, STYLE_REJECTION_CODES};

#[derive(Debug, Deserialize)]
struct TokenJson {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Value,
    // some providers spell it this way
    #[serde(default)]
    expires: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorJson {
    error: Option<String>,
    error_description: Option<String>,
    error_uri: Option<String>,
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| {
            let essence = essence.trim();
            essence.eq_ignore_ascii_case(CONTENT_TYPE_FORM) || essence.eq_ignore_ascii_case(CONTENT_TYPE_TEXT)
        })
        .unwrap_or(false)
}

/// Decode a 2xx body into a [`Token`]. Unknown fields are kept in
/// [`Token::raw`] and otherwise ignored.
pub fn parse_token_response(
    headers: &HeaderMap,
    body: &str,
    now: DateTime<Utc>,
) -> Result<Token, ExchangeError> {
    let token = if is_form_encoded(headers) {
        parse_form_token(body, now)?
    } else {
        parse_json_token(body, now)?
    };

    if token.access_token.is_empty() {
        return Err(ExchangeError::MissingAccessToken);
    }
    debug!(token_type = %token.token_type, expiry = ?token.expiry, "token response parsed");
    Ok(token)
}

fn parse_json_token(body: &str, now: DateTime<Utc>) -> Result<Token, ExchangeError> {
    let members: BTreeMap<String, &RawValue> = serde_json::from_str(body)
        .map_err(|e| ExchangeError::InvalidResponse(format!("body is not a JSON object: {e}")))?;
    let raw: Map<String, Value> = members
        .into_iter()
        .map(|(key, value)| (key, member_value(value)))
        .collect();
    let fields: TokenJson = serde_json::from_value(Value::Object(raw.clone()))
        .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

    let expires_in = match parse_expires_in(&fields.expires_in)? {
        Some(secs) if secs > 0 => secs,
        _ => parse_expires_in(&fields.expires)?.unwrap_or(0),
    };

    let mut token = Token::new(fields.access_token.unwrap_or_default(), fields.token_type.unwrap_or_default())
        .with_expires_in(now, expires_in);
    token.refresh_token = fields.refresh_token.filter(|t| !t.is_empty());
    token.raw = RawFields::Json(raw);
    Ok(token)
}

// A member that is valid JSON but not a representable Value can only be a
// number beyond f64 range; keep its literal so the expiry parser can clamp it.
fn member_value(raw: &RawValue) -> Value {
    serde_json::from_str(raw.get()).unwrap_or_else(|_| Value::String(raw.get().to_owned()))
}

fn parse_form_token(body: &str, now: DateTime<Utc>) -> Result<Token, ExchangeError> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(body.as_bytes()).into_owned().collect();
    let field = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.to_owned())
            .unwrap_or_default()
    };

    let expires_in = match optional_seconds(&field("expires_in"))? {
        Some(secs) if secs > 0 => secs,
        _ => optional_seconds(&field("expires"))?.unwrap_or(0),
    };

    let mut token = Token::new(field("access_token"), field("token_type")).with_expires_in(now, expires_in);
    token.refresh_token = Some(field("refresh_token")).filter(|t| !t.is_empty());
    token.raw = RawFields::Form(pairs);
    Ok(token)
}

// empty form value means the field was not sent
fn optional_seconds(raw: &str) -> Result<Option<i64>, ExchangeError> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_expires_in_str(raw).map(Some)
}

/// Build the error for a non-2xx response, picking up the RFC 6749 error
/// fields when the body carries them.
pub fn server_error(status: StatusCode, headers: &HeaderMap, body: &str) -> ExchangeError {
    let fields = if is_form_encoded(headers) {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(body.as_bytes()).into_owned().collect();
        let field = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.to_owned());
        ErrorJson {
            error: field("error"),
            error_description: field("error_description"),
            error_uri: field("error_uri"),
        }
    } else {
        serde_json::from_str::<ErrorJson>(body).unwrap_or_else(|e| {
            debug!(status = status.as_u16(), error = %e, "error body is not an OAuth2 error object");
            ErrorJson::default()
        })
    };

    ExchangeError::AuthServer {
        status: status.as_u16(),
        body: body.to_owned(),
        error_code: fields.error.filter(|c| !c.is_empty()),
        error_description: fields.error_description,
        error_uri: fields.error_uri,
    }
}

/// Whether a server error says the credentials were placed wrongly, as
/// opposed to the grant being bad.
///
/// 400/401 with `invalid_client`, `unauthorized_client` or
/// `invalid_request`, or a 401 with no recognizable error code.
pub fn is_style_rejection(err: &ExchangeError) -> bool {
    match err {
        ExchangeError::AuthServer { status, error_code, .. } => {
            let status = *status;
            if status != 400 && status != 401 {
                return false;
            }
            match error_code {
                Some(code) => STYLE_REJECTION_CODES.contains(&code.as_str()),
                None => {
                    if status == 401 {
                        warn!("401 without OAuth2 error code, treating as credential placement");
                    }
                    status == 401
                }
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        headers
    }

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        headers
    }

    #[test]
    fn parses_minimal_json_response() {
        let token = parse_token_response(
            &json_headers(),
            r#"{"access_token": "ACCESS_TOKEN", "token_type": "bearer"}"#,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(token.access_token, "ACCESS_TOKEN");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.refresh_token, None);
        assert_eq!(token.expiry, None);
    }

    #[test]
    fn keeps_unknown_fields() {
        let now = Utc::now();
        let token = parse_token_response(
            &json_headers(),
            r#"{"access_token":"a","token_type":"bearer","expires_in":"3600","refresh_token":"r","id_token":"jwt","extra":{"n":1}}"#,
            now,
        )
        .unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("r"));
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(3600)));
        assert_eq!(token.extra("id_token"), Some(json!("jwt")));
        assert_eq!(token.extra("extra"), Some(json!({"n": 1})));
    }

    #[test]
    fn oversized_expiry_is_clamped() {
        let now = Utc::now();
        let token = parse_token_response(
            &json_headers(),
            r#"{"access_token":"a","expires_in":2147483648}"#,
            now,
        )
        .unwrap();
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(2147483647)));
    }

    #[test]
    fn expiry_beyond_f64_range_is_clamped() {
        let now = Utc::now();
        let huge = format!("1{}", "0".repeat(400));

        let bare = format!(r#"{{"access_token":"a","expires_in":{huge}}}"#);
        let token = parse_token_response(&json_headers(), &bare, now).unwrap();
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(2147483647)));

        let quoted = format!(r#"{{"access_token":"a","expires_in":"{huge}"}}"#);
        let token = parse_token_response(&json_headers(), &quoted, now).unwrap();
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(2147483647)));

        let token = parse_token_response(&form_headers(), "access_token=a&expires_in=1e400", now).unwrap();
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(2147483647)));
    }

    #[test]
    fn null_token_type_is_empty() {
        let token = parse_token_response(
            &json_headers(),
            r#"{"access_token":"a","token_type":null,"refresh_token":null}"#,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(token.token_type, "");
        assert_eq!(token.refresh_token, None);
    }

    #[test]
    fn legacy_expires_field() {
        let now = Utc::now();
        let token = parse_token_response(&json_headers(), r#"{"access_token":"a","expires":60}"#, now).unwrap();
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn malformed_expiry_fails_exchange() {
        let err = parse_token_response(&json_headers(), r#"{"access_token":"a","expires_in":-5}"#, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ExchangeError::MalformedExpiry(_)));
    }

    #[test]
    fn missing_access_token() {
        let err = parse_token_response(&json_headers(), r#"{"token_type":"bearer"}"#, Utc::now()).unwrap_err();
        assert!(matches!(err, ExchangeError::MissingAccessToken));
    }

    #[test]
    fn non_object_json_is_invalid() {
        let err = parse_token_response(&json_headers(), "[1,2]", Utc::now()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidResponse(_)));
    }

    #[test]
    fn parses_form_encoded_response() {
        let now = Utc::now();
        let token = parse_token_response(
            &form_headers(),
            "access_token=abc%2Fdef&token_type=bearer&expires_in=120&scope=user",
            now,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc/def");
        assert_eq!(token.expiry, Some(now + chrono::Duration::seconds(120)));
        assert_eq!(token.extra("scope"), Some(json!("user")));
        assert_eq!(token.refresh_token, None);
    }

    #[test]
    fn server_error_reads_oauth_fields() {
        let err = server_error(
            StatusCode::UNAUTHORIZED,
            &json_headers(),
            r#"{"error":"invalid_client","error_description":"bad secret"}"#,
        );
        match &err {
            ExchangeError::AuthServer { status, error_code, error_description, .. } => {
                assert_eq!(*status, 401);
                assert_eq!(error_code.as_deref(), Some("invalid_client"));
                assert_eq!(error_description.as_deref(), Some("bad secret"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(is_style_rejection(&err));
    }

    #[test]
    fn style_rejection_classification() {
        let rejected = |status: u16, body: &str| {
            is_style_rejection(&server_error(StatusCode::from_u16(status).unwrap(), &json_headers(), body))
        };
        assert!(rejected(400, r#"{"error":"invalid_request"}"#));
        assert!(rejected(400, r#"{"error":"unauthorized_client"}"#));
        assert!(rejected(401, "nope"));
        assert!(!rejected(400, r#"{"error":"invalid_grant"}"#));
        assert!(!rejected(400, "plain failure"));
        assert!(!rejected(403, r#"{"error":"invalid_client"}"#));
        assert!(!rejected(500, r#"{"error":"invalid_client"}"#));
        assert!(!is_style_rejection(&ExchangeError::Cancelled));
    }

    #[test]
    fn form_error_body() {
        let err = server_error(StatusCode::BAD_REQUEST, &form_headers(), "error=invalid_client");
        assert!(is_style_rejection(&err));
    }
}
