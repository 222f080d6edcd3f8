use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::utils::constants::EXPIRY_DELTA_SECONDS;

/// Raw response fields, kept so callers can read provider-specific extras
/// such as `id_token` or `scope`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawFields {
    Json(Map<String, Value>),
    Form(Vec<(String, String)>),
}

impl RawFields {
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            RawFields::Json(map) => map.get(key).cloned(),
            RawFields::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| Value::String(v.to_owned())),
        }
    }
}

impl Default for RawFields {
    fn default() -> Self {
        RawFields::Json(Map::new())
    }
}

/// Result of a successful exchange. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    /// `None` when the server did not say
    pub expiry: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub raw: RawFields,
}

impl Token {
    pub fn new(access_token: String, token_type: String) -> Self {
        Self {
            access_token,
            token_type,
            refresh_token: None,
            expiry: None,
            raw: RawFields::default(),
        }
    }

    /// Set the expiry `expires_in` seconds after `now`. `0` leaves it unset.
    pub fn with_expires_in(mut self, now: DateTime<Utc>, expires_in: i64) -> Self {
        if expires_in > 0 {
            self.expiry = now.checked_add_signed(Duration::seconds(expires_in));
        }
        self
    }

    pub fn extra(&self, key: &str) -> Option<Value> {
        self.raw.get(key)
    }

    /// Expired, or within the early-expiry delta of it. Tokens without an
    /// expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .map(|expiry| expiry - Duration::seconds(EXPIRY_DELTA_SECONDS) <= now)
            .unwrap_or(false)
    }

    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(Utc::now())
    }

    /// Value for an `Authorization` request header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.normalized_type(), self.access_token)
    }

    fn normalized_type(&self) -> &str {
        match self.token_type.as_str() {
            "" => "Bearer",
            t if t.eq_ignore_ascii_case("bearer") => "Bearer",
            t if t.eq_ignore_ascii_case("mac") => "MAC",
            t if t.eq_ignore_ascii_case("basic") => "Basic",
            t => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expiry_delta_applies() {
        let now = Utc::now();
        let token = Token::new("a".into(), "bearer".into()).with_expires_in(now, 5);
        assert!(token.is_expired_at(now));

        let token = Token::new("a".into(), "bearer".into()).with_expires_in(now, 3600);
        assert!(!token.is_expired_at(now));
        assert!(token.is_valid());
    }

    #[test]
    fn zero_expires_in_never_expires() {
        let token = Token::new("a".into(), "bearer".into()).with_expires_in(Utc::now(), 0);
        assert_eq!(token.expiry, None);
        assert!(!token.is_expired_at(Utc::now() + Duration::days(365 * 100)));
    }

    #[test]
    fn clamped_expiry_does_not_overflow() {
        let token = Token::new("a".into(), "bearer".into())
            .with_expires_in(Utc::now(), i32::MAX as i64);
        assert!(token.expiry.is_some());
    }

    #[test]
    fn authorization_header_normalizes_type() {
        assert_eq!(Token::new("abc".into(), "bearer".into()).authorization_header(), "Bearer abc");
        assert_eq!(Token::new("abc".into(), "".into()).authorization_header(), "Bearer abc");
        assert_eq!(Token::new("abc".into(), "DPoP".into()).authorization_header(), "DPoP abc");
    }

    #[test]
    fn extra_reads_raw_fields() {
        let mut token = Token::new("a".into(), "bearer".into());
        token.raw = RawFields::Json(json!({"scope": "read", "n": 1}).as_object().unwrap().clone());
        assert_eq!(token.extra("scope"), Some(json!("read")));
        assert_eq!(token.extra("missing"), None);

        token.raw = RawFields::Form(vec![("id_token".into(), "xyz".into())]);
        assert_eq!(token.extra("id_token"), Some(json!("xyz")));
    }
}
