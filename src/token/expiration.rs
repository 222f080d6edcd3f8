//! Overflow-safe decoding of `expires_in`.
//!
//! Servers send the field as an integer, a float or a quoted number and now
//! and then as something far too large. Oversized values are clamped to
//! [`MAX_EXPIRES_IN_SECONDS`] instead of failing the exchange.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use tracing::warn;

use crate::error::ExchangeError;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MAX_EXPIRES_IN_SECONDS;

/// Seconds until expiry, already clamped. `0` means the server sent no expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpirationTime(pub i64);

impl ExpirationTime {
    pub fn seconds(&self) -> i64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for ExpirationTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse_expires_in(&value)
            .map(|secs| ExpirationTime(secs.unwrap_or(0)))
            .map_err(serde::de::Error::custom)
    }
}

/// Decode a JSON expiry value.
///
/// `null` yields `Ok(None)`. Negative or non-numeric values fail with
/// [`ExchangeError::MalformedExpiry`].
pub fn parse_expires_in(value: &Value) -> Result<Option<i64>, ExchangeError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => from_number(n).map(Some),
        Value::String(s) => parse_expires_in_str(s).map(Some),
        other => Err(ExchangeError::MalformedExpiry(format!(
            "expected a number, got {other}"
        ))),
    }
}

/// Decode an expiry carried as text, e.g. a form-encoded response field.
pub fn parse_expires_in_str(raw: &str) -> Result<i64, ExchangeError> {
    let trimmed = raw.trim();
    if let Ok(secs) = trimmed.parse::<i64>() {
        return clamp(secs);
    }
    match trimmed.parse::<f64>() {
        Ok(secs) => clamp_float(secs, raw),
        Err(_) => Err(ExchangeError::MalformedExpiry(format!("'{raw}' is not a number"))),
    }
}

fn from_number(n: &Number) -> Result<i64, ExchangeError> {
    if let Some(secs) = n.as_i64() {
        return clamp(secs);
    }
    // positive and wider than i64
    if n.as_u64().is_some() {
        return Ok(clamped(&n.to_string()));
    }
    match n.as_f64() {
        Some(secs) => clamp_float(secs, &n.to_string()),
        None => Err(ExchangeError::MalformedExpiry(format!("'{n}' is not representable"))),
    }
}

fn clamp(secs: i64) -> Result<i64, ExchangeError> {
    if secs < 0 {
        return Err(ExchangeError::MalformedExpiry(format!("negative expiry {secs}")));
    }
    if secs > MAX_EXPIRES_IN_SECONDS {
        return Ok(clamped(&secs.to_string()));
    }
    Ok(secs)
}

fn clamp_float(secs: f64, raw: &str) -> Result<i64, ExchangeError> {
    if secs.is_nan() || secs < 0.0 {
        return Err(ExchangeError::MalformedExpiry(format!("'{raw}' is not a valid expiry")));
    }
    // "inf" and "infinity" are words, not overflowed numbers
    if secs.is_infinite() && !raw.bytes().any(|b| b.is_ascii_digit()) {
        return Err(ExchangeError::MalformedExpiry(format!("'{raw}' is not a valid expiry")));
    }
    if secs > MAX_EXPIRES_IN_SECONDS as f64 {
        return Ok(clamped(raw));
    }
    Ok(secs.trunc() as i64)
}

fn clamped(raw: &str) -> i64 {
    warn!(expires_in = %raw, max = MAX_EXPIRES_IN_SECONDS, "expires_in out of range, clamping");
    get_metrics().expiry_clamps.inc();
    MAX_EXPIRES_IN_SECONDS
}
