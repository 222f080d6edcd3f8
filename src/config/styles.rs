use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

/// How client credentials reach the token endpoint.
///
/// `Unknown` asks the negotiator to probe the endpoint; the other two are
/// explicit caller choices and are never second-guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStyle {
    #[default]
    Unknown,
    /// HTTP Basic `Authorization` header
    InHeader,
    /// `client_id` / `client_secret` form fields
    InParams,
}

impl AuthStyle {
    pub fn as_str(&self) -> &'static str {
        match *self {
            AuthStyle::Unknown => "unknown",
            AuthStyle::InHeader => "in_header",
            AuthStyle::InParams => "in_params",
        }
    }

    pub fn is_explicit(&self) -> bool {
        !matches!(self, AuthStyle::Unknown)
    }
}

impl fmt::Display for AuthStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for AuthStyle {
    type Error = ExchangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AuthStyle::Unknown),
            1 => Ok(AuthStyle::InParams),
            2 => Ok(AuthStyle::InHeader),
            other => Err(ExchangeError::InvalidAuthStyle(other.to_string())),
        }
    }
}

impl FromStr for AuthStyle {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" | "auto" => Ok(AuthStyle::Unknown),
            "in_header" | "header" | "basic" => Ok(AuthStyle::InHeader),
            "in_params" | "params" | "form" => Ok(AuthStyle::InParams),
            _ => Err(ExchangeError::InvalidAuthStyle(s.to_owned())),
        }
    }
}

/// Whether grant parameters are form-encoded into the body when the
/// credentials travel in the header. Some endpoints refuse any body
/// alongside Basic auth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormEncodingStyle {
    #[default]
    Enabled,
    Disabled,
}

impl FormEncodingStyle {
    pub fn as_str(&self) -> &'static str {
        match *self {
            FormEncodingStyle::Enabled => "enabled",
            FormEncodingStyle::Disabled => "disabled",
        }
    }
}

impl fmt::Display for FormEncodingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for FormEncodingStyle {
    type Error = ExchangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FormEncodingStyle::Enabled),
            1 => Ok(FormEncodingStyle::Disabled),
            other => Err(ExchangeError::InvalidFormEncodingStyle(other.to_string())),
        }
    }
}

impl FromStr for FormEncodingStyle {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" | "on" | "true" => Ok(FormEncodingStyle::Enabled),
            "disabled" | "off" | "false" => Ok(FormEncodingStyle::Disabled),
            _ => Err(ExchangeError::InvalidFormEncodingStyle(s.to_owned())),
        }
    }
}
