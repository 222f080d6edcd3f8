//! # Token Exchange Library
//!
//! Client side of the OAuth2 token endpoint call: sends client credentials
//! plus a grant, gets back a [`Token`].
//!
//! Whether a token endpoint wants credentials in a Basic `Authorization`
//! header or as form fields is discovered by probing the first time and
//! then remembered per token URL for the life of the process.
//!
//! Modules:
//! - `config` — auth styles, YAML configuration and validation
//! - `cache` — process-wide auth style cache
//! - `exchange` — request building, style negotiation, the exchanger
//! - `token` — token type and overflow-safe expiry parsing
//! - `transport` — HTTP seam and the reqwest implementation

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;
pub mod observability;
pub mod token;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::styles::{AuthStyle, FormEncodingStyle};
pub use crate::error::ExchangeError;
pub use crate::exchange::{retrieve_token, ClientCredentials, ExchangeRequest, FormParams, TokenExchanger};
pub use crate::token::Token;

#[cfg(any(test, feature = "test-util"))]
pub use crate::cache::auth_style_cache::reset_auth_style_cache;
