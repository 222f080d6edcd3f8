use std::collections::BTreeMap;
use std::{env, fs};

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::config::styles::{AuthStyle, FormEncodingStyle};
use crate::exchange::exchanger::ExchangeRequest;
use crate::exchange::request::{ClientCredentials, FormParams};

/// ================================
/// Full configuration file
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub exchange: ExchangeConfig,
}

/// ================================
/// Token exchange
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    pub token_url: String,
    pub client_id: ValueSource,
    #[serde(default)]
    pub client_secret: Option<ValueSource>,
    /// grant parameters, e.g. grant_type, scope, refresh_token
    #[serde(default)]
    pub params: BTreeMap<String, ValueSource>,
    #[serde(default)]
    pub auth_style: AuthStyle,
    #[serde(default)]
    pub form_encoding: FormEncodingStyle,
}

/// Where a configured value comes from
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ValueSource {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

impl ValueSource {
    pub fn resolve(&self) -> Result<String> {
        match self {
            ValueSource::Literal { value } => Ok(value.to_owned()),
            ValueSource::FromEnv { from_env } => {
                env::var(from_env).map_err(|err| anyhow!("env var '{}': {}", from_env, err))
            }
            ValueSource::FromFile { path } => fs::read_to_string(path)
                .map_err(|err| anyhow!("file '{}': {}", path, err))
                .map(|res| res.trim().to_string()),
        }
    }
}

impl ExchangeConfig {
    /// Resolve every value source into a ready [`ExchangeRequest`].
    pub fn to_request(&self) -> Result<ExchangeRequest> {
        let client_id = self.client_id.resolve()?;
        let client_secret = self
            .client_secret
            .as_ref()
            .map(|secret| secret.resolve())
            .transpose()?
            .unwrap_or_default();

        let mut params = FormParams::new();
        for (key, source) in &self.params {
            params.insert(key.to_owned(), source.resolve()?);
        }

        Ok(ExchangeRequest {
            credentials: ClientCredentials::new(client_id, client_secret),
            token_url: self.token_url.to_owned(),
            params,
            auth_style: self.auth_style,
            form_encoding: self.form_encoding,
        })
    }
}
