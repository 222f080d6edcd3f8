//! Auth style negotiation.
//!
//! Explicit styles go straight through. For `Unknown`, a cached style is
//! used when present; otherwise the endpoint is probed with `InHeader` and,
//! if that placement is rejected, once more with `InParams`. The winner is
//! cached. At most two attempts per exchange.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::cache::auth_style_cache::AuthStyleCache;
use crate::config::styles::AuthStyle;
use crate::error::ExchangeError;
use crate::observability::metrics::get_metrics;

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// The endpoint rejected where the credentials were placed
    StyleRejected(ExchangeError),
    Fatal(ExchangeError),
}

impl AttemptError {
    pub(crate) fn into_error(self) -> ExchangeError {
        match self {
            AttemptError::StyleRejected(e) | AttemptError::Fatal(e) => e,
        }
    }
}

pub(crate) async fn negotiate<F, Fut, T>(
    cache: &AuthStyleCache,
    token_url: &str,
    requested: AuthStyle,
    mut attempt: F,
) -> Result<T, ExchangeError>
where
    F: FnMut(AuthStyle) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let metrics = get_metrics();

    if requested.is_explicit() {
        debug!(token_url, auth_style = %requested, "using caller supplied auth style");
        return attempt(requested).await.map_err(AttemptError::into_error);
    }

    if let Some(cached) = cache.get(token_url).await {
        metrics.style_cache_hits.inc();
        debug!(token_url, auth_style = %cached, "auth style cache hit");
        return attempt(cached).await.map_err(AttemptError::into_error);
    }

    metrics.style_cache_misses.inc();
    metrics.style_probes.inc();
    debug!(token_url, "auth style unknown, probing with in_header");

    match attempt(AuthStyle::InHeader).await {
        Ok(value) => {
            remember(cache, token_url, AuthStyle::InHeader).await;
            Ok(value)
        }
        Err(AttemptError::StyleRejected(rejection)) => {
            warn!(token_url, error = %rejection, "in_header rejected, retrying with in_params");
            let value = attempt(AuthStyle::InParams)
                .await
                .map_err(AttemptError::into_error)?;
            remember(cache, token_url, AuthStyle::InParams).await;
            Ok(value)
        }
        Err(AttemptError::Fatal(err)) => Err(err),
    }
}

async fn remember(cache: &AuthStyleCache, token_url: &str, style: AuthStyle) {
    cache.set(token_url, style).await;
    get_metrics()
        .style_negotiated
        .with_label_values(&[style.as_str()])
        .inc();
    info!(token_url, auth_style = %style, "auth style negotiated");
}
