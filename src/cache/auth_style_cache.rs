use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::config::styles::AuthStyle;
use crate::observability::metrics::get_metrics;

// Declare the static OnceCell to hold the process-wide AuthStyleCache.
static AUTH_STYLE_CACHE_INSTANCE: OnceCell<AuthStyleCache> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `AuthStyleCache`.
pub async fn get_auth_style_cache() -> &'static AuthStyleCache {
    AUTH_STYLE_CACHE_INSTANCE
        .get_or_init(|| async {
            info!("Initializing static AuthStyleCache...");
            AuthStyleCache::new()
        })
        .await
}

/// Clear the process-wide cache. Test setup only.
#[cfg(any(test, feature = "test-util"))]
pub async fn reset_auth_style_cache() {
    get_auth_style_cache().await.clear().await;
}

/// Token URL -> auth style learned by probing.
///
/// Keys are the token URL exactly as given; no normalization. Only
/// `InHeader` and `InParams` are ever stored.
#[derive(Debug, Clone, Default)]
pub struct AuthStyleCache {
    inner: Arc<RwLock<HashMap<String, AuthStyle>>>,
}

impl AuthStyleCache {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub async fn get(&self, token_url: &str) -> Option<AuthStyle> {
        let guard = self.inner.read().await;
        guard.get(token_url).copied()
    }

    /// Record the style for a token URL. Last writer wins.
    pub async fn set(&self, token_url: &str, style: AuthStyle) {
        if !style.is_explicit() {
            debug!(token_url, "refusing to cache unknown auth style");
            return;
        }
        let mut guard = self.inner.write().await;
        if guard.insert(token_url.to_owned(), style).is_none() {
            get_metrics().cached_styles.inc();
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    #[cfg(any(test, feature = "test-util"))]
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        get_metrics().cached_styles.sub(guard.len() as i64);
        guard.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    async fn stores_only_explicit_styles() {
        let cache = AuthStyleCache::new();
        cache.set("https://a.example/token", AuthStyle::Unknown).await;
        assert!(cache.is_empty().await);

        cache.set("https://a.example/token", AuthStyle::InParams).await;
        assert_eq!(cache.get("https://a.example/token").await, Some(AuthStyle::InParams));
    }

    #[tokio::test]
    async fn keys_are_not_normalized() {
        let cache = AuthStyleCache::new();
        cache.set("https://a.example/token", AuthStyle::InHeader).await;
        assert_eq!(cache.get("https://a.example/token/").await, None);
        assert_eq!(cache.get("HTTPS://A.EXAMPLE/token").await, None);
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let cache = AuthStyleCache::new();
        cache.set("u", AuthStyle::InHeader).await;
        cache.set("u", AuthStyle::InParams).await;
        assert_eq!(cache.get("u").await, Some(AuthStyle::InParams));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_and_readers() {
        let cache = AuthStyleCache::new();
        let mut handles = Vec::new();
        for i in 0..64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let url = format!("https://e{}.example/token", i % 8);
                let style = if i % 2 == 0 { AuthStyle::InHeader } else { AuthStyle::InParams };
                cache.set(&url, style).await;
                cache.get(&url).await
            }));
        }
        for handle in handles {
            let seen = handle.await.unwrap();
            assert!(matches!(seen, Some(AuthStyle::InHeader) | Some(AuthStyle::InParams)));
        }
        assert_eq!(cache.len().await, 8);
    }

    #[tokio::test]
    #[serial]
    async fn reset_clears_process_wide_cache() {
        let cache = get_auth_style_cache().await;
        cache.set("https://reset.example/token", AuthStyle::InHeader).await;
        reset_auth_style_cache().await;
        assert!(cache.is_empty().await);
    }
}
