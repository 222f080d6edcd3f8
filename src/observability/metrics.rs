use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::{Arc, OnceLock};
use tracing::info;


// Declare the static OnceLock to hold the Metrics.
static METRICS_INSTANCE: OnceLock<Arc<Metrics>> = OnceLock::new();

/// Initializes on first use and gets a reference to the static `Metrics`.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| {
        info!("Initializing Metrics ...");
        Metrics::new()
    })
}

/// Render every registered metric in the Prometheus text format.
pub fn render_metrics() -> anyhow::Result<String> {
    let metric_families = get_metrics().registry.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Exchange metrics
    pub exchange_attempts: IntCounterVec,
    pub exchange_failures: IntCounterVec,
    pub exchange_duration: HistogramVec,

    // Negotiation metrics
    pub style_probes: IntCounter,
    pub style_negotiated: IntCounterVec,

    // Cache metrics
    pub style_cache_hits: IntCounter,
    pub style_cache_misses: IntCounter,
    pub cached_styles: IntGauge,

    // Parser metrics
    pub expiry_clamps: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenexchange".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Exchange
            exchange_attempts: IntCounterVec::new(Opts::new("exchange_attempts_total", "HTTP attempts against token endpoints by auth style"),&["auth_style"],).unwrap(),
            exchange_failures: IntCounterVec::new(Opts::new("exchange_failures_total", "Failed exchanges by reason"),&["reason"],).unwrap(),
            exchange_duration: HistogramVec::new(HistogramOpts::new("exchange_duration_seconds", "Exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["outcome"],).unwrap(),

            // Negotiation
            style_probes: IntCounter::new("style_probes_total", "Auth style probing sequences started").unwrap(),
            style_negotiated: IntCounterVec::new(Opts::new("style_negotiated_total", "Auth styles learned by probing"),&["auth_style"],).unwrap(),

            // Cache
            style_cache_hits: IntCounter::new("style_cache_hits_total", "Auth style cache hits").unwrap(),
            style_cache_misses: IntCounter::new("style_cache_misses_total", "Auth style cache misses").unwrap(),
            cached_styles: IntGauge::new("cached_styles", "Token endpoints with a cached auth style").unwrap(),

            expiry_clamps: IntCounter::new("expiry_clamps_total", "expires_in values clamped to the 32-bit bound").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.exchange_attempts.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_failures.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.style_probes.clone())).unwrap();
        reg.register(Box::new(metrics.style_negotiated.clone())).unwrap();
        reg.register(Box::new(metrics.style_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.style_cache_misses.clone())).unwrap();
        reg.register(Box::new(metrics.cached_styles.clone())).unwrap();
        reg.register(Box::new(metrics.expiry_clamps.clone())).unwrap();

        metrics
    }
}
