use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use token_exchange::config::loader::file_to_config;
use token_exchange::exchange::TokenExchanger;
use token_exchange::observability::metrics::render_metrics;
use token_exchange::utils::logging;
use token_exchange::utils::logging::LogLevel;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "token-exchange.yaml")]
    config: PathBuf,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// overrides settings.http.timeout_ms
    #[arg(long, env = "TIMEOUT_MS")]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(&args.config).await?;
    logging::init_logging(&logging::resolve(
        service_config.settings.logging.as_ref(),
        args.log_level,
    ));

    // -------------------------------
    // 2. Resolve credentials and grant
    // -------------------------------

    let request = service_config
        .exchange
        .to_request()
        .context("resolving exchange values")?;
    let timeout = Duration::from_millis(args.timeout_ms.unwrap_or(service_config.settings.http.timeout_ms));

    // -------------------------------
    // 3. Cancel on Ctrl-C or deadline
    // -------------------------------

    let cancel = CancellationToken::new();
    let watchdog = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => warn!("interrupted, cancelling exchange"),
                _ = tokio::time::sleep(timeout) => warn!(timeout_ms = timeout.as_millis() as u64, "deadline reached, cancelling exchange"),
                _ = cancel.cancelled() => {}
            }
            cancel.cancel();
        }
    });

    // -------------------------------
    // 4. Exchange
    // -------------------------------

    info!(token_url = %request.token_url, auth_style = %request.auth_style, "exchanging token");
    let exchanger = TokenExchanger::shared().await;
    let result = exchanger.exchange(&cancel, &request).await;
    cancel.cancel();
    let _ = watchdog.await;

    if let Ok(metrics) = render_metrics() {
        debug!(metrics = %metrics, "exchange metrics");
    }

    let token = result?;
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}
