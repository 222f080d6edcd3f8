use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use crate::config::settings::{LogFormat, LoggingConfig};


#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}


/// Pick the effective logging config: CLI level beats config file level.
pub fn resolve(logging: Option<&LoggingConfig>, arg_log_level: Option<LogLevel>) -> LoggingConfig {
    let base = logging.cloned().unwrap_or_else(|| LoggingConfig::new("info".to_owned(), LogFormat::from_env()));
    let level = arg_log_level
        .map(|level| level.as_str().to_owned())
        .unwrap_or(base.level);
    LoggingConfig::new(level, base.format)
}


/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for the token. A second call is a no-op.
pub fn init_logging(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let base = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr);

    let format = match cfg.format {
        LogFormat::Json => base.json().flatten_event(true).with_ansi(false).boxed(),
        LogFormat::Compact => base
            .compact()
            .with_ansi(std::io::stderr().is_terminal())
            .boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_overrides_config() {
        let cfg = LoggingConfig::new("warn".to_owned(), LogFormat::Json);
        let resolved = resolve(Some(&cfg), Some(LogLevel::DEBUG));
        assert_eq!(resolved.level, "debug");
        assert_eq!(resolved.format, LogFormat::Json);

        let resolved = resolve(Some(&cfg), None);
        assert_eq!(resolved.level, "warn");
    }
}
