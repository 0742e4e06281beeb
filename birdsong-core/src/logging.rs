use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// Initialize structured logging based on configuration
///
/// `RUST_LOG` takes precedence over the configured level. Output is JSON when
/// `format` is `"json"`, human-readable otherwise, and goes to `file_path`
/// instead of stdout when one is set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = parse_log_level(&config.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    let (writer, ansi) = match &config.file_path {
        Some(file_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.format == "json" {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_file(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(output)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
        assert!(parse_log_level("error").is_ok());
        assert!(parse_log_level("chirp").is_err());
    }

    #[test]
    fn test_init_logging_rejects_bad_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
