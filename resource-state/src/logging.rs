//! Logging setup for ocres hosts and companions
//!
//! Libraries in this workspace only emit `tracing` events. Hosts pick how
//! those events are rendered, or drop them entirely, with the functions
//! below.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy)]
pub enum LoggingMode {
    /// No subscriber; events are discarded
    Silent,
    /// Compact stderr output at info level
    Development,
    /// Verbose diagnostics for debugging
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// Call once, before creating platforms or clients.
///
/// # Examples
///
/// ```rust,ignore
/// resource_state::logging::init_logging(LoggingMode::Development)?;
/// ```
///
/// # Environment Variables
///
/// - `OCRES_LOG_LEVEL`: filter directive, e.g. `debug` or `resource_server=trace`
/// - `RUST_LOG`: used when `OCRES_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            let subscriber = Registry::default()
                .with(fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact())
                .with(filter);

            subscriber.try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))?;

            Ok(())
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            let subscriber = Registry::default()
                .with(fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true))
                .with(filter);

            subscriber.try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))?;

            Ok(())
        }
    }
}

/// Initialize logging from environment variables
///
/// Reads `OCRES_LOG_MODE` (`silent`, `development` or `debug`). Unset means
/// silent; any other value is an error.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match std::env::var("OCRES_LOG_MODE") {
        Ok(value) => parse_mode(&value)?,
        Err(_) => LoggingMode::Silent,
    };

    init_logging(mode)
}

fn parse_mode(value: &str) -> Result<LoggingMode, LoggingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "silent" | "" => Ok(LoggingMode::Silent),
        "development" | "dev" => Ok(LoggingMode::Development),
        "debug" => Ok(LoggingMode::Debug),
        other => Err(LoggingError::InvalidEnv(format!("OCRES_LOG_MODE={}", other))),
    }
}

/// Create an environment filter with fallback to default level
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let filter = if let Ok(level) = std::env::var("OCRES_LOG_LEVEL") {
        EnvFilter::try_new(&level)
            .map_err(|e| LoggingError::InvalidEnv(format!("OCRES_LOG_LEVEL={}: {}", level, e)))?
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    };

    Ok(filter)
}

/// Whether a global subscriber is already installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

/// Equivalent to `init_logging(LoggingMode::Silent)`
pub fn init_silent() -> Result<(), LoggingError> {
    init_logging(LoggingMode::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn test_silent_mode() {
        assert!(init_silent().is_ok());
    }

    #[rstest]
    #[case("silent")]
    #[case("Development")]
    #[case(" debug ")]
    #[case("dev")]
    fn test_parse_mode_accepts(#[case] value: &str) {
        assert!(parse_mode(value).is_ok());
    }

    #[test]
    fn test_parse_mode_rejects_unknown() {
        assert!(matches!(
            parse_mode("verbose"),
            Err(LoggingError::InvalidEnv(_))
        ));
    }
}