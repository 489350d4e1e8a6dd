//! Logging utilities and configuration for the field writer.
//!
//! The writer emits one event per field attempt and per probe. On a busy
//! device that is a lot of output, so both are gated by [`LogConfig`] and
//! the [`log_attempt!`](crate::log_attempt) / [`log_probe!`](crate::log_probe)
//! macros, which skip formatting entirely when disabled.

use tracing::Level;

/// Logging configuration for the writer and prober.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for writer components
    pub base_level: Level,
    /// Whether to log every individual field attempt
    pub log_attempt_details: bool,
    /// Whether to log schema probes and sampling
    pub log_probe_operations: bool,
    /// Whether to log one summary line per attribute
    pub log_summaries: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_attempt_details: false,
            log_probe_operations: true,
            log_summaries: true,
            max_field_length: 64,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging vendor stores.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_attempt_details: true,
            log_probe_operations: true,
            log_summaries: true,
            max_field_length: 256,
        }
    }

    /// Creates a minimal configuration with the lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_attempt_details: false,
            log_probe_operations: false,
            log_summaries: false,
            max_field_length: 32,
        }
    }

    /// Same as [`LogConfig::default`].
    pub fn balanced() -> Self {
        Self::default()
    }
}

/// Debug logging that only evaluates its arguments when the configured base
/// level admits debug events.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Conditional per-field attempt logging.
#[macro_export]
macro_rules! log_attempt {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_attempt_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Conditional probe logging.
#[macro_export]
macro_rules! log_probe {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_probe_operations {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a logged value to at most `max_length` characters.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    match value.char_indices().nth(max_length) {
        None => value.to_string(),
        Some((cut, _)) => format!("{}...(truncated)", &value[..cut]),
    }
}

/// Subscriber setup for binaries and tests that embed the writer.
pub mod setup {
    use tracing::Level;

    /// Configuration for the tracing subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for this crate specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            match self.env_filter {
                Some(ref filter) => filter.clone(),
                None => format!(
                    "{},calllog_fields={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured filter.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use calllog_fields::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_attempt_details);
        assert!(config.log_probe_operations);

        let verbose = LogConfig::verbose();
        assert_eq!(verbose.base_level, Level::DEBUG);
        assert!(verbose.log_attempt_details);

        let production = LogConfig::production();
        assert_eq!(production.base_level, Level::WARN);
        assert!(!production.log_probe_operations);
        assert!(!production.log_summaries);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(truncate_field("hello", 5), "hello");
        assert_eq!(
            truncate_field("subscription_component_name", 12),
            "subscription...(truncated)"
        );
        assert_eq!(truncate_field("通话记录", 2), "通话...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        let config = LoggingConfig::default();
        assert_eq!(config.env_filter(), "info,calllog_fields=debug");

        let config = LoggingConfig::production().with_env_filter("calllog_fields=trace");
        assert_eq!(config.env_filter(), "calllog_fields=trace");
    }

    #[test]
    fn test_macros_respect_flags() {
        fn expensive(calls: &std::cell::Cell<usize>) -> usize {
            calls.set(calls.get() + 1);
            calls.get()
        }

        let calls = std::cell::Cell::new(0);
        let quiet = LogConfig::production();
        log_attempt!(quiet, value = expensive(&calls), "not emitted");
        log_probe!(quiet, value = expensive(&calls), "not emitted");
        perf_debug!(quiet, value = expensive(&calls), "not emitted");
        assert_eq!(calls.get(), 0);

        let verbose = LogConfig::verbose();
        log_attempt!(verbose, value = expensive(&calls), "emitted");
        perf_debug!(verbose, value = expensive(&calls), "emitted");
        assert_eq!(calls.get(), 2);
    }
}
