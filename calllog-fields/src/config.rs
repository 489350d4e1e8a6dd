//! Writer configuration.

use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_RING_DURATION;
use crate::error::{FieldError, Result};
use crate::registry::fields;

/// Tunables for sanitizing, probing and record building.
///
/// # Examples
///
/// ```rust
/// use calllog_fields::config::WriterConfig;
///
/// let config = WriterConfig::default()
///     .with_sample_size(20)
///     .with_runtime_probe(false);
/// assert!(config.validate().is_ok());
///
/// let parsed = WriterConfig::from_json_str(r#"{"sample_size": 5}"#).unwrap();
/// assert_eq!(parsed.sample_size, 5);
/// assert_eq!(parsed.max_string_length, 255);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Recent rows sampled per field by the prober
    pub sample_size: usize,
    /// Strings longer than this many UTF-16 code units are truncated
    pub max_string_length: usize,
    /// Generic integers are clamped to `[-numeric_bound, numeric_bound]`
    pub numeric_bound: i64,
    /// Largest accepted `missed_reason` value
    pub missed_reason_max: i64,
    /// Ring time used when the requested one is negative, in seconds
    pub default_ring_duration: i64,
    /// Fields the prober treats as safe even when always null
    pub critical_probe_fields: Vec<String>,
    /// Gate candidate fields through the runtime prober
    pub use_runtime_probe: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            max_string_length: 255,
            numeric_bound: 1_000_000,
            missed_reason_max: 10,
            default_ring_duration: DEFAULT_RING_DURATION,
            critical_probe_fields: vec![
                fields::DURATION.to_string(),
                fields::MISSED_REASON.to_string(),
            ],
            use_runtime_probe: true,
        }
    }
}

impl WriterConfig {
    /// Parses a configuration from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration that never consults the prober. Useful when the store
    /// cannot be queried.
    pub fn without_probe() -> Self {
        Self::default().with_runtime_probe(false)
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_max_string_length(mut self, max: usize) -> Self {
        self.max_string_length = max;
        self
    }

    pub fn with_numeric_bound(mut self, bound: i64) -> Self {
        self.numeric_bound = bound;
        self
    }

    pub fn with_missed_reason_max(mut self, max: i64) -> Self {
        self.missed_reason_max = max;
        self
    }

    pub fn with_default_ring_duration(mut self, seconds: i64) -> Self {
        self.default_ring_duration = seconds;
        self
    }

    pub fn with_critical_probe_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_probe_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_runtime_probe(mut self, enabled: bool) -> Self {
        self.use_runtime_probe = enabled;
        self
    }

    /// Checks that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(FieldError::configuration("sample_size must be at least 1"));
        }
        if self.max_string_length == 0 {
            return Err(FieldError::configuration(
                "max_string_length must be at least 1",
            ));
        }
        if self.numeric_bound <= 0 {
            return Err(FieldError::configuration("numeric_bound must be positive"));
        }
        if self.missed_reason_max < 0 {
            return Err(FieldError::configuration(
                "missed_reason_max must not be negative",
            ));
        }
        if self.default_ring_duration < 0 {
            return Err(FieldError::configuration(
                "default_ring_duration must not be negative",
            ));
        }
        Ok(())
    }
}
