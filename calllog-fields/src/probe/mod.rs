//! Runtime schema probing.
//!
//! Vendor stores do not publish their schema, and a column that exists may
//! still be one the vendor never fills (often because a constraint rejects
//! every value). The prober asks the live store two questions per
//! candidate field:
//!
//! 1. Does the field exist at all? A zero-row schema probe.
//! 2. Is it used? The most recent rows are sampled and null values counted.
//!
//! The policy is permissive: a field is only judged unsafe when it exists,
//! was sampled, and was null in every sampled row, unless it is on the
//! critical allow-list. Answers are memoized per (store session, field).
//!
//! ```rust
//! use calllog_fields::core::AttributeMap;
//! use calllog_fields::probe::SchemaProber;
//! use calllog_fields::store::InMemoryRecordStore;
//!
//! let mut row = AttributeMap::new();
//! row.put_null("oplus_data1");
//! row.put("ring_time", 12_i64);
//! let store = InMemoryRecordStore::new("s1")
//!     .with_columns(["oplus_data1", "ring_time"])
//!     .with_row(row);
//!
//! let prober = SchemaProber::new();
//! assert!(prober.validate_field(&store, "ring_time").safe);
//! assert!(!prober.validate_field(&store, "oplus_data1").safe);
//! assert!(!prober.validate_field(&store, "record_duration").exists);
//! ```

mod cache;

pub use cache::{ProbeCache, ProbeCacheStats};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::config::WriterConfig;
use crate::log_probe;
use crate::logging::LogConfig;
use crate::registry::fields;
use crate::store::{RecordStore, SampledValue};

/// Fields that stay usable even when every sampled value is null.
pub const DEFAULT_CRITICAL_FIELDS: [&str; 2] = [fields::DURATION, fields::MISSED_REASON];

/// How a field is used in the most recent records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUsageStats {
    pub exists: bool,
    pub total_sampled: usize,
    pub non_null_count: usize,
    /// Share of sampled rows holding null, 0.0 to 100.0. 100.0 when nothing
    /// was sampled.
    pub null_percentage: f64,
}

impl FieldUsageStats {
    /// Stats for a field the store does not have.
    pub fn missing() -> Self {
        Self {
            exists: false,
            total_sampled: 0,
            non_null_count: 0,
            null_percentage: 100.0,
        }
    }

    /// Computes stats for an existing field from its sampled values.
    pub fn from_samples(samples: &[SampledValue]) -> Self {
        let total_sampled = samples.len();
        let non_null_count = samples.iter().filter(|s| !s.is_null()).count();
        let null_percentage = if total_sampled == 0 {
            100.0
        } else {
            (total_sampled - non_null_count) as f64 * 100.0 / total_sampled as f64
        };
        Self {
            exists: true,
            total_sampled,
            non_null_count,
            null_percentage,
        }
    }

    pub fn null_count(&self) -> usize {
        self.total_sampled - self.non_null_count
    }
}

/// The prober's combined answer for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVerdict {
    pub field: String,
    pub exists: bool,
    pub stats: FieldUsageStats,
    pub safe: bool,
}

/// Zero-row schema probe, uncached. Errors count as absent.
pub fn exists_in_schema(store: &dyn RecordStore, field: &str) -> bool {
    match store.probe_schema(field) {
        Ok(exists) => exists,
        Err(e) => {
            warn!(field, error = %e, "Schema probe failed, treating field as absent");
            false
        }
    }
}

/// Samples the `sample_size` most recent values of `field`, uncached.
pub fn usage_stats(store: &dyn RecordStore, field: &str, sample_size: usize) -> FieldUsageStats {
    match store.sample_recent(field, sample_size) {
        Ok(Some(samples)) => FieldUsageStats::from_samples(&samples),
        Ok(None) => FieldUsageStats::missing(),
        Err(e) => {
            warn!(field, error = %e, "Sampling failed, treating field as absent");
            FieldUsageStats::missing()
        }
    }
}

/// [`SchemaProber::is_safe_to_use`] with the default critical fields.
pub fn is_safe_to_use(field: &str, stats: &FieldUsageStats) -> bool {
    safe_with(field, stats, |f| DEFAULT_CRITICAL_FIELDS.contains(&f))
}

fn safe_with(field: &str, stats: &FieldUsageStats, is_critical: impl Fn(&str) -> bool) -> bool {
    if !stats.exists {
        return false;
    }
    let always_null = stats.total_sampled > 0 && stats.non_null_count == 0;
    !always_null || is_critical(field)
}

/// Memoizing schema prober, shareable across threads.
#[derive(Debug)]
pub struct SchemaProber {
    sample_size: usize,
    critical_fields: Vec<String>,
    schema: Arc<ProbeCache<bool>>,
    usage: Arc<ProbeCache<FieldUsageStats>>,
    log: LogConfig,
}

impl SchemaProber {
    /// Prober with the default sample size and critical fields.
    pub fn new() -> Self {
        Self::from_config(&WriterConfig::default())
    }

    pub fn from_config(config: &WriterConfig) -> Self {
        Self {
            sample_size: config.sample_size,
            critical_fields: config.critical_probe_fields.clone(),
            schema: Arc::new(ProbeCache::new()),
            usage: Arc::new(ProbeCache::new()),
            log: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// A prober logging through `log` that shares this prober's caches, so
    /// neither asks the store what the other already learned.
    pub fn sharing_caches(&self, log: LogConfig) -> Self {
        Self {
            sample_size: self.sample_size,
            critical_fields: self.critical_fields.clone(),
            schema: Arc::clone(&self.schema),
            usage: Arc::clone(&self.usage),
            log,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Memoized [`exists_in_schema`].
    pub fn exists_in_schema(&self, store: &dyn RecordStore, field: &str) -> bool {
        self.schema.get_or_init(store.session_id(), field, || {
            let exists = exists_in_schema(store, field);
            log_probe!(self.log, session = store.session_id(), field, exists, "Probed schema");
            exists
        })
    }

    /// Memoized [`usage_stats`] with the configured sample size.
    pub fn usage_stats(&self, store: &dyn RecordStore, field: &str) -> FieldUsageStats {
        self.usage.get_or_init(store.session_id(), field, || {
            let stats = usage_stats(store, field, self.sample_size);
            log_probe!(
                self.log,
                session = store.session_id(),
                field,
                exists = stats.exists,
                total_sampled = stats.total_sampled,
                non_null = stats.non_null_count,
                "Sampled field usage"
            );
            stats
        })
    }

    /// Whether `field` may be written given its `stats`.
    pub fn is_safe_to_use(&self, field: &str, stats: &FieldUsageStats) -> bool {
        safe_with(field, stats, |f| self.critical_fields.iter().any(|c| c == f))
    }

    /// Existence check followed by usage sampling when the field exists.
    #[instrument(skip(self, store), fields(session = store.session_id()))]
    pub fn validate_field(&self, store: &dyn RecordStore, field: &str) -> FieldVerdict {
        if !self.exists_in_schema(store, field) {
            return FieldVerdict {
                field: field.to_string(),
                exists: false,
                stats: FieldUsageStats::missing(),
                safe: false,
            };
        }
        let stats = self.usage_stats(store, field);
        let safe = self.is_safe_to_use(field, &stats);
        FieldVerdict {
            field: field.to_string(),
            exists: stats.exists,
            stats,
            safe,
        }
    }

    /// Cache statistics for schema probes and usage samples.
    pub fn cache_stats(&self) -> (ProbeCacheStats, ProbeCacheStats) {
        (self.schema.stats(), self.usage.stats())
    }

    /// Forgets everything learned about `session`.
    pub fn forget_session(&self, session: &str) {
        self.schema.clear_session(session);
        self.usage.clear_session(session);
    }
}

impl Default for SchemaProber {
    fn default() -> Self {
        Self::new()
    }
}
