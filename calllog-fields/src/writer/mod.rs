//! The fallback writer.
//!
//! A logical attribute (ring duration, missed reason, ...) maps to an
//! ordered list of candidate fields, any of which the store may refuse. The
//! writer tries them one at a time in one of two modes:
//!
//! - [`WriteMode::StopAtFirstSuccess`] keeps the first field the store
//!   accepts and ignores the rest.
//! - [`WriteMode::DefensiveAll`] tries every candidate and keeps every value
//!   that sticks.
//!
//! Each attempt validates the field name, optionally consults the
//! [`SchemaProber`], sanitizes the value and submits a single-field write.
//! A refused write never leaves a partial value behind: the field is
//! restored to what it held before the attempt.
//!
//! ```rust
//! use calllog_fields::core::{AttributeMap, FieldValue};
//! use calllog_fields::registry::LogicalAttribute;
//! use calllog_fields::store::InMemoryRecordStore;
//! use calllog_fields::writer::{FallbackWriter, WriteMode};
//!
//! let store = InMemoryRecordStore::new("s1")
//!     .with_columns(["ring_time", "ring_duration"])
//!     .reject_field("ring_time", true);
//! let writer = FallbackWriter::new();
//! let mut draft = AttributeMap::new();
//!
//! let summary = writer
//!     .write_value(
//!         &store,
//!         &mut draft,
//!         LogicalAttribute::RingDuration,
//!         &["ring_time", "ring_duration"],
//!         WriteMode::StopAtFirstSuccess,
//!         FieldValue::Integer(12),
//!     )
//!     .unwrap();
//!
//! assert_eq!(summary.succeeded(), vec!["ring_duration"]);
//! assert!(summary.fallback_used);
//! assert!(!draft.contains("ring_time"));
//! ```

mod attempt;

pub use attempt::{AttemptOutcome, FieldAttempt, SkipReason, WriteSummary};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::core::{AttributeMap, FieldValue};
use crate::error::{FieldError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::probe::SchemaProber;
use crate::registry::LogicalAttribute;
use crate::sanitizer::{is_valid_field_name, ValueSanitizer};
use crate::store::RecordStore;
use crate::{log_attempt, perf_debug};

/// How candidates for one attribute are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Stop at the first accepted candidate
    StopAtFirstSuccess,
    /// Try every candidate
    DefensiveAll,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::StopAtFirstSuccess => f.write_str("stop_at_first_success"),
            WriteMode::DefensiveAll => f.write_str("defensive_all"),
        }
    }
}

/// Writes logical attributes through their candidate fields.
#[derive(Debug, Clone, Default)]
pub struct FallbackWriter {
    sanitizer: ValueSanitizer,
    prober: Option<Arc<SchemaProber>>,
    log: LogConfig,
}

impl FallbackWriter {
    /// A writer with the default sanitizer and no prober.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitizer(mut self, sanitizer: ValueSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Gates optional attributes through `prober`. Call type and duration
    /// are platform fields and are never gated.
    pub fn with_prober(mut self, prober: Arc<SchemaProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn prober(&self) -> Option<&Arc<SchemaProber>> {
        self.prober.as_ref()
    }

    pub fn sanitizer(&self) -> &ValueSanitizer {
        &self.sanitizer
    }

    /// Writes `attribute` through `candidates`, with `value_for` producing
    /// the raw value for each field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::CriticalAttributeUnset`] when `attribute` is
    /// critical, there was at least one candidate, and none was accepted.
    /// Everything else is reported in the returned summary.
    #[instrument(
        skip(self, store, draft, candidates, value_for),
        fields(session = store.session_id(), candidates = candidates.len())
    )]
    pub fn write_attribute<S, F>(
        &self,
        store: &dyn RecordStore,
        draft: &mut AttributeMap,
        attribute: LogicalAttribute,
        candidates: &[S],
        mode: WriteMode,
        value_for: F,
    ) -> Result<WriteSummary>
    where
        S: AsRef<str>,
        F: Fn(&str) -> FieldValue,
    {
        let started = Instant::now();
        let mut summary = WriteSummary::new(attribute, mode);

        for (idx, candidate) in candidates.iter().enumerate() {
            let field = candidate.as_ref();
            let attempt = self.attempt(store, draft, attribute, field, value_for(field));
            let accepted = attempt.outcome.is_success();
            summary.attempts.push(attempt);

            if accepted && mode == WriteMode::StopAtFirstSuccess {
                summary.fallback_used = idx == candidates.len() - 1;
                break;
            }
        }

        perf_debug!(
            self.log,
            attribute = %attribute,
            attempts = summary.attempts.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Candidates tried"
        );

        if summary.is_unset() {
            if attribute.is_critical() {
                warn!(attribute = %attribute, "No candidate accepted a critical attribute");
                return Err(FieldError::CriticalAttributeUnset {
                    attribute,
                    attempted: summary.attempts.len(),
                });
            }
            warn!(
                attribute = %attribute,
                mode = %mode,
                failed = ?summary.failed(),
                skipped = ?summary.skipped(),
                "All candidate fields failed"
            );
        } else if self.log.log_summaries {
            debug!(
                attribute = %attribute,
                mode = %mode,
                succeeded = ?summary.succeeded(),
                fallback_used = summary.fallback_used,
                "Attribute written"
            );
        }

        Ok(summary)
    }

    /// [`write_attribute`](Self::write_attribute) with the same value for
    /// every candidate.
    pub fn write_value<S>(
        &self,
        store: &dyn RecordStore,
        draft: &mut AttributeMap,
        attribute: LogicalAttribute,
        candidates: &[S],
        mode: WriteMode,
        value: FieldValue,
    ) -> Result<WriteSummary>
    where
        S: AsRef<str>,
    {
        self.write_attribute(store, draft, attribute, candidates, mode, |_| value.clone())
    }

    fn attempt(
        &self,
        store: &dyn RecordStore,
        draft: &mut AttributeMap,
        attribute: LogicalAttribute,
        field: &str,
        raw: FieldValue,
    ) -> FieldAttempt {
        if !is_valid_field_name(field) {
            log_attempt!(self.log, field, "Skipping invalid field name");
            return FieldAttempt::skipped(field, raw, SkipReason::InvalidFieldName);
        }

        if let Some(prober) = self.prober.as_ref().filter(|_| !attribute.is_critical()) {
            let verdict = prober.validate_field(store, field);
            if !verdict.exists {
                log_attempt!(
                    self.log,
                    reason = %FieldError::schema_unsupported(field),
                    "Skipping field"
                );
                return FieldAttempt::skipped(field, raw, SkipReason::SchemaUnsupported);
            }
            if !verdict.safe {
                log_attempt!(
                    self.log,
                    field,
                    sampled = verdict.stats.total_sampled,
                    "Skipping field that is null in every sampled row"
                );
                return FieldAttempt::skipped(field, raw, SkipReason::LikelyConstrained);
            }
        }

        let value = match self.sanitizer.sanitize(field, &raw) {
            Ok(value) => value,
            Err(e) => {
                log_attempt!(self.log, field, error = %e, "Sanitizer refused value");
                let reason = match e {
                    FieldError::ValueRejected { reason, .. } => reason,
                    other => other.to_string(),
                };
                return FieldAttempt::skipped(field, raw, SkipReason::ValueRejected(reason));
            }
        };

        let previous = draft.get(field).cloned();
        match store.try_write(draft, field, &value) {
            Ok(()) => {
                log_attempt!(
                    self.log,
                    field,
                    value = %truncate_field(&value.to_string(), self.log.max_field_length),
                    "Field accepted"
                );
                FieldAttempt::success(field, value)
            }
            Err(e) => {
                match previous {
                    Some(old) => {
                        draft.put(field, old);
                    }
                    None => {
                        draft.remove(field);
                    }
                }
                let err = FieldError::write_rejected(field, e);
                log_attempt!(self.log, field, error = %err, "Field rejected");
                FieldAttempt::failed(field, value, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRecordStore;

    fn ring_store() -> InMemoryRecordStore {
        InMemoryRecordStore::new("test").with_columns(["a", "b", "c", "duration", "type"])
    }

    #[test]
    fn test_stop_at_first_success() {
        let store = ring_store();
        let mut draft = AttributeMap::new();
        let summary = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::RingDuration,
                &["a", "b", "c"],
                WriteMode::StopAtFirstSuccess,
                FieldValue::Integer(7),
            )
            .unwrap();

        assert_eq!(summary.succeeded(), vec!["a"]);
        assert!(!summary.fallback_used);
        assert_eq!(summary.attempts.len(), 1);
        assert_eq!(store.write_attempts(), vec!["a"]);
        assert_eq!(draft.get_i64("a"), Some(7));
        assert!(!draft.contains("b"));
    }

    #[test]
    fn test_defensive_all_keeps_every_success() {
        let store = ring_store().reject_field("b", false);
        let mut draft = AttributeMap::new();
        let summary = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::RingDuration,
                &["a", "b", "c"],
                WriteMode::DefensiveAll,
                FieldValue::Integer(7),
            )
            .unwrap();

        assert_eq!(summary.succeeded(), vec!["a", "c"]);
        assert_eq!(summary.failed(), vec!["b"]);
        assert!(!summary.fallback_used);
        assert_eq!(draft.len(), 2);
    }

    #[test]
    fn test_failed_write_restores_previous_value() {
        let store = ring_store().reject_field("a", true).reject_field("b", true);
        let mut draft = AttributeMap::new();
        draft.put("a", 1_i64);

        let summary = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::RingDuration,
                &["a", "b"],
                WriteMode::DefensiveAll,
                FieldValue::Integer(9),
            )
            .unwrap();

        assert!(summary.is_unset());
        assert_eq!(draft.get_i64("a"), Some(1));
        assert!(!draft.contains("b"));
        assert_eq!(
            summary.warning().map(|w| w.kind),
            Some(crate::core::WarningKind::AllCandidatesFailed)
        );
    }

    #[test]
    fn test_fallback_used_on_last_candidate() {
        let store = ring_store().reject_field("a", false).reject_field("b", false);
        let mut draft = AttributeMap::new();
        let summary = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::MissedReason,
                &["a", "b", "c"],
                WriteMode::StopAtFirstSuccess,
                FieldValue::Integer(5),
            )
            .unwrap();
        assert!(summary.fallback_used);
        assert_eq!(summary.succeeded(), vec!["c"]);
    }

    #[test]
    fn test_single_candidate_is_also_the_last() {
        let store = ring_store();
        let mut draft = AttributeMap::new();
        let summary = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::MissedReason,
                &["a"],
                WriteMode::StopAtFirstSuccess,
                FieldValue::Integer(0),
            )
            .unwrap();
        assert!(summary.fallback_used);
        assert_eq!(summary.succeeded(), vec!["a"]);
        // Nothing was skipped over, so there is nothing to warn about.
        assert!(summary.warning().is_none());
    }

    #[test]
    fn test_invalid_names_never_submitted() {
        let store = ring_store();
        let mut draft = AttributeMap::new();
        for mode in [WriteMode::StopAtFirstSuccess, WriteMode::DefensiveAll] {
            let summary = FallbackWriter::new()
                .write_value(
                    &store,
                    &mut draft,
                    LogicalAttribute::RingDuration,
                    &["ring time", " ", "a"],
                    mode,
                    FieldValue::Integer(3),
                )
                .unwrap();
            assert_eq!(summary.skipped(), vec!["ring time", " "]);
        }
        assert!(store.write_attempts().iter().all(|f| f == "a"));
    }

    #[test]
    fn test_critical_attribute_unset_is_fatal() {
        let store = ring_store().reject_field("duration", false);
        let mut draft = AttributeMap::new();
        let err = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::Duration,
                &["duration"],
                WriteMode::StopAtFirstSuccess,
                FieldValue::Integer(30),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FieldError::CriticalAttributeUnset {
                attribute: LogicalAttribute::Duration,
                attempted: 1
            }
        ));
    }

    #[test]
    fn test_null_string_skipped() {
        let store = ring_store();
        let mut draft = AttributeMap::new();
        let summary = FallbackWriter::new()
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::SimIdentity,
                &["a"],
                WriteMode::DefensiveAll,
                FieldValue::from("NULL"),
            )
            .unwrap();
        assert!(matches!(
            summary.attempts[0].outcome,
            AttemptOutcome::Skipped(SkipReason::ValueRejected(_))
        ));
        assert!(store.write_attempts().is_empty());
    }

    #[test]
    fn test_prober_gates_optional_attributes_only() {
        let mut null_row = AttributeMap::new();
        null_row.put_null("a");
        null_row.put_null("duration");
        null_row.put("b", 6_i64);
        let store = ring_store().with_row(null_row);

        let writer = FallbackWriter::new().with_prober(Arc::new(SchemaProber::new()));
        let mut draft = AttributeMap::new();

        let ring = writer
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::RingDuration,
                &["a", "missing", "b"],
                WriteMode::DefensiveAll,
                FieldValue::Integer(4),
            )
            .unwrap();
        assert_eq!(
            ring.attempts.iter().map(|a| a.outcome.clone()).collect::<Vec<_>>(),
            vec![
                AttemptOutcome::Skipped(SkipReason::LikelyConstrained),
                AttemptOutcome::Skipped(SkipReason::SchemaUnsupported),
                AttemptOutcome::Success,
            ]
        );

        let duration = writer
            .write_value(
                &store,
                &mut draft,
                LogicalAttribute::Duration,
                &["duration"],
                WriteMode::StopAtFirstSuccess,
                FieldValue::Integer(10),
            )
            .unwrap();
        assert_eq!(duration.success_count(), 1);
        assert_eq!(store.probe_count("duration"), 0);
    }

    #[test]
    fn test_per_field_values() {
        let store = ring_store();
        let mut draft = AttributeMap::new();
        FallbackWriter::new()
            .write_attribute(
                &store,
                &mut draft,
                LogicalAttribute::RingDuration,
                &["a", "b"],
                WriteMode::DefensiveAll,
                |field| FieldValue::Integer(if field == "a" { 1 } else { 2 }),
            )
            .unwrap();
        assert_eq!(draft.get_i64("a"), Some(1));
        assert_eq!(draft.get_i64("b"), Some(2));
    }
}
