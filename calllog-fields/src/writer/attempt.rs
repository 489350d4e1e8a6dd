//! Per-field attempt records and their per-attribute summary.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WriteMode;
use crate::core::{FieldValue, Warning, WarningKind};
use crate::registry::LogicalAttribute;

/// Why a field was not submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The name is not a plain identifier
    InvalidFieldName,
    /// The prober found no such field
    SchemaUnsupported,
    /// The field exists but is null in every sampled row
    LikelyConstrained,
    /// The sanitizer refused the value
    ValueRejected(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidFieldName => f.write_str("invalid field name"),
            SkipReason::SchemaUnsupported => f.write_str("not in store schema"),
            SkipReason::LikelyConstrained => f.write_str("null in every sampled row"),
            SkipReason::ValueRejected(reason) => write!(f, "value rejected: {reason}"),
        }
    }
}

/// The outcome of one field attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The store accepted the value
    Success,
    /// The field was never submitted
    Skipped(SkipReason),
    /// The store refused the value
    Failed(String),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, AttemptOutcome::Skipped(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AttemptOutcome::Failed(_))
    }

    /// Human-readable reason for anything but success.
    pub fn reason(&self) -> Option<String> {
        match self {
            AttemptOutcome::Success => None,
            AttemptOutcome::Skipped(reason) => Some(reason.to_string()),
            AttemptOutcome::Failed(reason) => Some(reason.clone()),
        }
    }
}

/// One field tried for one logical attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAttempt {
    pub field: String,
    /// The value offered, after sanitizing when it got that far
    pub value: FieldValue,
    pub outcome: AttemptOutcome,
}

impl FieldAttempt {
    pub fn success(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            value,
            outcome: AttemptOutcome::Success,
        }
    }

    pub fn skipped(field: impl Into<String>, value: FieldValue, reason: SkipReason) -> Self {
        Self {
            field: field.into(),
            value,
            outcome: AttemptOutcome::Skipped(reason),
        }
    }

    pub fn failed(field: impl Into<String>, value: FieldValue, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value,
            outcome: AttemptOutcome::Failed(reason.into()),
        }
    }
}

/// Everything that happened while writing one logical attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub attribute: LogicalAttribute,
    pub mode: WriteMode,
    /// Attempts in candidate order
    pub attempts: Vec<FieldAttempt>,
    /// The accepted field was the last candidate (stop-at-first-success
    /// mode), including when it was the only one
    pub fallback_used: bool,
}

impl WriteSummary {
    pub fn new(attribute: LogicalAttribute, mode: WriteMode) -> Self {
        Self {
            attribute,
            mode,
            attempts: Vec::new(),
            fallback_used: false,
        }
    }

    /// Fields the store accepted.
    pub fn succeeded(&self) -> Vec<&str> {
        self.fields_where(AttemptOutcome::is_success)
    }

    /// Fields the store refused.
    pub fn failed(&self) -> Vec<&str> {
        self.fields_where(AttemptOutcome::is_failure)
    }

    /// Fields never submitted.
    pub fn skipped(&self) -> Vec<&str> {
        self.fields_where(AttemptOutcome::is_skipped)
    }

    pub fn success_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.outcome.is_success()).count()
    }

    /// True when there were candidates and none was accepted.
    pub fn is_unset(&self) -> bool {
        !self.attempts.is_empty() && self.success_count() == 0
    }

    /// The warning this summary raises, if any.
    pub fn warning(&self) -> Option<Warning> {
        if self.is_unset() {
            let failed: Vec<String> = self
                .attempts
                .iter()
                .map(|a| match a.outcome.reason() {
                    Some(reason) => format!("{} ({reason})", a.field),
                    None => a.field.clone(),
                })
                .collect();
            return Some(
                Warning::new(
                    WarningKind::AllCandidatesFailed,
                    format!("no candidate accepted a value: {}", failed.join(", ")),
                )
                .for_attribute(self.attribute),
            );
        }
        // A lone candidate is also the last one; that is no fallback worth
        // reporting.
        if self.fallback_used && self.attempts.len() > 1 {
            let field = self.succeeded().first().map(|f| f.to_string()).unwrap_or_default();
            return Some(
                Warning::new(
                    WarningKind::FallbackUsed,
                    format!("written through last-resort field '{field}'"),
                )
                .for_attribute(self.attribute),
            );
        }
        None
    }

    fn fields_where(&self, pred: impl Fn(&AttemptOutcome) -> bool) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| pred(&a.outcome))
            .map(|a| a.field.as_str())
            .collect()
    }
}
