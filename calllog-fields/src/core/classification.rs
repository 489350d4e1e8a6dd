//! Call classifications and their duration rules.
//!
//! Every record carries a canonical type code (the platform's call-log
//! `type` column) and a duration whose validity depends on the
//! classification: connected calls need a positive duration, rejected and
//! unanswered outgoing calls must be zero, and missed calls may carry their
//! ring time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type code for an answered incoming call.
pub const TYPE_INCOMING: i64 = 1;
/// Type code for an outgoing call.
pub const TYPE_OUTGOING: i64 = 2;
/// Type code for a missed call.
pub const TYPE_MISSED: i64 = 3;
/// Type code for a rejected call.
pub const TYPE_REJECTED: i64 = 5;

/// Ring time assumed for missed calls when none is given, in seconds.
pub const DEFAULT_RING_DURATION: i64 = 15;
/// Talk time substituted for connected calls with an invalid duration, in seconds.
pub const DEFAULT_TALK_DURATION: i64 = 15;

/// The kind of call a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallClassification {
    /// Outgoing call that connected
    Outgoing,
    /// Incoming call that was answered
    IncomingAnswered,
    /// Incoming call nobody answered
    Missed,
    /// Incoming call the user declined
    Rejected,
    /// Outgoing call that never connected
    OutgoingUnanswered,
    /// Outgoing call that never connected, in the vivo encoding
    VendorOutgoingUnanswered,
}

impl CallClassification {
    /// All classifications in declaration order.
    pub const ALL: [CallClassification; 6] = [
        CallClassification::Outgoing,
        CallClassification::IncomingAnswered,
        CallClassification::Missed,
        CallClassification::Rejected,
        CallClassification::OutgoingUnanswered,
        CallClassification::VendorOutgoingUnanswered,
    ];

    /// The canonical value written to the store's call-type field.
    ///
    /// Unanswered outgoing calls share the outgoing code; the store tells
    /// them apart by their zero duration.
    pub fn type_code(&self) -> i64 {
        match self {
            CallClassification::Outgoing
            | CallClassification::OutgoingUnanswered
            | CallClassification::VendorOutgoingUnanswered => TYPE_OUTGOING,
            CallClassification::IncomingAnswered => TYPE_INCOMING,
            CallClassification::Missed => TYPE_MISSED,
            CallClassification::Rejected => TYPE_REJECTED,
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CallClassification::Outgoing => "outgoing",
            CallClassification::IncomingAnswered => "incoming (answered)",
            CallClassification::Missed => "missed",
            CallClassification::Rejected => "rejected",
            CallClassification::OutgoingUnanswered => "outgoing (unanswered)",
            CallClassification::VendorOutgoingUnanswered => "outgoing (unanswered, vivo)",
        }
    }

    /// Whether the caller must supply a talk duration.
    pub fn requires_duration(&self) -> bool {
        matches!(
            self,
            CallClassification::Outgoing | CallClassification::IncomingAnswered
        )
    }

    /// The duration substituted when a requested one is invalid.
    pub fn default_duration(&self) -> i64 {
        match self {
            CallClassification::Outgoing | CallClassification::IncomingAnswered => {
                DEFAULT_TALK_DURATION
            }
            CallClassification::Missed => DEFAULT_RING_DURATION,
            CallClassification::Rejected
            | CallClassification::OutgoingUnanswered
            | CallClassification::VendorOutgoingUnanswered => 0,
        }
    }

    /// Whether `duration` (seconds) is valid for this classification.
    pub fn validate_duration(&self, duration: i64) -> bool {
        match self {
            CallClassification::Outgoing | CallClassification::IncomingAnswered => duration > 0,
            CallClassification::Missed => duration >= 0,
            CallClassification::Rejected
            | CallClassification::OutgoingUnanswered
            | CallClassification::VendorOutgoingUnanswered => duration == 0,
        }
    }

    /// Returns `requested` if valid, otherwise the default duration flagged
    /// as substituted.
    pub fn finalize_duration(&self, requested: i64) -> DurationDecision {
        if self.validate_duration(requested) {
            DurationDecision {
                classification: *self,
                requested,
                value: requested,
                substituted: false,
            }
        } else {
            DurationDecision {
                classification: *self,
                requested,
                value: self.default_duration(),
                substituted: true,
            }
        }
    }

    /// Looks up a classification by canonical type code.
    ///
    /// Codes shared by several classifications resolve to the first one in
    /// [`CallClassification::ALL`], so `2` is always [`Outgoing`](Self::Outgoing).
    pub fn from_type_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.type_code() == code)
    }
}

impl fmt::Display for CallClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The outcome of [`finalize_duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationDecision {
    pub classification: CallClassification,
    /// What the caller asked for
    pub requested: i64,
    /// What will be written
    pub value: i64,
    /// True when `requested` was invalid and the default was used
    pub substituted: bool,
}

impl DurationDecision {
    /// A substituted duration is a warning the caller must surface.
    pub fn is_warning(&self) -> bool {
        self.substituted
    }
}

/// Looks up a classification by canonical type code. `None` means the code
/// is unknown; pick an explicit default with [`classify_or`].
pub fn classify(raw_type_code: i64) -> Option<CallClassification> {
    CallClassification::from_type_code(raw_type_code)
}

/// Like [`classify`], with an explicit default for unknown codes.
pub fn classify_or(raw_type_code: i64, default: CallClassification) -> CallClassification {
    classify(raw_type_code).unwrap_or(default)
}

/// Whether `duration` is valid for `classification`.
pub fn validate_duration(classification: CallClassification, duration: i64) -> bool {
    classification.validate_duration(duration)
}

/// Validates `requested` against `classification`, substituting the default
/// on failure.
pub fn finalize_duration(classification: CallClassification, requested: i64) -> DurationDecision {
    classification.finalize_duration(requested)
}

/// Display name for a raw type code, `"unknown (<code>)"` for unknown codes.
pub fn type_name(raw_type_code: i64) -> String {
    match classify(raw_type_code) {
        Some(c) => c.display_name().to_string(),
        None => format!("unknown ({raw_type_code})"),
    }
}
