//! Ring time encoded as a timestamp delta.
//!
//! Samsung, Huawei, Honor and OPPO stores have no dependable ring-duration
//! column. Their call-log UIs instead derive ring time from the gap between
//! the call's start timestamp and its end timestamp, so the writer sets the
//! end to `start + ring_seconds * 1000`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{AttributeMap, FieldValue};
use crate::error::{FieldError, Result};
use crate::registry::TimestampFields;

/// The timestamps written by [`derive_ring_timestamps`], epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampDerivation {
    pub start: i64,
    pub end: i64,
}

impl TimestampDerivation {
    /// Whole seconds between start and end.
    pub fn ring_seconds(&self) -> i64 {
        (self.end - self.start) / 1000
    }
}

/// Writes the start and end timestamps so that their difference encodes
/// `ring_seconds`.
///
/// The start is the integer already in the draft under `fields.start`, or
/// `now_millis` when there is none. If adding the delta to the start would
/// overflow, the start is moved back far enough for it to fit. In every case
/// `(end - start) / 1000 == ring_seconds`.
///
/// # Errors
///
/// Returns [`FieldError::ValueRejected`] and leaves the draft untouched when
/// `ring_seconds` is negative or too large to express in milliseconds.
///
/// ```rust
/// use calllog_fields::core::AttributeMap;
/// use calllog_fields::registry::TimestampFields;
/// use calllog_fields::timestamp::derive_ring_timestamps;
///
/// let mut draft = AttributeMap::new();
/// draft.put("date", 1_700_000_000_000_i64);
///
/// let fields = TimestampFields::date_last_modified();
/// let derived = derive_ring_timestamps(&mut draft, &fields, 20, 0).unwrap();
/// assert_eq!(derived.start, 1_700_000_000_000);
/// assert_eq!(draft.get_i64("last_modified"), Some(1_700_000_020_000));
/// ```
pub fn derive_ring_timestamps(
    draft: &mut AttributeMap,
    fields: &TimestampFields,
    ring_seconds: i64,
    now_millis: i64,
) -> Result<TimestampDerivation> {
    if ring_seconds < 0 {
        return Err(FieldError::value_rejected(
            fields.end.as_str(),
            format!("ring duration {ring_seconds} is negative"),
        ));
    }
    let delta = ring_seconds.checked_mul(1000).ok_or_else(|| {
        FieldError::value_rejected(
            fields.end.as_str(),
            format!("ring duration {ring_seconds} overflows epoch milliseconds"),
        )
    })?;

    let anchor = draft
        .get(&fields.start)
        .and_then(FieldValue::as_i64)
        .unwrap_or(now_millis);

    let start = [anchor, now_millis]
        .into_iter()
        .find(|candidate| candidate.checked_add(delta).is_some())
        .unwrap_or(i64::MAX - delta);
    let end = start + delta;

    if start != anchor {
        debug!(anchor, start, "Re-anchored ring timestamps to avoid overflow");
    }

    draft.put(fields.start.as_str(), start);
    draft.put(fields.end.as_str(), end);

    Ok(TimestampDerivation { start, end })
}
