//! Field-name validation and value sanitizing.
//!
//! Every value passes through [`ValueSanitizer::sanitize`] before it is
//! offered to the store, and every field name through
//! [`is_valid_field_name`] before it is probed or written. Both guard against
//! values that vendor stores are known to reject with constraint errors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::WriterConfig;
use crate::core::{FieldValue, TYPE_MISSED};
use crate::error::{FieldError, Result};

/// `missed_reason` value for an ordinary missed call.
pub const MISSED_REASON_NONE: i64 = 0;
/// `missed_reason` value for a call the user rejected.
pub const MISSED_REASON_REJECTED: i64 = 5;

/// Returns true if `name` is a plain identifier: non-blank, no whitespace,
/// `^[A-Za-z_][A-Za-z0-9_]*$`.
///
/// ```rust
/// use calllog_fields::sanitizer::is_valid_field_name;
///
/// assert!(is_valid_field_name("ring_duration"));
/// assert!(is_valid_field_name("_id"));
/// assert!(!is_valid_field_name("ring duration"));
/// assert!(!is_valid_field_name("1st_ring"));
/// assert!(!is_valid_field_name("   "));
/// ```
pub fn is_valid_field_name(name: &str) -> bool {
    static FIELD_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
        // This regex is compile-time constant and known to be valid
        #[allow(clippy::expect_used)]
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Hard-coded regex pattern should be valid")
    });

    if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
        return false;
    }
    FIELD_NAME_REGEX.is_match(name)
}

/// How a field's values are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The call-type column
    CallType,
    /// Durations in seconds; never negative
    Duration,
    /// Counts that must be at least one (`ring_times`)
    Counter,
    /// Small enumerations (`missed_reason`)
    SmallEnum,
    /// Anything else
    Generic,
}

impl FieldKind {
    /// Classifies a field by name.
    pub fn of(field: &str) -> Self {
        match field {
            "type" => FieldKind::CallType,
            "ring_times" => FieldKind::Counter,
            "missed_reason" => FieldKind::SmallEnum,
            "duration" | "ring_time" => FieldKind::Duration,
            f if f.ends_with("_duration") || f.ends_with("_duration_seconds") => {
                FieldKind::Duration
            }
            _ => FieldKind::Generic,
        }
    }
}

/// Coerces values into ranges vendor stores accept.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSanitizer {
    max_string_length: usize,
    numeric_bound: i64,
    missed_reason_max: i64,
}

impl Default for ValueSanitizer {
    fn default() -> Self {
        Self {
            max_string_length: 255,
            numeric_bound: 1_000_000,
            missed_reason_max: 10,
        }
    }
}

impl ValueSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the limits from `config`.
    pub fn from_config(config: &WriterConfig) -> Self {
        Self {
            max_string_length: config.max_string_length,
            numeric_bound: config.numeric_bound,
            missed_reason_max: config.missed_reason_max,
        }
    }

    /// Returns the value that should be written to `field`.
    ///
    /// The literal string `"null"` (any case) is refused with
    /// [`FieldError::ValueRejected`]; an actual [`FieldValue::Null`] is a
    /// legal value and passes through generic fields unchanged.
    ///
    /// ```rust
    /// use calllog_fields::core::FieldValue;
    /// use calllog_fields::sanitizer::ValueSanitizer;
    ///
    /// let sanitizer = ValueSanitizer::new();
    /// let clean = sanitizer.sanitize("duration", &FieldValue::Integer(-4)).unwrap();
    /// assert_eq!(clean, FieldValue::Integer(0));
    ///
    /// let clean = sanitizer.sanitize("missed_reason", &"rejected".into()).unwrap();
    /// assert_eq!(clean, FieldValue::Integer(5));
    ///
    /// assert!(sanitizer.sanitize("ring_duration", &"null".into()).is_err());
    /// ```
    pub fn sanitize(&self, field: &str, value: &FieldValue) -> Result<FieldValue> {
        if let FieldValue::Text(text) = value {
            if text.eq_ignore_ascii_case("null") {
                return Err(FieldError::value_rejected(
                    field,
                    "the string 'null' is not a value",
                ));
            }
        }

        let sanitized = match FieldKind::of(field) {
            // Only real integers count here; numeric text falls back to Missed.
            FieldKind::CallType => match value.as_i64() {
                Some(code) if (1..=6).contains(&code) => FieldValue::Integer(code),
                _ => FieldValue::Integer(TYPE_MISSED),
            },
            FieldKind::Duration => FieldValue::Integer(value.to_i64_lossy().unwrap_or(0).max(0)),
            FieldKind::Counter => match value.to_i64_lossy() {
                Some(count) if count > 0 => FieldValue::Integer(count),
                _ => FieldValue::Integer(1),
            },
            FieldKind::SmallEnum => FieldValue::Integer(self.small_enum(value)),
            FieldKind::Generic => self.generic(value),
        };
        Ok(sanitized)
    }

    fn small_enum(&self, value: &FieldValue) -> i64 {
        if let FieldValue::Text(text) = value {
            if text.eq_ignore_ascii_case("rejected") {
                return MISSED_REASON_REJECTED;
            }
        }
        match value.to_i64_lossy() {
            Some(v) if (0..=self.missed_reason_max).contains(&v) => v,
            _ => MISSED_REASON_NONE,
        }
    }

    fn generic(&self, value: &FieldValue) -> FieldValue {
        match value {
            FieldValue::Integer(v) => {
                FieldValue::Integer((*v).clamp(-self.numeric_bound, self.numeric_bound))
            }
            FieldValue::Text(text) if text.encode_utf16().count() > self.max_string_length => {
                FieldValue::Text(truncate_utf16(text, self.max_string_length).to_string())
            }
            other => other.clone(),
        }
    }
}

/// The longest prefix of `text` that fits in `max_units` UTF-16 code units,
/// never splitting a surrogate pair.
fn truncate_utf16(text: &str, max_units: usize) -> &str {
    let mut units = 0;
    let end = text
        .char_indices()
        .find_map(|(idx, c)| {
            units += c.len_utf16();
            (units > max_units).then_some(idx)
        })
        .unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_field_names() {
        assert!(is_valid_field_name("missed_reason"));
        assert!(is_valid_field_name("data1"));
        assert!(is_valid_field_name("_private"));
        assert!(is_valid_field_name("A"));
    }

    #[test]
    fn test_invalid_field_names() {
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name(" "));
        assert!(!is_valid_field_name("ring time"));
        assert!(!is_valid_field_name("ring_time "));
        assert!(!is_valid_field_name("ring\ttime"));
        assert!(!is_valid_field_name("ring-time"));
        assert!(!is_valid_field_name("9lives"));
        assert!(!is_valid_field_name("calls.type"));
        assert!(!is_valid_field_name("id; DROP TABLE calls"));
    }

    #[test]
    fn test_field_kind() {
        assert_eq!(FieldKind::of("type"), FieldKind::CallType);
        assert_eq!(FieldKind::of("duration"), FieldKind::Duration);
        assert_eq!(FieldKind::of("record_duration"), FieldKind::Duration);
        assert_eq!(FieldKind::of("ring_duration_seconds"), FieldKind::Duration);
        assert_eq!(FieldKind::of("ring_time"), FieldKind::Duration);
        assert_eq!(FieldKind::of("ring_times"), FieldKind::Counter);
        assert_eq!(FieldKind::of("missed_reason"), FieldKind::SmallEnum);
        assert_eq!(FieldKind::of("data1"), FieldKind::Generic);
    }

    fn int(s: &ValueSanitizer, field: &str, value: impl Into<FieldValue>) -> Option<i64> {
        s.sanitize(field, &value.into()).unwrap().as_i64()
    }

    #[test]
    fn test_duration_coercion() {
        let s = ValueSanitizer::new();
        assert_eq!(int(&s, "duration", 30_i64), Some(30));
        assert_eq!(int(&s, "duration", -1_i64), Some(0));
        assert_eq!(int(&s, "duration", "17"), Some(17));
        assert_eq!(int(&s, "duration", "abc"), Some(0));
        assert_eq!(int(&s, "duration", FieldValue::Null), Some(0));
        assert_eq!(int(&s, "ring_duration", FieldValue::Bytes(vec![1])), Some(0));
    }

    #[test]
    fn test_missed_reason_coercion() {
        let s = ValueSanitizer::new();
        assert_eq!(int(&s, "missed_reason", 5_i64), Some(5));
        assert_eq!(int(&s, "missed_reason", 11_i64), Some(0));
        assert_eq!(int(&s, "missed_reason", -2_i64), Some(0));
        assert_eq!(int(&s, "missed_reason", "REJECTED"), Some(5));
        assert_eq!(int(&s, "missed_reason", "busy"), Some(0));
    }

    #[test]
    fn test_counter_and_type_coercion() {
        let s = ValueSanitizer::new();
        assert_eq!(int(&s, "ring_times", 0_i64), Some(1));
        assert_eq!(int(&s, "ring_times", 4_i64), Some(4));
        assert_eq!(int(&s, "type", 5_i64), Some(5));
        assert_eq!(int(&s, "type", 42_i64), Some(3));
        assert_eq!(int(&s, "type", "2"), Some(3));
    }

    #[test]
    fn test_generic_coercion() {
        let s = ValueSanitizer::new();
        assert_eq!(int(&s, "data1", 5_000_000_i64), Some(1_000_000));
        assert_eq!(int(&s, "data1", -5_000_000_i64), Some(-1_000_000));
        assert_eq!(s.sanitize("data1", &FieldValue::Null).unwrap(), FieldValue::Null);

        let long = "x".repeat(300);
        let truncated = s.sanitize("subscription_component_name", &long.into()).unwrap();
        assert_eq!(truncated.as_str().map(str::len), Some(255));

        let multibyte = "通".repeat(256);
        let truncated = s.sanitize("reason", &multibyte.into()).unwrap();
        assert_eq!(truncated.as_str().map(|t| t.chars().count()), Some(255));
    }

    #[test]
    fn test_truncation_counts_utf16_units() {
        let s = ValueSanitizer::new();

        // 200 astral-plane characters are 400 UTF-16 code units.
        let emoji = "😀".repeat(200);
        let truncated = s.sanitize("reason", &emoji.into()).unwrap();
        let text = truncated.as_str().unwrap();
        assert_eq!(text.encode_utf16().count(), 254);
        assert_eq!(text.chars().count(), 127);
        assert!(text.chars().all(|c| c == '😀'));

        let mixed = format!("{}😀", "a".repeat(254));
        let truncated = s.sanitize("reason", &mixed.into()).unwrap();
        assert_eq!(truncated.as_str(), Some("a".repeat(254).as_str()));

        let fits = "😀".repeat(127);
        assert_eq!(
            s.sanitize("reason", &fits.clone().into()).unwrap(),
            FieldValue::Text(fits)
        );
    }

    #[test]
    fn test_null_string_rejected_but_null_allowed() {
        let s = ValueSanitizer::new();
        for literal in ["null", "NULL", "Null"] {
            let err = s.sanitize("ring_time", &literal.into()).unwrap_err();
            assert!(matches!(err, FieldError::ValueRejected { .. }));
        }
        assert_eq!(s.sanitize("reason", &FieldValue::Null).unwrap(), FieldValue::Null);
        assert_eq!(s.sanitize("reason", &"".into()).unwrap(), FieldValue::Text(String::new()));
    }

    #[test]
    fn test_limits_from_config() {
        let config = WriterConfig::default().with_numeric_bound(100);
        let s = ValueSanitizer::from_config(&config);
        assert_eq!(int(&s, "data2", 150_i64), Some(100));
    }
}
