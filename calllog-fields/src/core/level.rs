//! Diagnostic severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a record-generation diagnostic.
///
/// Levels are ordered by severity: Warning > Info. A record that cannot be
/// produced at all is a [`FieldError`](crate::error::FieldError), not a
/// diagnostic.
///
/// - **Warning**: the record was produced, but something was substituted or
///   every candidate for an optional attribute failed
/// - **Info**: observations such as a fallback field being used
///
/// ```rust
/// use calllog_fields::core::Level;
///
/// assert!(Level::Warning > Level::Info);
/// assert_eq!(Level::default(), Level::Warning);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Informational level
    Info = 0,
    /// Something was substituted or skipped but the record is usable
    #[default]
    Warning = 1,
}

impl Level {
    /// Returns the string representation of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
        }
    }

    /// Checks if this level is at least as severe as another level.
    pub fn is_at_least(&self, other: Level) -> bool {
        *self >= other
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
