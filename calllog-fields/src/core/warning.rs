//! Non-fatal conditions surfaced to the caller alongside a finished draft.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Level;
use crate::registry::LogicalAttribute;

/// What kind of non-fatal condition occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The requested duration was invalid and the default was written
    DurationSubstituted,
    /// A negative ring duration was replaced by the configured default
    RingDurationSubstituted,
    /// The ring duration was too large to encode as a timestamp delta
    RingTimestampsSkipped,
    /// No candidate field accepted a value for an optional attribute
    AllCandidatesFailed,
    /// The last-priority candidate was the one that worked
    FallbackUsed,
    /// The manufacturer key matched no profile and the default was used
    UnknownManufacturer,
}

impl WarningKind {
    /// Severity of this kind of warning.
    pub fn level(&self) -> Level {
        match self {
            WarningKind::FallbackUsed | WarningKind::UnknownManufacturer => Level::Info,
            _ => Level::Warning,
        }
    }
}

/// A single non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// The logical attribute involved, if any
    pub attribute: Option<LogicalAttribute>,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            attribute: None,
            message: message.into(),
        }
    }

    /// Attaches the logical attribute this warning is about.
    pub fn for_attribute(mut self, attribute: LogicalAttribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    pub fn level(&self) -> Level {
        self.kind.level()
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attribute {
            Some(attribute) => write!(f, "[{}] {}: {}", self.level(), attribute, self.message),
            None => write!(f, "[{}] {}", self.level(), self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(WarningKind::FallbackUsed.level(), Level::Info);
        assert_eq!(WarningKind::AllCandidatesFailed.level(), Level::Warning);
    }

    #[test]
    fn test_display() {
        let warning = Warning::new(WarningKind::AllCandidatesFailed, "no field accepted 20")
            .for_attribute(LogicalAttribute::RingDuration);
        assert_eq!(
            warning.to_string(),
            "[warning] ring_duration: no field accepted 20"
        );
    }
}
