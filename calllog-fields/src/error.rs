//! Error types for the call-record field writer.
//!
//! All fallible operations in this crate return [`FieldError`]. Most of the
//! variants describe per-field problems that the fallback writer records as
//! diagnostics and never propagates; only [`FieldError::CriticalAttributeUnset`]
//! aborts record generation.

use thiserror::Error;

use crate::registry::LogicalAttribute;
use crate::store::{StoreError, WriteError};

/// The main error type for the field writer.
#[derive(Error, Debug)]
pub enum FieldError {
    /// The field is absent from the store schema. Non-fatal, the field is skipped.
    #[error("Field '{field}' is not present in the store schema")]
    SchemaUnsupported {
        /// Name of the missing field
        field: String,
    },

    /// The sanitizer could not produce a usable value. Non-fatal.
    #[error("Value rejected for field '{field}': {reason}")]
    ValueRejected {
        /// Field the value was meant for
        field: String,
        /// Why the value was refused
        reason: String,
    },

    /// The store refused a value at write time. Non-fatal per field.
    #[error("Store rejected write to '{field}': {source}")]
    WriteRejected {
        /// Field the store refused
        field: String,
        /// Underlying store error
        #[source]
        source: WriteError,
    },

    /// No device profile matches the manufacturer key.
    ///
    /// The registry resolves this with the default profile, so it only
    /// surfaces through logs and diagnostics.
    #[error("No device profile for manufacturer '{manufacturer}'")]
    UnknownManufacturer { manufacturer: String },

    /// Call type or duration could not be written by any candidate field.
    #[error(
        "Critical attribute '{attribute}' could not be written ({attempted} candidates attempted)"
    )]
    CriticalAttributeUnset {
        /// The attribute that stayed unset
        attribute: LogicalAttribute,
        /// Number of candidate fields that were tried
        attempted: usize,
    },

    /// Error reported by the record store itself.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A type alias for `Result<T, FieldError>`.
pub type Result<T> = std::result::Result<T, FieldError>;

impl FieldError {
    /// Creates a schema-unsupported error for the given field.
    pub fn schema_unsupported(field: impl Into<String>) -> Self {
        Self::SchemaUnsupported {
            field: field.into(),
        }
    }

    /// Creates a value-rejected error.
    pub fn value_rejected(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValueRejected {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a write-rejected error wrapping the store's reason.
    pub fn write_rejected(field: impl Into<String>, source: WriteError) -> Self {
        Self::WriteRejected {
            field: field.into(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true if this error must abort the record being generated.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CriticalAttributeUnset { .. })
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_schema_unsupported_message() {
        let err = FieldError::schema_unsupported("record_duration");
        assert_eq!(
            err.to_string(),
            "Field 'record_duration' is not present in the store schema"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_write_rejected_keeps_source() {
        let err = FieldError::write_rejected(
            "ring_time",
            WriteError::constraint("ring_time", "CHECK constraint failed"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("ring_time"));
    }

    #[test]
    fn test_critical_attribute_is_fatal() {
        let err = FieldError::CriticalAttributeUnset {
            attribute: LogicalAttribute::Duration,
            attempted: 1,
        };
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Critical attribute 'duration' could not be written (1 candidates attempted)"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: FieldError = StoreError::unavailable("provider gone").into();
        assert!(matches!(err, FieldError::Store(_)));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parsed: std::result::Result<u32, serde_json::Error> = serde_json::from_str("nope");
        let err: FieldError = parsed.unwrap_err().into();
        assert!(matches!(err, FieldError::Serialization(_)));
    }
}
