//! The record store abstraction.
//!
//! A [`RecordStore`] is the platform's call-log provider as seen by the
//! writer: it can report whether a field exists, sample recent values of a
//! field, accept or refuse a value for a field on a draft, and finally
//! persist the draft. Implementations decide how these map onto their
//! storage; [`InMemoryRecordStore`] is a configurable fake used in tests and
//! development.
//!
//! # Example
//!
//! ```rust
//! use calllog_fields::core::{AttributeMap, FieldValue};
//! use calllog_fields::store::{InMemoryRecordStore, RecordStore};
//!
//! let store = InMemoryRecordStore::new("session-1").with_columns(["type", "duration"]);
//!
//! let mut draft = AttributeMap::new();
//! store.try_write(&mut draft, "duration", &FieldValue::Integer(30)).unwrap();
//! assert!(store.try_write(&mut draft, "ring_time", &FieldValue::Integer(5)).is_err());
//!
//! let id = store.insert(&draft).unwrap();
//! assert_eq!(id.0, 1);
//! ```

mod in_memory;

pub use in_memory::InMemoryRecordStore;

use std::fmt;
use thiserror::Error;

use crate::core::{AttributeMap, FieldValue};

/// Errors raised by the store itself rather than by a single field write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached at all.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A schema or sampling query failed.
    #[error("Query on '{field}' failed: {message}")]
    Query { field: String, message: String },

    /// The store refused to persist a draft.
    #[error("Insert rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn query(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Why the store refused a single field value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("Unknown column '{field}'")]
    UnknownColumn { field: String },

    #[error("Constraint violation on '{field}': {message}")]
    ConstraintViolation { field: String, message: String },

    #[error("Permission denied writing '{field}'")]
    Permission { field: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WriteError {
    pub fn unknown_column(field: impl Into<String>) -> Self {
        Self::UnknownColumn {
            field: field.into(),
        }
    }

    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn permission(field: impl Into<String>) -> Self {
        Self::Permission {
            field: field.into(),
        }
    }
}

/// One value read back while sampling a field's recent usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledValue {
    value: Option<String>,
}

impl SampledValue {
    pub fn null() -> Self {
        Self { value: None }
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Identifier of a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A call-log store whose schema varies by vendor.
///
/// All methods take `&self`; implementations that keep state use interior
/// mutability so a store can be shared across threads.
pub trait RecordStore: Send + Sync {
    /// Identifies the store session. Probe results are memoized per session.
    fn session_id(&self) -> &str;

    /// Returns whether `field` exists in the store's schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema could not be queried.
    fn probe_schema(&self, field: &str) -> Result<bool, StoreError>;

    /// Returns up to `limit` values of `field` from the most recent records,
    /// newest first. `Ok(None)` means the field cannot be queried.
    ///
    /// # Errors
    ///
    /// Returns an error if the query itself failed.
    fn sample_recent(
        &self,
        field: &str,
        limit: usize,
    ) -> Result<Option<Vec<SampledValue>>, StoreError>;

    /// Sets `field` to `value` on `draft`, or refuses it.
    ///
    /// A refusing implementation may leave `draft` partially modified; the
    /// caller restores the field afterwards.
    fn try_write(
        &self,
        draft: &mut AttributeMap,
        field: &str,
        value: &FieldValue,
    ) -> Result<(), WriteError> {
        draft.put(field, value.clone());
        Ok(())
    }

    /// Persists `draft` as a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the record.
    fn insert(&self, draft: &AttributeMap) -> Result<RecordId, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_messages() {
        assert_eq!(
            WriteError::unknown_column("data9").to_string(),
            "Unknown column 'data9'"
        );
        assert_eq!(
            WriteError::constraint("ring_time", "CHECK constraint failed").to_string(),
            "Constraint violation on 'ring_time': CHECK constraint failed"
        );
        let wrapped: WriteError = StoreError::unavailable("provider gone").into();
        assert_eq!(wrapped.to_string(), "Store unavailable: provider gone");
    }

    #[test]
    fn test_sampled_value() {
        assert!(SampledValue::null().is_null());
        let v = SampledValue::value("15");
        assert!(!v.is_null());
        assert_eq!(v.as_str(), Some("15"));
    }

    #[test]
    fn test_default_try_write_puts_value() {
        struct AcceptAll;

        impl RecordStore for AcceptAll {
            fn session_id(&self) -> &str {
                "accept-all"
            }
            fn probe_schema(&self, _field: &str) -> Result<bool, StoreError> {
                Ok(true)
            }
            fn sample_recent(
                &self,
                _field: &str,
                _limit: usize,
            ) -> Result<Option<Vec<SampledValue>>, StoreError> {
                Ok(Some(Vec::new()))
            }
            fn insert(&self, _draft: &AttributeMap) -> Result<RecordId, StoreError> {
                Ok(RecordId(1))
            }
        }

        let mut draft = AttributeMap::new();
        AcceptAll
            .try_write(&mut draft, "anything", &FieldValue::Integer(3))
            .unwrap();
        assert_eq!(draft.get_i64("anything"), Some(3));
    }
}
