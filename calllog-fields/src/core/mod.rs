//! Core data model for call-record drafts.
//!
//! - **[`CallClassification`]**: the kind of call and its duration rules
//! - **[`AttributeMap`]**: the ordered field → value draft handed to the store
//! - **[`FieldValue`]**: a single storable value
//! - **[`Warning`]** and **[`Level`]**: non-fatal diagnostics
//!
//! Everything here is pure data; no module in `core` talks to a store.

mod classification;
mod draft;
mod level;
mod value;
mod warning;

pub use classification::{
    classify, classify_or, finalize_duration, type_name, validate_duration, CallClassification,
    DurationDecision, DEFAULT_RING_DURATION, DEFAULT_TALK_DURATION, TYPE_INCOMING, TYPE_MISSED,
    TYPE_OUTGOING, TYPE_REJECTED,
};
pub use draft::AttributeMap;
pub use level::Level;
pub use value::FieldValue;
pub use warning::{Warning, WarningKind};
