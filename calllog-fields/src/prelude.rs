//! Prelude for commonly used types and traits in calllog-fields.

pub use crate::config::WriterConfig;
pub use crate::core::{AttributeMap, CallClassification, FieldValue, Warning, WarningKind};
pub use crate::error::{FieldError, Result};
pub use crate::logging::LogConfig;
pub use crate::pipeline::{RecordOutcome, RecordPipeline, RecordRequest, SimIdentity};
pub use crate::registry::{LogicalAttribute, ProfileRegistry};
pub use crate::store::{InMemoryRecordStore, RecordStore};
pub use crate::writer::{FallbackWriter, WriteMode};
