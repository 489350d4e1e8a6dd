//! # calllog-fields - schema-fallback writer for call-record stores
//!
//! Platform call-log stores look alike from the outside, but every vendor
//! adds columns, leaves others out, and attaches constraints nobody
//! documents. A ring duration that vivo keeps in `record_duration` lives in
//! `ring_time` on one Xiaomi build, in a timestamp delta on Samsung, and in
//! nothing at all on stock Android. This crate decides which physical
//! fields to populate for a logical call intent, and survives the store
//! refusing any of them.
//!
//! ## Quick Start
//!
//! ```rust
//! use calllog_fields::prelude::*;
//!
//! # fn example() -> calllog_fields::error::Result<()> {
//! let store = InMemoryRecordStore::new("session-1")
//!     .with_platform_columns()
//!     .with_columns(["ring_duration"]);
//!
//! let pipeline = RecordPipeline::new(WriterConfig::default())?;
//!
//! let outcome = pipeline.build(
//!     &store,
//!     RecordRequest::new("Pixel", CallClassification::Rejected).with_ring_duration(20),
//! )?;
//!
//! assert_eq!(outcome.draft.get_i64("type"), Some(5));
//! assert_eq!(outcome.draft.get_i64("duration"), Some(0));
//! assert_eq!(outcome.draft.get_i64("missed_reason"), Some(5));
//!
//! for warning in &outcome.warnings {
//!     println!("{warning}");
//! }
//!
//! // Persisting the draft is up to the caller.
//! store.insert(&outcome.draft)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Key Features
//!
//! - **Call classification**: canonical type codes and per-kind duration
//!   rules, with defaults substituted (and flagged) for invalid durations
//! - **Device profiles**: ordered candidate fields per vendor and attribute,
//!   with a default profile for anything unrecognised
//! - **Runtime probing**: existence and recent-usage checks against the live
//!   store, memoized per store session
//! - **Sanitizing**: range and type coercion before any value reaches the
//!   store
//! - **Fallback writing**: stop-at-first-success or try-everything modes,
//!   with per-attempt diagnostics and rollback of refused writes
//! - **Timestamp encoding**: ring time as a start/end delta for vendors that
//!   derive it that way
//!
//! ## Architecture
//!
//! - **`core`**: classifications, the record draft, values and warnings
//! - **`registry`**: device profiles and field names
//! - **`sanitizer`**: field-name validation and value coercion
//! - **`probe`**: the memoizing schema prober
//! - **`writer`**: the fallback writer and its attempt records
//! - **`timestamp`**: ring time as a timestamp delta
//! - **`pipeline`**: record building and batches
//! - **`store`**: the store trait and an in-memory implementation
//! - **`config`**, **`logging`**, **`error`**: the usual

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod probe;
pub mod registry;
pub mod sanitizer;
pub mod store;
pub mod timestamp;
pub mod writer;
