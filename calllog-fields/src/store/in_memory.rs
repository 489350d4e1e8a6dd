//! In-memory implementation of RecordStore for testing and development.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::instrument;

use crate::core::{AttributeMap, FieldValue};

use super::{RecordId, RecordStore, SampledValue, StoreError, WriteError};

#[derive(Debug, Clone)]
struct RejectRule {
    partial_apply: bool,
    message: String,
}

#[derive(Debug, Default)]
struct StoreState {
    columns: BTreeSet<String>,
    /// Oldest first.
    rows: Vec<AttributeMap>,
    rejected: HashMap<String, RejectRule>,
    fail_probes: bool,
    probe_calls: HashMap<String, usize>,
    sample_calls: HashMap<String, usize>,
    write_attempts: Vec<String>,
}

/// In-memory implementation of the [`RecordStore`] trait.
///
/// The schema is a set of column names. Individual columns can be set to
/// reject every write, optionally leaving the rejected value behind on the
/// draft the way a misbehaving provider does. Every probe, sample and write
/// attempt is counted so tests can assert on store traffic.
///
/// Clones share state.
///
/// # Example
///
/// ```rust
/// use calllog_fields::store::{InMemoryRecordStore, RecordStore};
///
/// let store = InMemoryRecordStore::new("s1")
///     .with_platform_columns()
///     .with_columns(["ring_time"])
///     .reject_field("ring_time", false);
///
/// assert!(store.probe_schema("ring_time").unwrap());
/// assert!(!store.probe_schema("record_duration").unwrap());
/// assert_eq!(store.probe_count("ring_time"), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore {
    session_id: String,
    state: Arc<RwLock<StoreState>>,
}

/// Columns every platform call-log store has.
const PLATFORM_COLUMNS: [&str; 9] = [
    "number",
    "type",
    "duration",
    "date",
    "last_modified",
    "new",
    "missed_reason",
    "phone_account_id",
    "phone_account_component_name",
];

impl InMemoryRecordStore {
    /// Creates a store with no columns.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Adds the standard platform columns.
    pub fn with_platform_columns(self) -> Self {
        self.with_columns(PLATFORM_COLUMNS)
    }

    /// Adds columns to the schema.
    pub fn with_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_state()
            .columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Seeds an existing record, newer than any seeded before it.
    pub fn with_row(self, row: AttributeMap) -> Self {
        self.write_state().rows.push(row);
        self
    }

    /// Makes every write to `field` fail with a constraint violation. With
    /// `partial_apply` the value stays on the draft after the failure.
    pub fn reject_field(self, field: impl Into<String>, partial_apply: bool) -> Self {
        let field = field.into();
        let message = format!("CHECK constraint failed: {field}");
        self.write_state().rejected.insert(
            field,
            RejectRule {
                partial_apply,
                message,
            },
        );
        self
    }

    /// Makes schema probes and sampling queries fail.
    pub fn fail_probes(self) -> Self {
        self.write_state().fail_probes = true;
        self
    }

    /// Number of `probe_schema` calls made for `field`.
    pub fn probe_count(&self, field: &str) -> usize {
        self.read_state()
            .probe_calls
            .get(field)
            .copied()
            .unwrap_or(0)
    }

    /// Number of `sample_recent` calls made for `field`.
    pub fn sample_count(&self, field: &str) -> usize {
        self.read_state()
            .sample_calls
            .get(field)
            .copied()
            .unwrap_or(0)
    }

    /// Fields passed to `try_write`, in call order.
    pub fn write_attempts(&self) -> Vec<String> {
        self.read_state().write_attempts.clone()
    }

    pub fn clear_write_attempts(&self) {
        self.write_state().write_attempts.clear();
    }

    /// Persisted records, oldest first.
    pub fn rows(&self) -> Vec<AttributeMap> {
        self.read_state().rows.clone()
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.read_state().columns.contains(field)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render(value: Option<&FieldValue>) -> SampledValue {
    match value {
        None | Some(FieldValue::Null) => SampledValue::null(),
        Some(FieldValue::Integer(v)) => SampledValue::value(v.to_string()),
        Some(FieldValue::Text(v)) => SampledValue::value(v.clone()),
        Some(FieldValue::Bytes(v)) => SampledValue::value(format!("<{} bytes>", v.len())),
    }
}

impl RecordStore for InMemoryRecordStore {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    #[instrument(skip(self), fields(session = %self.session_id))]
    fn probe_schema(&self, field: &str) -> Result<bool, StoreError> {
        let mut state = self.write_state();
        *state.probe_calls.entry(field.to_string()).or_insert(0) += 1;
        if state.fail_probes {
            return Err(StoreError::query(field, "schema query failed"));
        }
        Ok(state.columns.contains(field))
    }

    #[instrument(skip(self), fields(session = %self.session_id))]
    fn sample_recent(
        &self,
        field: &str,
        limit: usize,
    ) -> Result<Option<Vec<SampledValue>>, StoreError> {
        let mut state = self.write_state();
        *state.sample_calls.entry(field.to_string()).or_insert(0) += 1;
        if state.fail_probes {
            return Err(StoreError::query(field, "sampling query failed"));
        }
        if !state.columns.contains(field) {
            return Ok(None);
        }
        let samples = state
            .rows
            .iter()
            .rev()
            .take(limit)
            .map(|row| render(row.get(field)))
            .collect();
        Ok(Some(samples))
    }

    fn try_write(
        &self,
        draft: &mut AttributeMap,
        field: &str,
        value: &FieldValue,
    ) -> Result<(), WriteError> {
        let mut state = self.write_state();
        state.write_attempts.push(field.to_string());

        if !state.columns.contains(field) {
            return Err(WriteError::unknown_column(field));
        }
        if let Some(rule) = state.rejected.get(field) {
            if rule.partial_apply {
                draft.put(field, value.clone());
            }
            return Err(WriteError::constraint(field, rule.message.clone()));
        }
        draft.put(field, value.clone());
        Ok(())
    }

    #[instrument(skip(self, draft), fields(session = %self.session_id, fields = draft.len()))]
    fn insert(&self, draft: &AttributeMap) -> Result<RecordId, StoreError> {
        let mut state = self.write_state();
        if let Some(unknown) = draft.keys().find(|k| !state.columns.contains(*k)) {
            return Err(StoreError::rejected(format!("unknown column '{unknown}'")));
        }
        state.rows.push(draft.clone());
        Ok(RecordId(state.rows.len() as i64))
    }
}
