//! Record building: from a call intent to a populated draft.
//!
//! [`RecordPipeline::build`] runs the whole flow for one record:
//!
//! 1. Resolve the device profile for the manufacturer key.
//! 2. Settle the duration for the classification, substituting the default
//!    when the requested one is invalid.
//! 3. Write call type and duration (both critical).
//! 4. For missed and rejected calls, encode ring time: timestamps for
//!    vendors that derive it from them, then every ring-time candidate.
//! 5. Write the missed or reject reason.
//! 6. Write SIM identity when one was given.
//!
//! The draft is returned to the caller, who persists it.
//!
//! ```rust
//! use calllog_fields::config::WriterConfig;
//! use calllog_fields::core::CallClassification;
//! use calllog_fields::pipeline::{FixedClock, RecordPipeline, RecordRequest};
//! use calllog_fields::store::InMemoryRecordStore;
//!
//! let store = InMemoryRecordStore::new("s1")
//!     .with_platform_columns()
//!     .with_columns(["record_duration", "ring_time"]);
//! let pipeline = RecordPipeline::new(WriterConfig::default())
//!     .unwrap()
//!     .with_clock(FixedClock(1_700_000_000_000));
//!
//! let request = RecordRequest::new("vivo", CallClassification::Missed).with_ring_duration(15);
//! let outcome = pipeline.build(&store, request).unwrap();
//!
//! assert_eq!(outcome.draft.get_i64("type"), Some(3));
//! assert_eq!(outcome.draft.get_i64("duration"), Some(15));
//! assert_eq!(outcome.draft.get_i64("record_duration"), Some(15));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::WriterConfig;
use crate::core::{
    AttributeMap, CallClassification, DurationDecision, FieldValue, Warning, WarningKind,
    DEFAULT_RING_DURATION,
};
use crate::error::{FieldError, Result};
use crate::logging::LogConfig;
use crate::probe::SchemaProber;
use crate::registry::{fields, DeviceProfile, LogicalAttribute, ProfileRegistry};
use crate::sanitizer::{ValueSanitizer, MISSED_REASON_NONE, MISSED_REASON_REJECTED};
use crate::store::RecordStore;
use crate::timestamp::{derive_ring_timestamps, TimestampDerivation};
use crate::writer::{FallbackWriter, FieldAttempt, WriteMode, WriteSummary};

/// Source of "now" for timestamp anchoring.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock stuck at one instant, for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// The SIM a call went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimIdentity {
    /// Zero-based slot index
    pub slot: i64,
    /// Platform subscription id, if known
    pub subscription_id: Option<i64>,
    /// Phone account id
    pub account_id: String,
    /// Phone account component name
    pub component_name: String,
}

impl SimIdentity {
    pub fn new(
        slot: i64,
        account_id: impl Into<String>,
        component_name: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            subscription_id: None,
            account_id: account_id.into(),
            component_name: component_name.into(),
        }
    }

    pub fn with_subscription_id(mut self, subscription_id: i64) -> Self {
        self.subscription_id = Some(subscription_id);
        self
    }

    /// The value written to `field` for this SIM.
    fn value_for(&self, field: &str) -> FieldValue {
        match field {
            fields::SIMID => FieldValue::Integer(self.slot),
            fields::SUBSCRIPTION_ID => self
                .subscription_id
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Null),
            fields::SUBSCRIPTION_COMPONENT_NAME | fields::PHONE_ACCOUNT_COMPONENT_NAME => {
                FieldValue::Text(self.component_name.clone())
            }
            _ => FieldValue::Text(self.account_id.clone()),
        }
    }
}

/// What the caller wants recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRequest {
    pub manufacturer: String,
    pub classification: CallClassification,
    /// Talk time in seconds
    pub requested_duration: i64,
    /// Ring time in seconds, used by missed and rejected calls
    pub requested_ring_duration: i64,
    pub sim: Option<SimIdentity>,
    /// Fields the caller has already set (number, date, ...)
    pub draft: AttributeMap,
}

impl RecordRequest {
    /// A request with the classification's default duration and the default
    /// ring time.
    pub fn new(manufacturer: impl Into<String>, classification: CallClassification) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            classification,
            requested_duration: classification.default_duration(),
            requested_ring_duration: DEFAULT_RING_DURATION,
            sim: None,
            draft: AttributeMap::new(),
        }
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.requested_duration = seconds;
        self
    }

    pub fn with_ring_duration(mut self, seconds: i64) -> Self {
        self.requested_ring_duration = seconds;
        self
    }

    pub fn with_sim(mut self, sim: SimIdentity) -> Self {
        self.sim = Some(sim);
        self
    }

    pub fn with_draft(mut self, draft: AttributeMap) -> Self {
        self.draft = draft;
        self
    }

    /// Pre-sets one field on the draft.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.draft.put(field, value);
        self
    }
}

/// A populated draft plus everything learned while populating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub draft: AttributeMap,
    /// Every field attempt, in order
    pub diagnostics: Vec<FieldAttempt>,
    /// One summary per attribute written
    pub summaries: Vec<WriteSummary>,
    pub warnings: Vec<Warning>,
    /// Manufacturer key of the profile used
    pub profile: String,
    /// The classification actually recorded
    pub classification: CallClassification,
    pub duration: DurationDecision,
    pub timestamps: Option<TimestampDerivation>,
}

impl RecordOutcome {
    /// The first summary for `attribute`.
    pub fn summary_for(&self, attribute: LogicalAttribute) -> Option<&WriteSummary> {
        self.summaries.iter().find(|s| s.attribute == attribute)
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// Per-record working state.
struct Build<'a> {
    store: &'a dyn RecordStore,
    draft: AttributeMap,
    summaries: Vec<WriteSummary>,
    warnings: Vec<Warning>,
}

impl Build<'_> {
    fn record(&mut self, summary: WriteSummary) {
        if let Some(warning) = summary.warning() {
            self.warnings.push(warning);
        }
        self.summaries.push(summary);
    }
}

/// Builds record drafts for any vendor.
#[derive(Debug, Clone)]
pub struct RecordPipeline {
    registry: ProfileRegistry,
    writer: FallbackWriter,
    config: WriterConfig,
    clock: Arc<dyn Clock>,
}

impl RecordPipeline {
    /// Creates a pipeline with the built-in profiles and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Configuration`] if `config` is invalid.
    pub fn new(config: WriterConfig) -> Result<Self> {
        config.validate()?;
        let mut writer = FallbackWriter::new().with_sanitizer(ValueSanitizer::from_config(&config));
        if config.use_runtime_probe {
            writer = writer.with_prober(Arc::new(SchemaProber::from_config(&config)));
        }
        Ok(Self {
            registry: ProfileRegistry::builtin(),
            writer,
            config,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_registry(mut self, registry: ProfileRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Applies `log` to the writer and its prober. Cached schema answers
    /// are kept.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        let mut writer = self.writer.clone().with_log_config(log.clone());
        if let Some(prober) = self.writer.prober() {
            writer = writer.with_prober(Arc::new(prober.sharing_caches(log)));
        }
        self.writer = writer;
        self
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn writer(&self) -> &FallbackWriter {
        &self.writer
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Populates a draft for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::CriticalAttributeUnset`] when call type or
    /// duration cannot be written. Every other problem is reported through
    /// the outcome's diagnostics and warnings.
    #[instrument(skip(self, store, request), fields(
        session = store.session_id(),
        manufacturer = %request.manufacturer,
        classification = %request.classification
    ))]
    pub fn build(&self, store: &dyn RecordStore, request: RecordRequest) -> Result<RecordOutcome> {
        let mut build = Build {
            store,
            draft: request.draft,
            summaries: Vec::new(),
            warnings: Vec::new(),
        };

        let profile = match self.registry.lookup(&request.manufacturer) {
            Some(profile) => profile,
            None => {
                let err = FieldError::UnknownManufacturer {
                    manufacturer: request.manufacturer.clone(),
                };
                info!(error = %err, "Using default device profile");
                build.warnings.push(Warning::new(
                    WarningKind::UnknownManufacturer,
                    format!("{err}; using the default profile"),
                ));
                self.registry.default_profile()
            }
        };

        let classification = match request.classification {
            CallClassification::OutgoingUnanswered
            | CallClassification::VendorOutgoingUnanswered => profile.outgoing_unanswered(),
            other => other,
        };
        let rings = matches!(
            classification,
            CallClassification::Missed | CallClassification::Rejected
        );

        let ring = if rings {
            self.ring_duration(request.requested_ring_duration, &mut build.warnings)
        } else {
            0
        };

        let requested = if classification == CallClassification::Missed {
            ring
        } else {
            request.requested_duration
        };
        let duration = classification.finalize_duration(requested);
        if duration.is_warning() {
            warn!(
                requested = duration.requested,
                substituted = duration.value,
                "Invalid duration, using default"
            );
            build.warnings.push(
                Warning::new(
                    WarningKind::DurationSubstituted,
                    format!(
                        "duration {} is invalid for {classification}; wrote {}",
                        duration.requested, duration.value
                    ),
                )
                .for_attribute(LogicalAttribute::Duration),
            );
        }

        self.write_stop_at_first(
            &mut build,
            profile,
            LogicalAttribute::CallType,
            FieldValue::Integer(classification.type_code()),
        )?;
        self.write_stop_at_first(
            &mut build,
            profile,
            LogicalAttribute::Duration,
            FieldValue::Integer(duration.value),
        )?;

        let mut timestamps = None;
        match classification {
            CallClassification::Missed => {
                timestamps = self.encode_ring(&mut build, profile, ring, false)?;
                self.write_stop_at_first(
                    &mut build,
                    profile,
                    LogicalAttribute::MissedReason,
                    FieldValue::Integer(MISSED_REASON_NONE),
                )?;
            }
            CallClassification::Rejected => {
                timestamps = self.encode_ring(&mut build, profile, ring, true)?;
                self.write_reject_reason(&mut build, profile)?;
            }
            _ => {}
        }

        if let Some(sim) = &request.sim {
            self.write_sim(&mut build, profile, sim)?;
        }

        let diagnostics = build
            .summaries
            .iter()
            .flat_map(|s| s.attempts.iter().cloned())
            .collect();

        Ok(RecordOutcome {
            draft: build.draft,
            diagnostics,
            summaries: build.summaries,
            warnings: build.warnings,
            profile: profile.manufacturer().to_string(),
            classification,
            duration,
            timestamps,
        })
    }

    /// Builds every request in order. A failed record does not stop the
    /// batch.
    pub fn generate_batch<I>(
        &self,
        store: &dyn RecordStore,
        requests: I,
    ) -> Vec<Result<RecordOutcome>>
    where
        I: IntoIterator<Item = RecordRequest>,
    {
        requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let result = self.build(store, request);
                if let Err(e) = &result {
                    warn!(index, error = %e, "Record generation failed");
                }
                result
            })
            .collect()
    }

    fn ring_duration(&self, requested: i64, warnings: &mut Vec<Warning>) -> i64 {
        if requested >= 0 {
            return requested;
        }
        let fallback = self.config.default_ring_duration;
        warn!(requested, fallback, "Negative ring duration, using default");
        warnings.push(
            Warning::new(
                WarningKind::RingDurationSubstituted,
                format!("ring duration {requested} is negative; wrote {fallback}"),
            )
            .for_attribute(LogicalAttribute::RingDuration),
        );
        fallback
    }

    fn write_stop_at_first(
        &self,
        build: &mut Build<'_>,
        profile: &DeviceProfile,
        attribute: LogicalAttribute,
        value: FieldValue,
    ) -> Result<()> {
        let candidates = profile.candidate_fields(attribute);
        if candidates.is_empty() {
            return Ok(());
        }
        let summary = self.writer.write_value(
            build.store,
            &mut build.draft,
            attribute,
            candidates,
            WriteMode::StopAtFirstSuccess,
            value,
        )?;
        build.record(summary);
        Ok(())
    }

    /// Timestamps first (when the vendor derives ring time from them), then
    /// every ring-time candidate.
    fn encode_ring(
        &self,
        build: &mut Build<'_>,
        profile: &DeviceProfile,
        ring: i64,
        rejected: bool,
    ) -> Result<Option<TimestampDerivation>> {
        let timestamps = match profile.ring_timestamps() {
            Some(pair) => {
                match derive_ring_timestamps(&mut build.draft, pair, ring, self.clock.now_millis())
                {
                    Ok(derived) => Some(derived),
                    Err(e) => {
                        warn!(ring, error = %e, "Ring duration not encoded in timestamps");
                        build.warnings.push(
                            Warning::new(WarningKind::RingTimestampsSkipped, e.to_string())
                                .for_attribute(LogicalAttribute::RingDuration),
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let candidates: Vec<&str> = profile
            .candidate_fields(LogicalAttribute::RingDuration)
            .iter()
            .map(String::as_str)
            .filter(|f| !(rejected && *f == fields::DURATION))
            .collect();
        if !candidates.is_empty() {
            let summary = self.writer.write_attribute(
                build.store,
                &mut build.draft,
                LogicalAttribute::RingDuration,
                &candidates,
                WriteMode::DefensiveAll,
                |field| ring_value(field, ring, rejected),
            )?;
            build.record(summary);
        }
        Ok(timestamps)
    }

    /// The profile's own reason fields, then the generic ones the profile
    /// supports, stopping at the first accepted.
    fn write_reject_reason(&self, build: &mut Build<'_>, profile: &DeviceProfile) -> Result<()> {
        let mut candidates: Vec<&str> = Vec::new();
        let listed = profile
            .candidate_fields(LogicalAttribute::MissedReason)
            .iter()
            .map(String::as_str);
        for field in listed.chain(fields::GENERIC_REJECT_REASON_FIELDS) {
            if !candidates.contains(&field)
                && profile.supports(field, LogicalAttribute::MissedReason)
            {
                candidates.push(field);
            }
        }

        let summary = self.writer.write_attribute(
            build.store,
            &mut build.draft,
            LogicalAttribute::MissedReason,
            &candidates,
            WriteMode::StopAtFirstSuccess,
            reject_reason_value,
        )?;
        build.record(summary);
        Ok(())
    }

    /// Vendor SIM fields in defensive mode; the standard phone-account pair
    /// when none of them stick.
    fn write_sim(
        &self,
        build: &mut Build<'_>,
        profile: &DeviceProfile,
        sim: &SimIdentity,
    ) -> Result<()> {
        let candidates: Vec<&str> = profile
            .candidate_fields(LogicalAttribute::SimIdentity)
            .iter()
            .map(String::as_str)
            .filter(|f| *f != fields::SUBSCRIPTION_ID || sim.subscription_id.is_some())
            .collect();

        let vendor_written = if candidates.is_empty() {
            false
        } else {
            let summary = self.writer.write_attribute(
                build.store,
                &mut build.draft,
                LogicalAttribute::SimIdentity,
                &candidates,
                WriteMode::DefensiveAll,
                |field| sim.value_for(field),
            )?;
            let written = summary.success_count() > 0;
            // Superseded by the standard pair below when nothing stuck.
            if written {
                build.record(summary);
            } else {
                build.summaries.push(summary);
            }
            written
        };

        if !vendor_written {
            let summary = self.writer.write_attribute(
                build.store,
                &mut build.draft,
                LogicalAttribute::SimIdentity,
                &fields::STANDARD_SIM_FIELDS,
                WriteMode::DefensiveAll,
                |field| sim.value_for(field),
            )?;
            build.record(summary);
        }
        Ok(())
    }
}

/// The value a ring-time candidate receives.
fn ring_value(field: &str, ring: i64, rejected: bool) -> FieldValue {
    match field {
        fields::MISSED_REASON if rejected => FieldValue::Integer(MISSED_REASON_REJECTED),
        fields::MISSED_REASON => FieldValue::Integer(MISSED_REASON_NONE),
        fields::RING_TIMES => FieldValue::Integer(1),
        _ => FieldValue::Integer(ring),
    }
}

/// The value a reject-reason candidate receives.
fn reject_reason_value(field: &str) -> FieldValue {
    match field {
        fields::MISSED_REASON => FieldValue::from("rejected"),
        fields::IS_REJECTED => FieldValue::Integer(1),
        _ => FieldValue::Integer(MISSED_REASON_REJECTED),
    }
}
