//! Device profiles: which physical fields each vendor's store is expected to
//! accept for each logical attribute.
//!
//! Profiles are authored data, the "best guess" layer of the writer. The
//! [`SchemaProber`](crate::probe::SchemaProber) checks these guesses against
//! the live store at write time.
//!
//! ```rust
//! use calllog_fields::registry::{LogicalAttribute, ProfileRegistry};
//!
//! let registry = ProfileRegistry::builtin();
//!
//! let vivo = registry.profile_for("vivo");
//! assert_eq!(vivo.candidate_fields(LogicalAttribute::RingDuration)[0], "record_duration");
//!
//! // Unknown manufacturers get the default profile, never an error.
//! let other = registry.profile_for("unknown-oem");
//! assert!(other.is_default());
//! ```

pub mod fields;
mod profiles;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::core::CallClassification;
use crate::sanitizer::is_valid_field_name;

/// A caller-facing concept that maps to zero or more physical fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalAttribute {
    CallType,
    Duration,
    RingDuration,
    MissedReason,
    SimIdentity,
}

impl LogicalAttribute {
    pub const ALL: [LogicalAttribute; 5] = [
        LogicalAttribute::CallType,
        LogicalAttribute::Duration,
        LogicalAttribute::RingDuration,
        LogicalAttribute::MissedReason,
        LogicalAttribute::SimIdentity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalAttribute::CallType => "call_type",
            LogicalAttribute::Duration => "duration",
            LogicalAttribute::RingDuration => "ring_duration",
            LogicalAttribute::MissedReason => "missed_reason",
            LogicalAttribute::SimIdentity => "sim_identity",
        }
    }

    /// Critical attributes abort the record when no candidate accepts them.
    pub fn is_critical(&self) -> bool {
        matches!(self, LogicalAttribute::CallType | LogicalAttribute::Duration)
    }
}

impl fmt::Display for LogicalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pair of timestamp fields whose difference encodes ring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampFields {
    /// Call start, epoch milliseconds
    pub start: String,
    /// Call end, epoch milliseconds
    pub end: String,
}

impl TimestampFields {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// `date` / `last_modified`, the pair used by every built-in profile.
    pub fn date_last_modified() -> Self {
        Self::new(fields::DATE, fields::LAST_MODIFIED)
    }
}

/// Candidate fields for one manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    manufacturer: String,
    description: String,
    candidates: BTreeMap<LogicalAttribute, Vec<String>>,
    ring_timestamps: Option<TimestampFields>,
    outgoing_unanswered: CallClassification,
    is_default: bool,
}

impl DeviceProfile {
    /// Starts building a profile for `manufacturer` (matched case-insensitively).
    pub fn builder(manufacturer: impl Into<String>) -> DeviceProfileBuilder {
        DeviceProfileBuilder::new(manufacturer)
    }

    /// Lower-case manufacturer key.
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Ordered candidates for `attribute`, most preferred first. Empty when
    /// the profile has none; callers skip the attribute.
    pub fn candidate_fields(&self, attribute: LogicalAttribute) -> &[String] {
        self.candidates
            .get(&attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Timestamp pair used to encode ring time, if this vendor needs it.
    pub fn ring_timestamps(&self) -> Option<&TimestampFields> {
        self.ring_timestamps.as_ref()
    }

    pub fn encodes_ring_via_timestamps(&self) -> bool {
        self.ring_timestamps.is_some()
    }

    /// The classification this vendor uses for unanswered outgoing calls.
    pub fn outgoing_unanswered(&self) -> CallClassification {
        self.outgoing_unanswered
    }

    /// True for the generic profile returned for unknown manufacturers.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Whether `field` may be tried for `attribute` on this device.
    ///
    /// Listed candidates are always supported. Generic reject-reason fields
    /// are supported for [`LogicalAttribute::MissedReason`]. Anything else is
    /// allowed when its name looks like a vendor call-log column, leaving the
    /// final word to the store.
    pub fn supports(&self, field: &str, attribute: LogicalAttribute) -> bool {
        if self.candidate_fields(attribute).iter().any(|f| f == field) {
            return true;
        }
        if attribute == LogicalAttribute::MissedReason
            && fields::GENERIC_REJECT_REASON_FIELDS.contains(&field)
        {
            return true;
        }
        let plausible = is_plausible_field_name(field);
        if plausible {
            debug!(
                manufacturer = %self.manufacturer,
                field,
                attribute = %attribute,
                "Field not in profile but name is plausible, allowing attempt"
            );
        }
        plausible
    }
}

/// Returns `profile`'s candidates for `attribute`.
pub fn candidate_fields(profile: &DeviceProfile, attribute: LogicalAttribute) -> &[String] {
    profile.candidate_fields(attribute)
}

/// Whether `field` may be tried for `attribute` on `profile`; see
/// [`DeviceProfile::supports`].
pub fn is_field_supported(
    profile: &DeviceProfile,
    field: &str,
    attribute: LogicalAttribute,
) -> bool {
    profile.supports(field, attribute)
}

fn is_plausible_field_name(field: &str) -> bool {
    if !is_valid_field_name(field) {
        return false;
    }
    let lower = field.to_lowercase();
    fields::PLAUSIBLE_NAME_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Builder for [`DeviceProfile`].
#[derive(Debug)]
pub struct DeviceProfileBuilder {
    profile: DeviceProfile,
}

impl DeviceProfileBuilder {
    fn new(manufacturer: impl Into<String>) -> Self {
        Self {
            profile: DeviceProfile {
                manufacturer: normalize_key(&manufacturer.into()),
                description: String::new(),
                candidates: BTreeMap::new(),
                ring_timestamps: None,
                outgoing_unanswered: CallClassification::OutgoingUnanswered,
                is_default: false,
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.profile.description = description.into();
        self
    }

    /// Sets the ordered candidates for `attribute`, replacing earlier ones.
    pub fn candidates<I, S>(mut self, attribute: LogicalAttribute, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profile
            .candidates
            .insert(attribute, fields.into_iter().map(Into::into).collect());
        self
    }

    /// Declares that ring time is encoded as the delta between two timestamps.
    pub fn ring_via_timestamps(mut self, fields: TimestampFields) -> Self {
        self.profile.ring_timestamps = Some(fields);
        self
    }

    pub fn outgoing_unanswered(mut self, classification: CallClassification) -> Self {
        self.profile.outgoing_unanswered = classification;
        self
    }

    pub(crate) fn default_profile(mut self) -> Self {
        self.profile.is_default = true;
        self
    }

    pub fn build(self) -> DeviceProfile {
        self.profile
    }
}

/// Manufacturer → profile lookup with a guaranteed default.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<DeviceProfile>,
    default: DeviceProfile,
}

impl ProfileRegistry {
    /// The built-in profiles for vivo, Xiaomi, OPPO, Huawei, Honor and Samsung.
    pub fn builtin() -> Self {
        Self {
            profiles: profiles::builtin_profiles(),
            default: profiles::default_profile(),
        }
    }

    /// A registry with custom profiles and the built-in default.
    pub fn with_profiles(profiles: Vec<DeviceProfile>) -> Self {
        Self {
            profiles,
            default: profiles::default_profile(),
        }
    }

    /// Replaces the default profile.
    pub fn with_default(mut self, mut default: DeviceProfile) -> Self {
        default.is_default = true;
        self.default = default;
        self
    }

    /// Exact lookup; `None` for unknown manufacturers.
    pub fn lookup(&self, manufacturer: &str) -> Option<&DeviceProfile> {
        let key = normalize_key(manufacturer);
        self.profiles.iter().find(|p| p.manufacturer == key)
    }

    /// Profile for `manufacturer`, falling back to the default profile.
    pub fn profile_for(&self, manufacturer: &str) -> &DeviceProfile {
        match self.lookup(manufacturer) {
            Some(profile) => profile,
            None => {
                debug!(manufacturer, "No device profile, using default");
                &self.default
            }
        }
    }

    pub fn default_profile(&self) -> &DeviceProfile {
        &self.default
    }

    pub fn profiles(&self) -> &[DeviceProfile] {
        &self.profiles
    }

    /// Union of every known ring-time field across vendors.
    pub fn all_ring_duration_fields() -> &'static [&'static str] {
        &fields::ALL_RING_DURATION_FIELDS
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_key(manufacturer: &str) -> String {
    manufacturer.trim().to_lowercase()
}
