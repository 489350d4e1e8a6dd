//! Built-in vendor profiles.

use super::fields::*;
use super::{DeviceProfile, LogicalAttribute, TimestampFields};
use crate::core::CallClassification;

fn base(manufacturer: &str) -> super::DeviceProfileBuilder {
    DeviceProfile::builder(manufacturer)
        .candidates(LogicalAttribute::CallType, [TYPE])
        .candidates(LogicalAttribute::Duration, [DURATION])
        .candidates(LogicalAttribute::MissedReason, [MISSED_REASON])
}

pub(super) fn builtin_profiles() -> Vec<DeviceProfile> {
    vec![vivo(), xiaomi(), oppo(), huawei(), honor(), samsung()]
}

/// vivo stores ring time in `record_duration`, which stays NULL on
/// answered calls.
fn vivo() -> DeviceProfile {
    base("vivo")
        .description("vivo (record_duration ring time)")
        .candidates(
            LogicalAttribute::SimIdentity,
            [SIMID, SUBSCRIPTION_ID, SUBSCRIPTION_COMPONENT_NAME],
        )
        .candidates(
            LogicalAttribute::RingDuration,
            [RECORD_DURATION, RING_DURATION, RING_TIME],
        )
        .outgoing_unanswered(CallClassification::VendorOutgoingUnanswered)
        .build()
}

fn xiaomi() -> DeviceProfile {
    base("xiaomi")
        .description("Xiaomi")
        .candidates(
            LogicalAttribute::SimIdentity,
            [SIMID, SUBSCRIPTION_ID, SUBSCRIPTION_COMPONENT_NAME],
        )
        .candidates(
            LogicalAttribute::RingDuration,
            [
                RING_DURATION,
                RING_TIME,
                CLOUD_ANTISPAM_TYPE,
                CLOUD_ANTISPAM_TYPE_TAG,
            ],
        )
        .build()
}

/// OPPO keeps `simid` (often -1) and leaves its `ring_time` NULL, so ring
/// time also goes into the timestamp delta.
fn oppo() -> DeviceProfile {
    base("oppo")
        .description("OPPO")
        .candidates(LogicalAttribute::SimIdentity, [SIMID, SUBSCRIPTION_ID])
        .candidates(
            LogicalAttribute::RingDuration,
            [RING_TIME, RING_DURATION, OPLUS_DATA1, OPLUS_DATA2],
        )
        .ring_via_timestamps(TimestampFields::date_last_modified())
        .build()
}

fn huawei() -> DeviceProfile {
    base("huawei")
        .description("Huawei")
        .candidates(
            LogicalAttribute::SimIdentity,
            [SUBSCRIPTION_ID, SUBSCRIPTION_COMPONENT_NAME, HW_ACCOUNT_ID],
        )
        .candidates(
            LogicalAttribute::RingDuration,
            [RING_TIMES, RING_DURATION, RING_TIME],
        )
        .ring_via_timestamps(TimestampFields::date_last_modified())
        .build()
}

fn honor() -> DeviceProfile {
    base("honor")
        .description("Honor")
        .candidates(
            LogicalAttribute::SimIdentity,
            [SUBSCRIPTION_ID, SUBSCRIPTION_COMPONENT_NAME, HW_ACCOUNT_ID],
        )
        .candidates(
            LogicalAttribute::RingDuration,
            [RING_TIMES, RING_DURATION, RING_TIME],
        )
        .ring_via_timestamps(TimestampFields::date_last_modified())
        .build()
}

/// Samsung has no SIM-specific columns worth writing.
fn samsung() -> DeviceProfile {
    base("samsung")
        .description("Samsung")
        .candidates(
            LogicalAttribute::RingDuration,
            [RING_DURATION, RING_TIME, DATA1, DATA2],
        )
        .ring_via_timestamps(TimestampFields::date_last_modified())
        .build()
}

/// Stock Android and anything unrecognised: only broadly safe fields.
pub(super) fn default_profile() -> DeviceProfile {
    base("default")
        .description("Standard Android")
        .candidates(
            LogicalAttribute::SimIdentity,
            [SUBSCRIPTION_ID, SUBSCRIPTION_COMPONENT_NAME],
        )
        .candidates(LogicalAttribute::RingDuration, [RING_DURATION])
        .default_profile()
        .build()
}
