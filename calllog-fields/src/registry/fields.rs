//! Physical field names used by platform and vendor call-log stores.

pub const TYPE: &str = "type";
pub const DURATION: &str = "duration";
pub const DATE: &str = "date";
pub const LAST_MODIFIED: &str = "last_modified";

pub const MISSED_REASON: &str = "missed_reason";
pub const REJECT_REASON: &str = "reject_reason";
pub const CALL_REJECT_REASON: &str = "call_reject_reason";
pub const IS_REJECTED: &str = "is_rejected";
pub const REASON: &str = "reason";

pub const RING_DURATION: &str = "ring_duration";
pub const RING_TIME: &str = "ring_time";
pub const RING_TIMES: &str = "ring_times";
pub const CALL_RING_DURATION: &str = "call_ring_duration";
pub const RING_DURATION_SECONDS: &str = "ring_duration_seconds";

// vivo
pub const RECORD_DURATION: &str = "record_duration";
// OPPO
pub const OPLUS_DATA1: &str = "oplus_data1";
pub const OPLUS_DATA2: &str = "oplus_data2";
// Samsung
pub const DATA1: &str = "data1";
pub const DATA2: &str = "data2";
pub const DATA3: &str = "data3";
pub const DATA4: &str = "data4";
// Huawei / Honor
pub const HW_RING_TIMES: &str = "hw_ring_times";
pub const HW_ACCOUNT_ID: &str = "hw_account_id";
// Xiaomi
pub const CLOUD_ANTISPAM_TYPE: &str = "cloud_antispam_type";
pub const CLOUD_ANTISPAM_TYPE_TAG: &str = "cloud_antispam_type_tag";

pub const SIMID: &str = "simid";
pub const SUBSCRIPTION_ID: &str = "subscription_id";
pub const SUBSCRIPTION_COMPONENT_NAME: &str = "subscription_component_name";
pub const PHONE_ACCOUNT_ID: &str = "phone_account_id";
pub const PHONE_ACCOUNT_COMPONENT_NAME: &str = "phone_account_component_name";

/// Reject-reason fields tried after a profile's own missed-reason fields,
/// most generic last.
pub const GENERIC_REJECT_REASON_FIELDS: [&str; 5] = [
    MISSED_REASON,
    REJECT_REASON,
    CALL_REJECT_REASON,
    IS_REJECTED,
    REASON,
];

/// Platform SIM fields used when no vendor SIM field is accepted.
pub const STANDARD_SIM_FIELDS: [&str; 2] = [PHONE_ACCOUNT_ID, PHONE_ACCOUNT_COMPONENT_NAME];

/// Every field known to hold ring time on some vendor's store.
pub const ALL_RING_DURATION_FIELDS: [&str; 17] = [
    DURATION,
    RING_TIME,
    RING_DURATION,
    RING_TIMES,
    CALL_RING_DURATION,
    RING_DURATION_SECONDS,
    RECORD_DURATION,
    OPLUS_DATA1,
    OPLUS_DATA2,
    DATA1,
    DATA2,
    DATA3,
    DATA4,
    HW_RING_TIMES,
    MISSED_REASON,
    CLOUD_ANTISPAM_TYPE,
    CLOUD_ANTISPAM_TYPE_TAG,
];

/// Name fragments that make an unlisted field plausible on an unknown device.
pub(crate) const PLAUSIBLE_NAME_FRAGMENTS: [&str; 16] = [
    "sim",
    "subscription",
    "account",
    "ring",
    "duration",
    "missed",
    "reason",
    "reject",
    "data1",
    "data2",
    "data3",
    "data4",
    "data5",
    "hw_",
    "oplus_",
    "cloud_",
];
