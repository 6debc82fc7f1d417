//! Common event fields and the stamper that fills them in
//!
//! Every generated event carries the same device and time metadata; callers
//! stamp a base record and add their kind-specific fields on top.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::simulation::TimeManager;
use crate::types::{DeviceId, EventKind, UploadId};

/// Metadata shared by every event kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonFields {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// UTC instant the event starts at
    pub time: DateTime<Utc>,
    /// Wall-clock time shown on the device
    #[serde(with = "device_time_format")]
    pub device_time: NaiveDateTime,
    /// IANA name of the device timezone
    pub timezone: String,
    /// Minutes between device time and UTC at `time`
    pub timezone_offset: i32,
    /// Drift between device clock and true time (always 0)
    pub clock_drift_offset: i64,
    /// Offset applied during upload conversion (always 0)
    pub conversion_offset: i64,
    /// Device that produced the event
    pub device_id: DeviceId,
    /// Upload session the event belongs to
    pub upload_id: UploadId,
}

/// Stamps common fields for one device and upload in one timezone
#[derive(Debug, Clone)]
pub struct CommonFieldsStamper {
    device_id: DeviceId,
    upload_id: UploadId,
    time_manager: TimeManager,
}

impl CommonFieldsStamper {
    /// Create a stamper with fresh device and upload identifiers
    pub fn new(time_manager: TimeManager) -> Self {
        Self::with_ids(time_manager, DeviceId::new(), UploadId::new())
    }

    /// Create a stamper for known identifiers
    pub fn with_ids(time_manager: TimeManager, device_id: DeviceId, upload_id: UploadId) -> Self {
        Self { device_id, upload_id, time_manager }
    }

    /// Time conversions for the stamper's zone
    pub fn time_manager(&self) -> &TimeManager {
        &self.time_manager
    }

    /// Build the base record for an event of `kind` at `at`
    pub fn stamp(&self, kind: EventKind, at: DateTime<Utc>) -> CommonFields {
        CommonFields {
            kind,
            time: at,
            device_time: self.time_manager.local_time(at),
            timezone: self.time_manager.timezone().name().to_string(),
            timezone_offset: self.time_manager.offset_minutes_at(at),
            clock_drift_offset: 0,
            conversion_offset: 0,
            device_id: self.device_id,
            upload_id: self.upload_id,
        }
    }
}

mod device_time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::simulation::DEVICE_TIME_FORMAT;

    pub(super) fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(DEVICE_TIME_FORMAT))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, DEVICE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
