//! Generated event records
//!
//! This module contains the basal, device and CGM event structures and the
//! [`Event`] enum the generators emit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::common_fields::CommonFields;
use crate::types::{DeliveryType, EventKind, RangeFlag, StatusKind};

/// A basal delivery interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasalEvent {
    /// Shared metadata; `time` is the start of the interval
    #[serde(flatten)]
    pub common: CommonFields,
    /// How the interval was delivered
    pub delivery_type: DeliveryType,
    /// Schedule the rate came from (scheduled deliveries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_name: Option<String>,
    /// Delivery rate in units per hour (absent while suspended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// Interval length in milliseconds
    pub duration: i64,
    /// Multiplier applied to the suppressed rate (temp deliveries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Snapshot of the scheduled interval a temp delivery overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressed: Option<Box<BasalEvent>>,
}

impl BasalEvent {
    /// A scheduled delivery
    pub fn scheduled(
        common: CommonFields,
        schedule_name: impl Into<String>,
        rate: f64,
        duration: i64,
    ) -> Self {
        Self {
            common,
            delivery_type: DeliveryType::Scheduled,
            schedule_name: Some(schedule_name.into()),
            rate: Some(rate),
            duration,
            percent: None,
            suppressed: None,
        }
    }

    /// A temp delivery overriding `suppressed` at `percent` of its rate.
    ///
    /// `suppressed` is taken by value; later changes to the scheduled interval
    /// do not reach the copy held here.
    pub fn temp(common: CommonFields, duration: i64, percent: f64, suppressed: BasalEvent) -> Self {
        let rate = suppressed.rate.unwrap_or(0.0) * percent;
        Self {
            common,
            delivery_type: DeliveryType::Temp,
            schedule_name: None,
            rate: Some(rate),
            duration,
            percent: Some(percent),
            suppressed: Some(Box::new(suppressed)),
        }
    }

    /// Turn this interval into a suspension lasting `duration` ms
    pub fn suspend(&mut self, duration: i64) {
        self.delivery_type = DeliveryType::Suspend;
        self.schedule_name = None;
        self.rate = None;
        self.duration = duration;
    }

    /// Start of the interval
    pub fn start(&self) -> DateTime<Utc> {
        self.common.time
    }

    /// End of the interval
    pub fn end(&self) -> DateTime<Utc> {
        self.common.time + Duration::milliseconds(self.duration)
    }
}

/// Kind-specific part of a device event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subType", rename_all = "camelCase")]
pub enum DeviceEventDetail {
    /// Pump suspended or resumed
    Status {
        /// New pump status
        status: StatusKind,
        /// Why the status changed, keyed by status
        reason: BTreeMap<String, String>,
        /// Randomized length of the status in milliseconds
        duration: i64,
    },
    /// Device alarm
    Alarm {
        /// Alarm identifier
        #[serde(rename = "alarmType")]
        alarm_type: String,
    },
}

/// A device meta event (pump status change or alarm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Shared metadata
    #[serde(flatten)]
    pub common: CommonFields,
    /// Status or alarm payload
    #[serde(flatten)]
    pub detail: DeviceEventDetail,
}

impl DeviceEvent {
    /// Duration carried by a status event
    pub fn status_duration(&self) -> Option<i64> {
        match &self.detail {
            DeviceEventDetail::Status { duration, .. } => Some(*duration),
            DeviceEventDetail::Alarm { .. } => None,
        }
    }

    /// Status kind, if this is a status event
    pub fn status(&self) -> Option<StatusKind> {
        match &self.detail {
            DeviceEventDetail::Status { status, .. } => Some(*status),
            DeviceEventDetail::Alarm { .. } => None,
        }
    }

    /// Whether this is an alarm event
    pub fn is_alarm(&self) -> bool {
        matches!(self.detail, DeviceEventDetail::Alarm { .. })
    }
}

/// Annotation attached to a clamped CGM reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation code
    pub code: String,
    /// Threshold (mg/dL) that was crossed
    pub threshold: f64,
    /// Which side of the range the reading fell on
    pub value: RangeFlag,
}

/// A continuous blood glucose reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CbgEvent {
    /// Shared metadata
    #[serde(flatten)]
    pub common: CommonFields,
    /// Reading in `units`
    pub value: f64,
    /// Reading units
    pub units: String,
    /// Out-of-range annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// Any event the faker produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    /// Basal delivery interval
    Basal(BasalEvent),
    /// Device meta event
    DeviceEvent(DeviceEvent),
    /// CGM reading
    Cbg(CbgEvent),
}

impl Event {
    /// Shared metadata of the event
    pub fn common(&self) -> &CommonFields {
        match self {
            Event::Basal(event) => &event.common,
            Event::DeviceEvent(event) => &event.common,
            Event::Cbg(event) => &event.common,
        }
    }

    /// Event kind
    pub fn kind(&self) -> EventKind {
        self.common().kind
    }

    /// UTC timestamp of the event
    pub fn time(&self) -> DateTime<Utc> {
        self.common().time
    }

    /// The basal payload, if this is a basal event
    pub fn as_basal(&self) -> Option<&BasalEvent> {
        match self {
            Event::Basal(event) => Some(event),
            _ => None,
        }
    }

    /// The device payload, if this is a device event
    pub fn as_device_event(&self) -> Option<&DeviceEvent> {
        match self {
            Event::DeviceEvent(event) => Some(event),
            _ => None,
        }
    }

    /// The CGM payload, if this is a CGM reading
    pub fn as_cbg(&self) -> Option<&CbgEvent> {
        match self {
            Event::Cbg(event) => Some(event),
            _ => None,
        }
    }
}

impl From<BasalEvent> for Event {
    fn from(event: BasalEvent) -> Self {
        Event::Basal(event)
    }
}

impl From<DeviceEvent> for Event {
    fn from(event: DeviceEvent) -> Self {
        Event::DeviceEvent(event)
    }
}

impl From<CbgEvent> for Event {
    fn from(event: CbgEvent) -> Self {
        Event::Cbg(event)
    }
}
