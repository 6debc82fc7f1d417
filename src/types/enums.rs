//! Enumeration types for the pump data faker
//!
//! This module contains the enumerations shared across the crate: event kinds,
//! basal delivery types, pump status kinds, range flags and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level kind of a generated event (serialized as the `type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Basal insulin delivery interval
    Basal,
    /// Device meta event (pump status, alarms)
    DeviceEvent,
    /// Continuous blood glucose reading
    Cbg,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Basal => write!(f, "basal"),
            EventKind::DeviceEvent => write!(f, "deviceEvent"),
            EventKind::Cbg => write!(f, "cbg"),
        }
    }
}

/// How a basal interval was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// Delivered at the scheduled rate
    Scheduled,
    /// Temporary percentage override of the scheduled rate
    Temp,
    /// No delivery while the pump is suspended
    Suspend,
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryType::Scheduled => write!(f, "scheduled"),
            DeliveryType::Temp => write!(f, "temp"),
            DeliveryType::Suspend => write!(f, "suspend"),
        }
    }
}

impl FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(DeliveryType::Scheduled),
            "temp" | "temporary" => Ok(DeliveryType::Temp),
            "suspend" | "suspended" => Ok(DeliveryType::Suspend),
            _ => Err(format!("Unknown delivery type: {}", s)),
        }
    }
}

/// Pump status transitions emitted as device events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Pump delivery paused
    #[serde(rename = "suspended")]
    Suspend,
    /// Pump delivery restarted
    #[serde(rename = "resumed")]
    Resume,
}

impl StatusKind {
    /// The value written into the `status` field and the `reason` key
    pub fn as_status(&self) -> &'static str {
        match self {
            StatusKind::Suspend => "suspended",
            StatusKind::Resume => "resumed",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_status())
    }
}

/// Which side of the CGM operating range a clamped reading fell on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeFlag {
    /// Above the high threshold
    High,
    /// Below the low threshold
    Low,
}

/// Output formats for the generated dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// A single pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
