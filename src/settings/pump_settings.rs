//! Pump settings and built-in pump profiles
//!
//! This module provides the settings a simulated pump is configured with.
//! Only the basal schedules drive event generation; the remaining fields are
//! carried as device metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::schedule::{BasalSchedule, ScheduleSegment};
use crate::simulation::{SimulationError, SimulationResult};

/// Name of the schedule the basal generator delivers from
pub const STANDARD_SCHEDULE: &str = "standard";

const HOUR_MS: i64 = 3_600_000;
const HALF_HOUR_MS: i64 = 1_800_000;

/// Built-in pump profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpProfile {
    /// Medtronic-style pump with a dawn-phenomenon ramp
    Medtronic,
    /// Tandem-style pump with four segments
    Tandem,
    /// OmniPod-style patch pump with a simple day/night split
    OmniPod,
}

impl PumpProfile {
    /// All known profiles
    pub fn all() -> [PumpProfile; 3] {
        [PumpProfile::Medtronic, PumpProfile::Tandem, PumpProfile::OmniPod]
    }
}

impl fmt::Display for PumpProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpProfile::Medtronic => write!(f, "medtronic"),
            PumpProfile::Tandem => write!(f, "tandem"),
            PumpProfile::OmniPod => write!(f, "omnipod"),
        }
    }
}

impl FromStr for PumpProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "medtronic" => Ok(PumpProfile::Medtronic),
            "tandem" => Ok(PumpProfile::Tandem),
            "omnipod" | "insulet" => Ok(PumpProfile::OmniPod),
            _ => Err(format!("Unknown pump profile: {}", s)),
        }
    }
}

/// Settings loaded onto the simulated pump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpSettings {
    /// Device manufacturer
    pub manufacturer: String,
    /// Device model
    pub model: String,
    /// Named basal schedules
    pub basal_schedules: BTreeMap<String, BasalSchedule>,
    /// Schedule currently in effect
    pub active_schedule: String,
}

impl PumpSettings {
    /// Settings with a single schedule named `standard`
    pub fn with_standard_schedule(
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        schedule: BasalSchedule,
    ) -> Self {
        let mut basal_schedules = BTreeMap::new();
        basal_schedules.insert(STANDARD_SCHEDULE.to_string(), schedule);
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            basal_schedules,
            active_schedule: STANDARD_SCHEDULE.to_string(),
        }
    }

    /// Settings for a built-in profile
    pub fn for_profile(profile: PumpProfile) -> SimulationResult<Self> {
        debug!("Loading pump settings for profile {}", profile);

        let settings = match profile {
            PumpProfile::Medtronic => Self::with_standard_schedule(
                "Medtronic",
                "MiniMed 530G",
                BasalSchedule::new(vec![
                    ScheduleSegment::new(0, 0.8),
                    ScheduleSegment::new(3 * HOUR_MS, 0.95),
                    ScheduleSegment::new(6 * HOUR_MS + HALF_HOUR_MS, 1.1),
                    ScheduleSegment::new(11 * HOUR_MS, 0.9),
                    ScheduleSegment::new(18 * HOUR_MS, 1.0),
                    ScheduleSegment::new(22 * HOUR_MS, 0.85),
                ])?,
            ),
            PumpProfile::Tandem => Self::with_standard_schedule(
                "Tandem",
                "t:slim",
                BasalSchedule::new(vec![
                    ScheduleSegment::new(0, 0.7),
                    ScheduleSegment::new(5 * HOUR_MS, 1.05),
                    ScheduleSegment::new(12 * HOUR_MS, 0.9),
                    ScheduleSegment::new(19 * HOUR_MS, 0.75),
                ])?,
            ),
            PumpProfile::OmniPod => Self::with_standard_schedule(
                "Insulet",
                "OmniPod",
                BasalSchedule::new(vec![
                    ScheduleSegment::new(0, 0.65),
                    ScheduleSegment::new(8 * HOUR_MS, 0.9),
                ])?,
            ),
        };

        Ok(settings)
    }

    /// Settings for a profile given by name
    pub fn for_profile_name(name: &str) -> SimulationResult<Self> {
        let profile = name.parse::<PumpProfile>().map_err(SimulationError::configuration_error)?;
        Self::for_profile(profile)
    }

    /// Look up a schedule by name
    pub fn basal_schedule(&self, name: &str) -> SimulationResult<&BasalSchedule> {
        self.basal_schedules.get(name).ok_or_else(|| {
            SimulationError::schedule_error(format!("Pump settings have no schedule named '{}'", name))
        })
    }
}
