//! Time and UTC offset utilities
//!
//! This module converts between the device's local wall clock and UTC instants
//! and reports the zone's UTC offset at a given moment. Offsets differ on either
//! side of a DST transition, which is what the basal generator relies on.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::simulation::{SimulationError, SimulationResult};

/// Input format for local start timestamps
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the `deviceTime` field on generated events
pub const DEVICE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Milliseconds in a nominal (24 hour) day
pub const MS_PER_DAY: i64 = 86_400_000;

/// Longest run accepted, in days (100 years)
pub const MAX_SIMULATION_DAYS: i64 = 36_500;

/// Check a requested day count is within `1..=MAX_SIMULATION_DAYS`
pub fn check_num_days(num_days: i64) -> SimulationResult<()> {
    if !(1..=MAX_SIMULATION_DAYS).contains(&num_days) {
        return Err(SimulationError::invalid_argument(format!(
            "Number of days must be between 1 and {}, got {}",
            MAX_SIMULATION_DAYS, num_days
        )));
    }
    Ok(())
}

/// `start` plus `num_days` whole days.
///
/// The last interval may run past the window end, so one further day must
/// also be representable.
pub fn window_end(start: DateTime<Utc>, num_days: i64) -> SimulationResult<DateTime<Utc>> {
    Duration::try_days(num_days)
        .and_then(|days| start.checked_add_signed(days))
        .filter(|end| end.checked_add_signed(Duration::days(1)).is_some())
        .ok_or_else(|| {
            SimulationError::invalid_argument(format!(
                "{} days after {} is out of range",
                num_days, start
            ))
        })
}

/// Resolve an IANA timezone name
pub fn parse_timezone(name: &str) -> SimulationResult<Tz> {
    name.parse::<Tz>().map_err(|e| {
        SimulationError::configuration_error(format!("Unknown timezone '{}': {}", name, e))
    })
}

/// Parse a `YYYY-MM-DD HH:MM:SS` wall-clock timestamp
pub fn parse_local_time(value: &str) -> SimulationResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMAT).map_err(|e| {
        SimulationError::time_error(format!(
            "Invalid start time '{}' (expected {}): {}",
            value, LOCAL_TIME_FORMAT, e
        ))
    })
}

/// Milliseconds elapsed since local midnight
pub fn ms_since_midnight(local: &NaiveDateTime) -> i64 {
    local.num_seconds_from_midnight() as i64 * 1000 + (local.nanosecond() / 1_000_000) as i64
}

/// Time conversions bound to a single civil timezone
#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    timezone: Tz,
}

impl TimeManager {
    /// Create a time manager for the given zone
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Create a time manager from an IANA zone name
    pub fn from_name(name: &str) -> SimulationResult<Self> {
        Ok(Self::new(parse_timezone(name)?))
    }

    /// The zone this manager converts into
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve a local wall-clock time to a UTC instant.
    ///
    /// Ambiguous times (the repeated hour of a fall-back transition) resolve to
    /// the earlier instant. Times inside a spring-forward gap do not exist and
    /// are rejected.
    pub fn to_utc(&self, local: NaiveDateTime) -> SimulationResult<DateTime<Utc>> {
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => {
                debug!("Local time {} is ambiguous in {}, using earliest", local, self.timezone);
                Ok(earliest.with_timezone(&Utc))
            }
            LocalResult::None => Err(SimulationError::time_error(format!(
                "Local time {} does not exist in {}",
                local, self.timezone
            ))),
        }
    }

    /// Wall-clock time at the given instant
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.timezone).naive_local()
    }

    /// UTC offset in minutes at the given instant (negative west of Greenwich)
    pub fn offset_minutes_at(&self, instant: DateTime<Utc>) -> i32 {
        instant.with_timezone(&self.timezone).offset().fix().local_minus_utc() / 60
    }

    /// UTC offset in minutes in effect at a local wall-clock time
    pub fn offset_minutes_for_local(&self, local: NaiveDateTime) -> SimulationResult<i32> {
        Ok(self.offset_minutes_at(self.to_utc(local)?))
    }
}
