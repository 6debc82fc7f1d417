//! Basal rate schedules and time-of-day lookup
//!
//! A schedule is an ordered set of segments, each starting at an offset from
//! local midnight and running until the next segment starts (the last one runs
//! until midnight). The same schedule is reapplied every day.

use serde::{Deserialize, Serialize};

use crate::simulation::time_manager::MS_PER_DAY;
use crate::simulation::{SimulationError, SimulationResult};

/// One entry of a daily basal schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    /// Milliseconds after local midnight at which this rate takes effect
    pub start: i64,
    /// Delivery rate in units per hour
    pub rate: f64,
}

impl ScheduleSegment {
    /// Create a new segment
    pub fn new(start: i64, rate: f64) -> Self {
        Self { start, rate }
    }
}

/// Result of looking up the active segment for a time of day.
///
/// `start` and `end` are the nominal segment boundaries. `corrected_start` is
/// the time of day that was looked up; it equals `start` when the clock sits
/// exactly on the boundary and is later than `start` when the clock entered
/// the segment part-way through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLookup {
    /// Scheduled rate for the segment
    pub rate: f64,
    /// Segment start, ms after midnight
    pub start: i64,
    /// Looked-up time of day, ms after midnight
    pub corrected_start: i64,
    /// Segment end, ms after midnight (`MS_PER_DAY` for the last segment)
    pub end: i64,
}

impl RateLookup {
    /// Nominal length of the whole segment
    pub fn segment_length_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the lookup landed part-way into the segment
    pub fn is_clipped(&self) -> bool {
        self.start != self.corrected_start
    }

    /// Time left in the segment from the looked-up time of day
    pub fn remaining_ms(&self) -> i64 {
        self.end - self.corrected_start
    }
}

/// A validated daily basal schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScheduleSegment>", into = "Vec<ScheduleSegment>")]
pub struct BasalSchedule {
    segments: Vec<ScheduleSegment>,
}

impl BasalSchedule {
    /// Build a schedule, sorting segments by start time
    pub fn new(mut segments: Vec<ScheduleSegment>) -> SimulationResult<Self> {
        if segments.is_empty() {
            return Err(SimulationError::schedule_error("Basal schedule has no segments"));
        }

        segments.sort_by_key(|segment| segment.start);

        for segment in &segments {
            if !(0..MS_PER_DAY).contains(&segment.start) {
                return Err(SimulationError::schedule_error(format!(
                    "Segment start {} ms is outside the day",
                    segment.start
                )));
            }
            if !segment.rate.is_finite() || segment.rate < 0.0 {
                return Err(SimulationError::schedule_error(format!(
                    "Segment starting at {} ms has invalid rate {}",
                    segment.start, segment.rate
                )));
            }
        }

        if let Some(pair) = segments.windows(2).find(|pair| pair[0].start == pair[1].start) {
            return Err(SimulationError::schedule_error(format!(
                "Two segments start at {} ms",
                pair[0].start
            )));
        }

        Ok(Self { segments })
    }

    /// A single rate for the whole day
    pub fn flat(rate: f64) -> SimulationResult<Self> {
        Self::new(vec![ScheduleSegment::new(0, rate)])
    }

    /// Segments in chronological order
    pub fn segments(&self) -> &[ScheduleSegment] {
        &self.segments
    }

    /// Find the segment covering `time_of_day_ms` (milliseconds after local midnight)
    pub fn lookup(&self, time_of_day_ms: i64) -> SimulationResult<RateLookup> {
        if !(0..MS_PER_DAY).contains(&time_of_day_ms) {
            return Err(SimulationError::schedule_error(format!(
                "Time of day {} ms is outside the day",
                time_of_day_ms
            )));
        }

        // index of the first segment starting after the time of day
        let next = self.segments.partition_point(|segment| segment.start <= time_of_day_ms);
        if next == 0 {
            return Err(SimulationError::schedule_error(format!(
                "No schedule segment covers time of day {} ms",
                time_of_day_ms
            )));
        }

        let active = self.segments[next - 1];
        let end = self.segments.get(next).map_or(MS_PER_DAY, |segment| segment.start);

        Ok(RateLookup { rate: active.rate, start: active.start, corrected_start: time_of_day_ms, end })
    }
}

impl TryFrom<Vec<ScheduleSegment>> for BasalSchedule {
    type Error = SimulationError;

    fn try_from(segments: Vec<ScheduleSegment>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<BasalSchedule> for Vec<ScheduleSegment> {
    fn from(schedule: BasalSchedule) -> Self {
        schedule.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    fn three_segment_schedule() -> BasalSchedule {
        BasalSchedule::new(vec![
            ScheduleSegment::new(6 * HOUR, 1.2),
            ScheduleSegment::new(0, 0.8),
            ScheduleSegment::new(20 * HOUR, 0.9),
        ])
        .unwrap()
    }

    #[test]
    fn test_segments_are_sorted() {
        let schedule = three_segment_schedule();
        let starts: Vec<i64> = schedule.segments().iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 6 * HOUR, 20 * HOUR]);
    }

    #[test]
    fn test_lookup_on_boundary() {
        let lookup = three_segment_schedule().lookup(6 * HOUR).unwrap();
        assert_eq!(lookup.rate, 1.2);
        assert_eq!(lookup.start, 6 * HOUR);
        assert_eq!(lookup.corrected_start, 6 * HOUR);
        assert_eq!(lookup.end, 20 * HOUR);
        assert!(!lookup.is_clipped());
        assert_eq!(lookup.segment_length_ms(), 14 * HOUR);
    }

    #[test]
    fn test_lookup_mid_segment_is_clipped() {
        let lookup = three_segment_schedule().lookup(7 * HOUR + 30 * 60_000).unwrap();
        assert_eq!(lookup.start, 6 * HOUR);
        assert!(lookup.is_clipped());
        assert_eq!(lookup.remaining_ms(), 12 * HOUR + 30 * 60_000);
    }

    #[test]
    fn test_last_segment_ends_at_midnight() {
        let lookup = three_segment_schedule().lookup(23 * HOUR).unwrap();
        assert_eq!(lookup.rate, 0.9);
        assert_eq!(lookup.end, MS_PER_DAY);
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let schedule = three_segment_schedule();
        assert_eq!(schedule.lookup(12_345_678).unwrap(), schedule.lookup(12_345_678).unwrap());
    }

    #[test]
    fn test_uncovered_time_of_day() {
        let schedule = BasalSchedule::new(vec![ScheduleSegment::new(HOUR, 1.0)]).unwrap();
        let err = schedule.lookup(30 * 60_000).unwrap_err();
        assert_eq!(err.category(), "Schedule");
        assert!(schedule.lookup(-1).is_err());
        assert!(schedule.lookup(MS_PER_DAY).is_err());
    }

    #[test]
    fn test_invalid_schedules_rejected() {
        assert!(BasalSchedule::new(vec![]).is_err());
        assert!(BasalSchedule::flat(-0.5).is_err());
        assert!(BasalSchedule::flat(f64::NAN).is_err());
        assert!(BasalSchedule::new(vec![ScheduleSegment::new(MS_PER_DAY, 1.0)]).is_err());
        assert!(BasalSchedule::new(vec![
            ScheduleSegment::new(0, 1.0),
            ScheduleSegment::new(0, 2.0),
        ])
        .is_err());
    }

    #[test]
    fn test_schedule_deserialization_validates() {
        let schedule: BasalSchedule =
            serde_json::from_str(r#"[{"start": 0, "rate": 0.75}, {"start": 43200000, "rate": 1.0}]"#)
                .unwrap();
        assert_eq!(schedule.segments().len(), 2);
        assert!(serde_json::from_str::<BasalSchedule>("[]").is_err());
    }
}
