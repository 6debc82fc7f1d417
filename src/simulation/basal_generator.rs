//! Basal delivery event generation
//!
//! This module walks a simulated clock across the requested window and emits
//! one basal interval per step. Each interval follows the pump's `standard`
//! schedule and is delivered as scheduled, partly overridden by a temp basal,
//! or suspended. Segments that straddle a DST transition get their real
//! elapsed length and are always delivered as scheduled.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::events::{BasalEvent, CommonFieldsStamper, DeviceEventFactory, Event};
use crate::settings::{PumpSettings, STANDARD_SCHEDULE};
use crate::stage_event;
use crate::simulation::time_manager::{check_num_days, ms_since_midnight, parse_local_time, window_end};
use crate::simulation::{
    DeliveryOutcome, OutcomePolicy, OutcomeWeights, SimulationError, SimulationResult, TimeManager,
    WeightedOutcomes,
};
use crate::types::{EventKind, StatusKind};

/// Earliest temp basal start after the scheduled interval begins
pub const TEMP_START_MIN_MS: i64 = 300_000;
/// Upper bound (exclusive) of the temp basal start offset
pub const TEMP_START_MAX_MS: i64 = 3_000_000;
/// Temp basal start offsets are whole minutes
pub const TEMP_START_STEP_MS: i64 = 60_000;

/// Shortest temp basal (20 minutes)
pub const TEMP_DURATION_MIN_MS: i64 = 1_200_000;
/// Upper bound (exclusive) of temp basal durations (6 hours)
pub const TEMP_DURATION_MAX_MS: i64 = 21_600_000;
/// Temp basal durations are multiples of 10 minutes
pub const TEMP_DURATION_STEP_MS: i64 = 600_000;

/// Lowest temp basal percentage
pub const TEMP_PERCENT_MIN: i64 = 5;
/// Upper bound (exclusive) of temp basal percentages
pub const TEMP_PERCENT_MAX: i64 = 195;
/// Temp basal percentages move in steps of 10
pub const TEMP_PERCENT_STEP: i64 = 10;

/// A window during which the pump delivered nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionInterval {
    /// When the pump was suspended
    pub start: DateTime<Utc>,
    /// When the pump resumed
    pub end: DateTime<Utc>,
}

impl SuspensionInterval {
    /// Epoch seconds of the suspension start
    pub fn start_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    /// Epoch seconds of the resume
    pub fn end_epoch(&self) -> i64 {
        self.end.timestamp()
    }

    /// Length of the suspension
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `instant` falls inside the suspension (end exclusive)
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Events and suspension windows produced by one basal run
#[derive(Debug, Clone, Default)]
pub struct BasalOutput {
    /// Basal and pump status events in emission (chronological) order
    pub events: Vec<Event>,
    /// Suspension windows, in order
    pub suspensions: Vec<SuspensionInterval>,
}

impl BasalOutput {
    /// Basal intervals only
    pub fn basal_events(&self) -> impl Iterator<Item = &BasalEvent> {
        self.events.iter().filter_map(Event::as_basal)
    }
}

/// Draw a temp basal start offset strictly below `scheduled_ms`.
///
/// Returns `None` when the scheduled interval is too short to hold one.
pub fn draw_temp_start<R: Rng + ?Sized>(scheduled_ms: i64, rng: &mut R) -> Option<i64> {
    let upper = scheduled_ms.min(TEMP_START_MAX_MS);
    if upper <= TEMP_START_MIN_MS {
        return None;
    }
    let steps = (upper - TEMP_START_MIN_MS + TEMP_START_STEP_MS - 1) / TEMP_START_STEP_MS;
    Some(TEMP_START_MIN_MS + rng.gen_range(0..steps) * TEMP_START_STEP_MS)
}

/// Draw a temp basal duration from 20 minutes up to (not including) 6 hours
pub fn draw_temp_duration<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    let steps = (TEMP_DURATION_MAX_MS - TEMP_DURATION_MIN_MS) / TEMP_DURATION_STEP_MS;
    TEMP_DURATION_MIN_MS + rng.gen_range(0..steps) * TEMP_DURATION_STEP_MS
}

/// Draw a temp basal multiplier from 0.05 up to (not including) 1.95
pub fn draw_temp_percent<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let steps = (TEMP_PERCENT_MAX - TEMP_PERCENT_MIN) / TEMP_PERCENT_STEP;
    (TEMP_PERCENT_MIN + rng.gen_range(0..steps) * TEMP_PERCENT_STEP) as f64 / 100.0
}

/// Generates basal delivery for one virtual pump
#[derive(Debug)]
pub struct BasalGenerator<P = WeightedOutcomes> {
    settings: PumpSettings,
    stamper: CommonFieldsStamper,
    device_events: DeviceEventFactory,
    policy: P,
}

impl<P: OutcomePolicy> BasalGenerator<P> {
    /// Create a generator delivering from `settings`, stamping with `stamper`
    pub fn new(settings: PumpSettings, stamper: CommonFieldsStamper, policy: P) -> Self {
        let device_events = DeviceEventFactory::new(stamper.clone());
        Self { settings, stamper, device_events, policy }
    }

    /// Generate `num_days` of basal delivery starting at local time `start`
    #[instrument(skip(self, rng), fields(timezone = %self.stamper.time_manager().timezone()))]
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        start: NaiveDateTime,
        num_days: i64,
        rng: &mut R,
    ) -> SimulationResult<BasalOutput> {
        check_num_days(num_days)?;

        let time_manager = *self.stamper.time_manager();
        let schedule = self.settings.basal_schedule(STANDARD_SCHEDULE)?.clone();
        let utc_start = time_manager.to_utc(start)?;
        let end_time = window_end(utc_start, num_days)?;

        info!("Generating basal delivery from {} ({}) for {} days", start, utc_start, num_days);

        let mut output = BasalOutput::default();
        let mut next_time = utc_start;
        let mut first_iteration = true;

        while next_time < end_time {
            let common = self.stamper.stamp(EventKind::Basal, next_time);
            let lookup = schedule.lookup(ms_since_midnight(&common.device_time))?;

            // Offsets at both ends of the full nominal segment
            let segment_ms = lookup.segment_length_ms();
            let start_offset = common.timezone_offset;
            let end_offset =
                time_manager.offset_minutes_at(next_time + Duration::milliseconds(segment_ms));
            let crosses_dst = start_offset != end_offset;
            let elapsed_ms = segment_ms - (end_offset - start_offset) as i64 * 60_000;

            let duration = if first_iteration || lookup.is_clipped() {
                lookup.remaining_ms()
            } else if elapsed_ms > 0 {
                elapsed_ms
            } else {
                segment_ms
            };
            first_iteration = false;

            let mut scheduled =
                BasalEvent::scheduled(common, STANDARD_SCHEDULE, lookup.rate, duration);

            let mut outcome = self.policy.choose(rng);
            if crosses_dst && outcome != DeliveryOutcome::Scheduled {
                debug!(
                    "Segment at {} crosses a DST transition ({} -> {}), delivering as scheduled",
                    scheduled.common.device_time, start_offset, end_offset
                );
                outcome = DeliveryOutcome::Scheduled;
            }

            next_time = match outcome {
                DeliveryOutcome::TempOverride => match draw_temp_start(scheduled.duration, rng) {
                    Some(offset) => self.apply_temp_override(scheduled, offset, rng, &mut output),
                    None => {
                        let end = scheduled.end();
                        output.events.push(scheduled.into());
                        end
                    }
                },
                DeliveryOutcome::Suspend => self.apply_suspend(scheduled, rng, &mut output)?,
                DeliveryOutcome::Scheduled => {
                    let end = scheduled.end();
                    output.events.push(scheduled.into());
                    end
                }
            };
        }

        stage_event!(
            info,
            "basal",
            "Basal generation complete",
            events = output.events.len(),
            suspensions = output.suspensions.len(),
        );

        Ok(output)
    }

    /// Shorten `scheduled` to end at `offset` and append a temp basal after it.
    /// Returns the time the temp basal ends.
    fn apply_temp_override<R: Rng + ?Sized>(
        &self,
        mut scheduled: BasalEvent,
        offset: i64,
        rng: &mut R,
        output: &mut BasalOutput,
    ) -> DateTime<Utc> {
        let snapshot = scheduled.clone();
        let temp_start = scheduled.start() + Duration::milliseconds(offset);
        let temp = BasalEvent::temp(
            self.stamper.stamp(EventKind::Basal, temp_start),
            draw_temp_duration(rng),
            draw_temp_percent(rng),
            snapshot,
        );
        scheduled.duration = offset;

        debug!(
            "Temp basal at {} for {} ms at {:?}x",
            temp.common.device_time, temp.duration, temp.percent
        );

        let end = temp.end();
        output.events.push(scheduled.into());
        output.events.push(temp.into());
        end
    }

    /// Turn `scheduled` into a suspension with paired suspend/resume status
    /// events. Returns the resume time.
    fn apply_suspend<R: Rng + ?Sized>(
        &self,
        mut scheduled: BasalEvent,
        rng: &mut R,
        output: &mut BasalOutput,
    ) -> SimulationResult<DateTime<Utc>> {
        let start = scheduled.start();
        let suspend_event = self.device_events.make_status_event(StatusKind::Suspend, start, rng);
        let suspend_duration = suspend_event.status_duration().ok_or_else(|| {
            SimulationError::event_generation_error("Suspend status event has no duration")
        })?;
        let resume_at = start + Duration::milliseconds(suspend_duration);
        let resume_event = self.device_events.make_status_event(StatusKind::Resume, resume_at, rng);

        scheduled.suspend(suspend_duration);

        debug!("Pump suspended at {} for {} ms", scheduled.common.device_time, suspend_duration);

        output.events.push(scheduled.into());
        output.events.push(suspend_event.into());
        output.events.push(resume_event.into());
        output.suspensions.push(SuspensionInterval { start, end: resume_at });
        Ok(resume_at)
    }
}

/// Generate basal delivery for a named profile and timezone with the default
/// outcome weights.
///
/// The timezone is resolved first, so an unknown zone fails before anything
/// else is looked at.
pub fn generate_basal<R: Rng + ?Sized>(
    start_time: &str,
    num_days: i64,
    timezone: &str,
    pump_profile: &str,
    rng: &mut R,
) -> SimulationResult<BasalOutput> {
    let time_manager = TimeManager::from_name(timezone)?;
    check_num_days(num_days)?;
    let start = parse_local_time(start_time)?;
    let settings = PumpSettings::for_profile_name(pump_profile)?;
    let policy = WeightedOutcomes::new(OutcomeWeights::default())?;

    BasalGenerator::new(settings, CommonFieldsStamper::new(time_manager), policy)
        .generate(start, num_days, rng)
}
