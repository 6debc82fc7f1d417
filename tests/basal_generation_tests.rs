//! Tests for basal delivery generation
//!
//! These tests drive the generator through its public API with flat and
//! multi-segment schedules, scripted outcomes for exact scenarios, and seeded
//! weighted runs for properties that must hold on every run.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use pump_data_faker::events::DeviceEventDetail;
use pump_data_faker::simulation::{parse_local_time, MAX_SIMULATION_DAYS};
use pump_data_faker::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const DAY_MS: i64 = 86_400_000;

fn local(value: &str) -> NaiveDateTime {
    parse_local_time(value).unwrap()
}

fn flat_generator(
    timezone: &str,
    rate: f64,
    script: Vec<DeliveryOutcome>,
) -> BasalGenerator<ScriptedOutcomes> {
    let settings =
        PumpSettings::with_standard_schedule("Test", "Flat", BasalSchedule::flat(rate).unwrap());
    let stamper = CommonFieldsStamper::new(TimeManager::from_name(timezone).unwrap());
    BasalGenerator::new(settings, stamper, ScriptedOutcomes::new(script))
}

fn weighted_generator(timezone: &str, profile: PumpProfile, weights: OutcomeWeights) -> BasalGenerator {
    let settings = PumpSettings::for_profile(profile).unwrap();
    let stamper = CommonFieldsStamper::new(TimeManager::from_name(timezone).unwrap());
    BasalGenerator::new(settings, stamper, WeightedOutcomes::new(weights).unwrap())
}

fn basals(output: &BasalOutput) -> Vec<&BasalEvent> {
    output.basal_events().collect()
}

/// Flat schedule, one day, nothing overridden: a single full-day interval
#[test]
fn test_flat_schedule_single_day() {
    let mut rng = StdRng::seed_from_u64(1);
    let output = flat_generator("UTC", 1.25, vec![])
        .generate(local("2021-06-01 00:00:00"), 1, &mut rng)
        .unwrap();

    assert_eq!(output.events.len(), 1);
    assert!(output.suspensions.is_empty());

    let basal = output.events[0].as_basal().unwrap();
    assert_eq!(basal.delivery_type, DeliveryType::Scheduled);
    assert_eq!(basal.duration, DAY_MS);
    assert_eq!(basal.rate, Some(1.25));
    assert_eq!(basal.schedule_name.as_deref(), Some("standard"));
}

/// Forced temp on a flat day: shortened scheduled interval, then the temp
#[test]
fn test_forced_temp_on_flat_day() {
    let mut rng = StdRng::seed_from_u64(2);
    let start = local("2021-06-01 00:00:00");
    let output = flat_generator("UTC", 1.0, vec![DeliveryOutcome::TempOverride])
        .generate(start, 1, &mut rng)
        .unwrap();

    let events = basals(&output);
    assert_eq!(events.len(), 3);

    let scheduled = events[0];
    assert_eq!(scheduled.delivery_type, DeliveryType::Scheduled);
    assert!((300_000..3_000_000).contains(&scheduled.duration));
    assert_eq!(scheduled.duration % 60_000, 0);

    let temp = events[1];
    assert_eq!(temp.delivery_type, DeliveryType::Temp);
    assert_eq!(temp.start(), scheduled.end());
    assert!(temp.schedule_name.is_none());

    // the snapshot keeps the pre-shortening duration
    let suppressed = temp.suppressed.as_deref().unwrap();
    assert_eq!(suppressed.duration, DAY_MS);
    assert_eq!(suppressed.rate, Some(1.0));
    assert_eq!(suppressed.start(), scheduled.start());

    let percent = temp.percent.unwrap();
    assert_eq!(temp.rate, Some(1.0 * percent));

    // rest of the day, clipped
    let remainder = events[2];
    assert_eq!(remainder.delivery_type, DeliveryType::Scheduled);
    assert_eq!(remainder.start(), temp.end());

    let total: i64 = events.iter().map(|b| b.duration).sum();
    assert_eq!(total, DAY_MS);
}

/// Forced suspend: rate dropped, status events paired, interval recorded
#[test]
fn test_forced_suspend_on_flat_day() {
    let mut rng = StdRng::seed_from_u64(3);
    let output = flat_generator("Europe/Paris", 0.9, vec![DeliveryOutcome::Suspend])
        .generate(local("2021-06-01 00:00:00"), 1, &mut rng)
        .unwrap();

    let suspended = output.events[0].as_basal().unwrap();
    assert_eq!(suspended.delivery_type, DeliveryType::Suspend);
    assert!(suspended.rate.is_none());
    assert!(suspended.schedule_name.is_none());
    assert!((600_000..14_400_000).contains(&suspended.duration));

    let suspend = output.events[1].as_device_event().unwrap();
    assert_eq!(suspend.status(), Some(StatusKind::Suspend));
    assert_eq!(suspend.status_duration(), Some(suspended.duration));
    assert_eq!(suspend.common.time, suspended.start());

    let resume = output.events[2].as_device_event().unwrap();
    assert_eq!(resume.status(), Some(StatusKind::Resume));
    assert_eq!(resume.common.time, suspended.end());
    assert!(matches!(resume.detail, DeviceEventDetail::Status { .. }));

    assert_eq!(
        output.suspensions,
        vec![SuspensionInterval { start: suspended.start(), end: suspended.end() }]
    );

    let remainder = output.events[3].as_basal().unwrap();
    assert_eq!(remainder.start(), suspended.end());
    assert_eq!(remainder.duration, DAY_MS - suspended.duration);
}

/// An interval that starts part-way into a segment after the first step
/// runs only to the segment end
#[test]
fn test_clipped_segment_after_first_iteration() {
    let schedule = BasalSchedule::new(vec![
        ScheduleSegment::new(0, 0.5),
        ScheduleSegment::new(12 * 3_600_000, 1.5),
    ])
    .unwrap();
    let settings = PumpSettings::with_standard_schedule("Test", "Split", schedule);
    let stamper = CommonFieldsStamper::new(TimeManager::from_name("UTC").unwrap());
    let mut generator =
        BasalGenerator::new(settings, stamper, ScriptedOutcomes::new([DeliveryOutcome::Suspend]));

    let mut rng = StdRng::seed_from_u64(4);
    let output = generator.generate(local("2021-06-01 00:00:00"), 1, &mut rng).unwrap();
    let events = basals(&output);

    let suspend_ms = events[0].duration;
    assert_eq!(events[1].delivery_type, DeliveryType::Scheduled);
    assert_eq!(events[1].rate, Some(0.5));
    assert_eq!(events[1].duration, 12 * 3_600_000 - suspend_ms);

    assert_eq!(events[2].rate, Some(1.5));
    assert_eq!(events[2].duration, 12 * 3_600_000);
    assert_eq!(events.len(), 3);
}

/// Starting part-way into a segment uses the time left in that segment
#[test]
fn test_first_iteration_starts_mid_segment() {
    let mut rng = StdRng::seed_from_u64(5);
    let output = flat_generator("UTC", 1.0, vec![])
        .generate(local("2021-06-01 06:30:00"), 1, &mut rng)
        .unwrap();
    let events = basals(&output);

    assert_eq!(events[0].duration, DAY_MS - 6 * 3_600_000 - 1_800_000);

    // the last interval is not cut at the window end
    assert_eq!(events[1].duration, DAY_MS);
    assert_eq!(events.len(), 2);
}

/// Intervals tile the window with no drift, over many days
#[test]
fn test_clock_advance_does_not_drift() {
    let mut rng = StdRng::seed_from_u64(6);
    let start = local("2021-01-01 00:00:00");
    let mut generator = weighted_generator("UTC", PumpProfile::Medtronic, OutcomeWeights::default());
    let output = generator.generate(start, 30, &mut rng).unwrap();
    let events = basals(&output);

    let window_start = Utc.from_utc_datetime(&start);
    let window_end = window_start + Duration::days(30);

    assert_eq!(events[0].start(), window_start);
    for pair in events.windows(2) {
        assert_eq!(pair[1].start(), pair[0].end(), "gap or overlap at {}", pair[0].end());
    }
    let last = events[events.len() - 1];
    assert!(last.start() < window_end);
    assert!(last.end() >= window_end);

    // with no overrides the window is covered exactly
    let output = flat_generator("UTC", 1.0, vec![]).generate(start, 30, &mut rng).unwrap();
    let total: i64 = output.basal_events().map(|b| b.duration).sum();
    assert_eq!(total, 30 * DAY_MS);
    assert_eq!(output.events.len(), 30);
}

/// Properties that hold on every seeded run
#[test]
fn test_generated_event_properties() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = OutcomeWeights { scheduled: 600, temp_override: 250, suspend: 150 };
        let mut generator = weighted_generator("America/New_York", PumpProfile::Tandem, weights);
        let output = generator.generate(local("2021-03-10 00:00:00"), 10, &mut rng).unwrap();

        assert!(output.events.windows(2).all(|pair| pair[0].time() <= pair[1].time()));

        let mut suspensions = output.suspensions.iter();
        for (index, event) in output.events.iter().enumerate() {
            let Some(basal) = event.as_basal() else { continue };

            // rate present or suspended, never both
            assert_ne!(basal.rate.is_some(), basal.delivery_type == DeliveryType::Suspend);

            match basal.delivery_type {
                DeliveryType::Temp => {
                    let suppressed = basal.suppressed.as_deref().unwrap();
                    let percent = basal.percent.unwrap();
                    assert_eq!(basal.rate, Some(suppressed.rate.unwrap() * percent));

                    let whole = (percent * 100.0).round() as i64;
                    assert!((5..195).contains(&whole));
                    assert_eq!((whole - 5) % 10, 0);
                    assert!((1_200_000..21_600_000).contains(&basal.duration));
                }
                DeliveryType::Suspend => {
                    let suspend = output.events[index + 1].as_device_event().unwrap();
                    let resume = output.events[index + 2].as_device_event().unwrap();
                    assert_eq!(suspend.status(), Some(StatusKind::Suspend));
                    assert_eq!(resume.status(), Some(StatusKind::Resume));
                    assert_eq!(resume.common.time, basal.start() + Duration::milliseconds(basal.duration));

                    let interval = suspensions.next().unwrap();
                    assert_eq!(interval.start, basal.start());
                    assert_eq!(interval.end, resume.common.time);
                }
                DeliveryType::Scheduled => {
                    assert!(basal.duration > 0);
                }
            }
        }
        assert!(suspensions.next().is_none());
    }
}

/// Two runs with the same seed produce the same stream
#[test]
fn test_seeded_runs_are_deterministic() {
    let run = |seed: u64| -> Vec<(DateTime<Utc>, DeliveryType, i64)> {
        let mut rng = StdRng::seed_from_u64(seed);
        weighted_generator("Australia/Sydney", PumpProfile::OmniPod, OutcomeWeights::default())
            .generate(local("2021-04-01 00:00:00"), 5, &mut rng)
            .unwrap()
            .basal_events()
            .map(|b| (b.start(), b.delivery_type, b.duration))
            .collect()
    };
    assert_eq!(run(17), run(17));
    assert_ne!(run(17), run(18));
}

/// Input errors are reported before any event is produced
#[test]
fn test_generation_errors() {
    let mut rng = StdRng::seed_from_u64(7);

    let err = flat_generator("UTC", 1.0, vec![])
        .generate(local("2021-06-01 00:00:00"), 0, &mut rng)
        .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidArgument(_)));

    let err = generate_basal("2021-06-01 00:00:00", 1, "Not/AZone", "medtronic", &mut rng).unwrap_err();
    assert!(matches!(err, SimulationError::ConfigurationError(_)));

    // day counts beyond the supported range fail before any event
    for days in [MAX_SIMULATION_DAYS + 1, 200_000_000, i64::MAX] {
        let err = generate_basal("2021-06-01 00:00:00", days, "UTC", "medtronic", &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidArgument(_)), "{} days: {}", days, err);
    }
    let err = flat_generator("UTC", 1.0, vec![])
        .generate(local("2021-06-01 00:00:00"), 200_000_000, &mut rng)
        .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidArgument(_)));

    // first segment starts at 06:00, so midnight is not covered
    let schedule = BasalSchedule::new(vec![ScheduleSegment::new(6 * 3_600_000, 1.0)]).unwrap();
    let settings = PumpSettings::with_standard_schedule("Test", "Gap", schedule);
    let stamper = CommonFieldsStamper::new(TimeManager::from_name("UTC").unwrap());
    let err = BasalGenerator::new(settings, stamper, ScriptedOutcomes::new(Vec::<DeliveryOutcome>::new()))
        .generate(local("2021-06-01 00:00:00"), 1, &mut rng)
        .unwrap_err();
    assert!(matches!(err, SimulationError::ScheduleError(_)));

    // a start time inside the spring-forward gap does not exist
    let err = flat_generator("America/New_York", 1.0, vec![])
        .generate(local("2021-03-14 02:30:00"), 1, &mut rng)
        .unwrap_err();
    assert!(matches!(err, SimulationError::TimeError(_)));
}

