//! Pump status and alarm event construction

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::BTreeMap;

use super::common_fields::CommonFieldsStamper;
use super::event::{DeviceEvent, DeviceEventDetail};
use crate::types::{EventKind, StatusKind};

/// Shortest randomized status duration (10 minutes)
pub const MIN_STATUS_DURATION_MS: i64 = 600_000;

/// Upper bound (exclusive) of randomized status durations (4 hours)
pub const MAX_STATUS_DURATION_MS: i64 = 14_400_000;

/// Status durations are whole minutes
pub const STATUS_DURATION_STEP_MS: i64 = 60_000;

/// Alarm type raised for low CGM readings
pub const LOW_GLUCOSE_ALARM: &str = "low_glucose";

/// Draw a status duration uniformly from `[10 min, 4 h)` in whole minutes
pub fn random_status_duration<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    let steps = (MAX_STATUS_DURATION_MS - MIN_STATUS_DURATION_MS) / STATUS_DURATION_STEP_MS;
    MIN_STATUS_DURATION_MS + rng.gen_range(0..steps) * STATUS_DURATION_STEP_MS
}

/// Builds device meta events for one device
#[derive(Debug, Clone)]
pub struct DeviceEventFactory {
    stamper: CommonFieldsStamper,
}

impl DeviceEventFactory {
    /// Create a factory stamping events with `stamper`
    pub fn new(stamper: CommonFieldsStamper) -> Self {
        Self { stamper }
    }

    /// A manual suspend or resume status event with its own random duration
    pub fn make_status_event<R: Rng + ?Sized>(
        &self,
        kind: StatusKind,
        at: DateTime<Utc>,
        rng: &mut R,
    ) -> DeviceEvent {
        let mut reason = BTreeMap::new();
        reason.insert(kind.as_status().to_string(), "manual".to_string());

        DeviceEvent {
            common: self.stamper.stamp(EventKind::DeviceEvent, at),
            detail: DeviceEventDetail::Status {
                status: kind,
                reason,
                duration: random_status_duration(rng),
            },
        }
    }

    /// A low glucose alarm
    pub fn make_alarm_event(&self, at: DateTime<Utc>) -> DeviceEvent {
        DeviceEvent {
            common: self.stamper.stamp(EventKind::DeviceEvent, at),
            detail: DeviceEventDetail::Alarm { alarm_type: LOW_GLUCOSE_ALARM.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::TimeManager;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn factory() -> DeviceEventFactory {
        DeviceEventFactory::new(CommonFieldsStamper::new(TimeManager::from_name("UTC").unwrap()))
    }

    #[test]
    fn test_status_duration_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let duration = random_status_duration(&mut rng);
            assert!((MIN_STATUS_DURATION_MS..MAX_STATUS_DURATION_MS).contains(&duration));
            assert_eq!(duration % STATUS_DURATION_STEP_MS, 0);
        }
    }

    #[test]
    fn test_suspend_status_event() {
        let mut rng = StdRng::seed_from_u64(1);
        let at = Utc.with_ymd_and_hms(2021, 3, 1, 8, 0, 0).unwrap();
        let event = factory().make_status_event(StatusKind::Suspend, at, &mut rng);

        assert_eq!(event.common.kind, EventKind::DeviceEvent);
        assert_eq!(event.status(), Some(StatusKind::Suspend));
        assert!(event.status_duration().unwrap() >= MIN_STATUS_DURATION_MS);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["subType"], "status");
        assert_eq!(json["status"], "suspended");
        assert_eq!(json["reason"]["suspended"], "manual");
    }

    #[test]
    fn test_alarm_event() {
        let at = Utc.with_ymd_and_hms(2021, 3, 1, 8, 0, 0).unwrap();
        let event = factory().make_alarm_event(at);
        assert!(event.is_alarm());
        assert!(event.status_duration().is_none());
        assert_eq!(event.common.time, at);
    }
}
