//! Random sensor gaps

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use super::curve::{GlucoseCurve, CGM_INTERVAL_MS};

/// Shortest gap (30 minutes)
pub const MIN_GAP_MS: i64 = 1_800_000;

/// Longest gap (3 hours)
pub const MAX_GAP_MS: i64 = 10_800_000;

/// A window with no sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorGap {
    /// First missing instant
    pub start: DateTime<Utc>,
    /// End of the gap (exclusive)
    pub end: DateTime<Utc>,
}

impl SensorGap {
    /// Whether `instant` falls inside the gap
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Remove `gap_count` random windows of 30 minutes to 3 hours from `curve`.
///
/// Gaps start on sample times and may overlap. Returns the gaps that were cut.
pub fn insert_gaps<R: Rng + ?Sized>(
    curve: &mut GlucoseCurve,
    gap_count: usize,
    rng: &mut R,
) -> Vec<SensorGap> {
    if curve.is_empty() || gap_count == 0 {
        return Vec::new();
    }

    let steps = (MAX_GAP_MS - MIN_GAP_MS) / CGM_INTERVAL_MS + 1;
    let gaps: Vec<SensorGap> = (0..gap_count)
        .map(|_| {
            let start = curve.times[rng.gen_range(0..curve.len())];
            let length = MIN_GAP_MS + rng.gen_range(0..steps) * CGM_INTERVAL_MS;
            SensorGap { start, end: start + Duration::milliseconds(length) }
        })
        .collect();

    let before = curve.len();
    curve.retain(|time| !gaps.iter().any(|gap| gap.contains(time)));
    debug!("Inserted {} sensor gaps, dropped {} readings", gaps.len(), before - curve.len());

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgm::synthetic_curve;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gaps_remove_readings() {
        let mut rng = StdRng::seed_from_u64(8);
        let start = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        let mut curve = synthetic_curve(start, 3, &mut rng).unwrap();
        let original = curve.len();

        let gaps = insert_gaps(&mut curve, 4, &mut rng);

        assert_eq!(gaps.len(), 4);
        assert!(curve.len() < original);
        for gap in &gaps {
            let length = gap.end - gap.start;
            assert!(length >= Duration::minutes(30) && length <= Duration::hours(3));
            assert!(curve.times.iter().all(|t| !gap.contains(*t)));
        }
    }

    #[test]
    fn test_no_gaps_requested() {
        let mut rng = StdRng::seed_from_u64(8);
        let start = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        let mut curve = synthetic_curve(start, 1, &mut rng).unwrap();
        assert!(insert_gaps(&mut curve, 0, &mut rng).is_empty());
        assert_eq!(curve.len(), 288);
    }
}
