//! Synthetic glucose curve

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::simulation::time_manager::{check_num_days, window_end};
use crate::simulation::{SimulationError, SimulationResult};

/// CGM sampling interval (5 minutes)
pub const CGM_INTERVAL_MS: i64 = 300_000;

/// Samples per day at the CGM interval
pub const SAMPLES_PER_DAY: i64 = 86_400_000 / CGM_INTERVAL_MS;

const BASELINE_MG_DL: f64 = 140.0;
const DAILY_AMPLITUDE: f64 = 70.0;
const MEAL_AMPLITUDE: f64 = 45.0;
const MEAL_PERIOD_HOURS: f64 = 6.0;
const NOISE_STEP: f64 = 6.0;
const MIN_MG_DL: f64 = 20.0;
const MAX_MG_DL: f64 = 480.0;

/// Glucose values (mg/dL) paired with UTC sample times, in time order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlucoseCurve {
    /// Sample times
    pub times: Vec<DateTime<Utc>>,
    /// Glucose at each sample time, mg/dL
    pub values: Vec<f64>,
}

impl GlucoseCurve {
    /// Pair up times and values; both must have the same length
    pub fn new(times: Vec<DateTime<Utc>>, values: Vec<f64>) -> SimulationResult<Self> {
        if times.len() != values.len() {
            return Err(SimulationError::invalid_argument(format!(
                "Glucose curve has {} times but {} values",
                times.len(),
                values.len()
            )));
        }
        Ok(Self { times, values })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the curve has no samples
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample times as epoch seconds
    pub fn epoch_seconds(&self) -> Vec<f64> {
        self.times.iter().map(|t| t.timestamp() as f64).collect()
    }

    /// Keep only the samples for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(DateTime<Utc>) -> bool) {
        let (times, values) = self
            .times
            .iter()
            .zip(&self.values)
            .filter(|(time, _)| keep(**time))
            .map(|(time, value)| (*time, *value))
            .unzip();
        self.times = times;
        self.values = values;
    }
}

/// Build a plausible-looking glucose trace sampled every five minutes.
///
/// A daily swing and a shorter meal-like oscillation ride on a baseline, with
/// a bounded random walk on top. Excursions past 400 and below 40 mg/dL occur
/// occasionally so that range annotations get exercised.
pub fn synthetic_curve<R: Rng + ?Sized>(
    start: DateTime<Utc>,
    num_days: i64,
    rng: &mut R,
) -> SimulationResult<GlucoseCurve> {
    check_num_days(num_days)?;
    window_end(start, num_days)?;
    let samples = num_days
        .checked_mul(SAMPLES_PER_DAY)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            SimulationError::invalid_argument(format!("Too many CGM samples for {} days", num_days))
        })?;
    let mut curve = GlucoseCurve {
        times: Vec::with_capacity(samples),
        values: Vec::with_capacity(samples),
    };

    let phase = rng.gen_range(0.0..std::f64::consts::TAU);
    let mut drift = 0.0_f64;

    for index in 0..samples {
        let hours = index as f64 * CGM_INTERVAL_MS as f64 / 3_600_000.0;
        let daily = (std::f64::consts::TAU * hours / 24.0 + phase).sin() * DAILY_AMPLITUDE;
        let meals = (std::f64::consts::TAU * hours / MEAL_PERIOD_HOURS).sin().max(0.0) * MEAL_AMPLITUDE;

        drift = (drift + rng.gen_range(-NOISE_STEP..NOISE_STEP)) * 0.97;

        let value = (BASELINE_MG_DL + daily + meals + drift * 4.0).clamp(MIN_MG_DL, MAX_MG_DL);
        curve.times.push(start + Duration::milliseconds(index as i64 * CGM_INTERVAL_MS));
        curve.values.push(value);
    }

    Ok(curve)
}
