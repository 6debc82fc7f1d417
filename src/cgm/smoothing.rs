//! LOWESS smoothing
//!
//! Locally weighted linear regression with tricube distance weights and
//! optional bisquare robustness passes. Inputs must be sorted by `x`.

use crate::simulation::{SimulationError, SimulationResult};

/// Smoothing distance the CGM pipeline aims for, in minutes
pub const SMOOTHING_DISTANCE_MINUTES: f64 = 1.5;

/// Default number of robustness passes
pub const DEFAULT_ROBUSTNESS_ITERATIONS: usize = 3;

/// Fraction of points used for each local fit over a `num_days` series
pub fn smoothing_fraction(num_days: i64) -> f64 {
    (SMOOTHING_DISTANCE_MINUTES / (num_days.max(1) as f64 * 60.0 * 24.0)) * 100.0
}

/// LOWESS smoother
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lowess {
    fraction: f64,
    iterations: usize,
}

impl Lowess {
    /// Smoother using `fraction` of the points for each local fit
    pub fn new(fraction: f64) -> SimulationResult<Self> {
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return Err(SimulationError::invalid_argument(format!(
                "LOWESS fraction must be in (0, 1], got {}",
                fraction
            )));
        }
        Ok(Self { fraction, iterations: DEFAULT_ROBUSTNESS_ITERATIONS })
    }

    /// Set the number of robustness passes (0 for a plain weighted fit)
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Fitted values of `y` at each `x`
    pub fn smooth(&self, x: &[f64], y: &[f64]) -> SimulationResult<Vec<f64>> {
        if x.len() != y.len() {
            return Err(SimulationError::invalid_argument(format!(
                "LOWESS inputs differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(SimulationError::invalid_argument("LOWESS inputs must be sorted by x"));
        }

        let n = x.len();
        if n < 3 {
            return Ok(y.to_vec());
        }

        let k = ((self.fraction * n as f64).ceil() as usize).clamp(2, n);
        let mut robustness = vec![1.0; n];
        let mut fitted = vec![0.0; n];
        let tolerance = 1e-10 * y.iter().fold(1.0_f64, |max, value| max.max(value.abs()));

        for iteration in 0..=self.iterations {
            let mut left = 0;
            for i in 0..n {
                // slide the k-point window toward x[i]
                while left + k < n && x[i] - x[left] > x[left + k] - x[i] {
                    left += 1;
                }
                let right = left + k - 1;
                let radius = (x[i] - x[left]).max(x[right] - x[i]);
                fitted[i] = local_fit(x, y, &robustness, i, left, right, radius);
            }

            if iteration == self.iterations {
                break;
            }

            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(y, f)| (y - f).abs()).collect();
            let scale = median(&residuals) * 6.0;
            if scale <= tolerance {
                break;
            }
            for (weight, residual) in robustness.iter_mut().zip(&residuals) {
                *weight = bisquare(residual / scale);
            }
        }

        Ok(fitted)
    }
}

fn local_fit(
    x: &[f64],
    y: &[f64],
    robustness: &[f64],
    i: usize,
    left: usize,
    right: usize,
    radius: f64,
) -> f64 {
    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);

    // sums are taken relative to x[i]
    for j in left..=right {
        let dx = x[j] - x[i];
        let distance = if radius > 0.0 { dx.abs() / radius } else { 0.0 };
        let w = tricube(distance) * robustness[j];
        sw += w;
        sx += w * dx;
        sy += w * y[j];
        sxx += w * dx * dx;
        sxy += w * dx * y[j];
    }

    if sw <= 0.0 {
        return y[i];
    }

    let mean_x = sx / sw;
    let mean_y = sy / sw;
    let variance = sxx / sw - mean_x * mean_x;
    if variance <= 1e-12 * radius * radius {
        return mean_y;
    }

    let slope = (sxy / sw - mean_x * mean_y) / variance;
    mean_y - slope * mean_x
}

fn tricube(u: f64) -> f64 {
    if u >= 1.0 {
        0.0
    } else {
        let t = 1.0 - u * u * u;
        t * t * t
    }
}

fn bisquare(u: f64) -> f64 {
    if u >= 1.0 {
        0.0
    } else {
        let t = 1.0 - u * u;
        t * t
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_fraction() {
        assert!((smoothing_fraction(1) - 150.0 / 1440.0).abs() < 1e-12);
        assert!((smoothing_fraction(3) - 150.0 / 4320.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_data_is_preserved() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|x| 3.0 * x + 7.0).collect();
        let fitted = Lowess::new(0.3).unwrap().smooth(&x, &y).unwrap();
        for (f, expected) in fitted.iter().zip(&y) {
            assert!((f - expected).abs() < 1e-6, "{} != {}", f, expected);
        }
    }

    #[test]
    fn test_outlier_is_damped() {
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let mut y = vec![100.0; 40];
        y[20] = 300.0;
        let fitted = Lowess::new(0.25).unwrap().smooth(&x, &y).unwrap();
        assert!(fitted[20] < 150.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Lowess::new(0.0).is_err());
        assert!(Lowess::new(1.5).is_err());

        let lowess = Lowess::new(0.5).unwrap();
        assert!(lowess.smooth(&[0.0, 1.0], &[1.0]).is_err());
        assert!(lowess.smooth(&[2.0, 1.0, 3.0], &[1.0, 1.0, 1.0]).is_err());
        assert_eq!(lowess.smooth(&[0.0, 1.0], &[4.0, 5.0]).unwrap(), vec![4.0, 5.0]);
    }
}
