//! End-to-end CGM generation

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, instrument};

use super::annotate::CgmAnnotator;
use super::curve::synthetic_curve;
use super::gaps::insert_gaps;
use super::smoothing::{smoothing_fraction, Lowess};
use crate::events::{CommonFieldsStamper, Event};
use crate::simulation::SimulationResult;

/// Curve, gaps, smoothing and annotation for one device
#[derive(Debug, Clone)]
pub struct CgmPipeline {
    annotator: CgmAnnotator,
    gap_count: usize,
}

impl CgmPipeline {
    /// Pipeline stamping with `stamper` and cutting `gap_count` sensor gaps
    pub fn new(stamper: CommonFieldsStamper, gap_count: usize) -> Self {
        Self { annotator: CgmAnnotator::new(stamper), gap_count }
    }

    /// Generate `num_days` of CGM readings starting at `start`
    #[instrument(skip(self, rng))]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        start: DateTime<Utc>,
        num_days: i64,
        rng: &mut R,
    ) -> SimulationResult<Vec<Event>> {
        let mut curve = synthetic_curve(start, num_days, rng)?;
        insert_gaps(&mut curve, self.gap_count, rng);

        let smoothed = Lowess::new(smoothing_fraction(num_days).min(1.0))?
            .smooth(&curve.epoch_seconds(), &curve.values)?;

        let events = self.annotator.annotate(&smoothed, &curve.times)?;
        info!("Generated {} CGM events from {} readings", events.len(), curve.len());
        Ok(events)
    }
}
