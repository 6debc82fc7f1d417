//! CGM reading construction and range annotation

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::events::{Annotation, CbgEvent, CommonFieldsStamper, DeviceEventFactory, Event};
use crate::simulation::{SimulationError, SimulationResult, TimeManager};
use crate::types::{EventKind, RangeFlag};

/// mg/dL per mmol/L of glucose
pub const MG_DL_PER_MMOL_L: f64 = 18.01559;

/// Highest reading the sensor reports, mg/dL
pub const HIGH_THRESHOLD: f64 = 400.0;

/// Value stored for readings above [`HIGH_THRESHOLD`], mg/dL
pub const HIGH_CLAMP: f64 = 401.0;

/// Lowest reading the sensor reports, mg/dL
pub const LOW_THRESHOLD: f64 = 40.0;

/// Value stored for readings below [`LOW_THRESHOLD`], mg/dL
pub const LOW_CLAMP: f64 = 39.0;

/// Annotation code for clamped readings
pub const OUT_OF_RANGE_CODE: &str = "bg/out-of-range";

/// Units of emitted CGM readings
pub const MMOL_UNITS: &str = "mmol/L";

/// Convert a glucose value from mg/dL to mmol/L
pub fn convert_to_mmol(mg_dl: f64) -> f64 {
    mg_dl / MG_DL_PER_MMOL_L
}

/// Turns glucose values into CGM events for one device
#[derive(Debug, Clone)]
pub struct CgmAnnotator {
    stamper: CommonFieldsStamper,
    device_events: DeviceEventFactory,
}

impl CgmAnnotator {
    /// Create an annotator stamping events with `stamper`
    pub fn new(stamper: CommonFieldsStamper) -> Self {
        let device_events = DeviceEventFactory::new(stamper.clone());
        Self { stamper, device_events }
    }

    /// Build CGM events for `values` (mg/dL) read at `timestamps`.
    ///
    /// Out-of-range values are clamped and annotated. Each low reading is
    /// preceded by a low glucose alarm at the same instant. NaN or infinite
    /// values fail the whole batch.
    pub fn annotate(
        &self,
        values: &[f64],
        timestamps: &[DateTime<Utc>],
    ) -> SimulationResult<Vec<Event>> {
        if values.len() != timestamps.len() {
            return Err(SimulationError::invalid_argument(format!(
                "Got {} glucose values for {} timestamps",
                values.len(),
                timestamps.len()
            )));
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(SimulationError::invalid_argument(format!(
                "Glucose value {} at index {} is not a finite number",
                values[index], index
            )));
        }

        let mut events = Vec::with_capacity(values.len());
        let mut alarms = 0usize;

        for (&value, &at) in values.iter().zip(timestamps) {
            let (stored, annotation) = if value > HIGH_THRESHOLD {
                (HIGH_CLAMP, Some(out_of_range(HIGH_THRESHOLD, RangeFlag::High)))
            } else if value < LOW_THRESHOLD {
                events.push(self.device_events.make_alarm_event(at).into());
                alarms += 1;
                (LOW_CLAMP, Some(out_of_range(LOW_THRESHOLD, RangeFlag::Low)))
            } else {
                (value, None)
            };

            events.push(
                CbgEvent {
                    common: self.stamper.stamp(EventKind::Cbg, at),
                    value: convert_to_mmol(stored),
                    units: MMOL_UNITS.to_string(),
                    annotations: annotation.into_iter().collect(),
                }
                .into(),
            );
        }

        debug!("Annotated {} CGM readings with {} low alarms", values.len(), alarms);
        Ok(events)
    }
}

fn out_of_range(threshold: f64, value: RangeFlag) -> Annotation {
    Annotation { code: OUT_OF_RANGE_CODE.to_string(), threshold, value }
}

/// Annotate readings for a device in the named timezone
pub fn annotate(
    values: &[f64],
    timestamps: &[DateTime<Utc>],
    timezone: &str,
) -> SimulationResult<Vec<Event>> {
    let stamper = CommonFieldsStamper::new(TimeManager::from_name(timezone)?);
    CgmAnnotator::new(stamper).annotate(values, timestamps)
}
