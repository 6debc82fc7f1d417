//! CGM value pipeline
//!
//! Builds continuous glucose readings alongside the basal stream:
//!
//! - **curve**: synthetic 5-minute glucose trace
//! - **gaps**: random sensor dropouts of 30 minutes to 3 hours
//! - **smoothing**: LOWESS over the remaining readings
//! - **annotate**: mmol/L conversion, out-of-range clamping and low alarms

pub mod annotate;
pub mod curve;
pub mod gaps;
pub mod pipeline;
pub mod smoothing;

pub use annotate::*;
pub use curve::*;
pub use gaps::*;
pub use pipeline::*;
pub use smoothing::*;
