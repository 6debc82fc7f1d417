//! Pump settings and basal schedules
//!
//! This module is the schedule provider for the basal generator.
//!
//! - **BasalSchedule**: validated daily schedule with time-of-day lookup
//! - **RateLookup**: the active segment for a looked-up time of day
//! - **PumpSettings**: named schedules plus device metadata, loaded per profile

pub mod pump_settings;
pub mod schedule;

pub use pump_settings::*;
pub use schedule::*;
