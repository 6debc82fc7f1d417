//! Event records and event construction
//!
//! This module defines the records the faker emits and the leaf helpers the
//! generators use to build them.
//!
//! # Overview
//!
//! - **Event**: basal, device or CGM record with shared [`CommonFields`]
//! - **CommonFieldsStamper**: fills in device/time metadata for a timestamp
//! - **DeviceEventFactory**: pump suspend/resume status events and low glucose alarms
//!
//! # Usage Example
//!
//! ```rust
//! use pump_data_faker::events::*;
//! use pump_data_faker::simulation::TimeManager;
//! use pump_data_faker::types::EventKind;
//! use chrono::Utc;
//!
//! let stamper = CommonFieldsStamper::new(TimeManager::from_name("America/Denver")?);
//! let common = stamper.stamp(EventKind::Basal, Utc::now());
//! let basal = BasalEvent::scheduled(common, "standard", 0.85, 3_600_000);
//! assert_eq!(basal.rate, Some(0.85));
//! # Ok::<(), pump_data_faker::simulation::SimulationError>(())
//! ```

pub mod common_fields;
pub mod device_event;
pub mod event;

pub use common_fields::*;
pub use device_event::*;
pub use event::*;
