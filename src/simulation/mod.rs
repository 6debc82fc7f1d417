//! Simulation orchestration and control
//!
//! This module contains the basal generator, the run orchestrator, time
//! utilities, statistics collection, logging, and error handling.
//!
//! # Overview
//!
//! - **BasalGenerator**: walks the simulated clock and emits basal intervals
//! - **OutcomePolicy**: picks scheduled, temp override or suspend for each interval
//! - **TimeManager**: local/UTC conversion and DST-aware offsets
//! - **SimulationOrchestrator**: runs basal and CGM generation from a configuration
//! - **GenerationStatistics**: counts what a run produced
//! - **SimulationError**: error handling for generation
//!
//! # Usage Example
//!
//! ```rust
//! use pump_data_faker::simulation::*;
//! use pump_data_faker::types::SimulationConfig;
//!
//! let config = SimulationConfig {
//!     days: 2,
//!     seed: Some(7),
//!     include_cgm: false,
//!     ..Default::default()
//! };
//!
//! let mut orchestrator = SimulationOrchestrator::new(config)?;
//! let output = orchestrator.run()?;
//! assert!(output.statistics.basal_events() > 0);
//! # Ok::<(), SimulationError>(())
//! ```

pub mod basal_generator;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod outcome;
pub mod statistics;
pub mod time_manager;

// Re-export all public types for convenience
pub use basal_generator::*;
pub use error::*;
pub use logging::*;
pub use orchestrator::*;
pub use outcome::*;
pub use statistics::*;
pub use time_manager::*;
