//! Pump Data Faker
//!
//! Synthesizes plausible insulin pump and continuous glucose monitor (CGM)
//! event logs for a single virtual device, for use as test fixtures.
//!
//! # Overview
//!
//! The heart of the library is the basal delivery generator. It walks a
//! multi-day window and, for every segment of the pump's basal schedule,
//! emits one of three delivery regimes:
//!
//! - **Scheduled**: the schedule's rate for the rest of the segment
//! - **Temp override**: a shortened scheduled interval followed by a temp basal
//!   whose rate is a percentage of the scheduled one
//! - **Suspend**: no delivery, bracketed by suspend/resume status events
//!
//! Segment lengths are corrected across daylight saving transitions, and any
//! segment that straddles one is always delivered as scheduled. A CGM pipeline
//! produces annotated glucose readings alongside the basal stream.
//!
//! Runs are deterministic for a given seed.
//!
//! ## Quick Start
//!
//! ```rust
//! use pump_data_faker::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let output = generate_basal("2021-03-13 00:00:00", 3, "America/New_York", "medtronic", &mut rng)?;
//!
//! for basal in output.basal_events() {
//!     assert!(basal.rate.is_some() || basal.delivery_type == DeliveryType::Suspend);
//! }
//! # Ok::<(), SimulationError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums, and configuration
//! - [`settings`]: basal schedules and built-in pump profiles
//! - [`events`]: event records and event construction
//! - [`simulation`]: basal generation, orchestration, statistics, logging
//! - [`cgm`]: glucose curve, sensor gaps, smoothing, and annotation
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod cgm;
pub mod events;
pub mod settings;
pub mod simulation;
pub mod types;

// Core types and identifiers
pub use types::{
    ConfigValidationError,
    DeliveryType,
    // Identifiers
    DeviceId,
    // Enums
    EventKind,
    OutputFormat,
    RangeFlag,
    // Configuration
    SimulationConfig,
    StatusKind,
    UploadId,
};

// Pump settings
pub use settings::{BasalSchedule, PumpProfile, PumpSettings, RateLookup, ScheduleSegment};

// Event records
pub use events::{BasalEvent, CbgEvent, CommonFields, CommonFieldsStamper, DeviceEvent, Event};

// Generation
pub use simulation::{
    generate_basal, BasalGenerator, BasalOutput, DeliveryOutcome, GenerationStatistics,
    OutcomePolicy, OutcomeWeights, ScriptedOutcomes, SimulationError, SimulationOrchestrator,
    SimulationResult, SuspensionInterval, TimeManager, WeightedOutcomes,
};

// CGM
pub use cgm::{annotate, CgmAnnotator, CgmPipeline};
