//! Core types and identifiers for the pump data faker
//!
//! This module contains identifiers, enumerations and the run configuration.
//!
//! # Overview
//!
//! - **Identifiers**: UUID-based device and upload identifiers
//! - **Enums**: event kinds, basal delivery types, pump status kinds, output formats
//! - **Configuration**: run configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use pump_data_faker::types::*;
//!
//! let device_id = DeviceId::new();
//! assert!(device_id.to_string().starts_with("DEV_"));
//!
//! let config = SimulationConfig {
//!     days: 7,
//!     timezone: "America/New_York".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
