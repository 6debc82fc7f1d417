//! Error types and handling
//!
//! This module contains error types for event generation. Every failure is a
//! deterministic consequence of malformed input, so errors are surfaced to the
//! caller immediately and never retried.

use thiserror::Error;

/// Errors that can occur during event generation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration is unusable (unknown timezone, unknown pump profile, ...)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An argument is outside its accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Basal schedule is empty, malformed, or does not cover a time of day
    #[error("Schedule error: {0}")]
    ScheduleError(String),

    /// Time parsing or local time resolution failed
    #[error("Time error: {0}")]
    TimeError(String),

    /// Event generation failed
    #[error("Event generation failed: {0}")]
    EventGenerationError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a schedule (data) error
    pub fn schedule_error(msg: impl Into<String>) -> Self {
        Self::ScheduleError(msg.into())
    }

    /// Create a time error
    pub fn time_error(msg: impl Into<String>) -> Self {
        Self::TimeError(msg.into())
    }

    /// Create an event generation error
    pub fn event_generation_error(msg: impl Into<String>) -> Self {
        Self::EventGenerationError(msg.into())
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::InvalidArgument(_) => "Invalid Argument",
            SimulationError::ScheduleError(_) => "Schedule",
            SimulationError::TimeError(_) => "Time",
            SimulationError::EventGenerationError(_) => "Event Generation",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors_and_categories() {
        let err = SimulationError::configuration_error("unknown timezone 'Mars/Olympus'");
        assert_eq!(err.category(), "Configuration");
        assert!(err.to_string().contains("Mars/Olympus"));

        assert_eq!(SimulationError::invalid_argument("days").category(), "Invalid Argument");
        assert_eq!(SimulationError::schedule_error("empty").category(), "Schedule");
        assert_eq!(SimulationError::time_error("bad").category(), "Time");
        assert_eq!(SimulationError::event_generation_error("x").category(), "Event Generation");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SimulationError = io.into();
        assert_eq!(err.category(), "IO");
    }
}
