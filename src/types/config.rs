//! Configuration structures for the pump data faker
//!
//! This module contains the run configuration, its command line and file
//! sources, and the validation applied before any event is generated.

use super::OutputFormat;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::PumpProfile;
use crate::simulation::time_manager::{parse_local_time, parse_timezone, MAX_SIMULATION_DAYS};
use crate::simulation::OutcomeWeights;

/// Command line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pump-data-faker",
    version,
    about = "Pump Data Faker - Generates synthetic insulin pump and CGM event logs",
    long_about = "Generates synthetic insulin pump basal delivery and CGM events for a single virtual device, for use as test fixtures. Basal delivery follows the pump profile's schedule with random temp basals and suspensions, and is corrected across daylight saving transitions.

EXAMPLES:
    # Run with default settings
    pump-data-faker

    # Three days in New York on a Tandem pump, reproducibly
    pump-data-faker --days 3 --timezone America/New_York --pump-profile tandem --seed 42

    # Use a configuration file
    pump-data-faker --config config.json

    # Generate configuration template
    pump-data-faker --print-config > my-config.json

    # Validate configuration without running
    pump-data-faker --config my-config.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Local start time
    #[arg(
        long,
        help = "Local start time (YYYY-MM-DD HH:MM:SS)",
        long_help = "Wall-clock start time in the device timezone, formatted YYYY-MM-DD HH:MM:SS. Default: 2021-01-01 00:00:00"
    )]
    pub start_time: Option<String>,

    /// Number of days to simulate
    #[arg(
        long,
        help = "Number of days to simulate",
        long_help = "Number of days to simulate, between 1 and 36500. Default: 1"
    )]
    pub days: Option<i64>,

    /// Device timezone
    #[arg(
        long,
        help = "IANA timezone of the device",
        long_help = "IANA timezone name of the device, e.g. America/New_York. Default: America/Los_Angeles"
    )]
    pub timezone: Option<String>,

    /// Pump profile
    #[arg(
        long,
        help = "Pump profile (medtronic, tandem, omnipod)",
        long_help = "Built-in pump profile providing the basal schedule. Supported: medtronic, tandem, omnipod. Default: medtronic"
    )]
    pub pump_profile: Option<String>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Weight of scheduled delivery
    #[arg(long, help = "Relative weight of scheduled delivery")]
    pub scheduled_weight: Option<u32>,

    /// Weight of temp basal overrides
    #[arg(long, help = "Relative weight of temp basal overrides")]
    pub temp_weight: Option<u32>,

    /// Weight of pump suspensions
    #[arg(long, help = "Relative weight of pump suspensions")]
    pub suspend_weight: Option<u32>,

    /// Skip CGM generation
    #[arg(long, help = "Generate basal and pump events only")]
    pub no_cgm: bool,

    /// Number of CGM sensor gaps
    #[arg(long, help = "Number of random CGM sensor gaps")]
    pub cgm_gaps: Option<usize>,

    /// Output format for generated events
    #[arg(
        long,
        help = "Output format (json or jsonl)",
        long_help = "Output format for generated events. Supported formats: json, jsonl. Default: json"
    )]
    pub output_format: Option<String>,

    /// Output file
    #[arg(short, long, help = "Write events to this file instead of stdout")]
    pub output: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Diagnostics as JSON lines
    #[arg(long, help = "Write diagnostics to stderr as JSON lines")]
    pub log_json: bool,

    /// Diagnostics log file
    #[arg(long, value_name = "PATH", help = "Also append JSON diagnostics to this file")]
    pub log_file: Option<PathBuf>,

    /// Dry run mode - validate configuration without generating events
    #[arg(long, help = "Validate configuration without generating events")]
    pub dry_run: bool,

    /// Print configuration and exit
    #[arg(long, help = "Print configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Local start time
    pub start_time: Option<String>,

    /// Number of days to simulate
    pub days: Option<i64>,

    /// Device timezone
    pub timezone: Option<String>,

    /// Pump profile
    pub pump_profile: Option<String>,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Delivery outcome weights
    pub outcome_weights: Option<OutcomeWeights>,

    /// Whether to generate CGM readings
    pub include_cgm: Option<bool>,

    /// Number of CGM sensor gaps
    pub cgm_gaps: Option<usize>,

    /// Output format for generated events
    pub output_format: Option<String>,

    /// Output file
    pub output_path: Option<String>,
}

/// Configuration for a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Local start time (`YYYY-MM-DD HH:MM:SS`)
    pub start_time: String,

    /// Number of days to simulate
    pub days: i64,

    /// IANA timezone of the device
    pub timezone: String,

    /// Pump profile providing the basal schedule
    pub pump_profile: String,

    /// Random seed; entropy when absent
    pub seed: Option<u64>,

    /// Delivery outcome weights
    pub outcome_weights: OutcomeWeights,

    /// Whether to generate CGM readings
    pub include_cgm: bool,

    /// Number of CGM sensor gaps
    pub cgm_gaps: usize,

    /// Output format for generated events
    pub output_format: String,

    /// Output file; stdout when absent
    pub output_path: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for the run configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// Days count is invalid
    #[error("Days count must be between 1 and 36500, got {0}")]
    InvalidDaysCount(i64),

    /// Start time does not parse
    #[error("Invalid start time '{value}': {reason}")]
    InvalidStartTime {
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Timezone is not a known IANA zone
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Pump profile is not built in
    #[error("Unknown pump profile: {0} (supported: medtronic, tandem, omnipod)")]
    UnknownPumpProfile(String),

    /// Every outcome weight is zero
    #[error("At least one outcome weight must be greater than 0")]
    ZeroOutcomeWeights,

    /// Output format is not supported
    #[error("Invalid output format: {0} (supported: json, jsonl)")]
    InvalidOutputFormat(String),
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: "2021-01-01 00:00:00".to_string(),
            days: 1,
            timezone: "America/Los_Angeles".to_string(),
            pump_profile: "medtronic".to_string(),
            seed: None,
            outcome_weights: OutcomeWeights::default(),
            include_cgm: true,
            cgm_gaps: 2,
            output_format: "json".to_string(),
            output_path: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let content = fs::read_to_string(path)?;
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            start_time: config_file.start_time.unwrap_or(defaults.start_time),
            days: config_file.days.unwrap_or(defaults.days),
            timezone: config_file.timezone.unwrap_or(defaults.timezone),
            pump_profile: config_file.pump_profile.unwrap_or(defaults.pump_profile),
            seed: config_file.seed.or(defaults.seed),
            outcome_weights: config_file.outcome_weights.unwrap_or(defaults.outcome_weights),
            include_cgm: config_file.include_cgm.unwrap_or(defaults.include_cgm),
            cgm_gaps: config_file.cgm_gaps.unwrap_or(defaults.cgm_gaps),
            output_format: config_file.output_format.unwrap_or(defaults.output_format),
            output_path: config_file.output_path.or(defaults.output_path),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        if let Some(value) = args.start_time {
            config.start_time = value;
        }
        if let Some(value) = args.days {
            config.days = value;
        }
        if let Some(value) = args.timezone {
            config.timezone = value;
        }
        if let Some(value) = args.pump_profile {
            config.pump_profile = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.scheduled_weight {
            config.outcome_weights.scheduled = value;
        }
        if let Some(value) = args.temp_weight {
            config.outcome_weights.temp_override = value;
        }
        if let Some(value) = args.suspend_weight {
            config.outcome_weights.suspend = value;
        }
        if args.no_cgm {
            config.include_cgm = false;
        }
        if let Some(value) = args.cgm_gaps {
            config.cgm_gaps = value;
        }
        if let Some(value) = args.output_format {
            config.output_format = value;
        }
        if let Some(value) = args.output {
            config.output_path = Some(value);
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.days <= 0 || self.days > MAX_SIMULATION_DAYS {
            return Err(ConfigValidationError::InvalidDaysCount(self.days));
        }

        if let Err(e) = parse_local_time(&self.start_time) {
            return Err(ConfigValidationError::InvalidStartTime {
                value: self.start_time.clone(),
                reason: e.to_string(),
            });
        }

        if parse_timezone(&self.timezone).is_err() {
            return Err(ConfigValidationError::UnknownTimezone(self.timezone.clone()));
        }

        if self.pump_profile.parse::<PumpProfile>().is_err() {
            return Err(ConfigValidationError::UnknownPumpProfile(self.pump_profile.clone()));
        }

        if self.outcome_weights.total() == 0 {
            return Err(ConfigValidationError::ZeroOutcomeWeights);
        }

        if self.get_output_format().is_err() {
            return Err(ConfigValidationError::InvalidOutputFormat(self.output_format.clone()));
        }

        Ok(())
    }

    /// Parse the configured output format
    pub fn get_output_format(&self) -> Result<OutputFormat, String> {
        self.output_format.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();

        assert_eq!(config.start_time, "2021-01-01 00:00:00");
        assert_eq!(config.days, 1);
        assert_eq!(config.timezone, "America/Los_Angeles");
        assert_eq!(config.pump_profile, "medtronic");
        assert!(config.seed.is_none());
        assert_eq!(config.outcome_weights, OutcomeWeights::default());
        assert!(config.include_cgm);
        assert_eq!(config.cgm_gaps, 2);
        assert_eq!(config.output_format, "json");
        assert!(config.output_path.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_days_cli_parsing() {
        let cli_args = CliArgs::try_parse_from(["test", "--days", "5"]).unwrap();
        assert_eq!(cli_args.days, Some(5));

        let config = SimulationConfig::from_cli_args(empty_args()).unwrap();
        assert_eq!(config.days, 1);
    }

    #[test]
    fn test_days_validation() {
        let mut config = SimulationConfig::default();
        config.days = 0;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidDaysCount(0))));

        config.days = -3;
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidDaysCount(-3))));

        config.days = 200_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::InvalidDaysCount(200_000_000)));
        assert!(err.to_string().contains("between 1 and 36500"));

        config.days = MAX_SIMULATION_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "start_time": "2021-03-13 06:30:00",
            "days": 4,
            "timezone": "America/New_York",
            "pump_profile": "omnipod",
            "seed": 12345,
            "outcome_weights": { "scheduled": 70, "temp_override": 20, "suspend": 10 },
            "include_cgm": false,
            "output_format": "jsonl"
        }"#;

        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = SimulationConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.start_time, "2021-03-13 06:30:00");
        assert_eq!(config.days, 4);
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.pump_profile, "omnipod");
        assert_eq!(config.seed, Some(12345));
        assert_eq!(config.outcome_weights.temp_override, 20);
        assert!(!config.include_cgm);
        assert_eq!(config.output_format, "jsonl");
        // not in the file
        assert_eq!(config.cgm_gaps, 2);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_file_errors() {
        use tempfile::Builder;

        assert!(matches!(
            SimulationConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::FileNotFound(_))
        ));

        let temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            SimulationConfig::from_file(temp_file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "test",
            "--days",
            "3",
            "--timezone",
            "Europe/London",
            "--temp-weight",
            "300",
            "--seed",
            "54321",
            "--no-cgm",
            "--output",
            "events.json",
        ])
        .unwrap();

        let config = SimulationConfig::from_cli_args(args).unwrap();

        assert_eq!(config.days, 3);
        assert_eq!(config.timezone, "Europe/London");
        assert_eq!(config.outcome_weights.temp_override, 300);
        assert_eq!(config.outcome_weights.scheduled, 880);
        assert_eq!(config.seed, Some(54321));
        assert!(!config.include_cgm);
        assert_eq!(config.output_path.as_deref(), Some("events.json"));
        // Default values should remain for non-overridden fields
        assert_eq!(config.pump_profile, "medtronic");
    }

    #[test]
    fn test_validation_failures() {
        let config = SimulationConfig { start_time: "2021-13-01".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidStartTime { .. })));

        let config = SimulationConfig { timezone: "Atlantis/Central".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::UnknownTimezone(_))));

        let config = SimulationConfig { pump_profile: "animas".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::UnknownPumpProfile(_))));

        let config = SimulationConfig {
            outcome_weights: OutcomeWeights { scheduled: 0, temp_override: 0, suspend: 0 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigValidationError::ZeroOutcomeWeights)));

        let config = SimulationConfig { output_format: "csv".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidOutputFormat(_))));
    }

    #[test]
    fn test_output_format_parsing() {
        let config = SimulationConfig { output_format: "jsonl".to_string(), ..Default::default() };
        assert_eq!(config.get_output_format().unwrap(), OutputFormat::Jsonl);
    }

    #[test]
    fn test_simulation_config_serialization() {
        let config = SimulationConfig { seed: Some(9), ..Default::default() };
        let json = config.print_json().unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
