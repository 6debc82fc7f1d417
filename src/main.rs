// Pump Data Faker - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/pump-data-faker --days 3 --seed 42 > events.json
// ```
//
// Or with a configuration file:
//
// ```console
// $ ./target/release/pump-data-faker --config config.json --output events.jsonl --verbose
// ```

use anyhow::{Context, Result};
use clap::Parser;
use pump_data_faker::simulation::{
    LoggingConfig, LoggingError, LoggingGuard, SimulationOrchestrator, SimulationOutput,
};
use pump_data_faker::types::config::CliArgs;
use pump_data_faker::types::SimulationConfig;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process;
use std::time::Instant;
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        match print_config(args) {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to print configuration: {:#}", e);
                process::exit(1);
            }
        }
    }

    let _logging = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        error!("Generation failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Initialize logging based on CLI flags
fn init_logging(args: &CliArgs) -> Result<LoggingGuard, LoggingError> {
    LoggingConfig::from_cli_args(args).init()
}

/// Configuration as it would be used, with any file and CLI overrides applied
fn print_config(args: CliArgs) -> Result<String> {
    let config = SimulationConfig::from_cli_args(args).context("Failed to load configuration")?;
    config.print_json().context("Failed to serialize configuration")
}

fn run(args: CliArgs) -> Result<()> {
    info!("Starting Pump Data Faker");

    let dry_run = args.dry_run;
    let config = SimulationConfig::from_cli_args(args).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    info!("Configuration loaded and validated successfully");

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - no events will be generated.");
        print_configuration_summary(&config);
        return Ok(());
    }

    print_configuration_summary(&config);

    let started = Instant::now();
    let mut orchestrator =
        SimulationOrchestrator::new(config.clone()).context("Failed to initialize generator")?;
    let output = orchestrator.run().context("Event generation failed")?;

    write_output(&config, &output)?;

    eprintln!("{}", output.statistics);
    eprintln!("Completed in {:.2} seconds", started.elapsed().as_secs_f64());
    info!("Pump Data Faker completed successfully");
    Ok(())
}

/// Write events to the configured file, or stdout
fn write_output(config: &SimulationConfig, output: &SimulationOutput) -> Result<()> {
    let format = config
        .get_output_format()
        .map_err(anyhow::Error::msg)
        .context("Invalid output format")?;

    match &config.output_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path))?;
            output
                .write_events(format, BufWriter::new(file))
                .with_context(|| format!("Failed to write events to '{}'", path))?;
            info!("Wrote {} events to {}", output.events.len(), path);
        }
        None => {
            let stdout = io::stdout();
            output
                .write_events(format, BufWriter::new(stdout.lock()))
                .context("Failed to write events to stdout")?;
        }
    }

    Ok(())
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Pump Data Faker");
    eprintln!("===============");
    eprintln!("  Start time:   {} ({})", config.start_time, config.timezone);
    eprintln!("  Days:         {}", config.days);
    eprintln!("  Pump profile: {}", config.pump_profile);
    eprintln!(
        "  Outcomes:     scheduled {} / temp {} / suspend {}",
        config.outcome_weights.scheduled,
        config.outcome_weights.temp_override,
        config.outcome_weights.suspend
    );
    eprintln!(
        "  CGM:          {}",
        if config.include_cgm {
            format!("enabled, {} sensor gaps", config.cgm_gaps)
        } else {
            "disabled".to_string()
        }
    );
    match config.seed {
        Some(seed) => eprintln!("  Seed:         {}", seed),
        None => eprintln!("  Seed:         random"),
    }
    eprintln!(
        "  Output:       {} -> {}",
        config.output_format,
        config.output_path.as_deref().unwrap_or("stdout")
    );
    eprintln!();
}
