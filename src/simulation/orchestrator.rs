//! Main simulation orchestrator
//!
//! This module contains the SimulationOrchestrator, which turns a validated
//! configuration into one complete event stream for a single virtual device.

use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument};

use crate::cgm::CgmPipeline;
use crate::events::{CommonFieldsStamper, Event};
use crate::settings::PumpSettings;
use crate::simulation::time_manager::parse_local_time;
use crate::simulation::{
    BasalGenerator, GenerationStatistics, SimulationResult, SuspensionInterval, TimeManager,
    WeightedOutcomes,
};
use crate::types::{OutputFormat, SimulationConfig};
use crate::{stage_event, stage_span};

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    /// All events in time order
    pub events: Vec<Event>,
    /// Pump suspension windows in time order
    pub suspensions: Vec<SuspensionInterval>,
    /// Pump settings the basal stream was generated from
    pub settings: PumpSettings,
    /// Counts over the run
    pub statistics: GenerationStatistics,
}

impl SimulationOutput {
    /// Serialize the events to `writer` in `format`
    pub fn write_events<W: Write>(&self, format: OutputFormat, mut writer: W) -> SimulationResult<()> {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &self.events)?;
                writeln!(writer)?;
            }
            OutputFormat::Jsonl => {
                for event in &self.events {
                    serde_json::to_writer(&mut writer, event)?;
                    writeln!(writer)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Main simulation orchestrator that coordinates all components
#[derive(Debug)]
pub struct SimulationOrchestrator {
    /// Configuration for the run
    config: SimulationConfig,
    /// Device timezone
    time_manager: TimeManager,
    /// Pump settings for the configured profile
    settings: PumpSettings,
    /// Delivery outcome sampler
    policy: WeightedOutcomes,
    /// Random number generator with optional seed
    rng: StdRng,
}

impl SimulationOrchestrator {
    /// Create a new simulation orchestrator.
    ///
    /// Resolves the timezone, pump profile and outcome weights up front so a
    /// bad configuration fails before any event is generated.
    #[instrument(skip(config), fields(days = config.days, timezone = %config.timezone))]
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        let time_manager = TimeManager::from_name(&config.timezone)?;
        let settings = PumpSettings::for_profile_name(&config.pump_profile)?;
        let policy = WeightedOutcomes::new(config.outcome_weights)?;

        let rng = if let Some(seed) = config.seed {
            info!("Using deterministic seed: {}", seed);
            StdRng::seed_from_u64(seed)
        } else {
            debug!("Using entropy-based random seed");
            StdRng::from_entropy()
        };

        info!(
            "Initialized orchestrator for a {} {} pump in {}",
            settings.manufacturer, settings.model, config.timezone
        );

        Ok(Self { config, time_manager, settings, policy, rng })
    }

    /// The configuration this orchestrator runs
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generate basal delivery and, if enabled, CGM readings
    pub fn run(&mut self) -> SimulationResult<SimulationOutput> {
        let _span = stage_span!("run", days = self.config.days).entered();

        let start = parse_local_time(&self.config.start_time)?;
        let stamper = CommonFieldsStamper::new(self.time_manager);

        let mut generator =
            BasalGenerator::new(self.settings.clone(), stamper.clone(), self.policy.clone());
        let basal = generator.generate(start, self.config.days, &mut self.rng)?;

        let mut events = basal.events;
        if self.config.include_cgm {
            let cgm_start = self.time_manager.to_utc(start)?;
            let cgm = CgmPipeline::new(stamper, self.config.cgm_gaps).generate(
                cgm_start,
                self.config.days,
                &mut self.rng,
            )?;
            events.extend(cgm);
            // stable, so same-instant events keep their emission order
            events.sort_by_key(Event::time);
        }

        let statistics = GenerationStatistics::collect(self.config.days, &events, &basal.suspensions);

        stage_event!(
            info,
            "run",
            "Generation run complete",
            total_events = statistics.total_events,
            basal_events = statistics.basal_events(),
            cbg_readings = statistics.cbg_readings,
        );

        Ok(SimulationOutput {
            events,
            suspensions: basal.suspensions,
            settings: self.settings.clone(),
            statistics,
        })
    }
}
