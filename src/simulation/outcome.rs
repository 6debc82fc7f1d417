//! Delivery outcome selection
//!
//! Each basal interval is delivered in exactly one way. The choice is made by a
//! single draw from an explicit weight table, so the branch policy can be
//! inspected, configured, and replaced in tests.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::simulation::{SimulationError, SimulationResult};

/// How one basal interval is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Delivered as scheduled
    Scheduled,
    /// Partly overridden by a temp basal
    TempOverride,
    /// Pump suspended for the interval
    Suspend,
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Scheduled => write!(f, "scheduled"),
            DeliveryOutcome::TempOverride => write!(f, "temp override"),
            DeliveryOutcome::Suspend => write!(f, "suspend"),
        }
    }
}

/// Order of the weight table; matches the fields of [`OutcomeWeights`]
const OUTCOMES: [DeliveryOutcome; 3] =
    [DeliveryOutcome::Scheduled, DeliveryOutcome::TempOverride, DeliveryOutcome::Suspend];

/// Relative weights of the three outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeWeights {
    /// Weight of plain scheduled delivery
    pub scheduled: u32,
    /// Weight of a temp basal override (1 in 10 by default)
    pub temp_override: u32,
    /// Weight of a pump suspension
    pub suspend: u32,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self { scheduled: 880, temp_override: 100, suspend: 20 }
    }
}

impl OutcomeWeights {
    /// Weights that always pick `outcome`
    pub fn always(outcome: DeliveryOutcome) -> Self {
        let mut weights = Self { scheduled: 0, temp_override: 0, suspend: 0 };
        match outcome {
            DeliveryOutcome::Scheduled => weights.scheduled = 1,
            DeliveryOutcome::TempOverride => weights.temp_override = 1,
            DeliveryOutcome::Suspend => weights.suspend = 1,
        }
        weights
    }

    /// Sum of all weights
    pub fn total(&self) -> u64 {
        self.scheduled as u64 + self.temp_override as u64 + self.suspend as u64
    }

    /// Probability of `outcome` under these weights
    pub fn probability(&self, outcome: DeliveryOutcome) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weight = match outcome {
            DeliveryOutcome::Scheduled => self.scheduled,
            DeliveryOutcome::TempOverride => self.temp_override,
            DeliveryOutcome::Suspend => self.suspend,
        };
        weight as f64 / total as f64
    }

    fn as_array(&self) -> [u32; 3] {
        [self.scheduled, self.temp_override, self.suspend]
    }
}

/// Chooses the delivery outcome for each basal interval
pub trait OutcomePolicy {
    /// Pick the outcome for the next interval
    fn choose<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DeliveryOutcome;
}

/// Weighted random choice between the three outcomes
#[derive(Debug, Clone)]
pub struct WeightedOutcomes {
    weights: OutcomeWeights,
    index: WeightedIndex<u32>,
}

impl WeightedOutcomes {
    /// Build the sampler; fails if every weight is zero
    pub fn new(weights: OutcomeWeights) -> SimulationResult<Self> {
        let index = WeightedIndex::new(weights.as_array()).map_err(|e| {
            SimulationError::configuration_error(format!("Invalid outcome weights {:?}: {}", weights, e))
        })?;
        Ok(Self { weights, index })
    }

    /// The weight table being sampled
    pub fn weights(&self) -> OutcomeWeights {
        self.weights
    }
}

impl OutcomePolicy for WeightedOutcomes {
    fn choose<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DeliveryOutcome {
        OUTCOMES[self.index.sample(rng)]
    }
}

/// Replays a fixed sequence of outcomes, then repeats a fallback.
///
/// Useful for reproducing a specific scenario without searching for a seed.
#[derive(Debug, Clone)]
pub struct ScriptedOutcomes {
    script: VecDeque<DeliveryOutcome>,
    fallback: DeliveryOutcome,
}

impl ScriptedOutcomes {
    /// Play `script` in order, then `Scheduled` forever
    pub fn new(script: impl IntoIterator<Item = DeliveryOutcome>) -> Self {
        Self { script: script.into_iter().collect(), fallback: DeliveryOutcome::Scheduled }
    }

    /// Change what is returned once the script runs out
    pub fn with_fallback(mut self, fallback: DeliveryOutcome) -> Self {
        self.fallback = fallback;
        self
    }
}

impl OutcomePolicy for ScriptedOutcomes {
    fn choose<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> DeliveryOutcome {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}
