//! Statistics collection and reporting
//!
//! This module tallies what a generation run produced.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::{DeviceEvent, Event};
use crate::simulation::SuspensionInterval;
use crate::types::{DeliveryType, StatusKind};

/// Counts gathered over one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStatistics {
    /// Total number of events
    pub total_events: usize,

    // Basal breakdown
    /// Scheduled basal intervals
    pub scheduled_basals: usize,
    /// Temp basal overrides
    pub temp_basals: usize,
    /// Suspended basal intervals
    pub suspend_basals: usize,
    /// Milliseconds of basal delivery covered by all basal intervals
    pub basal_ms: i64,

    // Device events
    /// Suspend status events
    pub suspend_events: usize,
    /// Resume status events
    pub resume_events: usize,
    /// Low glucose alarms
    pub alarm_events: usize,

    // CGM
    /// CGM readings
    pub cbg_readings: usize,
    /// CGM readings clamped and annotated as out of range
    pub out_of_range_readings: usize,
    /// CGM readings taken while the pump was suspended
    pub readings_during_suspension: usize,

    /// Total time the pump spent suspended, in milliseconds
    pub suspended_ms: i64,
    /// Number of days simulated
    pub days_simulated: i64,
}

impl GenerationStatistics {
    /// Empty statistics for a run of `days_simulated` days
    pub fn new(days_simulated: i64) -> Self {
        Self { days_simulated, ..Default::default() }
    }

    /// Tally every event and suspension of a run
    pub fn collect(days_simulated: i64, events: &[Event], suspensions: &[SuspensionInterval]) -> Self {
        let mut stats = Self::new(days_simulated);
        for event in events {
            stats.record(event);
            if event.as_cbg().is_some() && suspensions.iter().any(|s| s.contains(event.time())) {
                stats.readings_during_suspension += 1;
            }
        }
        stats.suspended_ms =
            suspensions.iter().map(|s| s.duration()).fold(Duration::zero(), |acc, d| acc + d).num_milliseconds();
        stats
    }

    /// Count a single event
    pub fn record(&mut self, event: &Event) {
        self.total_events += 1;
        match event {
            Event::Basal(basal) => {
                match basal.delivery_type {
                    DeliveryType::Scheduled => self.scheduled_basals += 1,
                    DeliveryType::Temp => self.temp_basals += 1,
                    DeliveryType::Suspend => self.suspend_basals += 1,
                }
                self.basal_ms += basal.duration;
            }
            Event::DeviceEvent(device) => self.record_device_event(device),
            Event::Cbg(cbg) => {
                self.cbg_readings += 1;
                if !cbg.annotations.is_empty() {
                    self.out_of_range_readings += 1;
                }
            }
        }
    }

    fn record_device_event(&mut self, event: &DeviceEvent) {
        match event.status() {
            Some(StatusKind::Suspend) => self.suspend_events += 1,
            Some(StatusKind::Resume) => self.resume_events += 1,
            None if event.is_alarm() => self.alarm_events += 1,
            None => {}
        }
    }

    /// Basal intervals of any delivery type
    pub fn basal_events(&self) -> usize {
        self.scheduled_basals + self.temp_basals + self.suspend_basals
    }

    /// Share of basal intervals that were temp overrides
    pub fn temp_percentage(&self) -> f64 {
        percentage(self.temp_basals, self.basal_events())
    }

    /// Share of basal intervals that were suspensions
    pub fn suspend_percentage(&self) -> f64 {
        percentage(self.suspend_basals, self.basal_events())
    }

    /// Multi-line human readable summary
    pub fn generate_summary_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Generation Summary ===\n");
        report.push_str(&format!("Days simulated: {}\n", self.days_simulated));
        report.push_str(&format!("Total events: {}\n", self.total_events));
        report.push_str(&format!(
            "Basal intervals: {} (scheduled {}, temp {} / {:.1}%, suspend {} / {:.1}%)\n",
            self.basal_events(),
            self.scheduled_basals,
            self.temp_basals,
            self.temp_percentage(),
            self.suspend_basals,
            self.suspend_percentage()
        ));
        report.push_str(&format!(
            "Status events: {} suspended, {} resumed\n",
            self.suspend_events, self.resume_events
        ));
        report.push_str(&format!(
            "Time suspended: {:.1} h\n",
            self.suspended_ms as f64 / 3_600_000.0
        ));
        if self.cbg_readings > 0 {
            report.push_str(&format!(
                "CGM readings: {} ({} out of range, {} low alarms, {} during suspension)\n",
                self.cbg_readings,
                self.out_of_range_readings,
                self.alarm_events,
                self.readings_during_suspension
            ));
        }
        report
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for GenerationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}
