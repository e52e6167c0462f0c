//! Statistics collection and export for harness sessions.
//!
//! Counters are kept by [`crate::harness::Harness`] and can be exported as
//! JSON, CSV or a human-readable summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::analyzer::{Measurement, Unavailable};
use crate::types::{SimTime, Ticks};

/// Aggregate counters for one harness session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessStats {
    /// Frames shifted into the DUT
    pub transactions: u64,
    /// Frames rejected by validation before driving
    pub rejected_frames: u64,
    /// DUT ticks spent inside transactions
    pub transaction_ticks: Ticks,
    /// DUT ticks spent idling between actions
    pub idle_ticks: Ticks,
    /// Edges found by waits
    pub edges_detected: u64,
    /// Waits that ran out of budget
    pub edge_timeouts: u64,
    /// Measurements that bounded a full period
    pub measurements_complete: u64,
    /// Measurements classified as stuck low
    pub stuck_low: u64,
    /// Measurements classified as stuck high
    pub stuck_high: u64,
    /// Measurements that saw a pulse but no closing edge
    pub open_periods: u64,
    /// Simulation time at the last update
    pub final_time_ns: SimTime,
}

impl HarnessStats {
    /// Creates an empty counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the outcome of one measurement.
    pub fn record_measurement(&mut self, measurement: &Measurement) {
        match measurement {
            Measurement::Complete(_) => self.measurements_complete += 1,
            Measurement::Unavailable(Unavailable::StuckLow(_)) => self.stuck_low += 1,
            Measurement::Unavailable(Unavailable::StuckHigh(_)) => self.stuck_high += 1,
            Measurement::Unavailable(Unavailable::OpenPeriod(_)) => self.open_periods += 1,
        }
    }

    /// Total measurements that did not close a period.
    pub fn measurements_unavailable(&self) -> u64 {
        self.stuck_low + self.stuck_high + self.open_periods
    }

    /// Exports statistics to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports statistics to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports statistics to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("metric,value\n");
        csv.push_str(&format!("transactions,{}\n", self.transactions));
        csv.push_str(&format!("rejected_frames,{}\n", self.rejected_frames));
        csv.push_str(&format!("transaction_ticks,{}\n", self.transaction_ticks));
        csv.push_str(&format!("idle_ticks,{}\n", self.idle_ticks));
        csv.push_str(&format!("edges_detected,{}\n", self.edges_detected));
        csv.push_str(&format!("edge_timeouts,{}\n", self.edge_timeouts));
        csv.push_str(&format!("measurements_complete,{}\n", self.measurements_complete));
        csv.push_str(&format!("stuck_low,{}\n", self.stuck_low));
        csv.push_str(&format!("stuck_high,{}\n", self.stuck_high));
        csv.push_str(&format!("open_periods,{}\n", self.open_periods));
        csv.push_str(&format!("final_time_ns,{}\n", self.final_time_ns));

        csv
    }

    /// Exports statistics to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        write!(w, "{}", self)
    }
}

impl fmt::Display for HarnessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Harness Statistics ===")?;
        writeln!(f)?;

        writeln!(f, "--- SPI ---")?;
        writeln!(f, "Transactions: {}", self.transactions)?;
        writeln!(f, "Rejected frames: {}", self.rejected_frames)?;
        writeln!(f, "Transaction ticks: {}", self.transaction_ticks)?;
        writeln!(f, "Idle ticks: {}", self.idle_ticks)?;
        writeln!(f)?;

        writeln!(f, "--- Analyzer ---")?;
        writeln!(f, "Edges detected: {}", self.edges_detected)?;
        writeln!(f, "Edge timeouts: {}", self.edge_timeouts)?;
        writeln!(
            f,
            "Measurements: {} complete, {} unavailable (low {}, high {}, open {})",
            self.measurements_complete,
            self.measurements_unavailable(),
            self.stuck_low,
            self.stuck_high,
            self.open_periods
        )?;
        writeln!(f)?;

        writeln!(f, "Final simulation time: {} ns", self.final_time_ns)
    }
}
