//! Session wrapper tying a DUT to the driver and the analyzer.
//!
//! `Harness` owns the DUT for the duration of a scenario and keeps the
//! counters in [`HarnessStats`]. It adds the sequences every scenario
//! repeats: the reset handshake and sweeping output bits for activity.

use std::ops::Range;

use tracing::{debug, info};

use crate::analyzer::{EdgeAnalyzer, EdgeEvent, Measurement, Pulse};
use crate::config::HarnessConfig;
use crate::driver::SpiDriver;
use crate::dut::{Dut, TickCounter};
use crate::error::{HarnessError, HarnessResult};
use crate::frame::SpiFrame;
use crate::signal::{EdgeDirection, SignalVector, SpiLines};
use crate::stats::HarnessStats;
use crate::types::{BitIndex, Ticks};

/// A DUT plus the components that exercise it.
pub struct Harness<D: Dut> {
    dut: D,
    config: HarnessConfig,
    driver: SpiDriver,
    analyzer: EdgeAnalyzer,
    stats: HarnessStats,
}

impl<D: Dut> Harness<D> {
    /// Creates a harness, validating the configuration first.
    pub fn new(dut: D, config: HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        let timing = config.timing();
        timing.validate()?;
        Ok(Self {
            dut,
            driver: SpiDriver::new(timing),
            analyzer: EdgeAnalyzer::new(config.analyzer.timeout_ticks),
            config,
            stats: HarnessStats::new(),
        })
    }

    /// Creates a harness with the default configuration.
    pub fn with_defaults(dut: D) -> Self {
        let config = HarnessConfig::default();
        Self {
            dut,
            driver: SpiDriver::new(config.timing()),
            analyzer: EdgeAnalyzer::new(config.analyzer.timeout_ticks),
            config,
            stats: HarnessStats::new(),
        }
    }

    /// Enables the DUT, idles the bus and pulses reset.
    ///
    /// Reset is held for `reset_cycles` ticks, then released and followed by
    /// another `reset_cycles` ticks.
    pub fn reset(&mut self) {
        info!("Reset");
        let cycles = self.config.reset_cycles;
        self.dut.set_enable(true);
        self.dut.set_input_vector(SpiLines::IDLE.to_vector());
        self.dut.set_reset(true);
        self.dut.advance_clock(cycles);
        self.dut.set_reset(false);
        self.dut.advance_clock(cycles);
        self.sync_time();
    }

    /// Runs one SPI transaction from raw fields.
    pub fn transact(
        &mut self,
        read_write: bool,
        address: u32,
        data: u32,
    ) -> HarnessResult<SignalVector> {
        let frame = match SpiFrame::new(read_write, address, data) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.rejected_frames += 1;
                return Err(e);
            }
        };
        self.execute(&frame)
    }

    /// Writes one register.
    pub fn write_register(&mut self, address: u32, data: u32) -> HarnessResult<SignalVector> {
        self.transact(true, address, data)
    }

    /// Runs one SPI transaction from a validated frame.
    pub fn execute(&mut self, frame: &SpiFrame) -> HarnessResult<SignalVector> {
        let mut counter = TickCounter::new(&mut self.dut);
        let idle = self.driver.execute(&mut counter, frame)?;
        let ticks = counter.ticks();
        self.stats.transactions += 1;
        self.stats.transaction_ticks += ticks;
        self.sync_time();
        Ok(idle)
    }

    /// Lets the DUT run without driving anything.
    pub fn idle(&mut self, ticks: Ticks) {
        self.dut.advance_clock(ticks);
        self.stats.idle_ticks += ticks;
        self.sync_time();
    }

    /// Waits for an edge with the configured budget.
    pub fn wait_for_edge(
        &mut self,
        bit: BitIndex,
        direction: EdgeDirection,
    ) -> HarnessResult<EdgeEvent> {
        let result = self.analyzer.wait_for_edge(&mut self.dut, bit, direction);
        match &result {
            Ok(_) => self.stats.edges_detected += 1,
            Err(HarnessError::Timeout(_)) => self.stats.edge_timeouts += 1,
            Err(_) => {}
        }
        self.sync_time();
        result
    }

    /// Measures one period of `bit`.
    pub fn measure(&mut self, bit: BitIndex) -> HarnessResult<Measurement> {
        let measurement = self.analyzer.measure(&mut self.dut, bit)?;
        self.stats.record_measurement(&measurement);
        self.sync_time();
        Ok(measurement)
    }

    /// Measures the width of one high pulse of `bit`.
    pub fn measure_pulse(&mut self, bit: BitIndex) -> HarnessResult<Pulse> {
        let pulse = self.analyzer.measure_pulse(&mut self.dut, bit)?;
        self.sync_time();
        Ok(pulse)
    }

    /// Returns the first bit in `bits` whose output toggles, with its timing.
    ///
    /// Bits are tried in order; each unavailable measurement spends its
    /// timeout budget before moving on.
    pub fn find_active_output(
        &mut self,
        bits: Range<BitIndex>,
    ) -> HarnessResult<Option<Measurement>> {
        for bit in bits {
            let measurement = self.measure(bit)?;
            if measurement.is_complete() {
                return Ok(Some(measurement));
            }
            debug!("bit {}: no full period", bit);
        }
        Ok(None)
    }

    /// Measures each bit in turn, one after the other in simulated time.
    pub fn survey(&mut self, bits: Range<BitIndex>) -> HarnessResult<Vec<(BitIndex, Measurement)>> {
        bits.map(|bit| self.measure(bit).map(|m| (bit, m))).collect()
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    pub fn dut_mut(&mut self) -> &mut D {
        &mut self.dut
    }

    /// Consumes the harness and returns the DUT.
    pub fn into_dut(self) -> D {
        self.dut
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn driver(&self) -> &SpiDriver {
        &self.driver
    }

    pub fn analyzer(&self) -> &EdgeAnalyzer {
        &self.analyzer
    }

    pub fn stats(&self) -> &HarnessStats {
        &self.stats
    }

    fn sync_time(&mut self) {
        self.stats.final_time_ns = self.dut.current_time_ns();
    }
}

#[cfg(feature = "parallel")]
impl<D: Dut + Clone + Send + Sync> Harness<D> {
    /// Measures each bit on its own copy of the DUT, in parallel.
    ///
    /// Every copy starts from the current DUT state, so results match
    /// measuring each bit from the same instant. The harness's own DUT does
    /// not advance.
    pub fn survey_parallel(
        &mut self,
        bits: Range<BitIndex>,
    ) -> HarnessResult<Vec<(BitIndex, Measurement)>> {
        use rayon::prelude::*;

        let analyzer = self.analyzer;
        let dut = &self.dut;
        let results: HarnessResult<Vec<(BitIndex, Measurement)>> = bits
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|bit| {
                let mut copy = dut.clone();
                analyzer.measure(&mut copy, bit).map(|m| (bit, m))
            })
            .collect();

        let results = results?;
        for (_, m) in &results {
            self.stats.record_measurement(m);
        }
        Ok(results)
    }
}
