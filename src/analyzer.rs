//! Edge detection and timing measurement on a single output bit.
//!
//! The analyzer samples the DUT's output vector once per clock tick. An edge
//! is reported at the first tick on which the bit reads at the target level,
//! so timestamps carry at most one tick of quantization, and the same offset
//! applies to every edge of a measurement.
//!
//! Degenerate waveforms are part of the contract rather than failures: a bit
//! that never rises reads as 0% duty, one that never falls as 100% duty.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dut::{step_tick, Dut};
use crate::error::{EdgeTimeout, HarnessError, HarnessResult};
use crate::signal::{EdgeDirection, SignalVector};
use crate::types::{BitIndex, SimTime, Ticks};

/// A detected transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEvent {
    /// Simulation time of the first tick at the new level
    pub time_ns: SimTime,
    pub direction: EdgeDirection,
}

/// Period and duty cycle derived from one full period of a bit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingMeasurement {
    /// The observed output bit
    pub bit: BitIndex,
    /// Time of the rising edge that opens the period
    pub rising_ns: SimTime,
    /// Time of the falling edge inside the period
    pub falling_ns: SimTime,
    /// Time of the rising edge that closes the period
    pub next_rising_ns: SimTime,
    pub period_ns: SimTime,
    pub high_time_ns: SimTime,
    pub frequency_hz: f64,
    /// High time over period, in `[0, 1]`
    pub duty_cycle: f64,
}

impl TimingMeasurement {
    fn from_edges(bit: BitIndex, rising: EdgeEvent, falling: EdgeEvent, next: EdgeEvent) -> Self {
        let period_ns = next.time_ns - rising.time_ns;
        let high_time_ns = falling.time_ns - rising.time_ns;
        Self {
            bit,
            rising_ns: rising.time_ns,
            falling_ns: falling.time_ns,
            next_rising_ns: next.time_ns,
            period_ns,
            high_time_ns,
            frequency_hz: 1e9 / period_ns as f64,
            duty_cycle: high_time_ns as f64 / period_ns as f64,
        }
    }

    /// Duty cycle as a percentage.
    pub fn duty_percent(&self) -> f64 {
        self.duty_cycle * 100.0
    }
}

/// Why a measurement could not close a full period.
///
/// The variant records which wait ran out, which is what separates the
/// 0% and 100% duty-cycle cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "timeout", rename_all = "snake_case")]
pub enum Unavailable {
    /// A rising wait timed out: the bit stays low (0% duty).
    StuckLow(EdgeTimeout),
    /// A falling wait timed out: the bit stays high (100% duty).
    StuckHigh(EdgeTimeout),
    /// One pulse was seen but the closing rising edge never came.
    OpenPeriod(EdgeTimeout),
}

impl Unavailable {
    /// The duty cycle implied by the stuck level, if any.
    pub fn duty_cycle(&self) -> Option<f64> {
        match self {
            Unavailable::StuckLow(_) => Some(0.0),
            Unavailable::StuckHigh(_) => Some(1.0),
            Unavailable::OpenPeriod(_) => None,
        }
    }

    /// The wait that ran out.
    pub fn timeout(&self) -> &EdgeTimeout {
        match self {
            Unavailable::StuckLow(t) | Unavailable::StuckHigh(t) | Unavailable::OpenPeriod(t) => t,
        }
    }
}

/// Outcome of [`EdgeAnalyzer::measure`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Complete(TimingMeasurement),
    Unavailable(Unavailable),
}

impl Measurement {
    /// True if a full period was bounded.
    pub fn is_complete(&self) -> bool {
        matches!(self, Measurement::Complete(_))
    }

    pub fn timing(&self) -> Option<&TimingMeasurement> {
        match self {
            Measurement::Complete(m) => Some(m),
            Measurement::Unavailable(_) => None,
        }
    }

    pub fn frequency_hz(&self) -> Option<f64> {
        self.timing().map(|m| m.frequency_hz)
    }

    /// Measured duty cycle, or the one implied by a stuck level.
    pub fn duty_cycle(&self) -> Option<f64> {
        match self {
            Measurement::Complete(m) => Some(m.duty_cycle),
            Measurement::Unavailable(u) => u.duty_cycle(),
        }
    }
}

/// Outcome of [`EdgeAnalyzer::measure_pulse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pulse {
    /// Time from rising to falling edge
    Width(SimTime),
    Unavailable(Unavailable),
}

/// Stops an edge sequence early.
enum Interrupted {
    Unavailable(Unavailable),
    Fault(HarnessError),
}

/// Polls a DUT output bit for edges under a tick budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeAnalyzer {
    timeout_ticks: Ticks,
}

impl EdgeAnalyzer {
    /// Creates an analyzer whose waits give up after `timeout_ticks` polls.
    ///
    /// The budget must span at least one full expected period, otherwise a
    /// slow but healthy signal is reported as stuck.
    pub fn new(timeout_ticks: Ticks) -> Self {
        Self { timeout_ticks }
    }

    /// Returns a copy with a different budget.
    pub fn with_timeout(self, timeout_ticks: Ticks) -> Self {
        Self { timeout_ticks }
    }

    pub fn timeout_ticks(&self) -> Ticks {
        self.timeout_ticks
    }

    /// Reads one output bit without advancing time.
    pub fn level<D: Dut + ?Sized>(&self, dut: &D, bit: BitIndex) -> HarnessResult<bool> {
        SignalVector::check_index(bit)?;
        Ok(dut.get_output_vector().bit(bit))
    }

    /// Waits for `bit` to reach the level of `direction`.
    ///
    /// Each poll advances the DUT by exactly one tick before reading. With a
    /// zero budget there is no poll and the wait times out immediately.
    pub fn wait_for_edge<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        bit: BitIndex,
        direction: EdgeDirection,
    ) -> HarnessResult<EdgeEvent> {
        SignalVector::check_index(bit)?;
        let target = direction.target_level();
        let started_ns = dut.current_time_ns();

        for _ in 0..self.timeout_ticks {
            let now = step_tick(dut)?;
            if dut.get_output_vector().bit(bit) == target {
                trace!("{} edge on bit {} at {} ns", direction, bit, now);
                return Ok(EdgeEvent {
                    time_ns: now,
                    direction,
                });
            }
        }

        Err(HarnessError::Timeout(EdgeTimeout {
            bit,
            direction,
            budget_ticks: self.timeout_ticks,
            started_ns,
            expired_ns: dut.current_time_ns(),
        }))
    }

    /// Measures period and duty cycle over one full period of `bit`.
    ///
    /// Rising, falling and rising edges are awaited in turn. If the bit is
    /// already high when the call starts, the first rising wait lands in the
    /// middle of a pulse; that pulse only synchronizes to the waveform and
    /// timing starts from the next rising edge.
    pub fn measure<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        bit: BitIndex,
    ) -> HarnessResult<Measurement> {
        match self.bound_period(dut, bit) {
            Ok(m) => {
                debug!(
                    "bit {}: period {} ns, {:.2} Hz, duty {:.1}%",
                    bit,
                    m.period_ns,
                    m.frequency_hz,
                    m.duty_percent()
                );
                Ok(Measurement::Complete(m))
            }
            Err(Interrupted::Unavailable(u)) => {
                debug!("bit {}: measurement unavailable ({:?})", bit, u);
                Ok(Measurement::Unavailable(u))
            }
            Err(Interrupted::Fault(e)) => Err(e),
        }
    }

    /// Measures the width of one high pulse of `bit`.
    pub fn measure_pulse<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        bit: BitIndex,
    ) -> HarnessResult<Pulse> {
        match self.bound_pulse(dut, bit) {
            Ok((rising, falling)) => Ok(Pulse::Width(falling.time_ns - rising.time_ns)),
            Err(Interrupted::Unavailable(u)) => Ok(Pulse::Unavailable(u)),
            Err(Interrupted::Fault(e)) => Err(e),
        }
    }

    fn bound_period<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        bit: BitIndex,
    ) -> Result<TimingMeasurement, Interrupted> {
        let (rising, falling) = self.bound_pulse(dut, bit)?;
        let next = self.expect_edge(dut, bit, EdgeDirection::Rising, Unavailable::OpenPeriod)?;
        Ok(TimingMeasurement::from_edges(bit, rising, falling, next))
    }

    /// Finds a rising edge and the falling edge that follows it.
    fn bound_pulse<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        bit: BitIndex,
    ) -> Result<(EdgeEvent, EdgeEvent), Interrupted> {
        let started_high = self.level(dut, bit).map_err(Interrupted::Fault)?;

        let mut rising = self.expect_edge(dut, bit, EdgeDirection::Rising, Unavailable::StuckLow)?;
        let mut falling =
            self.expect_edge(dut, bit, EdgeDirection::Falling, Unavailable::StuckHigh)?;

        if started_high {
            rising = self.expect_edge(dut, bit, EdgeDirection::Rising, Unavailable::StuckLow)?;
            falling = self.expect_edge(dut, bit, EdgeDirection::Falling, Unavailable::StuckHigh)?;
        }

        Ok((rising, falling))
    }

    fn expect_edge<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        bit: BitIndex,
        direction: EdgeDirection,
        on_timeout: fn(EdgeTimeout) -> Unavailable,
    ) -> Result<EdgeEvent, Interrupted> {
        self.wait_for_edge(dut, bit, direction).map_err(|e| match e {
            HarnessError::Timeout(t) => Interrupted::Unavailable(on_timeout(t)),
            other => Interrupted::Fault(other),
        })
    }
}

impl Default for EdgeAnalyzer {
    fn default() -> Self {
        Self::new(10_000)
    }
}
