//! Synthetic signal sources.
//!
//! These models ignore their inputs and produce predictable waveforms on a
//! single output bit, useful for checking the analyzer against known timing.

use crate::signal::SignalVector;
use crate::sim::Peripheral;
use crate::types::{BitIndex, Ticks};

/// A periodic pulse train on one output bit.
///
/// At cycle `c` the bit is high when `(c + phase) % period < high`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SquareWave {
    /// Full period in ticks
    period_ticks: Ticks,
    /// High time in ticks
    high_ticks: Ticks,
    /// Offset added to the cycle count
    phase_ticks: Ticks,
    /// Output bit carrying the wave
    bit: BitIndex,
}

impl SquareWave {
    /// Creates a wave on bit 0 with zero phase.
    ///
    /// `high_ticks` is clamped to `period_ticks`; a zero period is treated
    /// as one tick.
    pub fn new(period_ticks: Ticks, high_ticks: Ticks) -> Self {
        let period_ticks = period_ticks.max(1);
        Self {
            period_ticks,
            high_ticks: high_ticks.min(period_ticks),
            phase_ticks: 0,
            bit: 0,
        }
    }

    /// A 50% wave.
    pub fn symmetric(period_ticks: Ticks) -> Self {
        Self::new(period_ticks, period_ticks / 2)
    }

    pub fn with_phase(mut self, phase_ticks: Ticks) -> Self {
        self.phase_ticks = phase_ticks;
        self
    }

    pub fn on_bit(mut self, bit: BitIndex) -> Self {
        self.bit = bit;
        self
    }

    pub fn period_ticks(&self) -> Ticks {
        self.period_ticks
    }

    pub fn high_ticks(&self) -> Ticks {
        self.high_ticks
    }

    pub fn phase_ticks(&self) -> Ticks {
        self.phase_ticks
    }

    pub fn bit(&self) -> BitIndex {
        self.bit
    }

    /// Level at the given cycle.
    pub fn level_at(&self, cycle: u64) -> bool {
        (cycle + self.phase_ticks) % self.period_ticks < self.high_ticks
    }
}

impl Peripheral for SquareWave {
    fn on_tick(&mut self, cycle: u64, _inputs: SignalVector) -> SignalVector {
        SignalVector::ZERO.with_bit(self.bit, self.level_at(cycle))
    }
}

/// A fixed output vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Constant(pub SignalVector);

impl Constant {
    pub fn high() -> Self {
        Self(SignalVector::new(0xFF))
    }

    pub fn low() -> Self {
        Self(SignalVector::ZERO)
    }
}

impl Peripheral for Constant {
    fn on_tick(&mut self, _cycle: u64, _inputs: SignalVector) -> SignalVector {
        self.0
    }
}

/// A bit that holds `initial` and flips once `cycle >= flip_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepSignal {
    pub bit: BitIndex,
    pub initial: bool,
    pub flip_at: u64,
}

impl StepSignal {
    /// A bit that rises at `flip_at`.
    pub fn rising_at(bit: BitIndex, flip_at: u64) -> Self {
        Self {
            bit,
            initial: false,
            flip_at,
        }
    }

    /// A bit that falls at `flip_at`.
    pub fn falling_at(bit: BitIndex, flip_at: u64) -> Self {
        Self {
            bit,
            initial: true,
            flip_at,
        }
    }
}

impl Peripheral for StepSignal {
    fn on_tick(&mut self, cycle: u64, _inputs: SignalVector) -> SignalVector {
        let level = if cycle >= self.flip_at {
            !self.initial
        } else {
            self.initial
        };
        SignalVector::ZERO.with_bit(self.bit, level)
    }
}
