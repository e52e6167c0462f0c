//! Clock-stepped models usable as a [`Dut`].
//!
//! A [`Peripheral`] is a local state machine that sees the input vector once
//! per clock tick and produces the output vector. [`ModelDut`] wraps it with
//! a clock, a reset line and an enable line.
//!
//! # Available Models
//!
//! ## Synthetic sources
//! - [`SquareWave`] - Periodic pulse train with configurable phase
//! - [`Constant`] - Fixed output vector
//! - [`StepSignal`] - A bit that flips once at a known cycle
//!
//! ## Peripherals
//! - [`PwmPeripheral`] - SPI-controlled register file driving PWM outputs

pub mod pwm;
pub mod waveform;

pub use pwm::PwmPeripheral;
pub use waveform::{Constant, SquareWave, StepSignal};

use crate::dut::Dut;
use crate::signal::SignalVector;
use crate::types::{SimTime, Ticks};

/// A clock-synchronous model driven by a [`ModelDut`].
pub trait Peripheral {
    /// Returns the model to its power-on state.
    ///
    /// Called once on construction and on every tick the reset line is held.
    fn reset(&mut self) {}

    /// Called once per clock tick while out of reset and enabled.
    ///
    /// # Arguments
    /// * `cycle` - Ticks elapsed since the DUT was created, starting at 1
    /// * `inputs` - The input vector as last written before this tick
    ///
    /// # Returns
    /// The output vector after this tick
    fn on_tick(&mut self, cycle: u64, inputs: SignalVector) -> SignalVector;
}

/// A [`Dut`] backed by an in-process [`Peripheral`] model.
#[derive(Clone, Debug)]
pub struct ModelDut<P> {
    model: P,
    clock_period_ns: SimTime,
    time: SimTime,
    cycle: u64,
    inputs: SignalVector,
    outputs: SignalVector,
    in_reset: bool,
    enabled: bool,
}

impl<P: Peripheral> ModelDut<P> {
    /// Creates an enabled, out-of-reset DUT clocked every `clock_period_ns`.
    pub fn new(mut model: P, clock_period_ns: SimTime) -> Self {
        model.reset();
        Self {
            model,
            clock_period_ns,
            time: 0,
            cycle: 0,
            inputs: SignalVector::ZERO,
            outputs: SignalVector::ZERO,
            in_reset: false,
            enabled: true,
        }
    }

    pub fn model(&self) -> &P {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut P {
        &mut self.model
    }

    /// Ticks executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    pub fn clock_period_ns(&self) -> SimTime {
        self.clock_period_ns
    }

    /// The input vector as last written.
    pub fn input_vector(&self) -> SignalVector {
        self.inputs
    }

    fn step(&mut self) {
        self.time += self.clock_period_ns;
        self.cycle += 1;
        if self.in_reset {
            self.model.reset();
            self.outputs = SignalVector::ZERO;
        } else if self.enabled {
            self.outputs = self.model.on_tick(self.cycle, self.inputs);
        }
    }
}

impl<P: Peripheral> Dut for ModelDut<P> {
    fn advance_clock(&mut self, ticks: Ticks) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn set_input_vector(&mut self, bits: SignalVector) {
        self.inputs = bits;
    }

    fn get_output_vector(&self) -> SignalVector {
        self.outputs
    }

    fn current_time_ns(&self) -> SimTime {
        self.time
    }

    fn set_reset(&mut self, asserted: bool) {
        self.in_reset = asserted;
    }

    fn set_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
