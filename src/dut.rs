//! The device-under-test interface consumed by the driver and the analyzer.
//!
//! The simulation engine behind a `Dut` is external to this crate: it owns
//! clock generation and signal storage. The harness only needs to write the
//! input vector, read the output vector and step time.

use crate::error::{HarnessError, HarnessResult};
use crate::signal::SignalVector;
use crate::types::{SimTime, Ticks};

/// A simulated peripheral driven one clock tick at a time.
///
/// # Visibility
///
/// Input writes issued before a call to `advance_clock` are observed by the
/// peripheral during that advance. An output read reflects the state after
/// the most recent completed tick; nothing written in the current tick is
/// visible until time moves forward.
///
/// # Implementation Notes
///
/// `advance_clock(n)` must move `current_time_ns` forward by `n` clock
/// periods. The driver and the analyzer detect a clock that fails to move
/// and report it instead of polling forever.
pub trait Dut {
    /// Advances simulated time by `ticks` clock cycles, synchronously.
    fn advance_clock(&mut self, ticks: Ticks);

    /// Writes the full input vector atomically.
    fn set_input_vector(&mut self, bits: SignalVector);

    /// Reads the full output vector as of now.
    fn get_output_vector(&self) -> SignalVector;

    /// Returns the monotonic simulation clock in nanoseconds.
    fn current_time_ns(&self) -> SimTime;

    /// Drives the reset line; `asserted = true` holds the peripheral in reset.
    fn set_reset(&mut self, _asserted: bool) {}

    /// Drives the enable line.
    fn set_enable(&mut self, _enabled: bool) {}
}

/// Advances one tick and returns the new time, failing if time did not move.
pub(crate) fn step_tick<D: Dut + ?Sized>(dut: &mut D) -> HarnessResult<SimTime> {
    let before = dut.current_time_ns();
    dut.advance_clock(1);
    let now = dut.current_time_ns();
    if now <= before {
        tracing::warn!("DUT clock did not advance past {} ns", before);
        return Err(HarnessError::ClockStalled { at_ns: now });
    }
    Ok(now)
}

impl<D: Dut + ?Sized> Dut for &mut D {
    fn advance_clock(&mut self, ticks: Ticks) {
        (**self).advance_clock(ticks)
    }

    fn set_input_vector(&mut self, bits: SignalVector) {
        (**self).set_input_vector(bits)
    }

    fn get_output_vector(&self) -> SignalVector {
        (**self).get_output_vector()
    }

    fn current_time_ns(&self) -> SimTime {
        (**self).current_time_ns()
    }

    fn set_reset(&mut self, asserted: bool) {
        (**self).set_reset(asserted)
    }

    fn set_enable(&mut self, enabled: bool) {
        (**self).set_enable(enabled)
    }
}

impl<D: Dut + ?Sized> Dut for Box<D> {
    fn advance_clock(&mut self, ticks: Ticks) {
        (**self).advance_clock(ticks)
    }

    fn set_input_vector(&mut self, bits: SignalVector) {
        (**self).set_input_vector(bits)
    }

    fn get_output_vector(&self) -> SignalVector {
        (**self).get_output_vector()
    }

    fn current_time_ns(&self) -> SimTime {
        (**self).current_time_ns()
    }

    fn set_reset(&mut self, asserted: bool) {
        (**self).set_reset(asserted)
    }

    fn set_enable(&mut self, enabled: bool) {
        (**self).set_enable(enabled)
    }
}

/// Borrows a DUT and counts the ticks advanced through it.
pub(crate) struct TickCounter<'a, D: Dut + ?Sized> {
    inner: &'a mut D,
    ticks: Ticks,
}

impl<'a, D: Dut + ?Sized> TickCounter<'a, D> {
    pub(crate) fn new(inner: &'a mut D) -> Self {
        Self { inner, ticks: 0 }
    }

    pub(crate) fn ticks(&self) -> Ticks {
        self.ticks
    }
}

impl<D: Dut + ?Sized> Dut for TickCounter<'_, D> {
    fn advance_clock(&mut self, ticks: Ticks) {
        self.ticks += ticks;
        self.inner.advance_clock(ticks);
    }

    fn set_input_vector(&mut self, bits: SignalVector) {
        self.inner.set_input_vector(bits)
    }

    fn get_output_vector(&self) -> SignalVector {
        self.inner.get_output_vector()
    }

    fn current_time_ns(&self) -> SimTime {
        self.inner.current_time_ns()
    }

    fn set_reset(&mut self, asserted: bool) {
        self.inner.set_reset(asserted)
    }

    fn set_enable(&mut self, enabled: bool) {
        self.inner.set_enable(enabled)
    }
}
