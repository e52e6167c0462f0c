//! SPI transaction driver.
//!
//! The `SpiDriver` bit-bangs one frame onto the DUT's input vector using
//! clock polarity 0, phase 0: COPI is updated together with SCLK going low
//! and held for the whole bit cell, so it never changes while SCLK is high.
//!
//! There is no sleep primitive in simulated time. Every hold is a busy poll
//! that steps the DUT one tick at a time until enough simulated time passed.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dut::{step_tick, Dut};
use crate::error::{HarnessError, HarnessResult};
use crate::frame::SpiFrame;
use crate::signal::{SignalVector, SpiLines};
use crate::types::{SimTime, Ticks};

/// Timing parameters of one transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClockTiming")]
pub struct ClockTiming {
    /// Period of the DUT clock in nanoseconds
    pub clock_period_ns: SimTime,
    /// SCLK half period, in DUT clock ticks
    pub half_period_ticks: Ticks,
    /// Ticks to wait after deselect so the peripheral can act on the frame
    pub settle_ticks: Ticks,
}

#[derive(Deserialize)]
struct RawClockTiming {
    clock_period_ns: SimTime,
    half_period_ticks: Ticks,
    settle_ticks: Ticks,
}

impl TryFrom<RawClockTiming> for ClockTiming {
    type Error = HarnessError;

    fn try_from(raw: RawClockTiming) -> HarnessResult<Self> {
        Self::new(raw.clock_period_ns, raw.half_period_ticks, raw.settle_ticks)
    }
}

impl ClockTiming {
    /// Creates a timing description, rejecting zero periods.
    pub fn new(
        clock_period_ns: SimTime,
        half_period_ticks: Ticks,
        settle_ticks: Ticks,
    ) -> HarnessResult<Self> {
        let timing = Self {
            clock_period_ns,
            half_period_ticks,
            settle_ticks,
        };
        timing.validate()?;
        Ok(timing)
    }

    /// Checks that both periods are non-zero.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.clock_period_ns == 0 {
            return Err(HarnessError::Validation(
                "clock period must be non-zero".to_string(),
            ));
        }
        if self.half_period_ticks == 0 {
            return Err(HarnessError::Validation(
                "SCLK half period must be at least one tick".to_string(),
            ));
        }
        Ok(())
    }

    /// SCLK half period in simulated nanoseconds.
    pub fn half_period_ns(&self) -> SimTime {
        self.half_period_ticks * self.clock_period_ns
    }

    /// Ticks one transaction takes on a DUT clocked at `clock_period_ns`.
    pub fn transaction_ticks(&self) -> Ticks {
        1 + 2 * u64::from(crate::frame::FRAME_BITS) * self.half_period_ticks + self.settle_ticks
    }
}

impl Default for ClockTiming {
    /// 100 ns DUT clock, SCLK at 1/100th of it, 600 tick settle.
    fn default() -> Self {
        Self {
            clock_period_ns: 100,
            half_period_ticks: 50,
            settle_ticks: 600,
        }
    }
}

/// Drives SPI frames into a DUT.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpiDriver {
    timing: ClockTiming,
}

impl SpiDriver {
    /// Creates a driver for the given timing.
    pub fn new(timing: ClockTiming) -> Self {
        Self { timing }
    }

    /// Returns the timing this driver was built with.
    pub fn timing(&self) -> &ClockTiming {
        &self.timing
    }

    /// Validates raw fields and runs the transaction.
    ///
    /// Out-of-range values fail before the DUT is touched.
    pub fn send<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        read_write: bool,
        address: u32,
        data: u32,
    ) -> HarnessResult<SignalVector> {
        let frame = SpiFrame::new(read_write, address, data)?;
        self.execute(dut, &frame)
    }

    /// Shifts one frame into the DUT and returns the final idle vector.
    ///
    /// Zero periods fail with `Validation` before the DUT is touched.
    pub fn execute<D: Dut + ?Sized>(
        &self,
        dut: &mut D,
        frame: &SpiFrame,
    ) -> HarnessResult<SignalVector> {
        self.timing.validate()?;
        let start = dut.current_time_ns();
        debug!("SPI {} (word 0x{:04X}) at {} ns", frame, frame.word(), start);

        // Select
        dut.set_input_vector(SpiLines::new(false, false, false).to_vector());
        step_tick(dut)?;

        for (i, bit) in frame.bits().enumerate() {
            trace!("bit cell {}: copi={}", i, bit as u8);
            dut.set_input_vector(SpiLines::new(false, bit, false).to_vector());
            self.hold_half_period(dut)?;
            dut.set_input_vector(SpiLines::new(false, bit, true).to_vector());
            self.hold_half_period(dut)?;
        }

        // Deselect and let the peripheral latch the frame
        let idle = SpiLines::IDLE.to_vector();
        dut.set_input_vector(idle);
        dut.advance_clock(self.timing.settle_ticks);

        debug!(
            "SPI {} done after {} ns",
            frame,
            dut.current_time_ns().saturating_sub(start)
        );
        Ok(idle)
    }

    /// Steps the DUT until one SCLK half period of simulated time elapsed.
    fn hold_half_period<D: Dut + ?Sized>(&self, dut: &mut D) -> HarnessResult<()> {
        let start = dut.current_time_ns();
        let target = self.timing.half_period_ns();
        loop {
            let now = step_tick(dut)?;
            if now - start >= target {
                return Ok(());
            }
        }
    }
}
