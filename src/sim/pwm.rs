//! Reference model of an SPI-controlled PWM peripheral.
//!
//! The model receives 16-bit frames on the input vector (see
//! [`crate::signal`] for the line layout), samples COPI on every SCLK rising
//! edge while nCS is low, and commits a write when nCS is released after
//! exactly 16 bits.
//!
//! # Register Map
//!
//! | Address | Register                                   |
//! |---------|--------------------------------------------|
//! | 0x00    | output enable, bits 7..0                   |
//! | 0x01    | output enable, bits 15..8 (stored only)    |
//! | 0x02    | PWM enable, bits 7..0                      |
//! | 0x03    | PWM enable, bits 15..8 (stored only)       |
//! | 0x04    | PWM duty cycle, `0xFF` = always high       |
//!
//! Output bit `i` is `out_en[i] & (pwm_en[i] ? pwm : 1)`. Read frames and
//! writes to other addresses are recorded but have no effect.

use crate::frame::{SpiFrame, FRAME_BITS};
use crate::signal::{SignalVector, SpiLines};
use crate::sim::Peripheral;

pub const REG_OUT_EN: u8 = 0x00;
pub const REG_OUT_EN_HI: u8 = 0x01;
pub const REG_PWM_EN: u8 = 0x02;
pub const REG_PWM_EN_HI: u8 = 0x03;
pub const REG_DUTY: u8 = 0x04;

/// DUT ticks per PWM counter step.
///
/// With an 8-bit counter the PWM period is `256 * 13 = 3328` ticks, about
/// 3 kHz on a 10 MHz clock.
pub const PWM_PRESCALE: u32 = 13;

const REGISTER_COUNT: usize = 5;

/// SPI register file plus PWM generator.
#[derive(Clone, Debug)]
pub struct PwmPeripheral {
    registers: [u8; REGISTER_COUNT],
    shift: u16,
    bit_count: u32,
    prev_sclk: bool,
    prev_ncs: bool,
    prescaler: u32,
    counter: u8,
    received: Vec<SpiFrame>,
    dropped_frames: u64,
}

impl PwmPeripheral {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            shift: 0,
            bit_count: 0,
            prev_sclk: false,
            prev_ncs: true,
            prescaler: 0,
            counter: 0,
            received: Vec::new(),
            dropped_frames: 0,
        }
    }

    /// Reads a register; unmapped addresses read as `None`.
    pub fn register(&self, address: u8) -> Option<u8> {
        self.registers.get(address as usize).copied()
    }

    /// Every complete frame received since the last reset.
    pub fn received(&self) -> &[SpiFrame] {
        &self.received
    }

    /// Selections released with a bit count other than 16.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Current PWM level before output masking.
    pub fn pwm_level(&self) -> bool {
        let duty = self.registers[REG_DUTY as usize];
        duty == 0xFF || self.counter < duty
    }

    fn commit(&mut self) {
        if self.bit_count != FRAME_BITS {
            self.dropped_frames += 1;
            return;
        }
        let frame = SpiFrame::from_word(self.shift);
        self.received.push(frame);
        if frame.is_write() {
            if let Some(reg) = self.registers.get_mut(frame.address() as usize) {
                *reg = frame.data();
            }
        }
    }

    fn clock_serial(&mut self, lines: SpiLines) {
        if lines.selected() && self.prev_ncs {
            self.shift = 0;
            self.bit_count = 0;
        }
        if lines.selected() && lines.sclk && !self.prev_sclk && self.bit_count < FRAME_BITS {
            self.shift = (self.shift << 1) | lines.copi as u16;
            self.bit_count += 1;
        }
        if !lines.selected() && !self.prev_ncs {
            self.commit();
        }
        self.prev_sclk = lines.sclk;
        self.prev_ncs = lines.ncs;
    }

    fn step_pwm(&mut self) {
        self.prescaler += 1;
        if self.prescaler == PWM_PRESCALE {
            self.prescaler = 0;
            self.counter = self.counter.wrapping_add(1);
        }
    }

    fn outputs(&self) -> SignalVector {
        let out_en = self.registers[REG_OUT_EN as usize];
        let pwm_en = self.registers[REG_PWM_EN as usize];
        let pwm_mask = if self.pwm_level() { 0xFF } else { !pwm_en };
        SignalVector::new(out_en & pwm_mask)
    }
}

impl Default for PwmPeripheral {
    fn default() -> Self {
        Self::new()
    }
}

impl Peripheral for PwmPeripheral {
    fn reset(&mut self) {
        *self = Self::new();
    }

    fn on_tick(&mut self, _cycle: u64, inputs: SignalVector) -> SignalVector {
        self.clock_serial(SpiLines::from_vector(inputs));
        self.step_pwm();
        self.outputs()
    }
}
