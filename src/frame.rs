//! SPI frames and their 16-bit wire encoding.
//!
//! A frame is serialized MSB first:
//!
//! ```text
//!  15 | 14 ........ 8 | 7 ........ 0
//! R/W |    address    |     data
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// Largest address representable in the 7-bit address field.
pub const MAX_ADDRESS: u32 = 0x7F;

/// Largest value representable in the 8-bit data field.
pub const MAX_DATA: u32 = 0xFF;

/// Number of bit cells in one frame.
pub const FRAME_BITS: u32 = 16;

/// A validated SPI request.
///
/// Deserialized frames go through the same range checks as [`SpiFrame::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpiFrame")]
pub struct SpiFrame {
    read_write: bool,
    address: u8,
    data: u8,
}

/// Unchecked wire form of [`SpiFrame`].
#[derive(Deserialize)]
struct RawSpiFrame {
    read_write: bool,
    address: u32,
    data: u32,
}

impl TryFrom<RawSpiFrame> for SpiFrame {
    type Error = HarnessError;

    fn try_from(raw: RawSpiFrame) -> HarnessResult<Self> {
        Self::new(raw.read_write, raw.address, raw.data)
    }
}

impl SpiFrame {
    /// Creates a frame, rejecting out-of-domain fields.
    ///
    /// # Arguments
    /// * `read_write` - `true` for a write
    /// * `address` - register address, 0..=127
    /// * `data` - payload, 0..=255
    pub fn new(read_write: bool, address: u32, data: u32) -> HarnessResult<Self> {
        if address > MAX_ADDRESS {
            return Err(HarnessError::Validation(format!(
                "address {} outside 7-bit range (0-{})",
                address, MAX_ADDRESS
            )));
        }
        if data > MAX_DATA {
            return Err(HarnessError::Validation(format!(
                "data {} outside 8-bit range (0-{})",
                data, MAX_DATA
            )));
        }
        Ok(Self {
            read_write,
            address: address as u8,
            data: data as u8,
        })
    }

    /// Creates a write frame.
    pub fn write(address: u32, data: u32) -> HarnessResult<Self> {
        Self::new(true, address, data)
    }

    /// Creates a read frame.
    pub fn read(address: u32, data: u32) -> HarnessResult<Self> {
        Self::new(false, address, data)
    }

    /// Decodes a received 16-bit word.
    pub fn from_word(word: u16) -> Self {
        Self {
            read_write: word & 0x8000 != 0,
            address: ((word >> 8) & 0x7F) as u8,
            data: (word & 0xFF) as u8,
        }
    }

    /// True for a write request.
    pub fn is_write(&self) -> bool {
        self.read_write
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn data(&self) -> u8 {
        self.data
    }

    /// The 16-bit word shifted onto the wire.
    pub fn word(&self) -> u16 {
        ((self.read_write as u16) << 15) | ((self.address as u16) << 8) | self.data as u16
    }

    /// The frame's bits in transmission order (MSB first).
    pub fn bits(&self) -> impl Iterator<Item = bool> {
        let word = self.word();
        (0..FRAME_BITS).rev().map(move |i| (word >> i) & 1 == 1)
    }
}

impl fmt::Display for SpiFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} addr=0x{:02X} data=0x{:02X}",
            if self.read_write { "write" } else { "read" },
            self.address,
            self.data
        )
    }
}
