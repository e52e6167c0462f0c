//! Signal vectors and the SPI line layout multiplexed onto them.
//!
//! A DUT exposes its pins as fixed-width bit fields. On the input side only
//! three positions carry meaning for the SPI interface; every other bit is
//! held at zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::types::BitIndex;

/// A fixed-width, 8-bit signal vector.
///
/// Displayed MSB first, one character per line (`00000100`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalVector(u8);

impl SignalVector {
    /// Number of lines in the vector.
    pub const WIDTH: BitIndex = 8;

    /// All lines low.
    pub const ZERO: SignalVector = SignalVector(0);

    /// Creates a vector from its raw bits.
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns the level of a single line.
    ///
    /// Indices at or above [`Self::WIDTH`] read as low.
    pub fn bit(self, index: BitIndex) -> bool {
        index < Self::WIDTH && (self.0 >> index) & 1 == 1
    }

    /// Returns a copy with one line driven to `level`.
    pub fn with_bit(self, index: BitIndex, level: bool) -> Self {
        if index >= Self::WIDTH {
            return self;
        }
        let mask = 1u8 << index;
        if level {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }

    /// Checks that `index` addresses a line of the vector.
    pub fn check_index(index: BitIndex) -> HarnessResult<()> {
        if index >= Self::WIDTH {
            return Err(HarnessError::Validation(format!(
                "bit index {} outside signal vector of width {}",
                index,
                Self::WIDTH
            )));
        }
        Ok(())
    }
}

impl From<u8> for SignalVector {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<SignalVector> for u8 {
    fn from(v: SignalVector) -> Self {
        v.0
    }
}

impl fmt::Display for SignalVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

impl fmt::Binary for SignalVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

/// Direction of a transition on an observed bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// 0 -> 1
    Rising,
    /// 1 -> 0
    Falling,
}

impl EdgeDirection {
    /// The level the bit must reach for this edge to count as seen.
    pub fn target_level(self) -> bool {
        matches!(self, EdgeDirection::Rising)
    }

    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            EdgeDirection::Rising => EdgeDirection::Falling,
            EdgeDirection::Falling => EdgeDirection::Rising,
        }
    }
}

impl fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeDirection::Rising => write!(f, "rising"),
            EdgeDirection::Falling => write!(f, "falling"),
        }
    }
}

/// Position of SCLK in the input vector.
pub const SCLK_BIT: BitIndex = 0;
/// Position of COPI (controller out, peripheral in) in the input vector.
pub const COPI_BIT: BitIndex = 1;
/// Position of the active-low chip select in the input vector.
pub const NCS_BIT: BitIndex = 2;

/// The three SPI lines carried by the input vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiLines {
    /// Chip select, active low
    pub ncs: bool,
    /// Data presented to the peripheral
    pub copi: bool,
    /// Serial clock
    pub sclk: bool,
}

impl SpiLines {
    /// Bus idle: deselected, clock low, data low.
    pub const IDLE: SpiLines = SpiLines {
        ncs: true,
        copi: false,
        sclk: false,
    };

    /// Creates a line state.
    pub fn new(ncs: bool, copi: bool, sclk: bool) -> Self {
        Self { ncs, copi, sclk }
    }

    /// Packs the lines into a vector; unused bits are zero.
    pub fn to_vector(self) -> SignalVector {
        SignalVector::ZERO
            .with_bit(NCS_BIT, self.ncs)
            .with_bit(COPI_BIT, self.copi)
            .with_bit(SCLK_BIT, self.sclk)
    }

    /// Extracts the lines from a vector, ignoring unused bits.
    pub fn from_vector(v: SignalVector) -> Self {
        Self {
            ncs: v.bit(NCS_BIT),
            copi: v.bit(COPI_BIT),
            sclk: v.bit(SCLK_BIT),
        }
    }

    /// True while the peripheral is addressed.
    pub fn selected(self) -> bool {
        !self.ncs
    }
}

impl Default for SpiLines {
    fn default() -> Self {
        Self::IDLE
    }
}

impl From<SpiLines> for SignalVector {
    fn from(lines: SpiLines) -> Self {
        lines.to_vector()
    }
}

impl From<SignalVector> for SpiLines {
    fn from(v: SignalVector) -> Self {
        SpiLines::from_vector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_access() {
        let v = SignalVector::new(0b1010_0001);
        assert!(v.bit(0));
        assert!(!v.bit(1));
        assert!(v.bit(5));
        assert!(v.bit(7));
        assert!(!v.bit(8));
    }

    #[test]
    fn test_with_bit() {
        let v = SignalVector::ZERO.with_bit(3, true).with_bit(0, true);
        assert_eq!(v.bits(), 0b1001);
        assert_eq!(v.with_bit(3, false).bits(), 0b0001);
        assert_eq!(v.with_bit(9, true), v);
    }

    #[test]
    fn test_check_index() {
        assert!(SignalVector::check_index(7).is_ok());
        assert!(matches!(
            SignalVector::check_index(8),
            Err(HarnessError::Validation(_))
        ));
    }

    #[test]
    fn test_display_msb_first() {
        assert_eq!(SpiLines::IDLE.to_vector().to_string(), "00000100");
        assert_eq!(SpiLines::new(false, true, true).to_vector().to_string(), "00000011");
    }

    #[test]
    fn test_lines_ignore_unused_bits() {
        let lines = SpiLines::from_vector(SignalVector::new(0b1111_0010));
        assert_eq!(lines, SpiLines::new(false, true, false));
        assert!(lines.selected());
    }

    #[test]
    fn test_direction_levels() {
        assert!(EdgeDirection::Rising.target_level());
        assert!(!EdgeDirection::Falling.target_level());
        assert_eq!(EdgeDirection::Rising.opposite(), EdgeDirection::Falling);
        assert_eq!(EdgeDirection::Falling.to_string(), "falling");
    }
}
