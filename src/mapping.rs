//! Channel mapping table.
//!
//! The frame buffer stores one bit per logical data line in each byte. The
//! output register wants those bits at the physical pin positions, which are
//! wherever the board happened to route them. [`ChannelMap`] precomputes the
//! permutation for all 256 byte values so the refresh interrupt only does one
//! table lookup per byte.
//!
//! The table is built by a `const fn` and never touches hardware, so it can be
//! placed in a `static` (flash) or built into RAM before the GPIO block is set
//! up. On parts where flash reads stall while the flash is being written (file
//! systems), keep the driver's RAM copy.

use crate::pins::Pins;
use crate::DATA_LINES;

/// Lookup from buffer byte to output word.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelMap {
    words: [u32; 256],
}

impl ChannelMap {
    /// Build the table for the given data line pins. Logical line `k` (bit `k`
    /// of a buffer byte) lands on pin `data[k]`.
    #[must_use]
    pub const fn new(data: &[u8; DATA_LINES]) -> Self {
        let mut words = [0u32; 256];
        let mut byte = 0;
        while byte < 256 {
            let mut word = 0u32;
            let mut line = 0;
            while line < DATA_LINES {
                if byte & (1 << line) != 0 {
                    word |= 1 << data[line];
                }
                line += 1;
            }
            words[byte] = word;
            byte += 1;
        }
        Self { words }
    }

    /// Build the table for a validated pin assignment.
    #[must_use]
    pub const fn from_pins<const CLOCKS: usize>(pins: &Pins<CLOCKS>) -> Self {
        Self::new(pins.data())
    }

    /// Output word for `byte`.
    #[inline(always)]
    #[must_use]
    pub const fn word(&self, byte: u8) -> u32 {
        self.words[byte as usize]
    }
}

impl core::fmt::Debug for ChannelMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelMap")
            .field("all_lines", &format_args!("{:#010x}", self.words[255]))
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelMap {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ChannelMap {{ all_lines: {=u32:#x} }}", self.words[255]);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;

    use super::*;

    const PINS: Pins<1> = Pins::ESP32_DEVKITC;
    static MAP: ChannelMap = ChannelMap::from_pins(&PINS);

    #[test]
    fn test_zero_maps_to_zero() {
        assert_eq!(MAP.word(0), 0);
        assert_eq!(MAP.word(0) & PINS.output_enable_mask(), 0);
    }

    #[test]
    fn test_single_lines() {
        for (line, pin) in PINS.data().iter().enumerate() {
            assert_eq!(MAP.word(1 << line), 1 << pin);
        }
    }

    #[test]
    fn test_all_lines() {
        assert_eq!(MAP.word(0xff), PINS.data_mask());
    }

    #[test]
    fn test_identity_wiring() {
        let map = ChannelMap::new(&[0, 1, 2, 3, 4, 5, 6, 7]);
        for byte in 0..=255u8 {
            assert_eq!(map.word(byte), u32::from(byte));
        }
    }

    #[test]
    fn test_pins_below_line_index() {
        // lines moved to lower bit positions than their logical index
        let map = ChannelMap::new(&[31, 30, 29, 28, 3, 2, 1, 0]);
        assert_eq!(map.word(0b0001_0000), 1 << 3);
        assert_eq!(map.word(0b1000_0000), 1);
        assert_eq!(map.word(0b0000_0001), 1 << 31);
    }

    #[test]
    fn test_bijective_on_wired_bits() {
        for a in 0..=255u8 {
            let wa = MAP.word(a);
            assert_eq!(wa & !PINS.data_mask(), 0);
            assert_eq!(wa.count_ones(), a.count_ones());
            for line in 0..DATA_LINES {
                let b = a ^ (1 << line);
                // flipping one logical line flips exactly its physical pin
                assert_eq!(wa ^ MAP.word(b), 1 << PINS.data()[line]);
            }
        }
    }

    #[test]
    fn test_distinct_bytes_distinct_words() {
        let mut seen = std::collections::BTreeSet::new();
        for byte in 0..=255u8 {
            assert!(seen.insert(MAP.word(byte)));
        }
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn test_debug_formatting() {
        let debug_string = format!("{:?}", MAP);
        assert!(debug_string.contains("ChannelMap"));
        assert!(debug_string.contains("all_lines"));
    }
}
