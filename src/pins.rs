//! Pin assignment for the parallel output word.
//!
//! Every line the driver touches lives in one 32-bit GPIO output register so
//! that a single write can update all data lines at once. The assignment is
//! fixed when the firmware is built: [`Pins::new`] is a `const fn` that panics
//! on a clash, so declaring the assignment as a `const` or `static` item turns
//! a wiring mistake into a compile error instead of undefined electrical
//! behaviour at run time.
//!
//! # Example
//! ```rust
//! use mbi5034_panel::pins::Pins;
//!
//! const PINS: Pins<1> = Pins::new(
//!     [18, 5, 17, 16, 4, 0, 2, 15], // D1..D8
//!     [5, 18],                      // A0, A1 (may share data lines)
//!     [22],                         // CLK
//!     21,                           // LAT
//!     19,                           // OE
//! );
//! assert_eq!(PINS.clock_mask(), 1 << 22);
//! ```
//!
//! A clash fails to compile:
//! ```compile_fail
//! use mbi5034_panel::pins::Pins;
//!
//! // latch and output-enable on the same pin
//! const PINS: Pins<1> = Pins::new([18, 5, 17, 16, 4, 0, 2, 15], [5, 18], [22], 19, 19);
//! ```

use crate::{ADDRESS_LINES, DATA_LINES};

/// Highest pin number that fits in the 32-bit output word.
pub const MAX_PIN: u8 = 31;

/// Physical pin numbers for every line driven by the refresh engine.
///
/// # Type Parameters
/// - `CLOCKS`: number of clock lines. `1` for a single daisy chain; more when
///   the chain is split into equal segments that each have their own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins<const CLOCKS: usize> {
    data: [u8; DATA_LINES],
    address: [u8; ADDRESS_LINES],
    clocks: [u8; CLOCKS],
    latch: u8,
    output_enable: u8,
}

impl Pins<1> {
    /// Reference wiring for an ESP32-DevKitC (WROOM) board driving four
    /// stacked panels with two data lines each.
    pub const ESP32_DEVKITC: Self = Self::new([18, 5, 17, 16, 4, 0, 2, 15], [5, 18], [22], 21, 19);
}

impl<const CLOCKS: usize> Pins<CLOCKS> {
    /// Create a validated pin assignment.
    ///
    /// Address pins may share data pins. Clock, latch and output-enable pins
    /// must be unique.
    ///
    /// # Panics
    /// On any pin above [`MAX_PIN`], duplicated data or address pins, a control
    /// pin that aliases any other pin, or `CLOCKS == 0`. In a `const` context
    /// this is a compile error.
    #[must_use]
    pub const fn new(
        data: [u8; DATA_LINES],
        address: [u8; ADDRESS_LINES],
        clocks: [u8; CLOCKS],
        latch: u8,
        output_enable: u8,
    ) -> Self {
        let pins = Self {
            data,
            address,
            clocks,
            latch,
            output_enable,
        };
        pins.validate();
        pins
    }

    const fn validate(&self) {
        assert!(CLOCKS > 0, "at least one clock pin is required");
        assert!(in_range(&self.data), "data pin out of range");
        assert!(distinct(&self.data), "data pins must be distinct");
        assert!(in_range(&self.address), "address pin out of range");
        assert!(distinct(&self.address), "address pins must be distinct");
        assert!(in_range(&self.clocks), "clock pin out of range");
        assert!(distinct(&self.clocks), "clock pins must be distinct");
        assert!(self.latch <= MAX_PIN, "latch pin out of range");
        assert!(self.output_enable <= MAX_PIN, "output-enable pin out of range");

        let mut i = 0;
        while i < CLOCKS {
            let clock = self.clocks[i];
            assert!(!self.is_data_or_address(clock), "clock pin aliases a data or address pin");
            assert!(clock != self.latch, "clock pin aliases the latch pin");
            assert!(clock != self.output_enable, "clock pin aliases the output-enable pin");
            i += 1;
        }
        assert!(!self.is_data_or_address(self.latch), "latch pin aliases a data or address pin");
        assert!(
            !self.is_data_or_address(self.output_enable),
            "output-enable pin aliases a data or address pin"
        );
        assert!(self.latch != self.output_enable, "latch pin aliases the output-enable pin");
    }

    const fn is_data_or_address(&self, pin: u8) -> bool {
        contains(&self.data, pin) || contains(&self.address, pin)
    }

    /// Data line pins, logical line `k` at index `k`.
    #[must_use]
    pub const fn data(&self) -> &[u8; DATA_LINES] {
        &self.data
    }

    /// Address pins, least significant bank bit first.
    #[must_use]
    pub const fn address(&self) -> &[u8; ADDRESS_LINES] {
        &self.address
    }

    /// Clock pins, one per chain segment in shift order.
    #[must_use]
    pub const fn clocks(&self) -> &[u8; CLOCKS] {
        &self.clocks
    }

    /// Latch pin.
    #[must_use]
    pub const fn latch(&self) -> u8 {
        self.latch
    }

    /// Output-enable pin (active low).
    #[must_use]
    pub const fn output_enable(&self) -> u8 {
        self.output_enable
    }

    /// Mask of all data lines.
    #[must_use]
    pub const fn data_mask(&self) -> u32 {
        mask(&self.data)
    }

    /// Mask of both address lines.
    #[must_use]
    pub const fn address_mask(&self) -> u32 {
        mask(&self.address)
    }

    /// Mask of every clock line.
    #[must_use]
    pub const fn clock_mask(&self) -> u32 {
        mask(&self.clocks)
    }

    /// Mask of the clock line for chain segment `segment`.
    #[must_use]
    pub const fn segment_clock_mask(&self, segment: usize) -> u32 {
        1 << self.clocks[segment % CLOCKS]
    }

    /// Mask of the latch line.
    #[must_use]
    pub const fn latch_mask(&self) -> u32 {
        1 << self.latch
    }

    /// Mask of the output-enable line.
    #[must_use]
    pub const fn output_enable_mask(&self) -> u32 {
        1 << self.output_enable
    }

    /// Mask of every line owned by the driver. Bits outside it belong to the
    /// rest of the board and are preserved on every write.
    #[must_use]
    pub const fn managed_mask(&self) -> u32 {
        self.data_mask()
            | self.address_mask()
            | self.clock_mask()
            | self.latch_mask()
            | self.output_enable_mask()
    }

    /// Address line levels that select `bank`.
    #[must_use]
    pub const fn address_bits(&self, bank: usize) -> u32 {
        let mut bits = 0;
        let mut i = 0;
        while i < ADDRESS_LINES {
            if (bank >> i) & 1 != 0 {
                bits |= 1 << self.address[i];
            }
            i += 1;
        }
        bits
    }
}

const fn mask(pins: &[u8]) -> u32 {
    let mut bits = 0;
    let mut i = 0;
    while i < pins.len() {
        bits |= 1 << pins[i];
        i += 1;
    }
    bits
}

const fn contains(pins: &[u8], pin: u8) -> bool {
    let mut i = 0;
    while i < pins.len() {
        if pins[i] == pin {
            return true;
        }
        i += 1;
    }
    false
}

const fn in_range(pins: &[u8]) -> bool {
    let mut i = 0;
    while i < pins.len() {
        if pins[i] > MAX_PIN {
            return false;
        }
        i += 1;
    }
    true
}

const fn distinct(pins: &[u8]) -> bool {
    let mut i = 0;
    while i < pins.len() {
        let mut j = i + 1;
        while j < pins.len() {
            if pins[i] == pins[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    const PINS: Pins<1> = Pins::ESP32_DEVKITC;

    #[test]
    fn test_devkitc_masks() {
        let data = (1 << 18) | (1 << 5) | (1 << 17) | (1 << 16) | (1 << 4) | 1 | (1 << 2) | (1 << 15);
        assert_eq!(PINS.data_mask(), data);
        assert_eq!(PINS.address_mask(), (1 << 5) | (1 << 18));
        assert_eq!(PINS.clock_mask(), 1 << 22);
        assert_eq!(PINS.latch_mask(), 1 << 21);
        assert_eq!(PINS.output_enable_mask(), 1 << 19);
        assert_eq!(
            PINS.managed_mask(),
            data | (1 << 22) | (1 << 21) | (1 << 19)
        );
    }

    #[test]
    fn test_address_bits() {
        assert_eq!(PINS.address_bits(0), 0);
        assert_eq!(PINS.address_bits(1), 1 << 5);
        assert_eq!(PINS.address_bits(2), 1 << 18);
        assert_eq!(PINS.address_bits(3), (1 << 5) | (1 << 18));
    }

    #[test]
    fn test_segment_clocks() {
        let pins: Pins<4> = Pins::new([0, 1, 2, 3, 4, 5, 6, 7], [8, 9], [10, 11, 12, 13], 14, 15);
        assert_eq!(pins.clock_mask(), 0b11_1100_0000_0000);
        assert_eq!(pins.segment_clock_mask(0), 1 << 10);
        assert_eq!(pins.segment_clock_mask(3), 1 << 13);
    }

    #[test]
    fn test_address_may_share_data() {
        // the reference board reuses D1/D2 as A1/A0
        assert!(PINS.data_mask() & PINS.address_mask() == PINS.address_mask());
    }

    #[test]
    #[should_panic(expected = "data pins must be distinct")]
    fn test_duplicate_data_pin() {
        let _ = Pins::<1>::new([0, 1, 2, 3, 4, 5, 6, 6], [8, 9], [10], 11, 12);
    }

    #[test]
    #[should_panic(expected = "clock pin aliases a data or address pin")]
    fn test_clock_on_data_pin() {
        let _ = Pins::<1>::new([0, 1, 2, 3, 4, 5, 6, 7], [8, 9], [3], 11, 12);
    }

    #[test]
    #[should_panic(expected = "latch pin aliases the output-enable pin")]
    fn test_latch_on_output_enable() {
        let _ = Pins::<1>::new([0, 1, 2, 3, 4, 5, 6, 7], [8, 9], [10], 12, 12);
    }

    #[test]
    #[should_panic(expected = "data pin out of range")]
    fn test_pin_out_of_range() {
        let _ = Pins::<1>::new([0, 1, 2, 3, 4, 5, 6, 32], [8, 9], [10], 11, 12);
    }

    #[test]
    #[should_panic(expected = "at least one clock pin is required")]
    fn test_no_clock() {
        let _ = Pins::<0>::new([0, 1, 2, 3, 4, 5, 6, 7], [8, 9], [], 11, 12);
    }
}
