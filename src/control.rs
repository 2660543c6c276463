//! Brightness controller.
//!
//! Every MBI5034 holds a 16-bit configuration register that sets the analog
//! output current. It is written with the same lines as pixel data, but with
//! its own protocol: the word is shifted MSB first on all data lines at once,
//! and LAT is held high during the final 4 clocks of the last chip in the
//! chain, which moves the word of every chip into its configuration register
//! together.
//!
//! The write bit-bangs the shared lines, so it must never overlap a refresh
//! tick. [`crate::driver::Driver::set_brightness`] takes care of that.

use bitfield::bitfield;

use crate::pins::Pins;
use crate::port::OutputPort;
use crate::LEDS_PER_CHIP;

/// Clocks of the last chip during which LAT is held to load the configuration
/// register.
pub const LATCH_CLOCKS: usize = 4;

/// Brightness percentage that maps to the highest gain code.
pub const MAX_BRIGHTNESS: u16 = 200;

bitfield! {
    /// MBI5034 configuration register.
    ///
    /// The bit layout is as follows:
    /// - Bits 15-14: Header, always `01`
    /// - Bits 13-12: Error detection time
    /// - Bits 11-10: Reserved
    /// - Bits 9-6: Check bits
    /// - Bit 5: High current range
    /// - Bits 5-0: Current gain (bit 5 doubles as the range flag)
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct ControlRegister(u16);
    impl Debug;
    /// Fixed header
    pub u8, header, _: 15, 14;
    /// Error detection time
    pub u8, error_detect, _: 13, 12;
    /// Check bits
    pub u8, check, _: 9, 6;
    /// High current range
    pub high_current, _: 5;
    /// Current gain code
    pub u8, gain, set_gain: 5, 0;
}

impl ControlRegister {
    /// Datasheet pattern with a gain of 0.
    pub const BASE: u16 = 0b0111_0001_0100_0000;

    /// Register with the fixed fields and gain 0.
    #[must_use]
    pub const fn new() -> Self {
        Self(Self::BASE)
    }

    /// Register with the fixed fields and the given 6-bit gain code.
    #[must_use]
    pub fn with_gain(gain: u8) -> Self {
        let mut reg = Self::new();
        reg.set_gain(gain & 0x3f);
        reg
    }

    /// Register for a brightness percentage, see [`gain_code`].
    #[must_use]
    pub fn from_percent(percent: u16) -> Self {
        Self::with_gain(gain_code(percent))
    }

    /// The raw 16-bit word, shifted out MSB first.
    #[must_use]
    pub const fn bits(&self) -> u16 {
        self.0
    }
}

impl Default for ControlRegister {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlRegister {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ControlRegister({=u16:#06x})", self.0);
    }
}

/// Converts a brightness percentage into a 6-bit current gain code.
///
/// Three linear segments: up to 12% is off, 12-100% ramps to `0x2B` (the
/// chip's nominal current), 100-200% ramps on to `63`. Anything at or above
/// [`MAX_BRIGHTNESS`] is `63`.
#[must_use]
pub const fn gain_code(percent: u16) -> u8 {
    let p = percent as u32;
    let code = if p <= 12 {
        0
    } else if p <= 100 {
        (p - 12) * 0x2b / 88
    } else if p >= MAX_BRIGHTNESS as u32 {
        63
    } else {
        (p - 100) * 20 / 100 + 0x2b
    };
    code as u8
}

/// Shift `register` into every chip of every bank.
///
/// For each bank the address lines select the bank with output blanked, then
/// `chips` 16-bit words go out on all data lines, clocked on every clock line
/// at once. Lines outside [`Pins::managed_mask`] keep their level. Output
/// stays blanked afterwards.
pub fn write_control<P, const CLOCKS: usize>(
    port: &mut P,
    pins: &Pins<CLOCKS>,
    banks: usize,
    chips: usize,
    register: ControlRegister,
) where
    P: OutputPort,
{
    let word = register.bits();
    let data = pins.data_mask();
    let clocks = pins.clock_mask();
    let latch = pins.latch_mask();
    let idle = (port.read() & !pins.managed_mask()) | pins.output_enable_mask();

    for bank in 0..banks {
        let out = idle | pins.address_bits(bank);
        port.write(out);
        for chip in 0..chips {
            let last = chip + 1 == chips;
            for n in 0..LEDS_PER_CHIP {
                let bit = (word >> (LEDS_PER_CHIP - 1 - n)) & 1 != 0;
                let mut level = out;
                if bit {
                    level |= data;
                }
                if last && n >= LEDS_PER_CHIP - LATCH_CLOCKS {
                    level |= latch;
                }
                port.write(level);
                port.set_bits(clocks);
            }
            port.clear_bits(clocks);
        }
        port.clear_bits(latch);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::port::mock::RecordingPort;

    const PINS: Pins<1> = Pins::ESP32_DEVKITC;

    #[test]
    fn test_gain_anchor_points() {
        assert_eq!(gain_code(0), 0);
        assert_eq!(gain_code(12), 0);
        assert_eq!(gain_code(100), 0x2b);
        assert_eq!(gain_code(199), 62);
        assert_eq!(gain_code(200), 63);
        assert_eq!(gain_code(u16::MAX), 63);
    }

    #[test]
    fn test_gain_monotonic() {
        let codes: Vec<u8> = (0..=MAX_BRIGHTNESS).map(gain_code).collect();
        for pair in codes.windows(2) {
            assert!(pair[0] <= pair[1], "{pair:?}");
        }
        assert!(codes.iter().all(|&c| c <= 63));
    }

    #[test]
    fn test_register_fields() {
        let reg = ControlRegister::new();
        assert_eq!(reg.bits(), 0x7140);
        assert_eq!(reg.header(), 0b01);
        assert_eq!(reg.error_detect(), 0b11);
        assert_eq!(reg.check(), 0b0101);
        assert!(!reg.high_current());
        assert_eq!(reg.gain(), 0);

        let reg = ControlRegister::from_percent(100);
        assert_eq!(reg.bits(), 0x7140 | 0x2b);
        assert!(reg.high_current());

        let reg = ControlRegister::with_gain(0xff);
        assert_eq!(reg.gain(), 63);
        assert_eq!(reg.check(), 0b0101);
    }

    fn watched() -> u32 {
        PINS.clock_mask() | PINS.latch_mask()
    }

    #[test]
    fn test_write_shifts_every_chip() {
        let reg = ControlRegister::from_percent(150);
        let mut port = RecordingPort::new(watched());

        write_control(&mut port, &PINS, 4, 24, reg);

        let clocked = port.clocked(PINS.clock_mask());
        assert_eq!(clocked.len(), 4 * 24 * 16);
        for (i, word) in clocked.iter().enumerate() {
            let n = i % 16;
            let bit = (reg.bits() >> (15 - n)) & 1 != 0;
            // the DevKitC address lines share pins with data
            let address = PINS.address_bits(i / (24 * 16));
            let expected = if bit { PINS.data_mask() } else { address & PINS.data_mask() };
            assert_eq!(word & PINS.data_mask(), expected, "clock {i}");
            // blanked throughout
            assert_ne!(word & PINS.output_enable_mask(), 0);
        }
    }

    #[test]
    fn test_latch_once_per_bank_on_last_bits() {
        let mut port = RecordingPort::new(watched());

        write_control(&mut port, &PINS, 4, 3, ControlRegister::new());

        assert_eq!(port.pulses(PINS.latch_mask()), 4);
        let clocked = port.clocked(PINS.clock_mask());
        for (bank, words) in clocked.chunks(3 * 16).enumerate() {
            for (i, word) in words.iter().enumerate() {
                let latched = word & PINS.latch_mask() != 0;
                assert_eq!(latched, i >= 2 * 16 + 12, "bank {bank} clock {i}");
            }
        }
        assert_eq!(port.read() & (PINS.latch_mask() | PINS.clock_mask()), 0);
    }

    #[test]
    fn test_bank_address_while_shifting() {
        let mut port = RecordingPort::new(watched());

        write_control(&mut port, &PINS, 4, 2, ControlRegister::new());

        let lines = PINS.data_mask() | PINS.address_mask();
        let clocked = port.clocked(PINS.clock_mask());
        for (bank, words) in clocked.chunks(2 * 16).enumerate() {
            // bit 15 of the register is 0, so only the address is driven
            assert_eq!(words[0] & lines, PINS.address_bits(bank));
        }
    }

    #[test]
    fn test_segmented_clocks_pulse_together() {
        let pins: Pins<2> = Pins::new([0, 1, 2, 3, 4, 5, 6, 7], [8, 9], [10, 11], 12, 13);
        let mut port = RecordingPort::new(pins.clock_mask());

        write_control(&mut port, &pins, 2, 5, ControlRegister::new());

        assert_eq!(port.pulses(pins.segment_clock_mask(0)), 2 * 5 * 16);
        assert_eq!(port.pulses(pins.segment_clock_mask(1)), 2 * 5 * 16);
    }

    #[test]
    fn test_unmanaged_lines_preserved() {
        let unrelated = 1 << 25;
        let mut port = RecordingPort::new(0);
        port.write(unrelated);

        write_control(&mut port, &PINS, 1, 1, ControlRegister::new());

        assert!(port.history.iter().all(|w| w & unrelated != 0));
    }
}
