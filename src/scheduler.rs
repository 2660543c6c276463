//! Refresh scheduler: which `(bank, plane)` to show next and how to put it on
//! the wires.
//!
//! # Binary Code Modulation timing
//! The refresh timer fires at a fixed rate. A slot showing plane `d` stays lit
//! for `2^(PLANES - 1 - d)` ticks, so plane 0 (the most significant bit) gets
//! half of every bank's time, plane 1 a quarter, and so on. Ticks that fall
//! inside a dwell return straight away without touching any output.
//!
//! The cursor walks every bank of plane 0, then every bank of plane 1, and so
//! on, wrapping back to plane 0. One full cycle is
//! [`crate::compute_cycle_ticks`] ticks.
//!
//! # Output sequence
//! On a slot change [`refresh_slot`]:
//! 1. blanks the panel (OE high),
//! 2. streams the slot's bytes through the channel map, one clock pulse per
//!    byte, segment by segment,
//! 3. drives the bank address and pulses LAT,
//! 4. un-blanks (OE low).
//!
//! The caller then restarts the timer so the lit time is measured from the
//! end of the shift-out, not from the previous tick.

use core::sync::atomic::Ordering;

use crate::framebuffer::FrameBuffer;
use crate::mapping::ChannelMap;
use crate::pins::Pins;
use crate::port::OutputPort;
use crate::{MAX_BANKS, MAX_PLANES};

/// One `(bank, plane)` pair of the frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot {
    /// Bank to select.
    pub bank: usize,
    /// Bit-plane to stream.
    pub plane: usize,
}

/// Bank/plane cursor advanced once per timer tick.
///
/// Starts at bank 0, plane 0 with nothing lit, so the first tick streams
/// `(0, 0)` straight away.
///
/// `PLANES` and `BANKS` have the same bounds as [`FrameBuffer`]:
///
/// ```compile_fail
/// use mbi5034_panel::scheduler::Cursor;
///
/// let _ = Cursor::<0, 4>::new();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor<const PLANES: usize, const BANKS: usize> {
    bank: u8,
    plane: u8,
    subcount: u8,
    // dwell of the lit slot, as a power of two
    dwell_shift: u8,
}

impl<const PLANES: usize, const BANKS: usize> Default for Cursor<PLANES, BANKS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PLANES: usize, const BANKS: usize> Cursor<PLANES, BANKS> {
    /// A cursor at `(0, 0, 0)`.
    #[must_use]
    pub const fn new() -> Self {
        const {
            assert!(PLANES >= 1 && PLANES <= MAX_PLANES, "colour depth must be 1 to 6 planes");
            assert!(BANKS >= 1 && BANKS <= MAX_BANKS, "bank count must be 1 to 4");
        }
        Self {
            bank: 0,
            plane: 0,
            subcount: 0,
            dwell_shift: 0,
        }
    }

    /// Back to `(0, 0, 0)`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Bank of the next slot.
    #[must_use]
    pub const fn bank(&self) -> usize {
        self.bank as usize
    }

    /// Plane of the next slot.
    #[must_use]
    pub const fn plane(&self) -> usize {
        self.plane as usize
    }

    /// Ticks spent so far in the lit slot.
    #[must_use]
    pub const fn subcount(&self) -> usize {
        self.subcount as usize
    }

    /// Count one timer tick.
    ///
    /// Returns the slot to stream when the lit slot's dwell has run out, and
    /// `None` while it is still running.
    #[inline]
    pub fn tick(&mut self) -> Option<Slot> {
        self.subcount = self.subcount.wrapping_add(1);
        if self.subcount >> self.dwell_shift == 0 {
            return None;
        }
        self.subcount = 0;

        let slot = Slot {
            bank: self.bank as usize,
            plane: self.plane as usize,
        };
        self.dwell_shift = (PLANES - 1 - slot.plane) as u8;

        self.bank += 1;
        if self.bank as usize >= BANKS {
            self.bank = 0;
            self.plane += 1;
            if self.plane as usize >= PLANES {
                self.plane = 0;
            }
        }
        Some(slot)
    }
}

/// Stream one slot to the panel and latch it.
///
/// The frame buffer is split into `CLOCKS` equal segments; segment `i` is
/// clocked by `pins.clocks()[i]`. Lines outside [`Pins::managed_mask`] keep
/// their level.
pub fn refresh_slot<P, const PLANES: usize, const BANKS: usize, const BYTES: usize, const CLOCKS: usize>(
    port: &mut P,
    pins: &Pins<CLOCKS>,
    map: &ChannelMap,
    frame: &FrameBuffer<PLANES, BANKS, BYTES>,
    slot: Slot,
) where
    P: OutputPort,
{
    const {
        assert!(BYTES % CLOCKS == 0, "bank size must split evenly across clock segments");
    }
    let output_enable = pins.output_enable_mask();
    let latch = pins.latch_mask();

    // blank first, the chips keep showing the old slot while we shift
    port.set_bits(output_enable);

    let out = (port.read() & !pins.managed_mask()) | output_enable;
    let bytes = frame.bank_slice(slot.plane, slot.bank);
    for (segment, chunk) in bytes.chunks_exact(BYTES / CLOCKS).enumerate() {
        let clock = pins.segment_clock_mask(segment);
        for cell in chunk {
            // the write also drops every clock, so set_bits is a rising edge
            port.write(out | map.word(cell.load(Ordering::Relaxed)));
            port.set_bits(clock);
        }
    }
    port.clear_bits(pins.segment_clock_mask(CLOCKS - 1));

    port.write(out | pins.address_bits(slot.bank));
    port.set_bits(latch);
    port.clear_bits(latch);

    port.clear_bits(output_enable);
}
