//! Bit-plane frame buffer shared between drawing code and the refresh
//! interrupt.
//!
//! The buffer is indexed `[plane][bank][byte]`:
//! - `plane` is the significance bit of the colour (plane 0 is the most
//!   significant and is displayed longest)
//! - `bank` is the address-selectable scan group
//! - `byte` is the position along the chip chain. Each byte holds one bit per
//!   data line; bit `k` is shifted out on logical data line `k`
//!
//! One `[bank]` slice of one plane is exactly what the refresh interrupt
//! streams out on a tick, in order.
//!
//! # Concurrency
//! There is one writer (the drawing code, through [`crate::encoder`]) and one
//! reader (the refresh interrupt). The bytes are `AtomicU8` and every access is
//! a single `Relaxed` load or store, so there is no lock in the interrupt path
//! and no data race. A pixel write that the interrupt observes half way through
//! shows as one wrong bit for one refresh, which is accepted.
//!
//! # Memory Usage
//! `PLANES × BANKS × BYTES` bytes. The reference 64×64 stack at 5 planes needs
//! `5 × 4 × 384 = 7680` bytes. The size is fixed by the type and the buffer is
//! never reallocated, so it can live in a `static`.
//!
//! # Example
//! ```rust
//! use mbi5034_panel::framebuffer::FrameBuffer;
//!
//! static FRAME: FrameBuffer<4, 4, 384> = FrameBuffer::new();
//!
//! FRAME.clear(true);
//! assert!(FRAME.bytes().all(|b| b == 0xff));
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

use crate::{MAX_BANKS, MAX_PLANES};

/// Bit-plane frame buffer.
///
/// # Type Parameters
/// - `PLANES`: Colour depth, 1 to [`MAX_PLANES`]
/// - `BANKS`: Number of address-selectable banks, 1 to [`MAX_BANKS`]
/// - `BYTES`: Bytes streamed per bank and plane
#[repr(C)]
pub struct FrameBuffer<const PLANES: usize, const BANKS: usize, const BYTES: usize> {
    planes: [[[AtomicU8; BYTES]; BANKS]; PLANES],
}

impl<const PLANES: usize, const BANKS: usize, const BYTES: usize> Default
    for FrameBuffer<PLANES, BANKS, BYTES>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const PLANES: usize, const BANKS: usize, const BYTES: usize> FrameBuffer<PLANES, BANKS, BYTES> {
    /// Create a new, all black, frame buffer.
    #[must_use]
    pub const fn new() -> Self {
        const {
            assert!(PLANES >= 1 && PLANES <= MAX_PLANES, "colour depth must be 1 to 6 planes");
            assert!(BANKS >= 1 && BANKS <= MAX_BANKS, "bank count must be 1 to 4");
            assert!(BYTES > 0, "a bank must hold at least one byte");
        }
        Self {
            planes: [const { [const { [const { AtomicU8::new(0) }; BYTES] }; BANKS] }; PLANES],
        }
    }

    /// Size of the buffer in bytes.
    #[must_use]
    pub const fn size_bytes() -> usize {
        PLANES * BANKS * BYTES
    }

    /// Fill every byte of every plane and bank with `byte`.
    pub fn fill(&self, byte: u8) {
        for plane in &self.planes {
            for bank in plane {
                for cell in bank {
                    cell.store(byte, Ordering::Relaxed);
                }
            }
        }
    }

    /// Clear the whole buffer to black, or to white when `to_white` is set.
    ///
    /// This is the only whole-buffer write. It is not synchronised with the
    /// refresh interrupt; a clear that races a tick shows as one torn frame.
    pub fn clear(&self, to_white: bool) {
        self.fill(if to_white { 0xff } else { 0x00 });
    }

    /// Set or clear the bits in `mask` of one byte.
    ///
    /// An atomic `fetch_or`/`fetch_and` where the target has byte-sized atomic
    /// read-modify-write, so writers sharing the buffer never lose each
    /// other's bits. Targets with only atomic load/store (e.g. `thumbv6m`)
    /// fall back to load then store, and there the buffer must have a single
    /// writer.
    ///
    /// # Panics
    /// If `plane`, `bank` or `offset` is out of range.
    #[inline]
    pub fn write_bit(&self, plane: usize, bank: usize, offset: usize, mask: u8, on: bool) {
        let cell = &self.planes[plane][bank][offset];
        #[cfg(target_has_atomic = "8")]
        {
            if on {
                cell.fetch_or(mask, Ordering::Relaxed);
            } else {
                cell.fetch_and(!mask, Ordering::Relaxed);
            }
        }
        #[cfg(not(target_has_atomic = "8"))]
        {
            let byte = cell.load(Ordering::Relaxed);
            let byte = if on { byte | mask } else { byte & !mask };
            cell.store(byte, Ordering::Relaxed);
        }
    }

    /// Current value of one byte.
    ///
    /// # Panics
    /// If `plane`, `bank` or `offset` is out of range.
    #[must_use]
    pub fn byte(&self, plane: usize, bank: usize, offset: usize) -> u8 {
        self.planes[plane][bank][offset].load(Ordering::Relaxed)
    }

    /// The bytes streamed for one `(bank, plane)` slot, in shift order.
    ///
    /// Indices wrap, so the refresh path can never index outside the buffer.
    #[inline]
    #[must_use]
    pub fn bank_slice(&self, plane: usize, bank: usize) -> &[AtomicU8; BYTES] {
        &self.planes[plane % PLANES][bank % BANKS]
    }

    /// Iterate over every byte, plane by plane, then bank by bank.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.planes
            .iter()
            .flat_map(|plane| plane.iter())
            .flat_map(|bank| bank.iter())
            .map(|cell| cell.load(Ordering::Relaxed))
    }
}

impl<const PLANES: usize, const BANKS: usize, const BYTES: usize> core::fmt::Debug
    for FrameBuffer<PLANES, BANKS, BYTES>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("size", &Self::size_bytes())
            .field("planes", &PLANES)
            .field("banks", &BANKS)
            .field("bank_size", &BYTES)
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<const PLANES: usize, const BANKS: usize, const BYTES: usize> defmt::Format
    for FrameBuffer<PLANES, BANKS, BYTES>
{
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FrameBuffer<{}, {}, {}>", PLANES, BANKS, BYTES);
        defmt::write!(f, " size: {}", Self::size_bytes());
    }
}
