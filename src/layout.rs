//! Panel wiring geometry.
//!
//! A [`PanelLayout`] translates a pixel coordinate into the one byte and bit of
//! a bank slice that drives that LED. The translation is fixed by how the
//! panel's LEDs are wired to the chip outputs, so it lives in a type rather
//! than in runtime configuration.
//!
//! Currently supported layouts:
//! - [`FourPanelStack`] (and the [`Stack4x64x16`] reference display)

/// Where one pixel lives inside a bank slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Location {
    /// Bank holding the pixel.
    pub bank: usize,
    /// Offset of the pixel's blue byte. Green and red follow at a stride of
    /// [`crate::LEDS_PER_CHIP`].
    pub offset: usize,
    /// The data line bit inside those bytes.
    pub mask: u8,
}

/// Trait for panel wirings.
///
/// Implementors map an in-bounds `(x, y)` to a [`Location`] whose `bank` is
/// below `BANKS` and whose `offset + 2 * LEDS_PER_CHIP` is below
/// `BYTES_PER_BANK`.
pub trait PanelLayout {
    /// Width of the display in pixels
    const WIDTH: usize;
    /// Height of the display in pixels
    const HEIGHT: usize;
    /// Number of banks the wiring scans
    const BANKS: usize;
    /// Bytes streamed per bank and plane
    const BYTES_PER_BANK: usize;

    /// Locate an in-bounds pixel.
    fn locate(x: usize, y: usize) -> Location;

    /// Locate a pixel, `None` when it is off the display.
    #[inline]
    #[must_use]
    fn try_locate(x: i32, y: i32) -> Option<Location> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= Self::WIDTH || y >= Self::HEIGHT {
            return None;
        }
        Some(Self::locate(x, y))
    }
}

/// Four 16-row panels stacked vertically and driven in parallel, two data
/// lines per panel, 64 rows in total.
///
/// Columns come in blocks of 8. For each block the chain carries 3 chips (blue,
/// green, red) of 16 outputs; outputs 0-7 drive the first row of a bank inside
/// a panel half and outputs 8-15 the row 4 below it. Rows `y & 3` select the
/// bank and the eight panel halves select the data line:
///
/// ```text
/// offset = (x & 7) + (x & !7) * 6 + (y & 4) * 2
/// bank   = y & 3
/// mask   = 1 << ((y & 0x3f) >> 3)
/// ```
///
/// # Type Parameters
/// * `WIDTH` - Panel width in pixels, a non-zero multiple of 8. Anything else
///   is rejected when the layout is used:
///
/// ```compile_fail
/// use mbi5034_panel::encoder::PixelEncoder;
/// use mbi5034_panel::framebuffer::FrameBuffer;
/// use mbi5034_panel::layout::FourPanelStack;
///
/// static FRAME: FrameBuffer<1, 4, 72> = FrameBuffer::new();
///
/// // 12 columns is one and a half blocks
/// let _ = PixelEncoder::<FourPanelStack<12>, 1, 4, 72>::new(&FRAME);
/// ```
pub struct FourPanelStack<const WIDTH: usize> {}

impl<const WIDTH: usize> PanelLayout for FourPanelStack<WIDTH> {
    const WIDTH: usize = {
        assert!(WIDTH > 0 && WIDTH % 8 == 0, "panel width must be a non-zero multiple of 8");
        WIDTH
    };
    const HEIGHT: usize = 64;
    const BANKS: usize = 4;
    const BYTES_PER_BANK: usize = Self::WIDTH * 6;

    #[inline]
    fn locate(x: usize, y: usize) -> Location {
        Location {
            bank: y & 3,
            offset: (x & 7) + (x & !7) * 6 + (y & 4) * 2,
            mask: 1 << ((y & 0x3f) >> 3),
        }
    }
}

/// The reference display: four 64×16 panels, 64×64 pixels, 24 chips per data
/// line.
pub type Stack4x64x16 = FourPanelStack<64>;
