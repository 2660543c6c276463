//! Pixel encoder: colours in, bit-plane updates out.
//!
//! [`PixelEncoder`] borrows the shared [`FrameBuffer`] and writes one pixel as
//! `3 × PLANES` single-bit updates inside one bank: for plane `d` the blue,
//! green and red bytes get bit `7 - d` of the (optionally gamma corrected)
//! channel value. Nothing outside that bank is touched, so the refresh
//! interrupt streaming another bank never sees a half written pixel.
//!
//! It also implements the `embedded-graphics` [`DrawTarget`], which is all a
//! drawing adapter needs.
//!
//! # Example
//! ```rust
//! use embedded_graphics::pixelcolor::RgbColor;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
//! use mbi5034_panel::encoder::PixelEncoder;
//! use mbi5034_panel::framebuffer::FrameBuffer;
//! use mbi5034_panel::layout::Stack4x64x16;
//! use mbi5034_panel::Color;
//!
//! static FRAME: FrameBuffer<4, 4, 384> = FrameBuffer::new();
//!
//! let mut canvas = PixelEncoder::<Stack4x64x16, 4, 4, 384>::new(&FRAME);
//! canvas.clear(Color::BLACK).unwrap();
//! Rectangle::new(Point::new(10, 10), Size::new(20, 20))
//!     .into_styled(PrimitiveStyle::with_fill(Color::RED))
//!     .draw(&mut canvas)
//!     .unwrap();
//! assert_eq!(canvas.pixel(Point::new(12, 12)), Some(Color::new(0xf0, 0, 0)));
//! ```

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::pixelcolor::RgbColor;
use embedded_graphics::prelude::{Dimensions, OriginDimensions, Point, Size};
use embedded_graphics::Pixel;

use crate::framebuffer::FrameBuffer;
use crate::gamma::Correction;
use crate::layout::{Location, PanelLayout};
use crate::{Color, LEDS_PER_CHIP};

/// Writes pixels into a shared frame buffer.
///
/// Several encoders may share one buffer. On targets without byte-sized atomic
/// read-modify-write only one of them may write at a time, see
/// [`FrameBuffer::write_bit`].
///
/// # Type Parameters
/// - `L`: Panel wiring, see [`crate::layout`]
/// - `PLANES`, `BANKS`, `BYTES`: must match the frame buffer, and `BANKS` and
///   `BYTES` must match the layout (checked at compile time)
pub struct PixelEncoder<'a, L, const PLANES: usize, const BANKS: usize, const BYTES: usize>
where
    L: PanelLayout,
{
    frame: &'a FrameBuffer<PLANES, BANKS, BYTES>,
    correction: Correction,
    _layout: PhantomData<L>,
}

impl<'a, L, const PLANES: usize, const BANKS: usize, const BYTES: usize>
    PixelEncoder<'a, L, PLANES, BANKS, BYTES>
where
    L: PanelLayout,
{
    /// Create an encoder writing into `frame` without colour correction.
    #[must_use]
    pub fn new(frame: &'a FrameBuffer<PLANES, BANKS, BYTES>) -> Self {
        const {
            assert!(L::BANKS == BANKS, "layout and frame buffer disagree on bank count");
            assert!(L::BYTES_PER_BANK == BYTES, "layout and frame buffer disagree on bank size");
        }
        Self {
            frame,
            correction: Correction::Linear,
            _layout: PhantomData,
        }
    }

    /// Create an encoder with the given colour correction.
    #[must_use]
    pub fn with_correction(frame: &'a FrameBuffer<PLANES, BANKS, BYTES>, correction: Correction) -> Self {
        let mut encoder = Self::new(frame);
        encoder.correction = correction;
        encoder
    }

    /// Colour correction applied to subsequent writes.
    #[must_use]
    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Change the colour correction. Pixels already written keep their value.
    pub fn set_correction(&mut self, correction: Correction) {
        self.correction = correction;
    }

    /// The frame buffer this encoder writes to.
    #[must_use]
    pub fn frame(&self) -> &'a FrameBuffer<PLANES, BANKS, BYTES> {
        self.frame
    }

    /// Set a pixel. Off-display coordinates are ignored.
    pub fn set_pixel(&self, p: Point, color: Color) {
        if let Some(location) = L::try_locate(p.x, p.y) {
            self.encode(location, color);
        }
    }

    /// Clear the whole buffer to black, or white when `to_white` is set.
    pub fn clear_to(&self, to_white: bool) {
        self.frame.clear(to_white);
    }

    /// Read a pixel back from the bit-planes.
    ///
    /// Only the top `PLANES` bits of each channel survive, and they are the
    /// corrected value when gamma correction was active at write time.
    #[must_use]
    pub fn pixel(&self, p: Point) -> Option<Color> {
        let location = L::try_locate(p.x, p.y)?;
        let mut rgb = [0u8; 3];
        for plane in 0..PLANES {
            let bit = 0x80 >> plane;
            for (channel, value) in rgb.iter_mut().enumerate() {
                // stored blue, green, red
                let offset = location.offset + (2 - channel) * LEDS_PER_CHIP;
                if self.frame.byte(plane, location.bank, offset) & location.mask != 0 {
                    *value |= bit;
                }
            }
        }
        Some(Color::new(rgb[0], rgb[1], rgb[2]))
    }

    fn encode(&self, location: Location, color: Color) {
        let channels = [
            self.correction.apply(color.b()),
            self.correction.apply(color.g()),
            self.correction.apply(color.r()),
        ];
        for plane in 0..PLANES {
            let bit = 0x80 >> plane;
            let mut offset = location.offset;
            for value in channels {
                self.frame
                    .write_bit(plane, location.bank, offset, location.mask, value & bit != 0);
                offset += LEDS_PER_CHIP;
            }
        }
    }
}

impl<L, const PLANES: usize, const BANKS: usize, const BYTES: usize> OriginDimensions
    for PixelEncoder<'_, L, PLANES, BANKS, BYTES>
where
    L: PanelLayout,
{
    fn size(&self) -> Size {
        Size::new(L::WIDTH as u32, L::HEIGHT as u32)
    }
}

impl<L, const PLANES: usize, const BANKS: usize, const BYTES: usize> DrawTarget
    for PixelEncoder<'_, L, PLANES, BANKS, BYTES>
where
    L: PanelLayout,
{
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        // black and white are a plain fill, anything else goes pixel by pixel
        if color == Color::BLACK {
            self.frame.clear(false);
            Ok(())
        } else if color == Color::WHITE {
            self.frame.clear(true);
            Ok(())
        } else {
            self.fill_solid(&self.bounding_box(), color)
        }
    }
}

impl<L, const PLANES: usize, const BANKS: usize, const BYTES: usize> core::fmt::Debug
    for PixelEncoder<'_, L, PLANES, BANKS, BYTES>
where
    L: PanelLayout,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelEncoder")
            .field("width", &L::WIDTH)
            .field("height", &L::HEIGHT)
            .field("correction", &self.correction)
            .field("frame", self.frame)
            .finish()
    }
}
