//! Multiplexed refresh engine for LED panels built from MBI5034 constant-current
//! shift-register drivers.
//!
//! ## How MBI5034 Panels Work
//!
//! Each panel is a grid of LEDs whose cathodes are sunk by 16-channel
//! constant-current driver chips. The chips are daisy chained: every clock edge
//! pushes one bit per data line one position further down the chain, and a
//! latch pulse copies the whole shift register into the output stage.
//!
//! ### Signal names
//! - **D1..D8** – Serial data, two lines per panel (upper and lower half of a panel)
//! - **CLK** – Shift clock shared by every chip in the chain (or one per chain segment)
//! - **LAT** – Latch; transfers the shift register to the outputs. Held high during the
//!   last clocks of a control word it writes the chip configuration register instead
//! - **OE** – Output-Enable (active LOW): LEDs are lit while OE is LOW and blanked when it is HIGH
//! - **A0 A1** – Bank select: which of the four scan groups is connected to the chip outputs
//!
//! ### Bank scanning
//! 1. Blank the panel (OE HIGH).
//! 2. Stream one bank's worth of bits through all data lines in parallel.
//! 3. Drive the new bank address and pulse LAT.
//! 4. Un-blank (OE LOW) and keep the bank lit until the next timer tick.
//!
//! All of this runs from a single periodic timer interrupt, see [`driver::Driver::on_tick`].
//!
//! ### Brightness and colour depth (Binary Code Modulation)
//! Colour depth comes from **Binary Code Modulation (BCM)**: the frame buffer
//! holds one bit-plane per significance bit, and the most significant plane is
//! displayed twice as long as the next one, and so on down to the least
//! significant plane. With `PLANES` planes this gives `2^PLANES` intensity levels
//! per channel. The overall current (the analog brightness) is a separate
//! 6-bit gain code written into every chip's configuration register, see
//! [`control`].
//!
//! ## Crate Layout
//!
//! - [`pins`] – pin assignment, validated at compile time
//! - [`mapping`] – 256 entry table turning a buffer byte into an output word
//! - [`framebuffer`] – `[plane][bank][byte]` bit-plane store shared with the interrupt
//! - [`layout`] – panel wiring: pixel coordinate to `(bank, byte, bit)`
//! - [`encoder`] – pixel writes and the `embedded-graphics` drawing target
//! - [`gamma`] – optional gamma correction
//! - [`port`] – the GPIO and timer capabilities the board has to provide
//! - [`scheduler`] – bank/plane cursor and the per-tick output sequence
//! - [`control`] – gain code and configuration register shift-out
//! - [`driver`] – lifecycle: initialize, set brightness, start, tick
//!
//! ## Available Feature Flags
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public types and emits `defmt` records
//! from the non-interrupt lifecycle calls. The refresh interrupt never logs.
//!
//! ```toml
//! [dependencies]
//! mbi5034-panel = { version = "0.1.0", features = ["defmt"] }
//! ```
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use embedded_graphics::pixelcolor::Rgb888;

pub mod control;
pub mod driver;
pub mod encoder;
pub mod framebuffer;
pub mod gamma;
pub mod layout;
pub mod mapping;
pub mod pins;
pub mod port;
pub mod scheduler;

/// Color type used by the pixel encoder
pub type Color = Rgb888;

/// Number of parallel data lines; one buffer byte holds one bit per line.
pub const DATA_LINES: usize = 8;

/// Number of bank address lines.
pub const ADDRESS_LINES: usize = 2;

/// Maximum number of address-selectable banks.
pub const MAX_BANKS: usize = 1 << ADDRESS_LINES;

/// Outputs per MBI5034 chip. Also the stride between the blue, green and red
/// bytes of one column.
pub const LEDS_PER_CHIP: usize = 16;

/// Highest supported colour depth.
pub const MAX_PLANES: usize = 6;

/// Computes the number of chips along one clock segment of the chain.
///
/// # Arguments
///
/// * `bytes` - Bytes per bank and plane
/// * `clocks` - Number of clock segments the chain is split into
#[must_use]
pub const fn compute_chips_per_line(bytes: usize, clocks: usize) -> usize {
    bytes / LEDS_PER_CHIP / clocks
}

/// Computes the refresh timer period.
///
/// The period halves with every extra plane so that one full refresh cycle
/// takes roughly `base_interval_us` regardless of colour depth.
///
/// # Arguments
///
/// * `base_interval_us` - Target time for a full refresh in microseconds
/// * `planes` - Colour depth
#[must_use]
pub const fn compute_tick_interval_us(base_interval_us: u32, planes: usize) -> u32 {
    base_interval_us >> planes
}

/// Computes how many timer ticks plane `plane` stays lit.
#[must_use]
pub const fn compute_plane_dwell(planes: usize, plane: usize) -> usize {
    1 << (planes - 1 - plane)
}

/// Computes the number of timer ticks in one full refresh cycle, every bank
/// shown once for every plane.
#[must_use]
pub const fn compute_cycle_ticks(planes: usize, banks: usize) -> usize {
    banks * ((1 << planes) - 1)
}
