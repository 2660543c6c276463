//! Refresh driver lifecycle.
//!
//! [`Driver`] ties the pieces together: it owns the [`OutputPort`] and the
//! [`RefreshTimer`], keeps the [`ChannelMap`] and the scheduler [`Cursor`], and
//! borrows the [`FrameBuffer`] that drawing code writes through a
//! [`crate::encoder::PixelEncoder`].
//!
//! ```text
//! Idle --initialize--> Initialized --start--> Running
//!                           ^                    |
//!                           +-------stop---------+
//! ```
//!
//! [`Driver::on_tick`] is meant to be called from the timer interrupt. The
//! driver is usually kept in a `critical_section::Mutex<RefCell<..>>` or an
//! RTIC resource so that the interrupt and the main loop can both reach it;
//! the frame buffer lives in a `static` so drawing never needs that lock.
//!
//! # Example
//! ```rust,ignore
//! static FRAME: FrameBuffer<4, 4, 384> = FrameBuffer::new();
//!
//! let mut driver: Driver<_, _, 4, 4, 384, 1> =
//!     Driver::new(gpio, timer, Pins::ESP32_DEVKITC, &FRAME, Config::default());
//! driver.initialize();
//! driver.set_brightness(100);
//! driver.start();
//!
//! // in the timer interrupt
//! driver.on_tick();
//! ```

use crate::control::{write_control, ControlRegister};
use crate::framebuffer::FrameBuffer;
use crate::mapping::ChannelMap;
use crate::pins::Pins;
use crate::port::{OutputPort, RefreshTimer};
use crate::scheduler::{refresh_slot, Cursor};
use crate::{compute_chips_per_line, compute_tick_interval_us};

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    base_interval_us: u32,
}

impl Config {
    /// Default duration of a full refresh cycle in microseconds.
    pub const DEFAULT_BASE_INTERVAL_US: u32 = 6000;

    /// Configuration with the default refresh interval.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_interval_us: Self::DEFAULT_BASE_INTERVAL_US,
        }
    }

    /// Set the target duration of a full refresh cycle.
    #[must_use]
    pub const fn with_base_interval_us(mut self, base_interval_us: u32) -> Self {
        self.base_interval_us = base_interval_us;
        self
    }

    /// Target duration of a full refresh cycle.
    #[must_use]
    pub const fn base_interval_us(&self) -> u32 {
        self.base_interval_us
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a [`Driver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Lines not configured yet.
    Idle,
    /// Lines configured and timer armed, refresh not running.
    Initialized,
    /// Refresh timer running.
    Running,
}

/// Interrupt-driven refresh driver for a chain of MBI5034 panels.
///
/// # Type Parameters
/// - `P`: Output register
/// - `T`: Refresh timer
/// - `PLANES`, `BANKS`, `BYTES`: Frame buffer shape
/// - `CLOCKS`: Number of clock segments the chain is split into, must divide
///   `BYTES` (checked at compile time)
pub struct Driver<
    'a,
    P,
    T,
    const PLANES: usize,
    const BANKS: usize,
    const BYTES: usize,
    const CLOCKS: usize,
> where
    P: OutputPort,
    T: RefreshTimer,
{
    port: P,
    timer: T,
    pins: Pins<CLOCKS>,
    map: ChannelMap,
    cursor: Cursor<PLANES, BANKS>,
    config: Config,
    state: State,
    frame: &'a FrameBuffer<PLANES, BANKS, BYTES>,
}

impl<'a, P, T, const PLANES: usize, const BANKS: usize, const BYTES: usize, const CLOCKS: usize>
    Driver<'a, P, T, PLANES, BANKS, BYTES, CLOCKS>
where
    P: OutputPort,
    T: RefreshTimer,
{
    /// Chips along one clock segment.
    pub const CHIPS_PER_LINE: usize = compute_chips_per_line(BYTES, CLOCKS);

    /// Create a driver. Touches no hardware.
    #[must_use]
    pub fn new(
        port: P,
        timer: T,
        pins: Pins<CLOCKS>,
        frame: &'a FrameBuffer<PLANES, BANKS, BYTES>,
        config: Config,
    ) -> Self {
        const {
            assert!(BYTES % CLOCKS == 0, "bank size must split evenly across clock segments");
        }
        Self {
            port,
            timer,
            map: ChannelMap::from_pins(&pins),
            pins,
            cursor: Cursor::new(),
            config,
            state: State::Idle,
            frame,
        }
    }

    /// Configure the lines and arm the refresh timer.
    ///
    /// Sets every managed line to output, output blanked, latch and clocks
    /// low, and arms the timer at `base_interval_us >> PLANES` without
    /// starting it. Does nothing once initialized.
    pub fn initialize(&mut self) {
        if self.state != State::Idle {
            return;
        }
        let period_us = compute_tick_interval_us(self.config.base_interval_us, PLANES);

        self.port.enable_outputs(self.pins.managed_mask());
        self.port.set_bits(self.pins.output_enable_mask());
        self.port
            .clear_bits(self.pins.latch_mask() | self.pins.clock_mask());
        self.timer.arm(period_us);
        self.state = State::Initialized;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "initialized: {} planes, {} banks, {} bytes, tick {}us",
            PLANES,
            BANKS,
            BYTES,
            period_us
        );
    }

    /// Write the current gain for a brightness percentage (0 to 200) into
    /// every chip, see [`crate::control::gain_code`].
    ///
    /// Blocks for `BANKS × chips × 16` clocks. If refresh is running it is
    /// stopped for the write and started again afterwards.
    pub fn set_brightness(&mut self, percent: u16) {
        self.initialize();
        let running = self.state == State::Running;
        if running {
            self.timer.stop();
        }

        let register = ControlRegister::from_percent(percent);
        write_control(
            &mut self.port,
            &self.pins,
            BANKS,
            Self::CHIPS_PER_LINE,
            register,
        );

        #[cfg(feature = "defmt")]
        defmt::info!("brightness {}% (gain {=u8:#04x})", percent, register.gain());

        if running {
            self.cursor.reset();
            self.timer.start();
        }
    }

    /// Start refreshing from bank 0, plane 0.
    pub fn start(&mut self) {
        self.initialize();
        if self.state == State::Running {
            return;
        }
        self.cursor.reset();
        self.timer.start();
        self.state = State::Running;

        #[cfg(feature = "defmt")]
        defmt::info!("refresh started");
    }

    /// Stop refreshing and blank the panel.
    pub fn stop(&mut self) {
        if self.state != State::Running {
            return;
        }
        self.timer.stop();
        self.port.set_bits(self.pins.output_enable_mask());
        self.state = State::Initialized;

        #[cfg(feature = "defmt")]
        defmt::info!("refresh stopped");
    }

    /// Timer interrupt handler.
    ///
    /// Counts the tick and, when the lit slot's dwell is over, streams the
    /// next slot and restarts the timer. Does nothing unless running.
    #[inline]
    pub fn on_tick(&mut self) {
        if self.state != State::Running {
            return;
        }
        if let Some(slot) = self.cursor.tick() {
            refresh_slot(&mut self.port, &self.pins, &self.map, self.frame, slot);
            self.timer.restart();
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// The frame buffer being refreshed.
    #[must_use]
    pub fn frame(&self) -> &'a FrameBuffer<PLANES, BANKS, BYTES> {
        self.frame
    }

    /// The scheduler cursor.
    #[must_use]
    pub fn cursor(&self) -> &Cursor<PLANES, BANKS> {
        &self.cursor
    }

    /// The pin assignment.
    #[must_use]
    pub fn pins(&self) -> &Pins<CLOCKS> {
        &self.pins
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop refreshing and hand back the port and the timer.
    pub fn release(mut self) -> (P, T) {
        self.stop();
        (self.port, self.timer)
    }
}

impl<P, T, const PLANES: usize, const BANKS: usize, const BYTES: usize, const CLOCKS: usize>
    core::fmt::Debug for Driver<'_, P, T, PLANES, BANKS, BYTES, CLOCKS>
where
    P: OutputPort,
    T: RefreshTimer,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Driver")
            .field("pins", &self.pins)
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
