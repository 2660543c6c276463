//! Hardware capabilities the refresh engine needs from the board.
//!
//! The sequencing in [`crate::scheduler`] and [`crate::control`] only ever
//! talks to one parallel output register and one periodic timer. Implement
//! these two traits for the target's GPIO block and hardware timer, typically
//! as thin wrappers over the set/clear/write registers, e.g. on an ESP32:
//!
//! ```rust,ignore
//! impl OutputPort for Esp32Gpio {
//!     fn write(&mut self, word: u32) { GPIO.out().write(|w| unsafe { w.bits(word) }) }
//!     fn set_bits(&mut self, mask: u32) { GPIO.out_w1ts().write(|w| unsafe { w.bits(mask) }) }
//!     fn clear_bits(&mut self, mask: u32) { GPIO.out_w1tc().write(|w| unsafe { w.bits(mask) }) }
//!     fn read(&self) -> u32 { GPIO.out().read().bits() }
//!     fn enable_outputs(&mut self, mask: u32) { GPIO.enable_w1ts().write(|w| unsafe { w.bits(mask) }) }
//! }
//! ```
//!
//! Every method is called from the refresh interrupt except
//! [`OutputPort::enable_outputs`] and [`RefreshTimer::arm`], so implementations
//! must not block or allocate.

/// A 32-bit parallel output register.
pub trait OutputPort {
    /// Configure the lines in `mask` as push-pull outputs.
    fn enable_outputs(&mut self, mask: u32);

    /// Drive the whole register to `word`.
    fn write(&mut self, word: u32);

    /// Drive the lines in `mask` high, leaving the others alone.
    fn set_bits(&mut self, mask: u32);

    /// Drive the lines in `mask` low, leaving the others alone.
    fn clear_bits(&mut self, mask: u32);

    /// The levels currently driven.
    fn read(&self) -> u32;
}

/// A periodic timer whose interrupt calls [`crate::driver::Driver::on_tick`].
pub trait RefreshTimer {
    /// Set the period and attach the interrupt, without starting.
    fn arm(&mut self, period_us: u32);

    /// Start firing every period.
    fn start(&mut self);

    /// Stop firing.
    fn stop(&mut self);

    /// Restart the current period from now.
    fn restart(&mut self);
}

impl<P: OutputPort + ?Sized> OutputPort for &mut P {
    fn enable_outputs(&mut self, mask: u32) {
        (**self).enable_outputs(mask);
    }

    fn write(&mut self, word: u32) {
        (**self).write(word);
    }

    fn set_bits(&mut self, mask: u32) {
        (**self).set_bits(mask);
    }

    fn clear_bits(&mut self, mask: u32) {
        (**self).clear_bits(mask);
    }

    fn read(&self) -> u32 {
        (**self).read()
    }
}

impl<T: RefreshTimer + ?Sized> RefreshTimer for &mut T {
    fn arm(&mut self, period_us: u32) {
        (**self).arm(period_us);
    }

    fn start(&mut self) {
        (**self).start();
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn restart(&mut self) {
        (**self).restart();
    }
}
