//! Alarm indicator LED.
//!
//! A single GPIO-driven LED lit when the proximity alarm trips and
//! switched off by a scheduler task after the configured pulse.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: on ESP-IDF the pin is
//! an `esp_idf_hal::gpio::PinDriver`; on host/test any mock pin works.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct AlarmIndicator<P> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> AlarmIndicator<P> {
    /// Take the pin and drive it low.
    pub fn new(mut pin: P) -> Self {
        if let Err(e) = pin.set_low() {
            warn!("Indicator: initial set_low failed: {:?}", e);
        }
        Self { pin, lit: false }
    }

    pub fn on(&mut self) {
        match self.pin.set_high() {
            Ok(()) => self.lit = true,
            Err(e) => warn!("Indicator: set_high failed: {:?}", e),
        }
    }

    pub fn off(&mut self) {
        match self.pin.set_low() {
            Ok(()) => self.lit = false,
            Err(e) => warn!("Indicator: set_low failed: {:?}", e),
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
