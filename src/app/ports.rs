//! Port traits: the boundary between the measurement core and the outside world.
//!
//! ```text
//!   SerialChannel ──▶ RangingDriver ──▶ RangingEventHandler ──▶ RadioPort
//!   I2c           ──▶ Thermometer   ──▶ TemperatureEventHandler ─┘
//! ```
//!
//! Drivers own the hardware channel they are bound to and report through
//! exactly one handler.  Handlers decide what is published; adapters on
//! the far side of [`RadioPort`] decide how it travels.

use crate::app::events::{RangingEvent, TelemetryValue, TemperatureEvent};
use crate::error::{RangingError, TemperatureError};
use crate::scheduler::Tick;

// ───────────────────────────────────────────────────────────────
// Serial channel (driven adapter: ranging sensor ⇄ driver)
// ───────────────────────────────────────────────────────────────

/// Raw, non-blocking byte transport used to trigger the ranging sensor
/// and receive its echo payload.
///
/// Implementations backed by an interrupt-driven UART must only stage
/// received bytes in the ISR; the driver drains them from task context.
pub trait SerialChannel {
    /// Associated error type for communication errors.
    type Error: core::fmt::Debug;

    /// Read one received byte, or `WouldBlock` if none is buffered.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Queue one byte for transmission, or `WouldBlock` if the TX buffer is full.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&self) -> usize;

    /// Drop every buffered received byte.
    fn clear(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event handlers (driver → application)
// ───────────────────────────────────────────────────────────────

/// The single sink a [`RangingDriver`](crate::sensors::ranging::RangingDriver)
/// reports to.  Called synchronously from the measure task's final step.
pub trait RangingEventHandler {
    fn on_update(&mut self, distance_mm: u16, now: Tick);

    fn on_error(&mut self, error: RangingError, now: Tick);

    fn on_event(&mut self, event: RangingEvent, now: Tick) {
        match event {
            RangingEvent::Update(distance_mm) => self.on_update(distance_mm, now),
            RangingEvent::Error(error) => self.on_error(error, now),
        }
    }
}

/// The single sink a [`Thermometer`](crate::sensors::temperature::Thermometer)
/// reports to.
pub trait TemperatureEventHandler {
    fn on_update(&mut self, celsius: f32, now: Tick);

    fn on_error(&mut self, error: TemperatureError, now: Tick);

    fn on_event(&mut self, event: TemperatureEvent, now: Tick) {
        match event {
            TemperatureEvent::Update(celsius) => self.on_update(celsius, now),
            TemperatureEvent::Error(error) => self.on_error(error, now),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: application → radio link)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget publish over the radio link.  No acknowledgement is
/// modelled; a lost message is recovered by the next forced publish.
pub trait RadioPort {
    fn publish(&mut self, topic: &str, value: TelemetryValue);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
