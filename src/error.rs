//! Unified error types for the rangefinder firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the application context's error handling uniform.  All variants are
//! `Copy` so they can be handed to event handlers and counted in
//! diagnostics without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A ranging measurement cycle failed.
    Ranging(RangingError),
    /// A temperature measurement failed.
    Temperature(TemperatureError),
    /// The scheduler task table is full.
    SchedulerFull,
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranging(e) => write!(f, "ranging: {e}"),
            Self::Temperature(e) => write!(f, "temperature: {e}"),
            Self::SchedulerFull => write!(f, "scheduler task table full"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Ranging errors
// ---------------------------------------------------------------------------

/// Causes of a failed ranging cycle.  Every one of them is recoverable:
/// the driver reports it once and returns to `Initialize` by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingError {
    /// No echo payload arrived before the AwaitingEcho deadline.
    EchoTimeout,
    /// The echo payload failed validation or the range check.
    MalformedReading,
    /// The measure task ran in a state that cannot receive it.
    IllegalState,
    /// The serial channel reported a read or write error.
    ChannelFault,
}

impl fmt::Display for RangingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EchoTimeout => write!(f, "echo timeout"),
            Self::MalformedReading => write!(f, "malformed reading"),
            Self::IllegalState => write!(f, "illegal state"),
            Self::ChannelFault => write!(f, "serial channel fault"),
        }
    }
}

impl From<RangingError> for Error {
    fn from(e: RangingError) -> Self {
        Self::Ranging(e)
    }
}

// ---------------------------------------------------------------------------
// Temperature errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureError {
    /// I2C transaction failed.
    Bus,
    /// Reading is outside the sensor's physical range.
    OutOfRange,
}

impl fmt::Display for TemperatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<TemperatureError> for Error {
    fn from(e: TemperatureError) -> Self {
        Self::Temperature(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
