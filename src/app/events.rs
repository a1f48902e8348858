//! Measurement events and outbound telemetry values.
//!
//! Drivers emit [`RangingEvent`]s and [`TemperatureEvent`]s to their
//! handler.  Handlers turn accepted samples into [`Publication`]s, which
//! the application context forwards to the [`RadioPort`].
//!
//! [`RadioPort`]: super::ports::RadioPort

use serde::Serialize;

use crate::error::{RangingError, TemperatureError};

/// Radio topics published by the distance monitor.
pub mod topic {
    pub const DISTANCE: &str = "distance/mm";
    pub const ALARM: &str = "distance/alarm";
    pub const RANGING_ERROR: &str = "distance/error";
    pub const TEMPERATURE: &str = "thermometer/celsius";
}

/// Outcome of one ranging measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingEvent {
    Update(u16),
    Error(RangingError),
}

/// Outcome of one temperature read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureEvent {
    Update(f32),
    Error(TemperatureError),
}

/// Payload carried by a radio publish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Int(i32),
    Float(f32),
    Bool(bool),
}

/// A value staged for the radio link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Publication {
    pub topic: &'static str,
    pub value: TelemetryValue,
}

impl Publication {
    pub fn new(topic: &'static str, value: TelemetryValue) -> Self {
        Self { topic, value }
    }

    /// True for publications produced by the proximity alarm path.
    pub fn is_alarm(&self) -> bool {
        self.topic == topic::ALARM
    }
}
