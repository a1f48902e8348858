//! Device configuration parameters
//!
//! All tunable parameters for the distance monitor.  Every duration is in
//! scheduler ticks (milliseconds).  The core owns no persisted format; the
//! application hands a validated `DeviceConfig` to [`Device::new`].
//!
//! [`Device::new`]: crate::app::service::Device::new

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::scheduler::Tick;

/// Smallest alarm distance the ranging sensor can resolve (cm).
pub const ALARM_DISTANCE_MIN_CM: u16 = 2;
/// Largest alarm distance the ranging sensor can resolve (cm).
pub const ALARM_DISTANCE_MAX_CM: u16 = 400;

/// Per-step timings of the ranging protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangingTiming {
    /// Sensor power-up settle before the first measurement may start.
    pub startup_delay: Tick,
    /// Bounded wait for the echo payload, counted from the trigger write.
    pub echo_timeout: Tick,
    /// Re-poll period while waiting for the echo payload.
    pub poll_interval: Tick,
    /// Physical recovery time between the end of one cycle and the next trigger.
    pub recovery_time: Tick,
}

impl Default for RangingTiming {
    fn default() -> Self {
        Self {
            startup_delay: 3000,
            echo_timeout: 100,
            poll_interval: 10,
            recovery_time: 60,
        }
    }
}

/// Core device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Ranging ---
    /// Automatic measurement period; `None` parks the interval task.
    pub ranging_interval: Option<Tick>,
    pub ranging_timing: RangingTiming,

    // --- Distance publication ---
    /// Minimum change (mm) that alone justifies a publish.
    pub distance_threshold_mm: u16,
    /// Longest silence before a distance publish is forced.
    pub distance_max_silence: Tick,

    // --- Temperature ---
    pub temperature_interval: Option<Tick>,
    /// Minimum change (°C) that alone justifies a publish.
    pub temperature_threshold_c: f32,
    pub temperature_max_silence: Tick,

    // --- Alarm ---
    /// Alarm distance at boot and after a button hold (cm).
    pub alarm_default_cm: u16,
    /// Change applied per encoder detent (cm).
    pub alarm_step_cm: u16,
    /// How long the alarm indicator stays lit after a trip.
    pub alarm_indicator_pulse: Tick,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Ranging
            ranging_interval: Some(1000), // 1 Hz
            ranging_timing: RangingTiming::default(),

            // Distance publication
            distance_threshold_mm: 20,
            distance_max_silence: 300_000, // 5 min

            // Temperature
            temperature_interval: Some(10_000),
            temperature_threshold_c: 0.5,
            temperature_max_silence: 300_000,

            // Alarm
            alarm_default_cm: 50,
            alarm_step_cm: 5,
            alarm_indicator_pulse: 2000,
        }
    }
}

impl DeviceConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.ranging_timing;
        if t.echo_timeout == 0 {
            return Err(ConfigError::ValidationFailed("echo_timeout must be > 0"));
        }
        if t.poll_interval == 0 || t.poll_interval > t.echo_timeout {
            return Err(ConfigError::ValidationFailed(
                "poll_interval must be in 1..=echo_timeout",
            ));
        }
        if self.ranging_interval == Some(0) || self.temperature_interval == Some(0) {
            return Err(ConfigError::ValidationFailed("update interval must be > 0"));
        }
        if self.distance_max_silence == 0 || self.temperature_max_silence == 0 {
            return Err(ConfigError::ValidationFailed("max silence must be > 0"));
        }
        if !self.temperature_threshold_c.is_finite() || self.temperature_threshold_c < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "temperature_threshold_c must be finite and >= 0",
            ));
        }
        if !(ALARM_DISTANCE_MIN_CM..=ALARM_DISTANCE_MAX_CM).contains(&self.alarm_default_cm) {
            return Err(ConfigError::ValidationFailed(
                "alarm_default_cm outside sensor range",
            ));
        }
        if self.alarm_step_cm == 0 {
            return Err(ConfigError::ValidationFailed("alarm_step_cm must be > 0"));
        }
        Ok(())
    }
}
