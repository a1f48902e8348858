//! Proximity alarm state.
//!
//! Independent of the publication gate: while armed, every ranging sample
//! at or below the alarm distance trips the alarm.  There is no rate
//! limiting on this path.  Arming and threshold changes come from the
//! button and rotary encoder; the ranging path only reads them.

use log::info;

use crate::config::{ALARM_DISTANCE_MAX_CM, ALARM_DISTANCE_MIN_CM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmState {
    armed: bool,
    /// Trip distance in centimetres, always inside the sensor range.
    alarm_distance_cm: u16,
}

impl AlarmState {
    /// Disarmed, with `default_cm` clamped into the sensor range.
    pub fn new(default_cm: u16) -> Self {
        Self {
            armed: false,
            alarm_distance_cm: clamp_cm(default_cm as i32),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn alarm_distance_cm(&self) -> u16 {
        self.alarm_distance_cm
    }

    pub fn set_armed(&mut self, armed: bool) {
        if self.armed != armed {
            info!("Alarm: {}", if armed { "armed" } else { "disarmed" });
        }
        self.armed = armed;
    }

    pub fn toggle_armed(&mut self) {
        self.set_armed(!self.armed);
    }

    /// Set the trip distance, clamped to [2, 400] cm.
    pub fn set_alarm_distance_cm(&mut self, cm: u16) {
        self.alarm_distance_cm = clamp_cm(cm as i32);
        info!("Alarm: distance set to {} cm", self.alarm_distance_cm);
    }

    /// Move the trip distance by `delta_cm` (encoder detents), clamped.
    pub fn adjust_alarm_distance(&mut self, delta_cm: i32) {
        let cm = clamp_cm(self.alarm_distance_cm as i32 + delta_cm);
        self.set_alarm_distance_cm(cm);
    }

    /// True when a sample of `distance_mm` must raise the alarm.
    pub fn trips(&self, distance_mm: u16) -> bool {
        self.armed && u32::from(distance_mm) <= u32::from(self.alarm_distance_cm) * 10
    }
}

fn clamp_cm(cm: i32) -> u16 {
    cm.clamp(ALARM_DISTANCE_MIN_CM as i32, ALARM_DISTANCE_MAX_CM as i32) as u16
}
