//! Event handlers that turn measurements into radio publications.
//!
//! ```text
//!  RangingDriver ──▶ DistanceMonitor ──┬─▶ alarm path (ungated) ──┐
//!                                      └─▶ PublicationGate<u16> ──┼─▶ Outbox ──▶ RadioPort
//!  Thermometer   ──▶ TemperatureMonitor ─▶ PublicationGate<f32> ──┘
//! ```
//!
//! Handlers run inside a driver's task body, where the radio is out of
//! reach, so they stage publications in an [`Outbox`].  The application
//! context flushes it right after the task returns.

use heapless::Deque;
use log::{info, warn};

use super::alarm::AlarmState;
use super::events::{Publication, TelemetryValue, topic};
use super::ports::{RangingEventHandler, TemperatureEventHandler};
use super::publication::PublicationGate;
use crate::config::DeviceConfig;
use crate::error::{RangingError, TemperatureError};
use crate::scheduler::Tick;

const OUTBOX_CAP: usize = 8;

// ───────────────────────────────────────────────────────────────
// Outbox
// ───────────────────────────────────────────────────────────────

/// Fixed-capacity FIFO of publications awaiting the radio.
#[derive(Default)]
pub struct Outbox {
    queue: Deque<Publication, OUTBOX_CAP>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a publication.  When full, the oldest entry is dropped.
    pub fn stage(&mut self, publication: Publication) {
        if self.queue.is_full() {
            if let Some(dropped) = self.queue.pop_front() {
                warn!("Outbox: full, dropped '{}'", dropped.topic);
            }
        }
        // Cannot fail: a slot was just freed if needed.
        let _ = self.queue.push_back(publication);
    }

    pub fn pop(&mut self) -> Option<Publication> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Distance
// ───────────────────────────────────────────────────────────────

pub struct DistanceMonitor {
    gate: PublicationGate<u16>,
    alarm: AlarmState,
    alarm_default_cm: u16,
    outbox: Outbox,
    last_distance_mm: Option<u16>,
    error_count: u32,
    alarm_trips: u32,
}

impl DistanceMonitor {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            gate: PublicationGate::new(config.distance_threshold_mm, config.distance_max_silence),
            alarm: AlarmState::new(config.alarm_default_cm),
            alarm_default_cm: config.alarm_default_cm,
            outbox: Outbox::new(),
            last_distance_mm: None,
            error_count: 0,
            alarm_trips: 0,
        }
    }

    pub fn alarm(&self) -> &AlarmState {
        &self.alarm
    }

    pub fn alarm_mut(&mut self) -> &mut AlarmState {
        &mut self.alarm
    }

    /// Restore the boot-time alarm distance.
    pub fn reset_alarm_distance(&mut self) {
        self.alarm.set_alarm_distance_cm(self.alarm_default_cm);
    }

    pub fn gate(&self) -> &PublicationGate<u16> {
        &self.gate
    }

    /// Latest measured distance, published or not (for the display).
    pub fn last_distance_mm(&self) -> Option<u16> {
        self.last_distance_mm
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn alarm_trips(&self) -> u32 {
        self.alarm_trips
    }

    pub fn outbox_mut(&mut self) -> &mut Outbox {
        &mut self.outbox
    }
}

impl RangingEventHandler for DistanceMonitor {
    fn on_update(&mut self, distance_mm: u16, now: Tick) {
        self.last_distance_mm = Some(distance_mm);
        let value = TelemetryValue::Int(i32::from(distance_mm));

        if self.alarm.trips(distance_mm) {
            self.alarm_trips = self.alarm_trips.saturating_add(1);
            info!(
                "Alarm: {} mm <= {} cm",
                distance_mm,
                self.alarm.alarm_distance_cm()
            );
            self.outbox.stage(Publication::new(topic::ALARM, value));
        }

        if self.gate.publish_if_needed(distance_mm, now) {
            self.outbox.stage(Publication::new(topic::DISTANCE, value));
        }
    }

    fn on_error(&mut self, error: RangingError, _now: Tick) {
        self.error_count = self.error_count.saturating_add(1);
        warn!("Distance: sensor error #{} ({})", self.error_count, error);
        self.outbox.stage(Publication::new(
            topic::RANGING_ERROR,
            TelemetryValue::Int(self.error_count as i32),
        ));
    }
}

// ───────────────────────────────────────────────────────────────
// Temperature
// ───────────────────────────────────────────────────────────────

pub struct TemperatureMonitor {
    gate: PublicationGate<f32>,
    outbox: Outbox,
    last_celsius: Option<f32>,
}

impl TemperatureMonitor {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            gate: PublicationGate::new(
                config.temperature_threshold_c,
                config.temperature_max_silence,
            ),
            outbox: Outbox::new(),
            last_celsius: None,
        }
    }

    pub fn last_celsius(&self) -> Option<f32> {
        self.last_celsius
    }

    pub fn gate(&self) -> &PublicationGate<f32> {
        &self.gate
    }

    pub fn outbox_mut(&mut self) -> &mut Outbox {
        &mut self.outbox
    }
}

impl TemperatureEventHandler for TemperatureMonitor {
    fn on_update(&mut self, celsius: f32, now: Tick) {
        self.last_celsius = Some(celsius);
        if self.gate.publish_if_needed(celsius, now) {
            self.outbox
                .stage(Publication::new(topic::TEMPERATURE, TelemetryValue::Float(celsius)));
        }
    }

    fn on_error(&mut self, error: TemperatureError, _now: Tick) {
        // Nothing is published; the deadline forces a publish after recovery.
        warn!("Temperature: sensor error ({})", error);
    }
}
