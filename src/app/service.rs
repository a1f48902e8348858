//! Application context: owns every driver, handler and the scheduler.
//!
//! [`Device`] replaces process-wide singletons: task bodies receive
//! `&mut` access to exactly the driver they belong to plus the
//! scheduler, and staged publications are forwarded to the radio after
//! each task returns.
//!
//! ```text
//!  SerialChannel ──▶ ┌──────────────────────────────┐ ──▶ RadioPort
//!  I2c           ──▶ │            Device            │ ──▶ OutputPin (alarm LED)
//!  InputQueue    ──▶ │  Scheduler · Ranging · Temp  │
//!                    └──────────────────────────────┘
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::config::DeviceConfig;
use crate::drivers::indicator::AlarmIndicator;
use crate::error::Result;
use crate::events::{InputEvent, InputQueue};
use crate::scheduler::{MAX_DISPATCH_PER_PASS, Planner, Scheduler, TICK_INFINITY, TaskId, Tick};
use crate::sensors::ranging::{RangingDriver, RangingTask, UpdateInterval};
use crate::sensors::temperature::{TMP112_ADDRESS, Thermometer, ThermometerTask};

use super::alarm::AlarmState;
use super::monitor::{DistanceMonitor, Outbox, TemperatureMonitor};
use super::ports::{RadioPort, SerialChannel};

/// Every task the device registers with its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTask {
    Ranging(RangingTask),
    Thermometer,
    IndicatorOff,
}

impl From<RangingTask> for AppTask {
    fn from(task: RangingTask) -> Self {
        Self::Ranging(task)
    }
}

impl From<ThermometerTask> for AppTask {
    fn from(_: ThermometerTask) -> Self {
        Self::Thermometer
    }
}

pub struct Device<C, I, P, R> {
    sched: Scheduler<AppTask>,
    ranging: RangingDriver<C, DistanceMonitor>,
    thermometer: Thermometer<I, TemperatureMonitor>,
    indicator: AlarmIndicator<P>,
    indicator_task: TaskId,
    radio: R,
    config: DeviceConfig,
}

impl<C, I, P, R> Device<C, I, P, R>
where
    C: SerialChannel,
    I: I2c,
    P: OutputPin,
    R: RadioPort,
{
    /// Validate `config`, bind every driver and register all tasks.
    ///
    /// Nothing is measured until [`start`](Self::start).
    pub fn new(config: DeviceConfig, channel: C, i2c: I, led: P, radio: R) -> Result<Self> {
        config.validate()?;

        let mut sched = Scheduler::new();

        let mut ranging = RangingDriver::new(channel, config.ranging_timing, &mut sched)?;
        ranging.set_event_handler(DistanceMonitor::new(&config));

        let mut thermometer = Thermometer::new(i2c, TMP112_ADDRESS, &mut sched)?;
        thermometer.set_event_handler(TemperatureMonitor::new(&config));

        let indicator_task = sched.register(AppTask::IndicatorOff, TICK_INFINITY)?;

        Ok(Self {
            sched,
            ranging,
            thermometer,
            indicator: AlarmIndicator::new(led),
            indicator_task,
            radio,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Apply the configured update intervals and pulse the indicator once
    /// as a power-on sign.
    pub fn start(&mut self) {
        self.indicator.on();
        self.sched
            .plan_relative(self.indicator_task, self.config.alarm_indicator_pulse);

        let ranging = UpdateInterval::from(self.config.ranging_interval);
        let temperature = UpdateInterval::from(self.config.temperature_interval);
        self.ranging.set_update_interval(ranging, &mut self.sched);
        self.thermometer
            .set_update_interval(temperature, &mut self.sched);
        info!(
            "Device started: ranging {:?}, temperature {:?}",
            ranging, temperature
        );
    }

    /// Advance the clock to `now`, apply staged user input, and run every
    /// due task (bounded per pass).  Returns the number of task bodies run.
    pub fn run_pending(&mut self, now: Tick, inputs: &InputQueue) -> usize {
        self.sched.set_now(now);
        inputs.drain(|event| self.apply_input(event));

        for dispatched in 0..MAX_DISPATCH_PER_PASS {
            let Some((_, task)) = self.sched.next_due() else {
                return dispatched;
            };
            self.dispatch(task);
            self.flush_publications();
        }

        if self.sched.next_wake().is_some_and(|due| due <= now) {
            warn!(
                "Device: dispatch limit ({}) reached, remaining tasks deferred",
                MAX_DISPATCH_PER_PASS
            );
        }
        MAX_DISPATCH_PER_PASS
    }

    /// Earliest tick at which `run_pending` has work to do.
    pub fn next_wake(&self) -> Option<Tick> {
        self.sched.next_wake()
    }

    // ── Configuration surface ─────────────────────────────────

    pub fn set_ranging_interval(&mut self, interval: UpdateInterval) {
        self.ranging.set_update_interval(interval, &mut self.sched);
    }

    pub fn set_temperature_interval(&mut self, interval: UpdateInterval) {
        self.thermometer.set_update_interval(interval, &mut self.sched);
    }

    /// Request a one-shot distance measurement.
    pub fn measure_distance(&mut self) -> bool {
        self.ranging.measure(&mut self.sched)
    }

    pub fn set_alarm_armed(&mut self, armed: bool) {
        if let Some(alarm) = self.alarm_mut() {
            alarm.set_armed(armed);
        }
    }

    pub fn set_alarm_distance_cm(&mut self, cm: u16) {
        if let Some(alarm) = self.alarm_mut() {
            alarm.set_alarm_distance_cm(cm);
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn alarm(&self) -> Option<&AlarmState> {
        self.ranging.event_handler().map(DistanceMonitor::alarm)
    }

    pub fn distance_monitor(&self) -> Option<&DistanceMonitor> {
        self.ranging.event_handler()
    }

    pub fn temperature_monitor(&self) -> Option<&TemperatureMonitor> {
        self.thermometer.event_handler()
    }

    pub fn ranging(&self) -> &RangingDriver<C, DistanceMonitor> {
        &self.ranging
    }

    pub fn ranging_mut(&mut self) -> &mut RangingDriver<C, DistanceMonitor> {
        &mut self.ranging
    }

    pub fn indicator_lit(&self) -> bool {
        self.indicator.is_lit()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn now(&self) -> Tick {
        self.sched.now()
    }

    // ── Internal ──────────────────────────────────────────────

    fn alarm_mut(&mut self) -> Option<&mut AlarmState> {
        self.ranging.event_handler_mut().map(DistanceMonitor::alarm_mut)
    }

    fn dispatch(&mut self, task: AppTask) {
        match task {
            AppTask::Ranging(task) => self.ranging.run_task(task, &mut self.sched),
            AppTask::Thermometer => self.thermometer.run_task(&mut self.sched),
            AppTask::IndicatorOff => self.indicator.off(),
        }
    }

    fn apply_input(&mut self, event: InputEvent) {
        let step = i32::from(self.config.alarm_step_cm);
        let Some(monitor) = self.ranging.event_handler_mut() else {
            return;
        };
        match event {
            InputEvent::ButtonClick => monitor.alarm_mut().toggle_armed(),
            InputEvent::ButtonHold => monitor.reset_alarm_distance(),
            InputEvent::EncoderUp => monitor.alarm_mut().adjust_alarm_distance(step),
            InputEvent::EncoderDown => monitor.alarm_mut().adjust_alarm_distance(-step),
        }
    }

    /// Forward everything the handlers staged to the radio.  Alarm
    /// publications also light the indicator for one pulse.
    fn flush_publications(&mut self) {
        if let Some(monitor) = self.ranging.event_handler_mut() {
            drain_outbox(monitor.outbox_mut(), &mut self.radio, |alarm| {
                if alarm {
                    self.indicator.on();
                    self.sched
                        .plan_relative(self.indicator_task, self.config.alarm_indicator_pulse);
                }
            });
        }
        if let Some(monitor) = self.thermometer.event_handler_mut() {
            drain_outbox(monitor.outbox_mut(), &mut self.radio, |_| {});
        }
    }
}

fn drain_outbox(outbox: &mut Outbox, radio: &mut impl RadioPort, mut on_sent: impl FnMut(bool)) {
    while let Some(publication) = outbox.pop() {
        radio.publish(publication.topic, publication.value);
        on_sent(publication.is_alarm());
    }
}
