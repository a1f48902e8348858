//! Non-blocking serial ultrasonic ranging driver.
//!
//! The sensor is triggered by writing `0x55` to its UART and answers
//! with the distance in millimetres as two big-endian bytes.  The driver
//! never waits on the hardware: each protocol step runs inside the
//! *measure* task and re-plans that task for the next step.
//!
//! ## Measurement cycle
//!
//! | State        | Action                                         | Next                     |
//! |--------------|------------------------------------------------|--------------------------|
//! | Initialize   | drop stale RX bytes (only when in flight)      | Triggering               |
//! | Triggering   | write trigger byte, arm the echo deadline      | AwaitingEcho / Error     |
//! | AwaitingEcho | poll RX until two bytes or the deadline        | Reading / Error          |
//! | Reading      | decode and range-check the payload             | Ready / Error            |
//! | Ready        | report `Update`, arm recovery time             | Initialize               |
//! | Error        | report `Error`, arm recovery time              | Initialize               |
//!
//! A full TX buffer is retried every poll interval; the cycle fails
//! with `ChannelFault` when the trigger is still unsent after one echo
//! timeout.
//!
//! A second *interval* task requests a measurement every update interval,
//! or stays parked when the interval is `Never`.

use log::{debug, info, warn};

use crate::app::events::RangingEvent;
use crate::app::ports::{RangingEventHandler, SerialChannel};
use crate::config::RangingTiming;
use crate::error::{RangingError, Result};
use crate::scheduler::{Planner, Scheduler, TICK_INFINITY, TaskId, Tick};

/// Byte that starts a measurement.
pub const TRIGGER_BYTE: u8 = 0x55;
/// Length of the echo payload.
pub const ECHO_LEN: usize = 2;
/// Closest distance the sensor reports reliably (mm).
pub const DISTANCE_MIN_MM: u16 = 20;
/// Farthest distance the sensor reports reliably (mm).
pub const DISTANCE_MAX_MM: u16 = 4000;

/// The two scheduler tasks owned by a ranging driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingTask {
    Interval,
    Measure,
}

/// Period of automatic measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateInterval {
    Never,
    Every(Tick),
}

impl From<Option<Tick>> for UpdateInterval {
    fn from(interval: Option<Tick>) -> Self {
        match interval {
            Some(period) if period != TICK_INFINITY => Self::Every(period),
            _ => Self::Never,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingState {
    Initialize,
    /// `deadline` bounds retries while the TX buffer is full.
    Triggering { deadline: Tick },
    AwaitingEcho { deadline: Tick },
    Reading,
    Ready { distance_mm: u16 },
    Error(RangingError),
}

/// Running counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangingStats {
    pub cycles: u32,
    pub updates: u32,
    pub timeouts: u32,
    pub malformed: u32,
    pub illegal_state: u32,
    pub channel_faults: u32,
}

impl RangingStats {
    fn record_error(&mut self, error: RangingError) {
        let counter = match error {
            RangingError::EchoTimeout => &mut self.timeouts,
            RangingError::MalformedReading => &mut self.malformed,
            RangingError::IllegalState => &mut self.illegal_state,
            RangingError::ChannelFault => &mut self.channel_faults,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Whether the measure task keeps stepping or returns to the scheduler.
enum Step {
    Continue,
    Yield,
}

/// Decode an echo payload into millimetres.
pub fn parse_distance(payload: [u8; ECHO_LEN]) -> core::result::Result<u16, RangingError> {
    let mm = u16::from_be_bytes(payload);
    if (DISTANCE_MIN_MM..=DISTANCE_MAX_MM).contains(&mm) {
        Ok(mm)
    } else {
        Err(RangingError::MalformedReading)
    }
}

pub struct RangingDriver<C, H> {
    channel: C,
    handler: Option<H>,
    timing: RangingTiming,
    state: RangingState,
    measurement_in_flight: bool,
    update_interval: UpdateInterval,
    /// Earliest tick at which a new cycle may trigger the sensor.
    next_ready_tick: Tick,
    task_interval: TaskId,
    task_measure: TaskId,
    stats: RangingStats,
}

impl<C, H> RangingDriver<C, H>
where
    C: SerialChannel,
    H: RangingEventHandler,
{
    /// Bind the driver to its serial channel and register its two tasks.
    ///
    /// The interval task starts parked; the measure task is planned after
    /// the sensor's startup delay, which is also the earliest tick a
    /// measurement may trigger.  Nothing is measured until
    /// [`set_update_interval`](Self::set_update_interval) or
    /// [`measure`](Self::measure) is called.
    pub fn new<T>(channel: C, timing: RangingTiming, sched: &mut Scheduler<T>) -> Result<Self>
    where
        T: Copy + From<RangingTask>,
    {
        let task_interval = sched.register(T::from(RangingTask::Interval), TICK_INFINITY)?;
        let task_measure = sched.register(T::from(RangingTask::Measure), timing.startup_delay)?;
        let next_ready_tick = sched.now().saturating_add(timing.startup_delay);

        info!("Ranging: bound, first trigger not before tick {}", next_ready_tick);

        Ok(Self {
            channel,
            handler: None,
            timing,
            state: RangingState::Initialize,
            measurement_in_flight: false,
            update_interval: UpdateInterval::Never,
            next_ready_tick,
            task_interval,
            task_measure,
            stats: RangingStats::default(),
        })
    }

    /// Replace the event sink.  Returns the previous one, if any.
    pub fn set_event_handler(&mut self, handler: H) -> Option<H> {
        self.handler.replace(handler)
    }

    pub fn event_handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn event_handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    /// Set the automatic measurement period.
    ///
    /// `Never` parks the interval task.  Otherwise the interval task is
    /// planned one period from now and a measurement is requested
    /// immediately.  A measurement already in flight is never aborted.
    pub fn set_update_interval(&mut self, interval: UpdateInterval, sched: &mut impl Planner) {
        self.update_interval = interval;

        match interval {
            UpdateInterval::Never => {
                sched.plan_absolute(self.task_interval, TICK_INFINITY);
            }
            UpdateInterval::Every(period) => {
                sched.plan_relative(self.task_interval, period);
                self.measure(sched);
            }
        }
    }

    /// Request a one-shot measurement.
    ///
    /// Returns `false` without side effects when a measurement is already
    /// in flight.  Otherwise plans the measure task at
    /// `max(now, next_ready_tick)` and returns `true`.
    pub fn measure(&mut self, sched: &mut impl Planner) -> bool {
        if self.measurement_in_flight {
            debug!("Ranging: measure() ignored, cycle in flight");
            return false;
        }

        self.measurement_in_flight = true;
        let at = self.next_ready_tick.max(sched.now());
        sched.plan_absolute(self.task_measure, at);
        true
    }

    /// Task body dispatch.  Call when the scheduler hands out one of this
    /// driver's tasks.
    pub fn run_task(&mut self, task: RangingTask, sched: &mut impl Planner) {
        match task {
            RangingTask::Interval => self.interval_task(sched),
            RangingTask::Measure => self.measure_task(sched),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> RangingState {
        self.state
    }

    pub fn is_measuring(&self) -> bool {
        self.measurement_in_flight
    }

    pub fn update_interval(&self) -> UpdateInterval {
        self.update_interval
    }

    pub fn next_ready_tick(&self) -> Tick {
        self.next_ready_tick
    }

    pub fn stats(&self) -> RangingStats {
        self.stats
    }

    pub fn task_ids(&self) -> (TaskId, TaskId) {
        (self.task_interval, self.task_measure)
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    // ── Task bodies ───────────────────────────────────────────

    fn interval_task(&mut self, sched: &mut impl Planner) {
        self.measure(sched);

        match self.update_interval {
            UpdateInterval::Every(period) => sched.plan_current_relative(period),
            UpdateInterval::Never => sched.plan_absolute(self.task_interval, TICK_INFINITY),
        }
    }

    fn measure_task(&mut self, sched: &mut impl Planner) {
        loop {
            let step = match self.state {
                RangingState::Initialize => self.step_initialize(sched.now()),
                RangingState::Triggering { deadline } => self.step_trigger(deadline, sched),
                RangingState::AwaitingEcho { deadline } => self.step_await_echo(deadline, sched),
                RangingState::Reading => self.step_read(),
                RangingState::Ready { distance_mm } => {
                    self.finish_cycle(RangingEvent::Update(distance_mm), sched.now());
                    Step::Yield
                }
                RangingState::Error(error) => {
                    self.finish_cycle(RangingEvent::Error(error), sched.now());
                    Step::Yield
                }
            };

            if let Step::Yield = step {
                return;
            }
        }
    }

    // ── Protocol steps ────────────────────────────────────────

    fn step_initialize(&mut self, now: Tick) -> Step {
        if !self.measurement_in_flight {
            // Startup delay elapsed with nothing requested.
            return Step::Yield;
        }

        self.channel.clear();
        self.stats.cycles = self.stats.cycles.saturating_add(1);
        let deadline = now.saturating_add(self.timing.echo_timeout);
        self.transition(RangingState::Triggering { deadline });
        Step::Continue
    }

    fn step_trigger(&mut self, deadline: Tick, sched: &mut impl Planner) -> Step {
        if !self.measurement_in_flight {
            self.transition(RangingState::Error(RangingError::IllegalState));
            return Step::Continue;
        }

        match self.channel.write_byte(TRIGGER_BYTE) {
            Ok(()) => {
                let now = sched.now();
                let deadline = now.saturating_add(self.timing.echo_timeout);
                self.transition(RangingState::AwaitingEcho { deadline });
                let poll_at = now.saturating_add(self.timing.poll_interval).min(deadline);
                sched.plan_absolute(self.task_measure, poll_at);
                Step::Yield
            }
            Err(nb::Error::WouldBlock) => {
                let now = sched.now();
                if now >= deadline {
                    warn!("Ranging: TX still full at deadline, trigger not sent");
                    self.transition(RangingState::Error(RangingError::ChannelFault));
                    return Step::Continue;
                }
                debug!("Ranging: TX full, trigger retried");
                let retry_at = now.saturating_add(self.timing.poll_interval).min(deadline);
                sched.plan_absolute(self.task_measure, retry_at);
                Step::Yield
            }
            Err(nb::Error::Other(e)) => {
                warn!("Ranging: trigger write failed: {:?}", e);
                self.transition(RangingState::Error(RangingError::ChannelFault));
                Step::Continue
            }
        }
    }

    fn step_await_echo(&mut self, deadline: Tick, sched: &mut impl Planner) -> Step {
        if !self.measurement_in_flight {
            self.transition(RangingState::Error(RangingError::IllegalState));
            return Step::Continue;
        }

        let now = sched.now();
        if self.channel.bytes_available() >= ECHO_LEN {
            self.transition(RangingState::Reading);
            return Step::Continue;
        }
        if now >= deadline {
            self.transition(RangingState::Error(RangingError::EchoTimeout));
            return Step::Continue;
        }

        let poll_at = now.saturating_add(self.timing.poll_interval).min(deadline);
        sched.plan_absolute(self.task_measure, poll_at);
        Step::Yield
    }

    fn step_read(&mut self) -> Step {
        if !self.measurement_in_flight {
            self.transition(RangingState::Error(RangingError::IllegalState));
            return Step::Continue;
        }

        let next = match self.read_payload().and_then(parse_distance) {
            Ok(distance_mm) => RangingState::Ready { distance_mm },
            Err(error) => RangingState::Error(error),
        };
        self.transition(next);
        Step::Continue
    }

    fn read_payload(&mut self) -> core::result::Result<[u8; ECHO_LEN], RangingError> {
        let mut payload = [0u8; ECHO_LEN];
        for byte in &mut payload {
            *byte = match self.channel.read_byte() {
                Ok(b) => b,
                Err(nb::Error::WouldBlock) => return Err(RangingError::MalformedReading),
                Err(nb::Error::Other(e)) => {
                    warn!("Ranging: echo read failed: {:?}", e);
                    return Err(RangingError::ChannelFault);
                }
            };
        }
        Ok(payload)
    }

    /// Terminal step of every cycle: Ready or Error.
    fn finish_cycle(&mut self, event: RangingEvent, now: Tick) {
        self.measurement_in_flight = false;
        self.next_ready_tick = now.saturating_add(self.timing.recovery_time);
        self.transition(RangingState::Initialize);

        match event {
            RangingEvent::Update(mm) => {
                self.stats.updates = self.stats.updates.saturating_add(1);
                debug!("Ranging: {} mm", mm);
            }
            RangingEvent::Error(error) => {
                self.stats.record_error(error);
                warn!("Ranging: cycle failed: {}", error);
            }
        }

        if let Some(handler) = self.handler.as_mut() {
            handler.on_event(event, now);
        }
    }

    fn transition(&mut self, next: RangingState) {
        debug!("Ranging: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
