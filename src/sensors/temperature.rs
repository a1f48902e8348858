//! TMP112 digital thermometer (I2C, 12-bit, 0.0625 °C/LSB).
//!
//! Runs in continuous-conversion mode, so a read is a single
//! register transaction and completes inside one task body.  Results
//! flow through the same single-handler contract as the ranging driver.

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info, warn};

use crate::app::events::TemperatureEvent;
use crate::app::ports::TemperatureEventHandler;
use crate::error::{Result, TemperatureError};
use crate::scheduler::{Planner, Scheduler, TICK_INFINITY, TaskId};
use crate::sensors::ranging::UpdateInterval;

/// Default bus address (ADD0 tied to GND).
pub const TMP112_ADDRESS: u8 = 0x48;

const REG_TEMPERATURE: u8 = 0x00;
const LSB_CELSIUS: f32 = 0.0625;
const MIN_CELSIUS: f32 = -55.0;
const MAX_CELSIUS: f32 = 128.0;

/// Scheduler tag for the thermometer's single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermometerTask;

/// Convert the raw temperature register into °C.
pub fn raw_to_celsius(raw: [u8; 2]) -> f32 {
    // 12-bit two's complement, left-justified.
    let counts = i16::from_be_bytes(raw) >> 4;
    counts as f32 * LSB_CELSIUS
}

pub struct Thermometer<I, H> {
    i2c: I,
    address: u8,
    handler: Option<H>,
    update_interval: UpdateInterval,
    read_pending: bool,
    task: TaskId,
}

impl<I, H> Thermometer<I, H>
where
    I: I2c,
    H: TemperatureEventHandler,
{
    /// Bind to the bus and register the (parked) read task.
    pub fn new<T>(i2c: I, address: u8, sched: &mut Scheduler<T>) -> Result<Self>
    where
        T: Copy + From<ThermometerTask>,
    {
        let task = sched.register(T::from(ThermometerTask), TICK_INFINITY)?;
        info!("Thermometer: bound at 0x{:02x}", address);
        Ok(Self {
            i2c,
            address,
            handler: None,
            update_interval: UpdateInterval::Never,
            read_pending: false,
            task,
        })
    }

    pub fn set_event_handler(&mut self, handler: H) -> Option<H> {
        self.handler.replace(handler)
    }

    pub fn event_handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    pub fn event_handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    /// Set the automatic read period.
    ///
    /// `Never` parks the task unless a requested read is still pending;
    /// that read runs once and is not re-planned.
    pub fn set_update_interval(&mut self, interval: UpdateInterval, sched: &mut impl Planner) {
        self.update_interval = interval;
        match interval {
            UpdateInterval::Never => {
                if !self.read_pending {
                    sched.plan_absolute(self.task, TICK_INFINITY);
                }
            }
            UpdateInterval::Every(_) => {
                self.measure(sched);
            }
        }
    }

    /// Request a read on the next dispatch pass.  `false` if one is already pending.
    pub fn measure(&mut self, sched: &mut impl Planner) -> bool {
        if self.read_pending {
            return false;
        }
        self.read_pending = true;
        sched.plan_now(self.task);
        true
    }

    pub fn update_interval(&self) -> UpdateInterval {
        self.update_interval
    }

    pub fn task_id(&self) -> TaskId {
        self.task
    }

    /// Task body: read, report, re-plan.
    pub fn run_task(&mut self, sched: &mut impl Planner) {
        self.read_pending = false;
        let now = sched.now();

        let event = match self.read_celsius() {
            Ok(celsius) => {
                debug!("Thermometer: {:.2} °C", celsius);
                TemperatureEvent::Update(celsius)
            }
            Err(error) => {
                warn!("Thermometer: read failed: {}", error);
                TemperatureEvent::Error(error)
            }
        };

        if let UpdateInterval::Every(period) = self.update_interval {
            sched.plan_current_relative(period);
        }

        if let Some(handler) = self.handler.as_mut() {
            handler.on_event(event, now);
        }
    }

    fn read_celsius(&mut self) -> core::result::Result<f32, TemperatureError> {
        let mut raw = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_TEMPERATURE], &mut raw)
            .map_err(|e| {
                warn!("Thermometer: I2C {:?}", e.kind());
                TemperatureError::Bus
            })?;

        let celsius = raw_to_celsius(raw);
        if (MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius) {
            Ok(celsius)
        } else {
            Err(TemperatureError::OutOfRange)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Tick;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    struct FakeBus {
        register: Option<[u8; 2]>,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            _address: u8,
            operations: &mut [Operation<'_>],
        ) -> core::result::Result<(), Self::Error> {
            let register = self.register.ok_or(ErrorKind::Other)?;
            for op in operations {
                if let Operation::Read(buf) = op {
                    buf.copy_from_slice(&register);
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<(TemperatureEvent, Tick)>,
    }

    impl TemperatureEventHandler for Recorder {
        fn on_update(&mut self, celsius: f32, now: Tick) {
            self.events.push((TemperatureEvent::Update(celsius), now));
        }

        fn on_error(&mut self, error: TemperatureError, now: Tick) {
            self.events.push((TemperatureEvent::Error(error), now));
        }
    }

    fn setup(register: Option<[u8; 2]>) -> (Thermometer<FakeBus, Recorder>, Scheduler<ThermometerTask>) {
        let mut sched = Scheduler::new();
        let mut thermo = Thermometer::new(FakeBus { register }, TMP112_ADDRESS, &mut sched).unwrap();
        thermo.set_event_handler(Recorder::default());
        (thermo, sched)
    }

    fn dispatch(thermo: &mut Thermometer<FakeBus, Recorder>, sched: &mut Scheduler<ThermometerTask>) {
        while sched.next_due().is_some() {
            thermo.run_task(sched);
        }
    }

    #[test]
    fn datasheet_conversion_points() {
        assert_eq!(raw_to_celsius([0x19, 0x00]), 25.0);
        assert_eq!(raw_to_celsius([0x00, 0x10]), 0.0625);
        assert_eq!(raw_to_celsius([0xFF, 0xF0]), -0.0625);
        assert_eq!(raw_to_celsius([0xE7, 0x00]), -25.0);
    }

    #[test]
    fn periodic_reads_report_updates() {
        let (mut thermo, mut sched) = setup(Some([0x19, 0x00]));
        thermo.set_update_interval(UpdateInterval::Every(10_000), &mut sched);

        for now in [0, 10_000, 20_000] {
            sched.set_now(now);
            dispatch(&mut thermo, &mut sched);
        }

        let events = &thermo.event_handler().unwrap().events;
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], (TemperatureEvent::Update(25.0), 20_000));
    }

    #[test]
    fn bus_failure_reports_error() {
        let (mut thermo, mut sched) = setup(None);
        assert!(thermo.measure(&mut sched));
        assert!(!thermo.measure(&mut sched));
        dispatch(&mut thermo, &mut sched);

        let events = &thermo.event_handler().unwrap().events;
        assert_eq!(events, &[(TemperatureEvent::Error(TemperatureError::Bus), 0)]);
    }

    #[test]
    fn pending_read_survives_never_interval() {
        let (mut thermo, mut sched) = setup(Some([0x19, 0x00]));
        assert!(thermo.measure(&mut sched));
        thermo.set_update_interval(UpdateInterval::Never, &mut sched);

        for now in [0, 100, 10_000] {
            sched.set_now(now);
            dispatch(&mut thermo, &mut sched);
        }

        let events = &thermo.event_handler().unwrap().events;
        assert_eq!(events, &[(TemperatureEvent::Update(25.0), 0)]);
        assert!(sched.is_parked(thermo.task_id()));
        assert!(thermo.measure(&mut sched));
    }

    #[test]
    fn readings_outside_sensor_range_are_errors() {
        // 127.9375 °C is the top of the 12-bit scale and still valid.
        let (mut thermo, mut sched) = setup(Some([0x7F, 0xF0]));
        thermo.measure(&mut sched);
        dispatch(&mut thermo, &mut sched);
        assert_eq!(
            thermo.event_handler().unwrap().events,
            vec![(TemperatureEvent::Update(127.9375), 0)]
        );

        // -56 °C is below the -55 °C floor.
        let (mut thermo, mut sched) = setup(Some([0xC8, 0x00]));
        thermo.measure(&mut sched);
        dispatch(&mut thermo, &mut sched);
        assert_eq!(
            thermo.event_handler().unwrap().events,
            vec![(TemperatureEvent::Error(TemperatureError::OutOfRange), 0)]
        );
    }

    #[test]
    fn never_interval_parks_task() {
        let (mut thermo, mut sched) = setup(Some([0x19, 0x00]));
        thermo.set_update_interval(UpdateInterval::Never, &mut sched);
        assert!(sched.is_parked(thermo.task_id()));
    }
}
