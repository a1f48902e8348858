//! Mock hardware for integration tests.
//!
//! Records every radio publish so tests can assert on the full telemetry
//! history without a real link, and stands in for the I2C bus and the
//! indicator GPIO.

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::i2c::{ErrorKind, ErrorType as I2cErrorType, I2c, Operation};
use rangefinder::adapters::sim_serial::{SimEcho, SimRanger};
use rangefinder::app::events::{TelemetryValue, topic};
use rangefinder::app::ports::RadioPort;
use rangefinder::app::service::Device;
use rangefinder::config::DeviceConfig;
use rangefinder::events::InputQueue;
use rangefinder::scheduler::Tick;

// ── RecordingRadio ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingRadio {
    pub sent: Vec<(String, TelemetryValue)>,
}

#[allow(dead_code)]
impl RecordingRadio {
    pub fn on_topic(&self, wanted: &str) -> Vec<TelemetryValue> {
        self.sent
            .iter()
            .filter(|(t, _)| t == wanted)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn distances(&self) -> Vec<TelemetryValue> {
        self.on_topic(topic::DISTANCE)
    }

    pub fn alarms(&self) -> Vec<TelemetryValue> {
        self.on_topic(topic::ALARM)
    }
}

impl RadioPort for RecordingRadio {
    fn publish(&mut self, topic: &str, value: TelemetryValue) {
        self.sent.push((topic.to_owned(), value));
    }
}

// ── MockPin ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
}

impl PinErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

// ── MockI2c (TMP112 temperature register) ─────────────────────

#[derive(Debug)]
pub struct MockI2c {
    /// Raw register contents; `None` makes every transaction fail.
    pub register: Option<[u8; 2]>,
}

impl MockI2c {
    /// Bus reporting 25.0 °C.
    pub fn room_temperature() -> Self {
        Self {
            register: Some([0x19, 0x00]),
        }
    }
}

impl I2cErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let register = self.register.ok_or(ErrorKind::Other)?;
        for op in operations {
            if let Operation::Read(buf) = op {
                buf.copy_from_slice(&register);
            }
        }
        Ok(())
    }
}

// ── Device harness ────────────────────────────────────────────

pub type TestDevice = Device<SimRanger, MockI2c, MockPin, RecordingRadio>;

pub fn make_device(config: DeviceConfig, echo: SimEcho) -> TestDevice {
    let mut device = Device::new(
        config,
        SimRanger::new(echo),
        MockI2c::room_temperature(),
        MockPin::default(),
        RecordingRadio::default(),
    )
    .expect("device construction");
    device.start();
    device
}

/// Jump from wake-up to wake-up like the firmware main loop, up to and
/// including `until`.
pub fn run_until(device: &mut TestDevice, inputs: &InputQueue, until: Tick) {
    loop {
        let wake = device.next_wake().unwrap_or(Tick::MAX).max(device.now());
        if wake > until {
            break;
        }
        device.run_pending(wake, inputs);
    }
    device.run_pending(until, inputs);
}
