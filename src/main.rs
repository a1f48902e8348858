//! Rangefinder firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartChannel      I2cDriver      PinDriver      LogRadio       │
//! │  (SerialChannel)  (TMP112 bus)   (alarm LED)    (RadioPort)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Device (application context)              │    │
//! │  │  Scheduler · RangingDriver · Thermometer · Monitors    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Button sampling → INPUT_QUEUE → Device::run_pending           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use rangefinder::adapters::log_radio::LogRadio;
use rangefinder::adapters::time::MonotonicClock;
use rangefinder::adapters::uart::UartChannel;
use rangefinder::app::service::Device;
use rangefinder::config::DeviceConfig;
use rangefinder::drivers::button::ButtonDriver;
use rangefinder::events::INPUT_QUEUE;
use rangefinder::pins;
use rangefinder::scheduler::TICK_INFINITY;

/// Upper bound on a single sleep so the button keeps being sampled.
const INPUT_POLL_MS: u64 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Rangefinder v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number below is used exactly once and nowhere
    // else in the firmware.
    let (ranger_tx, ranger_rx, sda, scl, led_pin, button_pin) = unsafe {
        (
            AnyIOPin::new(pins::RANGER_TX_GPIO),
            AnyIOPin::new(pins::RANGER_RX_GPIO),
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyOutputPin::new(pins::ALARM_LED_GPIO),
            AnyIOPin::new(pins::BUTTON_GPIO),
        )
    };

    let uart = UartDriver::new(
        peripherals.uart1,
        ranger_tx,
        ranger_rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(pins::RANGER_BAUD)),
    )?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let led = PinDriver::output(led_pin)?;
    let mut button = PinDriver::input(button_pin)?;
    button.set_pull(Pull::Up)?;

    // ── 3. Application context ────────────────────────────────
    let clock = MonotonicClock::new();
    let mut device = Device::new(
        DeviceConfig::default(),
        UartChannel::new(uart),
        i2c,
        led,
        LogRadio::new(),
    )?;
    device.start();

    let mut gestures = ButtonDriver::new();

    // ── 4. Main loop ──────────────────────────────────────────
    info!("Entering main loop");
    loop {
        let now = clock.uptime_ms();

        if let Some(event) = gestures.sample(button.is_low(), now) {
            if !INPUT_QUEUE.push(event) {
                warn!("Input queue full, {:?} dropped", event);
            }
        }

        device.run_pending(now, &INPUT_QUEUE);

        let wake = device.next_wake().unwrap_or(TICK_INFINITY);
        let sleep = wake.saturating_sub(clock.uptime_ms()).min(INPUT_POLL_MS);
        FreeRtos::delay_ms(sleep as u32);
    }
}
