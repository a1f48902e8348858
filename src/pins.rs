//! GPIO / peripheral pin assignments for the rangefinder board.
//!
//! Single source of truth: `main` wires peripherals from these numbers
//! rather than hard-coding them.

// ---------------------------------------------------------------------------
// Ultrasonic ranging module (UART1, 9600 8N1)
// ---------------------------------------------------------------------------

/// ESP TX → sensor RX (trigger byte).
pub const RANGER_TX_GPIO: i32 = 17;
/// Sensor TX → ESP RX (echo payload).
pub const RANGER_RX_GPIO: i32 = 18;
pub const RANGER_BAUD: u32 = 9600;

// ---------------------------------------------------------------------------
// TMP112 thermometer (I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// User interface
// ---------------------------------------------------------------------------

/// Alarm indicator LED (active HIGH).
pub const ALARM_LED_GPIO: i32 = 2;
/// Push button, active LOW with internal pull-up.
pub const BUTTON_GPIO: i32 = 0;
