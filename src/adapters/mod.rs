//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements      | Connects to                  |
//! |--------------|-----------------|------------------------------|
//! | `log_radio`  | RadioPort       | Serial log output            |
//! | `sim_serial` | SerialChannel   | Simulated ranging module     |
//! | `time`       | (clock source)  | ESP32 system timer / Instant |
//! | `uart`       | SerialChannel   | ESP-IDF UART driver          |

pub mod log_radio;
pub mod sim_serial;
pub mod time;
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub mod uart;
