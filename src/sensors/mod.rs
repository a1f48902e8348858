//! Sensor drivers.
//!
//! Each driver owns its bus, registers its task(s) with the scheduler and
//! reports through a single event handler.
//!
//! | Driver        | Bus    | Handler trait             |
//! |---------------|--------|---------------------------|
//! | `ranging`     | UART   | `RangingEventHandler`     |
//! | `temperature` | I2C    | `TemperatureEventHandler` |

pub mod ranging;
pub mod temperature;
