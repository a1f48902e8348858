//! Log-based radio adapter.
//!
//! Implements [`RadioPort`] by writing each publication as a JSON value to
//! the ESP-IDF logger (UART / USB-CDC in production).  A LoRa or MQTT
//! adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::TelemetryValue;
use crate::app::ports::RadioPort;

/// Adapter that logs every publication to the serial console.
#[derive(Debug, Default)]
pub struct LogRadio {
    sent: u32,
}

impl LogRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publications written since boot.
    pub fn sent(&self) -> u32 {
        self.sent
    }
}

impl RadioPort for LogRadio {
    fn publish(&mut self, topic: &str, value: TelemetryValue) {
        match serde_json::to_string(&value) {
            Ok(json) => {
                self.sent = self.sent.wrapping_add(1);
                info!("RADIO | {} = {}", topic, json);
            }
            Err(e) => warn!("RADIO | {}: encode failed: {}", topic, e),
        }
    }
}
