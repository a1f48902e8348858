//! UART-backed [`SerialChannel`] for the ranging module.
//!
//! The ESP-IDF UART driver buffers received bytes in its own ring, filled
//! from the UART ISR; every call here is non-blocking.

use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::sys::EspError;
use esp_idf_hal::uart::UartDriver;
use log::warn;

use crate::app::ports::SerialChannel;

pub struct UartChannel<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartChannel<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl SerialChannel for UartChannel<'_> {
    type Error = EspError;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte, NON_BLOCK) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        match self.uart.write(&[byte]) {
            Ok(1) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn bytes_available(&self) -> usize {
        self.uart.remaining_read().unwrap_or_else(|e| {
            warn!("UART: remaining_read failed: {}", e);
            0
        })
    }

    fn clear(&mut self) {
        if let Err(e) = self.uart.clear_rx() {
            warn!("UART: clear_rx failed: {}", e);
        }
    }
}
