//! Simulated serial ultrasonic ranger.
//!
//! Behaves like the real sensor on the other end of the UART: every
//! trigger byte written produces a two-byte big-endian echo in the
//! receive buffer.  Used by host simulation and the test suites; the
//! echo can be withheld, corrupted, or replaced by a channel fault.

use heapless::Deque;

use crate::app::ports::SerialChannel;
use crate::sensors::ranging::TRIGGER_BYTE;

const RX_CAP: usize = 16;

/// Error reported when the simulated channel is told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimChannelFault;

/// What the simulated sensor answers to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEcho {
    /// A well-formed reading in millimetres.
    Distance(u16),
    /// Arbitrary payload bytes.
    Raw([u8; 2]),
    /// No answer at all.
    Silent,
}

pub struct SimRanger {
    rx: Deque<u8, RX_CAP>,
    echo: SimEcho,
    fail_writes: bool,
    tx_full: bool,
    triggers: u32,
}

impl SimRanger {
    pub fn new(echo: SimEcho) -> Self {
        Self {
            rx: Deque::new(),
            echo,
            fail_writes: false,
            tx_full: false,
            triggers: 0,
        }
    }

    pub fn set_echo(&mut self, echo: SimEcho) {
        self.echo = echo;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// While set, writes report a full TX buffer (`WouldBlock`).
    pub fn set_tx_full(&mut self, full: bool) {
        self.tx_full = full;
    }

    /// Stage bytes as if they had arrived on the wire.
    pub fn inject(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.rx.push_back(b).is_err() {
                break;
            }
        }
    }

    /// Trigger bytes accepted so far.
    pub fn triggers(&self) -> u32 {
        self.triggers
    }
}

impl SerialChannel for SimRanger {
    type Error = SimChannelFault;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        if self.fail_writes {
            return Err(nb::Error::Other(SimChannelFault));
        }
        if self.tx_full {
            return Err(nb::Error::WouldBlock);
        }
        if byte == TRIGGER_BYTE {
            self.triggers += 1;
            match self.echo {
                SimEcho::Distance(mm) => self.inject(&mm.to_be_bytes()),
                SimEcho::Raw(bytes) => self.inject(&bytes),
                SimEcho::Silent => {}
            }
        }
        Ok(())
    }

    fn bytes_available(&self) -> usize {
        self.rx.len()
    }

    fn clear(&mut self) {
        self.rx.clear();
    }
}
