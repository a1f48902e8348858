//! Interrupt-staged user input.
//!
//! The button and rotary encoder ISRs must not touch application state.
//! They push compact events into a lock-free single-producer /
//! single-consumer ring; the application context drains it from task
//! context at the start of every dispatch pass.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────────┐
//! │ Button ISR  │────▶│  InputQueue  │────▶│ Device::run_pending  │
//! │ Encoder ISR │────▶│  (lock-free) │     │  (alarm adjustments) │
//! └─────────────┘     └──────────────┘     └──────────────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Capacity of the ring, one slot is kept free to tell full from empty.
const INPUT_QUEUE_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InputEvent {
    /// Short press: toggle alarm arming.
    ButtonClick = 1,
    /// Long press: restore the default alarm distance.
    ButtonHold = 2,
    /// One encoder detent clockwise: alarm distance up.
    EncoderUp = 3,
    /// One encoder detent counter-clockwise: alarm distance down.
    EncoderDown = 4,
}

impl InputEvent {
    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::ButtonClick),
            2 => Some(Self::ButtonHold),
            3 => Some(Self::EncoderUp),
            4 => Some(Self::EncoderDown),
            _ => None,
        }
    }
}

/// Lock-free SPSC ring.  ISRs produce, the dispatch loop consumes.
pub struct InputQueue {
    head: AtomicU8,
    tail: AtomicU8,
    buffer: [AtomicU8; INPUT_QUEUE_CAP],
}

/// Queue shared by the GPIO interrupt handlers and the main loop.
pub static INPUT_QUEUE: InputQueue = InputQueue::new();

impl InputQueue {
    pub const fn new() -> Self {
        Self {
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
            buffer: [const { AtomicU8::new(0) }; INPUT_QUEUE_CAP],
        }
    }

    /// Push an event.  Safe to call from ISR context.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: InputEvent) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let next_head = (head + 1) % INPUT_QUEUE_CAP as u8;

        if next_head == tail {
            return false;
        }

        self.buffer[head as usize].store(event as u8, Ordering::Relaxed);
        self.head.store(next_head, Ordering::Release);
        true
    }

    /// Pop the oldest event.  Single consumer only.
    pub fn pop(&self) -> Option<InputEvent> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let raw = self.buffer[tail as usize].load(Ordering::Relaxed);
        self.tail
            .store((tail + 1) % INPUT_QUEUE_CAP as u8, Ordering::Release);
        InputEvent::from_u8(raw)
    }

    /// Drain all pending events in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(InputEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Relaxed) == self.head.load(Ordering::Acquire)
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
