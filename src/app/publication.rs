//! Change-filtered publication gate.
//!
//! One gate per published signal.  A fresh sample is published when it
//! moved at least `change_threshold` away from the last published value,
//! or when the signal has been silent until its deadline:
//!
//! ```text
//!   |value - last_published| >= threshold   ──┐
//!                                             ├──▶ publish, deadline = now + max_silence
//!   now >= next_deadline                    ──┘
//! ```
//!
//! The deadline starts at tick 0, so the first sample always publishes.
//! It is recomputed only on publish.

use core::ops::Sub;

use crate::scheduler::Tick;

/// Rate-limiting decision state for one signal.
#[derive(Debug, Clone, Copy)]
pub struct PublicationGate<T> {
    last_published: Option<T>,
    next_deadline: Tick,
    change_threshold: T,
    max_silence: Tick,
}

impl<T> PublicationGate<T>
where
    T: Copy + PartialOrd + Sub<Output = T>,
{
    pub fn new(change_threshold: T, max_silence: Tick) -> Self {
        Self {
            last_published: None,
            next_deadline: 0,
            change_threshold,
            max_silence,
        }
    }

    /// Decide whether `value` sampled at `now` goes out.
    ///
    /// Returns `true` when the caller must publish; the gate has then
    /// already recorded `value` and moved its deadline to `now + max_silence`.
    pub fn publish_if_needed(&mut self, value: T, now: Tick) -> bool {
        let changed = match self.last_published {
            Some(last) => abs_diff(value, last) >= self.change_threshold,
            None => true,
        };

        if changed || now >= self.next_deadline {
            self.last_published = Some(value);
            self.next_deadline = now.saturating_add(self.max_silence);
            return true;
        }
        false
    }

    pub fn last_published(&self) -> Option<T> {
        self.last_published
    }

    pub fn next_deadline(&self) -> Tick {
        self.next_deadline
    }
}

/// `|a - b|` for types that may be unsigned.
fn abs_diff<T: PartialOrd + Sub<Output = T>>(a: T, b: T) -> T {
    if a >= b { a - b } else { b - a }
}
