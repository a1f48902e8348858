//! Monotonic millisecond clock feeding the scheduler.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::scheduler::Tick;

pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot.
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    pub fn uptime_ms(&self) -> Tick {
        // SAFETY: reads a free-running hardware counter, no shared state.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as Tick / 1_000
    }

    /// Milliseconds since the clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> Tick {
        self.start.elapsed().as_millis() as Tick
    }
}
