//! Monotonic clock adapter.
//!
//! - **`espidf` feature** — wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic).
//! - **host** — uses `std::time::Instant` for simulation and testing.

use crate::app::ports::Clock;
use crate::control::Millis;

/// Milliseconds since the adapter was created (host) or since boot (ESP-IDF).
pub struct SystemClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Seconds since boot (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

impl Clock for SystemClock {
    #[cfg(feature = "espidf")]
    fn now_ms(&self) -> Millis {
        // SAFETY: esp_timer_get_time has no preconditions once the system
        // timer is running, which ESP-IDF guarantees before app_main.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as Millis / 1000
    }

    #[cfg(not(feature = "espidf"))]
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}
