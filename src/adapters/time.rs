//! Monotonic clock for the main loop.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (microseconds since
//!   boot).
//! - **otherwise**: `std::time::Instant`, for host-side simulation.

use crate::timer::Ticks;

pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, in timer ticks.
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> Ticks {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as Ticks / 1000
    }

    /// Milliseconds since boot, in timer ticks.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> Ticks {
        self.start.elapsed().as_millis() as Ticks
    }
}
