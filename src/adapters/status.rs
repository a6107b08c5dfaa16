//! Status board.
//!
//! Holds the latest sensor readings and mains state, and renders them as the
//! reply to a `status` SMS:
//!
//! ```text
//! Freezer: -18.5
//! Temp2: Unknown
//! Power: On
//! ```
//!
//! Lines that would overflow an SMS are dropped, along with everything
//! after them.

use core::fmt::{self, Write};

use crate::app::ports::StatusReporter;
use crate::config::SmsText;
use heapless::{String, Vec};

pub const MAX_SENSORS: usize = 10;
pub const MAX_SENSOR_NAME: usize = 12;

pub type SensorName = String<MAX_SENSOR_NAME>;

/// Temperature in tenths of a degree Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeciCelsius(pub i16);

impl fmt::Display for DeciCelsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

#[derive(Debug, Clone, Default)]
struct Sensor {
    name: SensorName,
    reading: Option<DeciCelsius>,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    sensors: Vec<Sensor, MAX_SENSORS>,
    mains_on: bool,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor.  An empty name reports as `Temp<n>`.  Returns
    /// `false` when the board is full.
    pub fn add_sensor(&mut self, name: &str) -> bool {
        let mut sensor = Sensor::default();
        crate::text::copy_truncated(&mut sensor.name, name);
        self.sensors.push(sensor).is_ok()
    }

    /// Record a reading for sensor `index`; `None` marks it unavailable.
    pub fn set_reading(&mut self, index: usize, reading: Option<DeciCelsius>) {
        if let Some(sensor) = self.sensors.get_mut(index) {
            sensor.reading = reading;
        }
    }

    pub fn set_mains(&mut self, on: bool) {
        self.mains_on = on;
    }
}

impl StatusReporter for StatusBoard {
    fn status_report(&mut self, out: &mut SmsText) {
        out.clear();
        let mut line: String<40> = String::new();

        for (i, sensor) in self.sensors.iter().enumerate() {
            line.clear();
            let _ = if sensor.name.is_empty() {
                write!(line, "Temp{}: ", i + 1)
            } else {
                write!(line, "{}: ", sensor.name)
            };
            let _ = match sensor.reading {
                Some(t) => writeln!(line, "{t}"),
                None => writeln!(line, "Unknown"),
            };
            if out.push_str(&line).is_err() {
                return;
            }
        }

        let _ = out.push_str(if self.mains_on { "Power: On" } else { "Power: Off" });
    }
}
