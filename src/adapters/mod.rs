//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements           | Connects to               |
//! |------------|----------------------|---------------------------|
//! | `uart`     | Transport            | ESP32 UART / sim buffers  |
//! | `link`     | Transport, TimerPort | UART + software timers    |
//! | `nvs`      | ConfigPort           | NVS / in-memory store     |
//! | `commands` | CommandInterpreter   | SystemConfig + ConfigPort |
//! | `status`   | StatusReporter       | Sensor readings, mains    |
//! | `host`     | all host ports       | commands + status + reset |
//! | `time`     | -                    | ESP32 system timer        |

pub mod commands;
pub mod host;
pub mod link;
pub mod nvs;
pub mod status;
pub mod time;
pub mod uart;
