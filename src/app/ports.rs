//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ModemEngine / SmsService (domain)
//! ```
//!
//! Driven adapters (UART, timers, config store, command interpreter, status
//! board, restart) implement these traits.  The engines consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **DeviceControl::restart** does not return on hardware; test doubles
//!   record the request instead.

use crate::config::{SmsText, SystemConfig};

// ───────────────────────────────────────────────────────────────
// Transport (driven adapter: domain ↔ modem serial link)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented, non-blocking channel to the modem.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain ↔ timer service)
// ───────────────────────────────────────────────────────────────

/// Opaque handle to an allocated timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(pub u8);

/// What a timer means when it fires.  The main loop routes each event to
/// the engine that created the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The in-flight modem operation has taken too long.
    ModemWatchdog,
    /// Time to look for new messages.
    SmsPoll,
}

/// One-shot / periodic timers with cancellation.
pub trait TimerPort {
    /// Allocate a timer.  Returns `None` when no slot is free.
    fn create(
        &mut self,
        period_ms: u32,
        repeating: bool,
        auto_start: bool,
        event: TimerEvent,
    ) -> Option<TimerHandle>;

    /// (Re)start a timer one period from now.
    fn start(&mut self, handle: TimerHandle);

    /// Stop a timer without releasing its slot.
    fn stop(&mut self, handle: TimerHandle);

    /// Release the slot.  Unknown handles are ignored.
    fn destroy(&mut self, handle: TimerHandle);
}

// ───────────────────────────────────────────────────────────────
// Command interpreter (driven adapter: domain → configuration)
// ───────────────────────────────────────────────────────────────

/// Where a configuration command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Local serial console.
    Console,
    /// An authorised admin's SMS.  Interactive-only commands are refused.
    Sms,
}

/// Executes configuration commands against the live config.
pub trait CommandInterpreter {
    /// Run `command`.  Anything written to `reply` is sent back to the
    /// originator; an `Ok` with an empty reply is acknowledged generically.
    fn execute(
        &mut self,
        command: &str,
        config: &mut SystemConfig,
        origin: CommandOrigin,
        reply: &mut SmsText,
    ) -> Result<(), CommandError>;
}

// ───────────────────────────────────────────────────────────────
// Status reporter (driven adapter: sensors → SMS reply)
// ───────────────────────────────────────────────────────────────

/// Produces the bounded-length answer to a "status" request.
pub trait StatusReporter {
    fn status_report(&mut self, out: &mut SmsText);
}

// ───────────────────────────────────────────────────────────────
// Device control
// ───────────────────────────────────────────────────────────────

/// Whole-device lifecycle control.
pub trait DeviceControl {
    /// Unconditional restart.  Never returns on hardware.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed the magic / deserialization check.
    Corrupted,
    /// A config field failed validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from [`CommandInterpreter::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Unrecognised command word.
    Unknown,
    /// Missing or malformed argument.
    InvalidArgument,
    /// Command is only available on the local console.
    NotPermitted,
    /// The change could not be persisted.
    Storage(ConfigError),
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown command"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::NotPermitted => write!(f, "not permitted in this context"),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::Storage(e)
    }
}
