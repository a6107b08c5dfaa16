//! Unified error types for the SMS alert firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level error handling uniform.  All variants are `Copy` so they can be
//! handed to modem callbacks without allocation.

use crate::app::ports::{CommandError, ConfigError};
use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A modem operation did not succeed.
    Modem(ModemError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A configuration command was rejected.
    Command(CommandError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modem(e) => write!(f, "modem: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Modem errors
// ---------------------------------------------------------------------------

/// Why a modem operation ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// Another operation is in flight, or initialisation has not finished.
    NotReady,
    /// The modem sent a line the current state does not expect.
    UnexpectedResponse,
    /// The operation watchdog expired.
    Timeout,
    /// The modem rebooted while the operation was pending.
    Restarted,
    /// Writing the command to the serial link failed.
    Transport,
    /// The command did not fit the command buffer.
    Overflow,
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "modem not ready"),
            Self::UnexpectedResponse => write!(f, "unexpected response"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::Restarted => write!(f, "modem restarted"),
            Self::Transport => write!(f, "serial write failed"),
            Self::Overflow => write!(f, "command too long"),
        }
    }
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
