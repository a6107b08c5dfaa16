//! SMS alert firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod modem;
pub mod sms;
pub mod text;
pub mod timer;

pub mod adapters;
pub mod drivers;
