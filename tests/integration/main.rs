//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the simulated UART and mock host.  All tests run on the host
//! (x86_64) with no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod alert_tests;
mod config_command_tests;
mod harness;
mod mock_host;
mod sms_flow_tests;
