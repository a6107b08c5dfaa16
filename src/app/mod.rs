//! Application core: pure domain logic, zero I/O.
//!
//! [`service::AppService`] runs the modem and SMS engines from one
//! cooperative main loop.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod ports;
pub mod service;
