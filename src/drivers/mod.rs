//! Peripheral drivers.

pub mod modem_power;
