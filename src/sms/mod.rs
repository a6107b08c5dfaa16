//! SMS application layer: inbound command handling and throttled alert
//! broadcast on top of [`crate::modem`].

pub mod history;
pub mod phone;
pub mod service;
