//! UART transport to the modem.
//!
//! Implements [`Transport`] for the modem's serial link.
//!
//! - **`target_os = "espidf"`**: wraps an `esp-idf-hal` [`UartDriver`]
//!   using non-blocking reads.
//! - **`not(target_os = "espidf")`**: an in-memory loopback: tests push
//!   modem output with [`inject`](UartTransport::inject) and inspect what
//!   the firmware wrote with [`take_written`](UartTransport::take_written).

use crate::app::ports::Transport;

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::{BLOCK, NON_BLOCK},
    sys::EspError,
    uart::UartDriver,
};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

/// Baud rate the modem is configured for.
pub const MODEM_BAUD: u32 = 4800;

pub struct UartTransport {
    #[cfg(target_os = "espidf")]
    uart: UartDriver<'static>,
    #[cfg(not(target_os = "espidf"))]
    rx: VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

#[cfg(target_os = "espidf")]
impl UartTransport {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self { uart }
    }
}

#[cfg(target_os = "espidf")]
impl Transport for UartTransport {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.uart.write(data)
    }

    fn flush(&mut self) -> Result<(), EspError> {
        self.uart.wait_tx_done(BLOCK)
    }

    fn available(&self) -> bool {
        self.uart.remaining_read().is_ok_and(|n| n > 0)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for UartTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl UartTransport {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
        }
    }

    /// Queue bytes as if the modem had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Everything written since the last call.
    pub fn take_written(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Transport for UartTransport {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}
