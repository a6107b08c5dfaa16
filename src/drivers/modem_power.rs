//! GSM modem power-up sequence.
//!
//! The modem has an active-low reset line and a power key that must be
//! pulsed high to switch it on:
//!
//! ```text
//! RESET  ‾‾‾‾\_____/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//! PWRKEY _____________________/‾‾‾‾‾‾‾\____
//!              10ms    10ms     100ms
//! ```
//!
//! Generic over `embedded-hal` pins and delay so the sequence can be
//! checked on the host.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};

const RESET_HOLD_MS: u32 = 10;
const RESET_SETTLE_MS: u32 = 10;
const POWER_PULSE_MS: u32 = 100;

pub struct ModemPower<PWR, RST> {
    pwr: PWR,
    rst: RST,
}

impl<PWR: OutputPin, RST: OutputPin> ModemPower<PWR, RST> {
    pub fn new(pwr: PWR, rst: RST) -> Self {
        Self { pwr, rst }
    }

    /// Hold the modem in reset, release it, then pulse the power key.
    pub fn power_on(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        self.rst.set_low().map_err(|_| Error::Init("modem reset pin"))?;
        self.pwr.set_low().map_err(|_| Error::Init("modem power pin"))?;
        delay.delay_ms(RESET_HOLD_MS);

        self.rst.set_high().map_err(|_| Error::Init("modem reset pin"))?;
        delay.delay_ms(RESET_SETTLE_MS);

        self.pwr.set_high().map_err(|_| Error::Init("modem power pin"))?;
        delay.delay_ms(POWER_PULSE_MS);
        self.pwr.set_low().map_err(|_| Error::Init("modem power pin"))?;

        log::info!("modem: power key pulsed");
        Ok(())
    }
}
