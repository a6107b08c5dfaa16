//! SMS alert firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  UartTransport   NvsAdapter    DeviceHost      Esp32Time     │
//! │  (Transport)     (ConfigPort)  (commands,      (uptime)      │
//! │                                 status, reset)               │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              AppService (pure logic)                   │  │
//! │  │  ModemEngine · SmsService · AlertLedger · timers       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Signal       | GPIO |
//! |--------------|------|
//! | Modem TX     | 17   |
//! | Modem RX     | 18   |
//! | Modem PWRKEY | 4    |
//! | Modem RESET  | 5    |

#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::info;

use smsalert::adapters::host::DeviceHost;
use smsalert::adapters::nvs::NvsAdapter;
use smsalert::adapters::status::StatusBoard;
use smsalert::adapters::time::Esp32TimeAdapter;
use smsalert::adapters::uart::{MODEM_BAUD, UartTransport};
use smsalert::app::service::AppService;
use smsalert::drivers::modem_power::ModemPower;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SMS alert v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Config ─────────────────────────────────────────────
    let mut nvs = NvsAdapter::new()?;
    let config = nvs.load_or_default();

    // ── 3. Modem link ─────────────────────────────────────────
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(MODEM_BAUD)),
    )?;

    let mut power = ModemPower::new(
        PinDriver::output(peripherals.pins.gpio4)?,
        PinDriver::output(peripherals.pins.gpio5)?,
    );
    power.power_on(&mut FreeRtos)?;

    // ── 4. Services ───────────────────────────────────────────
    let mut app = AppService::new(config, UartTransport::new(uart));
    let mut host = DeviceHost::new(nvs, StatusBoard::new());
    let clock = Esp32TimeAdapter::new();

    info!("Entering main loop");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        app.tick(clock.uptime_ms(), &mut host);
        FreeRtos::delay_ms(1);
    }
}
