//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the modem engine, the SMS engine and the modem
//! link.  One call to [`tick`](AppService::tick) is one pass of the
//! cooperative main loop:
//!
//! 1. dispatch expired timers,
//! 2. drain received modem bytes into the command engine,
//! 3. step the SMS engine once.
//!
//! Nothing here blocks, so the service needs no locking: every state
//! transition runs to completion inside `tick`.
//!
//! ```text
//!  Transport ──▶ ┌──────────────────────────────┐ ──▶ CommandInterpreter
//!                │          AppService           │
//!  TimerPort ◀──▶│  ModemEngine ──▶ SmsService   │ ──▶ StatusReporter
//!                └──────────────────────────────┘ ──▶ DeviceControl
//! ```

use log::info;

use crate::adapters::link::ModemLink;
use crate::config::SystemConfig;
use crate::modem::{ModemEngine, ModemState};
use crate::sms::history::{AlertKind, Secs};
use crate::sms::service::{AlertOutcome, SmsOp, SmsService, SmsState};
use crate::timer::{TICKS_PER_SECOND, Ticks};

use super::ports::{
    CommandInterpreter, DeviceControl, StatusReporter, TimerEvent, Transport,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<T> {
    modem: ModemEngine<SmsOp>,
    sms: SmsService,
    link: ModemLink<T>,
    /// Uptime of the last tick.
    now: Ticks,
}

impl<T: Transport> AppService<T> {
    pub fn new(config: SystemConfig, transport: T) -> Self {
        info!(
            "AppService: {} recipient(s) configured, resend delay {}s",
            config.recipients.iter().filter(|r| !r.is_empty()).count(),
            config.resend_delay_secs
        );
        Self {
            modem: ModemEngine::new(),
            sms: SmsService::new(config),
            link: ModemLink::new(transport),
            now: 0,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one main-loop pass at uptime `now` (milliseconds).
    pub fn tick<H>(&mut self, now: Ticks, host: &mut H)
    where
        H: CommandInterpreter + StatusReporter + DeviceControl,
    {
        self.now = self.now.max(now);

        // 1. Timers
        while let Some(fired) = self.link.timers.poll(self.now) {
            match fired.event {
                TimerEvent::ModemWatchdog => {
                    self.modem
                        .on_watchdog(&mut self.link, &mut self.sms, fired.handle);
                }
                TimerEvent::SmsPoll => self.sms.on_poll_timer(&mut self.link, fired.handle),
            }
        }

        // 2. Modem input
        self.modem.process(&mut self.link, &mut self.sms);

        // 3. SMS engine
        self.sms.process(&mut self.modem, &mut self.link, host);
    }

    // ── Alerts ────────────────────────────────────────────────

    /// Whether an alert can be queued right now.
    pub fn can_accept_alert(&self) -> bool {
        self.sms.can_accept_alert()
    }

    /// Queue an alert for broadcast, throttled per (`kind`, `index`).
    pub fn try_send(&mut self, kind: AlertKind, index: u8, message: &str) -> AlertOutcome {
        let now_secs: Secs = self.now / TICKS_PER_SECOND;
        self.sms.try_send(kind, index, message, now_secs)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn modem_state(&self) -> ModemState {
        self.modem.state()
    }

    pub fn sms_state(&self) -> SmsState {
        self.sms.state()
    }

    pub fn config(&self) -> &SystemConfig {
        self.sms.config()
    }

    pub fn link(&self) -> &ModemLink<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut ModemLink<T> {
        &mut self.link
    }
}
