//! Drives an [`AppService`] over the simulated UART, playing the modem's
//! side of the conversation.

use smsalert::adapters::uart::UartTransport;
use smsalert::app::ports::{CommandInterpreter, DeviceControl, StatusReporter};
use smsalert::app::service::AppService;
use smsalert::config::{PhoneNumber, Recipient, SystemConfig};
use smsalert::modem::ModemState;
use smsalert::sms::service::{POLL_INTERVAL_MS, SmsState};

pub const ADMIN: &str = "+441234567890";
pub const USER: &str = "+447700900123";
pub const STRANGER: &str = "+15550100";

const BOOT: &str = "\r\nSTART\r\n+CPIN: READY\r\nSMS DONE\r\nPB DONE\r\n";

pub fn recipient(number: &str, notify: bool, admin: bool) -> Recipient {
    Recipient {
        number: PhoneNumber::try_from(number).unwrap(),
        notify,
        admin,
    }
}

/// Admin in slot 1, plain user in slot 2.
pub fn default_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.recipients[0] = recipient(ADMIN, true, true);
    config.recipients[1] = recipient(USER, false, false);
    config
}

pub fn list_entry(index: u16, sender: &str, body: &str) -> String {
    format!("+CMGL: {index},\"REC UNREAD\",\"{sender}\",\"\",\"24/03/01,09:15:00+00\"\r\n{body}\r\n")
}

pub fn read_response(sender: &str, body: &str) -> String {
    format!("+CMGR: \"REC UNREAD\",\"{sender}\",\"\",\"24/03/01,09:15:00+00\"\r\n{body}\r\n\r\nOK\r\n")
}

pub struct Harness<H> {
    pub app: AppService<UartTransport>,
    pub host: H,
    pub now: u64,
}

#[allow(dead_code)]
impl<H> Harness<H>
where
    H: CommandInterpreter + StatusReporter + DeviceControl,
{
    /// A service whose modem has finished initialising.
    pub fn ready(config: SystemConfig, host: H) -> Self {
        let mut h = Self {
            app: AppService::new(config, UartTransport::new()),
            host,
            now: 0,
        };
        h.feed(BOOT);
        assert_eq!(h.written(), "ATE0\r");
        h.feed("ATE0\r\nOK\r\n");
        assert_eq!(h.written(), "AT+CMGF=1\r");
        h.feed("OK\r\n");
        assert_eq!(h.app.modem_state(), ModemState::Ready);
        assert_eq!(h.app.sms_state(), SmsState::Ready);
        h
    }

    pub fn tick(&mut self) {
        self.app.tick(self.now, &mut self.host);
    }

    /// Advance the clock and run one pass.
    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
        self.tick();
    }

    /// Deliver modem output, then let the engines run a few passes.
    pub fn feed(&mut self, data: &str) {
        self.app.link_mut().transport.inject(data.as_bytes());
        for _ in 0..3 {
            self.tick();
        }
    }

    /// Everything written to the modem since the last call.
    pub fn written(&mut self) -> String {
        let bytes = self.app.link_mut().transport.take_written();
        String::from_utf8(bytes).unwrap()
    }

    /// Let the poll timer fire; returns what was written (the list command).
    pub fn poll(&mut self) -> String {
        self.advance(u64::from(POLL_INTERVAL_MS));
        self.written()
    }

    /// Complete a send: prompt, body upload, confirmation.  Returns the
    /// uploaded body.
    pub fn complete_send(&mut self) -> String {
        self.feed("\r\n> ");
        let body = self.written();
        self.feed("\r\n+CMGS: 17\r\n\r\nOK\r\n");
        body
    }
}
