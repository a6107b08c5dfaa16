//! Mock host for integration tests.
//!
//! Records every command, status request and restart so tests can assert
//! on what the SMS engine asked of its collaborators.

use smsalert::app::ports::{
    CommandError, CommandInterpreter, CommandOrigin, DeviceControl, StatusReporter,
};
use smsalert::config::{SmsText, SystemConfig};

pub const STATUS_TEXT: &str = "Freezer: -18.5\nPower: On";

pub struct MockHost {
    pub commands: Vec<(String, CommandOrigin)>,
    pub status_requests: u32,
    pub restarts: u32,
    /// What `execute` returns.
    pub command_result: Result<(), CommandError>,
    /// Written into the reply by `execute`, if set.
    pub command_reply: Option<&'static str>,
}

#[allow(dead_code)]
impl MockHost {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            status_requests: 0,
            restarts: 0,
            command_result: Ok(()),
            command_reply: None,
        }
    }
}

impl CommandInterpreter for MockHost {
    fn execute(
        &mut self,
        command: &str,
        _config: &mut SystemConfig,
        origin: CommandOrigin,
        reply: &mut SmsText,
    ) -> Result<(), CommandError> {
        self.commands.push((command.to_owned(), origin));
        if let Some(text) = self.command_reply {
            reply.push_str(text).unwrap();
        }
        self.command_result
    }
}

impl StatusReporter for MockHost {
    fn status_report(&mut self, out: &mut SmsText) {
        self.status_requests += 1;
        out.clear();
        out.push_str(STATUS_TEXT).unwrap();
    }
}

impl DeviceControl for MockHost {
    fn restart(&mut self) {
        self.restarts += 1;
    }
}
