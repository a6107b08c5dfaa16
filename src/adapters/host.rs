//! Device host: the collaborators the SMS engine calls out to.
//!
//! Bundles the configuration interpreter, the status board and the restart
//! hook behind the three host ports so [`crate::app::service::AppService`]
//! can take a single `&mut` to all of them.

use crate::adapters::commands::ConfigCommands;
use crate::adapters::status::StatusBoard;
use crate::app::ports::{
    CommandError, CommandInterpreter, CommandOrigin, ConfigPort, DeviceControl, StatusReporter,
};
use crate::config::{SmsText, SystemConfig};
use log::warn;

pub struct DeviceHost<P> {
    pub commands: ConfigCommands<P>,
    pub status: StatusBoard,
    #[cfg(not(target_os = "espidf"))]
    restarts: u32,
}

impl<P: ConfigPort> DeviceHost<P> {
    pub fn new(store: P, status: StatusBoard) -> Self {
        Self {
            commands: ConfigCommands::new(store),
            status,
            #[cfg(not(target_os = "espidf"))]
            restarts: 0,
        }
    }

    /// Restarts requested so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

impl<P: ConfigPort> CommandInterpreter for DeviceHost<P> {
    fn execute(
        &mut self,
        command: &str,
        config: &mut SystemConfig,
        origin: CommandOrigin,
        reply: &mut SmsText,
    ) -> Result<(), CommandError> {
        self.commands.execute(command, config, origin, reply)
    }
}

impl<P> StatusReporter for DeviceHost<P> {
    fn status_report(&mut self, out: &mut SmsText) {
        self.status.status_report(out);
    }
}

impl<P> DeviceControl for DeviceHost<P> {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        warn!("host: restarting");
        esp_idf_hal::reset::restart();
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        warn!("host: restart requested (sim)");
        self.restarts += 1;
    }
}
