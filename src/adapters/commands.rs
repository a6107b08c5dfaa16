//! Configuration command interpreter.
//!
//! Implements [`CommandInterpreter`] over a [`ConfigPort`].  Understands:
//!
//! | Command                            | Effect                          |
//! |------------------------------------|---------------------------------|
//! | `resenddelay <secs>`               | alert resend delay              |
//! | `recipient <1-4> number <digits>`  | set a recipient's number        |
//! | `recipient <1-4> notify <0/1>`     | receive broadcast alerts        |
//! | `recipient <1-4> admin <0/1>`      | allow SMS commands              |
//! | `recipient <1-4> show`             | reply with the slot's settings  |
//! | `recipient <1-4> default`          | clear the slot                  |
//! | `save`                             | persist the configuration       |
//!
//! `user` is accepted as an alias of `recipient`.  Changes that arrive by
//! SMS are persisted immediately, since there is no console session to
//! `save` from afterwards.

use core::fmt::Write;

use crate::app::ports::{CommandError, CommandInterpreter, CommandOrigin, ConfigPort};
use crate::config::{MAX_RECIPIENTS, PhoneNumber, Recipient, SmsText, SystemConfig, is_valid_number};
use log::info;

/// Commands that only make sense on the local console.
const CONSOLE_ONLY: &[&str] = &[
    "show",
    "default",
    "run",
    "help",
    "readtemp",
    "i2creadreg",
    "i2creadreg16",
    "i2creadbuf",
    "i2cwritereg",
    "i2cwritereg16",
];

pub struct ConfigCommands<P> {
    store: P,
}

impl<P: ConfigPort> ConfigCommands<P> {
    pub fn new(store: P) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Apply `command`, returning whether the config changed.
    fn apply(
        &mut self,
        command: &str,
        config: &mut SystemConfig,
        origin: CommandOrigin,
        reply: &mut SmsText,
    ) -> Result<bool, CommandError> {
        let mut words = command.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Unknown);
        };
        let verb_is = |name: &str| verb.eq_ignore_ascii_case(name);

        if verb_is("resenddelay") {
            let secs: u16 = parse_arg(words.next())?;
            if secs == 0 {
                return Err(CommandError::InvalidArgument);
            }
            config.resend_delay_secs = secs;
            return Ok(true);
        }

        if verb_is("recipient") || verb_is("user") {
            let slot: usize = parse_arg(words.next())?;
            if !(1..=MAX_RECIPIENTS).contains(&slot) {
                return Err(CommandError::InvalidArgument);
            }
            let field = words.next().ok_or(CommandError::InvalidArgument)?;
            return apply_recipient(&mut config.recipients[slot - 1], field, words.next(), reply);
        }

        if verb_is("save") {
            self.store.save(config)?;
            return Ok(false);
        }

        if CONSOLE_ONLY.iter().any(|c| verb_is(*c)) {
            if origin == CommandOrigin::Sms {
                return Err(CommandError::NotPermitted);
            }
            if verb_is("default") {
                *config = SystemConfig::default();
                return Ok(true);
            }
        }

        Err(CommandError::Unknown)
    }
}

fn parse_arg<T: core::str::FromStr>(arg: Option<&str>) -> Result<T, CommandError> {
    arg.and_then(|a| a.parse().ok())
        .ok_or(CommandError::InvalidArgument)
}

fn parse_flag(arg: Option<&str>) -> Result<bool, CommandError> {
    match arg {
        Some("0") => Ok(false),
        Some("1") => Ok(true),
        _ => Err(CommandError::InvalidArgument),
    }
}

fn apply_recipient(
    recipient: &mut Recipient,
    field: &str,
    arg: Option<&str>,
    reply: &mut SmsText,
) -> Result<bool, CommandError> {
    match field.to_ascii_lowercase().as_str() {
        "number" => {
            let number = arg
                .filter(|n| is_valid_number(n))
                .ok_or(CommandError::InvalidArgument)?;
            recipient.number =
                PhoneNumber::try_from(number).map_err(|_| CommandError::InvalidArgument)?;
        }
        "notify" => recipient.notify = parse_flag(arg)?,
        "admin" => recipient.admin = parse_flag(arg)?,
        "default" => *recipient = Recipient::default(),
        "show" => {
            reply.clear();
            // Fits: 15-digit number plus labels is well under an SMS.
            let _ = write!(
                reply,
                "Number: {}\nNotify: {}\nAdmin: {}",
                recipient.number,
                u8::from(recipient.notify),
                u8::from(recipient.admin)
            );
            return Ok(false);
        }
        _ => return Err(CommandError::InvalidArgument),
    }
    Ok(true)
}

impl<P: ConfigPort> CommandInterpreter for ConfigCommands<P> {
    fn execute(
        &mut self,
        command: &str,
        config: &mut SystemConfig,
        origin: CommandOrigin,
        reply: &mut SmsText,
    ) -> Result<(), CommandError> {
        let changed = self.apply(command, config, origin, reply)?;
        if changed {
            info!("config: '{}' applied ({:?})", command, origin);
            if origin == CommandOrigin::Sms {
                self.store.save(config)?;
            }
        }
        Ok(())
    }
}
