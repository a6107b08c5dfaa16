//! AT-dialect literals for SIMCom-style modems.
//!
//! Everything the engine writes or matches on lives here, so a different
//! firmware dialect only touches this file.

use core::fmt::Write;
use heapless::String;

/// Longest command the engine builds (`AT+CMGS="<15 digits>"\r`).
pub const MAX_COMMAND_LEN: usize = 32;

pub type Command = String<MAX_COMMAND_LEN>;

// ── Unsolicited banners ───────────────────────────────────────

/// Emitted once after power-up; also signals an unexpected modem reboot.
pub const BANNER_START: &str = "START";
pub const BANNER_SIM_READY: &str = "+CPIN: READY";
pub const BANNER_SMS_READY: &str = "SMS DONE";
pub const BANNER_PHONEBOOK_READY: &str = "PB DONE";

// ── Responses and markers ─────────────────────────────────────

pub const OK: &str = "OK";
/// Input prompt sent after `AT+CMGS` while the modem waits for the body.
pub const SEND_PROMPT: &str = "> ";
pub const SENT_MARKER: &str = "+CMGS:";
pub const READ_MARKER: &str = "+CMGR:";
pub const LIST_MARKER: &str = "+CMGL:";
/// Prefix stripped from the first field of a read response.
pub const READ_STATUS_PREFIX: &str = "+CMGR: \"";
/// Prefix stripped from the first field of a list entry.
pub const LIST_INDEX_PREFIX: &str = "+CMGL: ";

/// Ctrl-Z: ends the body upload.
pub const UPLOAD_TERMINATOR: u8 = 0x1A;

// ── Fixed commands ────────────────────────────────────────────

pub const ECHO_OFF: &str = "ATE0\r";
/// What the modem echoes back before echo is disabled.
pub const ECHO_OFF_ECHO: &str = "ATE0";
pub const TEXT_MODE: &str = "AT+CMGF=1\r";
pub const LIST_ALL: &str = "AT+CMGL=\"ALL\"\r";
pub const DELETE_ALL_READ: &str = "AT+CMGD=0,2\r";

// ── Parameterised commands ────────────────────────────────────

pub fn send_sms(recipient: &str) -> Option<Command> {
    let mut cmd = Command::new();
    write!(cmd, "AT+CMGS=\"{}\"\r", recipient).ok()?;
    Some(cmd)
}

pub fn read_sms(index: u16) -> Option<Command> {
    let mut cmd = Command::new();
    write!(cmd, "AT+CMGR={}\r", index).ok()?;
    Some(cmd)
}

pub fn delete_sms(index: u16) -> Option<Command> {
    let mut cmd = Command::new();
    write!(cmd, "AT+CMGD={},0\r", index).ok()?;
    Some(cmd)
}
