//! Alert rate limiting.
//!
//! Remembers the last few alerts sent and when each may be repeated.  The
//! ledger is a fixed ring: every accepted alert overwrites the oldest
//! record, even when the same alert already has a record elsewhere in the
//! ring.  With more than [`HISTORY_LEN`] distinct alerts in rotation, an
//! alert can therefore be repeated before its cooldown ends.

use heapless::HistoryBuffer;
use log::{debug, info};

/// Number of alerts remembered.
pub const HISTORY_LEN: usize = 8;

/// Seconds since boot.
pub type Secs = u64;

/// Alert categories, numbered as they appear in stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertKind {
    /// Sent once at boot (e.g. fewer sensors found than configured).
    Startup = 1,
    TempRangeLow = 2,
    TempRangeHigh = 3,
    /// A sensor's reading became unavailable or recovered.
    TempState = 4,
    MainsOff = 5,
    MainsOn = 6,
    LowBattery = 7,
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    kind: AlertKind,
    index: u8,
    next_allowed: Secs,
}

/// Fixed-capacity cooldown ledger keyed by (alert kind, sub-index).
pub struct AlertLedger {
    entries: HistoryBuffer<LedgerEntry, HISTORY_LEN>,
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertLedger {
    pub fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
        }
    }

    /// Ask to send alert (`kind`, `index`) at `now`.
    ///
    /// Refused while a record for the same key is still cooling down.
    /// Otherwise the alert is recorded with a cooldown of `cooldown_secs`
    /// in the next ring slot and `true` is returned.
    pub fn lodge(&mut self, kind: AlertKind, index: u8, cooldown_secs: u16, now: Secs) -> bool {
        let cooling = self
            .entries
            .as_slice()
            .iter()
            .any(|e| e.kind == kind && e.index == index && e.next_allowed > now);
        if cooling {
            debug!("sms: {:?}/{} still cooling down", kind, index);
            return false;
        }

        self.entries.write(LedgerEntry {
            kind,
            index,
            next_allowed: now + Secs::from(cooldown_secs),
        });
        info!(
            "sms: {:?}/{} lodged, next allowed in {}s",
            kind, index, cooldown_secs
        );
        true
    }
}
