//! SMS application engine.
//!
//! Polls the modem for stored messages, authorises each sender against the
//! recipient table, runs its command, replies, and deletes the message.
//! Between polls it broadcasts throttled alerts to every notify-enabled
//! recipient.
//!
//! ```text
//!                 poll timer                    end of list
//!   Ready ─────────────────▶ FetchUnreadStart ──▶ FetchingUnread ──────▶ ReadNextPending ◀────┐
//!     ▲  │                                                                 │ read ok           │
//!     │  │ broadcast pending                               none left ──────┤                   │
//!     │  ▼                                                                 ▼                   │
//!     │ BroadcastStart ──▶ Broadcasting ──┐                        DispatchCommand             │
//!     │                                   │                          │ authorised: reply       │
//!     └───────────────────────────────────┘                          ▼                         │
//!                 all recipients visited           ExecutingCommand / AwaitingReply            │
//!                                                                     │ unauthorised: no reply │
//!                                                                     ▼                        │
//!                                                        DeleteStart ──▶ Deleting ─────────────┘
//! ```
//!
//! Every step is driven by [`SmsService::process`] from the main loop and
//! by modem callbacks through the [`ModemListener`] implementation.  At most
//! one modem operation is outstanding: the `dispatched` / `processed`
//! cursors must agree before the next read or broadcast send is issued.

use crate::app::ports::{
    CommandInterpreter, CommandOrigin, DeviceControl, StatusReporter, TimerHandle, TimerEvent,
    TimerPort, Transport,
};
use crate::config::{MAX_RECIPIENTS, SmsText, SystemConfig};
use crate::error::ModemError;
use crate::modem::{ModemEngine, ModemListener, SmsRecord};
use crate::sms::history::{AlertKind, AlertLedger, Secs};
use crate::sms::phone::numbers_match;
use crate::text::copy_truncated;
use heapless::{String, Vec};
use log::{debug, error, info, warn};

/// Interval between checks for new messages.
pub const POLL_INTERVAL_MS: u32 = 3000;

/// Most messages handled per poll; the rest wait for the next one.
pub const MAX_UNREAD: usize = 16;

/// Longest sender number kept (modems may report extra digits).
const MAX_SENDER_LEN: usize = 24;

pub const REPLY_RESET_SCHEDULED: &str = "Reset has been scheduled";
pub const REPLY_BAD_COMMAND: &str = "Bad or unknown command";
pub const REPLY_ACCEPTED: &str = "Command accepted";

const COMMAND_STATUS: &str = "status";
const COMMAND_RESET: &str = "reset";

// ═══════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsState {
    /// Waiting for the modem to finish initialising.
    Init,
    Ready,
    FetchUnreadStart,
    FetchingUnread,
    ReadNextPending,
    DispatchCommand,
    /// The configuration interpreter is running the command.
    ExecutingCommand,
    /// The reply to the sender is being sent.
    AwaitingReply,
    DeleteStart,
    Deleting,
    BroadcastStart,
    Broadcasting,
}

/// Tags the modem operation the engine is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsOp {
    ListUnread,
    Read,
    Reply,
    Delete,
    Broadcast,
}

/// Result of [`SmsService::try_send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Queued for broadcast.
    Queued,
    /// The same alert was sent too recently.
    Throttled,
    /// Another broadcast is still in progress; nothing was recorded.
    Busy,
}

// ═══════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════

pub struct SmsService {
    state: SmsState,
    config: SystemConfig,
    /// Body of the message being handled.
    text: SmsText,
    sender: String<MAX_SENDER_LEN>,
    reply: SmsText,
    unread: Vec<u16, MAX_UNREAD>,
    dispatched: usize,
    processed: usize,
    poll_timer: Option<TimerHandle>,
    /// An admin asked for a restart; it happens once the command is deleted.
    reset_pending: bool,
    restart_due: bool,
    /// The alert being broadcast.  `Some` means busy.
    broadcast: Option<SmsText>,
    ledger: AlertLedger,
}

impl SmsService {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            state: SmsState::Init,
            config,
            text: SmsText::new(),
            sender: String::new(),
            reply: SmsText::new(),
            unread: Vec::new(),
            dispatched: 0,
            processed: 0,
            poll_timer: None,
            reset_pending: false,
            restart_due: false,
            broadcast: None,
            ledger: AlertLedger::new(),
        }
    }

    pub fn state(&self) -> SmsState {
        self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Alerts ────────────────────────────────────────────────

    /// Whether a new alert can be queued right now.
    pub fn can_accept_alert(&self) -> bool {
        self.broadcast.is_none()
    }

    /// Queue `message` for every notify-enabled recipient, subject to the
    /// per-(`kind`, `index`) resend delay.
    pub fn try_send(&mut self, kind: AlertKind, index: u8, message: &str, now: Secs) -> AlertOutcome {
        if !self.can_accept_alert() {
            warn!("sms: broadcast in progress, dropping {:?}/{}", kind, index);
            return AlertOutcome::Busy;
        }
        if !self
            .ledger
            .lodge(kind, index, self.config.resend_delay_secs, now)
        {
            info!("sms: too early to repeat {:?}/{}", kind, index);
            return AlertOutcome::Throttled;
        }

        let mut text = SmsText::new();
        copy_truncated(&mut text, message);
        self.broadcast = Some(text);
        AlertOutcome::Queued
    }

    // ── Timer ─────────────────────────────────────────────────

    /// The poll timer fired.
    pub fn on_poll_timer<T: TimerPort>(&mut self, timers: &mut T, handle: TimerHandle) {
        if self.poll_timer == Some(handle) {
            self.poll_timer = None;
        }
        timers.destroy(handle);

        if self.state == SmsState::Ready {
            self.state = SmsState::FetchUnreadStart;
        } else {
            debug!("sms: poll skipped, busy in {:?}", self.state);
        }
    }

    // ── Main-loop step ────────────────────────────────────────

    /// Advance the engine by one step.
    pub fn process<I, H>(&mut self, modem: &mut ModemEngine<SmsOp>, io: &mut I, host: &mut H)
    where
        I: Transport + TimerPort,
        H: CommandInterpreter + StatusReporter + DeviceControl,
    {
        if self.restart_due {
            self.restart_due = false;
            info!("sms: restarting as requested");
            host.restart();
        }

        match self.state {
            SmsState::Init
            | SmsState::FetchingUnread
            | SmsState::ExecutingCommand
            | SmsState::AwaitingReply
            | SmsState::Deleting => {}

            SmsState::Ready => {
                if self.broadcast.is_some() {
                    self.state = SmsState::BroadcastStart;
                } else if self.poll_timer.is_none() {
                    self.poll_timer =
                        io.create(POLL_INTERVAL_MS, false, true, TimerEvent::SmsPoll);
                    if self.poll_timer.is_none() {
                        error!("sms: no timer available for polling");
                    }
                }
            }

            SmsState::FetchUnreadStart => {
                self.unread.clear();
                self.dispatched = 0;
                self.processed = 0;
                self.state = SmsState::FetchingUnread;
                modem.list_unread(io, self, SmsOp::ListUnread);
            }

            SmsState::ReadNextPending => {
                if self.dispatched != self.processed {
                    return;
                }
                match self.unread.get(self.processed).copied() {
                    None => {
                        debug!("sms: all messages handled");
                        self.state = SmsState::Ready;
                    }
                    Some(index) => {
                        debug!("sms: reading message {}", index);
                        self.dispatched += 1;
                        modem.read(io, self, index, SmsOp::Read);
                    }
                }
            }

            SmsState::DispatchCommand => self.dispatch_command(modem, io, host),

            SmsState::DeleteStart => {
                let Some(index) = self
                    .processed
                    .checked_sub(1)
                    .and_then(|pos| self.unread.get(pos).copied())
                else {
                    error!("sms: no message to delete");
                    self.state = SmsState::ReadNextPending;
                    return;
                };
                self.state = SmsState::Deleting;
                modem.delete(io, self, index, SmsOp::Delete);
            }

            SmsState::BroadcastStart => {
                self.dispatched = 0;
                self.processed = 0;
                self.state = SmsState::Broadcasting;
            }

            SmsState::Broadcasting => self.broadcast_next(modem, io),
        }
    }

    /// Authorise the sender and act on the message.
    fn dispatch_command<I, H>(&mut self, modem: &mut ModemEngine<SmsOp>, io: &mut I, host: &mut H)
    where
        I: Transport + TimerPort,
        H: CommandInterpreter + StatusReporter,
    {
        let mut status_request = false;
        let mut admin = false;
        for recipient in &self.config.recipients {
            if !numbers_match(&recipient.number, &self.sender) {
                continue;
            }
            if self.text.eq_ignore_ascii_case(COMMAND_STATUS) {
                status_request = true;
                break;
            }
            if recipient.admin {
                admin = true;
                break;
            }
        }

        self.reply.clear();
        if status_request {
            info!("sms: status requested by {}", self.sender);
            host.status_report(&mut self.reply);
        } else if admin && self.text.eq_ignore_ascii_case(COMMAND_RESET) {
            info!("sms: reset requested by {}", self.sender);
            self.reset_pending = true;
            copy_truncated(&mut self.reply, REPLY_RESET_SCHEDULED);
        } else if admin {
            info!("sms: command '{}' from {}", self.text, self.sender);
            self.state = SmsState::ExecutingCommand;
            let result = host.execute(
                &self.text,
                &mut self.config,
                CommandOrigin::Sms,
                &mut self.reply,
            );
            if let Err(e) = result {
                warn!("sms: command rejected: {}", e);
            }
            if self.reply.is_empty() {
                let default = if result.is_ok() {
                    REPLY_ACCEPTED
                } else {
                    REPLY_BAD_COMMAND
                };
                copy_truncated(&mut self.reply, default);
            }
        } else {
            // Unknown senders get no hint that the message was seen.
            info!("sms: ignoring message from {}", self.sender);
            self.state = SmsState::DeleteStart;
            return;
        }

        self.send_reply(modem, io);
    }

    fn send_reply<I>(&mut self, modem: &mut ModemEngine<SmsOp>, io: &mut I)
    where
        I: Transport + TimerPort,
    {
        let to = self.sender.clone();
        let body = self.reply.clone();
        self.state = SmsState::AwaitingReply;
        modem.send(io, self, &to, &body, SmsOp::Reply);
    }

    fn broadcast_next<I>(&mut self, modem: &mut ModemEngine<SmsOp>, io: &mut I)
    where
        I: Transport + TimerPort,
    {
        if self.dispatched != self.processed {
            return;
        }
        if self.processed >= MAX_RECIPIENTS {
            info!("sms: broadcast complete");
            self.broadcast = None;
            self.state = SmsState::Ready;
            return;
        }

        let slot = self.processed;
        let recipient = &self.config.recipients[slot];
        if recipient.is_empty() || !recipient.notify {
            debug!("sms: recipient {} skipped", slot + 1);
            self.dispatched += 1;
            self.processed += 1;
            return;
        }

        let to = recipient.number.clone();
        let Some(body) = self.broadcast.clone() else {
            self.state = SmsState::Ready;
            return;
        };
        info!("sms: alerting recipient {} ({})", slot + 1, to);
        self.dispatched += 1;
        modem.send(io, self, &to, &body, SmsOp::Broadcast);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Modem callbacks
// ═══════════════════════════════════════════════════════════════

impl ModemListener for SmsService {
    type Context = SmsOp;

    fn on_ready(&mut self) {
        info!("sms: modem ready");
        self.state = SmsState::Ready;
    }

    fn on_success(&mut self, op: SmsOp) {
        match (op, self.state) {
            (SmsOp::Reply, SmsState::AwaitingReply) => self.state = SmsState::DeleteStart,
            (SmsOp::Broadcast, SmsState::Broadcasting) => self.processed += 1,
            (SmsOp::Delete, SmsState::Deleting) => {
                self.state = SmsState::ReadNextPending;
                if self.reset_pending {
                    self.reset_pending = false;
                    self.restart_due = true;
                }
            }
            (op, state) => error!("sms: unexpected {:?} success in {:?}", op, state),
        }
    }

    fn on_failure(&mut self, op: SmsOp, error: ModemError) {
        match (op, self.state) {
            (SmsOp::ListUnread, SmsState::FetchingUnread) => {
                error!("sms: listing messages failed: {}", error);
                self.state = SmsState::Ready;
            }
            (SmsOp::Read, SmsState::ReadNextPending) => {
                warn!("sms: read failed ({}), skipping", error);
                self.processed += 1;
            }
            (SmsOp::Reply, SmsState::AwaitingReply) => {
                warn!("sms: reply failed ({}), deleting anyway", error);
                self.state = SmsState::DeleteStart;
            }
            (SmsOp::Broadcast, SmsState::Broadcasting) => {
                warn!("sms: alert send failed: {}", error);
                self.processed += 1;
            }
            (SmsOp::Delete, SmsState::Deleting) => {
                error!("sms: delete failed: {}", error);
                self.state = SmsState::ReadNextPending;
            }
            (op, state) => error!("sms: unexpected {:?} failure in {:?}", op, state),
        }
    }

    fn on_message(&mut self, op: SmsOp, message: &SmsRecord<'_>) {
        match (op, self.state) {
            (SmsOp::ListUnread, SmsState::FetchingUnread) => {
                if self.unread.push(message.index).is_err() {
                    warn!("sms: too many messages, {} left for later", message.index);
                }
            }
            (SmsOp::Read, SmsState::ReadNextPending) => {
                copy_truncated(&mut self.text, message.body);
                copy_truncated(&mut self.sender, message.sender);
                self.processed += 1;
                self.state = SmsState::DispatchCommand;
            }
            (op, state) => error!("sms: unexpected {:?} message in {:?}", op, state),
        }
    }

    fn on_end_of_list(&mut self, op: SmsOp) {
        if op == SmsOp::ListUnread && self.state == SmsState::FetchingUnread {
            debug!("sms: {} message(s) stored", self.unread.len());
            self.dispatched = 0;
            self.processed = 0;
            self.state = SmsState::ReadNextPending;
        } else {
            error!("sms: unexpected end of list in {:?}", self.state);
        }
    }
}
