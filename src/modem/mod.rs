//! AT command engine for the cellular modem.
//!
//! Drives a serial-attached modem through its boot banners, echo/text-mode
//! setup and the SMS commands (send, read, list, delete).  Exactly one
//! operation can be in flight; its outcome is reported through a
//! [`ModemListener`] together with the caller's context value.
//!
//! ```text
//!            banners ×4            OK                OK
//!   Init ───────────────▶ AwaitEchoOff ──▶ AwaitTextMode ──▶ Ready
//!                                                             │
//!      ┌───────────────────┬──────────────────┬───────────────┤
//!      ▼ send              ▼ read             ▼ list          ▼ delete
//!  AwaitSendPrompt     AwaitReadMeta      AwaitListMeta ◀┐  AwaitGenericResponse
//!      │ "> "              │ +CMGR:           │ +CMGL:    │
//!      ▼                   ▼                  ▼           │
//!  AwaitSendConfirm    AwaitReadText      AwaitListText ──┘
//! ```
//!
//! Leaving `Ready` arms a 60 s watchdog; returning to `Ready` disarms it.
//! A `START` banner in any line-oriented state means the modem rebooted.

pub mod at;

use crate::app::ports::{TimerEvent, TimerHandle, TimerPort, Transport};
use crate::config::{MAX_SMS_LEN, SmsText};
use crate::error::ModemError;
use crate::text::{self, FieldCursor};
use heapless::String;
use log::{debug, error, info, warn};

/// Line receive buffer size.
pub const LINE_BUFFER_LEN: usize = 128;

/// Message receive buffer: four hex digits per character of a full SMS.
pub const MESSAGE_BUFFER_LEN: usize = MAX_SMS_LEN * 4;

/// Abort timeout for any operation started from `Ready`.
pub const WATCHDOG_MS: u32 = 60_000;

/// Bytes pulled from the transport per read call.
const RX_CHUNK: usize = 32;

// ═══════════════════════════════════════════════════════════════
//  Public types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemState {
    Init,
    Ready,
    AwaitEchoOff,
    AwaitTextMode,
    AwaitSendPrompt,
    AwaitSendConfirm,
    AwaitReadMeta,
    AwaitReadText,
    AwaitListMeta,
    AwaitListText,
    AwaitGenericResponse,
}

impl ModemState {
    /// States in which incoming bytes belong to a message body.
    fn collects_message(self) -> bool {
        matches!(self, Self::AwaitReadText | Self::AwaitListText)
    }
}

/// A message delivered by a read or list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmsRecord<'a> {
    /// Modem storage index.
    pub index: u16,
    /// Storage status, e.g. `REC UNREAD`.
    pub status: &'a str,
    /// Originating number as reported by the modem.
    pub sender: &'a str,
    /// Decoded body.
    pub body: &'a str,
}

/// Receives operation outcomes from the [`ModemEngine`].
///
/// Every operation ends in exactly one `on_success` or `on_failure` call,
/// except reads and lists, which deliver their result through
/// `on_message` / `on_end_of_list` instead of `on_success`.
pub trait ModemListener {
    /// Caller-chosen tag handed back with each outcome.
    type Context: Copy + core::fmt::Debug;

    /// Initialisation finished; the modem accepts operations.
    fn on_ready(&mut self) {}

    fn on_success(&mut self, ctx: Self::Context);

    fn on_failure(&mut self, ctx: Self::Context, error: ModemError);

    /// A message arrived for a read or list operation.
    fn on_message(&mut self, ctx: Self::Context, message: &SmsRecord<'_>) {
        let _ = (ctx, message);
    }

    /// A list operation has delivered its last message.
    fn on_end_of_list(&mut self, ctx: Self::Context) {
        let _ = ctx;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Internal bookkeeping
// ═══════════════════════════════════════════════════════════════

/// Boot banners seen since the last `START`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct InitFlags(u8);

impl InitFlags {
    const START: u8 = 1 << 0;
    const SIM_READY: u8 = 1 << 1;
    const SMS_READY: u8 = 1 << 2;
    const PHONEBOOK_READY: u8 = 1 << 3;
    const ALL: u8 = Self::START | Self::SIM_READY | Self::SMS_READY | Self::PHONEBOOK_READY;

    fn banner(line: &str) -> Option<u8> {
        match line {
            at::BANNER_START => Some(Self::START),
            at::BANNER_SIM_READY => Some(Self::SIM_READY),
            at::BANNER_SMS_READY => Some(Self::SMS_READY),
            at::BANNER_PHONEBOOK_READY => Some(Self::PHONEBOOK_READY),
            _ => None,
        }
    }

    fn complete(self) -> bool {
        self.0 == Self::ALL
    }
}

/// The single in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp<C> {
    None,
    /// Send or delete: plain success / failure.
    Command(C),
    /// Single read: one `on_message`, index taken from the request.
    Read(C),
    /// List: any number of `on_message`, then `on_end_of_list`.
    List(C),
}

impl<C: Copy> PendingOp<C> {
    fn context(self) -> Option<C> {
        match self {
            Self::None => None,
            Self::Command(ctx) | Self::Read(ctx) | Self::List(ctx) => Some(ctx),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════

/// AT-dialect protocol state machine.
///
/// `C` is the context type of the listener that drives it.  The engine
/// never blocks: operations write their command and return, and the
/// outcome arrives later through [`process`](Self::process) or
/// [`on_watchdog`](Self::on_watchdog).
pub struct ModemEngine<C> {
    state: ModemState,
    init: InitFlags,
    line: String<LINE_BUFFER_LEN>,
    message: String<MESSAGE_BUFFER_LEN>,
    /// Body waiting for the send prompt.
    body: SmsText,
    pending: PendingOp<C>,
    watchdog: Option<TimerHandle>,
    /// Index of the message being read; read responses never restate it.
    read_index: u16,
}

impl<C: Copy + core::fmt::Debug> Default for ModemEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Copy + core::fmt::Debug> ModemEngine<C> {
    pub fn new() -> Self {
        Self {
            state: ModemState::Init,
            init: InitFlags::default(),
            line: String::new(),
            message: String::new(),
            body: SmsText::new(),
            pending: PendingOp::None,
            watchdog: None,
            read_index: 0,
        }
    }

    pub fn state(&self) -> ModemState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ModemState::Ready
    }

    // ── Input ─────────────────────────────────────────────────

    /// Drain every byte the transport has buffered.
    pub fn process<I, L>(&mut self, io: &mut I, listener: &mut L)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        let mut chunk = [0u8; RX_CHUNK];
        while io.available() {
            let n = match io.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("modem: serial read failed: {:?}", e);
                    break;
                }
            };
            for &byte in &chunk[..n] {
                self.feed(io, listener, byte);
            }
        }
    }

    /// Route one received byte.
    pub fn feed<I, L>(&mut self, io: &mut I, listener: &mut L, byte: u8)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if byte == b'\r' {
            return;
        }

        if self.state.collects_message() {
            if byte == b'\n' {
                self.finish_record(io, listener);
            } else {
                // Overflowing bytes are dropped; the decoder rejects the result.
                let _ = self.message.push(char::from(byte));
            }
            return;
        }

        if byte == b'\n' {
            if !self.line.is_empty() {
                self.handle_line(io, listener);
            }
            return;
        }

        let _ = self.line.push(char::from(byte));
        // The prompt has no line ending.
        if self.state == ModemState::AwaitSendPrompt && self.line.starts_with(at::SEND_PROMPT) {
            self.upload_body(io, listener);
        }
    }

    /// The send prompt arrived: upload the stored body.
    fn upload_body<I, L>(&mut self, io: &mut I, listener: &mut L)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        self.line.clear();
        self.enter(io, ModemState::AwaitSendConfirm);
        let sent = write_all(io, self.body.as_bytes()) && write_all(io, &[at::UPLOAD_TERMINATOR]);
        if !sent {
            self.finish(io, listener, Err(ModemError::Transport));
        }
    }

    /// The watchdog created by this engine has fired.
    pub fn on_watchdog<I, L>(&mut self, io: &mut I, listener: &mut L, handle: TimerHandle)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if self.watchdog != Some(handle) {
            debug!("modem: ignoring stale watchdog {:?}", handle);
            return;
        }
        error!(
            "modem: no response within {} ms in {:?}, aborting",
            WATCHDOG_MS, self.state
        );
        self.finish(io, listener, Err(ModemError::Timeout));
    }

    // ── Operations ────────────────────────────────────────────

    /// Send `body` to `recipient`.
    pub fn send<I, L>(&mut self, io: &mut I, listener: &mut L, recipient: &str, body: &str, ctx: C)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if !self.accepts(listener, ctx) {
            return;
        }
        let Some(cmd) = at::send_sms(recipient) else {
            listener.on_failure(ctx, ModemError::Overflow);
            return;
        };
        text::copy_truncated(&mut self.body, body);
        info!("modem: sending {} chars to {}", self.body.chars().count(), recipient);
        self.begin(io, listener, PendingOp::Command(ctx), ModemState::AwaitSendPrompt, &cmd);
    }

    /// Read the message stored at `index`.
    pub fn read<I, L>(&mut self, io: &mut I, listener: &mut L, index: u16, ctx: C)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if !self.accepts(listener, ctx) {
            return;
        }
        let Some(cmd) = at::read_sms(index) else {
            listener.on_failure(ctx, ModemError::Overflow);
            return;
        };
        self.read_index = index;
        self.begin(io, listener, PendingOp::Read(ctx), ModemState::AwaitReadMeta, &cmd);
    }

    /// List every stored message.
    pub fn list_unread<I, L>(&mut self, io: &mut I, listener: &mut L, ctx: C)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if !self.accepts(listener, ctx) {
            return;
        }
        self.begin(io, listener, PendingOp::List(ctx), ModemState::AwaitListMeta, at::LIST_ALL);
    }

    /// Delete the message stored at `index`.
    pub fn delete<I, L>(&mut self, io: &mut I, listener: &mut L, index: u16, ctx: C)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if !self.accepts(listener, ctx) {
            return;
        }
        let Some(cmd) = at::delete_sms(index) else {
            listener.on_failure(ctx, ModemError::Overflow);
            return;
        };
        self.begin(io, listener, PendingOp::Command(ctx), ModemState::AwaitGenericResponse, &cmd);
    }

    /// Delete every message already marked read.
    pub fn delete_all_read<I, L>(&mut self, io: &mut I, listener: &mut L, ctx: C)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        if !self.accepts(listener, ctx) {
            return;
        }
        self.begin(
            io,
            listener,
            PendingOp::Command(ctx),
            ModemState::AwaitGenericResponse,
            at::DELETE_ALL_READ,
        );
    }

    // ── Operation plumbing ────────────────────────────────────

    /// Operations start only from `Ready`; otherwise fail on the spot.
    fn accepts<L>(&self, listener: &mut L, ctx: C) -> bool
    where
        L: ModemListener<Context = C>,
    {
        if self.state == ModemState::Ready {
            return true;
        }
        warn!("modem: busy in {:?}, rejecting {:?}", self.state, ctx);
        listener.on_failure(ctx, ModemError::NotReady);
        false
    }

    fn begin<I, L>(
        &mut self,
        io: &mut I,
        listener: &mut L,
        op: PendingOp<C>,
        next: ModemState,
        command: &str,
    ) where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        self.pending = op;
        self.line.clear();
        self.message.clear();
        self.enter(io, next);
        if !write_all(io, command.as_bytes()) {
            self.finish(io, listener, Err(ModemError::Transport));
        }
    }

    /// End the pending operation and return to `Ready`.
    ///
    /// The state changes before the listener runs, so a callback may start
    /// the next operation straight away.
    fn finish<I, L>(&mut self, io: &mut I, listener: &mut L, outcome: Result<(), ModemError>)
    where
        I: TimerPort,
        L: ModemListener<Context = C>,
    {
        let pending = core::mem::replace(&mut self.pending, PendingOp::None);
        self.line.clear();
        self.message.clear();
        self.enter(io, ModemState::Ready);

        match (pending, outcome) {
            (PendingOp::None, Ok(())) | (PendingOp::Read(_), Ok(())) => {}
            (PendingOp::None, Err(e)) => warn!("modem: {}", e),
            (PendingOp::Command(ctx), Ok(())) => listener.on_success(ctx),
            (PendingOp::List(ctx), Ok(())) => listener.on_end_of_list(ctx),
            (PendingOp::Command(ctx) | PendingOp::Read(ctx) | PendingOp::List(ctx), Err(e)) => {
                warn!("modem: {:?} failed: {}", ctx, e);
                listener.on_failure(ctx, e);
            }
        }
    }

    fn enter<T: TimerPort>(&mut self, timers: &mut T, next: ModemState) {
        let prev = self.state;
        if prev == next {
            return;
        }
        if prev == ModemState::Ready {
            self.arm_watchdog(timers);
        } else if next == ModemState::Ready {
            self.disarm_watchdog(timers);
        }
        debug!("modem: {:?} -> {:?}", prev, next);
        self.state = next;
    }

    fn arm_watchdog<T: TimerPort>(&mut self, timers: &mut T) {
        self.disarm_watchdog(timers);
        self.watchdog = timers.create(WATCHDOG_MS, false, true, TimerEvent::ModemWatchdog);
        if self.watchdog.is_none() {
            error!("modem: no timer available for the operation watchdog");
        }
    }

    fn disarm_watchdog<T: TimerPort>(&mut self, timers: &mut T) {
        if let Some(handle) = self.watchdog.take() {
            timers.stop(handle);
            timers.destroy(handle);
        }
    }

    // ── Line handling ─────────────────────────────────────────

    fn handle_line<I, L>(&mut self, io: &mut I, listener: &mut L)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        let line = core::mem::take(&mut self.line);
        let line = line.as_str();

        if line == at::BANNER_START {
            self.modem_restarted(io, listener);
            return;
        }

        match self.state {
            ModemState::Init => self.record_banner(io, listener, line),

            ModemState::AwaitEchoOff => {
                if line == at::OK {
                    self.enter(io, ModemState::AwaitTextMode);
                    if !write_all(io, at::TEXT_MODE.as_bytes()) {
                        self.finish(io, listener, Err(ModemError::Transport));
                    }
                } else if line == at::ECHO_OFF_ECHO {
                    debug!("modem: echo of '{}'", line);
                } else {
                    error!("modem: echo-off refused: '{}'", line);
                    self.finish(io, listener, Err(ModemError::UnexpectedResponse));
                }
            }

            ModemState::AwaitTextMode => {
                if line == at::OK {
                    self.finish(io, listener, Ok(()));
                    info!("modem: ready");
                    listener.on_ready();
                } else {
                    error!("modem: text mode refused: '{}'", line);
                    self.finish(io, listener, Err(ModemError::UnexpectedResponse));
                }
            }

            ModemState::Ready => debug!("modem: unsolicited '{}'", line),

            ModemState::AwaitSendPrompt => {
                warn!("modem: expected send prompt, got '{}'", line);
                self.finish(io, listener, Err(ModemError::UnexpectedResponse));
            }

            ModemState::AwaitSendConfirm => {
                if line.starts_with(at::SENT_MARKER) {
                    debug!("modem: {}", line);
                } else if line == at::OK {
                    self.finish(io, listener, Ok(()));
                } else {
                    self.finish(io, listener, Err(ModemError::UnexpectedResponse));
                }
            }

            ModemState::AwaitReadMeta => {
                if line.starts_with(at::READ_MARKER) {
                    self.await_text(io, line, ModemState::AwaitReadText);
                } else {
                    self.finish(io, listener, Err(ModemError::UnexpectedResponse));
                }
            }

            ModemState::AwaitListMeta => {
                if line == at::OK {
                    self.finish(io, listener, Ok(()));
                } else if line.starts_with(at::LIST_MARKER) {
                    self.await_text(io, line, ModemState::AwaitListText);
                } else {
                    self.finish(io, listener, Err(ModemError::UnexpectedResponse));
                }
            }

            ModemState::AwaitGenericResponse => {
                let outcome = if line == at::OK {
                    Ok(())
                } else {
                    Err(ModemError::UnexpectedResponse)
                };
                self.finish(io, listener, outcome);
            }

            // Bytes go to the message buffer in these states.
            ModemState::AwaitReadText | ModemState::AwaitListText => {}
        }
    }

    /// Keep the metadata line and collect the body that follows it.
    fn await_text<T: TimerPort>(&mut self, timers: &mut T, meta: &str, next: ModemState) {
        text::copy_truncated(&mut self.line, meta);
        self.message.clear();
        self.enter(timers, next);
    }

    fn record_banner<I, L>(&mut self, io: &mut I, listener: &mut L, line: &str)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        let Some(bit) = InitFlags::banner(line) else {
            debug!("modem: ignoring '{}' during init", line);
            return;
        };
        self.init.0 |= bit;
        debug!("modem: banner '{}' (flags {:#06b})", line, self.init.0);

        if self.init.complete() {
            info!("modem: boot complete, configuring");
            self.enter(io, ModemState::AwaitEchoOff);
            if !write_all(io, at::ECHO_OFF.as_bytes()) {
                self.finish(io, listener, Err(ModemError::Transport));
            }
        }
    }

    /// `START` seen: the modem power-cycled and forgot everything.
    fn modem_restarted<T, L>(&mut self, timers: &mut T, listener: &mut L)
    where
        T: TimerPort,
        L: ModemListener<Context = C>,
    {
        if self.state == ModemState::Init {
            info!("modem: start banner");
        } else {
            warn!("modem: restarted while {:?}, re-initialising", self.state);
        }

        let pending = core::mem::replace(&mut self.pending, PendingOp::None);
        self.disarm_watchdog(timers);
        self.message.clear();
        self.init = InitFlags(InitFlags::START);
        self.state = ModemState::Init;

        if let Some(ctx) = pending.context() {
            listener.on_failure(ctx, ModemError::Restarted);
        }
    }

    // ── Record handling ───────────────────────────────────────

    /// Metadata and body of a read/list entry are both in; deliver them.
    fn finish_record<I, L>(&mut self, io: &mut I, listener: &mut L)
    where
        I: Transport + TimerPort,
        L: ModemListener<Context = C>,
    {
        let listing = self.state == ModemState::AwaitListText;
        if !text::decode_restricted_hex(&mut self.message) {
            debug!("modem: body is not hex encoded, passing through");
        }

        let delivered = match parse_meta(&self.line, listing, self.read_index) {
            Some((index, status, sender)) => {
                if let Some(ctx) = self.pending.context() {
                    let record = SmsRecord {
                        index,
                        status,
                        sender,
                        body: self.message.as_str(),
                    };
                    listener.on_message(ctx, &record);
                }
                true
            }
            None => false,
        };

        if !delivered {
            warn!("modem: malformed entry header '{}'", self.line);
            self.finish(io, listener, Err(ModemError::UnexpectedResponse));
            return;
        }

        if listing {
            self.line.clear();
            self.message.clear();
            self.enter(io, ModemState::AwaitListMeta);
        } else {
            self.finish(io, listener, Ok(()));
        }
    }
}

/// Split a read/list header into (index, status, sender).
///
/// Read headers look like `+CMGR: "REC UNREAD","+44…","","<date>"` and
/// take their index from the request; list headers look like
/// `+CMGL: 3,"REC UNREAD","+44…","","<date>"`.
fn parse_meta(meta: &str, listing: bool, read_index: u16) -> Option<(u16, &str, &str)> {
    let mut fields = FieldCursor::new(meta);

    if listing {
        let index = fields
            .next_field()?
            .strip_prefix(at::LIST_INDEX_PREFIX)?
            .trim()
            .parse()
            .ok()?;
        let status = fields.next_field().unwrap_or("");
        let sender = fields.next_field().unwrap_or("");
        Some((index, status, sender))
    } else {
        let first = fields.next_field()?;
        let status = first.strip_prefix(at::READ_STATUS_PREFIX).unwrap_or(first);
        let status = status.strip_suffix('"').unwrap_or(status);
        let sender = fields.next_field().unwrap_or("");
        Some((read_index, status, sender))
    }
}

/// Write everything or report failure.
fn write_all<T: Transport>(io: &mut T, mut data: &[u8]) -> bool {
    while !data.is_empty() {
        match io.write(data) {
            Ok(0) => {
                warn!("modem: serial link accepted no bytes");
                return false;
            }
            Ok(n) => data = &data[n.min(data.len())..],
            Err(e) => {
                warn!("modem: serial write failed: {:?}", e);
                return false;
            }
        }
    }
    if let Err(e) = io.flush() {
        warn!("modem: serial flush failed: {:?}", e);
        return false;
    }
    true
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
