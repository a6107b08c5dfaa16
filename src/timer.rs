//! Polled software timer service.
//!
//! Backs the [`TimerPort`] contract for the modem watchdog and the SMS poll
//! timer.  There are no hardware timers or threads involved: the main loop
//! calls [`TimerService::poll`] with the current uptime and routes each
//! fired [`TimerEvent`] to the engine that owns it.
//!
//! ```text
//!   main loop ──▶ poll(now) ──▶ Fired { handle, event }
//!                                    │
//!                  ┌─────────────────┴─────────────────┐
//!                  ▼                                   ▼
//!        ModemWatchdog → ModemEngine          SmsPoll → SmsService
//!          ::on_watchdog                        ::on_poll_timer
//! ```

use crate::app::ports::{TimerEvent, TimerHandle, TimerPort};
use log::{debug, warn};

/// Milliseconds since boot.
pub type Ticks = u64;

/// Timer resolution: one tick per millisecond.
pub const TICKS_PER_SECOND: Ticks = 1000;

/// Maximum number of concurrently allocated timers.
const MAX_TIMERS: usize = 4;

// ═══════════════════════════════════════════════════════════════
//  Timer slots
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    event: TimerEvent,
    period: Ticks,
    repeating: bool,
    /// Absolute expiry while running; `None` when stopped.
    deadline: Option<Ticks>,
}

/// A timer that expired during [`TimerService::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub event: TimerEvent,
}

/// Fixed-slot timer table driven by an externally supplied clock.
pub struct TimerService {
    timers: [Option<TimerEntry>; MAX_TIMERS],
    /// Uptime seen by the last [`poll`](Self::poll); new deadlines are
    /// relative to it.
    now: Ticks,
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService {
    pub fn new() -> Self {
        Self {
            timers: [None; MAX_TIMERS],
            now: 0,
        }
    }

    /// Advance the clock and return the next expired timer, if any.
    ///
    /// Call repeatedly until it returns `None`.  One-shot timers stop when
    /// they fire but keep their slot until destroyed; repeating timers are
    /// re-armed one period after their previous deadline.
    pub fn poll(&mut self, now: Ticks) -> Option<Fired> {
        self.now = self.now.max(now);

        for (slot, timer) in self.timers.iter_mut().enumerate() {
            let Some(entry) = timer else { continue };
            let Some(deadline) = entry.deadline else { continue };
            if deadline > self.now {
                continue;
            }

            entry.deadline = entry.repeating.then(|| deadline + entry.period.max(1));
            debug!("timer: slot {} fired ({:?})", slot, entry.event);
            return Some(Fired {
                handle: TimerHandle(slot as u8),
                event: entry.event,
            });
        }
        None
    }

    /// Number of allocated slots (running or stopped).
    pub fn allocated(&self) -> usize {
        self.timers.iter().filter(|t| t.is_some()).count()
    }

    /// Whether `handle` refers to a running timer.
    pub fn is_running(&self, handle: TimerHandle) -> bool {
        self.entry(handle).is_some_and(|e| e.deadline.is_some())
    }

    fn entry(&self, handle: TimerHandle) -> Option<&TimerEntry> {
        self.timers.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, handle: TimerHandle) -> Option<&mut TimerEntry> {
        self.timers.get_mut(handle.0 as usize).and_then(Option::as_mut)
    }
}

impl TimerPort for TimerService {
    fn create(
        &mut self,
        period_ms: u32,
        repeating: bool,
        auto_start: bool,
        event: TimerEvent,
    ) -> Option<TimerHandle> {
        let now = self.now;
        let Some(slot) = self.timers.iter().position(Option::is_none) else {
            warn!("timer: no free slot for {:?}", event);
            return None;
        };

        let period = Ticks::from(period_ms);
        self.timers[slot] = Some(TimerEntry {
            event,
            period,
            repeating,
            deadline: auto_start.then_some(now + period),
        });
        debug!("timer: created slot {} for {:?} ({} ms)", slot, event, period_ms);
        Some(TimerHandle(slot as u8))
    }

    fn start(&mut self, handle: TimerHandle) {
        let now = self.now;
        match self.entry_mut(handle) {
            Some(entry) => entry.deadline = Some(now + entry.period),
            None => warn!("timer: start on unknown handle {:?}", handle),
        }
    }

    fn stop(&mut self, handle: TimerHandle) {
        if let Some(entry) = self.entry_mut(handle) {
            entry.deadline = None;
        }
    }

    fn destroy(&mut self, handle: TimerHandle) {
        if let Some(slot) = self.timers.get_mut(handle.0 as usize) {
            *slot = None;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
