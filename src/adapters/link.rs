//! Modem link: the single I/O handle the engines take.
//!
//! Pairs the serial [`Transport`] with the [`TimerService`] so engine
//! operations can write a command and arm their watchdog through one
//! `&mut (impl Transport + TimerPort)` argument.

use crate::app::ports::{TimerEvent, TimerHandle, TimerPort, Transport};
use crate::timer::TimerService;

pub struct ModemLink<T> {
    pub transport: T,
    pub timers: TimerService,
}

impl<T: Transport> ModemLink<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timers: TimerService::new(),
        }
    }
}

// ── Transport delegation ──────────────────────────────────────

impl<T: Transport> Transport for ModemLink<T> {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.transport.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.transport.write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.transport.flush()
    }

    fn available(&self) -> bool {
        self.transport.available()
    }
}

// ── TimerPort delegation ──────────────────────────────────────

impl<T> TimerPort for ModemLink<T> {
    fn create(
        &mut self,
        period_ms: u32,
        repeating: bool,
        auto_start: bool,
        event: TimerEvent,
    ) -> Option<TimerHandle> {
        self.timers.create(period_ms, repeating, auto_start, event)
    }

    fn start(&mut self, handle: TimerHandle) {
        self.timers.start(handle);
    }

    fn stop(&mut self, handle: TimerHandle) {
        self.timers.stop(handle);
    }

    fn destroy(&mut self, handle: TimerHandle) {
        self.timers.destroy(handle);
    }
}
