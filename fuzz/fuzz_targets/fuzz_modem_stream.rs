//! Fuzz target: `ModemEngine::process`
//!
//! Boots the engine, starts a listing, then streams arbitrary modem output
//! at it.  The engine must never panic and must report at most one outcome
//! for the operation.
//!
//! cargo fuzz run fuzz_modem_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use smsalert::adapters::link::ModemLink;
use smsalert::adapters::uart::UartTransport;
use smsalert::error::ModemError;
use smsalert::modem::{ModemEngine, ModemListener, SmsRecord};

#[derive(Default)]
struct Sink {
    outcomes: usize,
}

impl ModemListener for Sink {
    type Context = ();

    fn on_success(&mut self, _ctx: ()) {
        self.outcomes += 1;
    }

    fn on_failure(&mut self, _ctx: (), _error: ModemError) {
        self.outcomes += 1;
    }

    fn on_message(&mut self, _ctx: (), message: &SmsRecord<'_>) {
        assert!(message.body.len() <= smsalert::modem::MESSAGE_BUFFER_LEN);
    }

    fn on_end_of_list(&mut self, _ctx: ()) {
        self.outcomes += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let mut engine = ModemEngine::new();
    let mut link = ModemLink::new(UartTransport::new());
    let mut sink = Sink::default();

    link.transport
        .inject(b"START\r\n+CPIN: READY\r\nSMS DONE\r\nPB DONE\r\nOK\r\nOK\r\n");
    engine.process(&mut link, &mut sink);
    engine.list_unread(&mut link, &mut sink, ());

    // Feed in small chunks so line state spans reads.
    for chunk in data.chunks(7) {
        link.transport.inject(chunk);
        engine.process(&mut link, &mut sink);
    }
    assert!(sink.outcomes <= 1, "more than one outcome for one operation");
});
