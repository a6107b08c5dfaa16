//! Inbound SMS handling: poll → list → read → authorise → reply → delete.

use crate::harness::{
    ADMIN, Harness, STRANGER, USER, default_config, list_entry, read_response, recipient,
};
use crate::mock_host::{MockHost, STATUS_TEXT};
use smsalert::app::ports::{CommandError, CommandOrigin};
use smsalert::modem::ModemState;
use smsalert::modem::WATCHDOG_MS;
use smsalert::sms::service::{POLL_INTERVAL_MS, REPLY_ACCEPTED, REPLY_BAD_COMMAND, REPLY_RESET_SCHEDULED, SmsState};

fn harness() -> Harness<MockHost> {
    Harness::ready(default_config(), MockHost::new())
}

/// Poll, list one message from `sender` and read it back.
fn receive(h: &mut Harness<MockHost>, index: u16, sender: &str, body: &str) {
    assert_eq!(h.poll(), "AT+CMGL=\"ALL\"\r");
    h.feed(&format!("{}\r\nOK\r\n", list_entry(index, sender, body)));
    assert_eq!(h.written(), format!("AT+CMGR={index}\r"));
    h.feed(&read_response(sender, body));
}

// ── Polling ───────────────────────────────────────────────────

#[test]
fn nothing_happens_before_the_poll_interval() {
    let mut h = harness();
    h.advance(u64::from(POLL_INTERVAL_MS) - 1);
    assert_eq!(h.written(), "");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
}

#[test]
fn empty_inbox_returns_to_ready_and_polls_again() {
    let mut h = harness();
    assert_eq!(h.poll(), "AT+CMGL=\"ALL\"\r");
    assert_eq!(h.app.sms_state(), SmsState::FetchingUnread);

    h.feed("OK\r\n");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
    assert_eq!(h.written(), "");

    assert_eq!(h.poll(), "AT+CMGL=\"ALL\"\r");
}

#[test]
fn list_error_returns_to_ready() {
    let mut h = harness();
    h.poll();
    h.feed("ERROR\r\n");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
    assert_eq!(h.poll(), "AT+CMGL=\"ALL\"\r");
}

// ── Authorisation ─────────────────────────────────────────────

#[test]
fn stranger_is_deleted_without_reply() {
    let mut h = harness();
    receive(&mut h, 2, STRANGER, "status");

    assert_eq!(h.written(), "AT+CMGD=2,0\r");
    assert_eq!(h.host.status_requests, 0);
    assert!(h.host.commands.is_empty());

    h.feed("OK\r\n");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
}

#[test]
fn any_recipient_may_ask_for_status() {
    let mut h = harness();
    receive(&mut h, 1, USER, "STATUS");

    assert_eq!(h.written(), format!("AT+CMGS=\"{USER}\"\r"));
    assert_eq!(h.app.sms_state(), SmsState::AwaitingReply);
    assert_eq!(h.complete_send(), format!("{STATUS_TEXT}\x1a"));
    assert_eq!(h.host.status_requests, 1);

    assert_eq!(h.written(), "AT+CMGD=1,0\r");
    h.feed("OK\r\n");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
}

#[test]
fn non_admin_commands_are_ignored() {
    let mut h = harness();
    receive(&mut h, 4, USER, "recipient 1 admin 0");
    assert_eq!(h.written(), "AT+CMGD=4,0\r");
    assert!(h.host.commands.is_empty());
}

#[test]
fn local_form_of_admin_number_is_recognised() {
    let mut h = harness();
    receive(&mut h, 1, "01234567890", "resenddelay 60");
    assert_eq!(h.written(), "AT+CMGS=\"01234567890\"\r");
    assert_eq!(h.host.commands.len(), 1);
}

#[test]
fn reply_goes_to_full_length_sender() {
    let mut config = default_config();
    config.recipients[2] = recipient("01234567890", false, false);
    let mut h = Harness::ready(config, MockHost::new());

    // "+" and fifteen digits, longer than any stored number.
    let sender = "+444441234567890";
    receive(&mut h, 1, sender, "status");
    assert_eq!(h.written(), format!("AT+CMGS=\"{sender}\"\r"));
    assert_eq!(h.complete_send(), format!("{STATUS_TEXT}\x1a"));
}

// ── Admin commands ────────────────────────────────────────────

#[test]
fn admin_command_goes_to_interpreter() {
    let mut h = harness();
    receive(&mut h, 3, ADMIN, "resenddelay 60");

    assert_eq!(
        h.host.commands,
        vec![("resenddelay 60".to_owned(), CommandOrigin::Sms)]
    );
    assert_eq!(h.written(), format!("AT+CMGS=\"{ADMIN}\"\r"));
    assert_eq!(h.complete_send(), format!("{REPLY_ACCEPTED}\x1a"));
    assert_eq!(h.written(), "AT+CMGD=3,0\r");
}

#[test]
fn rejected_command_gets_generic_reply() {
    let mut h = harness();
    h.host.command_result = Err(CommandError::Unknown);
    receive(&mut h, 3, ADMIN, "launch");
    h.written();
    assert_eq!(h.complete_send(), format!("{REPLY_BAD_COMMAND}\x1a"));
}

#[test]
fn interpreter_reply_is_sent_verbatim() {
    let mut h = harness();
    h.host.command_reply = Some("Number: +44\nNotify: 1\nAdmin: 1");
    receive(&mut h, 3, ADMIN, "recipient 1 show");
    h.written();
    assert_eq!(h.complete_send(), "Number: +44\nNotify: 1\nAdmin: 1\x1a");
}

#[test]
fn reset_restarts_only_after_delete() {
    let mut h = harness();
    receive(&mut h, 5, ADMIN, "reset");
    assert!(h.host.commands.is_empty(), "reset is not a config command");

    h.written();
    assert_eq!(h.complete_send(), format!("{REPLY_RESET_SCHEDULED}\x1a"));
    assert_eq!(h.written(), "AT+CMGD=5,0\r");
    assert_eq!(h.host.restarts, 0);

    h.feed("OK\r\n");
    assert_eq!(h.host.restarts, 1);
}

#[test]
fn reset_ignores_letter_case() {
    let mut h = harness();
    receive(&mut h, 5, ADMIN, "Reset");
    assert!(h.host.commands.is_empty());

    h.written();
    assert_eq!(h.complete_send(), format!("{REPLY_RESET_SCHEDULED}\x1a"));
    assert_eq!(h.written(), "AT+CMGD=5,0\r");
    h.feed("OK\r\n");
    assert_eq!(h.host.restarts, 1);
}

#[test]
fn reset_is_held_back_when_delete_fails() {
    let mut h = harness();
    receive(&mut h, 5, ADMIN, "reset");
    h.written();
    h.complete_send();
    h.feed("ERROR\r\n");
    assert_eq!(h.host.restarts, 0);
}

#[test]
fn failed_reply_still_deletes() {
    let mut h = harness();
    receive(&mut h, 6, USER, "status");
    h.written();
    h.feed("\r\n> ");
    h.written();
    h.feed("+CMS ERROR: 304\r\n");
    assert_eq!(h.written(), "AT+CMGD=6,0\r");
}

// ── Multiple messages ─────────────────────────────────────────

#[test]
fn unreadable_message_is_skipped() {
    let mut h = harness();
    h.poll();
    h.feed(&format!(
        "{}{}\r\nOK\r\n",
        list_entry(1, USER, "status"),
        list_entry(2, STRANGER, "hello")
    ));
    assert_eq!(h.written(), "AT+CMGR=1\r");

    h.feed("ERROR\r\n");
    // Message 1 is neither answered nor deleted.
    assert_eq!(h.written(), "AT+CMGR=2\r");

    h.feed(&read_response(STRANGER, "hello"));
    assert_eq!(h.written(), "AT+CMGD=2,0\r");
    h.feed("OK\r\n");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
}

#[test]
fn messages_are_handled_in_listed_order() {
    let mut h = harness();
    h.poll();
    h.feed(&format!(
        "{}{}\r\nOK\r\n",
        list_entry(7, STRANGER, "a"),
        list_entry(3, STRANGER, "b")
    ));
    assert_eq!(h.written(), "AT+CMGR=7\r");
    h.feed(&read_response(STRANGER, "a"));
    assert_eq!(h.written(), "AT+CMGD=7,0\r");
    h.feed("OK\r\n");
    assert_eq!(h.written(), "AT+CMGR=3\r");
    h.feed(&read_response(STRANGER, "b"));
    assert_eq!(h.written(), "AT+CMGD=3,0\r");
}

#[test]
fn hex_encoded_body_is_decoded_before_dispatch() {
    let mut h = harness();
    // "status" in four-digit hex.
    receive(&mut h, 1, USER, "007300740061007400750073");
    assert_eq!(h.host.status_requests, 1);
}

// ── Watchdog ──────────────────────────────────────────────────

#[test]
fn silent_modem_aborts_listing() {
    let mut h = harness();
    h.poll();
    assert_eq!(h.app.modem_state(), ModemState::AwaitListMeta);

    h.advance(u64::from(WATCHDOG_MS) - 1);
    assert_eq!(h.app.sms_state(), SmsState::FetchingUnread);
    h.advance(1);
    assert_eq!(h.app.modem_state(), ModemState::Ready);
    assert_eq!(h.app.sms_state(), SmsState::Ready);
}

#[test]
fn silent_modem_aborts_read() {
    let mut h = harness();
    h.poll();
    h.feed(&format!("{}\r\nOK\r\n", list_entry(1, USER, "status")));
    h.written();

    h.advance(u64::from(WATCHDOG_MS));
    // The read is skipped; with nothing else listed the engine goes idle.
    assert_eq!(h.app.sms_state(), SmsState::Ready);
    assert_eq!(h.written(), "");
}

#[test]
fn silent_modem_aborts_reply_then_deletes() {
    let mut h = harness();
    receive(&mut h, 1, USER, "status");
    h.written();

    h.advance(u64::from(WATCHDOG_MS));
    assert_eq!(h.written(), "AT+CMGD=1,0\r");
}

#[test]
fn silent_modem_aborts_delete() {
    let mut h = harness();
    receive(&mut h, 1, STRANGER, "spam");
    assert_eq!(h.written(), "AT+CMGD=1,0\r");

    h.advance(u64::from(WATCHDOG_MS));
    assert_eq!(h.app.sms_state(), SmsState::Ready);
}

#[test]
fn modem_reboot_mid_operation_recovers() {
    let mut h = harness();
    h.poll();
    h.feed("START\r\n");
    assert_eq!(h.app.modem_state(), ModemState::Init);
    assert_eq!(h.app.sms_state(), SmsState::Ready);

    h.feed("+CPIN: READY\r\nSMS DONE\r\nPB DONE\r\n");
    assert_eq!(h.written(), "ATE0\r");
}
