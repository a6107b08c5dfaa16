//! Admin SMS commands against the real configuration interpreter and
//! simulated NVS store.

use crate::harness::{ADMIN, Harness, USER, default_config, list_entry, read_response};
use smsalert::adapters::host::DeviceHost;
use smsalert::adapters::nvs::NvsAdapter;
use smsalert::adapters::status::{DeciCelsius, StatusBoard};
use smsalert::app::ports::ConfigPort;
use smsalert::sms::service::{REPLY_ACCEPTED, REPLY_BAD_COMMAND};

type Device = Harness<DeviceHost<NvsAdapter>>;

fn device() -> Device {
    let mut status = StatusBoard::new();
    status.add_sensor("Freezer");
    status.add_sensor("");
    status.set_reading(0, Some(DeciCelsius(-182)));
    status.set_mains(true);
    let host = DeviceHost::new(NvsAdapter::new().unwrap(), status);
    Harness::ready(default_config(), host)
}

/// Deliver `body` from `sender` and return the reply that was uploaded.
fn exchange(h: &mut Device, sender: &str, body: &str) -> String {
    h.poll();
    h.feed(&format!("{}\r\nOK\r\n", list_entry(1, sender, body)));
    h.written();
    h.feed(&read_response(sender, body));
    h.written();
    let reply = h.complete_send();
    h.feed("OK\r\n");
    reply
}

#[test]
fn admin_enables_notifications_for_user() {
    let mut h = device();
    assert!(!h.app.config().recipients[1].notify);

    let reply = exchange(&mut h, ADMIN, "recipient 2 notify 1");
    assert_eq!(reply, format!("{REPLY_ACCEPTED}\x1a"));
    assert!(h.app.config().recipients[1].notify);

    let stored = h.host.commands.store().load().unwrap();
    assert!(stored.recipients[1].notify);
}

#[test]
fn admin_reads_back_a_recipient() {
    let mut h = device();
    let reply = exchange(&mut h, ADMIN, "recipient 2 show");
    assert_eq!(reply, format!("Number: {USER}\nNotify: 0\nAdmin: 0\x1a"));
}

#[test]
fn console_commands_are_refused_over_sms() {
    let mut h = device();
    let reply = exchange(&mut h, ADMIN, "default");
    assert_eq!(reply, format!("{REPLY_BAD_COMMAND}\x1a"));
    assert_eq!(h.app.config(), &default_config());
}

#[test]
fn status_reply_comes_from_the_board() {
    let mut h = device();
    let reply = exchange(&mut h, USER, "status");
    assert_eq!(reply, "Freezer: -18.2\nTemp2: Unknown\nPower: On\x1a");
}
