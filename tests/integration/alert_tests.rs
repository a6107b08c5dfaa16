//! Alert broadcast and resend throttling through the application service.

use crate::harness::{ADMIN, Harness, USER, default_config, recipient};
use crate::mock_host::MockHost;
use smsalert::config::SystemConfig;
use smsalert::sms::history::AlertKind;
use smsalert::sms::service::{AlertOutcome, SmsState};

const THIRD: &str = "+447700900999";
const FOURTH: &str = "07700900444";

/// Slots 1 and 4 want alerts; slot 2 does not; slot 3 is empty.
fn broadcast_config() -> SystemConfig {
    let mut config = default_config();
    config.recipients[3] = recipient(FOURTH, true, false);
    config
}

/// Run passes until the pending broadcast is finished.
fn drain(h: &mut Harness<MockHost>) {
    for _ in 0..10 {
        if h.app.can_accept_alert() {
            break;
        }
        h.tick();
    }
    assert!(h.app.can_accept_alert(), "broadcast did not finish");
}

#[test]
fn alert_goes_to_notify_recipients_only() {
    let mut h = Harness::ready(broadcast_config(), MockHost::new());

    assert_eq!(
        h.app.try_send(AlertKind::MainsOff, 0, "Mains power has failed"),
        AlertOutcome::Queued
    );
    assert!(!h.app.can_accept_alert());

    h.feed("");
    assert_eq!(h.app.sms_state(), SmsState::Broadcasting);
    assert_eq!(h.written(), format!("AT+CMGS=\"{ADMIN}\"\r"));
    assert_eq!(h.complete_send(), "Mains power has failed\x1a");

    // Slots 2 and 3 are skipped one pass each.
    h.feed("");
    assert_eq!(h.written(), format!("AT+CMGS=\"{FOURTH}\"\r"));
    assert_eq!(h.complete_send(), "Mains power has failed\x1a");

    h.feed("");
    assert_eq!(h.app.sms_state(), SmsState::Ready);
    assert!(h.app.can_accept_alert());
    assert_eq!(h.written(), "");
}

#[test]
fn failed_send_moves_on_to_next_recipient() {
    let mut config = broadcast_config();
    config.recipients[2] = recipient(THIRD, true, false);
    let mut h = Harness::ready(config, MockHost::new());

    h.app.try_send(AlertKind::LowBattery, 0, "Battery low");
    h.feed("");
    assert_eq!(h.written(), format!("AT+CMGS=\"{ADMIN}\"\r"));
    h.feed("ERROR\r\n");

    h.feed("");
    assert_eq!(h.written(), format!("AT+CMGS=\"{THIRD}\"\r"));
}

#[test]
fn second_alert_while_broadcasting_is_busy() {
    let mut h = Harness::ready(broadcast_config(), MockHost::new());
    h.app.try_send(AlertKind::MainsOff, 0, "off");
    assert_eq!(
        h.app.try_send(AlertKind::MainsOn, 0, "on"),
        AlertOutcome::Busy
    );

    // Busy alerts are not recorded, so the same alert is accepted later.
    h.feed("");
    h.complete_send();
    h.feed("");
    h.complete_send();
    h.feed("");
    assert_eq!(h.app.try_send(AlertKind::MainsOn, 0, "on"), AlertOutcome::Queued);
}

#[test]
fn repeat_alert_waits_for_resend_delay() {
    let mut config = SystemConfig::default();
    // Nobody to notify, so broadcasts finish without modem traffic.
    config.recipients[0] = recipient(USER, false, false);
    config.resend_delay_secs = 300;
    let mut h = Harness::ready(config, MockHost::new());

    assert_eq!(h.app.try_send(AlertKind::TempRangeHigh, 2, "hot"), AlertOutcome::Queued);
    drain(&mut h);

    // The poll timer fires on the way; answer the listing.
    h.advance(299_000);
    assert_eq!(h.written(), "AT+CMGL=\"ALL\"\r");
    assert_eq!(h.app.try_send(AlertKind::TempRangeHigh, 2, "hot"), AlertOutcome::Throttled);
    // A different sensor is independent.
    assert_eq!(h.app.try_send(AlertKind::TempRangeHigh, 3, "hot"), AlertOutcome::Queued);
    h.feed("OK\r\n");
    drain(&mut h);

    h.advance(1_000);
    assert_eq!(h.app.try_send(AlertKind::TempRangeHigh, 2, "hot"), AlertOutcome::Queued);
}

#[test]
fn long_alert_is_truncated_to_one_sms() {
    let mut h = Harness::ready(default_config(), MockHost::new());
    let long = "x".repeat(200);
    h.app.try_send(AlertKind::Startup, 0, &long);
    h.feed("");
    h.written();
    let body = h.complete_send();
    assert_eq!(body.len(), 161);
}
