//! System configuration parameters
//!
//! The recipient table and alert timing consumed by the SMS engine.
//! Values are persisted through NVS and changed from the console or by
//! an admin's SMS.

use heapless::String;
use serde::{Deserialize, Serialize};

/// Number of recipient slots.
pub const MAX_RECIPIENTS: usize = 4;

/// Longest phone number a recipient slot holds.
pub const MAX_NUMBER_LEN: usize = 15;

/// Longest SMS body the firmware composes or keeps.
pub const MAX_SMS_LEN: usize = 160;

/// A stored phone number.
pub type PhoneNumber = String<MAX_NUMBER_LEN>;

/// An SMS body.
pub type SmsText = String<MAX_SMS_LEN>;

/// One alert / command recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// International (`+44…`) or local (`07…`) number.  Empty = unused slot.
    pub number: PhoneNumber,
    /// Receives broadcast alerts.
    pub notify: bool,
    /// May run configuration commands over SMS.
    pub admin: bool,
}

impl Recipient {
    pub fn is_empty(&self) -> bool {
        self.number.is_empty()
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Recipients ---
    pub recipients: [Recipient; MAX_RECIPIENTS],

    // --- Alerts ---
    /// Minimum interval before the same alert is sent again (seconds)
    pub resend_delay_secs: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            recipients: Default::default(),
            resend_delay_secs: 300, // 5 min
        }
    }
}

/// Whether `number` looks like a dialable number: digits with an optional
/// leading `+`, at most [`MAX_NUMBER_LEN`] characters.
pub fn is_valid_number(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);
    !digits.is_empty()
        && number.len() <= MAX_NUMBER_LEN
        && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SystemConfig {
        let mut c = SystemConfig::default();
        c.recipients[0] = Recipient {
            number: PhoneNumber::try_from("+441234567890").unwrap(),
            notify: true,
            admin: true,
        };
        c.recipients[2].number = PhoneNumber::try_from("07700900123").unwrap();
        c
    }

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.resend_delay_secs > 0);
        assert!(c.recipients.iter().all(Recipient::is_empty));
        assert!(c.recipients.iter().all(|r| !r.notify && !r.admin));
    }

    #[test]
    fn serde_roundtrip() {
        let c = sample();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = sample();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.recipients[0].number, c2.recipients[0].number);
        assert_eq!(c.resend_delay_secs, c2.resend_delay_secs);
    }

    #[test]
    fn number_validation() {
        assert!(is_valid_number("+441234567890"));
        assert!(is_valid_number("07700900123"));
        assert!(!is_valid_number(""));
        assert!(!is_valid_number("+"));
        assert!(!is_valid_number("0770-090"));
        assert!(!is_valid_number("+4412345678901234"));
    }
}
