//! Text helpers shared by the modem and SMS engines.
//!
//! - [`FieldCursor`] walks a modem response line field by field, honouring
//!   quoted fields that contain commas.
//! - [`decode_restricted_hex`] turns the 4-hex-digit groups the modem uses
//!   for message bodies back into text.
//!
//! Neither keeps any state beyond the cursor the caller holds.

use heapless::String;

// ═══════════════════════════════════════════════════════════════
//  Field tokenizer
// ═══════════════════════════════════════════════════════════════

/// Quote-aware comma-separated field cursor.
///
/// Each call to [`next_field`](Self::next_field) returns the text up to the
/// next unquoted comma.  A field that begins with `"` has its quotes
/// removed: the opening quote is skipped and the field ends at the closing
/// quote, although scanning continues to the delimiter.  Returns `None`
/// once the remainder is empty.
///
/// ```
/// use smsalert::text::FieldCursor;
///
/// let mut fields = FieldCursor::new("+CMGL: 2,\"REC UNREAD\",\"+4412\",,\"24/01/02,10:00:00\"");
/// assert_eq!(fields.next_field(), Some("+CMGL: 2"));
/// assert_eq!(fields.next_field(), Some("REC UNREAD"));
/// assert_eq!(fields.next_field(), Some("+4412"));
/// assert_eq!(fields.next_field(), Some(""));
/// assert_eq!(fields.next_field(), Some("24/01/02,10:00:00"));
/// assert_eq!(fields.next_field(), None);
/// ```
#[derive(Debug, Clone)]
pub struct FieldCursor<'a> {
    rest: &'a str,
}

impl<'a> FieldCursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    pub fn next_field(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let bytes = self.rest.as_bytes();
        let quoted = bytes[0] == b'"';
        let mut start = 0;
        let mut end: Option<usize> = None;
        let mut in_quotes = false;
        let mut pos = 0;

        while pos < bytes.len() {
            let c = bytes[pos];
            if c == b',' && !in_quotes {
                break;
            }
            if quoted && c == b'"' {
                if in_quotes {
                    // Closing quote terminates the field; the tail up to the
                    // delimiter is discarded.
                    if end.is_none() {
                        end = Some(pos);
                    }
                    in_quotes = false;
                } else if pos == 0 {
                    start = 1;
                    in_quotes = true;
                } else {
                    in_quotes = true;
                }
            }
            pos += 1;
        }

        let field_end = end.unwrap_or(pos).max(start);
        let field = &self.rest[start..field_end];
        // Skip the delimiter; an unterminated quote swallows the remainder.
        self.rest = if pos < bytes.len() {
            &self.rest[pos + 1..]
        } else {
            ""
        };
        Some(field)
    }
}

impl<'a> Iterator for FieldCursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_field()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Restricted hex text
// ═══════════════════════════════════════════════════════════════

/// Decode 4-hex-digit groups in place, keeping only the low byte of each.
///
/// The input is left untouched (and `false` returned) unless its length is
/// a multiple of four, its first group starts with `00`, and every low byte
/// is valid hex.  Empty input decodes trivially.  Each low byte becomes one
/// character in the Latin-1 range.
pub fn decode_restricted_hex<const N: usize>(text: &mut String<N>) -> bool {
    if text.len() % 4 != 0 || !text.is_ascii() {
        return false;
    }
    if text.len() >= 4 && !text.starts_with("00") {
        return false;
    }

    let mut decoded: String<N> = String::new();
    for group in text.as_bytes().chunks_exact(4) {
        let Some(low) = core::str::from_utf8(&group[2..4])
            .ok()
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        else {
            return false;
        };
        // A Latin-1 char never takes more UTF-8 bytes than its four hex digits.
        if decoded.push(char::from(low)).is_err() {
            return false;
        }
    }

    *text = decoded;
    true
}

/// Encode text as 4-hex-digit groups with a `00` high byte.
///
/// Inverse of [`decode_restricted_hex`] for text below code point 256.
/// Returns `None` if a character is outside that range or the output does
/// not fit.
pub fn encode_restricted_hex<const N: usize>(text: &str) -> Option<String<N>> {
    use core::fmt::Write;

    let mut out: String<N> = String::new();
    for c in text.chars() {
        let code = u32::from(c);
        if code > 0xFF {
            return None;
        }
        write!(out, "00{:02X}", code).ok()?;
    }
    Some(out)
}

/// Copy `src` into `dst`, dropping whatever does not fit.
///
/// Truncation happens on a character boundary.
pub fn copy_truncated<const N: usize>(dst: &mut String<N>, src: &str) {
    dst.clear();
    for c in src.chars() {
        if dst.push(c).is_err() {
            break;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
