//! Fuzz target: `FieldCursor` and restricted-hex decoding
//!
//! Splits arbitrary text into quoted fields and runs the hex decoder over
//! it.  Neither may panic; fields must be sub-slices of the input and a
//! failed decode must leave the buffer untouched.
//!
//! cargo fuzz run fuzz_csv_fields

#![no_main]

use heapless::String;
use libfuzzer_sys::fuzz_target;
use smsalert::text::{FieldCursor, decode_restricted_hex};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    let range = line.as_ptr() as usize..=line.as_ptr() as usize + line.len();
    for field in FieldCursor::new(line) {
        assert!(range.contains(&(field.as_ptr() as usize)));
        assert!(field.len() <= line.len());
    }

    let Ok(mut buf) = String::<640>::try_from(line) else {
        return;
    };
    let before = buf.clone();
    if !decode_restricted_hex(&mut buf) {
        assert_eq!(buf, before, "failed decode modified its input");
    }
});
