//! Phone-number comparison.
//!
//! Recipients may be stored in international (`+44…`) or local (`0…`)
//! form while the modem reports senders in either.  Numbers in the same
//! form must match exactly.  An international and a local number match
//! when, with their leading `+` / `0` removed, the shorter one equals the
//! tail of the longer one (`+441234567890` ≙ `01234567890`).

/// Whether two numbers identify the same subscriber.
pub fn numbers_match(a: &str, b: &str) -> bool {
    let (Some(pa), Some(pb)) = (a.chars().next(), b.chars().next()) else {
        return false;
    };

    match (pa, pb) {
        ('+', '+') | ('0', '0') => a == b,
        ('+', '0') | ('0', '+') => {
            let (a, b) = (&a[1..], &b[1..]);
            let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
            !short.is_empty() && long.ends_with(short)
        }
        _ => false,
    }
}
