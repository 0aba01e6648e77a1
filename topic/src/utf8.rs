//! MQTT UTF-8 string check.
//!
//! On top of well-formed UTF-8, MQTT strings must not carry U+0000 and
//! should not carry control characters or Unicode non-characters
//! (MQTT-1.5.3-2). Brokers treat all of them as a malformed packet.

use crate::error::{Error, Result};

/// Validate raw topic bytes and borrow them as `&str`.
pub fn validate(bytes: &[u8]) -> Result<&str> {
    let s = std::str::from_utf8(bytes).map_err(|e| Error::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    match s.char_indices().find(|&(_, c)| is_disallowed(c)) {
        Some((offset, _)) => Err(Error::InvalidUtf8 { offset }),
        None => Ok(s),
    }
}

/// Whether `bytes` is an acceptable MQTT UTF-8 string.
pub fn is_valid(bytes: &[u8]) -> bool {
    validate(bytes).is_ok()
}

fn is_disallowed(c: char) -> bool {
    let cp = c as u32;
    // C0 (includes U+0000) and C1 control characters.
    if cp <= 0x1F || (0x7F..=0x9F).contains(&cp) {
        return true;
    }
    // Non-characters.
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}
