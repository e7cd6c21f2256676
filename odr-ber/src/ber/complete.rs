//! Detection of complete BER elements in a byte stream
//!
//! Transports receive PDUs in arbitrary chunks; [`complete`] tells whether a
//! buffer already holds one whole element and how long it is. The ANY type
//! uses the same check to find the extent of an opaque element.

use crate::ber::types::{BerLength, BerTag};
use odr_core::OdrErrorCode;

/// Maximum nesting of indefinite-length elements followed by [`complete`]
pub const MAX_COMPLETE_DEPTH: usize = 100;

/// Result of [`complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// The buffer starts with a complete element of this many octets
    Complete(usize),
    /// More octets are needed
    Incomplete,
    /// The octets cannot be the start of a BER element
    Invalid,
}

/// Compute the extent of the first BER element in `buf`
pub fn complete(buf: &[u8]) -> Completeness {
    element(buf, 0)
}

fn element(buf: &[u8], depth: usize) -> Completeness {
    if depth > MAX_COMPLETE_DEPTH {
        return Completeness::Invalid;
    }

    let (tag, tag_len) = match BerTag::decode(buf) {
        Ok(decoded) => decoded,
        Err(err) if err.code() == OdrErrorCode::Proto => return Completeness::Incomplete,
        Err(_) => return Completeness::Invalid,
    };

    let rest = &buf[tag_len..];
    let Some(&first) = rest.first() else {
        return Completeness::Incomplete;
    };
    if first & 0x80 != 0 && first != 0x80 && first != 0xFF {
        let num_bytes = (first & 0x7F) as usize;
        if rest.len() < 1 + num_bytes {
            return Completeness::Incomplete;
        }
    }
    let (length, len_len) = match BerLength::decode(rest) {
        Ok(decoded) => decoded,
        Err(_) => return Completeness::Invalid,
    };
    let header = tag_len + len_len;

    match length {
        BerLength::Definite(len) => match header.checked_add(len) {
            Some(total) if total <= buf.len() => Completeness::Complete(total),
            Some(_) => Completeness::Incomplete,
            None => Completeness::Invalid,
        },
        BerLength::Indefinite => {
            if !tag.is_constructed() {
                return Completeness::Invalid;
            }
            let mut pos = header;
            loop {
                if buf.len() < pos + 2 {
                    return Completeness::Incomplete;
                }
                if buf[pos] == 0 && buf[pos + 1] == 0 {
                    return Completeness::Complete(pos + 2);
                }
                match element(&buf[pos..], depth + 1) {
                    Completeness::Complete(n) => pos += n,
                    other => return other,
                }
            }
        }
    }
}
