//! BER input cursor
//!
//! [`BerDecoder`] is the read side of a codec handle. It never reads past
//! the bound it is given, which is how nested constructed values keep their
//! members inside the declared length.

use crate::ber::types::{BerLength, BerTag};
use bytes::Bytes;
use odr_core::{BitString, Oid, OdrError, OdrErrorCode, OdrResult};

/// BER decoder for ASN.1 structures
///
/// # Position Tracking
///
/// The decoder maintains a position that advances as data is decoded. Every
/// read takes an `end` bound (the end of the innermost open constructed
/// value, or the end of the buffer).
#[derive(Debug, Default)]
pub struct BerDecoder {
    buffer: Bytes,
    position: usize,
}

impl BerDecoder {
    /// Create a new BER decoder over `buffer`
    pub fn new(buffer: Bytes) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total size of the input
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes left before `end`
    pub fn remaining(&self, end: usize) -> usize {
        end.min(self.buffer.len()).saturating_sub(self.position)
    }

    /// Rewind to the start of the buffer
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Decode the next tag without consuming it
    ///
    /// # Returns
    /// `Ok(None)` if there are no bytes left before `end`, otherwise the tag
    /// and the number of octets it occupies.
    pub fn peek_tag(&self, end: usize) -> OdrResult<Option<(BerTag, usize)>> {
        if self.remaining(end) == 0 {
            return Ok(None);
        }
        let window = &self.buffer[self.position..end.min(self.buffer.len())];
        BerTag::decode(window).map(Some)
    }

    /// Octets left before `end`, without consuming them
    pub fn peek_bytes(&self, end: usize) -> &[u8] {
        let stop = end.min(self.buffer.len());
        &self.buffer[self.position.min(stop)..stop]
    }

    /// Skip `count` octets that were already inspected
    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.buffer.len());
    }

    /// Decode a length field
    pub fn read_length(&mut self, end: usize) -> OdrResult<BerLength> {
        let start = self.position.min(self.buffer.len());
        let stop = end.min(self.buffer.len()).max(start);
        let (length, consumed) = BerLength::decode(&self.buffer[start..stop])?;
        self.position += consumed;
        Ok(length)
    }

    /// Read `count` content octets as a shared view of the input
    pub fn read_bytes(&mut self, count: usize, end: usize) -> OdrResult<Bytes> {
        if count > self.remaining(end) {
            return Err(OdrError::new(OdrErrorCode::Proto).with_addinfo(format!(
                "content of {} bytes exceeds the {} bytes available",
                count,
                self.remaining(end)
            )));
        }
        let start = self.position;
        self.position += count;
        Ok(self.buffer.slice(start..start + count))
    }

    /// Whether the next two octets are an end-of-contents marker
    pub fn at_end_of_contents(&self, end: usize) -> bool {
        self.remaining(end) >= 2
            && self.buffer[self.position] == 0
            && self.buffer[self.position + 1] == 0
    }

    /// Consume an end-of-contents marker
    pub fn read_end_of_contents(&mut self, end: usize) -> OdrResult<()> {
        if !self.at_end_of_contents(end) {
            return Err(OdrError::new(OdrErrorCode::Proto)
                .with_addinfo("missing end-of-contents after indefinite length"));
        }
        self.position += 2;
        Ok(())
    }
}

/// Decode INTEGER content octets (big-endian two's complement)
pub fn integer_value(bytes: &[u8]) -> OdrResult<i64> {
    if bytes.is_empty() {
        return Err(OdrError::new(OdrErrorCode::Data).with_addinfo("empty integer encoding"));
    }

    if bytes.len() > 8 {
        return Err(OdrError::new(OdrErrorCode::Data).with_addinfo(format!(
            "integer too large: {} bytes (max 8)",
            bytes.len()
        )));
    }

    let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for &byte in bytes {
        value = (value << 8) | byte as i64;
    }
    Ok(value)
}

/// Decode BOOLEAN content octets; any non-zero octet is true
pub fn boolean_value(bytes: &[u8]) -> OdrResult<bool> {
    match bytes {
        [byte] => Ok(*byte != 0),
        _ => Err(OdrError::new(OdrErrorCode::Data).with_addinfo(format!(
            "boolean needs 1 content octet, got {}",
            bytes.len()
        ))),
    }
}

/// Decode BIT STRING content octets (unused-bits octet plus the bits)
pub fn bit_string_value(bytes: &[u8]) -> OdrResult<BitString> {
    let Some((&unused_bits, bits)) = bytes.split_first() else {
        return Err(OdrError::new(OdrErrorCode::Data).with_addinfo("empty bit string encoding"));
    };
    if unused_bits > 7 || (bits.is_empty() && unused_bits != 0) {
        return Err(OdrError::new(OdrErrorCode::Data).with_addinfo(format!(
            "invalid unused bits: {}",
            unused_bits
        )));
    }
    let num_bits = bits.len() * 8 - unused_bits as usize;
    BitString::new(bits.to_vec(), num_bits)
}

/// Decode OBJECT IDENTIFIER content octets
pub fn oid_value(bytes: &[u8]) -> OdrResult<Oid> {
    if bytes.is_empty() {
        return Err(
            OdrError::new(OdrErrorCode::Data).with_addinfo("empty object identifier encoding")
        );
    }

    let mut subidentifiers = Vec::with_capacity(bytes.len());
    let mut component = 0u64;
    let mut pending = false;
    for &byte in bytes {
        if !pending && byte == 0x80 {
            return Err(OdrError::new(OdrErrorCode::Data)
                .with_addinfo("object identifier subidentifier has leading 0x80"));
        }
        component = component
            .checked_mul(128)
            .map(|c| c | (byte & 0x7F) as u64)
            .filter(|&c| c <= u32::MAX as u64 + 80)
            .ok_or_else(|| {
                OdrError::new(OdrErrorCode::Data).with_addinfo("object identifier arc overflow")
            })?;
        pending = byte & 0x80 != 0;
        if !pending {
            subidentifiers.push(component);
            component = 0;
        }
    }
    if pending {
        return Err(OdrError::new(OdrErrorCode::Data)
            .with_addinfo("object identifier ends inside a subidentifier"));
    }

    let first = subidentifiers[0];
    let (x, y) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };
    let mut arcs = Vec::with_capacity(subidentifiers.len() + 1);
    arcs.push(x as u32);
    arcs.push(u32::try_from(y).map_err(|_| {
        OdrError::new(OdrErrorCode::Data).with_addinfo("object identifier arc overflow")
    })?);
    for &sub in &subidentifiers[1..] {
        arcs.push(u32::try_from(sub).map_err(|_| {
            OdrError::new(OdrErrorCode::Data).with_addinfo("object identifier arc overflow")
        })?);
    }
    Oid::new(arcs)
}
