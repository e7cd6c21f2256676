//! BER output buffer
//!
//! [`BerEncoder`] is the write side of a codec handle: it appends
//! identifier, length and content octets to a growable buffer and patches
//! the length of constructed values once their body is known.

use crate::ber::types::{BerLength, BerTag};
use bytes::Bytes;
use odr_core::{Oid, OdrError, OdrErrorCode, OdrResult};

/// BER encoder for ASN.1 structures
///
/// Lengths of constructed values are written with reserve-and-patch: a slot
/// is reserved when the value is opened and filled in when it is closed. If
/// the final length does not fit the slot, the slot is replaced by the
/// minimal encoding, shifting the body. Both paths stay within the buffer.
#[derive(Debug, Default)]
pub struct BerEncoder {
    buffer: Vec<u8>,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new BER encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Number of octets written so far
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_tag(&mut self, tag: &BerTag) {
        tag.encode_into(&mut self.buffer);
    }

    /// Write a definite length followed by the content octets
    pub fn write_content(&mut self, content: &[u8]) {
        BerLength::encode_into(content.len(), &mut self.buffer);
        self.buffer.extend_from_slice(content);
    }

    /// Write octets verbatim
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Reserve `width` octets for a length that is not known yet
    ///
    /// # Returns
    /// The offset of the reserved slot, to be passed to [`Self::patch_length`].
    pub fn reserve_length(&mut self, width: usize) -> usize {
        let offset = self.buffer.len();
        self.buffer.resize(offset + width, 0);
        offset
    }

    /// Fill a reserved length slot
    ///
    /// # Arguments
    /// * `offset` - Slot offset returned by [`Self::reserve_length`]
    /// * `width` - Width of the slot
    /// * `length` - Length of the body that follows the slot
    ///
    /// # Error Handling
    /// Returns [`OdrErrorCode::LenOv`] if the slot lies outside the buffer.
    pub fn patch_length(&mut self, offset: usize, width: usize, length: usize) -> OdrResult<()> {
        let end = offset
            .checked_add(width)
            .filter(|&end| end <= self.buffer.len())
            .ok_or_else(|| {
                OdrError::new(OdrErrorCode::LenOv).with_addinfo("length slot outside buffer")
            })?;

        match BerLength::encode_exact(length, width) {
            Some(encoded) => self.buffer[offset..end].copy_from_slice(&encoded),
            None => {
                let encoded = BerLength::Definite(length).encode();
                self.buffer.splice(offset..end, encoded);
            }
        }
        Ok(())
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Take the encoded bytes, leaving the encoder empty
    pub fn take(&mut self) -> Bytes {
        Bytes::from(std::mem::take(&mut self.buffer))
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Minimal two's complement content octets of an INTEGER
///
/// BER requires minimal encoding: 127 is encoded as one octet (0x7F), 128
/// needs two (0x00 0x80).
pub fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Content octets of an OBJECT IDENTIFIER
///
/// The first two arcs are combined as `40 * X + Y`; every subidentifier is
/// written in base 128 with the high bit set on all but its last octet.
pub fn oid_content(oid: &Oid) -> OdrResult<Vec<u8>> {
    let arcs = oid.arcs();
    if arcs.len() < 2 {
        return Err(OdrError::new(OdrErrorCode::Data)
            .with_addinfo("object identifier must have at least 2 arcs"));
    }
    let first = 40u64 * arcs[0] as u64 + arcs[1] as u64;

    let mut bytes = Vec::with_capacity(arcs.len() + 2);
    push_subidentifier(&mut bytes, first);
    for &arc in &arcs[2..] {
        push_subidentifier(&mut bytes, arc as u64);
    }
    Ok(bytes)
}

fn push_subidentifier(out: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut remaining = value;
    loop {
        groups[count] = (remaining & 0x7F) as u8;
        remaining >>= 7;
        count += 1;
        if remaining == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | continuation);
    }
}
