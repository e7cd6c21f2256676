//! BER encoding types (Tag, Length, etc.)

use odr_core::{OdrError, OdrErrorCode, OdrResult};

/// Tag numbers of the UNIVERSAL class used by the codec
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const OBJECT_DESCRIPTOR: u32 = 7;
    pub const EXTERNAL: u32 = 8;
    pub const ENUMERATED: u32 = 10;
    pub const UTF8_STRING: u32 = 12;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const GRAPHIC_STRING: u32 = 25;
    pub const VISIBLE_STRING: u32 = 26;
    pub const GENERAL_STRING: u32 = 27;
}

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 7-6 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value is constructed (contains other values)
/// - **Tag Number**: The actual tag number (0-30 for short form, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number > 30):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 7 = 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    class: BerTagClass,
    constructed: bool,
    number: u32,
}

impl BerTag {
    pub fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    pub fn class(&self) -> BerTagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Whether class and number match, ignoring the constructed bit
    pub fn matches(&self, class: BerTagClass, number: u32) -> bool {
        self.class == class && self.number == number
    }

    /// Append the identifier octets to `out`
    ///
    /// Tag numbers up to 30 use the single-octet form; larger numbers use
    /// the high-tag-number form with base-128 continuation octets.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            out.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
            return;
        }

        out.push(class_bits | constructed_bit | 0x1F);
        let mut groups = [0u8; 5];
        let mut count = 0;
        let mut remaining = self.number;
        while remaining > 0 {
            groups[count] = (remaining & 0x7F) as u8;
            remaining >>= 7;
            count += 1;
        }
        for i in (0..count).rev() {
            let continuation = if i > 0 { 0x80 } else { 0x00 };
            out.push(groups[i] | continuation);
        }
    }

    /// Encode tag to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(2);
        self.encode_into(&mut result);
        result
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful
    ///
    /// # Error Handling
    /// Returns [`OdrErrorCode::Proto`] if the buffer ends inside the tag and
    /// [`OdrErrorCode::Data`] if the tag number does not fit in 32 bits.
    pub fn decode(data: &[u8]) -> OdrResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(truncated("tag"));
        };
        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut tag_number = 0u32;
        let mut pos = 1;
        loop {
            let Some(&byte) = data.get(pos) else {
                return Err(truncated("extended tag"));
            };
            pos += 1;
            if tag_number > (u32::MAX >> 7) {
                return Err(OdrError::new(OdrErrorCode::Data).with_addinfo("tag number overflow"));
            }
            tag_number = (tag_number << 7) | ((byte & 0x7F) as u32);
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

/// BER Length encoding
///
/// Definite lengths are encoded in two forms:
/// - **Short form**: For lengths 0-127 (1 byte)
/// - **Long form**: First byte `1NNNNNNN` gives the number of length bytes,
///   followed by the big-endian length value
///
/// The first byte `0x80` announces an indefinite length, where the contents
/// end with two zero octets. It is only valid for constructed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    Definite(usize),
    Indefinite,
}

/// Maximum number of long-form length octets accepted when decoding
pub const MAX_LENGTH_OCTETS: usize = 8;

impl BerLength {
    /// Number of octets the minimal encoding of `length` needs
    pub fn encoded_len(length: usize) -> usize {
        if length < 128 {
            1
        } else {
            1 + value_octets(length)
        }
    }

    /// Append the minimal encoding of a definite length to `out`
    pub fn encode_into(length: usize, out: &mut Vec<u8>) {
        if length < 128 {
            out.push(length as u8);
            return;
        }
        let num_bytes = value_octets(length);
        out.push(0x80 | num_bytes as u8);
        for i in (0..num_bytes).rev() {
            out.push(((length >> (i * 8)) & 0xFF) as u8);
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BerLength::Definite(length) => {
                let mut result = Vec::with_capacity(Self::encoded_len(*length));
                Self::encode_into(*length, &mut result);
                result
            }
            BerLength::Indefinite => vec![0x80],
        }
    }

    /// Encode a definite length in exactly `width` octets
    ///
    /// Long form is padded with leading zero octets so that the encoding
    /// fills a slot reserved before the length was known. Returns `None`
    /// when the length cannot be expressed in `width` octets.
    pub fn encode_exact(length: usize, width: usize) -> Option<Vec<u8>> {
        if width == 1 {
            return (length < 128).then(|| vec![length as u8]);
        }
        let value_width = width.checked_sub(1)?;
        if value_width > 127 || value_octets(length) > value_width {
            return None;
        }
        let mut result = Vec::with_capacity(width);
        result.push(0x80 | value_width as u8);
        for i in (0..value_width).rev() {
            let shift = i * 8;
            let byte = if shift >= usize::BITS as usize {
                0
            } else {
                (length >> shift) & 0xFF
            };
            result.push(byte as u8);
        }
        Some(result)
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful
    ///
    /// # Error Handling
    /// Returns error if:
    /// - Buffer is too short
    /// - The reserved length-of-length value `0xFF` is used
    /// - The length needs more than [`MAX_LENGTH_OCTETS`] octets
    pub fn decode(data: &[u8]) -> OdrResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(truncated("length"));
        };

        if (first_byte & 0x80) == 0 {
            return Ok((BerLength::Definite(first_byte as usize), 1));
        }
        if first_byte == 0x80 {
            return Ok((BerLength::Indefinite, 1));
        }
        if first_byte == 0xFF {
            return Err(OdrError::new(OdrErrorCode::Proto)
                .with_addinfo("reserved length-of-length 0xFF"));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes > MAX_LENGTH_OCTETS {
            return Err(OdrError::new(OdrErrorCode::Proto).with_addinfo(format!(
                "length encoding too large: {} octets (max {})",
                num_bytes, MAX_LENGTH_OCTETS
            )));
        }
        if data.len() < 1 + num_bytes {
            return Err(truncated("long form length"));
        }

        let mut length = 0usize;
        for &byte in &data[1..1 + num_bytes] {
            if length > (usize::MAX >> 8) {
                return Err(OdrError::new(OdrErrorCode::Proto).with_addinfo("length overflow"));
            }
            length = (length << 8) | byte as usize;
        }

        Ok((BerLength::Definite(length), 1 + num_bytes))
    }
}

fn value_octets(length: usize) -> usize {
    let bits = usize::BITS - length.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

fn truncated(what: &str) -> OdrError {
    OdrError::new(OdrErrorCode::Proto).with_addinfo(format!("buffer ends inside {}", what))
}
