//! BIT STRING value type

use crate::error::{OdrError, OdrErrorCode, OdrResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits (zeros and ones), numbered from the most
/// significant bit of the first octet. A bit string value can have any
/// length including zero.
///
/// Z39.50 uses bit strings as option masks, so setting a bit past the end
/// grows the string instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitString")]
pub struct BitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

/// Unchecked serialized form, validated through [`BitString::new`]
#[derive(Deserialize)]
struct RawBitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

impl TryFrom<RawBitString> for BitString {
    type Error = OdrError;

    fn try_from(raw: RawBitString) -> OdrResult<Self> {
        BitString::new(raw.bytes, raw.num_bits)
    }
}

impl BitString {
    /// Construct a new bit string object.
    ///
    /// # Arguments
    ///
    /// * `bit_string` - The bit string as a byte array
    /// * `num_bits` - The number of bits
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits` needs more bytes than `bit_string` has,
    /// or if `bit_string` has bytes beyond those holding `num_bits`.
    pub fn new(bit_string: Vec<u8>, num_bits: usize) -> OdrResult<Self> {
        if num_bits.div_ceil(8) != bit_string.len() {
            return Err(OdrError::new(OdrErrorCode::Data).with_addinfo(format!(
                "{} bits need {} bytes, got {}",
                num_bits,
                num_bits.div_ceil(8),
                bit_string.len()
            )));
        }

        Ok(Self {
            bytes: bit_string,
            num_bits,
        })
    }

    /// A bit string of `num_bits` zero bits
    pub fn zeros(num_bits: usize) -> Self {
        Self {
            bytes: vec![0; num_bits.div_ceil(8)],
            num_bits,
        }
    }

    /// Get the bit string as byte array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bits in the byte array.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of unused bits in the last octet (0-7)
    pub fn unused_bits(&self) -> u8 {
        ((8 - self.num_bits % 8) % 8) as u8
    }

    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Get the bit at a specific position; bits past the end read as zero
    pub fn get_bit(&self, index: usize) -> bool {
        if index >= self.num_bits {
            return false;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        (self.bytes[byte_index] >> bit_index) & 1 == 1
    }

    /// Set the bit at a specific position, growing the string if needed
    pub fn set_bit(&mut self, index: usize, value: bool) {
        if index >= self.num_bits {
            self.num_bits = index + 1;
            self.bytes.resize(self.num_bits.div_ceil(8), 0);
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        if value {
            self.bytes[byte_index] |= 1 << bit_index;
        } else {
            self.bytes[byte_index] &= !(1 << bit_index);
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.num_bits {
            f.write_str(if self.get_bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}
