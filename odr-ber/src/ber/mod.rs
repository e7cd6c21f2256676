//! BER (Basic Encoding Rules) octet-level codec
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number**: 0-30 in the first octet, or 11111 followed by base-128 octets
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `1NNNNNNN` followed by N big-endian length octets
//! - **Indefinite form** (`0x80`): constructed values terminated by `00 00`;
//!   accepted when decoding, never produced when encoding
//!
//! This module only deals with octets. The generic type engine that walks
//! ASN.1 structures in all three directions lives in [`crate::codec`].

pub mod complete;
pub mod decoder;
pub mod encoder;
pub mod types;

pub use complete::{complete, Completeness};
pub use decoder::BerDecoder;
pub use encoder::BerEncoder;
pub use types::{universal, BerLength, BerTag, BerTagClass};
