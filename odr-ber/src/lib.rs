//! BER codec engine for ODR
//!
//! This crate provides the octet-level BER primitives and the generic type
//! engine that encodes, decodes and prints ASN.1 structures with a single
//! description per type.
//!
//! - [`ber`]: tags, lengths, element completeness, raw encoder/decoder
//! - [`codec`]: the codec handle [`Odr`], primitives, SEQUENCE/SET/CHOICE
//!   combinators, EXTERNAL and the printer
//!
//! # Status
//!
//! ## BER
//! - [x] High tag numbers, short/long definite lengths
//! - [x] Indefinite lengths on decode (constructed only)
//! - [x] Length back-patching with splice fallback
//!
//! ## Type engine
//! - [x] INTEGER, ENUMERATED, BOOLEAN, NULL, OCTET STRING, BIT STRING, OID, ANY
//! - [x] VisibleString, GeneralString, GraphicString, UTF8String, GeneralizedTime
//! - [x] SEQUENCE, SET, SEQUENCE OF, SET OF, CHOICE with bias
//! - [x] EXTERNAL with registered payload types

pub mod ber;
pub mod codec;

pub use odr_core;

pub use ber::{complete, BerDecoder, BerEncoder, BerLength, BerTag, BerTagClass, Completeness};
pub use codec::{Choice, ChoiceArm, Direction, Odr, OdrFn, OdrType, TagMode};
