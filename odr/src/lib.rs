//! ODR - generic ASN.1 BER codec
//!
//! This library encodes, decodes and pretty-prints ASN.1 structures such as
//! Z39.50 APDUs. A type is described once, as a function over a codec
//! handle, and the same description serves all three directions.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `odr-core`: error codes, configuration, the nibble memory arena, OID and BIT STRING values
//! - `odr-ber`: BER tag/length primitives and the generic type engine
//!
//! # Usage
//!
//! ```
//! use odr::{primitive, Direction, Odr, OdrResult};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Close {
//!     reason: i64,
//!     diagnostic: Option<String>,
//! }
//!
//! fn close(o: &mut Odr, slot: &mut Option<Close>, optional: bool, name: &str) -> OdrResult<()> {
//!     o.sequence(slot, optional, name, |o, c| {
//!         o.required(primitive::integer, &mut c.reason, "closeReason")?;
//!         primitive::visible_string(o, &mut c.diagnostic, true, "diagnosticInformation")
//!     })
//! }
//!
//! let mut enc = Odr::new(Direction::Encode);
//! let mut value = Some(Close { reason: 2, diagnostic: None });
//! close(&mut enc, &mut value, false, "close").unwrap();
//!
//! let mut printer = Odr::new(Direction::Print);
//! close(&mut printer, &mut value, false, "close").unwrap();
//! assert_eq!(printer.print_output(), "close {\n  closeReason 2\n}\n");
//! ```

// Re-export core types
pub use odr_core::{errmsg, BitString, BlockPool, Nmem, Oid, OdrConfig, OdrError, OdrErrorCode, OdrResult};

// Re-export the codec engine
pub use odr_ber::codec::{
    external, external_with, lift, primitive, Any, Choice, ChoiceArm, Direction, External,
    ExternalEncoding, ExternalTypeTable, Odr, OdrFn, OdrType, TagMode, EXTERNAL_ARBITRARY,
    EXTERNAL_ARMS, EXTERNAL_OCTET, EXTERNAL_SINGLE,
};
pub use bytes::Bytes;
pub use odr_ber::{choice_arm, ber};
pub use odr_ber::ber::{complete, BerTagClass, Completeness};
