//! Generic ASN.1 type engine
//!
//! One static description of an ASN.1 type serves encoding, decoding and
//! printing. Every type operation has the shape of [`OdrFn`]: it takes the
//! handle, a value slot, whether the element is optional, and the element
//! name used in error paths and printed output.
//!
//! - **Encode**: reads the slot. `None` for an optional element writes
//!   nothing and succeeds.
//! - **Decode**: fills the slot, or leaves `None` when an optional element
//!   is absent.
//! - **Print**: walks the slot like encode and writes text instead of octets.
//!
//! # Usage Example
//!
//! ```
//! use bytes::Bytes;
//! use odr_ber::codec::{primitive, Direction, Odr};
//! use odr_core::OdrResult;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct InitRequest {
//!     reference_id: Option<Bytes>,
//!     preferred_message_size: i64,
//! }
//!
//! fn init_request(o: &mut Odr, slot: &mut Option<InitRequest>, optional: bool, name: &str) -> OdrResult<()> {
//!     o.sequence(slot, optional, name, |o, p| {
//!         o.implicit_tag(primitive::octet_string, &mut p.reference_id, true,
//!             odr_ber::ber::BerTagClass::ContextSpecific, 2, "referenceId")?;
//!         o.required(primitive::integer, &mut p.preferred_message_size, "preferredMessageSize")
//!     })
//! }
//!
//! let mut enc = Odr::new(Direction::Encode);
//! let mut value = Some(InitRequest { reference_id: None, preferred_message_size: 1024 });
//! init_request(&mut enc, &mut value, false, "initRequest").unwrap();
//!
//! let mut dec = Odr::new(Direction::Decode);
//! dec.set_buf(enc.take_buf());
//! let mut decoded = None;
//! init_request(&mut dec, &mut decoded, false, "initRequest").unwrap();
//! assert_eq!(decoded, value);
//! ```

pub mod choice;
pub mod constructed;
pub mod external;
pub mod handle;
pub mod primitive;

pub(crate) mod print;
pub(crate) mod stack;

pub use choice::{lift, Choice, ChoiceArm, TagMode};
pub use constructed::SEQUENCE_OF_INITIAL_CAPACITY;
pub use external::{
    external, external_with, External, ExternalEncoding, ExternalTypeTable, EXTERNAL_ARBITRARY,
    EXTERNAL_ARMS, EXTERNAL_OCTET, EXTERNAL_SINGLE,
};
pub use handle::{Direction, Odr};
pub use primitive::Any;
pub use print::MAX_DUMP_OCTETS;

use bytes::Bytes;
use odr_core::{BitString, Oid, OdrResult};

/// A type operation
pub type OdrFn<T> = fn(&mut Odr, &mut Option<T>, bool, &str) -> OdrResult<()>;

/// A type with one natural encoding
///
/// Lets composite types be written with [`Odr::field`] and lets generic
/// containers such as `Vec<T>` and `Box<T>` find their element operation.
pub trait OdrType: Sized {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()>;
}

impl OdrType for i64 {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::integer(o, slot, optional, name)
    }
}

impl OdrType for bool {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::boolean(o, slot, optional, name)
    }
}

impl OdrType for () {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::null(o, slot, optional, name)
    }
}

impl OdrType for Bytes {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::octet_string(o, slot, optional, name)
    }
}

impl OdrType for BitString {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::bit_string(o, slot, optional, name)
    }
}

impl OdrType for Oid {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::oid(o, slot, optional, name)
    }
}

impl OdrType for Any {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        primitive::any(o, slot, optional, name)
    }
}

impl OdrType for External {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        external::external(o, slot, optional, name)
    }
}

/// SEQUENCE OF the element type
impl<T: OdrType> OdrType for Vec<T> {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        o.sequence_of(T::odr, slot, optional, name)
    }
}

impl<T: OdrType> OdrType for Box<T> {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        let mut inner = slot.take().map(|boxed| *boxed);
        let result = T::odr(o, &mut inner, optional, name);
        *slot = inner.map(Box::new);
        result
    }
}
