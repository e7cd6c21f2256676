//! The EXTERNAL type
//!
//! ```text
//! EXTERNAL ::= [UNIVERSAL 8] IMPLICIT SEQUENCE {
//!     direct-reference      OBJECT IDENTIFIER OPTIONAL,
//!     indirect-reference    INTEGER OPTIONAL,
//!     data-value-descriptor ObjectDescriptor OPTIONAL,
//!     encoding CHOICE {
//!         single-ASN1-type [0] ANY,
//!         octet-aligned    [1] IMPLICIT OCTET STRING,
//!         arbitrary        [2] IMPLICIT BIT STRING } }
//! ```
//!
//! Applications usually extend the encoding CHOICE with arms for payload
//! types they know, and register the object identifiers of those types in an
//! [`ExternalTypeTable`]. When a decoded direct-reference is registered, the
//! matching arm is selected through [`Odr::choice_bias`] instead of the
//! generic `single-ASN1-type` arm that would match the same tag.

use crate::ber::{universal, BerTagClass};
use crate::codec::choice::{Choice, ChoiceArm};
use crate::codec::handle::Odr;
use crate::codec::primitive::{self, Any};
use bytes::Bytes;
use odr_core::{BitString, Oid, OdrErrorCode, OdrResult};

/// Discriminant of the `single-ASN1-type` arm
pub const EXTERNAL_SINGLE: i32 = 0;
/// Discriminant of the `octet-aligned` arm
pub const EXTERNAL_OCTET: i32 = 1;
/// Discriminant of the `arbitrary` arm
pub const EXTERNAL_ARBITRARY: i32 = 2;

/// An EXTERNAL value whose encoding CHOICE is `V`
#[derive(Debug, Clone, PartialEq)]
pub struct External<V = ExternalEncoding> {
    pub direct_reference: Option<Oid>,
    pub indirect_reference: Option<i64>,
    pub descriptor: Option<String>,
    pub encoding: V,
}

/// The three standard EXTERNAL encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalEncoding {
    Single(Any),
    Octet(Bytes),
    Arbitrary(BitString),
}

impl Choice for ExternalEncoding {
    fn which(&self) -> i32 {
        match self {
            ExternalEncoding::Single(_) => EXTERNAL_SINGLE,
            ExternalEncoding::Octet(_) => EXTERNAL_OCTET,
            ExternalEncoding::Arbitrary(_) => EXTERNAL_ARBITRARY,
        }
    }
}

/// Arms of [`ExternalEncoding`]
pub static EXTERNAL_ARMS: &[ChoiceArm<ExternalEncoding>] = &[
    crate::choice_arm!(
        Explicit,
        ContextSpecific,
        0,
        ExternalEncoding::Single,
        EXTERNAL_SINGLE,
        primitive::any,
        "single-ASN1-type"
    ),
    crate::choice_arm!(
        Implicit,
        ContextSpecific,
        1,
        ExternalEncoding::Octet,
        EXTERNAL_OCTET,
        primitive::octet_string,
        "octet-aligned"
    ),
    crate::choice_arm!(
        Implicit,
        ContextSpecific,
        2,
        ExternalEncoding::Arbitrary,
        EXTERNAL_ARBITRARY,
        primitive::bit_string,
        "arbitrary"
    ),
];

/// Object identifiers of known EXTERNAL payload types
///
/// Each entry maps a direct-reference to the discriminant of the encoding
/// arm that decodes that type.
#[derive(Debug, Clone, Default)]
pub struct ExternalTypeTable {
    entries: Vec<(Oid, i32)>,
}

impl ExternalTypeTable {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `oid`; a later registration of the same OID replaces it
    pub fn register(&mut self, oid: Oid, which: i32) {
        match self.entries.iter_mut().find(|(known, _)| *known == oid) {
            Some(entry) => entry.1 = which,
            None => self.entries.push((oid, which)),
        }
    }

    pub fn lookup(&self, oid: &Oid) -> Option<i32> {
        self.entries
            .iter()
            .find(|(known, _)| known == oid)
            .map(|&(_, which)| which)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static EMPTY_TABLE: ExternalTypeTable = ExternalTypeTable::new();

/// EXTERNAL with the standard encodings and no registered types
pub fn external(
    o: &mut Odr,
    slot: &mut Option<External>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    external_with(o, slot, optional, name, EXTERNAL_ARMS, &EMPTY_TABLE)
}

/// EXTERNAL with a custom encoding CHOICE and type table
pub fn external_with<V: Choice>(
    o: &mut Odr,
    slot: &mut Option<External<V>>,
    optional: bool,
    name: &str,
    arms: &[ChoiceArm<V>],
    table: &ExternalTypeTable,
) -> OdrResult<()> {
    o.check()?;
    let present = slot.is_some();
    let mut parts = match slot.take() {
        Some(value) => Parts {
            direct_reference: value.direct_reference,
            indirect_reference: value.indirect_reference,
            descriptor: value.descriptor,
            encoding: Some(value.encoding),
        },
        None => Parts::default(),
    };

    if !o.constructed_begin(present, BerTagClass::Universal, universal::EXTERNAL, name)? {
        return o.missing(optional, name);
    }
    let result = external_body(o, &mut parts, arms, table);

    if o.is_decode() && result.is_err() {
        return result;
    }
    match parts.encoding {
        Some(encoding) => {
            *slot = Some(External {
                direct_reference: parts.direct_reference,
                indirect_reference: parts.indirect_reference,
                descriptor: parts.descriptor,
                encoding,
            });
            result
        }
        None => result,
    }
}

struct Parts<V> {
    direct_reference: Option<Oid>,
    indirect_reference: Option<i64>,
    descriptor: Option<String>,
    encoding: Option<V>,
}

impl<V> Default for Parts<V> {
    fn default() -> Self {
        Self {
            direct_reference: None,
            indirect_reference: None,
            descriptor: None,
            encoding: None,
        }
    }
}

fn external_body<V: Choice>(
    o: &mut Odr,
    parts: &mut Parts<V>,
    arms: &[ChoiceArm<V>],
    table: &ExternalTypeTable,
) -> OdrResult<()> {
    primitive::oid(o, &mut parts.direct_reference, true, "direct-reference")?;
    primitive::integer(o, &mut parts.indirect_reference, true, "indirect-reference")?;
    primitive::object_descriptor(o, &mut parts.descriptor, true, "data-value-descriptor")?;

    if o.is_decode() {
        if let Some(which) = parts.direct_reference.as_ref().and_then(|oid| table.lookup(oid)) {
            log::trace!("odr: EXTERNAL biased to arm {}", which);
            o.choice_bias(which);
        }
    }
    if !o.choice(arms, &mut parts.encoding, "encoding")? {
        return o.fail(OdrErrorCode::Required, "encoding");
    }
    o.constructed_end()
}
