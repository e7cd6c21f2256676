//! Primitive ASN.1 types
//!
//! Each function here is a type operation ([`crate::codec::OdrFn`]) and can
//! be passed to the generic combinators, wrapped in implicit or explicit
//! tags, or used as a CHOICE arm.

use crate::ber::decoder::{bit_string_value, boolean_value, integer_value, oid_value};
use crate::ber::encoder::{integer_content, oid_content};
use crate::ber::{complete, universal, BerTagClass, Completeness};
use crate::codec::handle::{Direction, Odr};
use crate::codec::print::hex_dump;
use bytes::Bytes;
use odr_core::{BitString, Oid, OdrErrorCode, OdrResult};

/// An encoded element of any type, kept as its complete TLV octets
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Any(pub Bytes);

impl Any {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Shared control flow of every primitive type
///
/// `encode` produces the content octets, `decode` turns content octets back
/// into a value and `print` renders the value for the print direction.
#[allow(clippy::too_many_arguments)]
fn primitive<T>(
    o: &mut Odr,
    slot: &mut Option<T>,
    optional: bool,
    name: &str,
    tag: u32,
    encode: impl FnOnce(&T) -> OdrResult<Vec<u8>>,
    decode: impl FnOnce(&mut Odr, Bytes) -> OdrResult<T>,
    print: impl FnOnce(&T) -> String,
) -> OdrResult<()> {
    o.check()?;
    let present = slot.is_some();
    if o.is_decode() {
        *slot = None;
    }
    let Some(constructed) = o.ber_tag(present, BerTagClass::Universal, tag, false)? else {
        return o.missing(optional, name);
    };

    match o.direction() {
        Direction::Decode => {
            if constructed {
                return o.fail(
                    OdrErrorCode::Proto,
                    format!("{} uses a constructed encoding", name),
                );
            }
            let content = o.read_content()?;
            let value = decode(o, content)?;
            *slot = Some(value);
            Ok(())
        }
        Direction::Encode => {
            let Some(value) = slot.as_ref() else {
                return o.missing(optional, name);
            };
            let content = o.guard(encode(value))?;
            o.encoder.write_content(&content);
            Ok(())
        }
        Direction::Print => {
            let Some(value) = slot.as_ref() else {
                return o.missing(optional, name);
            };
            let text = print(value);
            o.print_line(name, &text)
        }
    }
}

/// INTEGER
pub fn integer(o: &mut Odr, slot: &mut Option<i64>, optional: bool, name: &str) -> OdrResult<()> {
    integer_tagged(o, slot, optional, name, universal::INTEGER)
}

/// ENUMERATED, carried as its integer value
pub fn enumerated(o: &mut Odr, slot: &mut Option<i64>, optional: bool, name: &str) -> OdrResult<()> {
    integer_tagged(o, slot, optional, name, universal::ENUMERATED)
}

fn integer_tagged(
    o: &mut Odr,
    slot: &mut Option<i64>,
    optional: bool,
    name: &str,
    tag: u32,
) -> OdrResult<()> {
    primitive(
        o,
        slot,
        optional,
        name,
        tag,
        |value| Ok(integer_content(*value)),
        |o, content| {
            let value = integer_value(&content);
            o.guard(value)
        },
        |value| value.to_string(),
    )
}

/// BOOLEAN; TRUE is written as `0x01`, any non-zero octet reads as TRUE
pub fn boolean(o: &mut Odr, slot: &mut Option<bool>, optional: bool, name: &str) -> OdrResult<()> {
    primitive(
        o,
        slot,
        optional,
        name,
        universal::BOOLEAN,
        |value| Ok(vec![u8::from(*value)]),
        |o, content| {
            let value = boolean_value(&content);
            o.guard(value)
        },
        |value| if *value { "TRUE" } else { "FALSE" }.to_string(),
    )
}

/// NULL
pub fn null(o: &mut Odr, slot: &mut Option<()>, optional: bool, name: &str) -> OdrResult<()> {
    primitive(
        o,
        slot,
        optional,
        name,
        universal::NULL,
        |_| Ok(Vec::new()),
        |o, content| {
            if content.is_empty() {
                Ok(())
            } else {
                o.fail(
                    OdrErrorCode::Data,
                    format!("NULL with {} content octets", content.len()),
                )
            }
        },
        |_| "NULL".to_string(),
    )
}

/// OCTET STRING
///
/// Decoded octets are copied into the handle's arena. Constructed
/// (segmented) encodings are accepted when decoding and joined.
pub fn octet_string(o: &mut Odr, slot: &mut Option<Bytes>, optional: bool, name: &str) -> OdrResult<()> {
    octets_tagged(o, slot, optional, name, universal::OCTET_STRING, |o, content| {
        o.arena_copy(&content)
    })
}

/// OCTET STRING encoding under `tag`; `keep` decides where decoded content lives
fn octets_tagged(
    o: &mut Odr,
    slot: &mut Option<Bytes>,
    optional: bool,
    name: &str,
    tag: u32,
    keep: fn(&mut Odr, Bytes) -> OdrResult<Bytes>,
) -> OdrResult<()> {
    o.check()?;
    let present = slot.is_some();
    if o.is_decode() {
        *slot = None;
    }
    let Some(constructed) = o.ber_tag(present, BerTagClass::Universal, tag, false)? else {
        return o.missing(optional, name);
    };

    match o.direction() {
        Direction::Decode => {
            let content = if constructed {
                let mut joined = Vec::new();
                segments(o, &mut joined, name)?;
                Bytes::from(joined)
            } else {
                o.read_content()?
            };
            *slot = Some(keep(o, content)?);
            Ok(())
        }
        Direction::Encode => {
            let Some(value) = slot.as_ref() else {
                return o.missing(optional, name);
            };
            o.encoder.write_content(value);
            Ok(())
        }
        Direction::Print => {
            let Some(value) = slot.as_ref() else {
                return o.missing(optional, name);
            };
            let text = format!("OCTETSTRING(len={}) {}", value.len(), hex_dump(value));
            o.print_line(name, &text)
        }
    }
}

/// Join the segments of a constructed OCTET STRING
fn segments(o: &mut Odr, joined: &mut Vec<u8>, name: &str) -> OdrResult<()> {
    o.push_frame(name, true, false)?;
    while o.constructed_more() {
        match o.ber_tag(true, BerTagClass::Universal, universal::OCTET_STRING, false)? {
            Some(true) => segments(o, joined, name)?,
            Some(false) => {
                let content = o.read_content()?;
                joined.extend_from_slice(&content);
            }
            None => {
                return o.fail(
                    OdrErrorCode::Proto,
                    format!("{} has a segment that is not an OCTET STRING", name),
                );
            }
        }
    }
    o.constructed_end()
}

/// OCTET STRING holding text
pub fn cstring(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::OCTET_STRING)
}

/// VisibleString
pub fn visible_string(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::VISIBLE_STRING)
}

/// GeneralString
pub fn general_string(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::GENERAL_STRING)
}

/// GraphicString
pub fn graphic_string(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::GRAPHIC_STRING)
}

/// UTF8String
pub fn utf8_string(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::UTF8_STRING)
}

/// GeneralizedTime, kept as its textual form (`YYYYMMDDHHMMSS[.f][Z]`)
pub fn generalized_time(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::GENERALIZED_TIME)
}

/// ObjectDescriptor
pub fn object_descriptor(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    text_tagged(o, slot, optional, name, universal::OBJECT_DESCRIPTOR)
}

/// String types share the OCTET STRING encoding under their own tag
fn text_tagged(
    o: &mut Odr,
    slot: &mut Option<String>,
    optional: bool,
    name: &str,
    tag: u32,
) -> OdrResult<()> {
    let mut octets = slot.as_ref().map(|text| Bytes::copy_from_slice(text.as_bytes()));
    if o.is_print() {
        o.check()?;
        let present = slot.is_some();
        if o.ber_tag(present, BerTagClass::Universal, tag, false)?.is_none() {
            return o.missing(optional, name);
        }
        let text = format!("'{}'", slot.as_deref().unwrap_or_default());
        return o.print_line(name, &text);
    }

    // text is copied once into the owned String; the arena is not involved
    octets_tagged(o, &mut octets, optional, name, tag, |_, content| Ok(content))?;
    if o.is_decode() {
        *slot = match octets {
            Some(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => Some(text.to_owned()),
                Err(_) => {
                    return o.fail(OdrErrorCode::Data, format!("{} is not valid UTF-8", name));
                }
            },
            None => None,
        };
    }
    Ok(())
}

/// BIT STRING
pub fn bit_string(o: &mut Odr, slot: &mut Option<BitString>, optional: bool, name: &str) -> OdrResult<()> {
    primitive(
        o,
        slot,
        optional,
        name,
        universal::BIT_STRING,
        |bits| {
            let mut content = Vec::with_capacity(bits.as_bytes().len() + 1);
            content.push(bits.unused_bits());
            content.extend_from_slice(bits.as_bytes());
            Ok(content)
        },
        |o, content| {
            let bits = bit_string_value(&content);
            o.guard(bits)
        },
        |bits| format!("BITSTRING(len={}) {}", bits.num_bits(), bits),
    )
}

/// OBJECT IDENTIFIER
pub fn oid(o: &mut Odr, slot: &mut Option<Oid>, optional: bool, name: &str) -> OdrResult<()> {
    primitive(
        o,
        slot,
        optional,
        name,
        universal::OBJECT_IDENTIFIER,
        oid_content,
        |o, content| {
            let oid = oid_value(&content);
            o.guard(oid)
        },
        |oid| oid.to_string(),
    )
}

/// ANY: the next complete element, whatever its tag
///
/// A pending tag override does not apply to ANY and is discarded.
pub fn any(o: &mut Odr, slot: &mut Option<Any>, optional: bool, name: &str) -> OdrResult<()> {
    o.check()?;
    if o.take_implicit().is_some() {
        log::debug!("odr: implicit tag on ANY {} ignored", name);
    }

    match o.direction() {
        Direction::Decode => {
            *slot = None;
            if !o.constructed_more() {
                return o.missing(optional, name);
            }
            let bound = o.bound();
            let extent = complete(o.decoder.peek_bytes(bound));
            let len = match extent {
                Completeness::Complete(len) => len,
                Completeness::Incomplete => {
                    return o.fail(OdrErrorCode::Proto, format!("{} is truncated", name));
                }
                Completeness::Invalid => {
                    return o.fail(OdrErrorCode::Proto, format!("{} is not valid BER", name));
                }
            };
            let raw = o.decoder.read_bytes(len, bound);
            let raw = o.guard(raw)?;
            let copied = o.arena_copy(&raw)?;
            *slot = Some(Any(copied));
            Ok(())
        }
        Direction::Encode => match slot.as_ref() {
            Some(any) => {
                o.encoder.write_raw(&any.0);
                Ok(())
            }
            None => o.missing(optional, name),
        },
        Direction::Print => match slot.as_ref() {
            Some(any) => {
                let text = format!("ANY(len={}) {}", any.0.len(), hex_dump(&any.0));
                o.print_line(name, &text)
            }
            None => o.missing(optional, name),
        },
    }
}
