//! A small Z39.50-like message set described with the ODR combinators
#![allow(dead_code)]

use std::sync::LazyLock;

use bytes::Bytes;
use odr::{
    choice_arm, external_with, primitive, Any, BerTagClass, BitString, Choice, ChoiceArm,
    External, ExternalTypeTable, Odr, OdrResult, OdrType, Oid, EXTERNAL_ARBITRARY, EXTERNAL_OCTET,
    EXTERNAL_SINGLE,
};

const CONTEXT: BerTagClass = BerTagClass::ContextSpecific;

/// OID under which brief records are registered
pub const BRIEF_RECORD_SYNTAX: &str = "1.2.840.10003.5.1000.81.1";

/// Discriminant of the brief-record arm of [`RecordEncoding`]
pub const RECORD_BRIEF: i32 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitRequest {
    pub reference_id: Option<Bytes>,
    pub protocol_version: BitString,
    pub options: BitString,
    pub preferred_message_size: i64,
    pub exceptional_record_size: i64,
    pub id_authentication: Option<Any>,
    pub implementation_id: Option<String>,
    pub implementation_name: Option<String>,
    pub user_information: Option<External<RecordEncoding>>,
}

pub fn init_request(
    o: &mut Odr,
    slot: &mut Option<InitRequest>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    o.sequence(slot, optional, name, |o, p| {
        o.implicit_tag(primitive::octet_string, &mut p.reference_id, true, CONTEXT, 2, "referenceId")?;
        o.implicit_settag(CONTEXT, 3);
        o.required(primitive::bit_string, &mut p.protocol_version, "protocolVersion")?;
        o.implicit_settag(CONTEXT, 4);
        o.required(primitive::bit_string, &mut p.options, "options")?;
        o.implicit_settag(CONTEXT, 5);
        o.required(primitive::integer, &mut p.preferred_message_size, "preferredMessageSize")?;
        o.implicit_settag(CONTEXT, 6);
        o.required(primitive::integer, &mut p.exceptional_record_size, "exceptionalRecordSize")?;
        o.explicit_tag(primitive::any, &mut p.id_authentication, true, CONTEXT, 7, "idAuthentication")?;
        o.implicit_tag(primitive::general_string, &mut p.implementation_id, true, CONTEXT, 110, "implementationId")?;
        o.implicit_tag(primitive::general_string, &mut p.implementation_name, true, CONTEXT, 111, "implementationName")?;
        o.explicit_tag(record, &mut p.user_information, true, CONTEXT, 11, "userInformationField")
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub reference_id: Option<Bytes>,
    pub small_set_upper_bound: i64,
    pub replace_indicator: bool,
    pub result_set_name: String,
    pub database_names: Vec<String>,
    pub query: Option<Query>,
}

pub fn search_request(
    o: &mut Odr,
    slot: &mut Option<SearchRequest>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    o.sequence(slot, optional, name, |o, p| {
        o.implicit_tag(primitive::octet_string, &mut p.reference_id, true, CONTEXT, 2, "referenceId")?;
        o.implicit_settag(CONTEXT, 13);
        o.required(primitive::integer, &mut p.small_set_upper_bound, "smallSetUpperBound")?;
        o.implicit_settag(CONTEXT, 16);
        o.required(primitive::boolean, &mut p.replace_indicator, "replaceIndicator")?;
        o.implicit_settag(CONTEXT, 17);
        o.required(primitive::general_string, &mut p.result_set_name, "resultSetName")?;
        o.implicit_settag(CONTEXT, 18);
        o.required(database_names, &mut p.database_names, "databaseNames")?;
        o.explicit_tag(query, &mut p.query, false, CONTEXT, 21, "query")
    })
}

pub fn database_names(
    o: &mut Odr,
    slot: &mut Option<Vec<String>>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    o.sequence_of(database_name, slot, optional, name)
}

pub fn database_name(o: &mut Odr, slot: &mut Option<String>, optional: bool, name: &str) -> OdrResult<()> {
    o.implicit_tag(primitive::general_string, slot, optional, CONTEXT, 105, name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Type0(Any),
    Type1(RpnQuery),
    Type2(Bytes),
    Type100(Bytes),
}

impl Choice for Query {
    fn which(&self) -> i32 {
        match self {
            Query::Type0(_) => 0,
            Query::Type1(_) => 1,
            Query::Type2(_) => 2,
            Query::Type100(_) => 100,
        }
    }
}

pub static QUERY_ARMS: &[ChoiceArm<Query>] = &[
    choice_arm!(Explicit, ContextSpecific, 0, Query::Type0, 0, primitive::any, "type_0"),
    choice_arm!(Implicit, ContextSpecific, 1, Query::Type1, 1, rpn_query, "type_1"),
    choice_arm!(Implicit, ContextSpecific, 2, Query::Type2, 2, primitive::octet_string, "type_2"),
    choice_arm!(Implicit, ContextSpecific, 100, Query::Type100, 100, primitive::octet_string, "type_100"),
];

pub fn query(o: &mut Odr, slot: &mut Option<Query>, optional: bool, name: &str) -> OdrResult<()> {
    o.choice_field(QUERY_ARMS, slot, optional, name)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpnQuery {
    pub attribute_set: Option<Oid>,
    pub term: Option<Term>,
}

pub fn rpn_query(o: &mut Odr, slot: &mut Option<RpnQuery>, optional: bool, name: &str) -> OdrResult<()> {
    o.sequence(slot, optional, name, |o, q| {
        primitive::oid(o, &mut q.attribute_set, false, "attributeSet")?;
        o.choice_field(TERM_ARMS, &mut q.term, false, "term")
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    General(Bytes),
    Numeric(i64),
    Null(()),
}

impl Choice for Term {
    fn which(&self) -> i32 {
        match self {
            Term::General(_) => 1,
            Term::Numeric(_) => 2,
            Term::Null(_) => 3,
        }
    }
}

pub static TERM_ARMS: &[ChoiceArm<Term>] = &[
    choice_arm!(Implicit, ContextSpecific, 45, Term::General, 1, primitive::octet_string, "general"),
    choice_arm!(Implicit, ContextSpecific, 215, Term::Numeric, 2, primitive::integer, "numeric"),
    choice_arm!(Implicit, ContextSpecific, 216, Term::Null, 3, primitive::null, "null"),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Close {
    pub close_reason: i64,
    pub diagnostic_information: Option<String>,
}

pub fn close(o: &mut Odr, slot: &mut Option<Close>, optional: bool, name: &str) -> OdrResult<()> {
    o.sequence(slot, optional, name, |o, c| {
        o.implicit_settag(CONTEXT, 211);
        o.required(primitive::integer, &mut c.close_reason, "closeReason")?;
        o.implicit_tag(primitive::general_string, &mut c.diagnostic_information, true, CONTEXT, 3, "diagnosticInformation")
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pdu {
    InitRequest(InitRequest),
    SearchRequest(SearchRequest),
    Close(Close),
}

impl Choice for Pdu {
    fn which(&self) -> i32 {
        match self {
            Pdu::InitRequest(_) => 1,
            Pdu::SearchRequest(_) => 2,
            Pdu::Close(_) => 3,
        }
    }
}

pub static PDU_ARMS: &[ChoiceArm<Pdu>] = &[
    choice_arm!(Implicit, ContextSpecific, 20, Pdu::InitRequest, 1, init_request, "initRequest"),
    choice_arm!(Implicit, ContextSpecific, 22, Pdu::SearchRequest, 2, search_request, "searchRequest"),
    choice_arm!(Implicit, ContextSpecific, 48, Pdu::Close, 3, close, "close"),
];

pub fn pdu(o: &mut Odr, slot: &mut Option<Pdu>, optional: bool, name: &str) -> OdrResult<()> {
    o.choice_field(PDU_ARMS, slot, optional, name)
}

/// EXTERNAL encodings extended with a registered brief-record type
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEncoding {
    Single(Any),
    Octet(Bytes),
    Arbitrary(BitString),
    Brief(BriefRecord),
}

impl Choice for RecordEncoding {
    fn which(&self) -> i32 {
        match self {
            RecordEncoding::Single(_) => EXTERNAL_SINGLE,
            RecordEncoding::Octet(_) => EXTERNAL_OCTET,
            RecordEncoding::Arbitrary(_) => EXTERNAL_ARBITRARY,
            RecordEncoding::Brief(_) => RECORD_BRIEF,
        }
    }
}

pub static RECORD_ARMS: &[ChoiceArm<RecordEncoding>] = &[
    choice_arm!(Explicit, ContextSpecific, 0, RecordEncoding::Single, EXTERNAL_SINGLE, primitive::any, "single-ASN1-type"),
    choice_arm!(Implicit, ContextSpecific, 1, RecordEncoding::Octet, EXTERNAL_OCTET, primitive::octet_string, "octet-aligned"),
    choice_arm!(Implicit, ContextSpecific, 2, RecordEncoding::Arbitrary, EXTERNAL_ARBITRARY, primitive::bit_string, "arbitrary"),
    choice_arm!(Explicit, ContextSpecific, 0, RecordEncoding::Brief, RECORD_BRIEF, brief_record, "briefRecord"),
];

pub static RECORD_TYPES: LazyLock<ExternalTypeTable> = LazyLock::new(|| {
    let mut table = ExternalTypeTable::new();
    table.register(Oid::from_string(BRIEF_RECORD_SYNTAX).expect("valid OID"), RECORD_BRIEF);
    table
});

pub fn record(
    o: &mut Odr,
    slot: &mut Option<External<RecordEncoding>>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    external_with(o, slot, optional, name, RECORD_ARMS, &RECORD_TYPES)
}

/// Same as [`record`] but without registered types
pub fn record_unregistered(
    o: &mut Odr,
    slot: &mut Option<External<RecordEncoding>>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    external_with(o, slot, optional, name, RECORD_ARMS, &ExternalTypeTable::new())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BriefRecord {
    pub title: String,
    pub hits: Option<i64>,
}

pub fn brief_record(
    o: &mut Odr,
    slot: &mut Option<BriefRecord>,
    optional: bool,
    name: &str,
) -> OdrResult<()> {
    o.sequence(slot, optional, name, |o, b| {
        o.implicit_settag(CONTEXT, 0);
        o.required(primitive::general_string, &mut b.title, "title")?;
        o.implicit_tag(primitive::integer, &mut b.hits, true, CONTEXT, 1, "hits")
    })
}

/// SEQUENCE { count INTEGER OPTIONAL, data OCTET STRING }
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub count: Option<i64>,
    pub data: Bytes,
}

pub fn item(o: &mut Odr, slot: &mut Option<Item>, optional: bool, name: &str) -> OdrResult<()> {
    o.sequence(slot, optional, name, |o, i| {
        primitive::integer(o, &mut i.count, true, "count")?;
        o.required(primitive::octet_string, &mut i.data, "data")
    })
}

/// Recursively nested SEQUENCE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nest {
    pub inner: Option<Box<Nest>>,
}

impl Nest {
    pub fn with_depth(depth: usize) -> Self {
        let mut nest = Nest::default();
        for _ in 1..depth {
            nest = Nest {
                inner: Some(Box::new(nest)),
            };
        }
        nest
    }

    pub fn depth(&self) -> usize {
        1 + self.inner.as_ref().map_or(0, |inner| inner.depth())
    }
}

impl OdrType for Nest {
    fn odr(o: &mut Odr, slot: &mut Option<Self>, optional: bool, name: &str) -> OdrResult<()> {
        o.sequence(slot, optional, name, |o, n| {
            Box::<Nest>::odr(o, &mut n.inner, true, "nest")
        })
    }
}

pub fn sample_init_request() -> InitRequest {
    let mut protocol_version = BitString::zeros(3);
    for bit in 0..3 {
        protocol_version.set_bit(bit, true);
    }
    let mut options = BitString::zeros(2);
    options.set_bit(0, true);
    InitRequest {
        reference_id: Some(Bytes::from_static(b"ref1")),
        protocol_version,
        options,
        preferred_message_size: 1024,
        exceptional_record_size: 65536,
        id_authentication: None,
        implementation_id: Some("81".to_string()),
        implementation_name: Some("odr".to_string()),
        user_information: None,
    }
}

pub fn sample_search_request(databases: usize) -> SearchRequest {
    SearchRequest {
        reference_id: None,
        small_set_upper_bound: 0,
        replace_indicator: true,
        result_set_name: "default".to_string(),
        database_names: (0..databases).map(|i| format!("db{}", i)).collect(),
        query: Some(Query::Type1(RpnQuery {
            attribute_set: Some(Oid::from_string("1.2.840.10003.3.1").expect("valid OID")),
            term: Some(Term::General(Bytes::from_static(b"dinosaur"))),
        })),
    }
}

pub fn encode<T>(op: odr::OdrFn<T>, value: &mut Option<T>) -> Bytes {
    let mut o = Odr::new(odr::Direction::Encode);
    op(&mut o, value, false, "top").expect("encode");
    o.take_buf()
}

pub fn decode<T>(op: odr::OdrFn<T>, bytes: Bytes) -> OdrResult<Option<T>> {
    let mut o = Odr::new(odr::Direction::Decode);
    o.set_buf(bytes);
    let mut value = None;
    op(&mut o, &mut value, false, "top")?;
    Ok(value)
}
