mod common;

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use common::*;
use odr::{primitive, Any, BlockPool, Direction, External, Odr, OdrConfig, OdrErrorCode, OdrType, Oid};

fn encode_pdu(value: Pdu) -> Bytes {
    encode(pdu, &mut Some(value))
}

fn print_pdu(value: &mut Option<Pdu>) -> String {
    let mut o = Odr::new(Direction::Print);
    pdu(&mut o, value, false, "pdu").unwrap();
    o.take_print_output()
}

#[test]
fn test_init_request_all_optional_absent() {
    let value = Pdu::InitRequest(InitRequest {
        preferred_message_size: 4096,
        exceptional_record_size: 4096,
        ..InitRequest::default()
    });
    let bytes = encode_pdu(value.clone());
    assert_eq!(&bytes[..2], &[0xB4, 0x0E]);

    let decoded = decode(pdu, bytes).unwrap();
    assert_eq!(decoded, Some(value));
}

#[test]
fn test_init_request_all_optional_present() {
    let mut request = sample_init_request();
    request.id_authentication = Some(Any(Bytes::from_static(&[0x1A, 0x03, b'a', b'b', b'c'])));
    request.user_information = Some(External {
        direct_reference: Some(Oid::from_string("1.2.840.10003.10.1").unwrap()),
        indirect_reference: Some(1),
        descriptor: Some("explain".to_string()),
        encoding: RecordEncoding::Octet(Bytes::from_static(b"\x00\x01\x02")),
    });
    let value = Pdu::InitRequest(request);

    let bytes = encode_pdu(value.clone());
    let decoded = decode(pdu, bytes.clone()).unwrap();
    assert_eq!(decoded, Some(value.clone()));

    // re-encoding the decoded value reproduces the input
    assert_eq!(encode_pdu(decoded.unwrap()), bytes);
}

#[test]
fn test_close_wire_format() {
    let bytes = encode_pdu(Pdu::Close(Close::default()));
    assert_eq!(&bytes[..], &[0xBF, 0x30, 0x05, 0x9F, 0x81, 0x53, 0x01, 0x00]);
}

#[test]
fn test_print_output() {
    let mut value = Some(Pdu::InitRequest(sample_init_request()));
    assert_eq!(
        print_pdu(&mut value),
        "initRequest {\n\
         \x20 referenceId OCTETSTRING(len=4) 72 65 66 31\n\
         \x20 protocolVersion BITSTRING(len=3) 111\n\
         \x20 options BITSTRING(len=2) 10\n\
         \x20 preferredMessageSize 1024\n\
         \x20 exceptionalRecordSize 65536\n\
         \x20 implementationId '81'\n\
         \x20 implementationName 'odr'\n\
         }\n"
    );
}

#[test]
fn test_print_is_pure() {
    let original = Pdu::SearchRequest(sample_search_request(3));
    let mut value = Some(original.clone());
    let before = encode(pdu, &mut value);

    let text = print_pdu(&mut value);
    assert!(text.starts_with("searchRequest {\n"));
    assert!(text.contains("    attributeSet 1.2.840.10003.3.1\n"));
    assert_eq!(value, Some(original));

    let after = encode(pdu, &mut value);
    assert_eq!(before, after);
    assert_eq!(decode(pdu, after).unwrap(), value);
}

#[test]
fn test_print_to_stream() {
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let sink = Shared::default();
    let mut o = Odr::new(Direction::Print);
    o.set_print_stream(Box::new(sink.clone()));
    pdu(&mut o, &mut Some(Pdu::Close(Close::default())), false, "pdu").unwrap();
    assert_eq!(o.print_output(), "");
    let written = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert_eq!(written, "close {\n  closeReason 0\n}\n");
}

#[test]
fn test_sequence_of_lengths() {
    for count in [0usize, 1, 5, 6, 23] {
        let value = Pdu::SearchRequest(sample_search_request(count));
        let decoded = decode(pdu, encode_pdu(value.clone())).unwrap();
        let Some(Pdu::SearchRequest(request)) = decoded else {
            panic!("expected a search request");
        };
        assert_eq!(request.database_names.len(), count);
        assert_eq!(request.database_names, (0..count).map(|i| format!("db{}", i)).collect::<Vec<_>>());
        if count == 0 {
            assert_eq!(request.database_names.capacity(), 0);
        }
    }
}

fn name_set(o: &mut Odr, slot: &mut Option<Vec<String>>, optional: bool, name: &str) -> odr::OdrResult<()> {
    o.set_of(database_name, slot, optional, name)
}

#[test]
fn test_set_of_lengths() {
    for count in [0usize, 1, 5, 6, 23] {
        let names: Vec<String> = (0..count).rev().map(|i| format!("db{}", i)).collect();
        let bytes = encode(name_set, &mut Some(names.clone()));
        assert_eq!(bytes[0], 0x31);
        let decoded = decode(name_set, bytes).unwrap().unwrap();
        assert_eq!(decoded, names);
        if count == 0 {
            assert_eq!(decoded.capacity(), 0);
        }
    }
}

#[test]
fn test_choice_without_matching_arm() {
    // [99] is not an arm of the PDU CHOICE
    let bytes = Bytes::from_static(&[0xBF, 0x63, 0x00]);
    let err = decode(pdu, bytes).unwrap_err();
    assert_eq!(err.code(), OdrErrorCode::Required);

    let mut o = Odr::new(Direction::Decode);
    o.set_buf(Bytes::from_static(&[0xBF, 0x63, 0x00]));
    let mut value = None;
    pdu(&mut o, &mut value, true, "pdu").unwrap();
    assert!(value.is_none());
    assert_eq!(o.position(), 0);
}

#[test]
fn test_stack_bound_on_encode() {
    let mut ok = Some(Nest::with_depth(50));
    let bytes = encode(Nest::odr, &mut ok);
    let decoded = decode(Nest::odr, bytes).unwrap();
    assert_eq!(decoded.map(|n| n.depth()), Some(50));

    let mut o = Odr::new(Direction::Encode);
    let err = Nest::odr(&mut o, &mut Some(Nest::with_depth(51)), false, "nest").unwrap_err();
    assert_eq!(err.code(), OdrErrorCode::Stack);
}

#[test]
fn test_stack_bound_on_decode() {
    let mut nested = vec![0x30, 0x00];
    for _ in 1..51 {
        let mut outer = vec![0x30, nested.len() as u8];
        outer.extend_from_slice(&nested);
        nested = outer;
    }
    let err = decode(Nest::odr, Bytes::from(nested)).unwrap_err();
    assert_eq!(err.code(), OdrErrorCode::Stack);
}

fn brief_external() -> External<RecordEncoding> {
    External {
        direct_reference: Some(Oid::from_string(BRIEF_RECORD_SYNTAX).unwrap()),
        indirect_reference: None,
        descriptor: None,
        encoding: RecordEncoding::Brief(BriefRecord {
            title: "Dinosaurs".to_string(),
            hits: Some(12),
        }),
    }
}

#[test]
fn test_bias_selects_registered_arm() {
    let bytes = encode(record, &mut Some(brief_external()));

    // without the registration the earlier [0] ANY arm wins
    let generic = decode(record_unregistered, bytes.clone()).unwrap().unwrap();
    assert!(matches!(generic.encoding, RecordEncoding::Single(_)));

    let decoded = decode(record, bytes).unwrap();
    assert_eq!(decoded, Some(brief_external()));
}

#[test]
fn test_bias_inside_pdu() {
    let mut request = sample_init_request();
    request.user_information = Some(brief_external());
    let value = Pdu::InitRequest(request);
    let decoded = decode(pdu, encode_pdu(value.clone())).unwrap();
    assert_eq!(decoded, Some(value));
}

#[test]
fn test_optional_integer_scenario() {
    let mut value = Some(Item {
        count: None,
        data: Bytes::from_static(b"hello"),
    });
    let first = encode(item, &mut value);
    assert_eq!(&first[..], &[0x30, 0x07, 0x04, 0x05, b'h', b'e', b'l', b'l', b'o']);

    let decoded = decode(item, first.clone()).unwrap().unwrap();
    assert_eq!(decoded.count, None);
    assert_eq!(&decoded.data[..], b"hello");

    let second = encode(item, &mut Some(decoded));
    assert_eq!(first, second);
}

#[test]
fn test_indefinite_length_input() {
    let bytes = Bytes::from_static(&[0xBF, 0x30, 0x80, 0x9F, 0x81, 0x53, 0x01, 0x02, 0x00, 0x00]);
    let decoded = decode(pdu, bytes).unwrap();
    assert_eq!(
        decoded,
        Some(Pdu::Close(Close {
            close_reason: 2,
            diagnostic_information: None,
        }))
    );

    let nested = Bytes::from_static(&[
        0x30, 0x80, 0x02, 0x01, 0x09, 0x24, 0x80, 0x04, 0x01, b'x', 0x00, 0x00, 0x00, 0x00,
    ]);
    let decoded = decode(item, nested).unwrap().unwrap();
    assert_eq!(decoded.count, Some(9));
    assert_eq!(&decoded.data[..], b"x");
}

#[test]
fn test_truncated_input_is_protocol_error() {
    let bytes = encode_pdu(Pdu::SearchRequest(sample_search_request(2)));
    for cut in [1, 2, bytes.len() / 2, bytes.len() - 1] {
        let err = decode(pdu, bytes.slice(..cut)).unwrap_err();
        assert_eq!(err.code(), OdrErrorCode::Proto, "cut at {}", cut);
    }
}

#[test]
fn test_memory_limit_is_structured_error() {
    let config = OdrConfig {
        mem_limit: Some(16),
        ..OdrConfig::default()
    };
    let mut o = Odr::with_config(Direction::Decode, config).unwrap();
    let mut input = vec![0x30, 0x2A, 0x04, 0x28];
    input.extend_from_slice(&[0x55; 40]);
    o.set_buf(input);
    let mut value = None;
    let err = item(&mut o, &mut value, false, "item").unwrap_err();
    assert_eq!(err.code(), OdrErrorCode::Memory);
    assert_eq!(err.element(), "item");
    assert!(value.is_none());
}

#[test]
fn test_error_path_and_reset() {
    let mut o = Odr::new(Direction::Decode);
    // close reason is a NULL instead of an INTEGER
    o.set_buf(Bytes::from_static(&[0xBF, 0x30, 0x02, 0x05, 0x00]));
    let mut value = None;
    let err = pdu(&mut o, &mut value, false, "pdu").unwrap_err();
    assert_eq!(err.code(), OdrErrorCode::Required);
    assert_eq!(err.addinfo(), Some("closeReason"));
    assert_eq!(err.element(), "close");
    assert!(value.is_none());

    // sticky until reset
    let mut n = None;
    assert!(primitive::integer(&mut o, &mut n, true, "n").is_err());

    o.reset();
    o.set_buf(encode_pdu(Pdu::Close(Close::default())));
    pdu(&mut o, &mut value, false, "pdu").unwrap();
    assert_eq!(value, Some(Pdu::Close(Close::default())));
}

#[test]
fn test_handles_share_block_pool() {
    let pool = Arc::new(BlockPool::new());
    let bytes = encode(item, &mut Some(Item { count: Some(1), data: Bytes::from_static(b"pooled") }));

    let mut first = Odr::with_pool(Direction::Decode, OdrConfig::default(), pool.clone()).unwrap();
    first.set_buf(bytes.clone());
    let mut value = None;
    item(&mut first, &mut value, false, "item").unwrap();
    drop(value);
    first.reset();
    assert_eq!(pool.idle(), 1);

    let mut second = Odr::with_pool(Direction::Decode, OdrConfig::default(), pool.clone()).unwrap();
    second.set_buf(bytes);
    let mut value = None;
    item(&mut second, &mut value, false, "item").unwrap();
    assert_eq!(pool.idle(), 0);
    assert_eq!(value.map(|i| i.data), Some(Bytes::from_static(b"pooled")));
}

#[test]
fn test_complete_frames_a_pdu() {
    let bytes = encode_pdu(Pdu::SearchRequest(sample_search_request(1)));
    let mut stream = bytes.to_vec();
    stream.extend_from_slice(&[0xBF, 0x30]);
    assert_eq!(odr::complete(&stream), odr::Completeness::Complete(bytes.len()));
    assert_eq!(odr::complete(&bytes[..bytes.len() - 1]), odr::Completeness::Incomplete);
}
