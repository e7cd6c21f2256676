//! Property-based tests using proptest

mod common;

use bytes::Bytes;
use common::{decode, encode, item, pdu, Item};
use odr::{complete, Completeness, Oid, OdrType};
use proptest::prelude::*;

fn oid_arcs() -> impl Strategy<Value = Vec<u32>> {
    (0u32..3, 0u32..40, prop::collection::vec(any::<u32>(), 0..8)).prop_map(|(x, y, rest)| {
        let mut arcs = vec![x, y];
        arcs.extend(rest);
        arcs
    })
}

proptest! {
    #[test]
    fn prop_integer_round_trip(value in any::<i64>()) {
        let bytes = encode(<i64 as OdrType>::odr, &mut Some(value));
        prop_assert_eq!(bytes[0], 0x02);
        prop_assert_eq!(decode(<i64 as OdrType>::odr, bytes).unwrap(), Some(value));
    }

    #[test]
    fn prop_octet_string_round_trip(
        count in proptest::option::of(any::<i64>()),
        data in prop::collection::vec(any::<u8>(), 0..300)
    ) {
        let value = Item { count, data: Bytes::from(data) };
        let bytes = encode(item, &mut Some(value.clone()));
        prop_assert_eq!(decode(item, bytes).unwrap(), Some(value));
    }

    #[test]
    fn prop_sequence_of_round_trip(values in prop::collection::vec(any::<i64>(), 0..40)) {
        let bytes = encode(<Vec<i64> as OdrType>::odr, &mut Some(values.clone()));
        let decoded = decode(<Vec<i64> as OdrType>::odr, bytes).unwrap();
        prop_assert_eq!(decoded, Some(values));
    }

    #[test]
    fn prop_oid_round_trip(arcs in oid_arcs()) {
        let oid = Oid::new(arcs).unwrap();
        let bytes = encode(<Oid as OdrType>::odr, &mut Some(oid.clone()));
        prop_assert_eq!(decode(<Oid as OdrType>::odr, bytes).unwrap(), Some(oid));
    }

    #[test]
    fn prop_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        // Should either succeed or return an error, never panic
        let result = decode(pdu, Bytes::from(data));
        prop_assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn prop_complete_within_buffer(data in prop::collection::vec(any::<u8>(), 0..512)) {
        if let Completeness::Complete(len) = complete(&data) {
            prop_assert!(len >= 2 && len <= data.len());
        }
    }
}
