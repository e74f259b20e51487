//! Randomized encode/decode round-trips.
//!
//! Generated document trees must round-trip under the codec's numeric
//! promotion equivalence, and the size precomputation must always equal
//! the serialized byte count.

use bson_pack::{
    BsonBinary, BsonCode, BsonCodec, BsonLong, BsonObjectId, BsonSymbol, BsonTimestamp,
    DocRegExp, DocValue,
};
use proptest::prelude::*;

fn primitive_value() -> impl Strategy<Value = DocValue> {
    prop_oneof![
        Just(DocValue::Null),
        any::<bool>().prop_map(DocValue::Bool),
        any::<i32>().prop_map(|i| DocValue::Integer(i as i64)),
        (-(1i64 << 53)..=(1i64 << 53)).prop_map(DocValue::Integer),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(DocValue::Float),
        "[a-zA-Z0-9 ]{0,24}".prop_map(DocValue::Str),
        any::<i64>().prop_map(DocValue::Date),
        ("[a-z]{1,8}", any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(source, ignore_case, multiline, global)| {
                DocValue::RegExp(DocRegExp {
                    source,
                    ignore_case,
                    multiline,
                    global,
                })
            }
        ),
    ]
}

fn carrier_value() -> impl Strategy<Value = DocValue> {
    prop_oneof![
        any::<i64>().prop_map(|v| DocValue::Long(BsonLong::from_i64(v))),
        any::<[u8; 12]>().prop_map(|id| DocValue::ObjectId(BsonObjectId::new(id))),
        (proptest::collection::vec(any::<u8>(), 0..32), any::<u8>())
            .prop_map(|(data, sub_type)| DocValue::Binary(BsonBinary::new(data, sub_type))),
        "[a-z(){} ]{0,16}".prop_map(|code| DocValue::Code(BsonCode::new(code))),
        "[a-z]{0,12}".prop_map(|value| DocValue::Symbol(BsonSymbol { value })),
        (any::<i32>(), any::<i32>())
            .prop_map(|(low, high)| DocValue::Timestamp(BsonTimestamp::new(low, high))),
        Just(DocValue::MinKey),
        Just(DocValue::MaxKey),
    ]
}

fn leaf_value() -> impl Strategy<Value = DocValue> {
    prop_oneof![primitive_value(), carrier_value()]
}

fn doc_value() -> impl Strategy<Value = DocValue> {
    leaf_value().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(DocValue::Array),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..4).prop_map(|fields| {
                // Duplicate keys would decode into duplicate entries too,
                // but keep the generated documents well-formed.
                let mut seen = std::collections::HashSet::new();
                DocValue::Object(
                    fields
                        .into_iter()
                        .filter(|(k, _)| seen.insert(k.clone()))
                        .collect(),
                )
            }),
        ]
    })
}

fn top_level() -> impl Strategy<Value = DocValue> {
    proptest::collection::vec(("[a-z]{1,6}", doc_value()), 0..6).prop_map(|fields| {
        let mut seen = std::collections::HashSet::new();
        DocValue::Object(
            fields
                .into_iter()
                .filter(|(k, _)| seen.insert(k.clone()))
                .collect(),
        )
    })
}

fn assert_equivalent(actual: &DocValue, expected: &DocValue) {
    match (actual, expected) {
        (DocValue::Float(a), DocValue::Float(b)) if a.is_nan() && b.is_nan() => {}
        (DocValue::Float(a), DocValue::Integer(b)) if *a == *b as f64 => {}
        (DocValue::Integer(a), DocValue::Float(b)) if *a as f64 == *b => {}
        (DocValue::Integer(a), DocValue::Long(b)) if *a == b.as_i64() => {}
        (DocValue::Long(a), DocValue::Integer(b)) if a.as_i64() == *b => {}
        (DocValue::Array(a), DocValue::Array(b)) => {
            assert_eq!(a.len(), b.len());
            for (left, right) in a.iter().zip(b.iter()) {
                assert_equivalent(left, right);
            }
        }
        (DocValue::Object(a), DocValue::Object(b)) => {
            assert_eq!(a.len(), b.len());
            for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                assert_eq!(ak, bk);
                assert_equivalent(av, bv);
            }
        }
        _ => assert_eq!(actual, expected),
    }
}

proptest! {
    #[test]
    fn generated_documents_roundtrip(value in top_level()) {
        let codec = BsonCodec::new();
        let bytes = codec.serialize(&value, false, false).unwrap();
        prop_assert_eq!(bytes.len(), codec.calculate_size(&value, false));
        let parsed = codec.deserialize(&bytes).unwrap();
        assert_equivalent(&parsed, &value);
    }

    #[test]
    fn size_is_exact_for_arrays(items in proptest::collection::vec(leaf_value(), 0..16)) {
        let codec = BsonCodec::new();
        let value = DocValue::Array(items);
        let bytes = codec.serialize(&value, false, false).unwrap();
        prop_assert_eq!(bytes.len(), codec.calculate_size(&value, false));
    }

    #[test]
    fn stream_roundtrip_of_document_batches(
        docs in proptest::collection::vec(top_level(), 1..5)
    ) {
        let codec = BsonCodec::new();
        let mut buffer = Vec::new();
        for doc in &docs {
            buffer.extend_from_slice(&codec.serialize(doc, false, false).unwrap());
        }
        let mut out = Vec::new();
        let cursor = codec
            .deserialize_stream(&buffer, 0, docs.len(), &mut out, 0)
            .unwrap();
        prop_assert_eq!(cursor, buffer.len());
        prop_assert_eq!(out.len(), docs.len());
        for (parsed, original) in out.iter().zip(docs.iter()) {
            assert_equivalent(parsed, original);
        }
    }

    #[test]
    fn decoder_never_panics_on_random_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let codec = BsonCodec::new();
        let _ = codec.deserialize(&bytes);
    }
}
