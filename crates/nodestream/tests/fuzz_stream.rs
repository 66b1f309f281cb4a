// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: arbitrary input never panics, arbitrary trees round-trip.
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::q;
use nodestream::{
    header_bytes, read_path, read_tree, write_tree, InvalidStream, NodeDataInput, StreamVersion,
};
use nodestream_model::{NodeIdentifierWithPredicates, NormalizedNode, QName, Value};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = QName> {
    "[a-z][a-z0-9-]{0,8}".prop_map(|s| q(&s))
}

fn signed_value() -> impl Strategy<Value = Value> + Clone {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i8>().prop_map(Value::Int8),
        any::<i16>().prop_map(Value::Int16),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        any::<i128>().prop_map(Value::BigInteger),
        ".{0,24}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..200).prop_map(Value::Binary),
        prop::collection::btree_set("[a-z]{1,6}", 0..40).prop_map(Value::Bits),
        name().prop_map(Value::QName),
        Just(Value::Empty),
    ]
}

fn unsigned_value() -> impl Strategy<Value = Value> + Clone {
    prop_oneof![
        any::<u8>().prop_map(Value::Uint8),
        any::<u16>().prop_map(Value::Uint16),
        any::<u32>().prop_map(Value::Uint32),
        any::<u64>().prop_map(Value::Uint64),
    ]
}

fn leaf_set(values: impl Strategy<Value = Value> + Clone) -> impl Strategy<Value = NormalizedNode> {
    (name(), any::<bool>(), prop::collection::vec(values, 0..5)).prop_map(|(n, ordered, values)| {
        let entries = values
            .into_iter()
            .map(|v| NormalizedNode::leaf_set_entry(n.clone(), v))
            .collect();
        NormalizedNode::leaf_set(n, ordered, entries)
    })
}

fn tree(values: impl Strategy<Value = Value> + Clone + 'static) -> impl Strategy<Value = NormalizedNode> {
    let base = prop_oneof![
        (name(), values.clone()).prop_map(|(n, v)| NormalizedNode::leaf(n, v)),
        (name(), ".{0,40}").prop_map(|(n, body)| NormalizedNode::anyxml(n, body)),
        leaf_set(values.clone()),
    ];
    base.prop_recursive(4, 64, 6, move |inner| {
        let children = prop::collection::vec(inner, 0..6);
        prop_oneof![
            (name(), children.clone()).prop_map(|(n, c)| NormalizedNode::container(n, c)),
            (name(), children.clone()).prop_map(|(n, c)| NormalizedNode::choice(n, c)),
            (name(), prop::collection::vec(children.clone(), 0..3)).prop_map(|(n, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|c| NormalizedNode::unkeyed_list_entry(n.clone(), c))
                    .collect();
                NormalizedNode::unkeyed_list(n, entries)
            }),
            (name(), any::<bool>(), name(), values.clone(), children).prop_map(
                |(n, ordered, key, v, mut c)| {
                    let id = NodeIdentifierWithPredicates::new(n.clone()).with_key(key.clone(), v.clone());
                    c.insert(0, NormalizedNode::leaf(key, v));
                    NormalizedNode::map(n, ordered, vec![NormalizedNode::map_entry(id, c)])
                }
            ),
        ]
    })
}

proptest! {
    #[test]
    fn fuzz_read_tree_no_panics(
        version in prop::sample::select(StreamVersion::ALL.to_vec()),
        payload in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let mut bytes = header_bytes(version).to_vec();
        bytes.extend_from_slice(&payload);
        let _ = read_tree(bytes.as_slice());
        let _ = read_path(bytes.as_slice());
    }

    #[test]
    fn fuzz_poisoned_reader_stays_poisoned(
        version in prop::sample::select(StreamVersion::ALL.to_vec()),
        payload in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut bytes = header_bytes(version).to_vec();
        bytes.extend_from_slice(&payload);
        let mut input = NodeDataInput::new(bytes.as_slice());
        if let Err(first) = input.read_node() {
            prop_assert!(input.is_poisoned());
            let again = input.read_node().expect_err("poisoned reader");
            match first.as_invalid() {
                Some(cause) => prop_assert_eq!(Some(cause), again.as_invalid()),
                None => prop_assert!(matches!(
                    again.as_invalid(),
                    Some(InvalidStream::Aborted(_))
                )),
            }
        }
    }

    #[test]
    fn signed_trees_round_trip_in_every_version(
        version in prop::sample::select(StreamVersion::ALL.to_vec()),
        node in tree(signed_value()),
    ) {
        let mut bytes = Vec::new();
        write_tree(&mut bytes, version, &node).expect("encode");
        prop_assert_eq!(read_tree(bytes.as_slice()).expect("decode"), node);
    }

    #[test]
    fn unsigned_trees_round_trip_with_native_unsigned(
        version in prop::sample::select(vec![StreamVersion::SodiumSr1, StreamVersion::Magnesium]),
        node in tree(prop_oneof![signed_value(), unsigned_value()]),
    ) {
        let mut bytes = Vec::new();
        write_tree(&mut bytes, version, &node).expect("encode");
        prop_assert_eq!(read_tree(bytes.as_slice()).expect("decode"), node);
    }
}
