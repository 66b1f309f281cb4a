// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte-level layout of the stream formats.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{count_occurrences, q, NS};
use nodestream::{
    read_tree, varint, write_tree, EventLog, NodeDataInput, StreamEvent, StreamVersion,
};
use nodestream_model::{NodeIdentifierWithPredicates, NormalizedNode, Value};

fn encode(version: StreamVersion, tree: &NormalizedNode) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_tree(&mut bytes, version, tree).expect("encode");
    bytes
}

fn hex(text: &str) -> Vec<u8> {
    hex::decode(text.replace(' ', "")).expect("hex fixture")
}

fn urn_test() -> String {
    hex::encode(NS)
}

#[test]
fn lithium_leaf_layout() {
    let bytes = encode(StreamVersion::Lithium, &NormalizedNode::leaf(q("x"), 42));
    let expected = hex(&format!(
        "ab0001 01 02 0001 78 02 0008 {} 03 03 0000002a",
        urn_test()
    ));
    assert_eq!(bytes, expected);
}

#[test]
fn magnesium_leaf_layout() {
    let bytes = encode(StreamVersion::Magnesium, &NormalizedNode::leaf(q("x"), 42));
    let expected = hex(&format!("ab0004 01 0c08 {} 0b 0c0178 2d002a", urn_test()));
    assert_eq!(bytes, expected);
}

#[test]
fn magnesium_map_entry_inherits_name_and_elides_nothing_without_children() {
    let entry = NodeIdentifierWithPredicates::new(q("user")).with_key(q("id"), Value::Uint8(7));
    let tree = NormalizedNode::map(q("user"), false, vec![NormalizedNode::map_entry(entry, vec![])]);
    let bytes = encode(StreamVersion::Magnesium, &tree);
    let expected = hex(&format!(
        "ab0004 04 0c08 {} 0b 0c04 75736572 7d 31 3500 0c02 6964 0707 00 00",
        urn_test()
    ));
    assert_eq!(bytes, expected);
    assert_eq!(read_tree(bytes.as_slice()).expect("decode"), tree);
}

#[test]
fn magnesium_leaf_set_entries_inherit_the_set_name() {
    let tree = NormalizedNode::leaf_set(
        q("tags"),
        false,
        vec![NormalizedNode::leaf_set_entry(q("tags"), "a")],
    );
    let bytes = encode(StreamVersion::Magnesium, &tree);
    let expected = hex(&format!(
        "ab0004 06 0c08 {} 0b 0c04 74616773 3c 0c0161 00",
        urn_test()
    ));
    assert_eq!(bytes, expected);
}

#[test]
fn container_with_leaf_replays_as_three_events() {
    let tree = NormalizedNode::container(q("root"), vec![NormalizedNode::leaf(q("x"), 42)]);
    for version in StreamVersion::ALL {
        let bytes = encode(version, &tree);
        let mut log = EventLog::new();
        NodeDataInput::new(bytes.as_slice())
            .stream_node(&mut log)
            .expect("decode");
        let events = log.into_events();
        assert_eq!(events.len(), 3, "{version}");
        assert!(
            matches!(&events[0], StreamEvent::StartContainer(id, _) if *id.qname() == q("root")),
            "{version}"
        );
        assert!(
            matches!(&events[1], StreamEvent::Leaf(id, Value::Int32(42)) if *id.qname() == q("x")),
            "{version}"
        );
        assert_eq!(events[2], StreamEvent::End, "{version}");
    }
}

#[test]
fn names_are_written_once_per_stream() {
    let tree = NormalizedNode::container(
        q("root"),
        vec![
            NormalizedNode::leaf(q("a"), 1),
            NormalizedNode::leaf(q("b"), 2),
            NormalizedNode::container(q("root"), vec![NormalizedNode::leaf(q("a"), 3)]),
        ],
    );
    for version in StreamVersion::ALL {
        let bytes = encode(version, &tree);
        assert_eq!(count_occurrences(&bytes, NS.as_bytes()), 1, "{version}");
        assert_eq!(count_occurrences(&bytes, b"root"), 1, "{version}");
        // Same input, same bytes.
        assert_eq!(encode(version, &tree), bytes, "{version}");
    }
}

fn keyed_entry(leaf_value: i64) -> NormalizedNode {
    let key = Value::Int64(5_000_000_000);
    let entry = NodeIdentifierWithPredicates::new(q("user")).with_key(q("id"), key);
    NormalizedNode::map(
        q("user"),
        false,
        vec![NormalizedNode::map_entry(
            entry,
            vec![NormalizedNode::leaf(q("id"), Value::Int64(leaf_value))],
        )],
    )
}

#[test]
fn magnesium_elides_key_leaf_values() {
    let matching = keyed_entry(5_000_000_000);
    let mismatched = keyed_entry(6_000_000_000);
    let elided = encode(StreamVersion::Magnesium, &matching);
    let full = encode(StreamVersion::Magnesium, &mismatched);
    // opcode plus eight value bytes
    assert_eq!(elided.len() + 9, full.len());
    assert_eq!(read_tree(elided.as_slice()).expect("decode"), matching);
    assert_eq!(read_tree(full.as_slice()).expect("decode"), mismatched);
}

#[test]
fn magnesium_elides_every_key_of_a_compound_entry() {
    let entry = NodeIdentifierWithPredicates::of(
        q("pair"),
        [(q("k1"), Value::Int32(1)), (q("k2"), Value::from("x"))],
    );
    let leaves = vec![
        NormalizedNode::leaf(q("k1"), Value::Int32(1)),
        NormalizedNode::leaf(q("k2"), "x"),
    ];
    let keyed = NormalizedNode::map(
        q("pair"),
        false,
        vec![NormalizedNode::map_entry(entry, leaves.clone())],
    );
    let plain = NormalizedNode::container(q("pair"), leaves);
    let keyed_bytes = encode(StreamVersion::Magnesium, &keyed);
    let plain_bytes = encode(StreamVersion::Magnesium, &plain);
    // Neither key value appears after the predicates.
    assert_eq!(count_occurrences(&keyed_bytes, &[0x0C, 0x01, b'x']), 1);
    assert_eq!(count_occurrences(&plain_bytes, &[0x0C, 0x01, b'x']), 1);
    assert_eq!(read_tree(keyed_bytes.as_slice()).expect("decode"), keyed);
}

#[test]
fn legacy_formats_never_elide() {
    for version in [StreamVersion::Lithium, StreamVersion::NeonSr2, StreamVersion::SodiumSr1] {
        let matching = encode(version, &keyed_entry(5_000_000_000));
        let mismatched = encode(version, &keyed_entry(6_000_000_000));
        assert_eq!(matching.len(), mismatched.len(), "{version}");
    }
}

#[test]
fn varint_boundaries() {
    let cases: [(u32, usize); 10] = [
        (0, 1),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (2_097_151, 3),
        (2_097_152, 4),
        (268_435_455, 4),
        (268_435_456, 5),
        (u32::MAX, 5),
    ];
    for (value, len) in cases {
        let mut bytes = Vec::new();
        varint::write(&mut bytes, value).expect("write");
        assert_eq!(bytes.len(), len, "{value}");
        assert_eq!(varint::encoded_len(value), len, "{value}");
        let mut slice = bytes.as_slice();
        assert_eq!(varint::read(&mut slice).expect("read"), value);
        assert!(slice.is_empty());
    }
    let mut bytes = Vec::new();
    varint::write(&mut bytes, 300).expect("write");
    assert_eq!(bytes, [0xAC, 0x02]);
}

#[test]
fn varint_rejects_overlong_input() {
    let mut slice: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
    assert!(varint::read(&mut slice).is_err());
    let mut slice: &[u8] = &[0x80, 0x80];
    assert!(varint::read(&mut slice).is_err());
}
