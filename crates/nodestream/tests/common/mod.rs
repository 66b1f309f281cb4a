// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture trees shared by the integration tests.
#![allow(dead_code, clippy::expect_used)]

use nodestream_model::{
    AugmentationIdentifier, InstancePath, NodeIdentifier, NodeIdentifierWithPredicates,
    NodeWithValue, NormalizedNode, PathArgument, QName, Value,
};

pub const NS: &str = "urn:test";

pub fn q(name: &str) -> QName {
    QName::create(NS, name).expect("valid qname")
}

pub fn q_rev(name: &str) -> QName {
    QName::create_with_revision("urn:test:rev", "2023-10-01", name).expect("valid qname")
}

/// Signed-only values: representable exactly by every version.
pub fn portable_values() -> Vec<Value> {
    vec![
        Value::Bool(true),
        Value::Bool(false),
        Value::Int8(-3),
        Value::Int8(i8::MIN),
        Value::Int16(1),
        Value::Int16(-300),
        Value::Int32(42),
        Value::Int32(-42),
        Value::Int32(i32::MAX),
        Value::Int32(70_000),
        Value::Int64(0),
        Value::Int64(5_000_000_000),
        Value::Int64(-1),
        Value::BigInteger(i128::MIN),
        Value::Decimal("3.14159".into()),
        Value::String(String::new()),
        Value::String("hello".into()),
        Value::String("ünïcödé ✓".into()),
        Value::Binary(vec![]),
        Value::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]),
        Value::Binary(vec![7; 300]),
        Value::Empty,
        Value::QName(q_rev("identity")),
        Value::bits(["alpha", "beta"]),
        Value::InstanceIdentifier(sample_path(false)),
    ]
}

pub fn unsigned_values() -> Vec<Value> {
    vec![
        Value::Uint8(0),
        Value::Uint8(200),
        Value::Uint8(u8::MAX),
        Value::Uint16(1),
        Value::Uint16(40_000),
        Value::Uint32(7),
        Value::Uint32(3_000_000_000),
        Value::Uint32(u32::MAX),
        Value::Uint64(1),
        Value::Uint64(12_000_000_000),
        Value::Uint64(u64::MAX),
    ]
}

/// Instance path touching every argument kind the legacy formats support.
pub fn sample_path(mount_point: bool) -> InstancePath {
    let mut path = InstancePath::empty()
        .child(NodeIdentifier::new(q("root")))
        .child(NodeIdentifierWithPredicates::new(q("user")).with_key(q("id"), Value::Int32(7)))
        .child(NodeIdentifierWithPredicates::of(
            q("pair"),
            [(q("a"), Value::from("x")), (q("b"), Value::Int64(9))],
        ))
        .child(NodeWithValue {
            node_type: q("tag"),
            value: Value::from("red"),
        })
        .child(AugmentationIdentifier::new([q("extra"), q_rev("more")]));
    if mount_point {
        path = path.child(PathArgument::MountPoint(q("mnt")));
    }
    path
}

/// A tree exercising every node kind.
pub fn sample_tree(values: &[Value]) -> NormalizedNode {
    let leaves = values
        .iter()
        .enumerate()
        .map(|(i, v)| NormalizedNode::leaf(q(&format!("v{i}")), v.clone()))
        .collect();
    NormalizedNode::container(
        q("root"),
        vec![
            NormalizedNode::container(q("values"), leaves),
            NormalizedNode::map(
                q("user"),
                false,
                vec![
                    NormalizedNode::map_entry(
                        NodeIdentifierWithPredicates::new(q("user")).with_key(q("id"), Value::Int32(1)),
                        vec![
                            NormalizedNode::leaf(q("id"), Value::Int32(1)),
                            NormalizedNode::leaf(q("name"), "ada"),
                        ],
                    ),
                    NormalizedNode::map_entry(
                        NodeIdentifierWithPredicates::new(q("user")).with_key(q("id"), Value::Int32(2)),
                        vec![NormalizedNode::leaf(q("name"), "grace")],
                    ),
                ],
            ),
            NormalizedNode::map(
                q("pair"),
                true,
                vec![NormalizedNode::map_entry(
                    NodeIdentifierWithPredicates::of(
                        q("pair"),
                        [(q("a"), Value::from("x")), (q("b"), Value::Int64(9))],
                    ),
                    vec![
                        NormalizedNode::leaf(q("a"), "x"),
                        NormalizedNode::leaf(q("b"), Value::Int64(9)),
                    ],
                )],
            ),
            NormalizedNode::map(
                q("singleton"),
                false,
                vec![NormalizedNode::map_entry(
                    NodeIdentifierWithPredicates::new(q("singleton")),
                    vec![],
                )],
            ),
            NormalizedNode::leaf_set(
                q("tags"),
                false,
                vec![
                    NormalizedNode::leaf_set_entry(q("tags"), "a"),
                    NormalizedNode::leaf_set_entry(q("tags"), "b"),
                ],
            ),
            NormalizedNode::leaf_set(
                q("order"),
                true,
                vec![
                    NormalizedNode::leaf_set_entry(q("order"), 3),
                    NormalizedNode::leaf_set_entry(q("order"), 1),
                ],
            ),
            NormalizedNode::unkeyed_list(
                q("log"),
                vec![
                    NormalizedNode::unkeyed_list_entry(
                        q("log"),
                        vec![NormalizedNode::leaf(q("msg"), "boot")],
                    ),
                    NormalizedNode::unkeyed_list_entry(q("log"), vec![]),
                ],
            ),
            NormalizedNode::choice(
                q("transport"),
                vec![NormalizedNode::leaf(q_rev("tcp"), Value::Empty)],
            ),
            NormalizedNode::augmentation(
                AugmentationIdentifier::new([q_rev("aug-a"), q_rev("aug-b")]),
                vec![NormalizedNode::leaf(q_rev("aug-a"), true)],
            ),
            NormalizedNode::augmentation(
                AugmentationIdentifier::new([q_rev("aug-a"), q_rev("aug-b")]),
                vec![NormalizedNode::leaf(q_rev("aug-b"), false)],
            ),
            NormalizedNode::anyxml(q("blob"), "<data xmlns=\"urn:x\"><a/></data>"),
            NormalizedNode::container(q("empty"), vec![]),
        ],
    )
}

/// `depth` nested containers around a single leaf.
pub fn nested(depth: usize) -> NormalizedNode {
    let mut tree = NormalizedNode::leaf(q("x"), true);
    for _ in 0..depth {
        tree = NormalizedNode::container(q("c"), vec![tree]);
    }
    tree
}

pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}
