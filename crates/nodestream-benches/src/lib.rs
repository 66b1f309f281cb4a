// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture trees shared by the nodestream benchmarks.
#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use nodestream_model::{NodeIdentifierWithPredicates, NormalizedNode, QName, Value};

const NAMESPACE: &str = "urn:bench:inventory";
const REVISION: &str = "2024-01-01";

fn q(name: &str) -> QName {
    QName::create_with_revision(NAMESPACE, REVISION, name).expect("fixture names are identifiers")
}

/// An inventory of `entries` keyed list entries with a handful of typed leaves each.
///
/// Names repeat across entries, so dictionary references dominate once the
/// first entry has been written.
pub fn inventory(entries: usize) -> NormalizedNode {
    let items = (0..entries)
        .map(|i| {
            let id = i64::try_from(i).expect("entry index fits i64");
            let count = u32::try_from(i % 1_000).expect("below 1000");
            let key =
                NodeIdentifierWithPredicates::new(q("item")).with_key(q("id"), Value::Int64(id));
            NormalizedNode::map_entry(
                key,
                vec![
                    NormalizedNode::leaf(q("id"), Value::Int64(id)),
                    NormalizedNode::leaf(q("label"), format!("item-{i}")),
                    NormalizedNode::leaf(q("count"), Value::Uint32(count)),
                    NormalizedNode::leaf(q("active"), i % 2 == 0),
                    NormalizedNode::leaf(q("digest"), Value::Binary(vec![0x5A; 32])),
                    NormalizedNode::leaf_set(
                        q("tag"),
                        false,
                        vec![
                            NormalizedNode::leaf_set_entry(q("tag"), "red"),
                            NormalizedNode::leaf_set_entry(q("tag"), "blue"),
                        ],
                    ),
                ],
            )
        })
        .collect();
    NormalizedNode::container(
        q("inventory"),
        vec![NormalizedNode::map(q("item"), false, items)],
    )
}
