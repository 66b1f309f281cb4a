// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Depth-first traversal of a [`NormalizedNode`] into [`NodeStreamWriter`] events.

use nodestream_model::NormalizedNode;

use crate::error::{EncodingError, Result};
use crate::stream::NodeStreamWriter;

/// Emits the events describing a tree, children in stored order.
pub struct TreeWalker<'a, S: ?Sized> {
    sink: &'a mut S,
    max_depth: usize,
}

impl<'a, S: NodeStreamWriter + ?Sized> TreeWalker<'a, S> {
    /// Walk into `sink`, refusing trees deeper than `max_depth` levels.
    pub fn new(sink: &'a mut S, max_depth: usize) -> Self {
        Self { sink, max_depth }
    }

    /// Emit `node` and its whole subtree.
    pub fn write(&mut self, node: &NormalizedNode) -> Result<()> {
        self.write_at(node, 0)
    }

    fn write_at(&mut self, node: &NormalizedNode, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(EncodingError::DepthExceeded(self.max_depth).into());
        }
        let hint = Some(node.children().len());
        match node {
            NormalizedNode::Leaf { id, value } => return self.sink.leaf_node(id, value),
            NormalizedNode::LeafSetEntry { id } => {
                return self.sink.leaf_set_entry_node(&id.node_type, &id.value);
            }
            NormalizedNode::AnyXml { id, body } => return self.sink.anyxml_node(id, body),
            NormalizedNode::Container { id, .. } => self.sink.start_container_node(id, hint)?,
            NormalizedNode::Choice { id, .. } => self.sink.start_choice_node(id, hint)?,
            NormalizedNode::Augmentation { id, .. } => self.sink.start_augmentation_node(id)?,
            NormalizedNode::UnkeyedList { id, .. } => self.sink.start_unkeyed_list(id, hint)?,
            NormalizedNode::UnkeyedListEntry { id, .. } => {
                self.sink.start_unkeyed_list_item(id, hint)?;
            }
            NormalizedNode::Map { id, ordered, .. } => {
                if *ordered {
                    self.sink.start_ordered_map_node(id, hint)?;
                } else {
                    self.sink.start_map_node(id, hint)?;
                }
            }
            NormalizedNode::MapEntry { id, .. } => self.sink.start_map_entry_node(id, hint)?,
            NormalizedNode::LeafSet { id, ordered, .. } => {
                if *ordered {
                    self.sink.start_ordered_leaf_set(id, hint)?;
                } else {
                    self.sink.start_leaf_set(id, hint)?;
                }
            }
        }
        for child in node.children() {
            self.write_at(child, depth + 1)?;
        }
        self.sink.end_node()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stream::{EventLog, StreamEvent};
    use crate::StreamError;
    use nodestream_model::{NodeIdentifier, QName, Value};

    fn q(name: &str) -> QName {
        QName::create("urn:test", name).unwrap()
    }

    #[test]
    fn emits_start_children_end_with_size_hints() {
        let tree = NormalizedNode::container(
            q("root"),
            vec![
                NormalizedNode::leaf(q("x"), 42),
                NormalizedNode::leaf_set(
                    q("tags"),
                    true,
                    vec![NormalizedNode::leaf_set_entry(q("tags"), "a")],
                ),
            ],
        );
        let mut log = EventLog::new();
        TreeWalker::new(&mut log, 8).write(&tree).unwrap();
        assert_eq!(
            log.into_events(),
            vec![
                StreamEvent::StartContainer(NodeIdentifier::new(q("root")), Some(2)),
                StreamEvent::Leaf(NodeIdentifier::new(q("x")), Value::Int32(42)),
                StreamEvent::StartOrderedLeafSet(NodeIdentifier::new(q("tags")), Some(1)),
                StreamEvent::LeafSetEntry(q("tags"), Value::String("a".into())),
                StreamEvent::End,
                StreamEvent::End,
            ]
        );
    }

    #[test]
    fn refuses_trees_deeper_than_the_limit() {
        let mut tree = NormalizedNode::leaf(q("x"), true);
        for _ in 0..4 {
            tree = NormalizedNode::container(q("c"), vec![tree]);
        }
        let mut log = EventLog::new();
        TreeWalker::new(&mut log, 5).write(&tree).unwrap();
        let err = TreeWalker::new(&mut EventLog::new(), 4).write(&tree).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Encoding(EncodingError::DepthExceeded(4))
        ));
    }
}
