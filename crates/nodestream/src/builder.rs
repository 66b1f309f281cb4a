// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Assembles [`NodeStreamWriter`] events back into a [`NormalizedNode`].

use nodestream_model::{
    AugmentationIdentifier, NodeIdentifier, NodeIdentifierWithPredicates, NodeWithValue,
    NormalizedNode, QName, Value,
};

use tracing::trace;

use crate::error::{EncodingError, InvalidStream, Result};
use crate::stream::NodeStreamWriter;

/// Hints above this are not trusted for pre-allocation.
const MAX_PREALLOC: usize = 1024;

#[derive(Debug)]
enum Open {
    Container(NodeIdentifier),
    Choice(NodeIdentifier),
    Augmentation(AugmentationIdentifier),
    UnkeyedList(NodeIdentifier),
    UnkeyedListEntry(NodeIdentifier),
    Map(NodeIdentifier, bool),
    MapEntry(NodeIdentifierWithPredicates),
    LeafSet(NodeIdentifier, bool),
}

#[derive(Debug)]
struct Frame {
    open: Open,
    // Advisory child count carried by SodiumSr1 streams.
    hint: Option<usize>,
    children: Vec<NormalizedNode>,
}

impl Frame {
    fn close(self) -> NormalizedNode {
        let children = self.children;
        match self.open {
            Open::Container(id) => NormalizedNode::Container { id, children },
            Open::Choice(id) => NormalizedNode::Choice { id, children },
            Open::Augmentation(id) => NormalizedNode::Augmentation { id, children },
            Open::UnkeyedList(id) => NormalizedNode::UnkeyedList { id, children },
            Open::UnkeyedListEntry(id) => NormalizedNode::UnkeyedListEntry { id, children },
            Open::Map(id, ordered) => NormalizedNode::Map {
                id,
                ordered,
                children,
            },
            Open::MapEntry(id) => NormalizedNode::MapEntry { id, children },
            Open::LeafSet(id, ordered) => NormalizedNode::LeafSet {
                id,
                ordered,
                children,
            },
        }
    }
}

/// Builds one tree from a balanced event sequence.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<Frame>,
    root: Option<NormalizedNode>,
}

impl TreeBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes still open.
    pub fn open_nodes(&self) -> usize {
        self.stack.len()
    }

    /// The completed tree. Fails if nodes are still open or nothing was built.
    pub fn finish(self) -> Result<NormalizedNode> {
        if !self.stack.is_empty() {
            return Err(InvalidStream::MalformedTree("unclosed nodes at end of stream").into());
        }
        self.root
            .ok_or_else(|| InvalidStream::MalformedTree("no node in stream").into())
    }

    fn open(&mut self, open: Open, hint: Option<usize>) -> Result<()> {
        self.stack.push(Frame {
            open,
            hint,
            children: Vec::with_capacity(hint.unwrap_or(0).min(MAX_PREALLOC)),
        });
        Ok(())
    }

    fn attach(&mut self, node: NormalizedNode) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None if self.root.is_none() => self.root = Some(node),
            None => return Err(InvalidStream::MalformedTree("more than one root node").into()),
        }
        Ok(())
    }
}

impl NodeStreamWriter for TreeBuilder {
    fn start_container_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::Container(name.clone()), hint)
    }

    fn start_choice_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::Choice(name.clone()), hint)
    }

    fn start_augmentation_node(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        self.open(Open::Augmentation(id.clone()), None)
    }

    fn start_unkeyed_list(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::UnkeyedList(name.clone()), hint)
    }

    fn start_unkeyed_list_item(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::UnkeyedListEntry(name.clone()), hint)
    }

    fn start_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::Map(name.clone(), false), hint)
    }

    fn start_ordered_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::Map(name.clone(), true), hint)
    }

    fn start_map_entry_node(
        &mut self,
        id: &NodeIdentifierWithPredicates,
        hint: Option<usize>,
    ) -> Result<()> {
        self.open(Open::MapEntry(id.clone()), hint)
    }

    fn start_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::LeafSet(name.clone(), false), hint)
    }

    fn start_ordered_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.open(Open::LeafSet(name.clone(), true), hint)
    }

    fn leaf_node(&mut self, name: &NodeIdentifier, value: &Value) -> Result<()> {
        self.attach(NormalizedNode::Leaf {
            id: name.clone(),
            value: value.clone(),
        })
    }

    fn leaf_set_entry_node(&mut self, name: &QName, value: &Value) -> Result<()> {
        self.attach(NormalizedNode::LeafSetEntry {
            id: NodeWithValue {
                node_type: name.clone(),
                value: value.clone(),
            },
        })
    }

    fn anyxml_node(&mut self, name: &NodeIdentifier, body: &str) -> Result<()> {
        self.attach(NormalizedNode::AnyXml {
            id: name.clone(),
            body: body.to_owned(),
        })
    }

    fn end_node(&mut self) -> Result<()> {
        let frame = self.stack.pop().ok_or(EncodingError::UnbalancedEnd)?;
        if let Some(hint) = frame.hint.filter(|&hint| hint != frame.children.len()) {
            trace!(hint, children = frame.children.len(), node = ?frame.open, "size hint mismatch");
        }
        self.attach(frame.close())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::walker::TreeWalker;
    use crate::StreamError;

    fn q(name: &str) -> QName {
        QName::create("urn:test", name).unwrap()
    }

    #[test]
    fn rebuilds_what_the_walker_emits() {
        let entry = NodeIdentifierWithPredicates::new(q("user")).with_key(q("id"), Value::Uint32(7));
        let tree = NormalizedNode::container(
            q("root"),
            vec![
                NormalizedNode::map(
                    q("user"),
                    false,
                    vec![NormalizedNode::map_entry(
                        entry,
                        vec![
                            NormalizedNode::leaf(q("id"), Value::Uint32(7)),
                            NormalizedNode::anyxml(q("blob"), "<a/>"),
                        ],
                    )],
                ),
                NormalizedNode::augmentation(
                    AugmentationIdentifier::new([q("extra")]),
                    vec![NormalizedNode::leaf(q("extra"), Value::Empty)],
                ),
            ],
        );
        let mut builder = TreeBuilder::new();
        TreeWalker::new(&mut builder, 64).write(&tree).unwrap();
        assert_eq!(builder.finish().unwrap(), tree);
    }

    #[test]
    fn unbalanced_sequences_are_rejected() {
        let mut builder = TreeBuilder::new();
        assert!(matches!(
            builder.end_node(),
            Err(StreamError::Encoding(EncodingError::UnbalancedEnd))
        ));

        let mut builder = TreeBuilder::new();
        builder
            .start_container_node(&NodeIdentifier::new(q("c")), None)
            .unwrap();
        assert_eq!(builder.open_nodes(), 1);
        assert!(matches!(
            builder.finish(),
            Err(StreamError::Invalid(InvalidStream::MalformedTree(_)))
        ));

        let mut builder = TreeBuilder::new();
        let x = NodeIdentifier::new(q("x"));
        builder.leaf_node(&x, &Value::Bool(true)).unwrap();
        assert!(builder.leaf_node(&x, &Value::Bool(false)).is_err());
    }

    #[test]
    fn size_hints_are_advisory() {
        let mut builder = TreeBuilder::new();
        let root = NodeIdentifier::new(q("root"));
        builder.start_container_node(&root, Some(3)).unwrap();
        builder.leaf_node(&NodeIdentifier::new(q("x")), &Value::Int32(1)).unwrap();
        builder.end_node().unwrap();
        assert_eq!(
            builder.finish().unwrap(),
            NormalizedNode::container(q("root"), vec![NormalizedNode::leaf(q("x"), 1)])
        );
    }

    #[test]
    fn empty_builder_has_no_tree() {
        assert!(TreeBuilder::new().finish().is_err());
    }
}
