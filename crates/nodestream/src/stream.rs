// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event-level interface between tree traversal and stream encoding.
//!
//! Readers drive a [`NodeStreamWriter`] with one call per node; writers
//! implement it to turn the calls into bytes. Container-like starts are
//! closed by [`NodeStreamWriter::end_node`]; `leaf_node`,
//! `leaf_set_entry_node` and `anyxml_node` are self-contained.
//!
//! `child_size_hint` is the expected number of children when known. It is
//! advisory: receivers may pre-size storage, and formats that carry hints
//! record it, but nothing validates it against the real count.

use nodestream_model::{
    AugmentationIdentifier, NodeIdentifier, NodeIdentifierWithPredicates, QName, Value,
};

use crate::error::Result;

/// Receiver of tree traversal events.
pub trait NodeStreamWriter {
    /// Open a container.
    fn start_container_node(&mut self, name: &NodeIdentifier, child_size_hint: Option<usize>)
        -> Result<()>;
    /// Open a choice.
    fn start_choice_node(&mut self, name: &NodeIdentifier, child_size_hint: Option<usize>)
        -> Result<()>;
    /// Open an augmentation.
    fn start_augmentation_node(&mut self, id: &AugmentationIdentifier) -> Result<()>;
    /// Open an unkeyed list.
    fn start_unkeyed_list(&mut self, name: &NodeIdentifier, child_size_hint: Option<usize>)
        -> Result<()>;
    /// Open an unkeyed list entry.
    fn start_unkeyed_list_item(
        &mut self,
        name: &NodeIdentifier,
        child_size_hint: Option<usize>,
    ) -> Result<()>;
    /// Open an unordered keyed list.
    fn start_map_node(&mut self, name: &NodeIdentifier, child_size_hint: Option<usize>)
        -> Result<()>;
    /// Open an ordered keyed list.
    fn start_ordered_map_node(
        &mut self,
        name: &NodeIdentifier,
        child_size_hint: Option<usize>,
    ) -> Result<()>;
    /// Open a keyed list entry.
    fn start_map_entry_node(
        &mut self,
        id: &NodeIdentifierWithPredicates,
        child_size_hint: Option<usize>,
    ) -> Result<()>;
    /// Open an unordered leaf list.
    fn start_leaf_set(&mut self, name: &NodeIdentifier, child_size_hint: Option<usize>)
        -> Result<()>;
    /// Open an ordered leaf list.
    fn start_ordered_leaf_set(
        &mut self,
        name: &NodeIdentifier,
        child_size_hint: Option<usize>,
    ) -> Result<()>;
    /// Emit a leaf.
    fn leaf_node(&mut self, name: &NodeIdentifier, value: &Value) -> Result<()>;
    /// Emit a leaf-list entry.
    fn leaf_set_entry_node(&mut self, name: &QName, value: &Value) -> Result<()>;
    /// Emit an anyxml node.
    fn anyxml_node(&mut self, name: &NodeIdentifier, body: &str) -> Result<()>;
    /// Close the innermost open node.
    fn end_node(&mut self) -> Result<()>;
    /// Push buffered output downstream.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One recorded traversal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// `start_container_node`.
    StartContainer(NodeIdentifier, Option<usize>),
    /// `start_choice_node`.
    StartChoice(NodeIdentifier, Option<usize>),
    /// `start_augmentation_node`.
    StartAugmentation(AugmentationIdentifier),
    /// `start_unkeyed_list`.
    StartUnkeyedList(NodeIdentifier, Option<usize>),
    /// `start_unkeyed_list_item`.
    StartUnkeyedListItem(NodeIdentifier, Option<usize>),
    /// `start_map_node`.
    StartMap(NodeIdentifier, Option<usize>),
    /// `start_ordered_map_node`.
    StartOrderedMap(NodeIdentifier, Option<usize>),
    /// `start_map_entry_node`.
    StartMapEntry(NodeIdentifierWithPredicates, Option<usize>),
    /// `start_leaf_set`.
    StartLeafSet(NodeIdentifier, Option<usize>),
    /// `start_ordered_leaf_set`.
    StartOrderedLeafSet(NodeIdentifier, Option<usize>),
    /// `leaf_node`.
    Leaf(NodeIdentifier, Value),
    /// `leaf_set_entry_node`.
    LeafSetEntry(QName, Value),
    /// `anyxml_node`.
    AnyXml(NodeIdentifier, String),
    /// `end_node`.
    End,
}

/// [`NodeStreamWriter`] that records every call.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<StreamEvent>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events in call order.
    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    /// Take the recorded events.
    pub fn into_events(self) -> Vec<StreamEvent> {
        self.events
    }

    fn push(&mut self, event: StreamEvent) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}

impl NodeStreamWriter for EventLog {
    fn start_container_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartContainer(name.clone(), hint))
    }

    fn start_choice_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartChoice(name.clone(), hint))
    }

    fn start_augmentation_node(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        self.push(StreamEvent::StartAugmentation(id.clone()))
    }

    fn start_unkeyed_list(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartUnkeyedList(name.clone(), hint))
    }

    fn start_unkeyed_list_item(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartUnkeyedListItem(name.clone(), hint))
    }

    fn start_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartMap(name.clone(), hint))
    }

    fn start_ordered_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartOrderedMap(name.clone(), hint))
    }

    fn start_map_entry_node(
        &mut self,
        id: &NodeIdentifierWithPredicates,
        hint: Option<usize>,
    ) -> Result<()> {
        self.push(StreamEvent::StartMapEntry(id.clone(), hint))
    }

    fn start_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartLeafSet(name.clone(), hint))
    }

    fn start_ordered_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        self.push(StreamEvent::StartOrderedLeafSet(name.clone(), hint))
    }

    fn leaf_node(&mut self, name: &NodeIdentifier, value: &Value) -> Result<()> {
        self.push(StreamEvent::Leaf(name.clone(), value.clone()))
    }

    fn leaf_set_entry_node(&mut self, name: &QName, value: &Value) -> Result<()> {
        self.push(StreamEvent::LeafSetEntry(name.clone(), value.clone()))
    }

    fn anyxml_node(&mut self, name: &NodeIdentifier, body: &str) -> Result<()> {
        self.push(StreamEvent::AnyXml(name.clone(), body.to_owned()))
    }

    fn end_node(&mut self) -> Result<()> {
        self.push(StreamEvent::End)
    }
}
