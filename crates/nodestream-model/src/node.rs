// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AugmentationIdentifier, NodeIdentifier, NodeIdentifierWithPredicates, NodeWithValue,
    PathArgument, QName, Value,
};

/// A node of a normalized data tree.
///
/// Container-like variants own their children; leaf-like variants (`Leaf`,
/// `LeafSetEntry`, `AnyXml`) carry a payload instead. Map children are
/// expected to be `MapEntry` nodes, leaf-set children `LeafSetEntry` nodes and
/// unkeyed-list children `UnkeyedListEntry` nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NormalizedNode {
    /// Container.
    Container {
        /// Node name.
        id: NodeIdentifier,
        /// Child nodes.
        children: Vec<NormalizedNode>,
    },
    /// Choice.
    Choice {
        /// Node name.
        id: NodeIdentifier,
        /// Child nodes of the selected case.
        children: Vec<NormalizedNode>,
    },
    /// Augmentation.
    Augmentation {
        /// Possible child names.
        id: AugmentationIdentifier,
        /// Augmenting child nodes.
        children: Vec<NormalizedNode>,
    },
    /// List without keys.
    UnkeyedList {
        /// List name.
        id: NodeIdentifier,
        /// `UnkeyedListEntry` nodes.
        children: Vec<NormalizedNode>,
    },
    /// Entry of an unkeyed list.
    UnkeyedListEntry {
        /// Entry name (normally the list name).
        id: NodeIdentifier,
        /// Child nodes.
        children: Vec<NormalizedNode>,
    },
    /// Keyed list.
    Map {
        /// List name.
        id: NodeIdentifier,
        /// Whether entry order is user-significant.
        ordered: bool,
        /// `MapEntry` nodes.
        children: Vec<NormalizedNode>,
    },
    /// Keyed list entry.
    MapEntry {
        /// Entry name and key predicates.
        id: NodeIdentifierWithPredicates,
        /// Child nodes (key leaves included).
        children: Vec<NormalizedNode>,
    },
    /// Leaf list.
    LeafSet {
        /// Leaf-list name.
        id: NodeIdentifier,
        /// Whether entry order is user-significant.
        ordered: bool,
        /// `LeafSetEntry` nodes.
        children: Vec<NormalizedNode>,
    },
    /// Leaf-list entry.
    LeafSetEntry {
        /// Entry name and value.
        id: NodeWithValue,
    },
    /// Leaf.
    Leaf {
        /// Leaf name.
        id: NodeIdentifier,
        /// Leaf value.
        value: Value,
    },
    /// Opaque XML body.
    AnyXml {
        /// Node name.
        id: NodeIdentifier,
        /// Serialized XML.
        body: String,
    },
}

impl NormalizedNode {
    /// Container named `qname`.
    pub fn container(qname: QName, children: Vec<Self>) -> Self {
        Self::Container {
            id: NodeIdentifier(qname),
            children,
        }
    }

    /// Choice named `qname`.
    pub fn choice(qname: QName, children: Vec<Self>) -> Self {
        Self::Choice {
            id: NodeIdentifier(qname),
            children,
        }
    }

    /// Augmentation contributing `children`.
    pub fn augmentation(id: AugmentationIdentifier, children: Vec<Self>) -> Self {
        Self::Augmentation { id, children }
    }

    /// Unkeyed list named `qname`.
    pub fn unkeyed_list(qname: QName, children: Vec<Self>) -> Self {
        Self::UnkeyedList {
            id: NodeIdentifier(qname),
            children,
        }
    }

    /// Unkeyed list entry named `qname`.
    pub fn unkeyed_list_entry(qname: QName, children: Vec<Self>) -> Self {
        Self::UnkeyedListEntry {
            id: NodeIdentifier(qname),
            children,
        }
    }

    /// Keyed list named `qname`.
    pub fn map(qname: QName, ordered: bool, children: Vec<Self>) -> Self {
        Self::Map {
            id: NodeIdentifier(qname),
            ordered,
            children,
        }
    }

    /// Keyed list entry.
    pub fn map_entry(id: NodeIdentifierWithPredicates, children: Vec<Self>) -> Self {
        Self::MapEntry { id, children }
    }

    /// Leaf list named `qname`.
    pub fn leaf_set(qname: QName, ordered: bool, children: Vec<Self>) -> Self {
        Self::LeafSet {
            id: NodeIdentifier(qname),
            ordered,
            children,
        }
    }

    /// Leaf-list entry.
    pub fn leaf_set_entry(qname: QName, value: impl Into<Value>) -> Self {
        Self::LeafSetEntry {
            id: NodeWithValue {
                node_type: qname,
                value: value.into(),
            },
        }
    }

    /// Leaf.
    pub fn leaf(qname: QName, value: impl Into<Value>) -> Self {
        Self::Leaf {
            id: NodeIdentifier(qname),
            value: value.into(),
        }
    }

    /// Anyxml node.
    pub fn anyxml(qname: QName, body: impl Into<String>) -> Self {
        Self::AnyXml {
            id: NodeIdentifier(qname),
            body: body.into(),
        }
    }

    /// Identifier of this node as a path argument.
    pub fn identifier(&self) -> PathArgument {
        match self {
            Self::Container { id, .. }
            | Self::Choice { id, .. }
            | Self::UnkeyedList { id, .. }
            | Self::UnkeyedListEntry { id, .. }
            | Self::Map { id, .. }
            | Self::LeafSet { id, .. }
            | Self::Leaf { id, .. }
            | Self::AnyXml { id, .. } => PathArgument::NodeIdentifier(id.clone()),
            Self::Augmentation { id, .. } => PathArgument::Augmentation(id.clone()),
            Self::MapEntry { id, .. } => PathArgument::WithPredicates(id.clone()),
            Self::LeafSetEntry { id } => PathArgument::WithValue(id.clone()),
        }
    }

    /// Child nodes; empty for leaf-like nodes.
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Container { children, .. }
            | Self::Choice { children, .. }
            | Self::Augmentation { children, .. }
            | Self::UnkeyedList { children, .. }
            | Self::UnkeyedListEntry { children, .. }
            | Self::Map { children, .. }
            | Self::MapEntry { children, .. }
            | Self::LeafSet { children, .. } => children,
            Self::LeafSetEntry { .. } | Self::Leaf { .. } | Self::AnyXml { .. } => &[],
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Container { .. } => "container",
            Self::Choice { .. } => "choice",
            Self::Augmentation { .. } => "augmentation",
            Self::UnkeyedList { .. } => "unkeyed-list",
            Self::UnkeyedListEntry { .. } => "unkeyed-list-entry",
            Self::Map { ordered: false, .. } => "map",
            Self::Map { ordered: true, .. } => "ordered-map",
            Self::MapEntry { .. } => "map-entry",
            Self::LeafSet { ordered: false, .. } => "leaf-set",
            Self::LeafSet { ordered: true, .. } => "ordered-leaf-set",
            Self::LeafSetEntry { .. } => "leaf-set-entry",
            Self::Leaf { .. } => "leaf",
            Self::AnyXml { .. } => "anyxml",
        }
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Self::node_count).sum::<usize>()
    }

    /// Depth of this subtree; a leaf-like node has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Self::depth).max().unwrap_or(0)
    }
}
