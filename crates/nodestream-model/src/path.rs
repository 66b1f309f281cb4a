// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{QName, Value};

/// Plain node identifier: just the node's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeIdentifier(pub QName);

impl NodeIdentifier {
    /// Wrap a name.
    pub fn new(qname: QName) -> Self {
        Self(qname)
    }

    /// Node name.
    pub fn qname(&self) -> &QName {
        &self.0
    }
}

impl From<QName> for NodeIdentifier {
    fn from(qname: QName) -> Self {
        Self(qname)
    }
}

/// Identifier of a keyed list entry: name plus ordered key predicates.
///
/// Keys are unique; [`Self::with_key`] replaces an existing key in place so
/// insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeIdentifierWithPredicates {
    node_type: QName,
    keys: Vec<(QName, Value)>,
}

impl NodeIdentifierWithPredicates {
    /// Identifier without any predicates.
    pub fn new(node_type: QName) -> Self {
        Self {
            node_type,
            keys: Vec::new(),
        }
    }

    /// Build from an iterator of key/value pairs (later duplicates win).
    pub fn of(node_type: QName, keys: impl IntoIterator<Item = (QName, Value)>) -> Self {
        keys.into_iter()
            .fold(Self::new(node_type), |acc, (k, v)| acc.with_key(k, v))
    }

    /// Add or replace a key predicate.
    pub fn with_key(mut self, key: QName, value: Value) -> Self {
        match self.keys.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.keys.push((key, value)),
        }
        self
    }

    /// Entry name.
    pub fn node_type(&self) -> &QName {
        &self.node_type
    }

    /// Value bound to `key`, if present.
    pub fn get(&self, key: &QName) -> Option<&Value> {
        self.keys.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is one of the predicates.
    pub fn contains_key(&self, key: &QName) -> bool {
        self.keys.iter().any(|(k, _)| k == key)
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no predicates are present.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Predicates in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&QName, &Value)> + '_ {
        self.keys.iter().map(|(k, v)| (k, v))
    }
}

/// Identifier of a leaf-set entry: name plus the entry's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeWithValue {
    /// Entry name (matches the enclosing leaf set).
    pub node_type: QName,
    /// Entry value.
    pub value: Value,
}

/// Identifier of an augmentation: the set of child names it may contribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AugmentationIdentifier {
    possible_child_names: BTreeSet<QName>,
}

impl AugmentationIdentifier {
    /// Build from child names.
    pub fn new(names: impl IntoIterator<Item = QName>) -> Self {
        Self {
            possible_child_names: names.into_iter().collect(),
        }
    }

    /// Child names in canonical order.
    pub fn possible_child_names(&self) -> &BTreeSet<QName> {
        &self.possible_child_names
    }

    /// Number of child names.
    pub fn len(&self) -> usize {
        self.possible_child_names.len()
    }

    /// True when the identifier names no children.
    pub fn is_empty(&self) -> bool {
        self.possible_child_names.is_empty()
    }
}

/// One step of an [`InstancePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathArgument {
    /// Container, list, leaf set, choice or leaf.
    NodeIdentifier(NodeIdentifier),
    /// Keyed list entry.
    WithPredicates(NodeIdentifierWithPredicates),
    /// Leaf-set entry.
    WithValue(NodeWithValue),
    /// Augmentation.
    Augmentation(AugmentationIdentifier),
    /// Mount point boundary (only the newest stream format carries these).
    MountPoint(QName),
}

impl PathArgument {
    /// Node name, when the argument has one (augmentations do not).
    pub fn node_type(&self) -> Option<&QName> {
        match self {
            Self::NodeIdentifier(id) => Some(id.qname()),
            Self::WithPredicates(id) => Some(id.node_type()),
            Self::WithValue(id) => Some(&id.node_type),
            Self::MountPoint(qname) => Some(qname),
            Self::Augmentation(_) => None,
        }
    }
}

impl From<NodeIdentifier> for PathArgument {
    fn from(id: NodeIdentifier) -> Self {
        Self::NodeIdentifier(id)
    }
}

impl From<NodeIdentifierWithPredicates> for PathArgument {
    fn from(id: NodeIdentifierWithPredicates) -> Self {
        Self::WithPredicates(id)
    }
}

impl From<NodeWithValue> for PathArgument {
    fn from(id: NodeWithValue) -> Self {
        Self::WithValue(id)
    }
}

impl From<AugmentationIdentifier> for PathArgument {
    fn from(id: AugmentationIdentifier) -> Self {
        Self::Augmentation(id)
    }
}

impl fmt::Display for PathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeIdentifier(id) => write!(f, "{}", id.qname()),
            Self::WithPredicates(id) => {
                write!(f, "{}[", id.node_type())?;
                for (i, (k, v)) in id.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={v:?}", k.local_name())?;
                }
                f.write_str("]")
            }
            Self::WithValue(id) => write!(f, "{}[{:?}]", id.node_type, id.value),
            Self::Augmentation(id) => {
                f.write_str("AugmentationIdentifier{")?;
                for (i, q) in id.possible_child_names().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{q}")?;
                }
                f.write_str("}")
            }
            Self::MountPoint(qname) => write!(f, "mount:{qname}"),
        }
    }
}

/// Ordered sequence of path arguments addressing a node from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstancePath(pub Vec<PathArgument>);

impl InstancePath {
    /// The root path.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Append one step.
    pub fn child(mut self, arg: impl Into<PathArgument>) -> Self {
        self.0.push(arg.into());
        self
    }

    /// Steps in order.
    pub fn arguments(&self) -> &[PathArgument] {
        &self.0
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PathArgument> for InstancePath {
    fn from_iter<I: IntoIterator<Item = PathArgument>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
