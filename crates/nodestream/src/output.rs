// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream writer bound to one format version.

use std::io::Write;

use nodestream_model::{
    AugmentationIdentifier, InstancePath, NodeIdentifier, NodeIdentifierWithPredicates,
    NormalizedNode, PathArgument, QName, Value,
};
use tracing::debug;

use crate::codec::StreamEncoder;
use crate::config::CodecConfig;
use crate::dictionary::{DictionaryStats, EncodeDictionary};
use crate::error::Result;
use crate::io::DataOutput;
use crate::lithium::LithiumEncoder;
use crate::magnesium::MagnesiumEncoder;
use crate::stream::NodeStreamWriter;
use crate::walker::TreeWalker;
use crate::StreamVersion;

enum Encoder<W> {
    Lithium(LithiumEncoder<W>),
    Magnesium(MagnesiumEncoder<W>),
}

macro_rules! dispatch {
    ($encoder:expr, $e:ident => $body:expr) => {
        match $encoder {
            Encoder::Lithium($e) => $body,
            Encoder::Magnesium($e) => $body,
        }
    };
}

/// Writes trees, paths and names in the format chosen at construction.
///
/// The three-byte stream header is emitted lazily, right before the first
/// payload byte. Name dictionaries grow as the stream is written; use
/// [`NodeDataOutput::into_parts`] and [`NodeDataOutput::with_dictionary`] to
/// continue a dictionary in another writer.
///
/// ```
/// use nodestream::{NodeDataOutput, StreamVersion};
/// use nodestream_model::{NormalizedNode, QName};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let x = QName::create("urn:example", "x")?;
/// let mut out = NodeDataOutput::new(Vec::new(), StreamVersion::Magnesium);
/// out.write_node(&NormalizedNode::leaf(x, 42))?;
/// let bytes = out.into_inner();
/// assert_eq!(&bytes[..3], &[0xAB, 0x00, 0x04]);
/// # Ok(())
/// # }
/// ```
pub struct NodeDataOutput<W: Write> {
    encoder: Encoder<W>,
    version: StreamVersion,
    max_depth: usize,
}

impl<W: Write> NodeDataOutput<W> {
    /// Writer for `version` with default limits and an empty dictionary.
    pub fn new(sink: W, version: StreamVersion) -> Self {
        Self::with_config(sink, CodecConfig::default().with_version(version))
    }

    /// Writer configured by `config`.
    pub fn with_config(sink: W, config: CodecConfig) -> Self {
        Self::with_dictionary(sink, config, EncodeDictionary::new())
    }

    /// Writer that continues numbering from an existing dictionary.
    pub fn with_dictionary(sink: W, config: CodecConfig, dictionary: EncodeDictionary) -> Self {
        let version = config.version;
        debug!(%version, entries = ?dictionary.stats(), "opening stream writer");
        let out = DataOutput::new(sink, version);
        let encoder = match version {
            StreamVersion::Lithium | StreamVersion::NeonSr2 | StreamVersion::SodiumSr1 => {
                Encoder::Lithium(LithiumEncoder::new(out, version, dictionary, config.max_depth))
            }
            StreamVersion::Magnesium => {
                Encoder::Magnesium(MagnesiumEncoder::new(out, dictionary, config.max_depth))
            }
        };
        Self {
            encoder,
            version,
            max_depth: config.max_depth,
        }
    }

    /// Format being written.
    pub fn version(&self) -> StreamVersion {
        self.version
    }

    /// Write a whole tree.
    pub fn write_node(&mut self, node: &NormalizedNode) -> Result<()> {
        let max_depth = self.max_depth;
        TreeWalker::new(self, max_depth).write(node)
    }

    /// Write a presence flag, then the tree when there is one.
    pub fn write_optional_node(&mut self, node: Option<&NormalizedNode>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.write_bool(node.is_some()))?;
        match node {
            Some(node) => self.write_node(node),
            None => Ok(()),
        }
    }

    /// Write an instance path.
    pub fn write_path(&mut self, path: &InstancePath) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.write_instance_path(path))
    }

    /// Write a single path argument.
    pub fn write_path_argument(&mut self, arg: &PathArgument) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.write_path_argument(arg))
    }

    /// Write a single qualified name.
    pub fn write_qname(&mut self, qname: &QName) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.write_qname(qname))
    }

    /// Bytes handed to the sink so far, header included.
    pub fn bytes_written(&self) -> u64 {
        dispatch!(&self.encoder, e => e.bytes_written())
    }

    /// The dictionary as it stands.
    pub fn dictionary(&self) -> &EncodeDictionary {
        dispatch!(&self.encoder, e => e.dictionary())
    }

    /// Entry counts of the dictionary.
    pub fn dictionary_stats(&self) -> DictionaryStats {
        self.dictionary().stats()
    }

    /// Give back the sink, discarding the dictionary.
    pub fn into_inner(self) -> W {
        self.into_parts().0
    }

    /// Give back the sink and the dictionary.
    pub fn into_parts(self) -> (W, EncodeDictionary) {
        let (sink, dictionary) = dispatch!(self.encoder, e => e.into_parts());
        debug!(entries = ?dictionary.stats(), "detached writer dictionary");
        (sink, dictionary)
    }
}

impl<W: Write> NodeStreamWriter for NodeDataOutput<W> {
    fn start_container_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_container_node(name, hint))
    }

    fn start_choice_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_choice_node(name, hint))
    }

    fn start_augmentation_node(&mut self, id: &AugmentationIdentifier) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_augmentation_node(id))
    }

    fn start_unkeyed_list(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_unkeyed_list(name, hint))
    }

    fn start_unkeyed_list_item(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_unkeyed_list_item(name, hint))
    }

    fn start_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_map_node(name, hint))
    }

    fn start_ordered_map_node(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_ordered_map_node(name, hint))
    }

    fn start_map_entry_node(
        &mut self,
        id: &NodeIdentifierWithPredicates,
        hint: Option<usize>,
    ) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_map_entry_node(id, hint))
    }

    fn start_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_leaf_set(name, hint))
    }

    fn start_ordered_leaf_set(&mut self, name: &NodeIdentifier, hint: Option<usize>) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.start_ordered_leaf_set(name, hint))
    }

    fn leaf_node(&mut self, name: &NodeIdentifier, value: &Value) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.leaf_node(name, value))
    }

    fn leaf_set_entry_node(&mut self, name: &QName, value: &Value) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.leaf_set_entry_node(name, value))
    }

    fn anyxml_node(&mut self, name: &NodeIdentifier, body: &str) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.anyxml_node(name, body))
    }

    fn end_node(&mut self) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.end_node())
    }

    fn flush(&mut self) -> Result<()> {
        dispatch!(&mut self.encoder, e => e.flush())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{EncodingError, StreamError};

    fn q(name: &str) -> QName {
        QName::create("urn:test", name).unwrap()
    }

    #[test]
    fn header_is_written_once_before_payload() {
        for version in StreamVersion::ALL {
            let mut out = NodeDataOutput::new(Vec::new(), version);
            assert_eq!(out.bytes_written(), 0);
            out.write_qname(&q("a")).unwrap();
            out.write_qname(&q("a")).unwrap();
            let written = out.bytes_written();
            let bytes = out.into_inner();
            assert_eq!(written, bytes.len() as u64);
            assert_eq!(&bytes[..3], &crate::version::header_bytes(version));
            assert_eq!(
                bytes.iter().filter(|b| **b == crate::version::SIGNATURE_MARKER).count(),
                1,
                "{version}"
            );
        }
    }

    #[test]
    fn nothing_written_means_no_header() {
        let out = NodeDataOutput::new(Vec::new(), StreamVersion::NeonSr2);
        assert!(out.into_inner().is_empty());
    }

    #[test]
    fn unbalanced_end_is_an_encoding_error() {
        for version in StreamVersion::ALL {
            let mut out = NodeDataOutput::new(Vec::new(), version);
            assert!(matches!(
                out.end_node(),
                Err(StreamError::Encoding(EncodingError::UnbalancedEnd))
            ));
        }
    }

    #[test]
    fn writer_depth_limit_comes_from_config() {
        let mut tree = NormalizedNode::leaf(q("x"), true);
        for _ in 0..3 {
            tree = NormalizedNode::container(q("c"), vec![tree]);
        }
        let config = CodecConfig::default().with_max_depth(3);
        let mut out = NodeDataOutput::with_config(Vec::new(), config);
        assert!(matches!(
            out.write_node(&tree),
            Err(StreamError::Encoding(EncodingError::DepthExceeded(3)))
        ));
    }

    #[test]
    fn mount_points_are_unsupported_before_magnesium() {
        let arg = PathArgument::MountPoint(q("mnt"));
        for version in [StreamVersion::Lithium, StreamVersion::NeonSr2, StreamVersion::SodiumSr1] {
            let mut out = NodeDataOutput::new(Vec::new(), version);
            assert!(matches!(
                out.write_path_argument(&arg),
                Err(StreamError::Unsupported { .. })
            ));
        }
        let mut out = NodeDataOutput::new(Vec::new(), StreamVersion::Magnesium);
        out.write_path_argument(&arg).unwrap();
    }

    #[test]
    fn dictionary_survives_detach() {
        let mut out = NodeDataOutput::new(Vec::new(), StreamVersion::Magnesium);
        out.write_qname(&q("a")).unwrap();
        let stats = out.dictionary_stats();
        assert_eq!(stats.qnames, 1);
        assert_eq!(stats.modules, 1);
        let (_, dictionary) = out.into_parts();

        let mut again =
            NodeDataOutput::with_dictionary(Vec::new(), CodecConfig::default(), dictionary);
        again.write_qname(&q("a")).unwrap();
        assert_eq!(again.dictionary_stats().qnames, 1);
        // header + one-byte reference token + one-byte code
        assert_eq!(again.into_inner().len(), 5);
    }
}
