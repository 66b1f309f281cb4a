// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream reader that binds to the version named in the stream header.

use std::io::Read;

use nodestream_model::{InstancePath, NormalizedNode, PathArgument, QName};
use tracing::{debug, warn};

use crate::builder::TreeBuilder;
use crate::codec::{DecodeContext, StreamDecoder};
use crate::config::CodecConfig;
use crate::dictionary::{DecodeDictionary, DictionaryStats};
use crate::error::{InvalidStream, Result, StreamError};
use crate::interner::Interner;
use crate::io::DataInput;
use crate::lithium::LithiumDecoder;
use crate::magnesium::MagnesiumDecoder;
use crate::stream::NodeStreamWriter;
use crate::StreamVersion;

enum Decoder<'a, R> {
    Lithium(LithiumDecoder<'a, R>),
    Magnesium(MagnesiumDecoder<'a, R>),
}

macro_rules! dispatch {
    ($decoder:expr, $d:ident => $body:expr) => {
        match $decoder {
            Decoder::Lithium(mut $d) => $body,
            Decoder::Magnesium(mut $d) => $body,
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Header not read yet.
    Unbound,
    Bound(StreamVersion),
    /// A call failed; the cause is replayed on every later call.
    Poisoned(InvalidStream),
}

/// Reads trees, paths and names from a stream of any known version.
///
/// The header is read on first use and fixes the format for the rest of the
/// stream. Any failure poisons the reader, since the source may have stopped
/// in the middle of a record. A structural error is replayed as the same
/// [`InvalidStream`] cause on every later call. I/O and unsupported-construct
/// errors are returned as they are once, and later calls fail with
/// [`InvalidStream::Aborted`].
///
/// ```
/// use nodestream::{NodeDataInput, InvalidStream, StreamError};
///
/// let mut input = NodeDataInput::new(&[0xAB, 0x00, 0x63][..]);
/// for _ in 0..2 {
///     assert!(matches!(
///         input.read_node(),
///         Err(StreamError::Invalid(InvalidStream::UnknownVersion(0x63)))
///     ));
/// }
/// ```
pub struct NodeDataInput<R: Read> {
    input: DataInput<R>,
    ctx: DecodeContext,
    state: State,
}

impl<R: Read> NodeDataInput<R> {
    /// Reader with default limits.
    pub fn new(source: R) -> Self {
        Self::with_config(source, CodecConfig::default())
    }

    /// Reader with the nesting limit from `config`. The version always comes from the stream.
    pub fn with_config(source: R, config: CodecConfig) -> Self {
        Self::with_interner(source, config, Interner::new())
    }

    /// Reader that interns names through a caller-supplied interner.
    pub fn with_interner(source: R, config: CodecConfig, interner: Interner) -> Self {
        Self::with_dictionary(source, config, DecodeDictionary::new(), interner)
    }

    /// Reader that continues a dictionary detached from an earlier reader.
    pub fn with_dictionary(
        source: R,
        config: CodecConfig,
        dictionary: DecodeDictionary,
        interner: Interner,
    ) -> Self {
        Self {
            input: DataInput::new(source),
            ctx: DecodeContext {
                dictionary,
                interner,
                max_depth: config.max_depth,
            },
            state: State::Unbound,
        }
    }

    /// Version named by the stream header, reading the header if needed.
    pub fn version(&mut self) -> Result<StreamVersion> {
        match &self.state {
            State::Unbound => self.bind(),
            State::Bound(version) => Ok(*version),
            State::Poisoned(cause) => Err(cause.clone().into()),
        }
    }

    /// True once any call has failed.
    pub fn is_poisoned(&self) -> bool {
        matches!(self.state, State::Poisoned(_))
    }

    /// Replay one node as events into `receiver`.
    pub fn stream_node(&mut self, receiver: &mut dyn NodeStreamWriter) -> Result<()> {
        let result = dispatch!(self.decoder()?, d => d.stream_node(receiver));
        self.check(result)
    }

    /// Read one whole tree.
    pub fn read_node(&mut self) -> Result<NormalizedNode> {
        let mut builder = TreeBuilder::new();
        self.stream_node(&mut builder)?;
        let result = builder.finish();
        self.check(result)
    }

    /// Read a presence flag, then the tree when there is one.
    pub fn read_optional_node(&mut self) -> Result<Option<NormalizedNode>> {
        let result = dispatch!(self.decoder()?, d => d.read_bool());
        if self.check(result)? {
            self.read_node().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read an instance path.
    pub fn read_path(&mut self) -> Result<InstancePath> {
        let result = dispatch!(self.decoder()?, d => d.read_instance_path());
        self.check(result)
    }

    /// Read a single path argument.
    pub fn read_path_argument(&mut self) -> Result<PathArgument> {
        let result = dispatch!(self.decoder()?, d => d.read_path_argument());
        self.check(result)
    }

    /// Read a single qualified name.
    pub fn read_qname(&mut self) -> Result<QName> {
        let result = dispatch!(self.decoder()?, d => d.read_qname());
        self.check(result)
    }

    /// Bytes consumed from the source so far, header included.
    pub fn bytes_read(&self) -> u64 {
        self.input.bytes_read()
    }

    /// The dictionary decoded so far.
    pub fn dictionary(&self) -> &DecodeDictionary {
        &self.ctx.dictionary
    }

    /// Entry counts of the dictionary decoded so far.
    pub fn dictionary_stats(&self) -> DictionaryStats {
        self.ctx.dictionary.stats()
    }

    /// Give back the source, the dictionary and the interner.
    pub fn into_parts(self) -> (R, DecodeDictionary, Interner) {
        debug!(entries = ?self.ctx.dictionary.stats(), "detached reader dictionary");
        (self.input.into_inner(), self.ctx.dictionary, self.ctx.interner)
    }

    fn decoder(&mut self) -> Result<Decoder<'_, R>> {
        let version = self.version()?;
        Ok(match version {
            StreamVersion::Lithium | StreamVersion::NeonSr2 | StreamVersion::SodiumSr1 => {
                Decoder::Lithium(LithiumDecoder::new(&mut self.input, version, &mut self.ctx))
            }
            StreamVersion::Magnesium => {
                Decoder::Magnesium(MagnesiumDecoder::new(&mut self.input, &mut self.ctx))
            }
        })
    }

    fn bind(&mut self) -> Result<StreamVersion> {
        let result = self.input.read_header();
        if let Ok(version) = result {
            debug!(%version, "bound stream reader");
            self.state = State::Bound(version);
        }
        self.check(result)
    }

    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if !self.is_poisoned() {
                warn!(error = %err, "stream reader poisoned");
                let cause = match err {
                    StreamError::Invalid(cause) => cause.clone(),
                    other => InvalidStream::Aborted(other.to_string()),
                };
                self.state = State::Poisoned(cause);
            }
        }
        result
    }
}
