// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capabilities shared by the per-format strategies.
//!
//! The set of strategies is closed: `NodeDataOutput` / `NodeDataInput` pick
//! one when the stream is opened and dispatch to it through an enum.

use nodestream_model::{InstancePath, PathArgument, QName};

use crate::dictionary::{DecodeDictionary, EncodeDictionary};
use crate::error::{EncodingError, InvalidStream, Result};
use crate::interner::Interner;
use crate::stream::NodeStreamWriter;

/// Writer side of a format.
pub(crate) trait StreamEncoder<W>: NodeStreamWriter {
    fn write_qname(&mut self, qname: &QName) -> Result<()>;
    fn write_path_argument(&mut self, arg: &PathArgument) -> Result<()>;
    fn write_instance_path(&mut self, path: &InstancePath) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn bytes_written(&self) -> u64;
    fn dictionary(&self) -> &EncodeDictionary;
    fn into_parts(self) -> (W, EncodeDictionary);
}

/// Writer-side bound on instance paths nested inside values.
pub(crate) fn check_value_depth(depth: usize, max_depth: usize) -> Result<()> {
    if depth >= max_depth {
        return Err(EncodingError::DepthExceeded(max_depth).into());
    }
    Ok(())
}

/// State a decoder owns and hands back when it is dismantled.
#[derive(Debug, Default)]
pub(crate) struct DecodeContext {
    pub(crate) dictionary: DecodeDictionary,
    pub(crate) interner: Interner,
    pub(crate) max_depth: usize,
}

impl DecodeContext {
    /// Nesting guard shared by node records and nested instance-identifier values.
    pub(crate) fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(InvalidStream::DepthExceeded(self.max_depth).into());
        }
        Ok(())
    }
}

/// Reader side of a format: a short-lived view over the reader's input and context.
pub(crate) trait StreamDecoder {
    fn stream_node(&mut self, receiver: &mut dyn NodeStreamWriter) -> Result<()>;
    fn read_qname(&mut self) -> Result<QName>;
    fn read_path_argument(&mut self) -> Result<PathArgument>;
    fn read_instance_path(&mut self) -> Result<InstancePath>;
    fn read_bool(&mut self) -> Result<bool>;
}
