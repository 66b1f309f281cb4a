// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for stream encoding and decoding.

use std::io;

use thiserror::Error;

use crate::dictionary::Table;
use crate::StreamVersion;

/// Crate-wide result alias.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Any failure surfaced by a stream reader or writer.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The byte channel failed; propagated verbatim.
    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
    /// The bytes do not form a valid stream.
    #[error("invalid stream: {0}")]
    Invalid(#[from] InvalidStream),
    /// The format recognises the construct but this codec does not implement it.
    #[error("{operation} is not supported by the {version} stream format")]
    Unsupported {
        /// Bound stream version.
        version: StreamVersion,
        /// What was attempted.
        operation: &'static str,
    },
    /// The writer was driven incorrectly or asked for something unrepresentable.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        // EOF mid-record is a truncated stream, not a channel failure.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Invalid(InvalidStream::Truncated)
        } else {
            Self::Io(err)
        }
    }
}

impl StreamError {
    /// The structural cause, when this is a decode failure.
    pub fn as_invalid(&self) -> Option<&InvalidStream> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

/// Structural decode failures. Fatal; they poison the reader that saw them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidStream {
    /// Input ended in the middle of a record.
    #[error("stream truncated")]
    Truncated,
    /// First byte was not the stream signature.
    #[error("invalid signature marker {0:#04x}")]
    BadSignature(u8),
    /// Version tag names no known format.
    #[error("unknown stream version {0}")]
    UnknownVersion(u16),
    /// Node header with an unknown or misplaced kind.
    #[error("unexpected node header {0:#04x}")]
    UnexpectedNode(u8),
    /// Value opcode not valid here.
    #[error("unexpected value type {0:#04x}")]
    UnexpectedValue(u8),
    /// String opcode not valid here.
    #[error("unexpected string type {0:#04x}")]
    UnexpectedString(u8),
    /// Name opcode not valid here.
    #[error("unexpected name type {0:#04x}")]
    UnexpectedName(u8),
    /// Path-argument header not valid here.
    #[error("unexpected path argument header {0:#04x}")]
    UnexpectedPathArgument(u8),
    /// Node header asked to inherit an identifier the parent cannot provide.
    #[error("invalid parent reference in node header {0:#04x}")]
    InvalidParentReference(u8),
    /// Reference to a dictionary entry that was never defined.
    #[error("invalid {table} reference {code}")]
    DanglingReference {
        /// Dictionary table consulted.
        table: Table,
        /// Offending code.
        code: i64,
    },
    /// Negative or otherwise impossible count/length.
    #[error("invalid {what} length {len}")]
    InvalidLength {
        /// What the length describes.
        what: &'static str,
        /// Decoded value.
        len: i64,
    },
    /// Elided key leaf not present in the enclosing entry's predicates.
    #[error("key leaf {leaf} not present in {entry}")]
    MissingKeyLeaf {
        /// Leaf name.
        leaf: String,
        /// Enclosing parent identifier.
        entry: String,
    },
    /// String payload was not UTF-8.
    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,
    /// Name components failed validation.
    #[error("invalid name: {0}")]
    InvalidName(String),
    /// Numeric literal payload did not parse.
    #[error("invalid numeric literal {0:?}")]
    InvalidNumber(String),
    /// Variable-length integer longer than five bytes or above `u32::MAX`.
    #[error("varint exceeds 32 bits")]
    VarintOverflow,
    /// Nesting exceeded the configured limit.
    #[error("nesting depth exceeds limit {0}")]
    DepthExceeded(usize),
    /// Event sequence could not be assembled into a tree.
    #[error("malformed node sequence: {0}")]
    MalformedTree(&'static str),
    /// An earlier call failed part-way through a record; the stream position is lost.
    #[error("stream aborted after an earlier failure: {0}")]
    Aborted(String),
}

/// Writer-side failures: misuse or unrepresentable input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// `end_node` without an open node.
    #[error("end_node() without a matching start")]
    UnbalancedEnd,
    /// A dictionary value was defined twice in one stream.
    #[error("{table} entry already defined with code {code}")]
    AlreadyDefined {
        /// Dictionary table.
        table: Table,
        /// Existing code.
        code: u32,
    },
    /// More dictionary entries than codes the format can address.
    #[error("{table} dictionary is full")]
    DictionaryFull {
        /// Dictionary table.
        table: Table,
    },
    /// String longer than a two-byte length prefix allows.
    #[error("string of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),
    /// Collection longer than the format's count field allows.
    #[error("{what} count {count} exceeds the format limit")]
    TooLarge {
        /// What was counted.
        what: &'static str,
        /// Offending count.
        count: usize,
    },
    /// Leaf-set entry inside a leaf set of a different name.
    #[error("leaf-set entry {entry} inside leaf set {leaf_set}")]
    LeafSetEntryMismatch {
        /// Entry name.
        entry: String,
        /// Enclosing leaf-set name.
        leaf_set: String,
    },
    /// Nesting exceeded the configured limit.
    #[error("nesting depth exceeds limit {0}")]
    DepthExceeded(usize),
}
