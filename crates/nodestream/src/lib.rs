// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Versioned binary codec for schema-typed data trees.
//!
//! A stream is a three-byte header followed by a payload:
//!
//! ```text
//! [0xAB][version: u16 big-endian][payload ...]
//! ```
//!
//! Four payload formats exist, oldest first: Lithium (1), NeonSr2 (2),
//! SodiumSr1 (3) and Magnesium (4). Writers pick one explicitly; readers
//! take it from the header and stay bound to it.
//!
//! Payloads are sequences of node records. Names, modules, strings and
//! augmentation identifiers are written in full the first time they appear
//! and as short dictionary codes afterwards, so the decoder has to see the
//! records in order.
//!
//! Entry points:
//!
//! - [`write_tree`] / [`read_tree`] and [`write_path`] / [`read_path`] for
//!   one-shot use.
//! - [`NodeDataOutput`] / [`NodeDataInput`] for several items in one stream,
//!   event-level streaming through [`NodeStreamWriter`], and carrying
//!   dictionaries from one stream to the next.
//!
//! ```
//! use nodestream::StreamVersion;
//! use nodestream_model::{NormalizedNode, QName};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let q = |name| QName::create("urn:example", name);
//! let tree = NormalizedNode::container(q("root")?, vec![NormalizedNode::leaf(q("x")?, 42)]);
//!
//! let mut bytes = Vec::new();
//! nodestream::write_tree(&mut bytes, StreamVersion::Magnesium, &tree)?;
//! assert_eq!(nodestream::read_tree(bytes.as_slice())?, tree);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::use_self
)]

mod builder;
mod codec;
mod config;
mod dictionary;
mod error;
mod input;
mod interner;
mod io;
mod lithium;
mod magnesium;
mod output;
mod stream;
pub mod varint;
mod version;
mod walker;

use std::io::{Read, Write};

use nodestream_model::{InstancePath, NormalizedNode};

pub use builder::TreeBuilder;
pub use config::{CodecConfig, DEFAULT_MAX_DEPTH};
pub use dictionary::{
    DecodeDictionary, DecodeTable, DictionaryStats, EncodeDictionary, EncodeTable, Table,
};
pub use error::{EncodingError, InvalidStream, Result, StreamError};
pub use input::NodeDataInput;
pub use interner::Interner;
pub use output::NodeDataOutput;
pub use stream::{EventLog, NodeStreamWriter, StreamEvent};
pub use version::{
    header_bytes, read_header, write_header, ParseVersionError, StreamVersion, HEADER_LEN,
    SIGNATURE_MARKER,
};
pub use walker::TreeWalker;

/// Write `tree` as a complete `version` stream and flush `sink`.
pub fn write_tree<W: Write>(sink: W, version: StreamVersion, tree: &NormalizedNode) -> Result<()> {
    let mut out = NodeDataOutput::new(sink, version);
    out.write_node(tree)?;
    out.flush()
}

/// Read one tree from a stream of any version.
pub fn read_tree<R: Read>(source: R) -> Result<NormalizedNode> {
    NodeDataInput::new(source).read_node()
}

/// Write `path` as a complete `version` stream and flush `sink`.
pub fn write_path<W: Write>(sink: W, version: StreamVersion, path: &InstancePath) -> Result<()> {
    let mut out = NodeDataOutput::new(sink, version);
    out.write_path(path)?;
    out.flush()
}

/// Read one instance path from a stream of any version.
pub fn read_path<R: Read>(source: R) -> Result<InstancePath> {
    NodeDataInput::new(source).read_path()
}
