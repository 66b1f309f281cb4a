// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema-typed data tree model shared by the `nodestream` codec and its tools.
//!
//! Everything here is an immutable value type. Names are reference counted
//! (`Arc<str>`) so a decoder can hand out many clones of one interned name
//! without copying the underlying text.
//!
//! The layers, leaf-first:
//!
//! - [`QNameModule`] / [`QName`]: the identity of a schema node.
//! - [`PathArgument`] / [`InstancePath`]: addressing within a tree.
//! - [`Value`]: scalar leaf payloads.
//! - [`NormalizedNode`]: the tree itself.
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
    clippy::use_self
)]

mod error;
mod node;
mod path;
mod qname;
mod value;

pub use error::ModelError;
pub use node::NormalizedNode;
pub use path::{
    AugmentationIdentifier, InstancePath, NodeIdentifier, NodeIdentifierWithPredicates,
    NodeWithValue, PathArgument,
};
pub use qname::{QName, QNameModule};
pub use value::Value;
