// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The Magnesium format.
//!
//! Every node record starts with a single header byte:
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! +-------+-------+---------------+
//! | preds | addr  |     kind      |
//! +-------+-------+---------------+
//! ```
//!
//! `addr` says how the node's name follows: as a fresh definition, as a one
//! or four byte dictionary code, or not at all because it repeats the
//! parent's name (list, map and leaf-set entries). `preds` carries the
//! predicate count of a map entry; on a leaf it marks a key leaf whose value
//! is taken from the enclosing entry and therefore not written.
//!
//! Values use single-byte opcodes with fast paths for 0, 1 and the extremes of
//! each integer width, and short forms for small lengths and counts.

mod decoder;
mod encoder;
mod tokens;

pub(crate) use decoder::MagnesiumDecoder;
pub(crate) use encoder::MagnesiumEncoder;
