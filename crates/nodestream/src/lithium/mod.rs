// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The legacy format family: Lithium, NeonSr2 and SodiumSr1.
//!
//! One codec serves all three; the bound [`StreamVersion`](crate::StreamVersion)
//! switches on the features each revision added:
//!
//! | version   | name dictionaries | native unsigned | size hints |
//! |-----------|-------------------|-----------------|------------|
//! | Lithium   | strings only      | no (widened)    | no         |
//! | NeonSr2   | yes               | no (widened)    | no         |
//! | SodiumSr1 | yes               | yes             | yes        |

mod decoder;
mod encoder;
mod tokens;

pub(crate) use decoder::LithiumDecoder;
pub(crate) use encoder::LithiumEncoder;
