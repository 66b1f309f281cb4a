// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{InstancePath, QName};

/// Scalar payload of a leaf, leaf-set entry or key predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// `boolean`.
    Bool(bool),
    /// `int8`.
    Int8(i8),
    /// `int16`.
    Int16(i16),
    /// `int32`.
    Int32(i32),
    /// `int64`.
    Int64(i64),
    /// `uint8`.
    Uint8(u8),
    /// `uint16`.
    Uint16(u16),
    /// `uint32`.
    Uint32(u32),
    /// `uint64`.
    Uint64(u64),
    /// Arbitrary-precision integer (bounded to 128 bits here).
    BigInteger(i128),
    /// `decimal64`, kept as its canonical decimal literal.
    Decimal(String),
    /// `string`.
    String(String),
    /// `binary`.
    Binary(Vec<u8>),
    /// `empty`.
    Empty,
    /// `identityref`.
    QName(QName),
    /// `bits`: the set bit names.
    Bits(BTreeSet<String>),
    /// `instance-identifier`.
    InstanceIdentifier(InstancePath),
}

impl Value {
    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint8(_) => "uint8",
            Self::Uint16(_) => "uint16",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::BigInteger(_) => "big-integer",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::Empty => "empty",
            Self::QName(_) => "qname",
            Self::Bits(_) => "bits",
            Self::InstanceIdentifier(_) => "instance-identifier",
        }
    }

    /// True for the unsigned integer variants.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint8(_) | Self::Uint16(_) | Self::Uint32(_) | Self::Uint64(_)
        )
    }

    /// Collect bit names into a [`Value::Bits`].
    pub fn bits<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Bits(names.into_iter().map(Into::into).collect())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<QName> for Value {
    fn from(v: QName) -> Self {
        Self::QName(v)
    }
}
