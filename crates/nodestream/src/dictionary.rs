// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-stream interning tables.
//!
//! The first occurrence of a value is written in full and assigned the next
//! code; later occurrences are written as that code. Encoder and decoder
//! tables must grow in lockstep, so a decode table only ever appends in
//! stream order.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use nodestream_model::{AugmentationIdentifier, QName, QNameModule};
use serde::Serialize;

use crate::error::{EncodingError, InvalidStream};

/// Largest code any format can carry (legacy codes are signed 32-bit).
const MAX_CODE: u32 = 0x7FFF_FFFF;

/// Which interning table a code refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Free-standing strings (local names, namespaces, revisions, bits).
    String,
    /// Namespace/revision pairs.
    Module,
    /// Qualified names and node identifiers.
    QName,
    /// Augmentation identifiers.
    Augmentation,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Module => "module",
            Self::QName => "qname",
            Self::Augmentation => "augmentation",
        })
    }
}

/// Value → code map on the writing side.
#[derive(Debug, Clone)]
pub struct EncodeTable<T> {
    table: Table,
    codes: HashMap<T, u32>,
}

impl<T: Hash + Eq> EncodeTable<T> {
    fn new(table: Table) -> Self {
        Self {
            table,
            codes: HashMap::new(),
        }
    }

    /// Code previously assigned to `value`.
    pub fn lookup<Q>(&self, value: &Q) -> Option<u32>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.codes.get(value).copied()
    }

    /// Assign the next code to `value`. Defining a value twice is an error.
    pub fn define(&mut self, value: T) -> Result<u32, EncodingError> {
        if let Some(&code) = self.codes.get(&value) {
            return Err(EncodingError::AlreadyDefined {
                table: self.table,
                code,
            });
        }
        let code = u32::try_from(self.codes.len())
            .ok()
            .filter(|c| *c <= MAX_CODE)
            .ok_or(EncodingError::DictionaryFull { table: self.table })?;
        self.codes.insert(value, code);
        Ok(code)
    }

    /// Number of defined entries.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True when nothing has been defined.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn clear(&mut self) {
        self.codes.clear();
    }
}

/// Code → value list on the reading side.
#[derive(Debug, Clone)]
pub struct DecodeTable<T> {
    table: Table,
    entries: Vec<T>,
}

impl<T> DecodeTable<T> {
    fn new(table: Table) -> Self {
        Self {
            table,
            entries: Vec::new(),
        }
    }

    /// Append the next definition.
    pub fn push(&mut self, value: T) {
        self.entries.push(value);
    }

    /// Value for `code`; undefined codes are structural errors.
    pub fn resolve(&self, code: i64) -> Result<&T, InvalidStream> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.entries.get(idx))
            .ok_or(InvalidStream::DanglingReference {
                table: self.table,
                code,
            })
    }

    /// Number of known entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Entry counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DictionaryStats {
    /// Interned strings.
    pub strings: usize,
    /// Interned modules.
    pub modules: usize,
    /// Interned qualified names.
    pub qnames: usize,
    /// Interned augmentation identifiers.
    pub augmentations: usize,
}

/// All writer-side tables of one stream.
#[derive(Debug, Clone)]
pub struct EncodeDictionary {
    pub(crate) strings: EncodeTable<Arc<str>>,
    pub(crate) modules: EncodeTable<QNameModule>,
    pub(crate) qnames: EncodeTable<QName>,
    pub(crate) augmentations: EncodeTable<AugmentationIdentifier>,
}

impl Default for EncodeDictionary {
    fn default() -> Self {
        Self {
            strings: EncodeTable::new(Table::String),
            modules: EncodeTable::new(Table::Module),
            qnames: EncodeTable::new(Table::QName),
            augmentations: EncodeTable::new(Table::Augmentation),
        }
    }
}

impl EncodeDictionary {
    /// Empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every definition.
    pub fn clear(&mut self) {
        tracing::debug!(stats = ?self.stats(), "clearing encode dictionary");
        self.strings.clear();
        self.modules.clear();
        self.qnames.clear();
        self.augmentations.clear();
    }

    /// Entry counts.
    pub fn stats(&self) -> DictionaryStats {
        DictionaryStats {
            strings: self.strings.len(),
            modules: self.modules.len(),
            qnames: self.qnames.len(),
            augmentations: self.augmentations.len(),
        }
    }

    /// True when no table holds anything.
    pub fn is_empty(&self) -> bool {
        self.stats() == DictionaryStats::default()
    }
}

/// All reader-side tables of one stream.
#[derive(Debug, Clone)]
pub struct DecodeDictionary {
    pub(crate) strings: DecodeTable<Arc<str>>,
    pub(crate) modules: DecodeTable<QNameModule>,
    pub(crate) qnames: DecodeTable<QName>,
    pub(crate) augmentations: DecodeTable<AugmentationIdentifier>,
}

impl Default for DecodeDictionary {
    fn default() -> Self {
        Self {
            strings: DecodeTable::new(Table::String),
            modules: DecodeTable::new(Table::Module),
            qnames: DecodeTable::new(Table::QName),
            augmentations: DecodeTable::new(Table::Augmentation),
        }
    }
}

impl DecodeDictionary {
    /// Empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every definition.
    pub fn clear(&mut self) {
        tracing::debug!(stats = ?self.stats(), "clearing decode dictionary");
        self.strings.clear();
        self.modules.clear();
        self.qnames.clear();
        self.augmentations.clear();
    }

    /// Entry counts.
    pub fn stats(&self) -> DictionaryStats {
        DictionaryStats {
            strings: self.strings.len(),
            modules: self.modules.len(),
            qnames: self.qnames.len(),
            augmentations: self.augmentations.len(),
        }
    }

    /// True when no table holds anything.
    pub fn is_empty(&self) -> bool {
        self.stats() == DictionaryStats::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_sequential_and_lookup_finds_them() {
        let mut dict = EncodeDictionary::new();
        assert_eq!(dict.strings.define(Arc::from("a")).unwrap(), 0);
        assert_eq!(dict.strings.define(Arc::from("b")).unwrap(), 1);
        assert_eq!(dict.strings.lookup("a"), Some(0));
        assert_eq!(dict.strings.lookup("b"), Some(1));
        assert_eq!(dict.strings.lookup("c"), None);
    }

    #[test]
    fn redefinition_is_an_error() {
        let mut dict = EncodeDictionary::new();
        dict.strings.define(Arc::from("a")).unwrap();
        assert_eq!(
            dict.strings.define(Arc::from("a")).unwrap_err(),
            EncodingError::AlreadyDefined {
                table: Table::String,
                code: 0
            }
        );
    }

    #[test]
    fn out_of_range_codes_are_dangling() {
        let mut dict = DecodeDictionary::new();
        dict.strings.push(Arc::from("x"));
        assert_eq!(&**dict.strings.resolve(0).unwrap(), "x");
        for code in [1, -1, i64::MAX] {
            assert_eq!(
                dict.strings.resolve(code).unwrap_err(),
                InvalidStream::DanglingReference {
                    table: Table::String,
                    code
                }
            );
        }
    }

    #[test]
    fn clear_resets_codes() {
        let mut dict = EncodeDictionary::new();
        dict.strings.define(Arc::from("a")).unwrap();
        dict.qnames.define(QName::create("urn:t", "x").unwrap()).unwrap();
        assert_eq!(dict.stats().qnames, 1);
        dict.clear();
        assert!(dict.is_empty());
        assert_eq!(dict.strings.define(Arc::from("b")).unwrap(), 0);
    }
}
