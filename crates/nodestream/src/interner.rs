// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Caller-owned interning context for decoded names.
//!
//! A reader validates and deduplicates every name it materialises through an
//! [`Interner`]. Moving one interner through several readers (see
//! `NodeDataInput::with_interner` / `into_parts`) makes names decoded from
//! different streams share storage.

use std::collections::HashSet;
use std::sync::Arc;

use nodestream_model::{QName, QNameModule};

use crate::error::InvalidStream;

/// Deduplicating factory for strings, modules and qualified names.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    strings: HashSet<Arc<str>>,
    modules: HashSet<QNameModule>,
    qnames: HashSet<QName>,
}

impl Interner {
    /// Empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared copy of `value`.
    pub fn string(&mut self, value: String) -> Arc<str> {
        if let Some(existing) = self.strings.get(value.as_str()) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(value);
        self.strings.insert(Arc::clone(&shared));
        shared
    }

    /// Validated, shared module.
    pub fn module(
        &mut self,
        namespace: Arc<str>,
        revision: Option<Arc<str>>,
    ) -> Result<QNameModule, InvalidStream> {
        let module = QNameModule::new(namespace, revision)
            .map_err(|err| InvalidStream::InvalidName(err.to_string()))?;
        Ok(intern(&mut self.modules, module))
    }

    /// Validated, shared qualified name.
    pub fn qname(&mut self, module: QNameModule, local_name: Arc<str>) -> Result<QName, InvalidStream> {
        let qname =
            QName::new(module, local_name).map_err(|err| InvalidStream::InvalidName(err.to_string()))?;
        Ok(intern(&mut self.qnames, qname))
    }

    /// Number of distinct names held.
    pub fn len(&self) -> usize {
        self.strings.len() + self.modules.len() + self.qnames.len()
    }

    /// True when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.strings.clear();
        self.modules.clear();
        self.qnames.clear();
    }
}

fn intern<T: Clone + Eq + std::hash::Hash>(set: &mut HashSet<T>, value: T) -> T {
    if let Some(existing) = set.get(&value) {
        return existing.clone();
    }
    set.insert(value.clone());
    value
}
