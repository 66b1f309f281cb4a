// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Namespace plus optional revision date: the module a [`QName`] lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QNameModule {
    namespace: Arc<str>,
    revision: Option<Arc<str>>,
}

impl QNameModule {
    /// Validate and build a module.
    ///
    /// The namespace must be non-empty; a revision, when present, must be a
    /// `YYYY-MM-DD` date.
    pub fn new(
        namespace: impl Into<Arc<str>>,
        revision: Option<Arc<str>>,
    ) -> Result<Self, ModelError> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(ModelError::EmptyNamespace);
        }
        if let Some(rev) = &revision {
            if !is_revision_date(rev) {
                return Err(ModelError::InvalidRevision(rev.to_string()));
            }
        }
        Ok(Self {
            namespace,
            revision,
        })
    }

    /// Module namespace URI.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Shared handle to the namespace text.
    pub fn namespace_arc(&self) -> &Arc<str> {
        &self.namespace
    }

    /// Revision date, if the module is revisioned.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Shared handle to the revision text.
    pub fn revision_arc(&self) -> Option<&Arc<str>> {
        self.revision.as_ref()
    }
}

impl fmt::Display for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}?revision={rev}", self.namespace),
            None => f.write_str(&self.namespace),
        }
    }
}

/// Qualified name of a schema node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QName {
    module: QNameModule,
    local_name: Arc<str>,
}

impl QName {
    /// Validate `local_name` and bind it to `module`.
    pub fn new(module: QNameModule, local_name: impl Into<Arc<str>>) -> Result<Self, ModelError> {
        let local_name = local_name.into();
        if !is_identifier(&local_name) {
            return Err(ModelError::InvalidLocalName(local_name.to_string()));
        }
        Ok(Self { module, local_name })
    }

    /// Shorthand for an unrevisioned module.
    pub fn create(namespace: &str, local_name: &str) -> Result<Self, ModelError> {
        Self::new(QNameModule::new(namespace, None)?, local_name)
    }

    /// Shorthand for a revisioned module.
    pub fn create_with_revision(
        namespace: &str,
        revision: &str,
        local_name: &str,
    ) -> Result<Self, ModelError> {
        Self::new(QNameModule::new(namespace, Some(revision.into()))?, local_name)
    }

    /// Same module, different local name.
    pub fn sibling(&self, local_name: impl Into<Arc<str>>) -> Result<Self, ModelError> {
        Self::new(self.module.clone(), local_name)
    }

    /// Owning module.
    pub fn module(&self) -> &QNameModule {
        &self.module
    }

    /// Namespace of the owning module.
    pub fn namespace(&self) -> &str {
        self.module.namespace()
    }

    /// Revision of the owning module.
    pub fn revision(&self) -> Option<&str> {
        self.module.revision()
    }

    /// Local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Shared handle to the local name text.
    pub fn local_name_arc(&self) -> &Arc<str> {
        &self.local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.module, self.local_name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_revision_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
