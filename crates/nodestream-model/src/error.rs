// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;

/// Errors raised when constructing model values from untrusted text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Namespace was empty.
    #[error("namespace must not be empty")]
    EmptyNamespace,
    /// Revision was not of the `YYYY-MM-DD` form.
    #[error("invalid revision date {0:?}")]
    InvalidRevision(String),
    /// Local name was not a valid identifier.
    #[error("invalid local name {0:?}")]
    InvalidLocalName(String),
}
