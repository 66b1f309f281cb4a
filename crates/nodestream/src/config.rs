// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings applied when a stream is opened.

use serde::{Deserialize, Serialize};

use crate::StreamVersion;

/// Default nesting limit for readers and writers.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Settings applied when opening a stream.
///
/// `max_depth` bounds node nesting and, separately, instance paths nested
/// inside values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CodecConfig {
    /// Format used by writers. Readers take the version from the stream header.
    pub version: StreamVersion,
    /// Deepest tree accepted by writers and readers; the root is at depth 0.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            version: StreamVersion::CURRENT,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Same settings with another writer version.
    pub fn with_version(self, version: StreamVersion) -> Self {
        Self { version, ..self }
    }

    /// Same settings with another nesting limit.
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }
}
