// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port and the JSON codec settings kept in it.

use std::io;
use std::path::PathBuf;

use nodestream::CodecConfig;
use thiserror::Error;

/// Key under which [`CodecConfig`] is stored.
pub const CODEC_CONFIG_KEY: &str = "codec";

/// Keyed blob storage for tool settings.
pub trait ConfigStore {
    /// Raw blob saved under `key`, or `None` when there is none.
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replace the blob saved under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform reports no config directory for this user.
    #[error("no config directory available for this user")]
    NoConfigDir,
    /// Reading or writing the backing file failed.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The stored document is not a codec config.
    #[error("stored codec config is not valid: {0}")]
    Json(#[from] serde_json::Error),
}

/// [`CodecConfig`] persisted as a JSON document in a [`ConfigStore`].
///
/// Missing or empty documents read as the defaults, and missing fields take
/// their default values.
#[derive(Debug, Clone)]
pub struct CodecSettings<S> {
    store: S,
}

impl<S: ConfigStore> CodecSettings<S> {
    /// Settings kept in `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored config, or the defaults when nothing was saved.
    pub fn load(&self) -> Result<CodecConfig, ConfigError> {
        match self.store.load_raw(CODEC_CONFIG_KEY)? {
            Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            _ => Ok(CodecConfig::default()),
        }
    }

    /// Replace the stored config.
    pub fn save(&self, config: &CodecConfig) -> Result<(), ConfigError> {
        let mut data = serde_json::to_vec_pretty(config)?;
        data.push(b'\n');
        self.store.save_raw(CODEC_CONFIG_KEY, &data)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    use nodestream::StreamVersion;

    #[derive(Default)]
    struct MemoryStore {
        blobs: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemoryStore {
        fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
            Ok(self.blobs.borrow().get(key).cloned())
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    fn stored(doc: &[u8]) -> CodecSettings<MemoryStore> {
        let store = MemoryStore::default();
        store.save_raw(CODEC_CONFIG_KEY, doc).unwrap();
        CodecSettings::new(store)
    }

    #[test]
    fn missing_and_empty_documents_read_as_defaults() {
        let settings = CodecSettings::new(MemoryStore::default());
        assert_eq!(settings.load().unwrap(), CodecConfig::default());
        assert_eq!(stored(b"").load().unwrap(), CodecConfig::default());
    }

    #[test]
    fn saved_config_uses_version_names() {
        let settings = CodecSettings::new(MemoryStore::default());
        let config = CodecConfig::default()
            .with_version(StreamVersion::NeonSr2)
            .with_max_depth(64);
        settings.save(&config).unwrap();
        assert_eq!(settings.load().unwrap(), config);

        let raw = settings.store().load_raw(CODEC_CONFIG_KEY).unwrap().unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("\"neon-sr2\""), "{text}");
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config = stored(br#"{"max_depth": 8}"#).load().unwrap();
        assert_eq!(config.version, StreamVersion::CURRENT);
        assert_eq!(config.max_depth, 8);
    }

    #[test]
    fn unknown_version_names_are_rejected() {
        let err = stored(br#"{"version": "helium"}"#).load().unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "{err}");
    }
}
