// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted codec settings for nodestream tools.
//!
//! [`CodecSettings`] keeps a [`nodestream::CodecConfig`] as JSON in any
//! [`ConfigStore`]; [`FsConfigStore`] is the file-per-key store under the
//! platform config directory.

mod settings;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

pub use settings::{CodecSettings, ConfigError, ConfigStore, CODEC_CONFIG_KEY};

/// Store configs as JSON files under a base directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/nodestream`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "nodestream")
            .ok_or(ConfigError::NoConfigDir)?;
        Self::at(proj.config_dir())
    }

    /// Create a store rooted at `base`, creating the directory if needed.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base).map_err(|source| io_error(&base, source))?;
        Ok(Self { base })
    }

    /// Directory the store writes into.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

fn io_error(path: &Path, source: io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        fs::write(&path, data).map_err(|source| io_error(&path, source))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nodestream::{CodecConfig, StreamVersion};

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(store.load_raw(CODEC_CONFIG_KEY).unwrap().is_none());
    }

    #[test]
    fn codec_config_persists_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CodecSettings::new(FsConfigStore::at(dir.path().join("nested")).unwrap());
        assert_eq!(settings.load().unwrap(), CodecConfig::default());

        let config = CodecConfig::default()
            .with_version(StreamVersion::NeonSr2)
            .with_max_depth(64);
        settings.save(&config).unwrap();
        assert_eq!(settings.load().unwrap(), config);

        let path = settings.store().path_for(CODEC_CONFIG_KEY);
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\"max_depth\": 64"), "{text}");
    }

    #[test]
    fn unreadable_entries_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        fs::create_dir(store.path_for(CODEC_CONFIG_KEY)).unwrap();
        let err = store.load_raw(CODEC_CONFIG_KEY).unwrap_err();
        assert!(err.to_string().contains("codec.json"), "{err}");
    }
}
