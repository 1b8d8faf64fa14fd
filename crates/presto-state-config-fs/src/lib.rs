// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for presto-state tools (uses the platform
//! config dir).

use directories::ProjectDirs;
use presto_state_app_core::config::{ConfigError, ConfigStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores configs as `<key>.json` files under one base directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the user config directory (e.g. `~/.config/presto-state`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "presto-state")
            .ok_or(ConfigError::NoConfigDir)?;
        Self::with_base(proj.config_dir())
    }

    /// Store rooted at `base`, created if needed.
    pub fn with_base(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the config files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ConfigError::Other(format!("invalid config key {key:?}")));
        }
        Ok(self.base.join(format!("{key}.json")))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_for(key)?;
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    // Written to a sibling file first so readers never see a torn config.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_state_app_core::config::ConfigService;
    use presto_state_app_core::prefs::{CliPrefs, PREFS_KEY};

    #[test]
    fn prefs_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::with_base(dir.path()).unwrap());

        let mut prefs = CliPrefs::default();
        prefs.decode.pretty = true;
        service.save(PREFS_KEY, &prefs).unwrap();

        assert!(dir.path().join("prefs.json").is_file());
        assert!(!dir.path().join("prefs.json.tmp").exists());
        let loaded: CliPrefs = service.load_or_default(PREFS_KEY).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path()).unwrap();
        assert!(matches!(store.load_raw("prefs"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn keys_cannot_escape_the_base() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path()).unwrap();
        assert!(matches!(
            store.save_raw("../evil", b"{}"),
            Err(ConfigError::Other(_))
        ));
    }

    #[test]
    fn corrupt_file_names_its_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("prefs.json"), b"{not json").unwrap();
        let service = ConfigService::new(FsConfigStore::with_base(dir.path()).unwrap());
        match service.load::<CliPrefs>(PREFS_KEY) {
            Err(ConfigError::Corrupt { key, .. }) => assert_eq!(key, "prefs"),
            other => panic!("expected corrupt config, got {other:?}"),
        }
    }
}
