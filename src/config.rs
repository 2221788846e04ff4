use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::samples::DEFAULT_MAX_CHARS;

/// Persistent user preferences. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// language id used for GitHub fetches and custom prompts
    pub language: String,
    pub max_sample_chars: usize,
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "typescript".to_string(),
            max_sample_chars: DEFAULT_MAX_CHARS,
            github_token: None,
        }
    }
}

impl Config {
    /// Make `language_id` the default for later runs.
    ///
    /// Saves only when the language changes and returns whether it did.
    pub fn remember_language<S: ConfigStore + ?Sized>(
        &mut self,
        store: &S,
        language_id: &str,
    ) -> io::Result<bool> {
        if self.language == language_id {
            return Ok(false);
        }
        self.language = language_id.to_string();
        store.save(self)?;
        Ok(true)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("codetype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            language: "go".into(),
            max_sample_chars: 800,
            github_token: Some("ghp_example".into()),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn remember_language_saves_on_change() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let mut cfg = Config {
            github_token: Some("keep-me".into()),
            ..Config::default()
        };

        assert!(cfg.remember_language(&store, "go").unwrap());
        let loaded = store.load();
        assert_eq!(loaded.language, "go");
        assert_eq!(loaded.github_token.as_deref(), Some("keep-me"));
    }

    #[test]
    fn remember_same_language_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let mut cfg = Config::default();

        assert!(!cfg.remember_language(&store, "typescript").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"language":"rust"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.language, "rust");
        assert_eq!(cfg.max_sample_chars, DEFAULT_MAX_CHARS);
        assert_eq!(cfg.github_token, None);
    }
}
