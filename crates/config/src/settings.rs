// Application settings
// Loaded from ~/.config/plotdues/config.toml

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plotdues_ledger::{CorruptPolicy, StoreOptions, DEFAULT_RECENT_LIMIT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// What to do with a ledger file that cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnCorrupt {
    /// Log a warning and start empty (default)
    #[default]
    Reset,
    /// Refuse to start
    Fail,
}

impl From<OnCorrupt> for CorruptPolicy {
    fn from(value: OnCorrupt) -> Self {
        match value {
            OnCorrupt::Reset => CorruptPolicy::Reset,
            OnCorrupt::Fail => CorruptPolicy::Fail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Persisted ledger (JSON array of records)
    pub ledger_path: PathBuf,

    /// Sheet read by `seed` when no file is given
    pub seed_path: PathBuf,

    /// Records returned by an empty search
    pub recent_limit: usize,

    pub on_corrupt: OnCorrupt,

    /// tracing-subscriber filter directive, e.g. "plotdues=debug"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            seed_path: PathBuf::from("data").join("dues.xlsx"),
            recent_limit: DEFAULT_RECENT_LIMIT,
            on_corrupt: OnCorrupt::Reset,
            log_filter: None,
        }
    }
}

fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plotdues")
        .join("dues.json")
}

impl Settings {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plotdues")
            .join("config.toml")
    }

    /// Load from `path`, or from [`Settings::default_path`] when `None`.
    ///
    /// A missing file yields defaults. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Self::from_toml(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            on_corrupt: self.on_corrupt.into(),
            recent_limit: self.recent_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.ledger_path.ends_with("plotdues/dues.json"));
        assert_eq!(settings.recent_limit, 200);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml(
            r#"
ledger_path = "/srv/dues/ledger.json"
on_corrupt = "fail"
"#,
        )
        .unwrap();

        assert_eq!(settings.ledger_path, PathBuf::from("/srv/dues/ledger.json"));
        assert_eq!(settings.on_corrupt, OnCorrupt::Fail);
        assert_eq!(settings.seed_path, PathBuf::from("data/dues.xlsx"));
        assert_eq!(settings.store_options().on_corrupt, CorruptPolicy::Fail);
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "on_corrupt = \"explode\"\n").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let settings = Settings {
            recent_limit: 50,
            log_filter: Some("plotdues=debug".into()),
            ..Settings::default()
        };
        let text = toml::to_string(&settings).unwrap();
        assert_eq!(Settings::from_toml(&text).unwrap(), settings);
    }
}
