use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "TAUTULLI_BAR_CONFIG";
pub const BASE_URL_ENV: &str = "TAUTULLI_URL";
pub const API_KEY_ENV: &str = "TAUTULLI_API_KEY";
pub const PLEX_URL_ENV: &str = "PLEX_URL";

/// Connection settings, loaded once at startup and never changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tautulli root, e.g. `http://nas.local:8181`, without trailing slash
    pub base_url: String,
    pub api_key: String,
    /// Plex web root; adds an "Open Plex" link when set
    pub plex_url: Option<String>,
}

/// On-disk shape of `config.json`; every key is optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_url: Option<String>,
    api_key: Option<String>,
    plex_url: Option<String>,
}

impl Config {
    /// Read the config file (if any), then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let file = match config_file_path() {
            Some(path) => read_config_file(&path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let pick = |key: &str, from_file: Option<String>| {
            env(key)
                .or(from_file)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = pick(BASE_URL_ENV, file.base_url).ok_or(ConfigError::Missing {
            key: "base_url",
            env: BASE_URL_ENV,
        })?;
        let api_key = pick(API_KEY_ENV, file.api_key).ok_or(ConfigError::Missing {
            key: "api_key",
            env: API_KEY_ENV,
        })?;
        let plex_url = pick(PLEX_URL_ENV, file.plex_url);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            plex_url: plex_url.map(|url| url.trim_end_matches('/').to_string()),
        })
    }
}

/// `$TAUTULLI_BAR_CONFIG`, else `~/.config/tautulli-bar/config.json` when it exists
fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("tautulli-bar").join("config.json"))
        .filter(|path| path.exists())
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
