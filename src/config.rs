use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stats::DateWindow;
use crate::utils;
use crate::word_cloud::DEFAULT_MAX_WORDS;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const DATABASE_FILE: &str = "plume.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Where `export` writes files when no `--out` is given.
    /// Falls back to the data directory.
    #[serde(default)]
    pub export_dir: Option<String>,
    #[serde(default = "default_word_cloud_max_words")]
    pub word_cloud_max_words: usize,
    #[serde(default)]
    pub default_window: DateWindow,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            export_dir: None,
            word_cloud_max_words: default_word_cloud_max_words(),
            default_window: DateWindow::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

fn default_database_path() -> String {
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_word_cloud_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from the profile's config file, or create it with
    /// defaults if missing.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let mut config = Self::load_from(&config_path)?;
            // A dev profile must never point at the production database.
            if profile == utils::Profile::Dev {
                config.database_path = Self::default_database_path_for_profile(profile);
            }
            Ok(config)
        } else {
            let mut config = Config {
                database_path: Self::default_database_path_for_profile(profile),
                ..Config::default()
            };
            config.save_to(&config_path)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Load configuration from an explicit file. Missing keys take defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to the profile's config file
    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        match utils::get_data_dir(profile) {
            Some(data_dir) => data_dir.join(DATABASE_FILE).to_string_lossy().to_string(),
            None => format!("~/.local/share/{}/{}", profile.app_name(), DATABASE_FILE),
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Directory for export files: `export_dir` if set, otherwise the
    /// directory holding the database.
    pub fn get_export_dir(&self) -> PathBuf {
        match &self.export_dir {
            Some(dir) => utils::expand_path(dir),
            None => self
                .get_database_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
