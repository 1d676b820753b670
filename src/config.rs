use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "gworkspace-client";

/// Optional overrides read from `config.toml`. Every field may be left out.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub drive_token_path: Option<PathBuf>,
    pub sheets_token_path: Option<PathBuf>,
    pub client_secret_path: Option<PathBuf>,
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    // CLI flag first, then the config file, then the XDG default.
    pub fn resolve_drive_token_path(&self, cli_override: Option<PathBuf>) -> Result<PathBuf> {
        match cli_override.or_else(|| self.drive_token_path.clone()) {
            Some(path) => Ok(path),
            None => Self::cache_file("drive_token.json"),
        }
    }

    pub fn resolve_sheets_token_path(&self, cli_override: Option<PathBuf>) -> Result<PathBuf> {
        match cli_override.or_else(|| self.sheets_token_path.clone()) {
            Some(path) => Ok(path),
            None => Self::cache_file("sheets_token.json"),
        }
    }

    pub fn resolve_client_secret_path(&self, cli_override: Option<PathBuf>) -> Result<PathBuf> {
        match cli_override.or_else(|| self.client_secret_path.clone()) {
            Some(path) => Ok(path),
            None => Self::config_dir_file("client_secret.json"),
        }
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Self::config_dir_file("config.toml")
    }

    fn config_dir_file(filename: &str) -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_cache_home()
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            drive_token_path: Some(PathBuf::from("/tmp/drive_token.json")),
            sheets_token_path: None,
            client_secret_path: Some(PathBuf::from("/tmp/secret.json")),
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = Config::parse(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_cli_override_wins() {
        let config = Config {
            drive_token_path: Some(PathBuf::from("/from/file.json")),
            ..Default::default()
        };

        let path = config
            .resolve_drive_token_path(Some(PathBuf::from("/from/cli.json")))
            .unwrap();
        assert_eq!(path, PathBuf::from("/from/cli.json"));

        let path = config.resolve_drive_token_path(None).unwrap();
        assert_eq!(path, PathBuf::from("/from/file.json"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Config::parse("drive_token_path = 12").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
