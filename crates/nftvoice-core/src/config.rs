use crate::chunker::DEFAULT_MAX_CHUNK_LEN;
use crate::language::Language;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "NFTVOICE_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub language: Option<Language>,
    pub chain: Option<String>,
    pub contract: Option<String>,
    pub max_chunk_len: Option<usize>,
    /// Persona prompt sent along with every chat request
    pub persona: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_language(language: Language) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.language = Some(language);
        config.save()
    }

    /// Env var first, then the config file, then the default.
    pub fn api_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_MAX_CHUNK_LEN)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("nftvoice").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.language(), Language::English);
        assert_eq!(config.max_chunk_len(), DEFAULT_MAX_CHUNK_LEN);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: Some("http://example.test".to_string()),
            language: Some(Language::Spanish),
            chain: Some("ethereum".to_string()),
            contract: Some("0xabc".to_string()),
            max_chunk_len: Some(80),
            persona: Some("You are gentle.".to_string()),
        };
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"es-ES\""));
    }

    #[test]
    fn test_zero_chunk_len_uses_default() {
        let config = Config {
            max_chunk_len: Some(0),
            ..Config::new()
        };
        assert_eq!(config.max_chunk_len(), DEFAULT_MAX_CHUNK_LEN);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
