//! Settings: the completion endpoint, the stored credential and the default
//! persona, kept in a YAML file under the user's home directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::persona::Persona;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const CONFIG_DIR: &str = ".parley";
const CONFIG_FILE: &str = "config.yaml";

/// Environment fallback for the credential when the config file has none.
pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub persona: Persona,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            persona: Persona::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings: {:?}", path.as_ref()))?;
        let settings = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {:?}", path.as_ref()))?;
        Ok(settings)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create settings directory: {parent:?}"))?;
        }
        let content = serde_yaml::to_string(self).context("failed to serialize settings")?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write settings: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Load the settings file if present, falling back to defaults; a key
    /// from the environment fills in when the file carries none.
    pub fn load_or_default() -> Self {
        let path = Self::config_path();
        let mut settings = if path.exists() {
            Self::load_from_file(&path).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "settings unreadable, using defaults");
                Self::default()
            })
        } else {
            Self::default()
        };

        if settings.api_key.is_none() {
            settings.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        settings
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_file(Self::config_path())
    }

    /// The stored credential, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = Some(key.trim().to_string());
    }

    /// True when the stored credential passes [`is_valid_key`].
    pub fn has_valid_key(&self) -> bool {
        self.api_key().is_some_and(is_valid_key)
    }
}

/// A usable credential is non-empty after trimming and contains only
/// printable ASCII.
pub fn is_valid_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_graphic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_the_local_endpoint() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert!(settings.api_key.is_none());
        assert_eq!(settings.persona, Persona::Helper);
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("config.yaml");

        let mut settings = Settings::default();
        settings.api_url = "https://chat.example.com".to_string();
        settings.set_api_key("key-123");
        settings.persona = Persona::Coder;
        settings.save_to_file(&path)?;

        let loaded = Settings::load_from_file(&path)?;
        assert_eq!(loaded.api_url, "https://chat.example.com");
        assert_eq!(loaded.api_key(), Some("key-123"));
        assert_eq!(loaded.persona, Persona::Coder);
        Ok(())
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "api_url: [unclosed").unwrap();

        assert!(Settings::load_from_file(&path).is_err());
    }

    #[test]
    #[serial]
    fn load_or_default_reads_the_home_config() -> Result<()> {
        let home = TempDir::new()?;
        std::env::set_var("HOME", home.path());
        std::env::remove_var(API_KEY_ENV);

        let mut settings = Settings::default();
        settings.set_api_key("from-file");
        settings.save_to_file(home.path().join(CONFIG_DIR).join(CONFIG_FILE))?;

        let loaded = Settings::load_or_default();
        assert_eq!(loaded.api_key(), Some("from-file"));

        std::env::remove_var("HOME");
        Ok(())
    }

    #[test]
    #[serial]
    fn environment_key_fills_in_when_the_file_has_none() {
        let home = TempDir::new().unwrap();
        std::env::set_var("HOME", home.path());
        std::env::set_var(API_KEY_ENV, "from-env");

        let loaded = Settings::load_or_default();
        assert_eq!(loaded.api_key(), Some("from-env"));

        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var("HOME");
    }

    #[test]
    fn key_validity_rejects_blank_and_non_printable_input() {
        assert!(is_valid_key("sk-abc123"));
        assert!(is_valid_key("  sk-abc123  "));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
        assert!(!is_valid_key("has space inside"));
        assert!(!is_valid_key("tab\tseparated"));
    }

    #[test]
    fn has_valid_key_tracks_the_stored_credential() {
        let mut settings = Settings::default();
        assert!(!settings.has_valid_key());

        settings.set_api_key("key-123");
        assert!(settings.has_valid_key());

        settings.api_key = Some("  ".to_string());
        assert!(!settings.has_valid_key());
    }
}
