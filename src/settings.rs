//! File-backed settings.
//!
//! Settings are the declarative layer under configuration: values read
//! from `config.toml` in the platform config dir (or a path given via
//! `HAKILENS_CONFIG`). Environment variables override them during
//! [`crate::config::Config::resolve`]; nothing reads settings directly
//! at runtime.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub lens: LensSettings,
    pub matters: MatterSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LensSettings {
    pub base_url: String,
    /// Hosts the research flow may target. Subdomains of each entry are
    /// allowed too.
    pub allowed_domains: Vec<String>,
}

impl Default for LensSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5007".to_string(),
            allowed_domains: vec!["kenyalaw.org".to_string()],
        }
    }
}

/// Matters are configured locally; only the active selection is
/// persisted between sessions.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MatterSettings {
    pub extra: Vec<MatterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatterEntry {
    pub id: String,
    pub name: String,
    pub client: String,
}

impl Settings {
    /// Load settings from the default location, falling back to
    /// defaults when no file exists. A present-but-invalid file is an
    /// error; silently ignoring it would mask typos.
    pub fn load() -> Result<Self, ConfigError> {
        match settings_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::SettingsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn settings_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("HAKILENS_CONFIG") {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::config_dir().map(|dir| dir.join("hakilens").join("config.toml"))
}
