//! Environment parsing helpers shared by config resolution.

use crate::error::ConfigError;

/// Read an env var, treating unset and whitespace-only as absent.
pub fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value is not valid unicode".to_string(),
        }),
    }
}

/// Env override with a settings-provided fallback.
pub fn parse_string_env(key: &str, fallback: String) -> Result<String, ConfigError> {
    Ok(optional_env(key)?.unwrap_or(fallback))
}

pub fn parse_bool_env(key: &str, fallback: bool) -> Result<bool, ConfigError> {
    match optional_env(key)? {
        None => Ok(fallback),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{other}'"),
            }),
        },
    }
}

/// Comma-separated list, entries trimmed and lowercased, empties dropped.
pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
        .collect()
}
