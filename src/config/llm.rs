use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_string_env};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Chat-completion endpoint configuration.
///
/// The endpoint is treated as an opaque OpenAI-compatible collaborator;
/// nothing else in the crate knows its wire shape.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
}

impl LlmConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = validate_base_url(
            "HAKILENS_LLM_BASE_URL",
            parse_string_env("HAKILENS_LLM_BASE_URL", settings.llm.base_url.clone())?,
        )?;

        let api_key = optional_env("HAKILENS_LLM_API_KEY")?
            .or(optional_env("OPENAI_API_KEY")?)
            .map(SecretString::from);

        Ok(Self {
            base_url,
            model: parse_string_env("HAKILENS_LLM_MODEL", settings.llm.model.clone())?,
            api_key,
        })
    }

    /// Missing keys are tolerated at resolve time so research-only use
    /// works offline; chat commands call this before first use.
    pub fn require_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.api_key.as_ref().ok_or_else(|| ConfigError::Missing {
            key: "HAKILENS_LLM_API_KEY".to_string(),
        })
    }
}

pub(crate) fn validate_base_url(key: &str, raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/').to_string();
    let parsed = url::Url::parse(&trimmed).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{trimmed}' is not a valid URL: {e}"),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(trimmed)
}
