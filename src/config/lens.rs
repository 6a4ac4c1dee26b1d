use crate::config::helpers::{optional_env, parse_csv, parse_string_env};
use crate::config::llm::validate_base_url;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Research (lens) backend configuration.
#[derive(Debug, Clone)]
pub struct LensConfig {
    pub base_url: String,
    /// Allow-listed hosts for research targets. A URL passes when its
    /// host equals an entry or is a subdomain of one.
    pub allowed_domains: Vec<String>,
}

impl LensConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let allowed_domains = match optional_env("HAKILENS_ALLOWED_DOMAINS")? {
            Some(raw) => parse_csv(&raw),
            None => settings
                .lens
                .allowed_domains
                .iter()
                .map(|d| d.to_ascii_lowercase())
                .collect(),
        };

        if allowed_domains.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "HAKILENS_ALLOWED_DOMAINS".to_string(),
                message: "at least one allowed research domain is required".to_string(),
            });
        }

        Ok(Self {
            base_url: validate_base_url(
                "HAKILENS_LENS_BASE_URL",
                parse_string_env("HAKILENS_LENS_BASE_URL", settings.lens.base_url.clone())?,
            )?,
            allowed_domains,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::Settings;

    use super::LensConfig;

    #[test]
    fn resolve_defaults_allow_kenya_law_only() {
        let config = LensConfig::resolve(&Settings::default()).expect("lens config");
        assert_eq!(config.allowed_domains, vec!["kenyalaw.org"]);
    }

    #[test]
    fn resolve_rejects_empty_allow_list() {
        let mut settings = Settings::default();
        settings.lens.allowed_domains.clear();
        assert!(LensConfig::resolve(&settings).is_err());
    }
}
