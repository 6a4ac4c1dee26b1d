//! Runtime configuration.
//!
//! Resolution order: environment variables override file-backed
//! [`Settings`](crate::settings::Settings), which override built-in
//! defaults. Resolution happens once at startup; everything downstream
//! receives an immutable [`Config`].

pub mod helpers;
mod lens;
mod llm;

pub use lens::LensConfig;
pub use llm::LlmConfig;

use crate::error::ConfigError;
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub lens: LensConfig,
}

impl Config {
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            llm: LlmConfig::resolve(settings)?,
            lens: LensConfig::resolve(settings)?,
        })
    }
}
