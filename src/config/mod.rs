#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{validate_required_field, Validate};
use std::fmt;
use std::path::Path;
pub use toml_config::{ExtractConfig, FileConfig, ServiceConfig};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";

/// Process-wide settings, resolved once at startup and passed into the service.
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub service: ServiceConfig,
    pub extract: ExtractConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("service", &self.service)
            .field("extract", &self.extract)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env`, the optional TOML file, then environment overrides.
    /// Fails when the API key is missing.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            tracing::debug!("Loaded .env file");
        }

        let mut file = match config_path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                FileConfig::from_file(path)?
            }
            None => FileConfig::default(),
        };

        if let Ok(base_url) = std::env::var(BASE_URL_VAR) {
            file.service.base_url = base_url;
        }
        if let Ok(model) = std::env::var(MODEL_VAR) {
            file.service.model = model;
        }

        Self::from_parts(std::env::var(API_KEY_VAR).ok(), file)
    }

    /// Build from an explicit key and file settings, e.g. with an injected test key.
    pub fn from_parts(api_key: Option<String>, file: FileConfig) -> Result<Self> {
        let api_key = validate_required_field(API_KEY_VAR, api_key)?;
        let config = Self {
            api_key,
            service: file.service,
            extract: file.extract,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.service.validate()
    }
}
