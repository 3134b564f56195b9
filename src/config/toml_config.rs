use crate::core::pipeline::ServiceErrorPolicy;
use crate::core::prompt::Locale;
use crate::utils::error::{ConstraintError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub service: ServiceConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_seconds: 30,
            retry_attempts: 1,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub locale: Locale,
    pub on_service_error: ServiceErrorPolicy,
}

impl FileConfig {
    /// TOML ファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConstraintError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// TOML 文字列から設定を解析する
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConstraintError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 環境変数を置換する (例: ${OPENAI_BASE_URL})。未設定の変数はそのまま残す
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConstraintError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_url("service.base_url", &self.base_url)?;
        validate_non_empty_string("service.model", &self.model)?;
        validate_range("service.max_tokens", self.max_tokens, 1, 16_384)?;
        validate_range("service.timeout_seconds", self.timeout_seconds, 1, 600)?;
        validate_range("service.retry_attempts", self.retry_attempts, 1, 10)?;
        validate_range("service.retry_delay_ms", self.retry_delay_ms, 0, 60_000)?;
        Ok(())
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        self.service.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config.service, ServiceConfig::default());
        assert_eq!(config.extract.locale, Locale::Ja);
        assert_eq!(config.extract.on_service_error, ServiceErrorPolicy::Propagate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[service]
base_url = "http://localhost:8080/v1"
model = "gpt-4o"
max_tokens = 800
timeout_seconds = 10
retry_attempts = 3
retry_delay_ms = 50

[extract]
locale = "en"
on_service_error = "fallback_to_defaults"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.service.base_url, "http://localhost:8080/v1");
        assert_eq!(config.service.model, "gpt-4o");
        assert_eq!(config.service.max_tokens, 800);
        assert_eq!(config.service.retry_attempts, 3);
        assert_eq!(config.extract.locale, Locale::En);
        assert_eq!(
            config.extract.on_service_error,
            ServiceErrorPolicy::FallbackToDefaults
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PLACE_CONSTRAINTS_TEST_MODEL", "gpt-test");

        let toml_content = r#"
[service]
model = "${PLACE_CONSTRAINTS_TEST_MODEL}"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.service.model, "gpt-test");

        std::env::remove_var("PLACE_CONSTRAINTS_TEST_MODEL");
    }

    #[test]
    fn test_config_validation() {
        let config = FileConfig::from_toml_str(
            r#"
[service]
base_url = "ftp://example.com"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = FileConfig::from_toml_str("[service]\nretry_attempts = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = FileConfig::from_toml_str("[service]\nretry_delay_ms = 60000\n").unwrap();
        assert!(config.validate().is_ok());

        let config = FileConfig::from_toml_str("[service]\nretry_delay_ms = 600000\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_locale_is_config_error() {
        let err = FileConfig::from_toml_str("[extract]\nlocale = \"fr\"\n").unwrap_err();
        assert!(matches!(err, ConstraintError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[service]\nmodel = \"file-model\"\n")
            .unwrap();

        let config = FileConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.service.model, "file-model");
    }
}
