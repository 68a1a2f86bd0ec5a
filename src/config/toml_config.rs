use crate::config::{
    DEFAULT_ENRICH_ENDPOINT, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_REDEEM_ENDPOINT,
    MAX_BATCH_SIZE, MAX_CONCURRENCY, MAX_REQUESTS_PER_MINUTE,
};
use crate::core::aggregator::DEFAULT_BATCH_SIZE;
use crate::core::rate_limiter::DEFAULT_MAX_REQUESTS_PER_MINUTE;
use crate::core::worker_pool::DEFAULT_WORKERS;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub io: IoConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    #[serde(default = "default_input_path")]
    pub input_path: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub enrich_endpoint: Option<String>,
    pub redeem_endpoint: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_workers")]
    pub concurrency: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_rate_limit")]
    pub max_requests_per_minute: usize,
}

fn default_input_path() -> String {
    DEFAULT_INPUT_PATH.to_string()
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_rate_limit() -> usize {
    DEFAULT_MAX_REQUESTS_PER_MINUTE
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_workers(),
            batch_size: default_batch_size(),
            max_requests_per_minute: default_rate_limit(),
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after replacing `${VAR}` with environment values.
    /// Unknown variables are left as written.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.io.input_path
    }

    fn output_path(&self) -> &str {
        &self.io.output_path
    }

    fn api_key(&self) -> Option<&str> {
        self.api.api_key.as_deref().filter(|k| !k.is_empty())
    }

    fn enrich_endpoint(&self) -> &str {
        self.api
            .enrich_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENRICH_ENDPOINT)
    }

    fn redeem_endpoint(&self) -> &str {
        self.api
            .redeem_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_REDEEM_ENDPOINT)
    }

    fn concurrency(&self) -> usize {
        self.limits.concurrency
    }

    fn batch_size(&self) -> usize {
        self.limits.batch_size
    }

    fn max_requests_per_minute(&self) -> usize {
        self.limits.max_requests_per_minute
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_csv_path("io.input_path", &self.io.input_path)?;
        validate_csv_path("io.output_path", &self.io.output_path)?;

        let api_key = validate_required_field("api.api_key", &self.api.api_key)?;
        validate_non_empty_string("api.api_key", api_key)?;
        if ENV_VAR.is_match(api_key) {
            return Err(EtlError::InvalidConfigValueError {
                field: "api.api_key".to_string(),
                value: api_key.clone(),
                reason: "Environment variable is not set".to_string(),
            });
        }

        validate_url("api.enrich_endpoint", self.enrich_endpoint())?;
        validate_url("api.redeem_endpoint", self.redeem_endpoint())?;
        validate_range("limits.concurrency", self.limits.concurrency, 1, MAX_CONCURRENCY)?;
        validate_range("limits.batch_size", self.limits.batch_size, 1, MAX_BATCH_SIZE)?;
        validate_range(
            "limits.max_requests_per_minute",
            self.limits.max_requests_per_minute,
            1,
            MAX_REQUESTS_PER_MINUTE,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[io]
input_path = "people.csv"
output_path = "out/people_enriched.csv"

[api]
api_key = "secret"
enrich_endpoint = "https://api.example.com/enrich"
redeem_endpoint = "https://api.example.com/redeem"
request_timeout_seconds = 30

[limits]
concurrency = 8
batch_size = 10
max_requests_per_minute = 120
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input_path(), "people.csv");
        assert_eq!(config.output_path(), "out/people_enriched.csv");
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.enrich_endpoint(), "https://api.example.com/enrich");
        assert_eq!(config.concurrency(), 8);
        assert_eq!(config.batch_size(), 10);
        assert_eq!(config.max_requests_per_minute(), 120);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[api]\napi_key = \"k\"\n").unwrap();

        assert_eq!(config.input_path(), DEFAULT_INPUT_PATH);
        assert_eq!(config.enrich_endpoint(), DEFAULT_ENRICH_ENDPOINT);
        assert_eq!(config.redeem_endpoint(), DEFAULT_REDEEM_ENDPOINT);
        assert_eq!(config.concurrency(), 20);
        assert_eq!(config.batch_size(), 20);
        assert_eq!(config.max_requests_per_minute(), 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PROFILE_ENRICHER_TEST_KEY", "from-env");

        let config =
            TomlConfig::from_toml_str("[api]\napi_key = \"${PROFILE_ENRICHER_TEST_KEY}\"\n")
                .unwrap();
        assert_eq!(config.api_key(), Some("from-env"));

        std::env::remove_var("PROFILE_ENRICHER_TEST_KEY");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let config =
            TomlConfig::from_toml_str("[api]\napi_key = \"${PROFILE_ENRICHER_UNSET_VAR}\"\n")
                .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let config = TomlConfig::from_toml_str(
            "[api]\napi_key = \"k\"\nenrich_endpoint = \"invalid-url\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config =
            TomlConfig::from_toml_str("[api]\napi_key = \"k\"\n[limits]\nbatch_size = 0\n")
                .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            "[api]\napi_key = \"k\"\n[limits]\nmax_requests_per_minute = 9223372036854775807\n",
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { field, .. })
                if field == "limits.max_requests_per_minute"
        ));
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        assert!(matches!(
            TomlConfig::from_toml_str("[api\napi_key = 1"),
            Err(EtlError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[io]\ninput_path = \"file.csv\"\n\n[api]\napi_key = \"k\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "file.csv");
    }
}
