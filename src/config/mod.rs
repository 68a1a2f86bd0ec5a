pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::{error::Result, validation::*};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::time::Duration;

pub const DEFAULT_ENRICH_ENDPOINT: &str = "https://app.cognism.com/api/search/contact/enrich";
pub const DEFAULT_REDEEM_ENDPOINT: &str = "https://app.cognism.com/api/search/contact/redeem";
pub const DEFAULT_INPUT_PATH: &str = "linkedin-urls.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "linkedin-urls_enriched.csv";
pub const API_KEY_ENV: &str = "ENRICH_API_KEY";

pub const MAX_CONCURRENCY: usize = 200;
pub const MAX_BATCH_SIZE: usize = 1000;
pub const MAX_REQUESTS_PER_MINUTE: usize = 100_000;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "profile-enricher")]
#[command(about = "Enrich profile URLs through a contact API and write a flat CSV report")]
pub struct CliConfig {
    /// Input CSV with a `linkedinurl` column
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    pub input: String,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: String,

    /// Bearer token for the contact API (falls back to ENRICH_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_ENRICH_ENDPOINT)]
    pub enrich_endpoint: String,

    #[arg(long, default_value = DEFAULT_REDEEM_ENDPOINT)]
    pub redeem_endpoint: String,

    /// Concurrent enrichment workers
    #[arg(long, default_value = "20")]
    pub concurrency: usize,

    /// Redemption tokens per redeem call
    #[arg(long, default_value = "20")]
    pub batch_size: usize,

    /// Maximum requests in any trailing 60 seconds
    #[arg(long, default_value = "250")]
    pub rate_limit: usize,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Load settings from a TOML file instead of flags
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Fills `api_key` from the environment when no flag was given.
    pub fn with_env_fallback(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn enrich_endpoint(&self) -> &str {
        &self.enrich_endpoint
    }

    fn redeem_endpoint(&self) -> &str {
        &self.redeem_endpoint
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn max_requests_per_minute(&self) -> usize {
        self.rate_limit
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_csv_path("input", &self.input)?;
        validate_csv_path("output", &self.output)?;
        let api_key = validate_required_field("api_key", &self.api_key)?;
        validate_non_empty_string("api_key", api_key)?;
        validate_url("enrich_endpoint", &self.enrich_endpoint)?;
        validate_url("redeem_endpoint", &self.redeem_endpoint)?;
        validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY)?;
        validate_range("batch_size", self.batch_size, 1, MAX_BATCH_SIZE)?;
        validate_range("rate_limit", self.rate_limit, 1, MAX_REQUESTS_PER_MINUTE)?;
        if let Some(timeout) = self.timeout {
            validate_range("timeout", timeout, 1, 3600)?;
        }
        Ok(())
    }
}
