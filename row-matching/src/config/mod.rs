//! Configuration module for row-matching.

use crate::services::candidate_query::DEFAULT_PAGE_SIZE;
use recon_core::config as core_config;
use recon_core::error::AppError;
use recon_core::http::RetryConfig;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub api: ApiConfig,
    pub dialog: DialogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub url: String,
    pub token: Option<SecretString>,
    pub lookup_max_retries: u32,
}

impl ApiConfig {
    pub fn lookup_retry(&self) -> RetryConfig {
        RetryConfig::with_max_retries(self.lookup_max_retries)
    }
}

#[derive(Debug, Clone)]
pub struct DialogConfig {
    pub page_size: u32,
    /// Close the dialog even when linking an already paid order fails.
    pub close_on_link_failure: bool,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            close_on_link_failure: true,
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "row-matching".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            api: ApiConfig {
                url: env::var("GRAPHQL_API_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("GRAPHQL_API_URL is required"))
                })?,
                token: env::var("GRAPHQL_API_TOKEN").ok().map(SecretString::new),
                lookup_max_retries: env::var("LOOKUP_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            dialog: DialogConfig {
                page_size: env::var("CANDIDATE_PAGE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &u32| *n > 0)
                    .unwrap_or(DEFAULT_PAGE_SIZE),
                close_on_link_failure: env::var("CLOSE_ON_LINK_FAILURE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.common.http_timeout_secs)
    }
}
