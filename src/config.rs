// src/config.rs
//! Process configuration from the environment (`.env` honored in dev). A
//! missing credential disables the adapter that needs it instead of aborting
//! startup — the remaining sources keep the pipeline useful.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const ENV_DART_API_KEY: &str = "DART_API_KEY";
pub const ENV_NAVER_CLIENT_ID: &str = "NAVER_CLIENT_ID";
pub const ENV_NAVER_CLIENT_SECRET: &str = "NAVER_CLIENT_SECRET";
pub const ENV_KIS_BASE_URL: &str = "KIS_BASE_URL";
pub const ENV_KIS_APP_KEY: &str = "KIS_APP_KEY";
pub const ENV_KIS_APP_SECRET: &str = "KIS_APP_SECRET";
pub const ENV_SYMBOL_MASTER_PATH: &str = "SYMBOL_MASTER_PATH";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

pub const DEFAULT_SYMBOL_MASTER_PATH: &str = "config/symbol_master.json";
pub const DEFAULT_KIS_BASE_URL: &str = "https://openapi.koreainvestment.com:9443";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct DisclosureCfg {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct SearchCfg {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct BrokerCfg {
    pub base_url: String,
    pub app_key: String,
    pub app_secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` disables the disclosure adapter.
    pub disclosure: Option<DisclosureCfg>,
    /// `None` disables the keyword-search adapter.
    pub search: Option<SearchCfg>,
    /// `None` disables the authenticated broker feed.
    pub broker: Option<BrokerCfg>,
    pub symbol_master_path: PathBuf,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed_secs(var: &str, default: u64) -> u64 {
    non_empty(var)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let disclosure = non_empty(ENV_DART_API_KEY).map(|api_key| DisclosureCfg { api_key });

        let search = match (non_empty(ENV_NAVER_CLIENT_ID), non_empty(ENV_NAVER_CLIENT_SECRET)) {
            (Some(client_id), Some(client_secret)) => Some(SearchCfg {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let broker = match (non_empty(ENV_KIS_APP_KEY), non_empty(ENV_KIS_APP_SECRET)) {
            (Some(app_key), Some(app_secret)) => Some(BrokerCfg {
                base_url: non_empty(ENV_KIS_BASE_URL)
                    .unwrap_or_else(|| DEFAULT_KIS_BASE_URL.to_string()),
                app_key,
                app_secret,
            }),
            _ => None,
        };

        Ok(Self {
            disclosure,
            search,
            broker,
            symbol_master_path: PathBuf::from(
                non_empty(ENV_SYMBOL_MASTER_PATH)
                    .unwrap_or_else(|| DEFAULT_SYMBOL_MASTER_PATH.to_string()),
            ),
            poll_interval: Duration::from_secs(parsed_secs(
                ENV_POLL_INTERVAL_SECS,
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            http_timeout: Duration::from_secs(parsed_secs(
                ENV_HTTP_TIMEOUT_SECS,
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        })
    }

    /// Shared HTTP client with the configured request timeout. A stuck
    /// upstream call must end in a fetch error, never hold a cycle open.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .context("building http client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[serial]
    #[test]
    fn missing_secrets_disable_adapters() {
        for var in [
            ENV_DART_API_KEY,
            ENV_NAVER_CLIENT_ID,
            ENV_NAVER_CLIENT_SECRET,
            ENV_KIS_APP_KEY,
            ENV_KIS_APP_SECRET,
        ] {
            std::env::remove_var(var);
        }
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.disclosure.is_none());
        assert!(cfg.search.is_none());
        assert!(cfg.broker.is_none());
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
    }

    #[serial]
    #[test]
    fn paired_secrets_enable_adapters() {
        std::env::set_var(ENV_NAVER_CLIENT_ID, "id");
        std::env::set_var(ENV_NAVER_CLIENT_SECRET, "secret");
        std::env::set_var(ENV_KIS_APP_KEY, "key");
        std::env::remove_var(ENV_KIS_APP_SECRET);
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.search.is_some());
        // One half of a credential pair is not enough.
        assert!(cfg.broker.is_none());
        std::env::remove_var(ENV_NAVER_CLIENT_ID);
        std::env::remove_var(ENV_NAVER_CLIENT_SECRET);
        std::env::remove_var(ENV_KIS_APP_KEY);
    }
}
