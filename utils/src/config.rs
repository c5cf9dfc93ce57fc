use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{coingecko::DEFAULT_API_URL, disk_storage::DiskStorageInterface};

/// Which history response is applied when requests overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePolicy {
    /// Only the most recently issued request may update the view.
    #[default]
    LatestIssued,
    /// Whichever response arrives last wins.
    LastResolved,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON-RPC endpoint used for balances. Without it the wallet capability is absent.
    pub rpc_url: Option<String>,
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    pub http_timeout_secs: Option<u64>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub response_policy: ResponsePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            price_api_url: default_price_api_url(),
            vs_currency: default_vs_currency(),
            http_timeout_secs: None,
            log_filter: default_log_filter(),
            response_policy: ResponsePolicy::default(),
        }
    }
}

fn default_price_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
}

impl Config {
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir()
            .join("chainwatch-config-missing")
            .join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.price_api_url, DEFAULT_API_URL);
        assert_eq!(config.response_policy, ResponsePolicy::LatestIssued);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            rpc_url = "http://localhost:8545"
            response_policy = "last_resolved"
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.vs_currency, "usd");
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.response_policy, ResponsePolicy::LastResolved);
        assert_eq!(config.http_timeout(), None);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("chainwatch-config-{}", std::process::id()))
            .join("config.toml");
        let config = Config {
            rpc_url: Some("http://localhost:8545".to_string()),
            http_timeout_secs: Some(15),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.http_timeout(), Some(Duration::from_secs(15)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
