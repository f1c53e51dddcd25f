use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

/// Tunables for one report run. Everything has a default so the job can run
/// with no config file at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Chain identifier the report covers.
    pub network: String,
    /// Which market-data provider feeds the ranked sections.
    pub provider: Provider,
    /// Ordering policy for the top-gainers section.
    pub ranking_policy: RankingPolicy,
    pub trending_max: usize,
    pub gainers_max: usize,
    pub newest_max: usize,
    /// Attempts per ranked query before degrading to an empty section.
    pub query_attempts: u32,
    /// Full report passes before an error report is sent instead.
    pub report_attempts: u32,
    pub request_timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            network: "solana".to_string(),
            provider: Provider::GeckoTerminal,
            ranking_policy: RankingPolicy::ProviderOrder,
            trending_max: 5,
            gainers_max: 10,
            newest_max: 10,
            query_attempts: 5,
            report_attempts: 3,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    GeckoTerminal,
    DexScreener,
}

/// Two gainer orderings coexisted historically: trusting the provider's
/// ranked feed, and re-sorting the metadata snapshot by 24h change. Both
/// stay available behind an explicit switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingPolicy {
    ProviderOrder,
    #[serde(rename = "percent-change-24h")]
    PercentChange24h,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}

/// Webhook keys, read from the environment only. Deliberately not
/// serializable, and Debug shows nothing useful.
#[derive(Clone)]
pub struct Secrets {
    pub lark_key: String,
    pub lark_error_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let lark_key = env::var("LARK_KEY")
            .map_err(|_| Error::ConfigError("LARK_KEY is not set".to_string()))?;
        if lark_key.trim().is_empty() {
            return Err(Error::ConfigError("LARK_KEY is empty".to_string()));
        }
        let lark_error_key = env::var("LARK_ERROR_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            lark_key,
            lark_error_key,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("lark_key", &"<redacted>")
            .field("lark_error_key", &"<redacted>")
            .finish()
    }
}
