//! One report pass: fan out the fetches, normalize, compose, deliver.

use crate::api::dexscreener::DexScreenerClient;
use crate::api::geckoterminal::GeckoTerminalClient;
use crate::api::{self, ticker};
use crate::config::{Config, Provider, ReportConfig, Secrets};
use crate::error::Result;
use crate::lark::LarkClient;
use crate::models::{collect_normalized, NormalizedPair};
use crate::report::{self, MarketSnapshot};
use chrono::Utc;
use log::{info, warn};
use std::collections::HashMap;
use std::time::Duration;

/// Fetch everything one report needs. The queries run concurrently and are
/// independent: a failed or empty query degrades its own section only.
/// Only a missing reference price is surfaced as `None` here; ranked lists
/// degrade to empty inside the clients.
pub async fn gather_snapshot(cfg: &ReportConfig) -> Result<MarketSnapshot> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let client = api::http_client(timeout)?;
    let network = cfg.network.as_str();

    match cfg.provider {
        Provider::GeckoTerminal => {
            let gecko = GeckoTerminalClient::new(client.clone(), cfg.query_attempts);
            let (sol_usd, trending, metadata, gainers, newest, dex_names) = tokio::join!(
                ticker::get_sol_usd_price(&client),
                gecko.get_network_trending_pools(network),
                gecko.get_network_pools_metadata(network),
                gecko.get_network_top_gainers(network),
                gecko.get_network_new_pools(network),
                gecko.get_network_dex_id_map(network),
            );
            Ok(MarketSnapshot {
                sol_usd: price_or_none(sol_usd),
                trending: collect_normalized("trending_pools", &trending, |p| {
                    NormalizedPair::from_gecko_pool(network, p)
                }),
                metadata: collect_normalized("pools_metadata", &metadata, |m| {
                    NormalizedPair::from_gecko_meta(network, m)
                }),
                gainers: collect_normalized("top_gainers", &gainers, |g| {
                    NormalizedPair::from_gecko_gainer(network, g)
                }),
                newest: collect_normalized("new_pools", &newest, |p| {
                    NormalizedPair::from_gecko_pool(network, p)
                }),
                dex_names,
            })
        }
        Provider::DexScreener => {
            let screener = DexScreenerClient::new(cfg.query_attempts, timeout);
            let chain = Some(network);
            let (sol_usd, trending, gainers, newest) = tokio::join!(
                ticker::get_sol_usd_price(&client),
                screener.get_trending_pairs(chain),
                screener.get_top_gaining_pairs(chain),
                screener.get_newest_pairs(chain),
            );
            Ok(MarketSnapshot {
                sol_usd: price_or_none(sol_usd),
                trending: collect_normalized(
                    "trending_pairs",
                    &trending,
                    NormalizedPair::from_dexscreener,
                ),
                metadata: Vec::new(),
                gainers: collect_normalized(
                    "gaining_pairs",
                    &gainers,
                    NormalizedPair::from_dexscreener,
                ),
                newest: collect_normalized(
                    "newest_pairs",
                    &newest,
                    NormalizedPair::from_dexscreener,
                ),
                dex_names: HashMap::new(),
            })
        }
    }
}

fn price_or_none(price: Result<f64>) -> Option<f64> {
    match price {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("[ticker] reference price unavailable: {}", e);
            None
        }
    }
}

/// Build and deliver one report. Delivery failure propagates to the outer
/// retry harness in main.
pub async fn run_report(config: &Config, secrets: &Secrets) -> Result<()> {
    let snapshot = gather_snapshot(&config.report).await?;
    info!(
        "snapshot gathered: {} trending, {} gainers, {} newest, price {}",
        snapshot.trending.len(),
        snapshot.gainers.len(),
        snapshot.newest.len(),
        if snapshot.sol_usd.is_some() { "ok" } else { "missing" },
    );

    let document = report::compose(&snapshot, &config.report, Utc::now());
    let client = api::http_client(Duration::from_secs(config.report.request_timeout_secs))?;
    let lark = LarkClient::new(client, &secrets.lark_key);
    lark.send_card(&document).await
}
