//! GeckoTerminal market-data client.
//!
//! Two API surfaces: the public v2 REST API for trending/new pools, and the
//! undocumented app "p1" API for per-pool metadata and the top-gainers feed.
//! Every field that the provider may omit is an explicit `Option`.

use crate::api::retry_list;
use crate::error::{Error, Result};
use log::warn;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

const API_BASE_URL: &str = "https://api.geckoterminal.com/api/v2";
const APP_BASE_URL: &str = "https://app.geckoterminal.com/api/p1";
const NEXT_DATA_URL: &str = "https://www.geckoterminal.com/_next/data";
// Build token baked into the pools.json next-data route.
const NEXT_DATA_BUILD: &str = "Y70mCqdkb4Cl4BOTSPUGV";

#[derive(Debug, Deserialize)]
struct GeckoEnvelope<T> {
    data: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoPool {
    pub id: Option<String>,
    pub attributes: GeckoPoolAttributes,
    pub relationships: GeckoRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoPoolAttributes {
    pub address: Option<String>,
    pub name: Option<String>,
    pub base_token_price_usd: Option<String>,
    pub quote_token_price_usd: Option<String>,
    pub fdv_usd: Option<String>,
    pub market_cap_usd: Option<String>,
    pub pool_created_at: Option<String>,
    pub reserve_in_usd: Option<String>,
    pub price_change_percentage: GeckoPercentBuckets,
    pub volume_usd: GeckoVolumeBuckets,
}

/// Percent-change strings keyed by window ("m5", "h1", "h6", "h24").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoPercentBuckets {
    pub m5: Option<String>,
    pub h1: Option<String>,
    pub h6: Option<String>,
    pub h24: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoVolumeBuckets {
    pub m5: Option<String>,
    pub h1: Option<String>,
    pub h6: Option<String>,
    pub h24: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoRelationships {
    pub dex: GeckoRelationship,
    pub base_token: GeckoRelationship,
    pub quote_token: GeckoRelationship,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoRelationship {
    pub data: Option<GeckoRelationshipData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoRelationshipData {
    pub id: Option<String>,
}

/// One entry of the p1 per-pool metadata feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoPoolMeta {
    pub id: Option<String>,
    pub attributes: GeckoPoolMetaAttributes,
    pub relationships: GeckoRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoPoolMetaAttributes {
    pub address: Option<String>,
    pub name: Option<String>,
    pub price_in_usd: Option<String>,
    pub price_percent_change: Option<String>,
    pub price_percent_changes: GeckoMetaPercentChanges,
    pub swap_count_24h: Option<i64>,
    pub reserve_in_usd: Option<String>,
    pub pool_created_at: Option<String>,
}

/// Percent-change strings ("+750.66%", "-20.57%", "0%") per lookback window.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoMetaPercentChanges {
    pub last_5m: Option<String>,
    pub last_1h: Option<String>,
    pub last_6h: Option<String>,
    pub last_24h: Option<String>,
}

/// One entry of the p1 trends top-gainers feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoTopGainer {
    pub address: Option<String>,
    pub price_in_usd: Option<String>,
    pub price_percent_change: Option<f64>,
    pub network: Option<GeckoNamedRef>,
    pub dex: Option<GeckoNamedRef>,
    pub tokens: Vec<GeckoGainerToken>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoNamedRef {
    pub name: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeckoGainerToken {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub is_base_token: bool,
}

#[derive(Debug, Deserialize)]
struct GeckoTrends {
    attributes: GeckoTrendsAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeckoTrendsAttributes {
    top_gainers_pairs: Vec<GeckoTopGainer>,
}

#[derive(Debug, Deserialize)]
struct NextData {
    #[serde(rename = "pageProps")]
    page_props: NextDataPageProps,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NextDataPageProps {
    dexes: Vec<GeckoDex>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GeckoDex {
    id: Option<String>,
    attributes: GeckoDexAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GeckoDexAttributes {
    name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeckoTerminalClient {
    client: Client,
    attempts: u32,
}

impl GeckoTerminalClient {
    pub fn new(client: Client, attempts: u32) -> Self {
        Self { client, attempts }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiError(format!("{} returned {}", url, status)));
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn get_network_trending_pools(&self, network: &str) -> Vec<GeckoPool> {
        let url = format!("{}/networks/{}/trending_pools", API_BASE_URL, network);
        retry_list("geckoterminal.trending_pools", self.attempts, || async {
            Ok(self
                .get_json::<GeckoEnvelope<Vec<GeckoPool>>>(&url)
                .await?
                .data)
        })
        .await
    }

    pub async fn get_network_new_pools(&self, network: &str) -> Vec<GeckoPool> {
        let url = format!("{}/networks/{}/new_pools", API_BASE_URL, network);
        retry_list("geckoterminal.new_pools", self.attempts, || async {
            Ok(self
                .get_json::<GeckoEnvelope<Vec<GeckoPool>>>(&url)
                .await?
                .data)
        })
        .await
    }

    pub async fn get_network_pools_metadata(&self, network: &str) -> Vec<GeckoPoolMeta> {
        let url = format!("{}/{}/pools", APP_BASE_URL, network);
        retry_list("geckoterminal.pools_metadata", self.attempts, || async {
            Ok(self
                .get_json::<GeckoEnvelope<Vec<GeckoPoolMeta>>>(&url)
                .await?
                .data)
        })
        .await
    }

    pub async fn get_network_top_gainers(&self, network: &str) -> Vec<GeckoTopGainer> {
        let url = format!("{}/trends?network={}", APP_BASE_URL, network);
        retry_list("geckoterminal.top_gainers", self.attempts, || async {
            Ok(self
                .get_json::<GeckoEnvelope<GeckoTrends>>(&url)
                .await?
                .data
                .attributes
                .top_gainers_pairs)
        })
        .await
    }

    /// Numeric dex id → display name, from the site's next-data route. The
    /// map is cosmetic, so lookup failure degrades to an empty map and the
    /// composer falls back to the raw identifier.
    pub async fn get_network_dex_id_map(&self, network: &str) -> HashMap<String, String> {
        let url = format!(
            "{}/{}/en/{}/pools.json?network={}",
            NEXT_DATA_URL, NEXT_DATA_BUILD, network, network
        );
        match self.get_json::<NextData>(&url).await {
            Ok(data) => data
                .page_props
                .dexes
                .into_iter()
                .filter_map(|dex| Some((dex.id?, dex.attributes.name?)))
                .collect(),
            Err(e) => {
                warn!("[geckoterminal.dex_id_map] {}", e);
                HashMap::new()
            }
        }
    }
}
