//! Normalization of loosely-typed provider records into one internal shape.
//!
//! Every numeric field the provider may omit is an `Option`; absence stays
//! absence and is rendered as a placeholder downstream, never as zero. Bad
//! records are skipped one at a time with a reason, never aborting a batch.

use crate::api::geckoterminal::{GeckoPool, GeckoPoolMeta, GeckoTopGainer};
use crate::error::SkipReason;
use crate::format::percent_str_to_f64;
use chrono::DateTime;
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One raw DexScreener pair record, decoded best-effort.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDexPair {
    pub chain_id: Option<String>,
    pub dex_id: Option<String>,
    pub pair_address: Option<String>,
    pub base_token: Option<RawToken>,
    pub quote_token: Option<RawToken>,
    #[serde(deserialize_with = "string_or_number")]
    pub price_usd: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    pub volume: Buckets,
    pub price_change: Buckets,
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawToken {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Per-window numeric buckets {5m, 1h, 6h, 24h}; any window may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Buckets {
    #[serde(deserialize_with = "lenient_f64")]
    pub m5: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub h1: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub h6: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
}

/// One trading pair at the moment of the fetch, provider-independent.
/// The USD price stays a decimal string: on-chain quotes can carry more
/// significant digits than an f64 holds.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPair {
    pub chain: String,
    pub dex: String,
    pub pair_address: String,
    pub base_symbol: String,
    pub base_name: String,
    pub base_address: String,
    pub quote_symbol: String,
    pub quote_name: String,
    pub quote_address: String,
    pub price_usd: Option<String>,
    pub market_cap: Option<f64>,
    pub volume: Buckets,
    pub price_change: Buckets,
    pub created_at_ms: Option<i64>,
}

impl NormalizedPair {
    /// "BASE / QUOTE", the provider-style pool display name.
    pub fn name(&self) -> String {
        format!("{} / {}", self.base_symbol, self.quote_symbol)
    }

    pub fn from_dexscreener(raw: &RawDexPair) -> Result<Self, SkipReason> {
        let chain = required(&raw.chain_id, "chainId")?;
        let dex = required(&raw.dex_id, "dexId")?;
        let pair_address = required(&raw.pair_address, "pairAddress")?;
        let base = raw
            .base_token
            .as_ref()
            .ok_or(SkipReason::MissingField("baseToken"))?;
        let quote = raw
            .quote_token
            .as_ref()
            .ok_or(SkipReason::MissingField("quoteToken"))?;
        let base_symbol = required(&base.symbol, "baseToken.symbol")?;
        let quote_symbol = required(&quote.symbol, "quoteToken.symbol")?;

        Ok(NormalizedPair {
            chain,
            dex,
            pair_address,
            base_name: base.name.clone().unwrap_or_else(|| base_symbol.clone()),
            base_address: base.address.clone().unwrap_or_default(),
            quote_name: quote.name.clone().unwrap_or_else(|| quote_symbol.clone()),
            quote_address: quote.address.clone().unwrap_or_default(),
            base_symbol,
            quote_symbol,
            price_usd: raw.price_usd.clone(),
            market_cap: raw.market_cap,
            volume: raw.volume,
            price_change: raw.price_change,
            created_at_ms: raw.pair_created_at,
        })
    }

    /// Normalize a v2 pool record (trending or new pools feed).
    pub fn from_gecko_pool(network: &str, pool: &GeckoPool) -> Result<Self, SkipReason> {
        let attrs = &pool.attributes;
        let pair_address = required(&attrs.address, "attributes.address")?;
        let name = required(&attrs.name, "attributes.name")?;
        let (base_symbol, quote_symbol) = split_pool_name(&name)?;
        let dex = relationship_id(&pool.relationships.dex, "relationships.dex")?;

        Ok(NormalizedPair {
            chain: network.to_string(),
            dex,
            pair_address,
            base_name: base_symbol.clone(),
            base_address: token_address(network, &pool.relationships.base_token),
            quote_name: quote_symbol.clone(),
            quote_address: token_address(network, &pool.relationships.quote_token),
            base_symbol,
            quote_symbol,
            price_usd: attrs.base_token_price_usd.clone(),
            market_cap: parse_opt(&attrs.fdv_usd).or(parse_opt(&attrs.market_cap_usd)),
            volume: Buckets {
                m5: parse_opt(&attrs.volume_usd.m5),
                h1: parse_opt(&attrs.volume_usd.h1),
                h6: parse_opt(&attrs.volume_usd.h6),
                h24: parse_opt(&attrs.volume_usd.h24),
            },
            price_change: Buckets {
                m5: parse_opt(&attrs.price_change_percentage.m5),
                h1: parse_opt(&attrs.price_change_percentage.h1),
                h6: parse_opt(&attrs.price_change_percentage.h6),
                h24: parse_opt(&attrs.price_change_percentage.h24),
            },
            created_at_ms: parse_rfc3339_ms(&attrs.pool_created_at),
        })
    }

    /// Normalize a p1 metadata record. Volumes are not broken out per
    /// window on this feed, so every volume bucket stays absent.
    pub fn from_gecko_meta(network: &str, meta: &GeckoPoolMeta) -> Result<Self, SkipReason> {
        let attrs = &meta.attributes;
        let pair_address = required(&attrs.address, "attributes.address")?;
        let name = required(&attrs.name, "attributes.name")?;
        let (base_symbol, quote_symbol) = split_pool_name(&name)?;
        let dex = relationship_id(&meta.relationships.dex, "relationships.dex")?;
        let changes = &attrs.price_percent_changes;

        Ok(NormalizedPair {
            chain: network.to_string(),
            dex,
            pair_address,
            base_name: base_symbol.clone(),
            base_address: String::new(),
            quote_name: quote_symbol.clone(),
            quote_address: String::new(),
            base_symbol,
            quote_symbol,
            price_usd: attrs.price_in_usd.clone(),
            market_cap: None,
            volume: Buckets::default(),
            price_change: Buckets {
                m5: changes.last_5m.as_deref().and_then(percent_str_to_f64),
                h1: changes.last_1h.as_deref().and_then(percent_str_to_f64),
                h6: changes.last_6h.as_deref().and_then(percent_str_to_f64),
                h24: changes
                    .last_24h
                    .as_deref()
                    .or(attrs.price_percent_change.as_deref())
                    .and_then(percent_str_to_f64),
            },
            created_at_ms: parse_rfc3339_ms(&attrs.pool_created_at),
        })
    }

    /// Normalize a p1 top-gainers record.
    pub fn from_gecko_gainer(network: &str, gainer: &GeckoTopGainer) -> Result<Self, SkipReason> {
        let pair_address = required(&gainer.address, "address")?;
        let base = gainer
            .tokens
            .iter()
            .find(|t| t.is_base_token)
            .ok_or(SkipReason::MissingField("tokens[is_base_token]"))?;
        let quote = gainer
            .tokens
            .iter()
            .find(|t| !t.is_base_token)
            .ok_or(SkipReason::MissingField("tokens[!is_base_token]"))?;
        let base_symbol = required(&base.symbol, "tokens.symbol")?;
        let quote_symbol = required(&quote.symbol, "tokens.symbol")?;
        let dex = gainer
            .dex
            .as_ref()
            .and_then(|d| d.name.clone().or_else(|| d.identifier.clone()))
            .ok_or(SkipReason::MissingField("dex"))?;
        let chain = gainer
            .network
            .as_ref()
            .and_then(|n| n.identifier.clone())
            .unwrap_or_else(|| network.to_string());

        Ok(NormalizedPair {
            chain,
            dex,
            pair_address,
            base_name: base.name.clone().unwrap_or_else(|| base_symbol.clone()),
            base_address: String::new(),
            quote_name: quote.name.clone().unwrap_or_else(|| quote_symbol.clone()),
            quote_address: String::new(),
            base_symbol,
            quote_symbol,
            price_usd: gainer.price_in_usd.clone(),
            market_cap: None,
            volume: Buckets::default(),
            price_change: Buckets {
                h24: gainer.price_percent_change,
                ..Buckets::default()
            },
            created_at_ms: None,
        })
    }
}

/// Normalize a whole batch, skipping bad records. Skips are aggregated and
/// logged once per batch rather than per record.
pub fn collect_normalized<T, F>(label: &str, records: &[T], normalize: F) -> Vec<NormalizedPair>
where
    F: Fn(&T) -> Result<NormalizedPair, SkipReason>,
{
    let mut pairs = Vec::with_capacity(records.len());
    let mut skips: Vec<SkipReason> = Vec::new();
    for record in records {
        match normalize(record) {
            Ok(pair) => pairs.push(pair),
            Err(reason) => skips.push(reason),
        }
    }
    if !skips.is_empty() {
        warn!(
            "[{}] skipped {} of {} records (first: {})",
            label,
            skips.len(),
            records.len(),
            skips[0]
        );
    }
    pairs
}

fn required(field: &Option<String>, name: &'static str) -> Result<String, SkipReason> {
    field
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(SkipReason::MissingField(name))
}

fn split_pool_name(name: &str) -> Result<(String, String), SkipReason> {
    match name.split_once(" / ") {
        Some((base, quote)) => Ok((base.to_string(), quote.to_string())),
        None => Err(SkipReason::BadField(
            "attributes.name",
            format!("no pair separator in {:?}", name),
        )),
    }
}

fn relationship_id(
    rel: &crate::api::geckoterminal::GeckoRelationship,
    name: &'static str,
) -> Result<String, SkipReason> {
    rel.data
        .as_ref()
        .and_then(|d| d.id.clone())
        .ok_or(SkipReason::MissingField(name))
}

/// Token relationship ids look like "solana_<mint>"; strip the network
/// prefix to recover the on-chain address.
fn token_address(network: &str, rel: &crate::api::geckoterminal::GeckoRelationship) -> String {
    rel.data
        .as_ref()
        .and_then(|d| d.id.as_deref())
        .map(|id| {
            id.strip_prefix(&format!("{}_", network))
                .unwrap_or(id)
                .to_string()
        })
        .unwrap_or_default()
}

fn parse_opt(value: &Option<String>) -> Option<f64> {
    value.as_deref().and_then(|s| s.trim().parse::<f64>().ok())
}

fn parse_rfc3339_ms(value: &Option<String>) -> Option<i64> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis())
}

/// Accept a JSON string or number as an optional string.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a JSON number or numeric string as an optional f64.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
