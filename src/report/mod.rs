//! Report composition: ranked sections, badges, and the card element list.

use crate::config::{RankingPolicy, ReportConfig};
use crate::format::{format_compact, format_money, format_price, percent_tag};
use crate::lark::{self, TableColumn};
use crate::models::{Buckets, NormalizedPair};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

pub const SOLSCAN_URL: &str = "https://solscan.io/account/";

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];
const RECENT_THRESHOLD_MS: i64 = 24 * 60 * 60 * 1000;
const RECENT_BADGE: &str = "🆕";
const PLACEHOLDER: &str = "-";

const TRENDING_TITLE: &str =
    "**Trending Dex Pairs 🔥**\n<font color='grey'>Brought to you by GeckoTerminal</font>";
const GAINERS_TITLE: &str = "**Top Gainers 🚀**";
const NEWEST_TITLE: &str = "**Latest Pools 🔍**";

/// Everything one report pass fetched, already normalized. Lists keep
/// provider order; `metadata` keeps feed order so the legacy re-ranking
/// path can break ties stably.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub sol_usd: Option<f64>,
    pub trending: Vec<NormalizedPair>,
    pub metadata: Vec<NormalizedPair>,
    pub gainers: Vec<NormalizedPair>,
    pub newest: Vec<NormalizedPair>,
    pub dex_names: HashMap<String, String>,
}

/// The rendered report: a card header plus its ordered element list. The
/// only shape that crosses the system boundary.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub header: Value,
    pub elements: Vec<Value>,
}

/// An ordered slice of one ranking criterion, truncated to its maximum.
#[derive(Debug, Clone)]
pub struct RankedSection {
    pub pairs: Vec<NormalizedPair>,
}

impl RankedSection {
    pub fn new(mut pairs: Vec<NormalizedPair>, max: usize) -> Self {
        pairs.truncate(max);
        Self { pairs }
    }

    /// Medal glyph for the podium, plain rank number after.
    pub fn rank_badge(position: usize) -> String {
        MEDALS
            .get(position)
            .map(|m| m.to_string())
            .unwrap_or_else(|| (position + 1).to_string())
    }
}

/// Stable descending sort by 24h percent change; absent changes sink to the
/// bottom, provider order breaks ties.
pub fn rerank_by_change_24h(pairs: &mut [NormalizedPair]) {
    let key = |p: &NormalizedPair| p.price_change.h24.unwrap_or(f64::NEG_INFINITY);
    pairs.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(std::cmp::Ordering::Equal));
}

/// A pair counts as recent only when its creation timestamp is known and
/// under the threshold; an absent timestamp is "not recent".
pub fn is_recent(pair: &NormalizedPair, now_ms: i64) -> bool {
    match pair.created_at_ms {
        Some(created) => now_ms.saturating_sub(created) < RECENT_THRESHOLD_MS,
        None => false,
    }
}

pub fn display_name(pair: &NormalizedPair, now_ms: i64) -> String {
    if is_recent(pair, now_ms) {
        format!("{} {}", pair.name(), RECENT_BADGE)
    } else {
        pair.name()
    }
}

pub fn compose(snapshot: &MarketSnapshot, cfg: &ReportConfig, now: DateTime<Utc>) -> ReportDocument {
    let now_ms = now.timestamp_millis();
    let header = lark::header_element(
        &format!("Sol Bot Daily - {}", now.format("%d %B %Y")),
        "wathet",
    );
    let meta_map: HashMap<&str, &NormalizedPair> = snapshot
        .metadata
        .iter()
        .map(|p| (p.pair_address.as_str(), p))
        .collect();

    let mut elements = vec![lark::markdown_element(TRENDING_TITLE)];

    // Metadata filtering happens before truncation: pools the metadata feed
    // does not know are dropped, not rendered partially.
    let filtered: Vec<NormalizedPair> = snapshot
        .trending
        .iter()
        .filter(|p| meta_map.is_empty() || meta_map.contains_key(p.pair_address.as_str()))
        .cloned()
        .collect();
    let trending = RankedSection::new(filtered, cfg.trending_max);
    for (position, pair) in trending.pairs.iter().enumerate() {
        let changes = meta_map
            .get(pair.pair_address.as_str())
            .map(|m| m.price_change)
            .unwrap_or(pair.price_change);
        elements.push(lark::markdown_element(&pool_info_block(
            position,
            pair,
            &snapshot.dex_names,
            now_ms,
        )));
        if let Some(table) = percent_change_table(&changes) {
            elements.push(table);
        }
    }
    elements.push(lark::hr_element());

    elements.push(lark::markdown_element(GAINERS_TITLE));
    let ranked_gainers = match cfg.ranking_policy {
        RankingPolicy::ProviderOrder => snapshot.gainers.clone(),
        RankingPolicy::PercentChange24h => {
            let mut pool = snapshot.metadata.clone();
            rerank_by_change_24h(&mut pool);
            pool
        }
    };
    let gainers = RankedSection::new(ranked_gainers, cfg.gainers_max);
    if let Some(table) = gainers_table(&gainers, &snapshot.dex_names, now_ms) {
        elements.push(table);
    }
    elements.push(lark::hr_element());

    let newest = RankedSection::new(snapshot.newest.clone(), cfg.newest_max);
    if !newest.pairs.is_empty() {
        elements.push(lark::markdown_element(NEWEST_TITLE));
        if let Some(table) = newest_table(&newest, &snapshot.dex_names, now_ms) {
            elements.push(table);
        }
        elements.push(lark::hr_element());
    }

    if let Some(sol_usd) = snapshot.sol_usd {
        elements.push(lark::markdown_element(&status_line(sol_usd)));
    }

    ReportDocument { header, elements }
}

fn pool_info_block(
    position: usize,
    pair: &NormalizedPair,
    dex_names: &HashMap<String, String>,
    now_ms: i64,
) -> String {
    let lines = [
        format!(
            "**{}: [{}]({}{})**",
            RankedSection::rank_badge(position),
            display_name(pair, now_ms),
            SOLSCAN_URL,
            pair.pair_address
        ),
        format!("**Dex**: {}", dex_display(pair, dex_names)),
        format!(
            "**Vol24h**: {}",
            pair.volume
                .h24
                .map(format_money)
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
        format!(
            "**FDV**: {}",
            pair.market_cap
                .map(|v| format!("${}", format_compact(v)))
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
        format!(
            "**{}-USD**: {}",
            pair.base_symbol,
            pair.price_usd
                .as_deref()
                .map(|p| format!("${}", format_price(p)))
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
    ];
    lines.join("\n")
}

fn percent_change_table(changes: &Buckets) -> Option<Value> {
    lark::table_element(&[
        TableColumn::new("5m", vec![percent_tag(changes.m5)]),
        TableColumn::new("1h", vec![percent_tag(changes.h1)]),
        TableColumn::new("6h", vec![percent_tag(changes.h6)]),
        TableColumn::new("24h", vec![percent_tag(changes.h24)]),
    ])
}

fn gainers_table(
    section: &RankedSection,
    dex_names: &HashMap<String, String>,
    now_ms: i64,
) -> Option<Value> {
    let pools = section
        .pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            format!(
                "{}: [{}]({}{})",
                RankedSection::rank_badge(i),
                display_name(pair, now_ms),
                SOLSCAN_URL,
                pair.pair_address
            )
        })
        .collect();
    let dexes = section
        .pairs
        .iter()
        .map(|pair| dex_display(pair, dex_names))
        .collect();
    let changes = section
        .pairs
        .iter()
        .map(|pair| percent_tag(pair.price_change.h24))
        .collect();
    lark::table_element(&[
        TableColumn::new("Pool", pools),
        TableColumn::new("Dex", dexes),
        TableColumn::new("24h", changes),
    ])
}

fn newest_table(
    section: &RankedSection,
    dex_names: &HashMap<String, String>,
    now_ms: i64,
) -> Option<Value> {
    let pools = section
        .pairs
        .iter()
        .map(|pair| {
            format!(
                "[{}]({}{})",
                display_name(pair, now_ms),
                SOLSCAN_URL,
                pair.pair_address
            )
        })
        .collect();
    let dexes = section
        .pairs
        .iter()
        .map(|pair| dex_display(pair, dex_names))
        .collect();
    lark::table_element(&[TableColumn::new("Pool", pools), TableColumn::new("Dex", dexes)])
}

fn dex_display(pair: &NormalizedPair, dex_names: &HashMap<String, String>) -> String {
    dex_names
        .get(&pair.dex)
        .cloned()
        .unwrap_or_else(|| title_case(&pair.dex))
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn status_line(sol_usd: f64) -> String {
    format!(
        "*P.S. SOL ({}) is but a {:.1}x away from 1000🔥*",
        format_money(sol_usd),
        1000.0 / sol_usd
    )
}
