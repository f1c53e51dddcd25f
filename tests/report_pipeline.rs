//! End-to-end composition: raw provider records in, card payload out.
//! No network; fixtures mirror the providers' payload shapes.

use chrono::Utc;
use serde_json::json;
use solbot::config::{Config, RankingPolicy};
use solbot::models::{collect_normalized, NormalizedPair, RawDexPair};
use solbot::report::{compose, MarketSnapshot};

fn raw_pair(symbol: &str, address: &str, change_24h: f64, created_at: Option<i64>) -> RawDexPair {
    serde_json::from_value(json!({
        "chainId": "solana",
        "dexId": "raydium",
        "pairAddress": address,
        "baseToken": {"symbol": symbol, "name": symbol, "address": "mint"},
        "quoteToken": {"symbol": "SOL", "name": "Wrapped SOL", "address": "So1111"},
        "priceUsd": "0.000123",
        "marketCap": 1500000.0,
        "volume": {"h24": 250000.0},
        "priceChange": {"h24": change_24h},
        "pairCreatedAt": created_at,
    }))
    .unwrap()
}

fn snapshot() -> MarketSnapshot {
    let now_ms = Utc::now().timestamp_millis();
    let trending: Vec<RawDexPair> = vec![
        raw_pair("$WIF", "trend1", -37.14, None),
        raw_pair("BONK", "trend2", 12.5, Some(now_ms - 2 * 60 * 60 * 1000)),
    ];
    let gainers: Vec<RawDexPair> = (0..7)
        .map(|i| raw_pair(&format!("G{}", i), &format!("gain{}", i), 100.0 - i as f64, None))
        .collect();
    let newest: Vec<RawDexPair> = vec![raw_pair(
        "FRESH",
        "new1",
        3.0,
        Some(now_ms - 30 * 60 * 1000),
    )];

    MarketSnapshot {
        sol_usd: Some(150.0),
        trending: collect_normalized("trending", &trending, NormalizedPair::from_dexscreener),
        metadata: Vec::new(),
        gainers: collect_normalized("gainers", &gainers, NormalizedPair::from_dexscreener),
        newest: collect_normalized("newest", &newest, NormalizedPair::from_dexscreener),
        dex_names: Default::default(),
    }
}

#[test]
fn full_report_renders_every_section_and_the_status_line() {
    let mut config = Config::default();
    config.report.gainers_max = 5;
    let document = compose(&snapshot(), &config.report, Utc::now());

    let header = serde_json::to_string(&document.header).unwrap();
    assert!(header.contains("Sol Bot Daily"));
    assert!(header.contains("wathet"));

    let rendered = serde_json::to_string(&document.elements).unwrap();
    assert!(rendered.contains("Trending Dex Pairs"));
    assert!(rendered.contains("Top Gainers"));
    assert!(rendered.contains("Latest Pools"));

    // Reference price 150.0 puts SOL a 1000/150 = 6.7x from 1000.
    assert!(rendered.contains("6.7x"));
    assert!(rendered.contains("$150.00"));

    // Ranked and truncated: 5 of 7 gainers, medals on the podium.
    assert!(rendered.contains("🥇"));
    assert!(rendered.contains("🥉"));
    assert!(rendered.contains("G4 / SOL"));
    assert!(!rendered.contains("G5 / SOL"));

    // Pairs younger than a day carry the annotation.
    assert!(rendered.contains("FRESH / SOL 🆕"));
    assert!(rendered.contains("BONK / SOL 🆕"));
    assert!(rendered.contains("$WIF / SOL"));
    assert!(!rendered.contains("$WIF / SOL 🆕"));

    // Sub-unit prices keep their significant digits.
    assert!(rendered.contains("0.000123"));
}

#[test]
fn card_payload_nesting_matches_the_webhook_contract() {
    let document = compose(&snapshot(), &Config::default().report, Utc::now());

    assert_eq!(document.header["title"]["tag"], "markdown");
    let table = document
        .elements
        .iter()
        .find(|e| e["tag"] == "column_set")
        .expect("at least one tabular element");
    assert_eq!(table["flex_mode"], "none");
    assert_eq!(table["background_style"], "default");
    assert_eq!(table["horizontal_spacing"], "default");
    let column = &table["columns"][0];
    assert_eq!(column["tag"], "column");
    assert_eq!(column["width"], "weighted");
    assert_eq!(column["weight"], 1);
    assert_eq!(column["elements"][0]["tag"], "markdown");
}

#[test]
fn one_malformed_record_never_drops_its_batch() {
    let mut records = vec![raw_pair("OK1", "a", 1.0, None)];
    records.push(serde_json::from_value(json!({"chainId": "solana"})).unwrap());
    records.push(raw_pair("OK2", "b", 2.0, None));

    let pairs = collect_normalized("batch", &records, NormalizedPair::from_dexscreener);
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].base_symbol, "OK1");
    assert_eq!(pairs[1].base_symbol, "OK2");
}

#[test]
fn legacy_reranking_is_available_behind_config() {
    let mut config = Config::default();
    config.report.ranking_policy = RankingPolicy::PercentChange24h;

    let mut snap = snapshot();
    // Legacy path draws gainers from the metadata snapshot.
    snap.metadata = vec![
        {
            let mut p = snap.gainers[3].clone();
            p.price_change.h24 = Some(1.0);
            p
        },
        {
            let mut p = snap.gainers[0].clone();
            p.price_change.h24 = Some(900.0);
            p
        },
    ];
    let document = compose(&snap, &config.report, Utc::now());
    let rendered = serde_json::to_string(&document.elements).unwrap();
    let top = rendered.find("G0 / SOL").unwrap();
    let second = rendered.find("G3 / SOL").unwrap();
    assert!(top < second);
}
