//! Reference-price ticker, backed by the Yahoo Finance chart endpoint.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart/";
const SOL_TICKER: &str = "SOL-USD";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

pub async fn get_ticker_price(client: &Client, ticker: &str) -> Result<f64> {
    let response = client
        .get(format!("{}{}", BASE_URL, ticker))
        .query(&[
            ("range", "1m"),
            ("interval", "1d"),
            ("includePrePost", "false"),
            ("events", "div,splits,capitalGains"),
        ])
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::ApiError(format!(
            "ticker {} returned {}",
            ticker, status
        )));
    }
    let chart: ChartResponse = response.json().await?;
    chart
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.meta.regular_market_price)
        .ok_or_else(|| Error::ApiInvalidData(format!("no market price for {}", ticker)))
}

/// USD price of the report's reference asset.
pub async fn get_sol_usd_price(client: &Client) -> Result<f64> {
    get_ticker_price(client, SOL_TICKER).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_payload_yields_market_price() {
        let json = r#"{
            "chart": {
                "result": [{"meta": {"regularMarketPrice": 150.0, "currency": "USD"}}],
                "error": null
            }
        }"#;
        let chart: ChartResponse = serde_json::from_str(json).unwrap();
        let price = chart
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.meta.regular_market_price);
        assert_eq!(price, Some(150.0));
    }

    #[test]
    fn empty_chart_payload_is_absent_not_zero() {
        let json = r#"{"chart": {"result": null, "error": null}}"#;
        let chart: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(chart.chart.result.is_none());
    }
}
