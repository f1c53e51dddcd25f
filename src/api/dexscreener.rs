//! DexScreener screener feed client.
//!
//! The screener endpoint is a WebSocket that pushes a full ranked snapshot
//! as its first frame; one connect-and-read per query. The endpoint rejects
//! non-browser clients, hence the User-Agent and Origin headers.

use crate::api::retry_list;
use crate::error::{Error, Result};
use crate::models::RawDexPair;
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

const WS_TRENDING: &str = "wss://io.dexscreener.com/dex/screener/pairs/h24/1?rankBy[key]=trendingScoreH6&rankBy[order]=desc";
const WS_GAINERS: &str = "wss://io.dexscreener.com/dex/screener/pairs/h24/1?rankBy[key]=priceChangeH24&rankBy[order]=desc&filters[liquidity][min]=25000&filters[txns][h24][min]=50&filters[volume][h24][min]=10000";
const WS_NEWEST: &str = "wss://io.dexscreener.com/dex/screener/pairs/h24/1?rankBy[key]=volume&rankBy[order]=desc&filters[pairAge][max]=24";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";
const ORIGIN: &str = "https://dexscreener.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScreenerFrame {
    pairs: Option<Vec<RawDexPair>>,
}

#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    attempts: u32,
    timeout: Duration,
}

impl DexScreenerClient {
    pub fn new(attempts: u32, timeout: Duration) -> Self {
        Self { attempts, timeout }
    }

    pub async fn get_trending_pairs(&self, chain: Option<&str>) -> Vec<RawDexPair> {
        self.get_pairs("dexscreener.trending", WS_TRENDING, chain)
            .await
    }

    pub async fn get_top_gaining_pairs(&self, chain: Option<&str>) -> Vec<RawDexPair> {
        self.get_pairs("dexscreener.gainers", WS_GAINERS, chain)
            .await
    }

    pub async fn get_newest_pairs(&self, chain: Option<&str>) -> Vec<RawDexPair> {
        self.get_pairs("dexscreener.newest", WS_NEWEST, chain).await
    }

    async fn get_pairs(&self, label: &str, uri: &str, chain: Option<&str>) -> Vec<RawDexPair> {
        retry_list(label, self.attempts, || async {
            let frame = tokio::time::timeout(self.timeout, self.subscribe_and_recv(uri))
                .await
                .map_err(|_| Error::ApiError(format!("{} timed out", label)))??;
            let mut pairs = frame.pairs.unwrap_or_default();
            if let Some(chain) = chain {
                pairs.retain(|p| p.chain_id.as_deref() == Some(chain));
            }
            Ok(pairs)
        })
        .await
    }

    async fn subscribe_and_recv(&self, uri: &str) -> Result<ScreenerFrame> {
        let mut request = uri
            .into_client_request()
            .map_err(|e| Error::ApiError(e.to_string()))?;
        let headers = request.headers_mut();
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        headers.insert("Origin", HeaderValue::from_static(ORIGIN));

        let (mut stream, _) = connect_async(request).await?;
        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Binary(bytes) => return Ok(serde_json::from_slice(&bytes)?),
                Message::Close(_) => break,
                _ => continue,
            }
        }
        Err(Error::ApiError(
            "screener socket closed before a snapshot frame arrived".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_frame_decodes_pairs() {
        let json = r#"{
            "pairs": [
                {
                    "chainId": "solana",
                    "dexId": "raydium",
                    "pairAddress": "EP2ib6",
                    "baseToken": {"symbol": "$WIF", "name": "dogwifhat", "address": "EKpQGS"},
                    "quoteToken": {"symbol": "SOL", "name": "Wrapped SOL", "address": "So1111"},
                    "priceUsd": "0.169234",
                    "volume": {"h24": 36843550.91},
                    "priceChange": {"h24": -37.14}
                },
                {
                    "chainId": "ethereum",
                    "dexId": "uniswap",
                    "pairAddress": "0xabc",
                    "baseToken": {"symbol": "PEPE"},
                    "quoteToken": {"symbol": "WETH"}
                }
            ]
        }"#;
        let frame: ScreenerFrame = serde_json::from_str(json).unwrap();
        let pairs = frame.pairs.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].chain_id.as_deref(), Some("solana"));
        assert_eq!(pairs[1].dex_id.as_deref(), Some("uniswap"));
    }

    #[test]
    fn non_snapshot_frame_has_no_pairs() {
        let frame: ScreenerFrame = serde_json::from_str(r#"{"status": "pending"}"#).unwrap();
        assert!(frame.pairs.is_none());
    }
}
