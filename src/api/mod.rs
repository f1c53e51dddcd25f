use crate::error::Result;
use log::warn;
use std::future::Future;
use std::time::Duration;

pub mod dexscreener;
pub mod geckoterminal;
pub mod ticker;

/// Shared HTTP client with a per-request timeout. Every fetch in a report
/// run is bounded by this timeout plus its own retry count.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?)
}

/// Run one ranked list query up to `attempts` times, treating empty and
/// malformed payloads alike as a failed attempt. Exhausting the budget
/// degrades to an empty list so sibling queries keep going.
pub(crate) async fn retry_list<T, F, Fut>(label: &str, attempts: u32, mut op: F) -> Vec<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    for attempt in 1..=attempts.max(1) {
        match op().await {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => warn!("[{}] ({}/{}) empty payload", label, attempt, attempts),
            Err(e) => warn!("[{}] ({}/{}) {}", label, attempt, attempts, e),
        }
    }
    warn!("[{}] giving up after {} attempts", label, attempts);
    Vec::new()
}
