use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{info, warn};

use crate::clients::{LedgerStore, RateSource};
use crate::core::models::CurrencyRateUpdate;
use crate::errors::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Update operations attempted, not rows confirmed changed.
    pub count: usize,
}

/// Pulls the latest rates and writes one update per currency code, at most
/// `concurrency` in flight at a time.
///
/// A failed fetch (including a non-success provider result) aborts before any
/// write. Failures of individual updates are logged and otherwise ignored.
///
/// # Errors
///
/// Returns the rate source's error when the rates cannot be fetched.
pub async fn refresh_rates(
    source: &dyn RateSource,
    store: &dyn LedgerStore,
    concurrency: usize,
    now: DateTime<Utc>,
) -> Result<RefreshSummary, LedgerError> {
    let rates = source.latest_rates().await?;
    let count = rates.len();

    let failures: Vec<(String, LedgerError)> = stream::iter(rates)
        .map(|(code, rate_to_usd)| async move {
            let update = CurrencyRateUpdate {
                code,
                rate_to_usd,
                last_updated: now,
            };
            let result = store.update_currency_rate(&update).await;
            (update.code, result)
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(code, result)| async move { result.err().map(|e| (code, e)) })
        .collect()
        .await;

    for (code, e) in &failures {
        warn!(code = %code, "Currency update failed: {}", e);
    }

    info!(
        count,
        failed = failures.len(),
        concurrency,
        "Exchange rate refresh finished"
    );

    Ok(RefreshSummary { count })
}
