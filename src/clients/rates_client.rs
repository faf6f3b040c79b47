use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use crate::errors::LedgerError;

const PROVIDER: &str = "ExchangeRate";
const SUCCESS: &str = "success";

/// Source of the latest currency → rate mapping.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest_rates(&self) -> Result<BTreeMap<String, f64>, LedgerError>;
}

/// Payload returned by the rate provider.
#[derive(Debug, Deserialize)]
pub struct RateResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub conversion_rates: BTreeMap<String, f64>,
}

impl RateResponse {
    /// Accepts the payload only when `result` is the success marker.
    pub fn into_rates(self) -> Result<BTreeMap<String, f64>, LedgerError> {
        if self.result.as_deref() == Some(SUCCESS) {
            Ok(self.conversion_rates)
        } else {
            Err(LedgerError::upstream(
                PROVIDER,
                self.error_type
                    .unwrap_or_else(|| "Unknown failure".to_string()),
            ))
        }
    }
}

/// The endpoint embeds the API key, so the URL is kept out of the message.
pub(crate) fn decode_failure(status: reqwest::StatusCode, error: reqwest::Error) -> LedgerError {
    LedgerError::upstream(
        PROVIDER,
        format!(
            "Failed to parse rate response (status {status}): {}",
            error.without_url()
        ),
    )
}

/// Fetches rates from a single configured URL (the API key is part of it).
pub struct ExchangeRateClient {
    http: Client,
    endpoint: String,
}

impl ExchangeRateClient {
    pub fn new(endpoint: &str) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LedgerError::Http(format!("Failed to build rate HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn latest_rates(&self) -> Result<BTreeMap<String, f64>, LedgerError> {
        let response = self.http.get(&self.endpoint).send().await?;
        let status = response.status();

        // the provider reports failures in the body, often with a non-2xx status
        let payload: RateResponse = response
            .json()
            .await
            .map_err(|e| decode_failure(status, e))?;

        let rates = payload.into_rates()?;
        info!(currencies = rates.len(), "Fetched exchange rates");
        Ok(rates)
    }
}
