//! Supabase (PostgREST) storage client
//!
//! Every table touched by the functions is owned by the database; this module
//! only issues single-shot reads and writes against the REST interface.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::config::StoreConfig;
use crate::core::models::{CurrencyRateUpdate, NamedRecord, NewLog, RecentLog};
use crate::errors::LedgerError;

/// Storage operations needed by the handlers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Updates one currency row by code. A code with no row is a no-op.
    async fn update_currency_rate(&self, update: &CurrencyRateUpdate) -> Result<(), LedgerError>;

    async fn profile_currency(&self, user_id: &str) -> Result<Option<String>, LedgerError>;

    async fn categories(&self, user_id: &str) -> Result<Vec<NamedRecord>, LedgerError>;

    async fn accounts(&self, user_id: &str) -> Result<Vec<NamedRecord>, LedgerError>;

    /// Newest first, at most `limit` rows.
    async fn recent_logs(&self, user_id: &str, limit: usize)
    -> Result<Vec<RecentLog>, LedgerError>;

    /// Inserts a log and returns the stored row.
    async fn insert_log(&self, log: &NewLog) -> Result<Value, LedgerError>;

    /// A store that acts with the caller's own token, when the backend
    /// supports row-level security scoping.
    fn for_caller(&self, _bearer: &str) -> Option<Box<dyn LedgerStore>> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    currency_code: Option<String>,
}

const RECENT_LOG_SELECT: &str =
    "item_name,category_id,account_id,category:categories(name),account:accounts(name)";

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: String,
    api_key: String,
    bearer: String,
}

impl SupabaseClient {
    pub fn new(config: &StoreConfig) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LedgerError::Http(format!("Failed to build storage HTTP client: {e}")))?;
        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url),
            api_key: config.key.clone(),
            bearer: config.key.clone(),
        })
    }

    #[must_use]
    pub fn with_bearer(&self, bearer: &str) -> Self {
        Self {
            bearer: bearer.to_string(),
            ..self.clone()
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{table}", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn check(response: Response, action: &str) -> Result<Response, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e.without_url()));
        Err(LedgerError::Storage(format!(
            "{action} failed (status {status}): {body}"
        )))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, LedgerError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await?;
        let response = Self::check(response, &format!("select from {table}")).await?;
        response
            .json()
            .await
            .map_err(|e| {
                LedgerError::Storage(format!(
                    "Failed to decode {table} rows: {}",
                    e.without_url()
                ))
            })
    }

    async fn named_records(
        &self,
        table: &str,
        user_id: &str,
    ) -> Result<Vec<NamedRecord>, LedgerError> {
        self.select(
            table,
            &[
                ("select", "id,name".to_string()),
                ("user_id", format!("eq.{user_id}")),
            ],
        )
        .await
    }
}

#[async_trait]
impl LedgerStore for SupabaseClient {
    async fn update_currency_rate(&self, update: &CurrencyRateUpdate) -> Result<(), LedgerError> {
        let response = self
            .request(reqwest::Method::PATCH, "currencies")
            .query(&[("code", format!("eq.{}", update.code))])
            .json(update)
            .send()
            .await?;
        Self::check(response, &format!("update currency {}", update.code)).await?;
        debug!(code = %update.code, "Currency rate updated");
        Ok(())
    }

    async fn profile_currency(&self, user_id: &str) -> Result<Option<String>, LedgerError> {
        let rows: Vec<ProfileRow> = self
            .select(
                "profiles",
                &[
                    ("select", "currency_code".to_string()),
                    ("id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().and_then(|p| p.currency_code))
    }

    async fn categories(&self, user_id: &str) -> Result<Vec<NamedRecord>, LedgerError> {
        self.named_records("categories", user_id).await
    }

    async fn accounts(&self, user_id: &str) -> Result<Vec<NamedRecord>, LedgerError> {
        self.named_records("accounts", user_id).await
    }

    async fn recent_logs(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentLog>, LedgerError> {
        self.select(
            "logs",
            &[
                ("select", RECENT_LOG_SELECT.to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn insert_log(&self, log: &NewLog) -> Result<Value, LedgerError> {
        let response = self
            .request(reqwest::Method::POST, "logs")
            .header("Prefer", "return=representation")
            .json(log)
            .send()
            .await?;
        let response = Self::check(response, "insert log").await?;
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| {
                LedgerError::Storage(format!(
                    "Failed to decode inserted log: {}",
                    e.without_url()
                ))
            })?;
        rows.into_iter()
            .next()
            .ok_or_else(|| LedgerError::Storage("insert log returned no row".to_string()))
    }

    fn for_caller(&self, bearer: &str) -> Option<Box<dyn LedgerStore>> {
        Some(Box::new(self.with_bearer(bearer)))
    }
}
