use std::env;

use crate::errors::LedgerError;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_UPDATE_CONCURRENCY: usize = 8;

/// Connection settings for the PostgREST-backed database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
}

/// Settings for the exchange-rate refresh function.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub rate_endpoint: String,
    pub store: StoreConfig,
    pub update_concurrency: usize,
}

/// Settings shared by both log-parsing functions.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub store: StoreConfig,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_org_id: Option<String>,
    pub default_base_currency: String,
}

impl RatesConfig {
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rate_endpoint = url_var(&lookup, "CURRENCY_RATE_ENDPOINT")?;
        let store = StoreConfig {
            url: url_var(&lookup, "SUPABASE_URL")?,
            key: required(&lookup, "SUPABASE_SERVICE_ROLE_KEY")?,
        };

        let update_concurrency = match optional(&lookup, "RATE_UPDATE_CONCURRENCY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(LedgerError::InvalidConfiguration(format!(
                        "RATE_UPDATE_CONCURRENCY must be a positive integer, got {raw:?}"
                    )));
                }
            },
            None => DEFAULT_UPDATE_CONCURRENCY,
        };

        Ok(Self {
            rate_endpoint,
            store,
            update_concurrency,
        })
    }
}

impl ParserConfig {
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = StoreConfig {
            url: url_var(&lookup, "SUPABASE_URL")?,
            key: required(&lookup, "SUPABASE_ANON_KEY")?,
        };

        let openai_base_url = match optional(&lookup, "OPENAI_BASE_URL") {
            Some(raw) => validate_url("OPENAI_BASE_URL", &raw)?,
            None => DEFAULT_OPENAI_BASE_URL.to_string(),
        };

        Ok(Self {
            store,
            openai_api_key: required(&lookup, "OPENAI_API_KEY")?,
            openai_model: optional(&lookup, "OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url,
            openai_org_id: optional(&lookup, "OPENAI_ORG_ID"),
            default_base_currency: optional(&lookup, "DEFAULT_BASE_CURRENCY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string()),
        })
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String, LedgerError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)
        .ok_or_else(|| LedgerError::MissingConfiguration(format!("{name} is not set")))
}

fn url_var<F>(lookup: &F, name: &str) -> Result<String, LedgerError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(lookup, name)?;
    validate_url(name, &raw)
}

fn validate_url(name: &str, raw: &str) -> Result<String, LedgerError> {
    if raw.starts_with("https://") || raw.starts_with("http://") {
        Ok(raw.trim_end_matches('/').to_string())
    } else {
        Err(LedgerError::InvalidConfiguration(format!(
            "{name} must be an http(s) URL"
        )))
    }
}
