//! Lambda entry points for the three functions.
//!
//! Each handler converts any failure into a single HTTP 500 carrying the error
//! message; nothing is retried or rolled back.

use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use super::{helpers, parsing};
use crate::clients::{CompletionClient, LedgerStore, RateSource};
use crate::core::config::{ParserConfig, RatesConfig};
use crate::core::fallback::FallbackPolicy;
use crate::errors::LedgerError;
use crate::features::{LogParser, refresh_rates};
use crate::prompt::PromptStyle;

fn failure(e: &LedgerError) -> Value {
    error!("Function failed: {}", e);
    helpers::err_response(500, &e.to_string())
}

fn policy_for(config: &ParserConfig) -> FallbackPolicy {
    FallbackPolicy::default().with_base_currency(&config.default_base_currency)
}

// ============================================================================
// Exchange-rate refresh
// ============================================================================

pub async fn handle_refresh(
    config: &RatesConfig,
    store: &dyn LedgerStore,
    source: &dyn RateSource,
) -> Value {
    match refresh_rates(source, store, config.update_concurrency, Utc::now()).await {
        Ok(summary) => helpers::ok_json(&json!({ "success": true, "count": summary.count })),
        Err(e) => failure(&e),
    }
}

/// # Errors
///
/// Never fails at the Lambda level; errors are reported as a 500 response.
#[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
pub async fn refresh_rates_handler(
    config: &RatesConfig,
    store: &dyn LedgerStore,
    source: &dyn RateSource,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    info!("Exchange rate refresh invoked");
    Ok(handle_refresh(config, store, source).await)
}

// ============================================================================
// Parse only
// ============================================================================

async fn parse_payload(
    config: &ParserConfig,
    store: &dyn LedgerStore,
    llm: &dyn CompletionClient,
    payload: &Value,
) -> Result<Value, LedgerError> {
    let request = parsing::parse_request(payload)?;
    let policy = policy_for(config);
    let parser = LogParser::new(store, llm, &config.openai_model, &policy);

    let outcome = parser
        .parse(&request, PromptStyle::Detailed, Utc::now())
        .await?;
    Ok(serde_json::to_value(outcome.to_resolved())?)
}

pub async fn handle_parse(
    config: &ParserConfig,
    store: &dyn LedgerStore,
    llm: &dyn CompletionClient,
    payload: &Value,
) -> Value {
    match parse_payload(config, store, llm, payload).await {
        Ok(body) => helpers::ok_json(&body),
        Err(e) => failure(&e),
    }
}

/// # Errors
///
/// Never fails at the Lambda level; errors are reported as a 500 response.
#[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
pub async fn parse_log_handler(
    config: &ParserConfig,
    store: &dyn LedgerStore,
    llm: &dyn CompletionClient,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    info!("Parse request received");
    Ok(handle_parse(config, store, llm, &event.payload).await)
}

// ============================================================================
// Parse and record
// ============================================================================

async fn record_payload(
    config: &ParserConfig,
    store: &dyn LedgerStore,
    llm: &dyn CompletionClient,
    payload: &Value,
) -> Result<Value, LedgerError> {
    let request = parsing::parse_request(payload)?;

    // act as the caller so row-level security applies to reads and the insert
    let caller_store = parsing::bearer_token(payload).and_then(|token| store.for_caller(token));
    let store: &dyn LedgerStore = match caller_store.as_deref() {
        Some(scoped) => scoped,
        None => store,
    };

    let policy = policy_for(config);
    let parser = LogParser::new(store, llm, &config.openai_model, &policy);
    let recorded = parser.parse_and_record(&request, Utc::now()).await?;

    Ok(json!({
        "success": true,
        "log": recorded.log,
        "resolution": {
            "category": recorded.category_match,
            "account": recorded.account_match,
        }
    }))
}

pub async fn handle_record(
    config: &ParserConfig,
    store: &dyn LedgerStore,
    llm: &dyn CompletionClient,
    payload: &Value,
) -> Value {
    if parsing::is_preflight(payload) {
        return helpers::preflight();
    }

    let response = match record_payload(config, store, llm, payload).await {
        Ok(body) => helpers::ok_json(&body),
        Err(e) => failure(&e),
    };
    helpers::with_cors(response)
}

/// # Errors
///
/// Never fails at the Lambda level; errors are reported as a 500 response.
#[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
pub async fn record_log_handler(
    config: &ParserConfig,
    store: &dyn LedgerStore,
    llm: &dyn CompletionClient,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    info!("Record request received");
    Ok(handle_record(config, store, llm, &event.payload).await)
}
