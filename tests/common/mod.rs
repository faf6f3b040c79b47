#![allow(dead_code)]

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{Content, MessageRole};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ledgerfn::LedgerError;
use ledgerfn::clients::{CompletionClient, CompletionRequest, LedgerStore, RateSource};
use ledgerfn::core::config::{ParserConfig, RatesConfig, StoreConfig};
use ledgerfn::core::models::{
    CurrencyRateUpdate, EmbeddedName, NamedRecord, NewLog, RecentLog, RecordId,
};

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
pub struct MockStore {
    pub base_currency: Option<String>,
    pub categories: Vec<NamedRecord>,
    pub accounts: Vec<NamedRecord>,
    pub recent: Vec<RecentLog>,
    pub fail_reads: bool,
    pub fail_insert: bool,
    pub fail_update_codes: Vec<String>,
    pub updates: Mutex<Vec<CurrencyRateUpdate>>,
    pub inserts: Mutex<Vec<NewLog>>,
    pub recent_limits: Mutex<Vec<usize>>,
    /// When set, `for_caller` hands out a store whose inserts are rejected.
    pub caller_scope_rejects_insert: bool,
    pub caller_tokens: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockStore {
    /// A user with USD base, two categories, two accounts and some history.
    pub fn seeded() -> Self {
        Self {
            base_currency: Some("USD".to_string()),
            categories: vec![
                NamedRecord::new(1, "Food"),
                NamedRecord::new(2, "Transport"),
            ],
            accounts: vec![
                NamedRecord::new("acc-cash", "Cash"),
                NamedRecord::new("acc-visa", "Visa Card"),
            ],
            recent: vec![RecentLog {
                item_name: Some("Uber".to_string()),
                category_id: Some(RecordId::Int(2)),
                account_id: Some(RecordId::from("acc-visa")),
                category: Some(EmbeddedName {
                    name: Some("Transport".to_string()),
                }),
                account: Some(EmbeddedName {
                    name: Some("Visa Card".to_string()),
                }),
            }],
            ..Self::default()
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.lock().unwrap().len()
    }

    fn read_failure() -> LedgerError {
        LedgerError::Storage("connection refused".to_string())
    }
}

#[async_trait]
impl LedgerStore for MockStore {
    async fn update_currency_rate(&self, update: &CurrencyRateUpdate) -> Result<(), LedgerError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.updates.lock().unwrap().push(update.clone());
        if self.fail_update_codes.contains(&update.code) {
            return Err(LedgerError::Storage(format!("update {} failed", update.code)));
        }
        Ok(())
    }

    async fn profile_currency(&self, _user_id: &str) -> Result<Option<String>, LedgerError> {
        if self.fail_reads {
            return Err(Self::read_failure());
        }
        Ok(self.base_currency.clone())
    }

    async fn categories(&self, _user_id: &str) -> Result<Vec<NamedRecord>, LedgerError> {
        if self.fail_reads {
            return Err(Self::read_failure());
        }
        Ok(self.categories.clone())
    }

    async fn accounts(&self, _user_id: &str) -> Result<Vec<NamedRecord>, LedgerError> {
        if self.fail_reads {
            return Err(Self::read_failure());
        }
        Ok(self.accounts.clone())
    }

    async fn recent_logs(
        &self,
        _user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentLog>, LedgerError> {
        self.recent_limits.lock().unwrap().push(limit);
        if self.fail_reads {
            return Err(Self::read_failure());
        }
        Ok(self.recent.iter().take(limit).cloned().collect())
    }

    async fn insert_log(&self, log: &NewLog) -> Result<Value, LedgerError> {
        if self.fail_insert {
            return Err(LedgerError::Storage(
                "new row violates row-level security policy".to_string(),
            ));
        }
        self.inserts.lock().unwrap().push(log.clone());
        let mut row = serde_json::to_value(log)?;
        row["id"] = json!(101);
        Ok(row)
    }

    fn for_caller(&self, bearer: &str) -> Option<Box<dyn LedgerStore>> {
        self.caller_tokens.lock().unwrap().push(bearer.to_string());
        self.caller_scope_rejects_insert.then(|| {
            Box::new(MockStore {
                fail_insert: true,
                ..MockStore::seeded()
            }) as Box<dyn LedgerStore>
        })
    }
}

// ============================================================================
// Rate provider
// ============================================================================

pub struct MockRates {
    pub result: Result<BTreeMap<String, f64>, String>,
}

impl MockRates {
    pub fn with(rates: &[(&str, f64)]) -> Self {
        Self {
            result: Ok(rates
                .iter()
                .map(|(code, rate)| ((*code).to_string(), *rate))
                .collect()),
        }
    }

    pub fn failing(error_type: &str) -> Self {
        Self {
            result: Err(error_type.to_string()),
        }
    }
}

#[async_trait]
impl RateSource for MockRates {
    async fn latest_rates(&self) -> Result<BTreeMap<String, f64>, LedgerError> {
        self.result
            .clone()
            .map_err(|e| LedgerError::upstream("ExchangeRate", e))
    }
}

// ============================================================================
// Language model
// ============================================================================

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: Option<f32>,
}

pub struct MockLlm {
    reply: Result<Option<String>, String>,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl MockLlm {
    pub fn replying(content: &str) -> Self {
        Self {
            reply: Ok(Some(content.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn replying_json(content: &Value) -> Self {
        Self::replying(&content.to_string())
    }

    pub fn empty() -> Self {
        Self {
            reply: Ok(None),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> SeenRequest {
        self.seen.lock().unwrap().last().cloned().expect("no request seen")
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

fn text_for(request: &CompletionRequest, wanted: &str) -> String {
    request
        .messages
        .iter()
        .filter(|m| {
            let role = match m.role {
                MessageRole::system => "system",
                MessageRole::user => "user",
                _ => "other",
            };
            role == wanted
        })
        .filter_map(|m| match &m.content {
            Content::Text(t) => Some(t.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl CompletionClient for MockLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, LedgerError> {
        self.seen.lock().unwrap().push(SeenRequest {
            model: request.model.clone(),
            system: text_for(request, "system"),
            user: text_for(request, "user"),
            temperature: request.temperature,
        });
        self.reply
            .clone()
            .map_err(|e| LedgerError::upstream("OpenAI", e))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn rates_config(concurrency: usize) -> RatesConfig {
    RatesConfig {
        rate_endpoint: "https://rates.example.com/v6/key/latest/USD".to_string(),
        store: store_config(),
        update_concurrency: concurrency,
    }
}

pub fn parser_config() -> ParserConfig {
    ParserConfig {
        store: store_config(),
        openai_api_key: "sk-test".to_string(),
        openai_model: "gpt-4o-mini".to_string(),
        openai_base_url: "https://api.openai.com/v1".to_string(),
        openai_org_id: None,
        default_base_currency: "USD".to_string(),
    }
}

fn store_config() -> StoreConfig {
    StoreConfig {
        url: "https://project.supabase.co".to_string(),
        key: "anon-key".to_string(),
    }
}

/// A model reply in the documented output schema.
pub fn model_reply(
    log_type: &str,
    amount: f64,
    foreign: Option<(f64, &str)>,
    category: &str,
    account: &str,
) -> Value {
    json!({
        "amount": amount,
        "foreign_amount": foreign.map(|(a, _)| a),
        "foreign_currency_code": foreign.map(|(_, c)| c),
        "category_name": category,
        "account_name": account,
        "type": log_type,
        "item_name": "Lunch",
        "log_date": "2024-06-01"
    })
}

/// An API Gateway proxy event carrying `body` as a JSON string.
pub fn proxy_event(method: &str, body: &Value) -> Value {
    json!({
        "httpMethod": method,
        "headers": { "content-type": "application/json" },
        "body": body.to_string(),
        "isBase64Encoded": false
    })
}

pub fn response_body(response: &Value) -> Value {
    let raw = response["body"].as_str().expect("body is a string");
    serde_json::from_str(raw).expect("body is JSON")
}
