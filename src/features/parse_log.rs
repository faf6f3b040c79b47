use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::{CompletionClient, CompletionRequest, LedgerStore};
use crate::core::fallback::{ContextField, FallbackPolicy};
use crate::core::models::{NamedRecord, ParseRequest, ParsedLog, RecentLog, RecordId};
use crate::errors::LedgerError;
use crate::prompt::{
    HISTORY_LIMIT, PromptContext, PromptStyle, build_messages, build_system_prompt,
    compress_history, describe_history, join_names, sanitize_input,
};
use crate::utils::matching::{NameMatch, resolve_by_name};

/// Everything read from storage to build the prompt.
#[derive(Debug, Clone)]
pub struct LedgerContext {
    pub base_currency: String,
    pub categories: Vec<NamedRecord>,
    pub accounts: Vec<NamedRecord>,
    pub recent: Vec<RecentLog>,
}

fn or_fallback<T>(what: &str, result: Result<T, LedgerError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Context read '{}' failed, using fallback: {}", what, e);
            None
        }
    }
}

/// Reads the four context sources concurrently. A failed read never aborts the
/// request; its field takes the policy's fallback instead.
pub async fn gather_context(
    store: &dyn LedgerStore,
    user_id: &str,
    policy: &FallbackPolicy,
) -> LedgerContext {
    let (profile, categories, accounts, recent) = tokio::join!(
        store.profile_currency(user_id),
        store.categories(user_id),
        store.accounts(user_id),
        store.recent_logs(user_id, HISTORY_LIMIT),
    );

    let base_currency = policy
        .resolve(
            ContextField::BaseCurrency,
            or_fallback("profile", profile).flatten(),
        )
        .to_ascii_uppercase();

    LedgerContext {
        base_currency,
        categories: or_fallback("categories", categories).unwrap_or_default(),
        accounts: or_fallback("accounts", accounts).unwrap_or_default(),
        recent: or_fallback("recent logs", recent).unwrap_or_default(),
    }
}

/// Keys the model must fill with a non-null value.
const REQUIRED_KEYS: [&str; 4] = ["category_name", "account_name", "type", "item_name"];

/// Decodes the model's message content into the output schema.
///
/// # Errors
///
/// `UpstreamApi` when there is no content, `MalformedResponse` when the
/// content is not a JSON object of the expected shape.
pub fn decode_completion(content: Option<String>) -> Result<ParsedLog, LedgerError> {
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| LedgerError::upstream("OpenAI", "AI returned empty response"))?;

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| LedgerError::MalformedResponse(format!("AI returned invalid JSON: {e}")))?;

    let Some(object) = value.as_object() else {
        return Err(LedgerError::MalformedResponse(
            "AI returned invalid JSON: expected an object".to_string(),
        ));
    };

    if let Some(key) = REQUIRED_KEYS
        .iter()
        .find(|key| object.get(**key).is_none_or(Value::is_null))
    {
        return Err(LedgerError::MalformedResponse(format!(
            "AI returned invalid JSON: missing `{key}`"
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| LedgerError::MalformedResponse(format!("AI returned invalid JSON: {e}")))
}

/// A parsed log together with the records its names were resolved against.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub parsed: ParsedLog,
    pub base_currency: String,
    pub categories: Vec<NamedRecord>,
    pub accounts: Vec<NamedRecord>,
}

impl ParseOutcome {
    #[must_use]
    pub fn category_match(&self) -> NameMatch<'_> {
        resolve_by_name(&self.categories, self.parsed.category_name.as_deref())
    }

    #[must_use]
    pub fn account_match(&self) -> NameMatch<'_> {
        resolve_by_name(&self.accounts, self.parsed.account_name.as_deref())
    }

    #[must_use]
    pub fn to_resolved(&self) -> ResolvedLog {
        ResolvedLog {
            parsed: self.parsed.clone(),
            category_id: self.category_match().id(),
            account_id: self.account_match().id(),
        }
    }
}

/// Body returned by the parse-only function.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLog {
    #[serde(flatten)]
    pub parsed: ParsedLog,
    pub category_id: Option<RecordId>,
    pub account_id: Option<RecordId>,
}

/// Turns free text into a [`ParsedLog`] using the user's own categories,
/// accounts and recent history as context.
pub struct LogParser<'a> {
    pub(crate) store: &'a dyn LedgerStore,
    llm: &'a dyn CompletionClient,
    model: &'a str,
    policy: &'a FallbackPolicy,
}

impl<'a> LogParser<'a> {
    pub fn new(
        store: &'a dyn LedgerStore,
        llm: &'a dyn CompletionClient,
        model: &'a str,
        policy: &'a FallbackPolicy,
    ) -> Self {
        Self {
            store,
            llm,
            model,
            policy,
        }
    }

    /// # Errors
    ///
    /// Fails on an invalid request, an LLM transport or status error, or an
    /// empty/invalid completion. Context read failures do not fail the call.
    pub async fn parse(
        &self,
        request: &ParseRequest,
        style: PromptStyle,
        now: DateTime<Utc>,
    ) -> Result<ParseOutcome, LedgerError> {
        if request.user_id.trim().is_empty() {
            return Err(LedgerError::InvalidRequest("user_id is required".to_string()));
        }
        let text = sanitize_input(&request.raw_text);
        if text.is_empty() {
            return Err(LedgerError::InvalidRequest("text is required".to_string()));
        }

        let ctx = gather_context(self.store, &request.user_id, self.policy).await;

        let patterns = match style {
            PromptStyle::Detailed => describe_history(&ctx.recent, self.policy),
            PromptStyle::Compact => {
                compress_history(&ctx.recent, &ctx.categories, &ctx.accounts, self.policy)
            }
        };

        let prompt_ctx = PromptContext {
            now,
            base_currency: ctx.base_currency.clone(),
            category_names: join_names(&ctx.categories, ContextField::CategoryNames, self.policy),
            account_names: join_names(&ctx.accounts, ContextField::AccountNames, self.policy),
            patterns,
            default_account: ctx.accounts.first().map(|a| a.name.clone()),
        };

        let completion = CompletionRequest {
            model: self.model.to_string(),
            messages: build_messages(build_system_prompt(style, &prompt_ctx), &text),
            temperature: style.temperature(),
        };

        let content = self.llm.complete(&completion).await?;
        let mut parsed = decode_completion(content)?;
        parsed.normalize_currency(&ctx.base_currency);
        parsed.fill_missing_date(now.date_naive());

        info!(
            user_id = %request.user_id,
            log_type = ?parsed.log_type,
            foreign = parsed.foreign_currency_code.is_some(),
            "Parsed log from text"
        );

        Ok(ParseOutcome {
            parsed,
            base_currency: ctx.base_currency,
            categories: ctx.categories,
            accounts: ctx.accounts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_completion_rejects_empty_content() {
        for content in [None, Some(String::new()), Some("   ".to_string())] {
            let err = decode_completion(content).unwrap_err();
            assert!(err.to_string().contains("AI returned empty response"));
        }
    }

    #[test]
    fn test_decode_completion_rejects_non_json() {
        let err = decode_completion(Some("Sure! Here is your log".to_string())).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedResponse(_)));
        assert!(err.to_string().contains("AI returned invalid JSON"));
    }

    #[test]
    fn test_decode_completion_rejects_objects_without_schema_keys() {
        for content in ["{}", "[]", "12", r#"{"amount": 4, "item_name": "Tea"}"#] {
            let err = decode_completion(Some(content.to_string())).unwrap_err();
            assert!(
                matches!(err, LedgerError::MalformedResponse(_)),
                "{content} gave {err}"
            );
        }
    }

    #[test]
    fn test_decode_completion_rejects_null_required_key() {
        let content = r#"{"amount": 4, "category_name": null, "account_name": "Cash",
            "type": "expense", "item_name": "Tea"}"#;
        let err = decode_completion(Some(content.to_string())).unwrap_err();
        assert!(err.to_string().contains("category_name"));
    }

    #[test]
    fn test_decode_completion_accepts_schema_object() {
        let content = r#"{"amount": 12, "foreign_amount": null, "foreign_currency_code": null,
            "category_name": "Food", "account_name": "Cash", "type": "expense",
            "item_name": "Lunch", "log_date": "2024-06-01"}"#;
        let parsed = decode_completion(Some(content.to_string())).unwrap();
        assert_eq!(parsed.amount, 12.0);
        assert_eq!(parsed.item_name, "Lunch");
    }
}
