use chrono::{DateTime, SecondsFormat, Utc};
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use tracing::warn;

use crate::core::fallback::{ContextField, FallbackPolicy};
use crate::core::models::{NamedRecord, RecentLog, RecordId};

/// Max characters of user text forwarded to the model
pub const MAX_INPUT_LEN: usize = 2_000;

/// Number of recent log rows used as pattern hints
pub const HISTORY_LIMIT: usize = 10;

/// Prompt flavour used by each deployed function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Verbose instructions with a timestamp and "category used account" hints.
    Detailed,
    /// Token-lean instructions with "item:category(account)" hints.
    Compact,
}

impl PromptStyle {
    /// Sampling temperature sent with the completion request.
    #[must_use]
    pub fn temperature(self) -> Option<f32> {
        match self {
            PromptStyle::Detailed => None,
            PromptStyle::Compact => Some(0.1),
        }
    }
}

/// Values interpolated into the system prompt.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub now: DateTime<Utc>,
    pub base_currency: String,
    pub category_names: String,
    pub account_names: String,
    pub patterns: String,
    pub default_account: Option<String>,
}

/// Joins record names for the prompt, using the policy fallback when empty.
#[must_use]
pub fn join_names(records: &[NamedRecord], field: ContextField, policy: &FallbackPolicy) -> String {
    let joined = records
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    policy.resolve(field, Some(joined))
}

/// Renders history as `"Food used Credit Card; Rent used Bank"`.
#[must_use]
pub fn describe_history(logs: &[RecentLog], policy: &FallbackPolicy) -> String {
    logs.iter()
        .map(|log| {
            format!(
                "{} used {}",
                log.category_name()
                    .unwrap_or(policy.value(ContextField::PatternCategory)),
                log.account_name()
                    .unwrap_or(policy.value(ContextField::PatternAccount)),
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Renders history as `"Uber:Transport(Card) | Rent:Housing(Bank)"`, looking
/// names up by id among the user's records.
#[must_use]
pub fn compress_history(
    logs: &[RecentLog],
    categories: &[NamedRecord],
    accounts: &[NamedRecord],
    policy: &FallbackPolicy,
) -> String {
    let unknown = policy.value(ContextField::CompactUnknown);
    let name_of = |records: &[NamedRecord], id: Option<&RecordId>| -> String {
        id.and_then(|id| records.iter().find(|r| &r.id == id))
            .map_or_else(|| unknown.to_string(), |r| r.name.clone())
    };

    logs.iter()
        .map(|log| {
            format!(
                "{}:{}({})",
                log.item_name.as_deref().unwrap_or(unknown),
                name_of(categories, log.category_id.as_ref()),
                name_of(accounts, log.account_id.as_ref()),
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[must_use]
pub fn build_system_prompt(style: PromptStyle, ctx: &PromptContext) -> String {
    let base = &ctx.base_currency;
    match style {
        PromptStyle::Detailed => format!(
            "You are an intelligent financial parser API.\n\
             \n\
             ### CONTEXT VARIABLES\n\
             - CURRENT TIME: {now}\n\
             - USER BASE CURRENCY: {base}\n\
             - VALID CATEGORIES: [{cats}]\n\
             - VALID ACCOUNTS: [{accts}]\n\
             - RECENT PATTERNS: [{patterns}]\n\
             \n\
             ### RULES\n\
             1. If input currency != {base}, set 'foreign_amount' and 'foreign_currency_code'. Set 'amount' to 0.\n\
             2. If input currency == {base}, set 'amount'. Leave foreign fields null.\n\
             3. Use RECENT PATTERNS to guess the account if not specified.\n\
             4. 'type' is one of \"expense\", \"income\", \"transfer\". 'log_date' is YYYY-MM-DD.\n\
             5. Return strictly valid JSON with keys: amount, foreign_amount, foreign_currency_code, \
             category_name, account_name, type, item_name, log_date.",
            now = ctx.now.to_rfc3339_opts(SecondsFormat::Millis, true),
            cats = ctx.category_names,
            accts = ctx.account_names,
            patterns = ctx.patterns,
        ),
        PromptStyle::Compact => format!(
            "Role: Finance Parser. Today: {today}. BaseCurrency: {base}.\n\
             \n\
             Context:\n\
             - Cats: [{cats}]\n\
             - Accts: [{accts}]\n\
             - Patterns: [{patterns}]\n\
             \n\
             Rules:\n\
             1. Input in any language/script -> Translate item_name to English.\n\
             2. Match \"item_name\" to closest Pattern. If \"Uber\" was \"Transport\" before, use \"Transport\".\n\
             3. If input currency != {base}, set foreign_amount & foreign_currency_code. amount=0.\n\
             4. Account Rule: Explicit mentions > Pattern Match > Default ({default_account}).\n\
             \n\
             Output JSON:\n\
             {{\n  \"amount\": number,\n  \"foreign_amount\": number|null,\n  \
             \"foreign_currency_code\": string|null,\n  \
             \"category_name\": string (Exact match from Cats),\n  \
             \"account_name\": string (Exact match from Accts),\n  \
             \"type\": \"expense\"|\"income\"|\"transfer\",\n  \
             \"item_name\": string (English),\n  \"log_date\": \"YYYY-MM-DD\"\n}}",
            today = ctx.now.format("%Y-%m-%d"),
            cats = ctx.category_names,
            accts = ctx.account_names,
            patterns = ctx.patterns,
            default_account = ctx.default_account.as_deref().unwrap_or("none"),
        ),
    }
}

#[must_use]
pub fn build_messages(system_prompt: String, user_text: &str) -> Vec<ChatCompletionMessage> {
    vec![
        ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(system_prompt),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(user_text.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
    ]
}

/// Removes control characters (newlines and tabs survive) and hard-truncates.
#[must_use]
pub fn sanitize_input(raw: &str) -> String {
    let kept: Vec<char> = raw
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect();

    if kept.len() > MAX_INPUT_LEN {
        warn!(
            chars = kept.len(),
            limit = MAX_INPUT_LEN,
            "Input too large, truncating before sending to the model"
        );
    }

    kept.into_iter()
        .take(MAX_INPUT_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}
