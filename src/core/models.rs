use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Primary key of a category, account or log row. PostgREST hands back either
/// integers or uuid strings depending on the table, so both are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// A user-scoped category or account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    pub id: RecordId,
    pub name: String,
}

impl NamedRecord {
    pub fn new(id: impl Into<RecordId>, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddedName {
    pub name: Option<String>,
}

/// One of the user's most recent log rows, used only as a pattern hint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecentLog {
    pub item_name: Option<String>,
    pub category_id: Option<RecordId>,
    pub account_id: Option<RecordId>,
    pub category: Option<EmbeddedName>,
    pub account: Option<EmbeddedName>,
}

impl RecentLog {
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().and_then(|c| c.name.as_deref())
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account.as_ref().and_then(|a| a.name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    #[default]
    Expense,
    Income,
    Transfer,
}

/// Structured ledger entry as returned by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLog {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub amount: f64,
    #[serde(default)]
    pub foreign_amount: Option<f64>,
    #[serde(default)]
    pub foreign_currency_code: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub item_name: String,
    #[serde(default)]
    pub log_date: Option<NaiveDate>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl ParsedLog {
    /// Enforces the base-currency rule on the model output: an amount in the
    /// user's base currency lives in `amount` with no foreign fields, anything
    /// else lives in the foreign fields with `amount` set to zero.
    pub fn normalize_currency(&mut self, base_currency: &str) {
        let code = self
            .foreign_currency_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_ascii_uppercase);

        match code {
            Some(code) if !code.eq_ignore_ascii_case(base_currency) => {
                if self.foreign_amount.is_none() {
                    self.foreign_amount = Some(self.amount);
                }
                self.foreign_currency_code = Some(code);
                self.amount = 0.0;
            }
            _ => {
                if let Some(foreign) = self.foreign_amount.take()
                    && self.amount == 0.0
                {
                    self.amount = foreign;
                }
                self.foreign_currency_code = None;
            }
        }
    }

    pub fn fill_missing_date(&mut self, today: NaiveDate) {
        if self.log_date.is_none() {
            self.log_date = Some(today);
        }
    }
}

/// Incoming body for both parsing functions. The two deployed clients disagree
/// on the text field name, so either is accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseRequest {
    #[serde(alias = "text")]
    pub raw_text: String,
    pub user_id: String,
}

/// Row written to the `logs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLog {
    pub user_id: String,
    pub amount: f64,
    pub foreign_amount: Option<f64>,
    pub foreign_currency_code: Option<String>,
    pub category_id: Option<RecordId>,
    pub account_id: Option<RecordId>,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub item_name: String,
    pub log_date: Option<NaiveDate>,
    pub description: String,
    pub is_verified: bool,
}

impl NewLog {
    pub fn from_parsed(
        user_id: &str,
        raw_text: &str,
        parsed: &ParsedLog,
        category_id: Option<RecordId>,
        account_id: Option<RecordId>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            amount: parsed.amount,
            foreign_amount: parsed.foreign_amount,
            foreign_currency_code: parsed.foreign_currency_code.clone(),
            category_id,
            account_id,
            log_type: parsed.log_type,
            item_name: parsed.item_name.clone(),
            log_date: parsed.log_date,
            description: format!("Voice: {raw_text}"),
            is_verified: false,
        }
    }
}

/// Column values written for one currency; `code` selects the row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyRateUpdate {
    #[serde(skip)]
    pub code: String,
    pub rate_to_usd: f64,
    pub last_updated: DateTime<Utc>,
}
