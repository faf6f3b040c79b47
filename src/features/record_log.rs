use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::parse_log::LogParser;
use crate::core::models::{NewLog, ParseRequest};
use crate::errors::LedgerError;
use crate::prompt::PromptStyle;
use crate::utils::matching::{MatchKind, NameMatch};

/// Outcome of a parse-and-insert run.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedLog {
    /// The row as stored.
    pub log: Value,
    pub category_match: MatchKind,
    pub account_match: MatchKind,
}

fn note_fallback(kind: &str, name: Option<&str>, matched: &NameMatch<'_>) {
    if let NameMatch::Fallback(record) = matched {
        warn!(
            "No {} named {:?}; filed under first {} {:?}",
            kind,
            name.unwrap_or(""),
            kind,
            record.name
        );
    }
}

impl LogParser<'_> {
    /// Parses `request` with the compact prompt and inserts the result as a new,
    /// unverified log.
    ///
    /// # Errors
    ///
    /// Everything [`LogParser::parse`] can return, plus the storage error if the
    /// insert fails. Nothing is inserted when parsing fails.
    pub async fn parse_and_record(
        &self,
        request: &ParseRequest,
        now: DateTime<Utc>,
    ) -> Result<RecordedLog, LedgerError> {
        let outcome = self.parse(request, PromptStyle::Compact, now).await?;

        let category = outcome.category_match();
        let account = outcome.account_match();
        note_fallback("category", outcome.parsed.category_name.as_deref(), &category);
        note_fallback("account", outcome.parsed.account_name.as_deref(), &account);

        let new_log = NewLog::from_parsed(
            &request.user_id,
            &request.raw_text,
            &outcome.parsed,
            category.id(),
            account.id(),
        );

        let log = self.store.insert_log(&new_log).await?;
        info!(user_id = %request.user_id, "Log recorded");

        Ok(RecordedLog {
            log,
            category_match: category.kind(),
            account_match: account.kind(),
        })
    }
}
