//! Default values substituted when a piece of prompt context is unavailable.
//!
//! Context reads never abort a request: a failed or empty read is replaced by
//! the value listed here for its field.

use super::config::DEFAULT_BASE_CURRENCY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    /// The user's base currency code.
    BaseCurrency,
    /// Comma-joined category names.
    CategoryNames,
    /// Comma-joined account names.
    AccountNames,
    /// Category name of a history row without one.
    PatternCategory,
    /// Account name of a history row without one.
    PatternAccount,
    /// Any name missing from a compressed history entry.
    CompactUnknown,
}

pub const DEFAULT_FALLBACKS: [(ContextField, &str); 6] = [
    (ContextField::BaseCurrency, DEFAULT_BASE_CURRENCY),
    (ContextField::CategoryNames, "General"),
    (ContextField::AccountNames, "Cash"),
    (ContextField::PatternCategory, "Unk"),
    (ContextField::PatternAccount, "Cash"),
    (ContextField::CompactUnknown, "?"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    entries: Vec<(ContextField, String)>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            entries: DEFAULT_FALLBACKS
                .iter()
                .map(|(field, value)| (*field, (*value).to_string()))
                .collect(),
        }
    }
}

impl FallbackPolicy {
    #[must_use]
    pub fn with_base_currency(mut self, code: &str) -> Self {
        self.set(ContextField::BaseCurrency, code);
        self
    }

    pub fn set(&mut self, field: ContextField, value: &str) {
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((field, value.to_string())),
        }
    }

    #[must_use]
    pub fn value(&self, field: ContextField) -> &str {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map_or("", |(_, v)| v.as_str())
    }

    /// Returns `observed` unless it is missing or blank, in which case the
    /// field's fallback is used.
    #[must_use]
    pub fn resolve(&self, field: ContextField, observed: Option<String>) -> String {
        observed
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.value(field).to_string())
    }
}
