use serde::Serialize;

use crate::core::models::{NamedRecord, RecordId};

/// How a model-supplied name was mapped onto the user's records.
#[derive(Debug, Clone, PartialEq)]
pub enum NameMatch<'a> {
    /// Case-insensitive exact match.
    Exact(&'a NamedRecord),
    /// No match; the first record was used instead.
    Fallback(&'a NamedRecord),
    /// The user has no records to fall back on.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fallback,
    Unresolved,
}

impl NameMatch<'_> {
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        match self {
            NameMatch::Exact(r) | NameMatch::Fallback(r) => Some(r.id.clone()),
            NameMatch::Unresolved => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> MatchKind {
        match self {
            NameMatch::Exact(_) => MatchKind::Exact,
            NameMatch::Fallback(_) => MatchKind::Fallback,
            NameMatch::Unresolved => MatchKind::Unresolved,
        }
    }
}

/// Finds the record whose name equals `name` ignoring case and surrounding
/// whitespace, falling back to the first record.
///
/// A fallback is not a confirmed match: the entry may land under the wrong
/// category or account. Callers report the [`MatchKind`] so it stays visible.
#[must_use]
pub fn resolve_by_name<'a>(records: &'a [NamedRecord], name: Option<&str>) -> NameMatch<'a> {
    let wanted = name.map(|n| n.trim().to_lowercase()).unwrap_or_default();

    if !wanted.is_empty()
        && let Some(record) = records
            .iter()
            .find(|r| r.name.trim().to_lowercase() == wanted)
    {
        return NameMatch::Exact(record);
    }

    records
        .first()
        .map_or(NameMatch::Unresolved, NameMatch::Fallback)
}
