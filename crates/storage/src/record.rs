use chrono::{DateTime, NaiveDateTime, Utc};
use quiz_core::model::{HistoryEntry, QuestionId, SessionStats, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::repository::StorageError;

/// Typed snapshot of one user's progress.
///
/// This is what the session hands to the gateway and gets back from it. The
/// text encoding used by the backing table lives in [`SheetRow`].
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub history: BTreeMap<QuestionId, HistoryEntry>,
    pub marked: BTreeSet<QuestionId>,
    pub stats: SessionStats,
    pub last_question_index: QuestionId,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PersistedRecord {
    fn default() -> Self {
        Self {
            history: BTreeMap::new(),
            marked: BTreeSet::new(),
            stats: SessionStats::default(),
            last_question_index: QuestionId::new(0),
            updated_at: None,
        }
    }
}

/// One row of the backing table, exactly as stored: structured fields are
/// JSON text, cells may be blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub user_id: String,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub marked: Option<String>,
    #[serde(default)]
    pub stats: Option<String>,
    #[serde(default)]
    pub last_question_index: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatsDoc {
    correct: u32,
    incorrect: u32,
    #[serde(default)]
    total: Option<u32>,
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn non_blank(cell: Option<&String>) -> Option<&str> {
    cell.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl PersistedRecord {
    /// Encode into a table row keyed by `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a field cannot be encoded.
    pub fn to_row(&self, user: &UserId) -> Result<SheetRow, StorageError> {
        let history: BTreeMap<String, HistoryEntry> = self
            .history
            .iter()
            .map(|(id, entry)| (id.to_string(), *entry))
            .collect();
        let marked: Vec<usize> = self.marked.iter().map(QuestionId::index).collect();
        let stats = StatsDoc {
            correct: self.stats.correct(),
            incorrect: self.stats.incorrect(),
            total: Some(self.stats.total()),
        };
        let last = i64::try_from(self.last_question_index.index())
            .map_err(|_| StorageError::Serialization("last_question_index overflow".into()))?;

        Ok(SheetRow {
            user_id: user.as_str().to_owned(),
            history: Some(serde_json::to_string(&history).map_err(ser)?),
            marked: Some(serde_json::to_string(&marked).map_err(ser)?),
            stats: Some(serde_json::to_string(&stats).map_err(ser)?),
            last_question_index: Some(last),
            updated_at: self.updated_at.map(|t| t.to_rfc3339()),
        })
    }
}

impl SheetRow {
    /// Decode the row. Blank cells fall back to empty defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when a non-blank cell holds
    /// malformed text.
    pub fn to_record(&self) -> Result<PersistedRecord, StorageError> {
        let history = match non_blank(self.history.as_ref()) {
            Some(text) => {
                let raw: BTreeMap<String, HistoryEntry> = serde_json::from_str(text).map_err(ser)?;
                raw.into_iter()
                    .map(|(key, mut entry)| {
                        let id = key.parse::<QuestionId>().map_err(ser)?;
                        entry.attempts = entry.attempts.max(1);
                        Ok((id, entry))
                    })
                    .collect::<Result<BTreeMap<_, _>, StorageError>>()?
            }
            None => BTreeMap::new(),
        };

        let marked = match non_blank(self.marked.as_ref()) {
            Some(text) => {
                let raw: Vec<usize> = serde_json::from_str(text).map_err(ser)?;
                raw.into_iter().map(QuestionId::new).collect()
            }
            None => BTreeSet::new(),
        };

        let stats = match non_blank(self.stats.as_ref()) {
            Some(text) => {
                let doc: StatsDoc = serde_json::from_str(text).map_err(ser)?;
                let stats = SessionStats::new(doc.correct, doc.incorrect);
                if let Some(total) = doc.total.filter(|&t| t != stats.total()) {
                    tracing::warn!(
                        user_id = %self.user_id,
                        stored = total,
                        derived = stats.total(),
                        "persisted stats total disagrees with its parts; using correct + incorrect"
                    );
                }
                stats
            }
            None => SessionStats::default(),
        };

        let last_question_index = match self.last_question_index {
            Some(v) => QuestionId::new(usize::try_from(v).map_err(|_| {
                StorageError::Serialization(format!("invalid last_question_index: {v}"))
            })?),
            None => QuestionId::new(0),
        };

        let updated_at = non_blank(self.updated_at.as_ref()).and_then(parse_timestamp);

        Ok(PersistedRecord {
            history,
            marked,
            stats,
            last_question_index,
            updated_at,
        })
    }
}

// RFC 3339, or a naive ISO timestamp read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
