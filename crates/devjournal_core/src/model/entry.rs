//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the single persisted record (`JournalEntry`) and its identifier.
//! - Define the lenient input shape (`EntryCandidate`) accepted from legacy
//!   snapshots and JSON imports.
//!
//! # Invariants
//! - `id` is stable and never reused for another entry.
//! - `date` is a zero-padded `YYYY-MM-DD` string, so lexicographic order
//!   equals chronological order.
//! - Updates replace the whole record; there are no partial-field writes.

use chrono::{NaiveDate, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Opaque primary key of a journal entry.
///
/// Legacy data used numeric millisecond ids (sometimes fractional); those are
/// accepted on input and kept as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Generates a fresh id from the current instant plus random bits.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        Self(format!("{millis}-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for ids that legacy code treated as "no id" (`""`, `0`).
    fn is_blank(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed == "0"
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self(value),
            RawId::Integer(value) => Self(value.to_string()),
            RawId::Float(value) => Self(value.to_string()),
        })
    }
}

/// The sole persisted entity: one dated journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    /// Calendar day, `YYYY-MM-DD`. Natural key for import de-duplication.
    pub date: String,
    /// Markdown body.
    pub main_entry: String,
    /// Supplementary items; only markdown import populates this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_entries: Option<Vec<String>>,
    /// ISO-8601 instant of creation or last modification.
    pub timestamp: String,
    /// Provenance marker for migrated/imported rows.
    #[serde(default, skip_serializing_if = "is_false")]
    pub imported: bool,
}

/// Validation failures for manually authored entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    InvalidDate(String),
    EmptyBody,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => {
                write!(f, "invalid entry date `{value}`; expected YYYY-MM-DD")
            }
            Self::EmptyBody => write!(f, "entry body must not be empty"),
        }
    }
}

impl Error for EntryValidationError {}

impl JournalEntry {
    /// Creates a manually authored entry with a generated id and current timestamp.
    pub fn new(date: impl Into<String>, main_entry: impl Into<String>) -> Self {
        Self::with_id(EntryId::generate(), date, main_entry)
    }

    /// Creates an entry with a caller-provided id.
    pub fn with_id(id: EntryId, date: impl Into<String>, main_entry: impl Into<String>) -> Self {
        Self {
            id,
            date: date.into(),
            main_entry: main_entry.into(),
            sub_entries: None,
            timestamp: now_timestamp(),
            imported: false,
        }
    }

    /// Checks the caller-side rules for persisting an entry.
    ///
    /// The store never calls this; it accepts whatever it is given.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if !is_valid_date(&self.date) {
            return Err(EntryValidationError::InvalidDate(self.date.clone()));
        }
        if self.main_entry.trim().is_empty() {
            return Err(EntryValidationError::EmptyBody);
        }
        Ok(())
    }

    /// Four-digit calendar year prefix of `date`, if present.
    pub fn year(&self) -> Option<&str> {
        self.date.get(..4).filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Lenient record shape read from legacy snapshots and import files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCandidate {
    #[serde(default)]
    pub id: Option<EntryId>,
    pub date: String,
    #[serde(default)]
    pub main_entry: String,
    #[serde(default)]
    pub sub_entries: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub imported: Option<bool>,
}

impl EntryCandidate {
    /// Supplied id, unless it is one of the values legacy code treated as absent.
    pub fn supplied_id(&self) -> Option<&EntryId> {
        self.id.as_ref().filter(|id| !id.is_blank())
    }

    /// Converts into a persisted shape marked as imported.
    ///
    /// `id` replaces whatever the candidate carried.
    pub fn into_imported_entry(self, id: EntryId) -> JournalEntry {
        JournalEntry {
            id,
            date: self.date,
            main_entry: self.main_entry,
            sub_entries: self.sub_entries,
            timestamp: self.timestamp.unwrap_or_else(now_timestamp),
            imported: true,
        }
    }
}

impl From<JournalEntry> for EntryCandidate {
    fn from(entry: JournalEntry) -> Self {
        Self {
            id: Some(entry.id),
            date: entry.date,
            main_entry: entry.main_entry,
            sub_entries: entry.sub_entries,
            timestamp: Some(entry.timestamp),
            imported: Some(entry.imported),
        }
    }
}

/// Current instant in the `YYYY-MM-DDTHH:MM:SS.sssZ` form.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns whether `value` is a real zero-padded calendar day.
pub fn is_valid_date(value: &str) -> bool {
    DATE_RE.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::{is_valid_date, EntryCandidate, EntryId, EntryValidationError, JournalEntry};

    #[test]
    fn entry_id_accepts_numeric_and_text_json() {
        let int: EntryId = serde_json::from_str("1692000000000").unwrap();
        assert_eq!(int.as_str(), "1692000000000");
        let float: EntryId = serde_json::from_str("1692000000000.5").unwrap();
        assert_eq!(float.as_str(), "1692000000000.5");
        let text: EntryId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(text.as_str(), "abc");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(EntryId::generate(), EntryId::generate());
    }

    #[test]
    fn date_validation_requires_padded_real_day() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2025-02-29"));
        assert!(!is_valid_date("2025-1-05"));
        assert!(!is_valid_date("05/01/2025"));
    }

    #[test]
    fn validate_rejects_blank_body() {
        let entry = JournalEntry::new("2025-01-05", "   \n");
        assert_eq!(entry.validate(), Err(EntryValidationError::EmptyBody));
    }

    #[test]
    fn serialization_omits_absent_optional_fields() {
        let entry = JournalEntry::with_id("1".into(), "2025-01-05", "A");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["mainEntry"], "A");
        assert!(value.get("subEntries").is_none());
        assert!(value.get("imported").is_none());
    }

    #[test]
    fn candidate_treats_zero_and_empty_ids_as_absent() {
        let zero: EntryCandidate =
            serde_json::from_str(r#"{"id":0,"date":"2025-01-05","mainEntry":"x"}"#).unwrap();
        assert!(zero.supplied_id().is_none());
        let empty: EntryCandidate =
            serde_json::from_str(r#"{"id":"","date":"2025-01-05"}"#).unwrap();
        assert!(empty.supplied_id().is_none());
        assert_eq!(empty.main_entry, "");
    }

    #[test]
    fn year_reads_date_prefix() {
        let entry = JournalEntry::new("2025-03-01", "x");
        assert_eq!(entry.year(), Some("2025"));
    }
}
