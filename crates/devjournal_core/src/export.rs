//! Export document builders (JSON backup and per-year markdown).
//!
//! # Invariants
//! - JSON backups list entries chronologically and carry count + date range.
//! - Nothing is produced for an empty entry set.

use crate::markdown::writer::{group_by_year, render_year_document};
use crate::model::entry::JournalEntry;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive span of entry dates in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: String,
    pub latest: String,
}

/// Top-level shape of a JSON backup file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: String,
    pub total_entries: usize,
    pub date_range: DateRange,
    pub entries: Vec<JournalEntry>,
}

/// One generated file, ready to be written wherever the caller chooses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

impl ExportDocument {
    /// Builds the backup document, or `None` for an empty set.
    pub fn from_entries(entries: &[JournalEntry], exported_at: DateTime<Utc>) -> Option<Self> {
        let earliest = entries.iter().map(|entry| entry.date.as_str()).min()?;
        let latest = entries.iter().map(|entry| entry.date.as_str()).max()?;

        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.date.cmp(&b.date));

        Some(Self {
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_entries: entries.len(),
            date_range: DateRange {
                earliest: earliest.to_string(),
                latest: latest.to_string(),
            },
            entries: sorted,
        })
    }
}

/// Serializes a JSON backup named `dev-journal-backup-<local date>.json`.
pub fn build_json_export(
    entries: &[JournalEntry],
) -> Result<Option<ExportFile>, serde_json::Error> {
    let Some(document) = ExportDocument::from_entries(entries, Utc::now()) else {
        return Ok(None);
    };
    let contents = serde_json::to_string_pretty(&document)?;
    Ok(Some(ExportFile {
        file_name: format!("dev-journal-backup-{}.json", Local::now().format("%Y-%m-%d")),
        contents,
    }))
}

/// Renders one `<year>.md` file per calendar year present in `entries`.
pub fn build_markdown_exports(entries: &[JournalEntry]) -> Vec<ExportFile> {
    group_by_year(entries)
        .into_iter()
        .map(|(year, group)| ExportFile {
            file_name: format!("{year}.md"),
            contents: render_year_document(&group),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{build_json_export, build_markdown_exports, ExportDocument};
    use crate::model::entry::{EntryId, JournalEntry};
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<JournalEntry> {
        vec![
            JournalEntry::with_id(EntryId::from("2"), "2025-02-01", "b"),
            JournalEntry::with_id(EntryId::from("1"), "2024-06-01", "a"),
            JournalEntry::with_id(EntryId::from("3"), "2025-01-15", "c"),
        ]
    }

    #[test]
    fn document_carries_metadata_and_chronological_entries() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let doc = ExportDocument::from_entries(&sample(), at).unwrap();

        assert_eq!(doc.export_date, "2025-03-01T08:30:00.000Z");
        assert_eq!(doc.total_entries, 3);
        assert_eq!(doc.date_range.earliest, "2024-06-01");
        assert_eq!(doc.date_range.latest, "2025-02-01");
        let dates: Vec<&str> = doc.entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-01", "2025-01-15", "2025-02-01"]);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let file = build_json_export(&sample()).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(value["totalEntries"], 3);
        assert_eq!(value["dateRange"]["earliest"], "2024-06-01");
        assert_eq!(value["entries"][0]["mainEntry"], "a");
        assert!(file.file_name.starts_with("dev-journal-backup-"));
    }

    #[test]
    fn empty_set_exports_nothing() {
        assert!(build_json_export(&[]).unwrap().is_none());
        assert!(build_markdown_exports(&[]).is_empty());
    }

    #[test]
    fn markdown_export_has_one_file_per_year() {
        let files = build_markdown_exports(&sample());
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["2024.md", "2025.md"]);
        assert!(files[1].contents.starts_with("## 2025-01-15\n"));
    }
}
