//! Per-year markdown rendering, the inverse of `markdown::parser`.
//!
//! Each entry becomes:
//!
//! ```text
//! ## 2025-01-05
//!
//! 1. first body line
//! 2. second body line
//!   1.1 first sub-item
//!   2.1 second sub-item
//! ```
//!
//! Body lines are numbered so that fence-like or bullet-like body text is
//! read back as body text instead of structure. Blank body lines are dropped.

use crate::model::entry::JournalEntry;
use log::warn;
use std::collections::BTreeMap;

/// Groups entries by the year prefix of `date`, each group sorted by date.
///
/// Entries without a four-digit year prefix are skipped.
pub fn group_by_year(entries: &[JournalEntry]) -> BTreeMap<String, Vec<&JournalEntry>> {
    let mut years: BTreeMap<String, Vec<&JournalEntry>> = BTreeMap::new();
    for entry in entries {
        match entry.year() {
            Some(year) => years.entry(year.to_string()).or_default().push(entry),
            None => warn!(
                "event=markdown_export module=markdown status=skip reason=undated id={}",
                entry.id
            ),
        }
    }
    for group in years.values_mut() {
        group.sort_by(|a, b| a.date.cmp(&b.date));
    }
    years
}

/// Renders one year's entries as a markdown document.
pub fn render_year_document(entries: &[&JournalEntry]) -> String {
    let sections: Vec<String> = entries.iter().map(|entry| render_entry(entry)).collect();
    sections.join("\n")
}

fn render_entry(entry: &JournalEntry) -> String {
    let mut out = format!("## {}\n\n", entry.date);

    let body_lines = entry
        .main_entry
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty());
    for (index, line) in body_lines.enumerate() {
        out.push_str(&format!("{}. {}\n", index + 1, line));
    }

    // Blank items are skipped; a bare `N.1` line does not parse as a sub-item.
    let sub_items = entry
        .sub_entries
        .iter()
        .flatten()
        .map(|item| item.replace(['\r', '\n'], " "))
        .filter(|item| !item.trim().is_empty());
    for (index, item) in sub_items.enumerate() {
        out.push_str(&format!("  {}.1 {}\n", index + 1, item.trim()));
    }

    out
}
