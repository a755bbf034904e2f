//! Line scanner for the journal's markdown authoring convention.
//!
//! Recognized shapes, checked in this order per line:
//! - ```` ``` ```` fences toggle a skipped code block.
//! - `## YYYY-MM-DD` opens a new entry.
//! - `N. text` / `- text` at column 0 add a body line.
//! - indented `N.N text` / `N - text`, or `N - text` at column 0, add a
//!   sub-item.
//! - a line starting with a backtick is kept verbatim in the body.
//! - anything else continues the body once it has content; indented lines
//!   soft-wrap onto the previous line.

use crate::model::entry::{now_timestamp, EntryId, JournalEntry};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^## (\d{4}-\d{2}-\d{2})$").expect("valid header regex"));
static MAIN_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.|-)\s(.*)$").expect("valid main item regex"));
static INDENTED_SUB_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.\d+|\d+\s-)\s(.*)$").expect("valid sub item regex"));
static FLAT_SUB_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s-\s(.*)$").expect("valid flat sub item regex"));

const SOFT_WRAP_INDENT: usize = 2;

/// Parses every dated section of `content` into imported entries.
///
/// Sections whose body ends up blank are dropped. All emitted entries share
/// one parse-time timestamp.
pub fn parse_markdown_content(content: &str) -> Vec<JournalEntry> {
    let timestamp = now_timestamp();
    let mut scanner = Scanner::default();
    for line in content.lines() {
        scanner.feed(line, &timestamp);
    }
    scanner.finish()
}

#[derive(Default)]
struct Scanner {
    entries: Vec<JournalEntry>,
    current: Option<Draft>,
    in_code_block: bool,
}

struct Draft {
    entry: JournalEntry,
    sub_entries: Vec<String>,
}

impl Draft {
    fn push_body_line(&mut self, text: &str) {
        let body = &mut self.entry.main_entry;
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(text);
    }

    fn soft_wrap(&mut self, text: &str) {
        self.entry.main_entry.push(' ');
        self.entry.main_entry.push_str(text);
    }

    fn has_body(&self) -> bool {
        !self.entry.main_entry.is_empty()
    }

    fn into_entry(self) -> JournalEntry {
        let mut entry = self.entry;
        entry.sub_entries = Some(self.sub_entries);
        entry
    }
}

impl Scanner {
    fn feed(&mut self, raw_line: &str, timestamp: &str) {
        let line = raw_line.trim_end();
        let trimmed = line.trim_start();
        let indent = indent_width(line);

        if trimmed.starts_with("```") {
            self.in_code_block = !self.in_code_block;
            return;
        }
        if self.in_code_block {
            return;
        }

        if let Some(caps) = HEADER_RE.captures(trimmed) {
            self.flush();
            let mut entry = JournalEntry::with_id(EntryId::generate(), &caps[1], "");
            entry.timestamp = timestamp.to_string();
            entry.imported = true;
            self.current = Some(Draft {
                entry,
                sub_entries: Vec::new(),
            });
            return;
        }

        let Some(draft) = self.current.as_mut() else {
            return;
        };

        if indent == 0 {
            if let Some(caps) = MAIN_ITEM_RE.captures(line) {
                draft.push_body_line(&caps[1]);
                return;
            }
            if let Some(caps) = FLAT_SUB_ITEM_RE.captures(line) {
                draft.sub_entries.push(caps[1].to_string());
                return;
            }
        } else if let Some(caps) = INDENTED_SUB_ITEM_RE.captures(trimmed) {
            draft.sub_entries.push(caps[1].to_string());
            return;
        }

        if trimmed.starts_with('`') {
            draft.push_body_line(trimmed);
            return;
        }

        if trimmed.is_empty() || is_structural(trimmed) || !draft.has_body() {
            return;
        }

        if indent >= SOFT_WRAP_INDENT {
            draft.soft_wrap(trimmed);
        } else {
            draft.push_body_line(trimmed);
        }
    }

    fn flush(&mut self) {
        if let Some(draft) = self.current.take() {
            self.entries.push(draft.into_entry());
        }
    }

    fn finish(mut self) -> Vec<JournalEntry> {
        self.flush();
        let parsed = self.entries.len();
        let entries: Vec<JournalEntry> = self
            .entries
            .into_iter()
            .filter(|entry| !entry.main_entry.trim().is_empty())
            .collect();
        debug!(
            "event=markdown_parse module=markdown status=ok sections={} entries={}",
            parsed,
            entries.len()
        );
        entries
    }
}

/// Headers, horizontal rules and setext underlines never continue a body.
fn is_structural(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with('=') || trimmed.starts_with("---")
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { SOFT_WRAP_INDENT } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::parse_markdown_content;

    #[test]
    fn splits_sections_on_date_headers() {
        let text = "## 2025-01-01\n1. first day\n## 2025-01-02\n- second day\n";
        let entries = parse_markdown_content(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "2025-01-01");
        assert_eq!(entries[0].main_entry, "first day");
        assert_eq!(entries[1].main_entry, "second day");
        assert!(entries.iter().all(|entry| entry.imported));
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn joins_multiple_items_with_newlines() {
        let entries = parse_markdown_content("## 2025-01-01\n1. one\n2. two\n- three\n");
        assert_eq!(entries[0].main_entry, "one\ntwo\nthree");
    }

    #[test]
    fn collects_sub_items_in_order() {
        let text = "## 2025-01-01\n1. main\n  1.1 alpha\n   2 - beta\n3 - gamma\n";
        let entries = parse_markdown_content(text);
        assert_eq!(
            entries[0].sub_entries.as_deref(),
            Some(&["alpha".to_string(), "beta".to_string(), "gamma".to_string()][..])
        );
        assert_eq!(entries[0].main_entry, "main");
    }

    #[test]
    fn skips_fenced_code_blocks() {
        let text = "## 2025-01-01\n1. before\n```rust\n1. not an item\n## 2025-09-09\n```\nafter\n";
        let entries = parse_markdown_content(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].main_entry, "before\nafter");
    }

    #[test]
    fn keeps_inline_code_lines_verbatim() {
        let entries = parse_markdown_content("## 2025-01-01\n`cargo test` passed\n");
        assert_eq!(entries[0].main_entry, "`cargo test` passed");
    }

    #[test]
    fn continuation_lines_wrap_or_append() {
        let text = "## 2025-01-01\n1. long line\n   that wraps\nnew line\n---\n# Title\n";
        let entries = parse_markdown_content(text);
        assert_eq!(entries[0].main_entry, "long line that wraps\nnew line");
    }

    #[test]
    fn continuation_needs_existing_body() {
        let entries = parse_markdown_content("## 2025-01-01\nloose text\n1. item\n");
        assert_eq!(entries[0].main_entry, "item");
    }

    #[test]
    fn drops_sections_with_blank_body() {
        let text = "preamble\n## 2025-01-01\n  1.1 only a sub item\n## 2025-01-02\n1. kept\n";
        let entries = parse_markdown_content(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, "2025-01-02");
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let entries = parse_markdown_content("## 2025-01-01\r\n1. windows\r\n");
        assert_eq!(entries[0].date, "2025-01-01");
        assert_eq!(entries[0].main_entry, "windows");
    }
}
