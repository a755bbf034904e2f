use devjournal_core::export::build_markdown_exports;
use devjournal_core::{parse_markdown_content, EntryId, JournalEntry};

fn entry(id: &str, date: &str, body: &str, subs: &[&str]) -> JournalEntry {
    let mut entry = JournalEntry::with_id(EntryId::from(id), date, body);
    if !subs.is_empty() {
        entry.sub_entries = Some(subs.iter().map(|s| s.to_string()).collect());
    }
    entry
}

#[test]
fn exported_year_document_parses_back_to_the_same_content() {
    let originals = vec![
        entry(
            "1",
            "2025-01-02",
            "Fixed the flaky login test\nReviewed the cache PR",
            &["root cause was a shared fixture"],
        ),
        entry("2", "2025-01-01", "- kickoff meeting", &[]),
        entry("3", "2025-01-03", "Read about `Arc<Mutex<T>>`", &["one", "two"]),
    ];

    let files = build_markdown_exports(&originals);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "2025.md");

    let parsed = parse_markdown_content(&files[0].contents);
    let dates: Vec<&str> = parsed.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);

    assert_eq!(parsed[0].main_entry, "- kickoff meeting");
    assert_eq!(parsed[0].sub_entries, Some(Vec::new()));
    assert_eq!(
        parsed[1].main_entry,
        "Fixed the flaky login test\nReviewed the cache PR"
    );
    assert_eq!(
        parsed[1].sub_entries,
        Some(vec!["root cause was a shared fixture".to_string()])
    );
    assert_eq!(parsed[2].main_entry, "Read about `Arc<Mutex<T>>`");
    assert_eq!(
        parsed[2].sub_entries,
        Some(vec!["one".to_string(), "two".to_string()])
    );
    assert!(parsed.iter().all(|e| e.imported));
}

#[test]
fn blank_sub_entries_do_not_leak_into_the_body() {
    let mut original = entry("1", "2025-01-05", "Did X", &[]);
    original.sub_entries = Some(vec![String::new(), "wrote test".to_string(), " ".to_string()]);

    let files = build_markdown_exports(&[original]);
    let parsed = parse_markdown_content(&files[0].contents);

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].main_entry, "Did X");
    assert_eq!(parsed[0].sub_entries, Some(vec!["wrote test".to_string()]));
}

#[test]
fn hand_written_document_with_mixed_shapes() {
    let content = "\
# 2025 journal

## 2025-02-10

1. Shipped the importer
   including the markdown path
2. Paired on the release
  2.1 tagged v0.3
3 - flat sub item

```
## 2025-02-11
1. inside a fence, ignored
```

## 2025-02-12

---

## 2025-02-13
- single bullet
`inline code line`
";

    let parsed = parse_markdown_content(content);

    let dates: Vec<&str> = parsed.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-02-10", "2025-02-13"]);
    assert_eq!(
        parsed[0].main_entry,
        "Shipped the importer including the markdown path\nPaired on the release"
    );
    assert_eq!(
        parsed[0].sub_entries,
        Some(vec!["tagged v0.3".to_string(), "flat sub item".to_string()])
    );
    assert_eq!(parsed[1].main_entry, "single bullet\n`inline code line`");
    assert_eq!(parsed[0].timestamp, parsed[1].timestamp);
    assert_ne!(parsed[0].id, parsed[1].id);
}
