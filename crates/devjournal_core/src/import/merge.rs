//! Date-keyed merge of import candidates into the known entry set.
//!
//! # Invariants
//! - A candidate whose `date` already exists (in `existing` or earlier in the
//!   same batch) is skipped; the first occurrence wins.
//! - Accepted entries always carry `imported = true`.
//! - Accepted ids never collide with `existing` ids or with each other; a
//!   colliding or missing id is replaced by a generated one.

use crate::model::entry::{EntryCandidate, EntryId, JournalEntry};
use std::collections::HashSet;

/// Result of merging one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// New entries to persist, in batch order.
    pub accepted: Vec<JournalEntry>,
    /// Candidates dropped because their date was already present.
    pub skipped_duplicates: usize,
}

impl MergeOutcome {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Filters `candidates` down to days not yet present in `existing`.
pub fn merge_by_date(
    candidates: impl IntoIterator<Item = EntryCandidate>,
    existing: &[JournalEntry],
) -> MergeOutcome {
    let mut seen_dates: HashSet<String> = existing.iter().map(|entry| entry.date.clone()).collect();
    let mut taken_ids: HashSet<EntryId> = existing.iter().map(|entry| entry.id.clone()).collect();
    let mut outcome = MergeOutcome::default();

    for candidate in candidates {
        if !seen_dates.insert(candidate.date.clone()) {
            outcome.skipped_duplicates += 1;
            continue;
        }

        let id = match candidate.supplied_id() {
            Some(id) if !taken_ids.contains(id) => id.clone(),
            _ => EntryId::generate(),
        };
        taken_ids.insert(id.clone());
        outcome.accepted.push(candidate.into_imported_entry(id));
    }

    outcome
}
