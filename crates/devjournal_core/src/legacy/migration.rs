//! One-shot transfer of the legacy entry snapshot into the record store.
//!
//! # Invariants
//! - Absent, blank or empty snapshots move nothing and write nothing.
//! - Every migrated row carries `imported = true`.
//! - Re-running with the same snapshot upserts by id, so rows never double.
//!   Rows without an id get one derived from their position and content.

use super::kv::{LegacyKeyValueStore, LegacyStoreError};
use super::LEGACY_ENTRIES_KEY;
use crate::model::entry::{EntryCandidate, EntryId, JournalEntry};
use crate::store::{JournalStore, StoreError};
use log::{info, warn};
use uuid::Uuid;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum MigrationError {
    /// Snapshot payload is not a JSON array of entry-shaped records.
    Parse(String),
    /// Legacy storage itself could not be read.
    Legacy(LegacyStoreError),
    /// Store could not be opened or queried.
    Store(StoreError),
    /// Some rows of the batch were not written.
    PartialWrite { written: usize, failed: usize },
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "legacy snapshot is not valid: {message}"),
            Self::Legacy(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::PartialWrite { written, failed } => write!(
                f,
                "legacy migration wrote {written} entries but {failed} failed"
            ),
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Legacy(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Parse(_) | Self::PartialWrite { .. } => None,
        }
    }
}

impl From<StoreError> for MigrationError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<LegacyStoreError> for MigrationError {
    fn from(value: LegacyStoreError) -> Self {
        Self::Legacy(value)
    }
}

/// Reads the legacy snapshot and returns its entries, if any.
///
/// Shared by the migration and by the degraded-mode fallback.
pub fn read_legacy_snapshot(
    legacy: &impl LegacyKeyValueStore,
) -> Result<Vec<JournalEntry>, MigrationError> {
    let Some(raw) = legacy.get_item(LEGACY_ENTRIES_KEY)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let candidates: Vec<EntryCandidate> =
        serde_json::from_str(&raw).map_err(|err| MigrationError::Parse(err.to_string()))?;

    Ok(candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let id = candidate
                .supplied_id()
                .cloned()
                .unwrap_or_else(|| snapshot_row_id(index, &candidate));
            candidate.into_imported_entry(id)
        })
        .collect())
}

/// Stable key for a snapshot row that carries none.
fn snapshot_row_id(index: usize, candidate: &EntryCandidate) -> EntryId {
    let seed = format!(
        "{index}\u{1f}{}\u{1f}{}",
        candidate.date, candidate.main_entry
    );
    let derived = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());
    EntryId::from(format!("legacy-{}", derived.simple()))
}

/// Moves the legacy snapshot into `store` and returns how many rows moved.
///
/// # Errors
/// - `MigrationError::Parse` when the payload is corrupt. Callers treat this
///   as "nothing to migrate".
/// - `MigrationError::Store` / `PartialWrite` when rows could not be written.
pub async fn migrate_legacy_snapshot(
    store: &JournalStore,
    legacy: &impl LegacyKeyValueStore,
) -> Result<usize, MigrationError> {
    let entries = read_legacy_snapshot(legacy)?;
    if entries.is_empty() {
        info!("event=legacy_migrate module=legacy status=ok moved=0");
        return Ok(0);
    }

    let report = store.put_many(&entries).await?;
    if !report.is_complete() {
        warn!(
            "event=legacy_migrate module=legacy status=error written={} failed={}",
            report.written_count(),
            report.failures.len()
        );
        return Err(MigrationError::PartialWrite {
            written: report.written_count(),
            failed: report.failures.len(),
        });
    }

    info!(
        "event=legacy_migrate module=legacy status=ok moved={}",
        report.written_count()
    );
    Ok(report.written_count())
}
