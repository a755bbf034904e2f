//! Journal service facade.
//!
//! # Responsibility
//! - Single mutation surface for the presentation layer.
//! - Mirror persisted entries in memory, sorted by `date` descending.
//!
//! # Invariants
//! - Memory changes only after the matching store write succeeded; a
//!   partially written import mirrors exactly the rows that landed.
//! - No operation returns an error; failures become notifications.
//! - Deletion is two-step: `request_delete` then `confirm_delete`.
//! - One-entry-per-date is enforced on import only, never on manual saves.

use crate::export::{build_json_export, build_markdown_exports, ExportFile};
use crate::import::{merge_by_date, parse_json_import, ImportError};
use crate::legacy::kv::LegacyKeyValueStore;
use crate::legacy::migration::{migrate_legacy_snapshot, read_legacy_snapshot, MigrationError};
use crate::legacy::LEGACY_ENTRIES_KEY;
use crate::markdown::parse_markdown_content;
use crate::model::entry::{now_timestamp, EntryCandidate, EntryId, JournalEntry};
use crate::service::notification::Notification;
use crate::store::{JournalStore, StoreError};
use log::{error, info, warn};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Whether the session is backed by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// `start` has not run yet.
    Stopped,
    Persistent,
    /// Store unavailable; entries come from the legacy snapshot and live in
    /// memory only.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub mode: ServiceMode,
    pub migrated: usize,
    pub loaded: usize,
}

/// User-authored fields of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub date: String,
    pub main_entry: String,
}

impl EntryDraft {
    pub fn new(date: impl Into<String>, main_entry: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            main_entry: main_entry.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Update(EntryId),
}

/// A named markdown text to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownDocument {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub notification: Notification,
    pub imported: usize,
    pub skipped_duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub notification: Notification,
    pub files: Vec<ExportFile>,
}

/// Facade over one journal store and its legacy snapshot.
pub struct JournalService<'s, L: LegacyKeyValueStore> {
    store: &'s JournalStore,
    legacy: L,
    entries: Vec<JournalEntry>,
    mode: ServiceMode,
    pending_delete: Option<JournalEntry>,
}

impl<'s, L: LegacyKeyValueStore> JournalService<'s, L> {
    pub fn new(store: &'s JournalStore, legacy: L) -> Self {
        Self {
            store,
            legacy,
            entries: Vec::new(),
            mode: ServiceMode::Stopped,
            pending_delete: None,
        }
    }

    /// Current snapshot, newest date first.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    pub fn legacy(&self) -> &L {
        &self.legacy
    }

    pub fn find(&self, id: &EntryId) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// Runs init → legacy migration → initial load.
    ///
    /// Any failure along the chain switches to degraded mode, reading the
    /// legacy snapshot straight into memory. Never fails.
    pub async fn start(&mut self) -> StartupReport {
        info!("event=journal_start module=service status=start");
        match self.load_persistent().await {
            Ok((migrated, entries)) => {
                self.replace_entries(entries);
                self.mode = ServiceMode::Persistent;
                info!(
                    "event=journal_start module=service status=ok mode=persistent migrated={} loaded={}",
                    migrated,
                    self.entries.len()
                );
                StartupReport {
                    mode: self.mode,
                    migrated,
                    loaded: self.entries.len(),
                }
            }
            Err(err) => {
                warn!(
                    "event=journal_start module=service status=degraded error={}",
                    err
                );
                let entries = read_legacy_snapshot(&self.legacy).unwrap_or_else(|err| {
                    error!(
                        "event=legacy_fallback module=service status=error error={}",
                        err
                    );
                    Vec::new()
                });
                self.replace_entries(entries);
                self.mode = ServiceMode::Degraded;
                StartupReport {
                    mode: self.mode,
                    migrated: 0,
                    loaded: self.entries.len(),
                }
            }
        }
    }

    async fn load_persistent(&mut self) -> Result<(usize, Vec<JournalEntry>), StartupFailure> {
        self.store.init().await?;

        let migrated = match migrate_legacy_snapshot(self.store, &self.legacy).await {
            Ok(moved) => moved,
            Err(err @ (MigrationError::Parse(_) | MigrationError::Legacy(_))) => {
                warn!(
                    "event=legacy_migrate module=service status=skipped error={}",
                    err
                );
                0
            }
            Err(err) => return Err(StartupFailure::Migration(err)),
        };

        if migrated > 0 {
            if let Err(err) = self.legacy.remove_item(LEGACY_ENTRIES_KEY) {
                error!(
                    "event=legacy_erase module=service status=error moved={} error={}",
                    migrated, err
                );
            }
        }

        let entries = self.store.get_all().await?;
        Ok((migrated, entries))
    }

    /// Creates or replaces one entry.
    ///
    /// Blank bodies and malformed dates are rejected before any write.
    pub async fn save(&mut self, draft: EntryDraft, mode: SaveMode) -> Notification {
        match mode {
            SaveMode::Create => self.create(draft).await,
            SaveMode::Update(id) => self.update(&id, draft).await,
        }
    }

    async fn create(&mut self, draft: EntryDraft) -> Notification {
        let entry = JournalEntry::new(draft.date, draft.main_entry);
        if let Err(err) = entry.validate() {
            return Notification::warning("Entry Not Saved", err.to_string());
        }

        match self.store.put(&entry).await {
            Ok(id) => {
                info!("event=entry_create module=service status=ok id={id}");
                self.entries.insert(0, entry);
                Notification::success(
                    "Entry Saved",
                    "Your journal entry has been saved successfully.",
                )
            }
            Err(err) => {
                error!("event=entry_create module=service status=error error={err}");
                Notification::error("Save Failed", "Unable to save entry. Please try again.")
            }
        }
    }

    async fn update(&mut self, id: &EntryId, draft: EntryDraft) -> Notification {
        let Some(position) = self.entries.iter().position(|entry| &entry.id == id) else {
            return Notification::error("Update Failed", format!("Entry {id} was not found."));
        };

        let mut updated = self.entries[position].clone();
        updated.date = draft.date;
        updated.main_entry = draft.main_entry;
        updated.timestamp = now_timestamp();
        if let Err(err) = updated.validate() {
            return Notification::warning("Entry Not Saved", err.to_string());
        }

        match self.store.put(&updated).await {
            Ok(_) => {
                info!("event=entry_update module=service status=ok id={id}");
                self.entries[position] = updated;
                Notification::success(
                    "Entry Updated",
                    "Your journal entry has been updated successfully.",
                )
            }
            Err(err) => {
                error!("event=entry_update module=service status=error id={id} error={err}");
                Notification::error("Update Failed", "Unable to update entry. Please try again.")
            }
        }
    }

    /// Stages an entry for deletion and returns it for confirmation.
    pub fn request_delete(&mut self, id: &EntryId) -> Option<&JournalEntry> {
        self.pending_delete = self.find(id).cloned();
        self.pending_delete.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&JournalEntry> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the staged entry. Returns `None` when nothing was staged.
    pub async fn confirm_delete(&mut self) -> Option<Notification> {
        let target = self.pending_delete.take()?;

        let notification = match self.store.delete(&target.id).await {
            Ok(()) => {
                info!("event=entry_delete module=service status=ok id={}", target.id);
                self.entries.retain(|entry| entry.id != target.id);
                Notification::success(
                    "Entry Deleted",
                    "Journal entry has been deleted successfully.",
                )
            }
            Err(err) => {
                error!(
                    "event=entry_delete module=service status=error id={} error={}",
                    target.id, err
                );
                Notification::error("Delete Failed", "Unable to delete entry. Please try again.")
            }
        };
        Some(notification)
    }

    /// Imports a JSON backup document's `entries`.
    pub async fn import_json(&mut self, text: &str) -> ImportOutcome {
        match parse_json_import(text) {
            Ok(candidates) => self.merge_and_persist(candidates, "JSON file").await,
            Err(err) => {
                warn!("event=import_json module=service status=rejected error={err}");
                rejected_import(Notification::error(
                    "Import Error",
                    "Invalid JSON file format. Please make sure it's a valid Dev Journal export file.",
                ))
            }
        }
    }

    pub async fn import_json_file(&mut self, path: impl AsRef<Path>) -> ImportOutcome {
        match read_source(path.as_ref()) {
            Ok(text) => self.import_json(&text).await,
            Err(err) => {
                error!("event=import_json module=service status=error error={err}");
                rejected_import(Notification::error(
                    "Import Error",
                    "Error reading the JSON file. Please try again.",
                ))
            }
        }
    }

    /// Imports every dated section found in `documents`.
    pub async fn import_markdown(&mut self, documents: &[MarkdownDocument]) -> ImportOutcome {
        let mut candidates: Vec<EntryCandidate> = Vec::new();
        for document in documents {
            let parsed = parse_markdown_content(&document.content);
            info!(
                "event=import_markdown module=service status=parsed source={} entries={}",
                document.name,
                parsed.len()
            );
            candidates.extend(parsed.into_iter().map(EntryCandidate::from));
        }
        self.merge_and_persist(candidates, "markdown files").await
    }

    /// Imports `<dir>/<year>.md` for each year; unreadable files are skipped.
    pub async fn import_markdown_years(
        &mut self,
        dir: impl AsRef<Path>,
        years: &[u16],
    ) -> ImportOutcome {
        let dir = dir.as_ref();
        let mut documents = Vec::new();
        for year in years {
            let path = dir.join(format!("{year}.md"));
            match read_source(&path) {
                Ok(content) => documents.push(MarkdownDocument {
                    name: path.display().to_string(),
                    content,
                }),
                Err(err) => warn!(
                    "event=import_markdown module=service status=skipped source={} error={}",
                    path.display(),
                    err
                ),
            }
        }
        self.import_markdown(&documents).await
    }

    async fn merge_and_persist(
        &mut self,
        candidates: Vec<EntryCandidate>,
        source: &str,
    ) -> ImportOutcome {
        let outcome = merge_by_date(candidates, &self.entries);
        let skipped_duplicates = outcome.skipped_duplicates;

        if outcome.is_empty() {
            return ImportOutcome {
                notification: Notification::warning(
                    "No New Entries",
                    format!("All entries from the {source} are already in the system."),
                ),
                imported: 0,
                skipped_duplicates,
            };
        }

        let total = outcome.accepted_count();
        let report = match self.store.put_many(&outcome.accepted).await {
            Ok(report) => report,
            Err(err) => {
                error!("event=import module=service status=error source={source} error={err}");
                return failed_import(skipped_duplicates);
            }
        };

        // Rows that reached the store must also reach memory, or a retry
        // would pass date de-duplication and write the same day twice.
        let written: HashSet<EntryId> = report.written.into_iter().collect();
        let landed: Vec<JournalEntry> = outcome
            .accepted
            .into_iter()
            .filter(|entry| written.contains(&entry.id))
            .collect();
        let imported = landed.len();
        let failed = report.failures.len();

        if imported == 0 {
            error!(
                "event=import module=service status=error source={source} total={total} failed={failed}"
            );
            return failed_import(skipped_duplicates);
        }

        self.entries.extend(landed);
        sort_newest_first(&mut self.entries);

        if failed > 0 {
            warn!(
                "event=import module=service status=partial source={source} imported={imported} failed={failed} skipped={skipped_duplicates}"
            );
            return ImportOutcome {
                notification: Notification::warning(
                    "Import Incomplete",
                    format!(
                        "Imported {imported} of {total} entries from {source}; {failed} could not be saved."
                    ),
                ),
                imported,
                skipped_duplicates,
            };
        }

        info!(
            "event=import module=service status=ok source={source} imported={imported} skipped={skipped_duplicates}"
        );
        ImportOutcome {
            notification: Notification::success(
                "Import Complete",
                format!("Successfully imported {imported} entries from {source}."),
            ),
            imported,
            skipped_duplicates,
        }
    }

    /// Builds the JSON backup of the in-memory set.
    pub fn export_json(&self) -> ExportOutcome {
        if self.entries.is_empty() {
            return empty_export();
        }
        match build_json_export(&self.entries) {
            Ok(file) => ExportOutcome {
                notification: Notification::success(
                    "Export Complete",
                    format!(
                        "Successfully exported {} entries to JSON file.",
                        self.entries.len()
                    ),
                ),
                files: file.into_iter().collect(),
            },
            Err(err) => {
                error!("event=export_json module=service status=error error={err}");
                ExportOutcome {
                    notification: Notification::error(
                        "Export Failed",
                        "Unable to build the export file.",
                    ),
                    files: Vec::new(),
                }
            }
        }
    }

    /// Builds one markdown document per calendar year.
    pub fn export_markdown(&self) -> ExportOutcome {
        if self.entries.is_empty() {
            return empty_export();
        }
        let files = build_markdown_exports(&self.entries);
        ExportOutcome {
            notification: Notification::success(
                "Export Complete",
                format!(
                    "Successfully exported {} entries to {} markdown files.",
                    self.entries.len(),
                    files.len()
                ),
            ),
            files,
        }
    }

    /// Entries with `start <= date <= end`, oldest first.
    ///
    /// Served by the store's date index; degraded sessions filter memory.
    pub async fn entries_between(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<JournalEntry>, Notification> {
        if self.mode == ServiceMode::Degraded {
            let mut found: Vec<JournalEntry> = self
                .entries
                .iter()
                .filter(|entry| entry.date.as_str() >= start && entry.date.as_str() <= end)
                .cloned()
                .collect();
            found.sort_by(|a, b| a.date.cmp(&b.date));
            return Ok(found);
        }

        self.store.get_by_date_range(start, end).await.map_err(|err| {
            error!("event=entries_between module=service status=error error={err}");
            Notification::error("Load Failed", "Unable to load entries for that range.")
        })
    }

    /// Destructive reset: empties the store and the snapshot.
    pub async fn reset(&mut self) -> Notification {
        match self.store.clear_all().await {
            Ok(()) => {
                let removed = self.entries.len();
                self.entries.clear();
                self.pending_delete = None;
                warn!("event=journal_reset module=service status=ok removed={removed}");
                Notification::success("Journal Reset", format!("Removed {removed} entries."))
            }
            Err(err) => {
                error!("event=journal_reset module=service status=error error={err}");
                Notification::error("Reset Failed", "Unable to clear the journal.")
            }
        }
    }

    fn replace_entries(&mut self, mut entries: Vec<JournalEntry>) {
        sort_newest_first(&mut entries);
        self.entries = entries;
        self.pending_delete = None;
    }
}

#[derive(Debug)]
enum StartupFailure {
    Store(StoreError),
    Migration(MigrationError),
}

impl Display for StartupFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Migration(err) => write!(f, "{err}"),
        }
    }
}

impl From<StoreError> for StartupFailure {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}

fn read_source(path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path)
        .map_err(|err| ImportError::Read(format!("{}: {err}", path.display())))
}

fn rejected_import(notification: Notification) -> ImportOutcome {
    ImportOutcome {
        notification,
        imported: 0,
        skipped_duplicates: 0,
    }
}

fn failed_import(skipped_duplicates: usize) -> ImportOutcome {
    ImportOutcome {
        notification: Notification::error(
            "Import Failed",
            "Error importing entries. Please try again.",
        ),
        imported: 0,
        skipped_duplicates,
    }
}

fn empty_export() -> ExportOutcome {
    ExportOutcome {
        notification: Notification::warning("No Entries", "There are no entries to export."),
        files: Vec::new(),
    }
}
