//! Core persistence and reconciliation logic for DevJournal.
//! This crate is the single source of truth for journal data invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod import;
pub mod legacy;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, JournalConfig};
pub use export::{DateRange, ExportDocument, ExportFile};
pub use import::{merge_by_date, parse_json_import, ImportError, MergeOutcome};
pub use legacy::kv::{FileKeyValueStore, LegacyKeyValueStore, MemoryKeyValueStore};
pub use legacy::migration::{migrate_legacy_snapshot, MigrationError};
pub use legacy::LEGACY_ENTRIES_KEY;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use markdown::parse_markdown_content;
pub use model::entry::{EntryCandidate, EntryId, EntryValidationError, JournalEntry};
pub use repo::entry_repo::{
    BatchWriteReport, EntryRepository, RepoError, RepoResult, SqliteEntryRepository,
};
pub use service::journal_service::{
    EntryDraft, ExportOutcome, ImportOutcome, JournalService, MarkdownDocument, SaveMode,
    ServiceMode, StartupReport,
};
pub use service::notification::{Notification, NotificationLevel};
pub use store::{JournalStore, StoreError, StoreLocation, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
