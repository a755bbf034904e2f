//! Legacy flat-storage snapshot and its one-shot migration.
//!
//! # Responsibility
//! - Model the pre-SQLite key-value storage (`kv`).
//! - Move the serialized entry array into the record store (`migration`).
//!
//! # Invariants
//! - Migration never erases the snapshot; the caller does after success.

pub mod kv;
pub mod migration;

/// Key under which the legacy storage kept the serialized entry array.
pub const LEGACY_ENTRIES_KEY: &str = "journalEntries";
