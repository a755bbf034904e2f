//! Journal domain model.
//!
//! # Invariants
//! - Every record is identified by a stable `EntryId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod entry;
