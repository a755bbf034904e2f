//! Repository layer: synchronous SQL access to journal entries.
//!
//! # Invariants
//! - Repositories never validate entry content; callers own that.
//! - Repository APIs surface invalid persisted rows as `InvalidData`.

pub mod entry_repo;
