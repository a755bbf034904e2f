//! Journal use-case facade.
//!
//! # Responsibility
//! - Sequence startup (init, legacy migration, initial load).
//! - Keep the in-memory snapshot the presentation layer renders from.
//! - Turn every store/import/migration failure into a `Notification`.

pub mod journal_service;
pub mod notification;
