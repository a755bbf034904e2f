//! Bulk import: source parsing and date-keyed merge.
//!
//! # Responsibility
//! - Parse external batches (JSON export documents) into candidates.
//! - Merge candidates against the known entry set by natural key (`date`).
//!
//! # See also
//! - `markdown::parser` for the second import source.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod json;
pub mod merge;

pub use json::parse_json_import;
pub use merge::{merge_by_date, MergeOutcome};

#[derive(Debug)]
pub enum ImportError {
    /// Document is not JSON, lacks an `entries` array, or holds a
    /// non-entry element.
    InvalidFormat(String),
    /// Import source could not be read.
    Read(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(message) => write!(f, "invalid import format: {message}"),
            Self::Read(message) => write!(f, "failed to read import source: {message}"),
        }
    }
}

impl Error for ImportError {}
