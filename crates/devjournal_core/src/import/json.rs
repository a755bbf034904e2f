//! JSON export documents as an import source.
//!
//! Only the top-level `entries` array matters; `exportDate`, `totalEntries`
//! and `dateRange` are ignored on import.

use super::ImportError;
use crate::model::entry::EntryCandidate;
use serde::Deserialize;
use serde_json::Value;

/// Parses a JSON document into import candidates.
///
/// # Errors
/// - `ImportError::InvalidFormat` when the text is not JSON, has no
///   top-level `entries` array, or an element is not entry-shaped.
pub fn parse_json_import(text: &str) -> Result<Vec<EntryCandidate>, ImportError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|err| ImportError::InvalidFormat(format!("not valid JSON: {err}")))?;

    let Some(Value::Array(items)) = document.get("entries") else {
        return Err(ImportError::InvalidFormat(
            "'entries' array not found".to_string(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            EntryCandidate::deserialize(item).map_err(|err| {
                ImportError::InvalidFormat(format!("entries[{index}] is not an entry: {err}"))
            })
        })
        .collect()
}
