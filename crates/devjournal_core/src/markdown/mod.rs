//! Journal markdown convention: parsing for import, rendering for export.

pub mod parser;
pub mod writer;

pub use parser::parse_markdown_content;
pub use writer::{group_by_year, render_year_document};
