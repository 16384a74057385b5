//! Resolution layer: author records and citation numbering.

pub mod authors;
pub mod citations;

pub use authors::{authors_from, normalize_author};
pub use citations::{normalize_key, resolve_citations};
