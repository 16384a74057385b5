//! Bibliography loading and BibTeX export.

pub mod export;
pub mod loader;

pub use export::{bib_to_html, bibtex_to_html};
pub use loader::parse_bibliography_html;

use crate::ast::Bibliography;
use crate::loader::Loader;
use tracing::{debug, warn};

/// Fetch and parse the bibliography fragment at `path`.
///
/// A missing or unreadable fragment is not fatal: the failure is logged and
/// an empty bibliography is returned, so every citation renders as missing.
pub fn load_bibliography<L: Loader + ?Sized>(loader: &L, path: &str) -> Bibliography {
    match loader.load(path) {
        Ok(fragment) => {
            let bib = parse_bibliography_html(&fragment);
            debug!(path, entries = bib.len(), "loaded bibliography");
            bib
        }
        Err(err) => {
            warn!(path, error = %err, "could not load bibliography");
            Bibliography::new()
        }
    }
}
