//! Inline footnotes.
//!
//! Footnotes are written `^[{ ... }]` in the markdown and survive rendering
//! as literal tokens around their rendered contents. Each token becomes an
//! empty, focusable trigger span; the contents go to a [`FootnoteMap`] for
//! the tooltip.

use crate::ast::FootnoteMap;
use crate::html::{escape_attr, strip_tags};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\^\[\{(.*?)\}\]").expect("valid footnote regex"));

/// Replace footnote tokens in rendered HTML with trigger spans.
///
/// Ids are `fn-0`, `fn-1`, ... in document order. The stored HTML is raw;
/// sanitizing happens when a footnote is displayed.
pub fn extract_footnotes(html: &str) -> (String, FootnoteMap) {
    let mut notes = FootnoteMap::new();
    let mut counter = 0usize;

    let replaced = FOOTNOTE.replace_all(html, |caps: &regex::Captures<'_>| {
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let id = format!("fn-{counter}");
        counter += 1;

        let label = escape_attr(strip_tags(inner).trim());
        notes.insert(id.clone(), inner.to_string());
        format!(
            r#"<span class="fn" data-fn-id="{id}" tabindex="0" role="button" aria-haspopup="true" aria-expanded="false" aria-label="{label}"></span>"#
        )
    });

    debug!(count = notes.len(), "extracted footnotes");
    (replaced.into_owned(), notes)
}
