//! Citation resolution.
//!
//! Rewrites `[@key]` and `[@a; @b]` groups in markdown source into numbered
//! superscript markers. Fenced code is copied through untouched; inline
//! footnote blocks (`^[{...}]`) are kept intact but their contents are
//! rewritten with the same numbering.

use crate::ast::CitationOrder;
use crate::parser::lexer::{citation_group, citation_keys};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced code regex"));

static FOOTNOTE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\^\[\{(.*?)\}\]").expect("valid footnote regex"));

/// Normalize a citation key: keep `[A-Za-z0-9_:-]`, lowercase the rest.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Replace every citation group in `markdown`, assigning numbers in
/// document order.
pub fn resolve_citations(markdown: &str, order: &mut CitationOrder) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut last = 0;

    for code in FENCED_CODE.find_iter(markdown) {
        resolve_prose(&markdown[last..code.start()], order, &mut out);
        out.push_str(code.as_str());
        last = code.end();
    }
    resolve_prose(&markdown[last..], order, &mut out);

    debug!(cited = order.seen().len(), "resolved citations");
    out
}

fn resolve_prose(text: &str, order: &mut CitationOrder, out: &mut String) {
    let mut last = 0;

    for caps in FOOTNOTE_BLOCK.captures_iter(text) {
        let (Some(block), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        replace_groups(&text[last..block.start()], order, out);
        out.push_str("^[{");
        replace_groups(inner.as_str(), order, out);
        out.push_str("}]");
        last = block.end();
    }
    replace_groups(&text[last..], order, out);
}

fn replace_groups(text: &str, order: &mut CitationOrder, out: &mut String) {
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let Ok((after, inner)) = citation_group(candidate) else {
            out.push('[');
            rest = &candidate[1..];
            continue;
        };
        match citation_marker(inner, order) {
            Some(marker) => out.push_str(&marker),
            None => out.push_str(&candidate[..candidate.len() - after.len()]),
        }
        rest = after;
    }
    out.push_str(rest);
}

/// Build the marker for one group, or `None` when no key survives
/// normalization.
fn citation_marker(inner: &str, order: &mut CitationOrder) -> Option<String> {
    let keys: Vec<String> = citation_keys(inner)
        .iter()
        .map(|k| normalize_key(k))
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return None;
    }

    let numbers: Vec<String> = keys
        .iter()
        .map(|k| order.number_for(k).to_string())
        .collect();

    Some(format!(
        r#"<sup><span class="cite" tabindex="0" data-keys="{}">[{}]</span></sup>"#,
        keys.join(","),
        numbers.join(",")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn marker(keys: &str, nums: &str) -> String {
        format!(r#"<sup><span class="cite" tabindex="0" data-keys="{keys}">[{nums}]</span></sup>"#)
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Smith2020"), "smith2020");
        assert_eq!(normalize_key("doe:2021-a_b"), "doe:2021-a_b");
        assert_eq!(normalize_key("we!rd key"), "werdkey");
        assert_eq!(normalize_key("%%"), "");
    }

    #[test]
    fn test_normalize_key_idempotent() {
        for key in ["Smith2020", "a.b/c", "Ünïcode-Key", "x:Y_z"] {
            let once = normalize_key(key);
            assert_eq!(normalize_key(&once), once);
        }
    }

    #[test]
    fn test_numbering_in_first_seen_order() {
        let mut order = CitationOrder::new();
        let out = resolve_citations("See [@foo] and [@bar; @foo].", &mut order);

        assert_eq!(
            out,
            format!("See {} and {}.", marker("foo", "1"), marker("bar,foo", "2,1"))
        );
        assert_eq!(order.get("foo"), Some(1));
        assert_eq!(order.get("bar"), Some(2));
        assert_eq!(order.seen(), ["foo", "bar"]);
    }

    #[test]
    fn test_numbers_strictly_increase_with_seen() {
        let mut order = CitationOrder::new();
        resolve_citations("[@c] [@a, @b] [@c; @d] [@A]", &mut order);

        let numbers: Vec<usize> = order.seen().iter().filter_map(|k| order.get(k)).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(order.seen(), ["c", "a", "b", "d"]);
    }

    #[test]
    fn test_fenced_code_untouched() {
        let mut order = CitationOrder::new();
        let input = "Before [@a]\n```\nlet x = [@b];\n```\nAfter [@c]";
        let out = resolve_citations(input, &mut order);

        assert!(out.contains("```\nlet x = [@b];\n```"));
        assert_eq!(order.seen(), ["a", "c"]);
    }

    #[test]
    fn test_footnote_contents_resolved() {
        let mut order = CitationOrder::new();
        let out = resolve_citations("Text^[{see [@x]}] then [@y]", &mut order);

        assert_eq!(
            out,
            format!("Text^[{{see {}}}] then {}", marker("x", "1"), marker("y", "2"))
        );
    }

    #[test]
    fn test_non_citation_brackets_kept() {
        let mut order = CitationOrder::new();
        let input = "A [link](http://x) and [plain] and [@ok] and email [a@b.c]";
        let out = resolve_citations(input, &mut order);

        assert_eq!(
            out,
            format!("A [link](http://x) and [plain] and {} and email [a@b.c]", marker("ok", "1"))
        );
    }

    #[test]
    fn test_group_with_no_valid_keys_untouched() {
        let mut order = CitationOrder::new();
        let out = resolve_citations("odd [@!!] here", &mut order);
        assert_eq!(out, "odd [@!!] here");
        assert!(order.is_empty());
    }

    #[test]
    fn test_nested_bracket_before_citation() {
        let mut order = CitationOrder::new();
        let out = resolve_citations("[[@k]]", &mut order);
        assert_eq!(out, format!("[{}]", marker("k", "1")));
    }
}
