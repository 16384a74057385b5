//! Read bibliography entries out of a `bib.html` fragment.
//!
//! The fragment is a list of `<li id="ref-KEY" data-title=... >` items,
//! normally inside `<ol id="refs-list">`. Lookup order for the list is
//! `#refs-list`, then the first `<ol>`, then the whole fragment.

use crate::ast::{BibEntry, Bibliography};
use crate::html::{attribute, html_reader, implicitly_closes, is_void_element, push_entity, push_text};
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    RefsList,
    FirstOl,
    Whole,
}

impl Scope {
    fn opens_at(self, elem: &BytesStart<'_>) -> bool {
        match self {
            Scope::RefsList => attribute(elem, "id").as_deref() == Some("refs-list"),
            Scope::FirstOl => elem.name().as_ref().eq_ignore_ascii_case(b"ol"),
            Scope::Whole => true,
        }
    }
}

/// An `<li>` being read.
struct OpenItem {
    key: String,
    depth: usize,
    entry: BibEntry,
    text: String,
}

/// Parse a bibliography fragment. Unparseable markup ends the scan; the
/// entries read so far are kept.
pub fn parse_bibliography_html(fragment: &str) -> Bibliography {
    let bib = [Scope::RefsList, Scope::FirstOl, Scope::Whole]
        .into_iter()
        .find_map(|scope| scan(fragment, scope))
        .unwrap_or_default();

    debug!(entries = bib.len(), "parsed bibliography fragment");
    bib
}

/// Scan state: open element names plus the item being read.
struct FragmentScan {
    scope: Scope,
    stack: Vec<Vec<u8>>,
    scope_depth: Option<usize>,
    item: Option<OpenItem>,
    bib: Bibliography,
}

impl FragmentScan {
    /// Pop the innermost element; true once the scope element has closed.
    fn close_top(&mut self) -> bool {
        let depth = self.stack.len();
        if self.stack.pop().is_none() {
            return false;
        }
        match self.item.take() {
            Some(open) if open.depth == depth => close_item(open, &mut self.bib),
            other => self.item = other,
        }
        self.scope != Scope::Whole && self.scope_depth == Some(self.stack.len())
    }

    /// Close elements whose end tag is implied by a `name` start tag.
    fn close_implied(&mut self, name: &[u8]) -> bool {
        while self.stack.last().is_some_and(|open| implicitly_closes(open, name)) {
            if self.close_top() {
                return true;
            }
        }
        false
    }

    /// Close the innermost open `name` and everything inside it.
    fn close_named(&mut self, name: &[u8]) -> bool {
        let Some(index) = self.stack.iter().rposition(|open| open == name) else {
            return false;
        };
        while self.stack.len() > index {
            if self.close_top() {
                return true;
            }
        }
        false
    }
}

/// Collect items inside the first element matching `scope`; `None` when
/// no such element exists.
fn scan(fragment: &str, scope: Scope) -> Option<Bibliography> {
    let mut reader = html_reader(fragment);
    let mut scan = FragmentScan {
        scope,
        stack: Vec::new(),
        scope_depth: (scope == Scope::Whole).then_some(0usize),
        item: None,
        bib: Bibliography::new(),
    };

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    position = reader.error_position(),
                    error = %err,
                    "stopped reading bibliography fragment"
                );
                break;
            }
        };

        match event {
            Event::Start(elem) => {
                let name = elem.name().as_ref().to_ascii_lowercase();
                if scan.close_implied(&name) {
                    return Some(scan.bib);
                }
                if scan.scope_depth.is_none() && scope.opens_at(&elem) {
                    scan.scope_depth = Some(scan.stack.len());
                } else if scan.scope_depth.is_some() && scan.item.is_none() {
                    scan.item = open_item(&elem, scan.stack.len() + 1);
                }
                if !is_void_element(&name) {
                    scan.stack.push(name);
                }
            }
            Event::Empty(elem) => {
                if scan.close_implied(&elem.name().as_ref().to_ascii_lowercase()) {
                    return Some(scan.bib);
                }
                if scan.scope_depth.is_none() && scope.opens_at(&elem) {
                    return Some(scan.bib);
                }
            }
            Event::End(elem) => {
                if scan.close_named(&elem.name().as_ref().to_ascii_lowercase()) {
                    return Some(scan.bib);
                }
            }
            Event::Text(text) => {
                if let Some(open) = scan.item.as_mut() {
                    push_text(&mut open.text, &text);
                }
            }
            Event::CData(data) => {
                if let Some(open) = scan.item.as_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(entity) => {
                if let Some(open) = scan.item.as_mut() {
                    push_entity(&mut open.text, &entity);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = scan.item.take() {
        close_item(open, &mut scan.bib);
    }
    scan.scope_depth.map(|_| scan.bib)
}

fn open_item(elem: &BytesStart<'_>, depth: usize) -> Option<OpenItem> {
    if !elem.name().as_ref().eq_ignore_ascii_case(b"li") {
        return None;
    }
    let id = attribute(elem, "id")?;
    let key = id.strip_prefix("ref-")?.to_lowercase();

    let data = |name: &str| attribute(elem, name).unwrap_or_default().trim().to_string();
    Some(OpenItem {
        key,
        depth,
        entry: BibEntry {
            title: data("data-title"),
            short_authors: data("data-short-authors"),
            venue: data("data-venue"),
            year: data("data-year"),
            pretty: String::new(),
        },
        text: String::new(),
    })
}

fn close_item(open: OpenItem, bib: &mut Bibliography) {
    let mut entry = open.entry;
    entry.pretty = open.text.trim().to_string();
    bib.insert(open.key, entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FRAGMENT: &str = r#"<ol id="refs-list">
<li id="ref-smith2020" data-title=" Deep Things " data-short-authors="J. Smith" data-venue="NeurIPS" data-year="2020">Smith, John. (2020). Deep Things. NeurIPS.</li>
<li id="ref-Doe:21" data-title="Other" data-short-authors="A. Doe &amp; B. Roe" data-venue="" data-year="2021">Doe, A.; Roe, B. (2021). <em>Other</em>.</li>
</ol>"#;

    #[test]
    fn test_parse_refs_list() {
        let bib = parse_bibliography_html(FRAGMENT);
        assert_eq!(bib.len(), 2);

        let smith = &bib["smith2020"];
        assert_eq!(smith.title, "Deep Things");
        assert_eq!(smith.short_authors, "J. Smith");
        assert_eq!(smith.venue, "NeurIPS");
        assert_eq!(smith.year, "2020");
        assert_eq!(smith.pretty, "Smith, John. (2020). Deep Things. NeurIPS.");

        let doe = &bib["doe:21"];
        assert_eq!(doe.short_authors, "A. Doe & B. Roe");
        assert_eq!(doe.pretty, "Doe, A.; Roe, B. (2021). Other.");
    }

    #[test]
    fn test_refs_list_preferred_over_first_ol() {
        let html = r#"<ol><li id="ref-wrong">no</li></ol>
<div id="refs-list"><ul><li id="ref-right" data-title="R">yes</li></ul></div>"#;
        let bib = parse_bibliography_html(html);
        assert_eq!(bib.keys().collect::<Vec<_>>(), vec!["right"]);
    }

    #[test]
    fn test_first_ol_then_whole_fragment() {
        let html = r#"<ol><li id="ref-a">A</li></ol><ol><li id="ref-b">B</li></ol>"#;
        let bib = parse_bibliography_html(html);
        assert_eq!(bib.keys().collect::<Vec<_>>(), vec!["a"]);

        let loose = r#"<ul><li id="ref-x">X &amp; Y</li><li id="other">skip</li></ul>"#;
        let bib = parse_bibliography_html(loose);
        assert_eq!(bib.keys().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(bib["x"].pretty, "X & Y");
    }

    #[test]
    fn test_omitted_li_end_tags() {
        let bib = parse_bibliography_html(r#"<ol id="refs-list"><li id="ref-a">A<li id="ref-b" data-year="2019">B<p>more</ol>"#);
        assert_eq!(bib.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(bib["a"].pretty, "A");
        assert_eq!(bib["b"].pretty, "Bmore");
        assert_eq!(bib["b"].year, "2019");
    }

    #[test]
    fn test_missing_attributes_default_empty() {
        let bib = parse_bibliography_html(r#"<ol id="refs-list"><li id="ref-k">Only text<br>more</li></ol>"#);
        let entry = &bib["k"];
        assert_eq!(entry.title, "");
        assert_eq!(entry.year, "");
        assert_eq!(entry.pretty, "Only textmore");
    }

    #[test]
    fn test_empty_fragment() {
        assert!(parse_bibliography_html("").is_empty());
        assert!(parse_bibliography_html("<p>nothing here</p>").is_empty());
    }
}
