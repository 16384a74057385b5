//! Page assembly: container contents, the reference list, and either
//! injection into a host page or a standalone document.

use crate::ast::{BibEntry, Bibliography, FootnoteMap, RenderedPost};
use crate::error::{Error, RenderError, Result};
use crate::html::{attribute, escape_attr, escape_html, html_reader, implicitly_closes, is_void_element};
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

const NO_CITATIONS: &str = r#"<li style="color:#666">No citations found in this document.</li>"#;

/// Header followed by the rendered body.
pub fn container_html(header: &str, body: &str) -> String {
    format!(r#"{header}<div class="post-body">{body}</div>"#)
}

/// `<li>` items for the reference list, in citation order.
///
/// Keys without an entry (or with an entry that has no text) are listed as
/// missing so that broken citations stay visible.
pub fn reference_items(seen: &[String], bib: &Bibliography) -> String {
    if seen.is_empty() {
        return NO_CITATIONS.to_string();
    }

    seen.iter()
        .map(|key| match bib.get(key).filter(|entry| !entry.pretty.is_empty()) {
            Some(entry) => format!(r#"<li class="bib-item">{}</li>"#, escape_html(&entry.pretty)),
            None => format!(
                r#"<li class="bib-item bib-item--missing" style="color:#b00">{} (missing from bib.html)</li>"#,
                escape_html(key)
            ),
        })
        .collect()
}

/// A complete references section around `items`.
pub fn references_section(items: &str) -> String {
    format!(r#"<section id="references"><h2>References</h2><ol id="refs-list">{items}</ol></section>"#)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Container,
    References,
    RefsList,
    List,
}

struct Open {
    name: Vec<u8>,
    role: Option<Role>,
    inner_start: usize,
}

/// Where things go in a host page.
#[derive(Debug, Default)]
struct Layout {
    container: Option<Span>,
    /// End of the container's closing tag.
    container_close: usize,
    /// Start of the closing tag of the container's parent.
    parent_close: Option<usize>,
    /// `#references`, outside the container.
    references: Option<Span>,
    refs_list: Option<Span>,
    first_ol: Option<Span>,
}

/// Open elements of a host page, tracked the way a browser would close them.
struct TemplateScan<'a> {
    container_id: &'a str,
    layout: Layout,
    stack: Vec<Open>,
    parent_depth: Option<usize>,
    in_container: bool,
    in_references: bool,
}

impl<'a> TemplateScan<'a> {
    fn new(container_id: &'a str) -> Self {
        Self {
            container_id,
            layout: Layout::default(),
            stack: Vec::new(),
            parent_depth: None,
            in_container: false,
            in_references: false,
        }
    }

    fn open(&mut self, elem: &BytesStart<'_>, name: Vec<u8>, inner_start: usize) {
        let id = attribute(elem, "id");
        let layout = &self.layout;
        let role = if self.in_container {
            None
        } else if layout.container.is_none() && id.as_deref() == Some(self.container_id) {
            self.in_container = true;
            self.parent_depth = self.stack.len().checked_sub(1);
            Some(Role::Container)
        } else if layout.references.is_none() && !self.in_references && id.as_deref() == Some("references") {
            self.in_references = true;
            Some(Role::References)
        } else if self.in_references && layout.refs_list.is_none() && id.as_deref() == Some("refs-list") {
            Some(Role::RefsList)
        } else if self.in_references && layout.first_ol.is_none() && name == b"ol" {
            Some(Role::List)
        } else {
            None
        };
        self.stack.push(Open {
            name,
            role,
            inner_start,
        });
    }

    /// Close the innermost element. Its content ends at `inner_end` and its
    /// end tag (if any) at `tag_end`.
    fn close_top(&mut self, inner_end: usize, tag_end: usize) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let span = Span {
            start: open.inner_start,
            end: inner_end,
        };
        let layout = &mut self.layout;
        match open.role {
            Some(Role::Container) => {
                layout.container = Some(span);
                layout.container_close = tag_end;
                self.in_container = false;
            }
            Some(Role::References) => {
                layout.references = Some(span);
                self.in_references = false;
            }
            Some(Role::RefsList) => layout.refs_list = Some(span),
            Some(Role::List) => layout.first_ol = Some(span),
            None => {}
        }
        if layout.container.is_some() && layout.parent_close.is_none() && self.parent_depth == Some(self.stack.len()) {
            layout.parent_close = Some(inner_end);
        }
    }

    /// Close elements whose end tag is implied by a `name` start tag at `at`.
    fn close_implied(&mut self, name: &[u8], at: usize) {
        while self.stack.last().is_some_and(|open| implicitly_closes(&open.name, name)) {
            self.close_top(at, at);
        }
    }

    /// Close the innermost open `name` and everything opened inside it. A
    /// stray end tag is ignored.
    fn close_named(&mut self, name: &[u8], before: usize, after: usize) {
        let Some(index) = self.stack.iter().rposition(|open| open.name == name) else {
            return;
        };
        while self.stack.len() > index + 1 {
            self.close_top(before, before);
        }
        self.close_top(before, after);
    }
}

fn scan_template(template: &str, container_id: &str) -> Result<Layout> {
    let mut reader = html_reader(template);
    let mut scan = TemplateScan::new(container_id);

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| {
            RenderError::Template(format!("{err} at byte {}", reader.error_position()))
        })?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(elem) => {
                let name = elem.name().as_ref().to_ascii_lowercase();
                scan.close_implied(&name, before);
                if !is_void_element(&name) {
                    scan.open(&elem, name, after);
                }
            }
            Event::Empty(elem) => {
                scan.close_implied(&elem.name().as_ref().to_ascii_lowercase(), before);
            }
            Event::End(elem) => {
                scan.close_named(&elem.name().as_ref().to_ascii_lowercase(), before, after);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(scan.layout)
}

/// Inject the container contents and reference list into a host page.
///
/// The element whose id is `container_id` receives `container`. An existing
/// `#references` section outside the container has its `#refs-list` (or
/// first `<ol>`) filled; otherwise a new section is appended to the
/// container's parent.
pub fn assemble_page(
    template: &str,
    container_id: &str,
    container: &str,
    references: &str,
) -> Result<String> {
    let layout = scan_template(template, container_id)?;
    let Some(target) = layout.container else {
        return Err(Error::ContainerNotFound(container_id.to_string()));
    };

    let mut edits = vec![(target, container.to_string())];
    match layout.references {
        Some(section) => match layout.refs_list.or(layout.first_ol) {
            Some(list) => edits.push((list, references.to_string())),
            None => edits.push((
                Span {
                    start: section.end,
                    end: section.end,
                },
                format!(r#"<ol id="refs-list">{references}</ol>"#),
            )),
        },
        None => {
            let at = layout.parent_close.unwrap_or(layout.container_close);
            edits.push((Span { start: at, end: at }, references_section(references)));
        }
    }

    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut page = template.to_string();
    for (span, content) in edits {
        page.replace_range(span.start..span.end, &content);
    }

    debug!(container_id, bytes = page.len(), "assembled page");
    Ok(page)
}

/// Data a page script needs for popups and tooltips.
#[derive(Serialize)]
struct PostData<'a> {
    seen: &'a [String],
    bibliography: BTreeMap<&'a str, &'a BibEntry>,
    footnotes: &'a FootnoteMap,
}

fn post_data_json(post: &RenderedPost) -> Result<String> {
    let data = PostData {
        seen: &post.seen,
        bibliography: post
            .seen
            .iter()
            .filter_map(|key| post.bibliography.get_key_value(key))
            .map(|(key, entry)| (key.as_str(), entry))
            .collect(),
        footnotes: &post.footnotes,
    };
    // Keep `</script>` out of the payload.
    Ok(serde_json::to_string(&data)?.replace("</", "<\\/"))
}

/// A complete HTML document for a rendered post.
pub fn standalone_page(post: &RenderedPost, head: Option<&str>) -> Result<String> {
    let mut output = String::with_capacity(post.container.html.len() + 4096);

    output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(&post.title)));
    if let Some(head) = head {
        output.push_str(head);
        output.push('\n');
    }
    output.push_str(DEFAULT_STYLES);
    output.push_str("</head>\n<body>\n");

    output.push_str(&format!(
        "<article id=\"{}\" class=\"post\">\n",
        escape_attr(&post.container.id)
    ));
    output.push_str(&post.container.html);
    output.push_str("\n</article>\n");
    output.push_str(&references_section(&post.references_html));
    output.push('\n');

    output.push_str("<script type=\"application/json\" id=\"post-data\">");
    output.push_str(&post_data_json(post)?);
    output.push_str("</script>\n");
    output.push_str("</body>\n</html>");

    Ok(output)
}

const DEFAULT_STYLES: &str = r#"<style>
body { max-width: 800px; margin: 0 auto; padding: 2em; font-family: Georgia, serif; line-height: 1.6; }
.pf-title { margin-bottom: 0.3em; }
.pf-authors { display: flex; flex-wrap: wrap; gap: 1em; }
.author-aff { display: block; font-size: 0.85em; color: #666; }
.meta-link--orange { color: #d9480f; }
.pf-tag { display: inline-block; padding: 0 0.5em; border-radius: 4px; background: #f1f3f5; font-size: 0.85em; }
.pf-image img { max-width: 100%; }
.post-figure { margin: 2em auto; }
.figure--left { margin-left: 0; }
.figure--right { margin-right: 0; }
.post-figure figcaption { text-align: center; font-size: 0.9em; color: #555; }
.math-source { color: #b00; }
.cite { color: #0066cc; cursor: pointer; }
.fn::after { content: "*"; color: #0066cc; cursor: pointer; }
#references ol { padding-left: 2em; }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CitationOrder, Container};
    use pretty_assertions::assert_eq;

    fn bib() -> Bibliography {
        let mut bib = Bibliography::new();
        bib.insert(
            "foo".into(),
            BibEntry {
                title: "Foo".into(),
                pretty: "Doe, J. (2020). Foo & bar.".into(),
                ..Default::default()
            },
        );
        bib.insert("blank".into(), BibEntry::default());
        bib
    }

    #[test]
    fn test_reference_items() {
        let seen = vec!["foo".to_string(), "nope".to_string(), "blank".to_string()];
        assert_eq!(
            reference_items(&seen, &bib()),
            concat!(
                r#"<li class="bib-item">Doe, J. (2020). Foo &amp; bar.</li>"#,
                r#"<li class="bib-item bib-item--missing" style="color:#b00">nope (missing from bib.html)</li>"#,
                r#"<li class="bib-item bib-item--missing" style="color:#b00">blank (missing from bib.html)</li>"#,
            )
        );
    }

    #[test]
    fn test_no_citations_item() {
        assert_eq!(reference_items(&[], &bib()), NO_CITATIONS);
    }

    #[test]
    fn test_container_html() {
        assert_eq!(container_html("<h1>T</h1>", "<p>x</p>"), r#"<h1>T</h1><div class="post-body"><p>x</p></div>"#);
    }

    #[test]
    fn test_inject_and_append_section() {
        let template = r#"<html><body><main><div id="content">Loading…</div></main></body></html>"#;
        let page = assemble_page(template, "content", "<p>post</p>", "<li>r</li>").unwrap();
        assert_eq!(
            page,
            r#"<html><body><main><div id="content"><p>post</p></div><section id="references"><h2>References</h2><ol id="refs-list"><li>r</li></ol></section></main></body></html>"#
        );
    }

    #[test]
    fn test_fill_existing_refs_list() {
        let template = concat!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>",
            r#"<article id="post"></article>"#,
            r#"<section id="references"><h2>Sources</h2><ol class="x">old</ol><ol id="refs-list"><li>stale</li></ol></section>"#,
            "</body></html>",
        );
        let page = assemble_page(template, "post", "BODY", "<li>new</li>").unwrap();
        assert!(page.contains(r#"<article id="post">BODY</article>"#));
        assert!(page.contains(r#"<ol class="x">old</ol><ol id="refs-list"><li>new</li></ol>"#));
        assert!(!page.contains("stale"));
    }

    #[test]
    fn test_references_without_list() {
        let template = r#"<div id="content"></div><section id="references"><h2>Refs</h2></section>"#;
        let page = assemble_page(template, "content", "", "<li>a</li>").unwrap();
        assert_eq!(
            page,
            r#"<div id="content"></div><section id="references"><h2>Refs</h2><ol id="refs-list"><li>a</li></ol></section>"#
        );
    }

    #[test]
    fn test_references_inside_container_replaced() {
        let template = r#"<body><div id="content"><section id="references"></section></div></body>"#;
        let page = assemble_page(template, "content", "new", "<li>a</li>").unwrap();
        assert_eq!(
            page,
            r#"<body><div id="content">new</div><section id="references"><h2>References</h2><ol id="refs-list"><li>a</li></ol></section></body>"#
        );
    }

    #[test]
    fn test_unclosed_paragraph_in_container() {
        let template = r#"<body><div id="content"><p>Loading</div><footer>keep me</footer></body>"#;
        let page = assemble_page(template, "content", "POST", "<li>r</li>").unwrap();
        assert_eq!(
            page,
            r#"<body><div id="content">POST</div><footer>keep me</footer><section id="references"><h2>References</h2><ol id="refs-list"><li>r</li></ol></section></body>"#
        );
    }

    #[test]
    fn test_omitted_end_tags_around_references() {
        let template = concat!(
            r#"<main><p>intro<div id="post"><p>old</div>"#,
            r#"<section id="references"><p>Sources<ol id="refs-list"><li>one<li>two</ol></section>"#,
            "<p>after</main>",
        );
        let page = assemble_page(template, "post", "NEW", "<li>x</li>").unwrap();
        assert_eq!(
            page,
            concat!(
                r#"<main><p>intro<div id="post">NEW</div>"#,
                r#"<section id="references"><p>Sources<ol id="refs-list"><li>x</li></ol></section>"#,
                "<p>after</main>",
            )
        );
    }

    #[test]
    fn test_container_not_found() {
        match assemble_page("<div id=\"other\"></div>", "content", "", "") {
            Err(Error::ContainerNotFound(id)) => assert_eq!(id, "content"),
            other => panic!("expected ContainerNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_standalone_page() {
        let mut order = CitationOrder::new();
        order.number_for("foo");
        let mut footnotes = FootnoteMap::new();
        footnotes.insert("fn-0".into(), "<script>x</script>".into());

        let post = RenderedPost {
            title: "A & B".into(),
            seen: order.seen().to_vec(),
            order: order.numbers().clone(),
            bibliography: bib(),
            footnotes,
            container: Container {
                id: "content".into(),
                html: "<p>hi</p>".into(),
            },
            header_html: String::new(),
            references_html: "<li>r</li>".into(),
        };

        let page = standalone_page(&post, Some("<!-- math -->")).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>A &amp; B</title>\n<!-- math -->\n"));
        assert!(page.contains("<article id=\"content\" class=\"post\">\n<p>hi</p>\n</article>"));
        assert!(page.contains(r#"<ol id="refs-list"><li>r</li></ol>"#));
        assert!(page.contains(r#""footnotes":{"fn-0":"<script>x<\/script>"}"#));
        assert!(page.contains(r#""bibliography":{"foo":"#));
        assert!(!page.contains(r#""blank""#));
    }
}
