//! Small HTML helpers shared by the bibliography loader, the renderers and
//! page assembly.

use once_cell::sync::Lazy;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesRef, BytesStart, BytesText};
use quick_xml::Reader;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Escape text for element content.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    escape_html(s)
}

/// Drop everything that looks like a tag.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// A lenient reader for HTML fragments: no trimming, no end-name checks,
/// stray closing tags tolerated.
pub(crate) fn html_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader.config_mut().allow_unmatched_ends = true;
    reader
}

/// Elements that never have a closing tag in HTML.
pub(crate) fn is_void_element(name: &[u8]) -> bool {
    matches!(
        name.to_ascii_lowercase().as_slice(),
        b"area"
            | b"base"
            | b"br"
            | b"col"
            | b"embed"
            | b"hr"
            | b"img"
            | b"input"
            | b"link"
            | b"meta"
            | b"source"
            | b"track"
            | b"wbr"
    )
}

/// Whether opening `next` ends an open `open` element whose end tag was
/// omitted. Names are lowercase.
pub(crate) fn implicitly_closes(open: &[u8], next: &[u8]) -> bool {
    match open {
        b"p" => matches!(
            next,
            b"address"
                | b"article"
                | b"aside"
                | b"blockquote"
                | b"dd"
                | b"details"
                | b"div"
                | b"dl"
                | b"dt"
                | b"fieldset"
                | b"figcaption"
                | b"figure"
                | b"footer"
                | b"form"
                | b"h1"
                | b"h2"
                | b"h3"
                | b"h4"
                | b"h5"
                | b"h6"
                | b"header"
                | b"hr"
                | b"li"
                | b"main"
                | b"nav"
                | b"ol"
                | b"p"
                | b"pre"
                | b"section"
                | b"table"
                | b"ul"
        ),
        b"li" => next == b"li",
        b"dt" | b"dd" => matches!(next, b"dt" | b"dd"),
        _ => false,
    }
}

/// Unescaped value of an attribute, `None` when absent or unreadable.
pub(crate) fn attribute(elem: &BytesStart<'_>, name: &str) -> Option<String> {
    elem.html_attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
        .and_then(|attr| {
            attr.unescape_value_with(resolve_html5_entity)
                .ok()
                .map(|v| v.into_owned())
        })
}

/// Append a text event's content.
pub(crate) fn push_text(out: &mut String, text: &BytesText<'_>) {
    if let Ok(decoded) = text.decode() {
        out.push_str(&decoded);
    }
}

/// Append the character an entity reference stands for, or the reference
/// itself when it is unknown.
pub(crate) fn push_entity(out: &mut String, entity: &BytesRef<'_>) {
    if let Ok(Some(c)) = entity.resolve_char_ref() {
        out.push(c);
        return;
    }
    let Ok(name) = entity.decode() else {
        return;
    };
    match resolve_html5_entity(&name) {
        Some(resolved) => out.push_str(resolved),
        None => {
            out.push('&');
            out.push_str(&name);
            out.push(';');
        }
    }
}
