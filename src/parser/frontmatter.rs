//! Indentation-driven parser for the YAML-like front matter block.
//!
//! This is not YAML. It understands exactly the shapes posts
//! use:
//!
//! ```text
//! title: "A post"
//! tags:
//!   - rust
//! authors:
//!   - Jane Doe | https://example.com
//!   - name: John Roe affiliation: ACME
//!     url: https://roe.dev
//!   -
//!     name: Ann
//!     affiliations:
//!       - Uni A
//!       - Uni B
//! ```
//!
//! Lines that fit none of these shapes are skipped; parsing never fails.

use crate::ast::{EntryField, FrontValue, Frontmatter, ListEntry, Mapping};
use crate::parser::lexer::{inline_pairs, key_value, list_item};

/// Parse the lines between the `---` fences.
pub fn parse_frontmatter(block: &str) -> Frontmatter {
    let lines: Vec<&str> = block.lines().collect();
    let mut meta = Frontmatter::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) || indent_of(line) > 0 {
            i += 1;
            continue;
        }
        let Ok((_, (key, value))) = key_value(line.trim()) else {
            i += 1;
            continue;
        };

        let value = value.trim();
        if value.is_empty() {
            let (items, next) = parse_list(&lines, i + 1, 0);
            meta.insert(key, FrontValue::List(items));
            i = next;
        } else {
            meta.insert(key, FrontValue::Scalar(strip_quotes(value).to_string()));
            i += 1;
        }
    }

    meta
}

/// Parse `- ...` entries indented deeper than `parent_indent`.
fn parse_list(lines: &[&str], mut i: usize, parent_indent: usize) -> (Vec<ListEntry>, usize) {
    let mut items = Vec::new();

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }
        let indent = indent_of(line);
        if indent <= parent_indent {
            break;
        }
        let Ok((_, after_dash)) = list_item(line) else {
            i += 1;
            continue;
        };

        let after_dash = after_dash.trim();
        if after_dash.is_empty() {
            let (map, next) = parse_block_mapping(lines, i + 1, indent);
            items.push(ListEntry::Mapping(map));
            i = next;
            continue;
        }

        let pairs = inline_pairs(after_dash);
        if pairs.is_empty() {
            items.push(ListEntry::Scalar(strip_quotes(after_dash).to_string()));
            i += 1;
            continue;
        }

        let mut map: Mapping<EntryField> = pairs
            .into_iter()
            .map(|(k, v)| (k, EntryField::Scalar(strip_quotes(v).to_string())))
            .collect();
        i = merge_continuation(lines, i + 1, indent, &mut map);
        items.push(ListEntry::Mapping(map));
    }

    (items, i)
}

/// Mapping opened by a bare `-`; runs until a line indented at or above
/// the dash.
fn parse_block_mapping(
    lines: &[&str],
    mut i: usize,
    dash_indent: usize,
) -> (Mapping<EntryField>, usize) {
    let mut map = Mapping::new();

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }
        let indent = indent_of(line);
        if indent <= dash_indent {
            break;
        }
        match key_value(line.trim()) {
            Ok((_, (key, value))) => {
                i = insert_field(lines, i, indent, key, value.trim(), &mut map);
            }
            Err(_) => i += 1,
        }
    }

    (map, i)
}

/// Lines indented deeper than an inline `- key: value` entry belong to it.
/// Stops at the first line that is not a `key:` line.
fn merge_continuation(
    lines: &[&str],
    mut i: usize,
    dash_indent: usize,
    map: &mut Mapping<EntryField>,
) -> usize {
    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }
        let indent = indent_of(line);
        if indent <= dash_indent {
            break;
        }
        match key_value(line.trim()) {
            Ok((_, (key, value))) => {
                i = insert_field(lines, i, indent, key, value.trim(), map);
            }
            Err(_) => break,
        }
    }

    i
}

/// Insert `key: value` at line `i`; an empty value collects the nested
/// `- item` lines. Returns the index of the next unconsumed line.
fn insert_field(
    lines: &[&str],
    i: usize,
    indent: usize,
    key: &str,
    value: &str,
    map: &mut Mapping<EntryField>,
) -> usize {
    if !value.is_empty() {
        map.insert(key, EntryField::Scalar(strip_quotes(value).to_string()));
        return i + 1;
    }
    let (items, next) = parse_scalar_list(lines, i + 1, indent);
    map.insert(key, EntryField::List(items));
    next
}

fn parse_scalar_list(lines: &[&str], mut i: usize, key_indent: usize) -> (Vec<String>, usize) {
    let mut items = Vec::new();

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }
        if indent_of(line) <= key_indent {
            break;
        }
        match list_item(line) {
            Ok((_, item)) => {
                items.push(strip_quotes(item.trim()).to_string());
                i += 1;
            }
            Err(_) => break,
        }
    }

    (items, i)
}

/// Remove one pair of matching surrounding quotes from a trimmed value.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        let (first, last) = (bytes[0], bytes[value.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
