//! Author normalization.

use crate::ast::{Author, EntryField, FrontValue, Frontmatter, ListEntry, Mapping};
use crate::parser::strip_quotes;
use once_cell::sync::Lazy;
use regex::Regex;

static AUTHOR_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[;,]\s*|\s+and\s+").expect("valid regex"));

/// Convert a raw author entry into an [`Author`].
///
/// Strings use `Name | URL`. Mappings take the name from `name`, `id`, or
/// the first scalar field whose key mentions "name".
pub fn normalize_author(entry: &ListEntry) -> Author {
    match entry {
        ListEntry::Scalar(raw) => from_string(raw),
        ListEntry::Mapping(map) => from_mapping(map),
    }
}

fn from_string(raw: &str) -> Author {
    let mut parts = raw.split('|').map(str::trim).filter(|p| !p.is_empty());
    let name = parts.next().map(strip_quotes).unwrap_or_default();
    let url = parts.next().unwrap_or_default();

    Author {
        name: name.to_string(),
        url: url.to_string(),
        affiliations: Vec::new(),
    }
}

fn from_mapping(map: &Mapping<EntryField>) -> Author {
    let scalar = |key: &str| {
        map.get(key)
            .and_then(EntryField::as_str)
            .filter(|s| !s.is_empty())
    };

    let name = scalar("name")
        .or_else(|| scalar("id"))
        .or_else(|| {
            map.iter()
                .find(|(k, v)| k.to_lowercase().contains("name") && v.as_str().is_some())
                .and_then(|(_, v)| v.as_str())
        })
        .map(strip_quotes)
        .unwrap_or_default();

    let url = scalar("url")
        .or_else(|| scalar("homepage"))
        .map(strip_quotes)
        .unwrap_or_default();

    let affiliations = ["affiliations", "affiliation"]
        .iter()
        .find_map(|key| match map.get(key) {
            Some(EntryField::List(items)) => {
                Some(items.iter().map(|s| strip_quotes(s).to_string()).collect())
            }
            Some(EntryField::Scalar(s)) if !s.is_empty() => Some(vec![strip_quotes(s).to_string()]),
            _ => None,
        })
        .unwrap_or_default();

    Author {
        name: name.to_string(),
        url: url.to_string(),
        affiliations,
    }
}

/// Collect the authors of a post from `authors` (or `author`).
///
/// A scalar value is a list of names separated by `;`, `,` or `and`.
pub fn authors_from(meta: &Frontmatter) -> Vec<Author> {
    let Some(value) = meta.get("authors").or_else(|| meta.get("author")) else {
        return Vec::new();
    };

    match value {
        FrontValue::Scalar(names) => AUTHOR_SEPARATOR
            .split(names)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| normalize_author(&ListEntry::Scalar(n.to_string())))
            .collect(),
        FrontValue::List(entries) => entries.iter().map(normalize_author).collect(),
    }
}
