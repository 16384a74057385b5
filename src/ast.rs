//! Data model for parsed and rendered posts.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// An insertion-ordered string-keyed mapping.
///
/// Front matter is small, and author normalization depends on the order in
/// which keys were written, so a vector of pairs is all that is needed.
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for Mapping<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Mapping<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing (but not moving) an existing entry.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Mapping<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for Mapping<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parsed front matter block.
pub type Frontmatter = Mapping<FrontValue>;

/// A top-level front matter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrontValue {
    /// `key: value`
    Scalar(String),
    /// `key:` followed by `- ...` lines
    List(Vec<ListEntry>),
}

impl FrontValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrontValue::Scalar(s) => Some(s),
            FrontValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ListEntry]> {
        match self {
            FrontValue::List(items) => Some(items),
            FrontValue::Scalar(_) => None,
        }
    }
}

/// One `- ...` entry of a front matter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListEntry {
    Scalar(String),
    Mapping(Mapping<EntryField>),
}

impl ListEntry {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ListEntry::Scalar(s) => Some(s),
            ListEntry::Mapping(_) => None,
        }
    }
}

/// A value inside a list entry mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntryField {
    Scalar(String),
    List(Vec<String>),
}

impl EntryField {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntryField::Scalar(s) => Some(s),
            EntryField::List(_) => None,
        }
    }
}

/// Canonical author record derived from front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub url: String,
    pub affiliations: Vec<String>,
}

/// A bibliography entry as loaded from the references fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BibEntry {
    pub title: String,
    pub short_authors: String,
    pub venue: String,
    pub year: String,
    /// Fully formatted citation text.
    pub pretty: String,
}

/// Normalized citation key to entry.
pub type Bibliography = BTreeMap<String, BibEntry>;

/// Citation numbering for a single render.
///
/// Numbers are assigned on first encounter and never change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CitationOrder {
    numbers: BTreeMap<String, usize>,
    seen: Vec<String>,
}

impl CitationOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number for `key`, assigning the next one if unseen.
    pub fn number_for(&mut self, key: &str) -> usize {
        if let Some(&n) = self.numbers.get(key) {
            return n;
        }
        self.seen.push(key.to_string());
        let n = self.seen.len();
        self.numbers.insert(key.to_string(), n);
        n
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.numbers.get(key).copied()
    }

    /// Keys in first-seen order.
    pub fn seen(&self) -> &[String] {
        &self.seen
    }

    pub fn numbers(&self) -> &BTreeMap<String, usize> {
        &self.numbers
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Footnote id (`fn-0`, `fn-1`, ...) to raw inner HTML.
pub type FootnoteMap = BTreeMap<String, String>;

/// The element that received the rendered post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub id: String,
    /// Header plus `<div class="post-body">`.
    pub html: String,
}

/// Result of rendering one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPost {
    /// Front matter title, or one derived from the markdown path.
    pub title: String,
    /// Cited keys in first-seen order.
    pub seen: Vec<String>,
    /// Key to citation number, sorted by key.
    pub order: BTreeMap<String, usize>,
    pub bibliography: Bibliography,
    pub footnotes: FootnoteMap,
    pub container: Container,
    pub header_html: String,
    /// The `<li>` items of the reference list.
    pub references_html: String,
}

impl RenderedPost {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
