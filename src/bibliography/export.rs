//! Convert parsed BibTeX into the `bib.html` fragment read by
//! [`parse_bibliography_html`](super::loader::parse_bibliography_html).

use crate::bibtex::{parse_bibtex, BibtexEntry};
use crate::html::{escape_attr, escape_html};
use crate::resolve::citations::normalize_key;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static TEX_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[A-Za-z@]+(?:\s*\*)?\s*\{([^}]*)\}").expect("valid tex command regex")
});

static TEX_ACCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\\[`'"^~=.uvHcdbk]?\{?([A-Za-z])\}?"#).expect("valid tex accent regex")
});

static TEX_LEFTOVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\{}]").expect("valid tex leftover regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static OTHERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(others?(\.|,|\s|$)|et\s+al\.?)").expect("valid others regex"));

static ARXIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)arxiv").expect("valid arxiv regex"));

/// Display fields derived from one BibTeX entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatted {
    pub pretty: String,
    pub short_authors: String,
    pub title: String,
    pub venue: String,
    pub year: String,
    pub url: String,
}

/// Author list in both display forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorForms {
    /// `A. Smith`, `A. Smith & B. Jones`, or `A. Smith et al.`
    pub short: String,
    /// `Smith, Alice; Jones, Bob` with `; et al.` when truncated.
    pub full: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Name {
    family: String,
    given: String,
}

/// Strip TeX markup conservatively: commands keep their argument, accents
/// keep their letter, stray `\ { }` go away, whitespace collapses.
pub fn tex_normalize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let s = TEX_COMMAND.replace_all(s, "$1");
    let s = TEX_ACCENT.replace_all(&s, "$1");
    let s = TEX_LEFTOVER.replace_all(&s, "");
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

/// Split an author field on ` and ` outside braces.
fn split_authors_raw(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < s.len() {
        let rest = &s[i..];
        if depth == 0
            && rest.len() >= 5
            && rest.as_bytes()[..5].eq_ignore_ascii_case(b" and ")
        {
            push_trimmed(&mut out, &cur);
            cur.clear();
            i += 5;
            continue;
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        cur.push(c);
        i += c.len_utf8();
    }
    push_trimmed(&mut out, &cur);
    out
}

fn push_trimmed(out: &mut Vec<String>, token: &str) {
    let token = token.trim();
    if !token.is_empty() {
        out.push(token.to_string());
    }
}

fn split_name(raw: &str) -> Name {
    let t = tex_normalize(raw);

    if t.contains(',') {
        let mut parts = t.split(',').map(str::trim).filter(|p| !p.is_empty());
        let family = parts.next().unwrap_or_default().to_string();
        let given = parts.collect::<Vec<_>>().join(", ");
        return Name { family, given };
    }

    let tokens: Vec<&str> = t.split_whitespace().collect();
    match tokens.split_last() {
        None => Name {
            family: String::new(),
            given: String::new(),
        },
        Some((family, given)) => Name {
            family: family.to_string(),
            given: given.join(" "),
        },
    }
}

fn initials(given: &str) -> String {
    given
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|part| part.chars().next())
        .map(|c| format!("{}.", c.to_uppercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn short_name(name: &Name) -> String {
    format!("{} {}", initials(&name.given), name.family)
        .trim()
        .to_string()
}

/// Parse an `author` field into short and full display forms.
pub fn parse_authors_field(s: &str) -> AuthorForms {
    let mut names = Vec::new();
    let mut saw_others = false;

    for part in split_authors_raw(s) {
        if OTHERS.is_match(&part) {
            saw_others = true;
            continue;
        }
        let name = split_name(&part);
        if !name.family.is_empty() || !name.given.is_empty() {
            names.push(name);
        }
    }

    let mut full = names
        .iter()
        .filter(|n| !n.family.is_empty())
        .map(|n| {
            if n.given.is_empty() {
                n.family.clone()
            } else {
                format!("{}, {}", n.family, n.given)
            }
        })
        .collect::<Vec<_>>()
        .join("; ");
    if saw_others {
        full = if full.is_empty() {
            "et al.".to_string()
        } else {
            format!("{full}; et al.")
        };
    }

    let named: Vec<&Name> = names.iter().filter(|n| !n.family.is_empty()).collect();
    let short = match named.as_slice() {
        [] if saw_others => "et al.".to_string(),
        [] => String::new(),
        [one] => short_name(one),
        [a, b] => format!("{} & {}", short_name(a), short_name(b)),
        [first, ..] => format!("{} et al.", short_name(first)),
    };

    AuthorForms { short, full }
}

/// Build display fields for an entry.
pub fn format_entry(entry: &BibtexEntry) -> Formatted {
    let author_field = match entry.field("author") {
        "" => entry.field("editor"),
        author => author,
    };
    let authors = parse_authors_field(author_field);
    let year = entry.field("year").trim().to_string();
    let title = tex_normalize(entry.field("title"));
    let venue = tex_normalize(
        [entry.field("journal"), entry.field("booktitle"), entry.field("publisher")]
            .into_iter()
            .find(|v| !v.is_empty())
            .unwrap_or_default(),
    );
    let volume = entry.field("volume").trim();
    let pages = match entry.field("pages") {
        "" => entry.field("page"),
        pages => pages,
    }
    .trim();

    let mut pretty = String::new();
    if !authors.full.is_empty() {
        pretty.push_str(&authors.full);
        pretty.push_str(if authors.full.trim_end().ends_with('.') { " " } else { ". " });
    }
    if !year.is_empty() {
        pretty.push_str(&format!("({year}). "));
    }
    if !title.is_empty() {
        pretty.push_str(&title);
        pretty.push_str(". ");
    }
    let venue_parts: Vec<&str> = [venue.as_str(), volume, pages]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if !venue_parts.is_empty() {
        pretty.push_str(&venue_parts.join(", "));
        pretty.push('.');
    }

    let url = match entry.field("url") {
        "" => entry.field("howpublished"),
        url => url,
    }
    .trim()
    .to_string();

    Formatted {
        pretty: pretty.trim().to_string(),
        short_authors: authors.short,
        title,
        venue,
        year,
        url,
    }
}

/// Render entries as `<ol id="refs-list">`, one `<li>` per line.
pub fn bib_to_html(entries: &[BibtexEntry]) -> String {
    let mut lines = vec![r#"<ol id="refs-list">"#.to_string()];

    for entry in entries {
        let id = normalize_key(&entry.key);
        let fields = format_entry(entry);
        let visible = if fields.pretty.is_empty() {
            id.clone()
        } else {
            fields.pretty.clone()
        };
        let venue = if ARXIV.is_match(&fields.venue) {
            ""
        } else {
            fields.venue.trim()
        };

        let mut li = format!(
            r#"<li id="ref-{id}" data-title="{}" data-short-authors="{}" data-venue="{}" data-year="{}""#,
            escape_attr(&fields.title),
            escape_attr(&fields.short_authors),
            escape_attr(venue),
            escape_attr(&fields.year),
        );
        if !fields.url.is_empty() {
            li.push_str(&format!(r#" data-url="{}""#, escape_attr(&fields.url)));
        }
        li.push('>');
        li.push_str(&escape_html(&visible));
        li.push_str("</li>");
        lines.push(li);
    }

    lines.push("</ol>".to_string());
    info!(entries = entries.len(), "exported bibliography");
    lines.join("\n")
}

/// Parse BibTeX source and export it in one step.
pub fn bibtex_to_html(source: &str) -> String {
    bib_to_html(&parse_bibtex(source))
}
