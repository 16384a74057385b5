//! BibTeX parser feeding the bibliography exporter.
//!
//! Field values are returned with their outer delimiters removed and inner
//! braces kept; TeX clean-up happens at export time. `@string` macros and
//! `#` concatenation are expanded. Malformed entries are skipped and parsing
//! resumes at the next `@`.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    IResult,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// One bibliography record, fields keyed by lowercased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibtexEntry {
    pub key: String,
    pub entry_type: String,
    pub fields: BTreeMap<String, String>,
}

impl BibtexEntry {
    /// Field value, or `""` when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Parse a BibTeX file and return its entries in file order.
pub fn parse_bibtex(input: &str) -> Vec<BibtexEntry> {
    let mut entries = Vec::new();
    let mut strings = month_strings();
    let mut remaining = input;

    while !remaining.is_empty() {
        remaining = skip_whitespace_and_comments(remaining);

        if remaining.is_empty() {
            break;
        }

        if remaining.starts_with('@') {
            match parse_entry(remaining, &mut strings) {
                Ok((rest, Some(entry))) => {
                    entries.push(entry);
                    remaining = rest;
                }
                Ok((rest, None)) => {
                    remaining = rest;
                }
                Err(_) => {
                    warn!(
                        near = %remaining.chars().take(40).collect::<String>(),
                        "skipping malformed bibtex entry"
                    );
                    match remaining[1..].find('@') {
                        Some(pos) => remaining = &remaining[pos + 1..],
                        None => break,
                    }
                }
            }
        } else {
            match remaining.find('@') {
                Some(pos) => remaining = &remaining[pos..],
                None => break,
            }
        }
    }

    debug!(count = entries.len(), "parsed bibtex entries");
    entries
}

fn month_strings() -> HashMap<String, String> {
    [
        ("jan", "January"),
        ("feb", "February"),
        ("mar", "March"),
        ("apr", "April"),
        ("may", "May"),
        ("jun", "June"),
        ("jul", "July"),
        ("aug", "August"),
        ("sep", "September"),
        ("oct", "October"),
        ("nov", "November"),
        ("dec", "December"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn skip_whitespace_and_comments(input: &str) -> &str {
    let mut s = input;

    loop {
        s = s.trim_start();

        if s.starts_with('%') {
            match s.find('\n') {
                Some(end) => s = &s[end + 1..],
                None => return "",
            }
        } else {
            break;
        }
    }

    s
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '/' | '+')
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn parse_entry<'a>(
    input: &'a str,
    strings: &mut HashMap<String, String>,
) -> IResult<&'a str, Option<BibtexEntry>> {
    let (input, _) = char('@')(input)?;
    let (input, entry_type) = take_while1(|c: char| c.is_alphanumeric())(input)?;
    let (input, _) = multispace0(input)?;

    let entry_type = entry_type.to_lowercase();

    match entry_type.as_str() {
        "comment" | "preamble" => {
            let (input, _) = skip_braced_content(input)?;
            return Ok((input, None));
        }
        "string" => {
            let (input, _) = char('{')(input)?;
            let (input, (name, value)) = parse_field(input, strings)?;
            let (input, _) = multispace0(input)?;
            let (input, _) = char('}')(input)?;
            strings.insert(name.to_lowercase(), value);
            return Ok((input, None));
        }
        _ => {}
    }

    let (input, _) = char('{')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, key) = take_while1(is_key_char)(input)?;
    let (input, _) = multispace0(input)?;

    // `@misc{key}` with no fields is legal.
    let (input, fields) = match char::<&str, nom::error::Error<&str>>(',')(input) {
        Ok((input, _)) => parse_fields(input, strings)?,
        Err(_) => (input, BTreeMap::new()),
    };

    let (input, _) = multispace0(input)?;
    let (input, _) = char('}')(input)?;

    let entry_type = match entry_type.as_str() {
        "software" | "online" | "dataset" => "misc".to_string(),
        _ => entry_type,
    };

    Ok((
        input,
        Some(BibtexEntry {
            key: key.to_string(),
            entry_type,
            fields,
        }),
    ))
}

fn skip_braced_content(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('{')(input)?;
    let (_, end) = closing_brace(input)?;
    Ok((&input[end + 1..], ()))
}

/// Byte index of the `}` closing an already opened brace.
fn closing_brace(input: &str) -> IResult<&str, usize> {
    let mut depth = 1;

    for (idx, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((input, idx));
                }
            }
            _ => {}
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn parse_fields<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();
    let mut remaining = input;

    loop {
        remaining = skip_whitespace_and_comments(remaining);

        if remaining.starts_with('}') || remaining.is_empty() {
            break;
        }

        let (rest, (name, value)) = parse_field(remaining, strings)?;
        fields.insert(name.to_lowercase(), value);
        remaining = rest.trim_start();

        if let Some(after_comma) = remaining.strip_prefix(',') {
            remaining = after_comma;
        }
    }

    Ok((remaining, fields))
}

fn parse_field<'a>(
    input: &'a str,
    strings: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = take_while1(is_ident_char)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('=')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = parse_value(input, strings)?;

    Ok((input, (name.to_string(), value)))
}

/// A value is one or more pieces joined with `#`.
fn parse_value<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, String> {
    let (mut input, first) = parse_piece(input, strings)?;
    let mut value = first;

    loop {
        let (rest, _) = multispace0(input)?;
        let Some(rest) = rest.strip_prefix('#') else {
            break;
        };
        let (rest, _) = multispace0(rest)?;
        let (rest, piece) = parse_piece(rest, strings)?;
        value.push_str(&piece);
        input = rest;
    }

    Ok((input, collapse_whitespace(&value)))
}

fn parse_piece<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, String> {
    if let Some(body) = input.strip_prefix('{') {
        let (_, end) = closing_brace(body)?;
        return Ok((&body[end + 1..], body[..end].to_string()));
    }
    if input.starts_with('"') {
        return parse_quoted_value(input);
    }

    let (rest, word) = take_while1(is_ident_char)(input)?;
    let value = if word.chars().all(|c| c.is_ascii_digit()) {
        word.to_string()
    } else {
        strings
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_else(|| word.to_string())
    };
    Ok((rest, value))
}

/// `"..."` value; braces protect inner quotes.
fn parse_quoted_value(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let mut depth = 0usize;

    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '"' if depth == 0 && !input[..i].ends_with('\\') => {
                return Ok((&input[i + 1..], input[..i].to_string()));
            }
            _ => {}
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_entry() {
        let input = r#"
@article{knuth1984,
    author = {Donald E. Knuth},
    title = {Literate {P}rogramming},
    journal = {The Computer Journal},
    year = 1984,
    volume = {27},
    pages = {97--111}
}
"#;

        let entries = parse_bibtex(input);
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.key, "knuth1984");
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.field("title"), "Literate {P}rogramming");
        assert_eq!(entry.field("author"), "Donald E. Knuth");
        assert_eq!(entry.field("year"), "1984");
        assert_eq!(entry.field("pages"), "97--111");
        assert_eq!(entry.field("doi"), "");
    }

    #[test]
    fn test_file_order_and_comments() {
        let input = r#"
% This is a comment
@comment{ignored {nested}}
@book{b, title = "Second"}
@article{a, title = {First}}
"#;

        let keys: Vec<_> = parse_bibtex(input).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_nonstandard_types_become_misc() {
        let input = "@Software{tool, title={T}}\n@online{site, url={https://x}}\n@dataset{d,}";
        let types: Vec<_> = parse_bibtex(input).into_iter().map(|e| e.entry_type).collect();
        assert_eq!(types, vec!["misc", "misc", "misc"]);
    }

    #[test]
    fn test_string_macros_and_concatenation() {
        let input = r#"
@string{ieee = "IEEE Transactions"}
@article{x, journal = ieee # " on Testing", month = jan}
"#;

        let entries = parse_bibtex(input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("journal"), "IEEE Transactions on Testing");
        assert_eq!(entries[0].field("month"), "January");
    }

    #[test]
    fn test_recovers_after_malformed_entry() {
        let input = "@article{broken, title = {never closed\n@article{ok, title = {Fine}}";
        let entries = parse_bibtex(input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "ok");
    }

    #[test]
    fn test_quoted_value_with_braced_quote() {
        let entries = parse_bibtex(r#"@misc{q, title = "A {"}quoted{"} word"}"#);
        assert_eq!(entries[0].field("title"), r#"A {"}quoted{"} word"#);
    }

    #[test]
    fn test_whitespace_collapsed() {
        let entries = parse_bibtex("@misc{w, title = {Multi\n     line   title}}");
        assert_eq!(entries[0].field("title"), "Multi line title");
    }
}
