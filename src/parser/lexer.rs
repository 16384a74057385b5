//! Token-level parsers shared by the front matter parser and the citation
//! resolver.

use nom::{
    bytes::complete::{is_not, take_while1},
    character::complete::{char, multispace0, space0},
    combinator::{recognize, rest},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse a `key:` prefix, returning the key.
pub fn key_prefix(input: &str) -> IResult<&str, &str> {
    terminated(take_while1(is_key_char), tuple((space0, char(':'), space0)))(input)
}

/// Parse a trimmed `key: value` line.
pub fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    pair(key_prefix, rest)(input)
}

/// Parse a `- item` line (leading indentation allowed), returning the text
/// after the dash.
pub fn list_item(input: &str) -> IResult<&str, &str> {
    preceded(tuple((space0, char('-'), space0)), rest)(input)
}

/// Parse the pairs of an inline mapping such as
/// `name: Jane Doe affiliation: "ACME, Inc."`.
///
/// The text must start with a key. Unquoted values run to the next
/// ` key:` or the end of the text. Quotes are kept; callers strip them.
/// Returns an empty vector when the text is not a mapping.
pub fn inline_pairs(input: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut remaining = input.trim();

    while let Ok((after_key, key)) = key_prefix(remaining) {
        let (value, rest) = match quoted_value(after_key) {
            Some(split) => split,
            None => {
                let end = next_key_offset(after_key);
                (after_key[..end].trim_end(), &after_key[end..])
            }
        };
        if value.is_empty() {
            break;
        }
        pairs.push((key, value));
        remaining = rest.trim_start();
    }

    pairs
}

fn quoted_value(input: &str) -> Option<(&str, &str)> {
    let quote = input.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let close = input[1..].find(quote)?;
    let end = close + 2;
    Some((&input[..end], &input[end..]))
}

/// Byte offset of the whitespace run that precedes the next `key:` in
/// `input`, or `input.len()`.
fn next_key_offset(input: &str) -> usize {
    let mut prev_was_space = false;
    for (idx, c) in input.char_indices() {
        if c.is_whitespace() {
            if !prev_was_space && key_prefix(input[idx..].trim_start()).is_ok() {
                return idx;
            }
            prev_was_space = true;
        } else {
            prev_was_space = false;
        }
    }
    input.len()
}

/// One `@key ...` segment of a citation group; runs until `;`, `]` or `)`.
fn cite_segment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('@'), is_not(";])")))(input)
}

/// Parse a bracketed citation group (`[@a]`, `[@a; @b]`, `[@a, @b]`),
/// returning the text between the brackets.
pub fn citation_group(input: &str) -> IResult<&str, &str> {
    delimited(
        char('['),
        recognize(pair(
            cite_segment,
            many0(pair(pair(char(';'), multispace0), cite_segment)),
        )),
        char(']'),
    )(input)
}

/// Split the inside of a citation group into raw keys.
pub fn citation_keys(inner: &str) -> Vec<String> {
    inner
        .split([';', ','])
        .map(|part| part.replace('@', "").trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value() {
        assert_eq!(key_value("title: Hello"), Ok(("", ("title", "Hello"))));
        assert_eq!(key_value("authors:"), Ok(("", ("authors", ""))));
        assert_eq!(key_value("paper_url : x"), Ok(("", ("paper_url", "x"))));
        assert!(key_value("no colon here").is_err());
    }

    #[test]
    fn test_list_item() {
        assert_eq!(list_item("  - Jane"), Ok(("", "Jane")));
        assert_eq!(list_item("  -"), Ok(("", "")));
        assert!(list_item("  Jane").is_err());
    }

    #[test]
    fn test_inline_pairs() {
        assert_eq!(
            inline_pairs("name: Jane Doe affiliation: MIT"),
            vec![("name", "Jane Doe"), ("affiliation", "MIT")]
        );
        assert_eq!(
            inline_pairs(r#"name: "Doe, Jane" url: https://example.com"#),
            vec![("name", "\"Doe, Jane\""), ("url", "https://example.com")]
        );
    }

    #[test]
    fn test_inline_pairs_requires_leading_key() {
        assert!(inline_pairs("Jane Doe | https://example.com").is_empty());
        assert!(inline_pairs("name:").is_empty());
    }

    #[test]
    fn test_citation_group() {
        assert_eq!(citation_group("[@knuth1984] rest"), Ok((" rest", "@knuth1984")));
        assert_eq!(
            citation_group("[@a; @b]"),
            Ok(("", "@a; @b"))
        );
        assert_eq!(citation_group("[@a, @b]"), Ok(("", "@a, @b")));
        assert!(citation_group("[@a;]").is_err());
        assert!(citation_group("[not a cite]").is_err());
        assert!(citation_group("[@a)]").is_err());
    }

    #[test]
    fn test_citation_keys() {
        assert_eq!(citation_keys("@bar; @foo"), vec!["bar", "foo"]);
        assert_eq!(citation_keys("@a, @b ;@c"), vec!["a", "b", "c"]);
    }
}
