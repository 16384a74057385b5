//! Parser for post sources: front matter splitting and token grammars.

pub mod frontmatter;
pub mod lexer;

pub use frontmatter::{parse_frontmatter, strip_quotes};

use crate::ast::Frontmatter;

/// A post source split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPost<'a> {
    /// Parsed header, when the source starts with a `---` block.
    pub frontmatter: Option<Frontmatter>,
    /// Everything after the closing fence, or the whole input.
    pub body: &'a str,
}

/// Split and parse a post source.
pub fn parse(input: &str) -> ParsedPost<'_> {
    match split_frontmatter(input) {
        (Some(block), body) => ParsedPost {
            frontmatter: Some(parse_frontmatter(block)),
            body,
        },
        (None, body) => ParsedPost {
            frontmatter: None,
            body,
        },
    }
}

/// Split a `---` delimited header from the body.
///
/// The first line must be `---` (trailing whitespace allowed). The header
/// ends at the next `---` line after at least one header line; the body
/// starts right after that line's newline. Without a closing fence there is
/// no header.
pub fn split_frontmatter(input: &str) -> (Option<&str>, &str) {
    let mut lines = input.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return (None, input);
    };
    if !is_fence(first) {
        return (None, input);
    }

    let block_start = first.len();
    let mut offset = block_start;
    for (index, line) in lines.enumerate() {
        if index > 0 && is_fence(line) {
            let block = input[block_start..offset].trim_end_matches(['\n', '\r']);
            let body = &input[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }

    (None, input)
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == "---"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FrontValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_front_matter() {
        let input = "# Hello\n\nSome text.";
        let (meta, body) = split_frontmatter(input);
        assert!(meta.is_none());
        assert_eq!(body, input);
    }

    #[test]
    fn test_with_front_matter() {
        let input = "---\ntitle: Hello\n---\n# Body\n\ntext";
        let (meta, body) = split_frontmatter(input);
        assert_eq!(meta, Some("title: Hello"));
        assert_eq!(body, "# Body\n\ntext");
    }

    #[test]
    fn test_body_is_input_minus_block() {
        let header = "---  \r\ntitle: 'Quoted'\r\ntags:\r\n  - a\r\n---\r\n";
        let body = "Para with [@x].\n---\nnot a fence for us\n";
        let input = format!("{header}{body}");

        let parsed = parse(&input);
        assert_eq!(parsed.body, body);
        let meta = parsed.frontmatter.unwrap();
        assert_eq!(meta.get("title"), Some(&FrontValue::Scalar("Quoted".into())));
    }

    #[test]
    fn test_unclosed_fence_is_body() {
        let input = "---\ntitle: x\n\nno closing fence";
        let parsed = parse(input);
        assert!(parsed.frontmatter.is_none());
        assert_eq!(parsed.body, input);
    }

    #[test]
    fn test_fence_at_end_of_input() {
        let (meta, body) = split_frontmatter("---\na: 1\n---");
        assert_eq!(meta, Some("a: 1"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_header_needs_a_line() {
        let input = "---\n---\nBody";
        let (meta, body) = split_frontmatter(input);
        assert!(meta.is_none());
        assert_eq!(body, input);

        let (meta, body) = split_frontmatter("---\n\n---\nBody");
        assert_eq!(meta, Some(""));
        assert_eq!(body, "Body");

        let (meta, body) = split_frontmatter("---\n---\nx: 1\n---\nBody");
        assert_eq!(meta, Some("---\nx: 1"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_fence_must_open_document() {
        let input = "\n---\na: 1\n---\n";
        assert!(parse(input).frontmatter.is_none());
    }
}
