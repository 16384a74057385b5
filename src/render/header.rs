//! Post header built from front matter.

use crate::ast::{Author, FrontValue, Frontmatter};
use crate::html::{escape_attr, escape_html};
use crate::resolve::authors::authors_from;

/// First non-empty scalar among `keys`.
fn scalar<'a>(meta: &'a Frontmatter, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|key| meta.get(key).and_then(FrontValue::as_str))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn author_block(author: &Author) -> Option<String> {
    if author.name.is_empty() {
        return None;
    }

    let name = if author.url.is_empty() {
        format!(
            r#"<strong class="author-name">{}</strong>"#,
            escape_html(&author.name)
        )
    } else {
        format!(
            r#"<a class="author-link" href="{}" target="_blank" rel="noopener"><strong>{}</strong></a>"#,
            escape_attr(&author.url),
            escape_html(&author.name)
        )
    };

    let affiliations = if author.affiliations.is_empty() {
        String::new()
    } else {
        let spans: String = author
            .affiliations
            .iter()
            .map(|aff| format!(r#"<span class="author-aff">{}</span>"#, escape_html(aff)))
            .collect();
        format!(r#"<div class="author-affiliations">{spans}</div>"#)
    };

    Some(format!(r#"<div class="pf-author">{name}{affiliations}</div>"#))
}

fn meta_link(href: &str, label: &str, orange: bool) -> String {
    let class = if orange {
        "meta-link meta-link--orange"
    } else {
        "meta-link"
    };
    format!(
        r#"<a class="{class}" href="{}" target="_blank" rel="noopener">{label}</a>"#,
        escape_attr(href)
    )
}

/// Build the header block: title, authors, links, tags and image.
pub fn build_header(meta: &Frontmatter) -> String {
    let title = scalar(meta, &["title"]);
    let paper = scalar(meta, &["paper", "paper_url", "pdf"]);
    let code = scalar(meta, &["code", "code_url"]);
    let website = scalar(meta, &["website"]);
    let image = scalar(meta, &["image"]);

    let authors: String = authors_from(meta)
        .iter()
        .filter_map(author_block)
        .collect();

    let mut links = Vec::new();
    if !paper.is_empty() {
        links.push(meta_link(paper, "Paper", true));
    }
    if !code.is_empty() {
        links.push(meta_link(code, "Code", true));
    }
    if !website.is_empty() {
        links.push(meta_link(website, "Site", false));
    }

    let tags: Vec<String> = meta
        .get("tags")
        .and_then(FrontValue::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|tag| tag.as_str())
        .map(|tag| format!(r#"<span class="pf-tag">{}</span>"#, escape_html(tag)))
        .collect();

    let mut main = format!(r#"<h1 class="pf-title">{}</h1>"#, escape_html(title));
    if !authors.is_empty() {
        main.push_str(&format!(r#"<div class="pf-authors">{authors}</div>"#));
    }
    if !links.is_empty() {
        main.push_str(&format!(r#"<div class="pf-links">{}</div>"#, links.join(" · ")));
    }
    if !tags.is_empty() {
        main.push_str(&format!(r#"<div class="pf-tags">{}</div>"#, tags.join(" ")));
    }

    let image_html = if image.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="pf-image"><img src="{}" alt="{} image"></div>"#,
            escape_attr(image),
            escape_attr(title)
        )
    };

    format!(
        r#"<div class="post-front"><div class="post-front-content"><div class="pf-main">{main}</div>{image_html}</div></div>"#
    )
}

/// Title derived from a markdown path: file name, `-`/`_` as spaces, no
/// `.md` suffix.
pub fn fallback_title(md_path: &str) -> String {
    let name = md_path.rsplit('/').next().unwrap_or(md_path);
    let spaced = name.replace(['-', '_'], " ");
    spaced
        .strip_suffix(".md")
        .map(str::to_string)
        .unwrap_or(spaced)
}

/// Header for a post without front matter.
pub fn fallback_header(md_path: &str) -> String {
    let mut meta = Frontmatter::new();
    meta.insert("title", FrontValue::Scalar(fallback_title(md_path)));
    build_header(&meta)
}
