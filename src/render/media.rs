//! Wrap images and PDF links into captioned figures.
//!
//! Works on the markdown event stream. Alt text (or a PDF link's title or
//! text) carries layout hints as `Caption | width | align`.

use crate::html::{escape_attr, escape_html};
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

const IMG_STYLE: &str = "width:100%;height:auto;display:block;border-radius:8px;cursor:zoom-in";
const EMBED_STYLE: &str = "width:100%;height:480px;overflow:hidden;border-radius:8px;border:1px solid #e9e9e9;background:#fafafa;cursor:zoom-in";

/// Layout hints parsed from alt text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaHints {
    pub caption: String,
    pub width: String,
    pub align: String,
}

/// Split `Caption | 800px | right`; every segment is optional.
pub fn parse_alt(alt: &str) -> MediaHints {
    let mut parts = alt.split('|').map(str::trim);
    let mut next = || parts.next().unwrap_or_default().to_string();
    MediaHints {
        caption: next(),
        width: next(),
        align: next(),
    }
}

/// Whether a URL points at a PDF.
pub fn is_pdf(src: &str) -> bool {
    src.to_ascii_lowercase().ends_with(".pdf")
}

fn figure_open(kind: &str, hints: &MediaHints) -> String {
    let mut class = format!("post-figure post-figure--{kind}");
    if !hints.align.is_empty() {
        class.push_str(&format!(" figure--{}", hints.align));
    }
    let mut html = format!(r#"<figure class="{}""#, escape_attr(&class));
    if !hints.width.is_empty() {
        html.push_str(&format!(r#" style="max-width:{}""#, escape_attr(&hints.width)));
    }
    html.push('>');
    html
}

fn figcaption(caption: &str) -> String {
    if caption.is_empty() {
        String::new()
    } else {
        format!("<figcaption>{}</figcaption>", escape_html(caption))
    }
}

/// Figure for an image, keeping its `alt` and `title`.
pub fn image_figure(src: &str, alt: &str, title: &str) -> String {
    let hints = parse_alt(alt);
    let mut html = figure_open("img", &hints);

    html.push_str(&format!(
        r#"<img src="{src}" alt="{alt}""#,
        src = escape_attr(src),
        alt = escape_attr(alt)
    ));
    if !title.is_empty() {
        html.push_str(&format!(r#" title="{}""#, escape_attr(title)));
    }
    html.push_str(&format!(
        r#" data-lightbox="image" data-src="{src}" data-caption="{caption}" style="{IMG_STYLE}">"#,
        src = escape_attr(src),
        caption = escape_attr(&hints.caption)
    ));
    html.push_str(&figcaption(&hints.caption));
    html.push_str("</figure>");
    html
}

/// Figure embedding a PDF in a lazy iframe, with a download fallback.
pub fn pdf_figure(src: &str, caption: &str, hints: &MediaHints) -> String {
    let src = escape_attr(src);
    let title = if caption.is_empty() {
        "Embedded PDF"
    } else {
        caption
    };

    let mut html = figure_open("pdf", hints);
    html.push_str(&format!(
        r#"<div class="post-figure__embed" data-lightbox="pdf" data-src="{src}" data-caption="{caption}" style="{EMBED_STYLE}">"#,
        caption = escape_attr(caption)
    ));
    html.push_str(&format!(
        r#"<iframe src="{src}" title="{title}" loading="lazy" style="width:100%;height:100%;border:0"></iframe></div>"#,
        title = escape_attr(title)
    ));
    html.push_str(&figcaption(caption));
    html.push_str(&format!(
        r#"<p class="post-figure__fallback" style="font-size:0.9rem;margin-top:0.6rem">This PDF may not be displayed in your browser &#8212; <a href="{src}" target="_blank" rel="noopener">open/download it</a>.</p>"#
    ));
    html.push_str("</figure>");
    html
}

/// Figure for an image node; PDF sources get an embed.
fn figure_for_image(src: &str, alt: &str, title: &str) -> String {
    if is_pdf(src) {
        let hints = parse_alt(alt);
        pdf_figure(src, &hints.caption, &hints)
    } else {
        image_figure(src, alt, title)
    }
}

/// Figure for a paragraph holding only a link to a PDF.
fn figure_for_pdf_link(href: &str, title: &str, text: &str) -> String {
    let hints = parse_alt(if title.is_empty() { text } else { title });
    let caption = [hints.caption.as_str(), text.trim(), "Supplementary PDF"]
        .into_iter()
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string();
    pdf_figure(href, &caption, &hints)
}

/// Plain text of the events between a start and end tag.
fn plain_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t) => {
                text.push_str(t)
            }
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

fn is_filler(event: &Event<'_>) -> bool {
    match event {
        Event::Text(t) => t.trim().is_empty(),
        Event::SoftBreak | Event::HardBreak => true,
        _ => false,
    }
}

/// If the paragraph body is a single image or a single PDF link, the
/// figure that replaces the whole paragraph.
fn sole_media(body: &[Event<'_>]) -> Option<String> {
    let first = body.iter().position(|e| !is_filler(e))?;
    let last = body.iter().rposition(|e| !is_filler(e))?;

    match &body[first] {
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => {
            let end = first + body[first..].iter().position(|e| matches!(e, Event::End(TagEnd::Image)))?;
            (end == last).then(|| {
                figure_for_image(dest_url, &plain_text(&body[first + 1..end]), title)
            })
        }
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) if is_pdf(dest_url) => {
            let end = first + body[first..].iter().position(|e| matches!(e, Event::End(TagEnd::Link)))?;
            (end == last).then(|| {
                figure_for_pdf_link(dest_url, title, &plain_text(&body[first + 1..end]))
            })
        }
        _ => None,
    }
}

/// Replace media in a rendered event stream.
///
/// A paragraph whose only content is an image or a PDF link becomes a
/// figure. Images outside paragraphs (table cells, tight list items,
/// headings) become figures in place. Images sharing a paragraph with other
/// content are left inline.
pub fn wrap_media<'a>(events: Vec<Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut paragraph: Option<Vec<Event<'a>>> = None;
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        match event {
            Event::Start(Tag::Paragraph) => {
                paragraph = Some(Vec::new());
            }
            Event::End(TagEnd::Paragraph) => {
                let body = paragraph.take().unwrap_or_default();
                match sole_media(&body) {
                    Some(figure) => out.push(Event::Html(CowStr::from(figure))),
                    None => {
                        out.push(Event::Start(Tag::Paragraph));
                        out.extend(body);
                        out.push(Event::End(TagEnd::Paragraph));
                    }
                }
            }
            event => match paragraph.as_mut() {
                Some(body) => body.push(event),
                None => match event {
                    Event::Start(Tag::Image {
                        dest_url, title, ..
                    }) => {
                        let alt: Vec<Event<'a>> = iter
                            .by_ref()
                            .take_while(|e| !matches!(e, Event::End(TagEnd::Image)))
                            .collect();
                        let figure = figure_for_image(&dest_url, &plain_text(&alt), &title);
                        out.push(Event::InlineHtml(CowStr::from(figure)));
                    }
                    other => out.push(other),
                },
            },
        }
    }

    if let Some(body) = paragraph {
        out.push(Event::Start(Tag::Paragraph));
        out.extend(body);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{html, Options, Parser};

    fn render(markdown: &str) -> String {
        let events: Vec<Event<'_>> = Parser::new_ext(markdown, Options::ENABLE_TABLES).collect();
        let mut out = String::new();
        html::push_html(&mut out, wrap_media(events).into_iter());
        out
    }

    #[test]
    fn test_parse_alt() {
        assert_eq!(
            parse_alt("A cat | 400px | right"),
            MediaHints {
                caption: "A cat".into(),
                width: "400px".into(),
                align: "right".into(),
            }
        );
        assert_eq!(parse_alt("Just caption"), MediaHints { caption: "Just caption".into(), ..Default::default() });
        assert_eq!(parse_alt(""), MediaHints::default());
        assert_eq!(parse_alt(" | 50% "), MediaHints { width: "50%".into(), ..Default::default() });
    }

    #[test]
    fn test_sole_image_becomes_figure() {
        let out = render("![A cat | 400px | right](cat.png)\n");
        assert_eq!(
            out,
            format!(
                r#"<figure class="post-figure post-figure--img figure--right" style="max-width:400px"><img src="cat.png" alt="A cat | 400px | right" data-lightbox="image" data-src="cat.png" data-caption="A cat" style="{IMG_STYLE}"><figcaption>A cat</figcaption></figure>"#
            )
        );
    }

    #[test]
    fn test_image_without_caption_has_no_figcaption() {
        let out = render("![](plot.svg \"Plot\")");
        assert!(out.starts_with(r#"<figure class="post-figure post-figure--img"><img src="plot.svg" alt="" title="Plot""#));
        assert!(!out.contains("<figcaption>"));
    }

    #[test]
    fn test_image_pdf_source() {
        let out = render("![Slides](deck.PDF)");
        assert!(out.starts_with(r#"<figure class="post-figure post-figure--pdf">"#));
        assert!(out.contains(r#"<iframe src="deck.PDF" title="Slides" loading="lazy""#));
        assert!(out.contains("<figcaption>Slides</figcaption>"));
        assert!(out.contains(r#"<a href="deck.PDF" target="_blank" rel="noopener">open/download it</a>"#));
    }

    #[test]
    fn test_pdf_link_paragraph() {
        let out = render("[Appendix | 600px](files/appendix.pdf)");
        assert!(out.starts_with(r#"<figure class="post-figure post-figure--pdf" style="max-width:600px">"#));
        assert!(out.contains("<figcaption>Appendix</figcaption>"));

        let titled = render(r#"[click here](a.pdf "Full proof | | center")"#);
        assert!(titled.contains("figure--center"));
        assert!(titled.contains("<figcaption>Full proof</figcaption>"));
    }

    #[test]
    fn test_pdf_link_caption_fallback() {
        let out = render("[](a.pdf)");
        assert!(out.contains("<figcaption>Supplementary PDF</figcaption>"));
        assert!(out.contains(r#"title="Supplementary PDF""#));
    }

    #[test]
    fn test_inline_image_and_link_untouched() {
        let out = render("Look ![icon](i.png) here and [paper](p.pdf) too.");
        assert_eq!(
            out,
            "<p>Look <img src=\"i.png\" alt=\"icon\" /> here and <a href=\"p.pdf\">paper</a> too.</p>\n"
        );
    }

    #[test]
    fn test_image_in_table_cell() {
        let out = render("| a |\n|---|\n| ![x](x.png) |\n");
        assert!(out.contains(r#"<td><figure class="post-figure post-figure--img"><img src="x.png" alt="x""#));
    }

    #[test]
    fn test_non_pdf_link_paragraph_kept() {
        assert_eq!(render("[site](https://x.org)"), "<p><a href=\"https://x.org\">site</a></p>\n");
    }
}
