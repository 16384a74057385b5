//! Markdown rendering.
//!
//! The renderer is a collaborator behind [`MarkdownEngine`]; the default
//! [`CmarkEngine`] drives `pulldown-cmark`, hooks math into its event
//! stream and wraps media into figures.

use crate::error::Result;
use crate::html::escape_html;
use crate::render::math::{MathMode, MathRenderer};
use crate::render::media::wrap_media;
use pulldown_cmark::{html, CowStr, Event, Options, Parser};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Markdown options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Single newlines become `<br>`.
    pub breaks: bool,
    /// Tables, strikethrough, task lists and GFM blockquote tags.
    pub gfm: bool,
    pub smart_punctuation: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            breaks: true,
            gfm: true,
            smart_punctuation: false,
        }
    }
}

impl MarkdownOptions {
    fn parser_options(&self, math: bool) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options |= Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM;
        }
        if self.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        if math {
            options |= Options::ENABLE_MATH;
        }
        options
    }
}

/// Converts markdown to HTML.
pub trait MarkdownEngine {
    /// Render `markdown`. `math` is the math extension, when one is
    /// installed; without it `$...$` stays literal text.
    fn render(
        &self,
        markdown: &str,
        options: &MarkdownOptions,
        math: Option<&dyn MathRenderer>,
    ) -> Result<String>;
}

/// `pulldown-cmark` backed engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmarkEngine;

impl CmarkEngine {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownEngine for CmarkEngine {
    fn render(
        &self,
        markdown: &str,
        options: &MarkdownOptions,
        math: Option<&dyn MathRenderer>,
    ) -> Result<String> {
        let parser = Parser::new_ext(markdown, options.parser_options(math.is_some()));

        let mut events = Vec::new();
        for event in parser {
            let event = match event {
                Event::SoftBreak if options.breaks => Event::HardBreak,
                Event::InlineMath(latex) => match math {
                    Some(renderer) => Event::InlineHtml(render_math(renderer, &latex, MathMode::Inline)),
                    None => Event::InlineMath(latex),
                },
                Event::DisplayMath(latex) => match math {
                    Some(renderer) => Event::InlineHtml(render_math(renderer, &latex, MathMode::Display)),
                    None => Event::DisplayMath(latex),
                },
                other => other,
            };
            events.push(event);
        }

        let events = wrap_media(events);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());

        debug!(bytes = out.len(), "rendered markdown");
        Ok(out)
    }
}

/// Math markup, or the delimited source when the backend rejects it.
fn render_math(renderer: &dyn MathRenderer, latex: &str, mode: MathMode) -> CowStr<'static> {
    match renderer.render(latex, mode) {
        Ok(html) => CowStr::from(html),
        Err(err) => {
            warn!(error = %err, "math left as source");
            let delimiter = mode.delimiter();
            CowStr::from(format!(
                r#"<code class="math-source">{delimiter}{}{delimiter}</code>"#,
                escape_html(latex)
            ))
        }
    }
}
