//! Rendering layer: the post pipeline and the pieces it is built from.

pub mod footnotes;
pub mod header;
pub mod markdown;
pub mod math;
pub mod media;
pub mod page;

pub use footnotes::extract_footnotes;
pub use header::{build_header, fallback_title};
pub use markdown::{CmarkEngine, MarkdownEngine, MarkdownOptions};
pub use math::{create_renderer, MathBackend, MathMode, MathOptions, MathRenderer};
pub use page::{assemble_page, standalone_page};

use crate::ast::{Bibliography, CitationOrder, Container, FrontValue, RenderedPost};
use crate::bibliography::load_bibliography;
use crate::config::RenderOptions;
use crate::error::{Error, Result};
use crate::loader::{base_dir, Loader};
use crate::parser;
use crate::resolve::resolve_citations;
use tracing::{debug, warn};

/// Renders posts with a markdown engine and an optional math extension.
pub struct PostRenderer {
    engine: Option<Box<dyn MarkdownEngine>>,
    math: Option<Box<dyn MathRenderer>>,
}

impl Default for PostRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PostRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostRenderer")
            .field("engine", &self.engine.is_some())
            .field("math", &self.math.is_some())
            .finish()
    }
}

impl PostRenderer {
    /// `pulldown-cmark` with KaTeX math.
    pub fn new() -> Self {
        Self {
            engine: Some(Box::new(CmarkEngine::new())),
            math: Some(create_renderer(MathBackend::KaTeX)),
        }
    }

    /// No collaborators installed. Rendering fails until an engine is set.
    pub fn bare() -> Self {
        Self {
            engine: None,
            math: None,
        }
    }

    /// Default engine with the math backend chosen in `options`.
    pub fn for_options(options: &RenderOptions) -> Self {
        let renderer = Self::new();
        if options.math.enabled {
            renderer.with_math(create_renderer(options.math.backend))
        } else {
            renderer.without_math()
        }
    }

    pub fn with_engine(mut self, engine: Box<dyn MarkdownEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_math(mut self, math: Box<dyn MathRenderer>) -> Self {
        self.math = Some(math);
        self
    }

    pub fn without_math(mut self) -> Self {
        self.math = None;
        self
    }

    /// Head content the installed math extension needs.
    pub fn head_content(&self) -> Option<String> {
        self.math.as_ref().and_then(|math| math.head_content())
    }

    /// Load the bibliography and markdown through `loader`, then render.
    ///
    /// A missing bibliography is tolerated; a missing markdown file is not.
    /// When the markdown has no front matter, `frontmatter.html` next to it
    /// is used as the header if it can be loaded.
    pub fn render_post<L: Loader + ?Sized>(
        &self,
        loader: &L,
        options: &RenderOptions,
    ) -> Result<RenderedPost> {
        if self.engine.is_none() {
            return Err(Error::RendererMissing);
        }
        options.validate()?;

        let bibliography = load_bibliography(loader, &options.bib_path);
        let markdown = loader.load(&options.md_path)?;

        let fallback_header = match parser::split_frontmatter(&markdown) {
            (Some(_), _) => None,
            (None, _) => {
                let path = format!("{}frontmatter.html", base_dir(&options.md_path));
                match loader.load(&path) {
                    Ok(html) => Some(html),
                    Err(err) => {
                        debug!(%path, error = %err, "no frontmatter.html");
                        None
                    }
                }
            }
        };

        self.render_source(&markdown, bibliography, fallback_header.as_deref(), options)
    }

    /// Render an already fetched post.
    ///
    /// `frontmatter_html` is used verbatim as the header when the markdown
    /// has no front matter block.
    pub fn render_source(
        &self,
        markdown: &str,
        bibliography: Bibliography,
        frontmatter_html: Option<&str>,
        options: &RenderOptions,
    ) -> Result<RenderedPost> {
        let engine = self.engine.as_deref().ok_or(Error::RendererMissing)?;

        let parsed = parser::parse(markdown);
        let (header_html, title) = match &parsed.frontmatter {
            Some(meta) => {
                let title = meta
                    .get("title")
                    .and_then(FrontValue::as_str)
                    .filter(|title| !title.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback_title(&options.md_path));
                (build_header(meta), title)
            }
            None => {
                let title = fallback_title(&options.md_path);
                match frontmatter_html {
                    Some(html) => (html.to_string(), title),
                    None => (header::fallback_header(&options.md_path), title),
                }
            }
        };

        let mut order = CitationOrder::new();
        let body = resolve_citations(parsed.body, &mut order);
        debug!(citations = order.seen().len(), "resolved citations");

        let math = if options.math.enabled {
            if self.math.is_none() {
                warn!("no math extension installed; math is left as text");
            }
            self.math.as_deref()
        } else {
            None
        };
        let html = engine.render(&body, &options.markdown, math)?;
        let (html, footnotes) = extract_footnotes(&html);

        let container = Container {
            id: options.container_id.clone(),
            html: page::container_html(&header_html, &html),
        };
        let references_html = page::reference_items(order.seen(), &bibliography);

        Ok(RenderedPost {
            title,
            seen: order.seen().to_vec(),
            order: order.numbers().clone(),
            bibliography,
            footnotes,
            container,
            header_html,
            references_html,
        })
    }

    /// Final page for a rendered post: injected into the `template` host
    /// page when one is given, a standalone document when requested,
    /// otherwise `None`.
    pub fn page<L: Loader + ?Sized>(
        &self,
        loader: &L,
        post: &RenderedPost,
        options: &RenderOptions,
    ) -> Result<Option<String>> {
        if let Some(template_path) = &options.template {
            let template = loader.load(template_path)?;
            let page = assemble_page(
                &template,
                &post.container.id,
                &post.container.html,
                &post.references_html,
            )?;
            return Ok(Some(page));
        }
        if options.standalone {
            return standalone_page(post, self.head_content().as_deref()).map(Some);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BibEntry;
    use crate::error::LoadError;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapLoader {
        files: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl MapLoader {
        fn with(mut self, path: &str, content: &str) -> Self {
            self.files.insert(path.to_string(), content.to_string());
            self
        }
    }

    impl Loader for MapLoader {
        fn load(&self, path: &str) -> std::result::Result<String, LoadError> {
            self.requests.borrow_mut().push(path.to_string());
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(path.to_string()))
        }
    }

    const BIB: &str = r#"<ol id="refs-list">
<li id="ref-foo" data-title="Foo" data-short-authors="J. Doe" data-year="2020">Doe, J. (2020). Foo.</li>
<li id="ref-bar" data-title="Bar" data-year="2021">Roe, R. (2021). Bar.</li>
</ol>"#;

    #[test]
    fn test_render_post_numbering_and_references() {
        let loader = MapLoader::default()
            .with("bib.html", BIB)
            .with("posts/a/post.md", "---\ntitle: Hello\n---\nSee [@foo] and [@bar; @foo].\n");
        let post = PostRenderer::new()
            .render_post(&loader, &RenderOptions::new("posts/a/post.md"))
            .unwrap();

        assert_eq!(post.title, "Hello");
        assert_eq!(post.seen, vec!["foo", "bar"]);
        assert_eq!(post.order["foo"], 1);
        assert_eq!(post.order["bar"], 2);
        assert!(post.container.html.contains(
            r#"<sup><span class="cite" tabindex="0" data-keys="bar,foo">[2,1]</span></sup>"#
        ));
        assert_eq!(
            post.references_html,
            r#"<li class="bib-item">Doe, J. (2020). Foo.</li><li class="bib-item">Roe, R. (2021). Bar.</li>"#
        );
        assert_eq!(*loader.requests.borrow(), vec!["bib.html", "posts/a/post.md"]);
    }

    #[test]
    fn test_missing_bibliography_tolerated() {
        let loader = MapLoader::default().with("p.md", "x [@ghost]");
        let post = PostRenderer::new()
            .render_post(&loader, &RenderOptions::new("p.md"))
            .unwrap();
        assert!(post.bibliography.is_empty());
        assert!(post.references_html.contains("ghost (missing from bib.html)"));
    }

    #[test]
    fn test_missing_markdown_fails() {
        let loader = MapLoader::default().with("bib.html", BIB);
        let err = PostRenderer::new()
            .render_post(&loader, &RenderOptions::new("nope.md"))
            .unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::NotFound(_))));
    }

    #[test]
    fn test_renderer_missing() {
        let loader = MapLoader::default().with("p.md", "hi");
        let err = PostRenderer::bare()
            .render_post(&loader, &RenderOptions::new("p.md"))
            .unwrap_err();
        assert!(matches!(err, Error::RendererMissing));
        assert!(loader.requests.borrow().is_empty());
    }

    #[test]
    fn test_frontmatter_html_fallback() {
        let loader = MapLoader::default()
            .with("posts/b/my-post.md", "Body")
            .with("posts/b/frontmatter.html", "<header>Custom</header>");
        let post = PostRenderer::new()
            .render_post(&loader, &RenderOptions::new("posts/b/my-post.md"))
            .unwrap();
        assert_eq!(post.header_html, "<header>Custom</header>");
        assert_eq!(post.title, "my post");
        assert!(post.container.html.starts_with(r#"<header>Custom</header><div class="post-body">"#));
    }

    #[test]
    fn test_synthesized_header() {
        let loader = MapLoader::default().with("posts/c/deep_dive.md", "Body");
        let post = PostRenderer::new()
            .render_post(&loader, &RenderOptions::new("posts/c/deep_dive.md"))
            .unwrap();
        assert!(post.header_html.contains(r#"<h1 class="pf-title">deep dive</h1>"#));
        assert!(loader
            .requests
            .borrow()
            .contains(&"posts/c/frontmatter.html".to_string()));
    }

    #[test]
    fn test_footnotes_extracted() {
        let post = PostRenderer::new()
            .render_source(
                "Claim^[{see [@foo]}].",
                Bibliography::new(),
                None,
                &RenderOptions::new("p.md"),
            )
            .unwrap();
        assert_eq!(post.seen, vec!["foo"]);
        assert!(post.footnotes["fn-0"].contains(r#"data-keys="foo""#));
        assert!(post.container.html.contains(r#"data-fn-id="fn-0""#));
    }

    #[test]
    fn test_math_disabled_by_options() {
        let mut options = RenderOptions::new("p.md");
        options.math.enabled = false;
        let post = PostRenderer::for_options(&options)
            .render_source("$x$", Bibliography::new(), None, &options)
            .unwrap();
        assert!(post.container.html.contains("<p>$x$</p>"));
        assert!(!post.container.html.contains("math-inline"));
    }

    #[test]
    fn test_page_with_template() {
        let loader = MapLoader::default()
            .with("p.md", "Hi [@foo]")
            .with("bib.html", BIB)
            .with("index.html", r#"<body><div id="content"></div></body>"#);
        let mut options = RenderOptions::new("p.md");
        options.template = Some("index.html".into());

        let renderer = PostRenderer::new();
        let post = renderer.render_post(&loader, &options).unwrap();
        let page = renderer.page(&loader, &post, &options).unwrap().unwrap();
        assert!(page.contains(r#"<div id="content"><div class="post-front">"#));
        assert!(page.contains(r#"</div><section id="references"><h2>References</h2><ol id="refs-list"><li class="bib-item">Doe, J. (2020). Foo.</li></ol></section></body>"#));
    }

    #[test]
    fn test_bibliography_entry_kept_for_uncited() {
        let mut bib = Bibliography::new();
        bib.insert("unused".into(), BibEntry::default());
        let post = PostRenderer::new()
            .render_source("no cites", bib, None, &RenderOptions::new("p.md"))
            .unwrap();
        assert!(post.bibliography.contains_key("unused"));
        assert!(post.references_html.contains("No citations found"));
    }
}
