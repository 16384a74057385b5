//! # annotated-post
//!
//! Render annotated blog posts: a markdown document with a YAML-like front
//! matter header, numbered citations resolved against a bibliography,
//! inline footnotes shown as tooltips, math, and images or PDFs wrapped in
//! captioned figures with a lightbox.
//!
//! ## Quick Start
//!
//! ```rust
//! use annotated_post::{Bibliography, PostRenderer, RenderOptions};
//!
//! let source = "---\ntitle: Hello\nauthors:\n  - Jane Doe | https://jane.dev\n---\nSee [@smith2020].^[{A note.}]\n";
//!
//! let post = PostRenderer::new()
//!     .render_source(source, Bibliography::new(), None, &RenderOptions::new("posts/hello.md"))
//!     .unwrap();
//!
//! assert_eq!(post.seen, vec!["smith2020"]);
//! assert!(post.container.html.contains(r#"data-keys="smith2020">[1]"#));
//! assert!(post.footnotes.contains_key("fn-0"));
//! ```
//!
//! ## Syntax Reference
//!
//! ### Front Matter
//!
//! ```text
//! ---
//! title: "Attention, revisited"
//! authors:
//!   - Jane Doe | https://jane.dev
//!   - name: Bob Roe
//!     affiliations:
//!       - Uni A
//! paper: https://arxiv.org/abs/1234.5678
//! code: https://github.com/example/repo
//! tags:
//!   - transformers
//! image: cover.png
//! ---
//! ```
//!
//! ### Citations
//!
//! - Single: `[@vaswani2017]`
//! - Multiple: `[@vaswani2017; @bahdanau2014]`
//!
//! Numbers follow first appearance. Keys are looked up in a `bib.html`
//! fragment (`<li id="ref-KEY" data-title=...>`), which `postrender
//! bib2html` produces from BibTeX.
//!
//! ### Footnotes
//!
//! `Claim^[{Footnote with *markdown* and [@citations].}]`
//!
//! ### Figures
//!
//! Alt text carries `Caption | max-width | align`; a paragraph holding only
//! an image or a link to a PDF becomes a figure:
//!
//! ```text
//! ![Training loss | 600px | center](loss.png)
//! [Full proof](appendix.pdf)
//! ```
//!
//! ## Features
//!
//! - `mathml`: MathML math backend (`latex2mathml`)
//! - `sanitize`: `ammonia` sanitizer for footnote tooltips
//! - `http`: blocking HTTP loader (`reqwest`)
//! - `wasm`: WebAssembly bindings (`wasm-bindgen`)
//! - `cli`: the `postrender` binary

pub mod ast;
pub mod bibliography;
pub mod bibtex;
pub mod config;
pub mod error;
pub mod html;
pub mod loader;
pub mod parser;
pub mod render;
pub mod resolve;
pub mod ui;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use ast::{Author, BibEntry, Bibliography, Frontmatter, RenderedPost};
pub use config::RenderOptions;
pub use error::{ConfigError, Error, LoadError, RenderError, Result};
pub use loader::{FsLoader, Loader};
pub use parser::parse;
pub use render::{MathBackend, PostRenderer};
pub use ui::UiSession;

#[cfg(feature = "http")]
pub use loader::HttpLoader;

/// Load and render a post with the default renderer for `options`.
///
/// # Example
///
/// ```rust,no_run
/// use annotated_post::{render_post, FsLoader, RenderOptions};
///
/// let post = render_post(&FsLoader::new("site"), &RenderOptions::new("posts/hello/post.md")).unwrap();
/// println!("{}", post.container.html);
/// ```
pub fn render_post<L: Loader + ?Sized>(loader: &L, options: &RenderOptions) -> Result<RenderedPost> {
    PostRenderer::for_options(options).render_post(loader, options)
}
