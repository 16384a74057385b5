//! Error types for the annotated-post library.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
///
/// Only failures that abort a render surface here. Recoverable problems
/// (missing bibliography, missing `frontmatter.html`) are logged and the
/// render continues with a fallback.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no markdown renderer is installed; construct the renderer with PostRenderer::new()")]
    RendererMissing,

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Container #{0} not found")]
    ContainerNotFound(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while fetching a document or fragment.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load {0}: not found")]
    NotFound(String),

    #[error("Failed to load {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },
}

/// Errors that occur during rendering.
///
/// A `Math` error from a [`MathRenderer`](crate::render::MathRenderer) is
/// logged and the source kept; `Markdown` is for
/// [`MarkdownEngine`](crate::render::MarkdownEngine) implementations.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Math rendering error: {0}")]
    Math(String),

    #[error("Malformed host page: {0}")]
    Template(String),

    #[error("Markdown rendering error: {0}")]
    Markdown(String),
}

/// Errors raised while reading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML in {path}: {message}")]
    Toml { path: String, message: String },

    #[error("Missing required option: {0}")]
    Missing(&'static str),
}
