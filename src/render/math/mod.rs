//! Math backends hooked into the markdown renderer.
//!
//! `pulldown-cmark` recognizes `$...$` and `$$...$$`; a backend turns the
//! LaTeX between the dollars into markup. The client-side backends leave
//! typesetting to KaTeX or MathJax in the browser, the MathML backend
//! converts at render time.

mod client;
#[cfg(feature = "mathml")]
mod mathml;

pub use self::client::{ClientLibrary, ClientMath};
#[cfg(feature = "mathml")]
pub use self::mathml::MathMLRenderer;

use crate::error::RenderError;
use serde::{Deserialize, Serialize};

/// Math rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathBackend {
    /// KaTeX in the browser.
    #[default]
    KaTeX,
    /// MathJax in the browser.
    MathJax,
    /// MathML, needs the `mathml` feature.
    MathML,
}

/// Math options for a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathOptions {
    /// Recognize `$...$` and `$$...$$`.
    pub enabled: bool,
    pub backend: MathBackend,
}

impl Default for MathOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: MathBackend::KaTeX,
        }
    }
}

/// Inline (`$`) or display (`$$`) math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

impl MathMode {
    /// The dollar delimiter this mode is written with.
    pub fn delimiter(self) -> &'static str {
        match self {
            MathMode::Inline => "$",
            MathMode::Display => "$$",
        }
    }

    /// Class shared by the markup of every backend.
    pub fn class(self) -> &'static str {
        match self {
            MathMode::Inline => "math math-inline",
            MathMode::Display => "math math-display",
        }
    }
}

/// Math extension hooked into the markdown renderer.
///
/// A [`RenderError::Math`] does not fail the render: the markdown engine
/// logs it and keeps the source with its dollar delimiters.
pub trait MathRenderer {
    fn render(&self, latex: &str, mode: MathMode) -> Result<String, RenderError>;

    /// Scripts and styles a standalone page needs.
    fn head_content(&self) -> Option<String>;
}

/// Create a math renderer for the given backend.
pub fn create_renderer(backend: MathBackend) -> Box<dyn MathRenderer> {
    match backend {
        MathBackend::KaTeX => Box::new(ClientMath::new(ClientLibrary::KaTeX)),
        MathBackend::MathJax => Box::new(ClientMath::new(ClientLibrary::MathJax)),
        #[cfg(feature = "mathml")]
        MathBackend::MathML => Box::new(MathMLRenderer),
        #[cfg(not(feature = "mathml"))]
        MathBackend::MathML => {
            tracing::warn!("built without the mathml feature; using KaTeX");
            Box::new(ClientMath::new(ClientLibrary::KaTeX))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        let opts: MathOptions = toml::from_str("backend = \"mathjax\"").unwrap();
        assert!(opts.enabled);
        assert_eq!(opts.backend, MathBackend::MathJax);
    }

    #[test]
    fn test_create_renderer_head() {
        let katex = create_renderer(MathBackend::KaTeX);
        assert!(katex.head_content().unwrap().contains("katex"));
        let mathjax = create_renderer(MathBackend::MathJax);
        assert!(mathjax.head_content().unwrap().contains("MathJax"));
    }

    #[cfg(not(feature = "mathml"))]
    #[test]
    fn test_mathml_without_feature_uses_katex() {
        let renderer = create_renderer(MathBackend::MathML);
        assert!(renderer.head_content().unwrap().contains("katex"));
    }
}
