//! Browser-side typesetting.
//!
//! The LaTeX is written escaped into an element carrying the mode's class;
//! the head script renders each `.math` element in place, so prices and
//! other dollars elsewhere in the page are never touched.

use super::{MathMode, MathRenderer};
use crate::error::RenderError;
use crate::html::escape_html;

/// Library that typesets the placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLibrary {
    KaTeX,
    MathJax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMath {
    library: ClientLibrary,
}

impl ClientMath {
    pub fn new(library: ClientLibrary) -> Self {
        Self { library }
    }
}

impl MathRenderer for ClientMath {
    fn render(&self, latex: &str, mode: MathMode) -> Result<String, RenderError> {
        let latex = latex.trim();
        if latex.is_empty() {
            return Err(RenderError::Math(format!("empty {} math", mode.delimiter())));
        }
        Ok(format!(r#"<span class="{}">{}</span>"#, mode.class(), escape_html(latex)))
    }

    fn head_content(&self) -> Option<String> {
        let head = match self.library {
            ClientLibrary::KaTeX => KATEX_HEAD,
            ClientLibrary::MathJax => MATHJAX_HEAD,
        };
        Some(head.to_string())
    }
}

const KATEX_HEAD: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.css" crossorigin="anonymous">
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.js" crossorigin="anonymous"
    onload="document.querySelectorAll('.math').forEach(function (el) {
        katex.render(el.textContent, el, {
            displayMode: el.classList.contains('math-display'),
            throwOnError: false
        });
    });"></script>"#;

const MATHJAX_HEAD: &str = r#"<script>
MathJax = {
    startup: {
        typeset: false,
        pageReady() {
            return MathJax.startup.defaultPageReady().then(() => {
                for (const el of document.querySelectorAll('.math')) {
                    const display = el.classList.contains('math-display');
                    el.replaceChildren(MathJax.tex2chtml(el.textContent, {display}));
                }
                MathJax.startup.document.clear();
                MathJax.startup.document.updateDocument();
            });
        }
    }
};
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js"></script>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholders() {
        let katex = ClientMath::new(ClientLibrary::KaTeX);
        assert_eq!(
            katex.render("E = mc^2", MathMode::Inline).unwrap(),
            r#"<span class="math math-inline">E = mc^2</span>"#
        );
        assert_eq!(
            katex.render(" a < b\n", MathMode::Display).unwrap(),
            r#"<span class="math math-display">a &lt; b</span>"#
        );
    }

    #[test]
    fn test_empty_math_is_an_error() {
        let mathjax = ClientMath::new(ClientLibrary::MathJax);
        match mathjax.render("  ", MathMode::Display) {
            Err(RenderError::Math(message)) => assert_eq!(message, "empty $$ math"),
            other => panic!("expected a math error, got {other:?}"),
        }
    }

    #[test]
    fn test_head_targets_math_elements() {
        for library in [ClientLibrary::KaTeX, ClientLibrary::MathJax] {
            let head = ClientMath::new(library).head_content().unwrap();
            assert!(head.contains("querySelectorAll('.math')"));
            assert!(head.contains("math-display"));
        }
    }
}
