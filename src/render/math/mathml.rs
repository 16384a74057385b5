//! MathML through `latex2mathml`.

use super::{MathMode, MathRenderer};
use crate::error::RenderError;
use latex2mathml::{latex_to_mathml, DisplayStyle};

/// Converts at render time; the page needs no script.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMLRenderer;

impl MathRenderer for MathMLRenderer {
    fn render(&self, latex: &str, mode: MathMode) -> Result<String, RenderError> {
        let style = match mode {
            MathMode::Inline => DisplayStyle::Inline,
            MathMode::Display => DisplayStyle::Block,
        };
        let mathml = latex_to_mathml(latex, style)
            .map_err(|err| RenderError::Math(format!("{}{latex}{}: {err}", mode.delimiter(), mode.delimiter())))?;
        Ok(format!(r#"<span class="{}">{mathml}</span>"#, mode.class()))
    }

    fn head_content(&self) -> Option<String> {
        Some(MATHML_STYLES.to_string())
    }
}

const MATHML_STYLES: &str = r#"<style>
.math-display { display: block; margin: 1em 0; text-align: center; }
</style>"#;
