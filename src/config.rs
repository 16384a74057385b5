//! Render options, loadable from TOML.

use crate::error::{ConfigError, Result};
use crate::render::markdown::MarkdownOptions;
use crate::render::math::MathOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Options for rendering one post.
///
/// ```toml
/// md_path = "posts/attention/post.md"
/// bib_path = "bib.html"
/// container_id = "content"
///
/// [markdown]
/// breaks = true
///
/// [math]
/// backend = "mathml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Markdown source. Required.
    pub md_path: String,
    /// Bibliography fragment.
    pub bib_path: String,
    /// Id of the element that receives the post.
    pub container_id: String,
    pub markdown: MarkdownOptions,
    pub math: MathOptions,
    /// Host page to inject the post into.
    pub template: Option<String>,
    /// Produce a complete document when there is no template.
    pub standalone: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            md_path: String::new(),
            bib_path: "bib.html".to_string(),
            container_id: "content".to_string(),
            markdown: MarkdownOptions::default(),
            math: MathOptions::default(),
            template: None,
            standalone: false,
        }
    }
}

impl RenderOptions {
    /// Options for `md_path` with every other value defaulted.
    pub fn new(md_path: impl Into<String>) -> Self {
        Self {
            md_path: md_path.into(),
            ..Default::default()
        }
    }

    /// Parse TOML; `origin` names the source in errors.
    pub fn from_toml_str(source: &str, origin: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Toml {
            path: origin.to_string(),
            message: err.message().to_string(),
        })
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let options = Self::from_toml_str(&source, &path.display().to_string())?;
        debug!(path = %path.display(), "loaded render options");
        Ok(options)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.md_path.trim().is_empty() {
            return Err(ConfigError::Missing("md_path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::math::MathBackend;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let opts = RenderOptions::new("post.md");
        assert_eq!(opts.bib_path, "bib.html");
        assert_eq!(opts.container_id, "content");
        assert!(opts.markdown.breaks);
        assert!(opts.markdown.gfm);
        assert!(opts.math.enabled);
        assert_eq!(opts.math.backend, MathBackend::KaTeX);
        assert!(opts.template.is_none());
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let opts = RenderOptions::from_toml_str(
            "md_path = \"a/post.md\"\nstandalone = true\n\n[markdown]\nbreaks = false\n\n[math]\nbackend = \"mathml\"\n",
            "post.toml",
        )
        .unwrap();
        assert_eq!(opts.md_path, "a/post.md");
        assert_eq!(opts.bib_path, "bib.html");
        assert!(opts.standalone);
        assert!(!opts.markdown.breaks);
        assert!(opts.markdown.gfm);
        assert_eq!(opts.math.backend, MathBackend::MathML);
    }

    #[test]
    fn test_invalid_toml() {
        match RenderOptions::from_toml_str("md_path = [", "bad.toml") {
            Err(ConfigError::Toml { path, .. }) => assert_eq!(path, "bad.toml"),
            other => panic!("expected Toml error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_md_path() {
        assert!(matches!(
            RenderOptions::default().validate(),
            Err(ConfigError::Missing("md_path"))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");
        std::fs::write(&path, "md_path = \"x.md\"\ncontainer_id = \"post\"\n").unwrap();
        let opts = RenderOptions::from_toml_file(&path).unwrap();
        assert_eq!(opts.container_id, "post");
    }
}
