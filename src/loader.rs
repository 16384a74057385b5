//! Resource loaders used by the render pipeline.
//!
//! Paths are the same strings a page would fetch (`posts/a/post.md`,
//! `bib.html`). [`FsLoader`] resolves them against a root directory;
//! [`HttpLoader`] (feature `http`) against a base URL.

use crate::error::LoadError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fetch a text resource by path.
pub trait Loader {
    fn load(&self, path: &str) -> Result<String, LoadError>;
}

impl<L: Loader + ?Sized> Loader for &L {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        (**self).load(path)
    }
}

/// Loads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Loader for FsLoader {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        let full = self.resolve(path);
        debug!(path = %full.display(), "loading file");

        std::fs::read_to_string(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(full.display().to_string()),
            _ => LoadError::Io {
                path: full.display().to_string(),
                source,
            },
        })
    }
}

/// Loads resources over HTTP with a blocking client.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpLoader {
    base: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpLoader {
    /// `base` is joined with each path, e.g. `https://example.com/blog/`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(feature = "http")]
impl Loader for HttpLoader {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        let url = self.url_for(path);
        debug!(%url, "fetching");

        let http_err = |err: reqwest::Error| LoadError::Http {
            url: url.clone(),
            message: err.to_string(),
        };

        let response = self.client.get(&url).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(http_err)
    }
}

/// Directory part of a path including the trailing `/`, or `""`.
pub fn base_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_fs_loader_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::write(dir.path().join("posts/a.md"), "hello").unwrap();

        let loader = FsLoader::new(dir.path());
        assert_eq!(loader.load("posts/a.md").unwrap(), "hello");
        assert_eq!(loader.load("/posts/a.md").unwrap(), "hello");
    }

    #[test]
    fn test_fs_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(dir.path());
        match loader.load("nope.md") {
            Err(LoadError::NotFound(path)) => assert!(path.ends_with("nope.md")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir("posts/a/post.md"), "posts/a/");
        assert_eq!(base_dir("/post.md"), "/");
        assert_eq!(base_dir("post.md"), "");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_url_join() {
        let loader = HttpLoader::new("https://example.com/blog/");
        assert_eq!(loader.url_for("/posts/a.md"), "https://example.com/blog/posts/a.md");
        assert_eq!(loader.url_for("https://cdn.example/x"), "https://cdn.example/x");
    }
}
