//! Runtime configuration.
//!
//! ```
//! use latebind::{RelativeFallback, RuntimeConfig};
//!
//! let config = RuntimeConfig::new()
//!     .with_search_path("tests/fixtures")
//!     .with_relative_fallback(RelativeFallback::Explicit);
//! assert_eq!(config.extension(), "lb");
//! assert_eq!(config.search_paths().len(), 1);
//! ```

use std::path::{Path, PathBuf};

use crate::Runtime;

/// How absolute-looking imports inside a deferred block are treated when
/// they do not resolve absolutely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelativeFallback {
    /// Retry the name relative to the owning package and warn.
    #[default]
    Infer,
    /// Require explicit leading dots for relative imports.
    Explicit,
}

/// Configuration for a [`Runtime`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    search_paths: Vec<PathBuf>,
    extension: String,
    package_file: String,
    relative_fallback: RelativeFallback,
    default_encoding: String,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            extension: "lb".to_string(),
            package_file: "mod".to_string(),
            relative_fallback: RelativeFallback::default(),
            default_encoding: "utf-8".to_string(),
        }
    }

    /// Add a root directory modules are searched under.
    pub fn with_search_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// File extension of module sources, without the dot.
    pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    /// Stem of the file that marks a directory as a package.
    pub fn with_package_file<S: Into<String>>(mut self, stem: S) -> Self {
        self.package_file = stem.into();
        self
    }

    pub fn with_relative_fallback(mut self, fallback: RelativeFallback) -> Self {
        self.relative_fallback = fallback;
        self
    }

    /// Encoding assumed when a source file has no encoding marker.
    pub fn with_default_encoding<S: Into<String>>(mut self, encoding: S) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn package_file(&self) -> &str {
        &self.package_file
    }

    pub fn relative_fallback(&self) -> RelativeFallback {
        self.relative_fallback
    }

    pub fn default_encoding(&self) -> &str {
        &self.default_encoding
    }

    /// File name of a package's own source (`mod.lb`).
    pub fn package_file_name(&self) -> String {
        format!("{}.{}", self.package_file, self.extension)
    }

    /// Whether `path` carries the module extension.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }

    /// Create a runtime with this configuration.
    pub fn build(self) -> Runtime {
        Runtime::new(self)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
