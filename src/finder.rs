//! Locating module sources by qualified name.

use std::path::{Path, PathBuf};

use latebind_core::QualifiedName;

use crate::RuntimeConfig;

/// Where a module's source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: QualifiedName,
    pub origin: PathBuf,
    /// Packages are directories; their source is the package file inside.
    pub is_package: bool,
}

/// Looks modules up by qualified name without loading them.
pub trait ModuleFinder {
    fn find_spec(&self, name: &QualifiedName) -> Option<ModuleSpec>;
}

/// Finder over a list of directory roots.
///
/// `a.b` is the package `<root>/a/b/mod.lb` if that file exists, otherwise
/// the module `<root>/a/b.lb`. Roots are tried in order.
#[derive(Debug, Clone)]
pub struct SourceTree {
    roots: Vec<PathBuf>,
    extension: String,
    package_file: String,
}

impl SourceTree {
    pub fn new<I, P>(roots: I, extension: &str, package_file: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            extension: extension.to_string(),
            package_file: package_file.to_string(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(
            config.search_paths().iter().cloned(),
            config.extension(),
            config.package_file(),
        )
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn find_in(&self, root: &Path, name: &QualifiedName) -> Option<ModuleSpec> {
        let mut dir = root.to_path_buf();
        for segment in name.namespace_path() {
            dir.push(segment);
        }

        let package = dir
            .join(&name.name)
            .join(format!("{}.{}", self.package_file, self.extension));
        if package.is_file() {
            return Some(ModuleSpec {
                name: name.clone(),
                origin: package,
                is_package: true,
            });
        }

        let module = dir.join(format!("{}.{}", name.name, self.extension));
        if module.is_file() && name.name != self.package_file {
            return Some(ModuleSpec {
                name: name.clone(),
                origin: module,
                is_package: false,
            });
        }
        None
    }
}

impl ModuleFinder for SourceTree {
    fn find_spec(&self, name: &QualifiedName) -> Option<ModuleSpec> {
        if name.segments().any(|s| s.is_empty() || s.contains(['/', '\\'])) {
            return None;
        }
        self.roots.iter().find_map(|root| self.find_in(root, name))
    }
}
