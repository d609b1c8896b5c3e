//! Spec resolution for deferred imports.
//!
//! Turns each [`ImportRequest`] of a deferred block into the qualified name
//! it refers to, tagged as a module or a type, plus the name it is bound to
//! in the owning module.
//!
//! Relative imports are anchored at the owning module's package: the module
//! itself when it is a package, its parent otherwise. Absolute-looking
//! imports are looked up absolutely first; under [`RelativeFallback::Infer`]
//! a miss is retried relative to the anchor with a warning.

use latebind_core::{DeferredError, QualifiedName};
use tracing::{debug, warn};

use crate::config::RelativeFallback;
use crate::deferred::{ImportForm, ImportRequest};
use crate::finder::{ModuleFinder, ModuleSpec};

/// What an import refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Module(QualifiedName),
    /// A type inside `module`; `qualname` is dotted for nested types.
    Type {
        module: QualifiedName,
        qualname: String,
    },
}

impl ImportTarget {
    /// Fully qualified name of the target.
    pub fn full_name(&self) -> QualifiedName {
        match self {
            ImportTarget::Module(name) => name.clone(),
            ImportTarget::Type { module, qualname } => module.join(qualname),
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, ImportTarget::Type { .. })
    }
}

/// A resolved import ready to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub target: ImportTarget,
    /// Dotted binding path in the owning module's namespace.
    pub binding: String,
    /// For a nested type bound without alias, the enclosing type's qualname
    /// the binding refers to.
    pub bound_qualname: Option<String>,
    pub line: u32,
}

/// The package relative imports in `owner` start from: the module itself
/// when it is a package, its parent otherwise.
pub fn package_anchor(owner: &ModuleSpec) -> Option<QualifiedName> {
    if owner.is_package {
        Some(owner.name.clone())
    } else {
        owner.name.parent()
    }
}

/// The module named by `level` leading dots and an optional module path,
/// seen from `owner`. `None` when the dots climb past the top level.
pub fn relative_module(owner: &ModuleSpec, level: u32, module: Option<&QualifiedName>) -> Option<QualifiedName> {
    let mut base = package_anchor(owner)?;
    for _ in 1..level {
        base = base.parent()?;
    }
    Some(match module {
        Some(m) => base.join(&m.to_string()),
        None => base,
    })
}

/// Resolves deferred imports for one owning module.
pub struct SpecResolver<'a> {
    finder: &'a dyn ModuleFinder,
    owner: &'a ModuleSpec,
    fallback: RelativeFallback,
}

impl<'a> SpecResolver<'a> {
    pub fn new(finder: &'a dyn ModuleFinder, owner: &'a ModuleSpec, fallback: RelativeFallback) -> Self {
        Self {
            finder,
            owner,
            fallback,
        }
    }

    /// The package relative imports start from.
    pub fn anchor(&self) -> Option<QualifiedName> {
        package_anchor(self.owner)
    }

    fn not_found(&self, name: &str) -> DeferredError {
        DeferredError::SpecNotFound {
            name: name.to_string(),
            within: self.owner.name.to_string(),
        }
    }

    fn find(&self, name: &QualifiedName) -> Option<ModuleSpec> {
        let spec = self.finder.find_spec(name);
        debug!(module = %name, found = spec.is_some(), "looking up module spec");
        spec
    }

    /// Look up an absolute-looking module name, falling back to the anchor.
    fn find_absolute(&self, name: &QualifiedName) -> Result<ModuleSpec, DeferredError> {
        if let Some(spec) = self.find(name) {
            return Ok(spec);
        }
        if self.fallback == RelativeFallback::Explicit {
            return Err(self.not_found(&name.to_string()));
        }

        let anchor = self.anchor().ok_or_else(|| self.not_found(&name.to_string()))?;
        let candidate = anchor.join(&name.to_string());
        let spec = self
            .find(&candidate)
            .ok_or_else(|| self.not_found(&name.to_string()))?;

        warn!(
            "import of [{name}] within [{}] is written as absolute but resolves relative to \
             [{anchor}]; resolving it as such, prefer the explicit prefix [.]",
            self.owner.name
        );
        Ok(spec)
    }

    /// Resolve the module part of a `from` import.
    fn resolve_from_module(
        &self,
        level: u32,
        module: Option<&QualifiedName>,
        spelling: &str,
    ) -> Result<ModuleSpec, DeferredError> {
        if level == 0 {
            let module = module.ok_or_else(|| self.not_found(spelling))?;
            return self.find_absolute(module);
        }

        let full = relative_module(self.owner, level, module).ok_or_else(|| self.not_found(spelling))?;
        self.find(&full).ok_or_else(|| self.not_found(spelling))
    }

    /// Resolve one import request.
    pub fn resolve(&self, request: &ImportRequest) -> Result<ResolvedImport, DeferredError> {
        match &request.form {
            ImportForm::Import => {
                let spec = self.find_absolute(&request.name)?;
                let binding = request
                    .alias
                    .clone()
                    .unwrap_or_else(|| request.name.to_string());
                Ok(ResolvedImport {
                    target: ImportTarget::Module(spec.name),
                    binding,
                    bound_qualname: None,
                    line: request.line,
                })
            }
            ImportForm::From { level, module } => {
                let spelling = request.module_spelling();
                let from = self.resolve_from_module(*level, module.as_ref(), &spelling)?;
                self.resolve_name(request, &from)
            }
        }
    }

    /// Decide whether `from M import Y` names a submodule or a type of `M`.
    fn resolve_name(&self, request: &ImportRequest, from: &ModuleSpec) -> Result<ResolvedImport, DeferredError> {
        let first = request.name.top_level();
        let submodule = if from.is_package {
            self.find(&from.name.child(first))
        } else {
            None
        };

        if !request.name.is_global() {
            if let Some(sub) = submodule {
                return Err(DeferredError::UnexpectedNestedName {
                    name: request.name.to_string(),
                    module: from.name.to_string(),
                    submodule: sub.name.to_string(),
                });
            }
            let qualname = request.name.to_string();
            let (binding, bound_qualname) = match &request.alias {
                Some(alias) => (alias.clone(), None),
                None => (first.to_string(), Some(first.to_string())),
            };
            return Ok(ResolvedImport {
                target: ImportTarget::Type {
                    module: from.name.clone(),
                    qualname,
                },
                binding,
                bound_qualname,
                line: request.line,
            });
        }

        let binding = request.alias.clone().unwrap_or_else(|| first.to_string());
        let target = match submodule {
            Some(sub) => ImportTarget::Module(sub.name),
            None => ImportTarget::Type {
                module: from.name.clone(),
                qualname: first.to_string(),
            },
        };
        Ok(ResolvedImport {
            target,
            binding,
            bound_qualname: None,
            line: request.line,
        })
    }
}
