//! The host runtime.
//!
//! [`Runtime`] loads `.lb` modules on demand, executes their statements,
//! feeds `deferred:` blocks through the deferred block engine and registers
//! every declared class with the registry. It owns the single [`Registry`]
//! shared by all modules it loads.
//!
//! # Example
//!
//! ```no_run
//! use latebind::RuntimeConfig;
//!
//! let mut runtime = RuntimeConfig::new().with_search_path("packages").build();
//! runtime.import("cc_one")?;
//! let main = runtime.instantiate("cc_one", "Main", &[])?;
//! let s = runtime.get_attr(&main, "s")?;
//! # Ok::<(), latebind::LatebindError>(())
//! ```

mod eval;
mod exec;
mod namespace;

use std::cell::Cell;
use std::rc::Rc;

use latebind_core::{
    Argument, ConcreteType, HostError, Instance, LatebindError, QualifiedName, TypeHash,
};
use latebind_registry::{PlaceholderId, Registry};
use rustc_hash::FxHashMap;

use crate::dispatch;
use crate::finder::{ModuleFinder, ModuleSpec, SourceTree};
use crate::substitution::{self, RegisteredType};
use crate::RuntimeConfig;

pub use eval::{MAX_EVAL_DEPTH, Resolved, Scope, ValueExpr};
pub use namespace::{Binding, Namespace};

/// Loading state of a host module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Statements are still executing; the module may be observed through
    /// an import cycle.
    Initializing,
    Ready,
}

/// A module in the runtime's module table.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    spec: ModuleSpec,
    state: ModuleState,
    namespace: Namespace,
}

impl LoadedModule {
    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

/// Members of a class declared in a host module.
#[derive(Debug)]
pub(crate) struct ClassMembers {
    module: QualifiedName,
    concrete: Rc<ConcreteType>,
    fields: Vec<(String, ValueExpr)>,
    /// Non-literal `static` members, evaluated on access.
    statics: Vec<(String, ValueExpr)>,
    post_init: Vec<(String, ValueExpr)>,
}

/// Loads modules and owns the registry they share.
pub struct Runtime {
    config: RuntimeConfig,
    finder: Box<dyn ModuleFinder>,
    registry: Registry,
    modules: FxHashMap<QualifiedName, LoadedModule>,
    /// Keyed by the concrete type's identity.
    members: FxHashMap<TypeHash, ClassMembers>,
    entry: Option<QualifiedName>,
    depth: Cell<usize>,
}

impl Runtime {
    /// Create a runtime that finds modules under the configured search paths.
    pub fn new(config: RuntimeConfig) -> Self {
        let finder = SourceTree::from_config(&config);
        Self::with_finder(config, Box::new(finder))
    }

    /// Create a runtime with a custom module finder.
    pub fn with_finder(config: RuntimeConfig, finder: Box<dyn ModuleFinder>) -> Self {
        Self {
            config,
            finder,
            registry: Registry::new(),
            modules: FxHashMap::default(),
            members: FxHashMap::default(),
            entry: None,
            depth: Cell::new(0),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The first module imported successfully.
    pub fn entry(&self) -> Option<&QualifiedName> {
        self.entry.as_ref()
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Import a module (and its parent packages) by dotted name.
    ///
    /// Already loaded modules are returned as is, including modules still
    /// initializing further up an import cycle.
    pub fn import(&mut self, name: &str) -> Result<QualifiedName, LatebindError> {
        let name = QualifiedName::try_from_dotted(name)
            .ok_or_else(|| HostError::ModuleNotFound(name.to_string()))?;
        self.load(&name)?;
        if self.entry.is_none() {
            self.entry = Some(name.clone());
        }
        Ok(name)
    }

    pub fn module(&self, name: &QualifiedName) -> Option<&LoadedModule> {
        self.modules.get(name)
    }

    pub fn is_loaded(&self, name: &QualifiedName) -> bool {
        self.modules.contains_key(name)
    }

    pub fn namespace(&self, module: &QualifiedName) -> Option<&Namespace> {
        self.modules.get(module).map(|m| &m.namespace)
    }

    /// Names of all loaded modules, sorted.
    pub fn loaded_modules(&self) -> Vec<&QualifiedName> {
        let mut names: Vec<&QualifiedName> = self.modules.keys().collect();
        names.sort();
        names
    }

    // ========================================================================
    // Types and instances
    // ========================================================================

    /// Register a type declared outside any host module.
    pub fn register(&mut self, concrete: ConcreteType) -> Result<RegisteredType, LatebindError> {
        Ok(substitution::register(&mut self.registry, concrete)?)
    }

    /// Evaluate the dotted `path` in `module`'s namespace.
    pub fn resolve(&self, module: &str, path: &str) -> Result<Resolved<'_>, LatebindError> {
        let module = self.loaded_name(module)?;
        let path: Vec<String> = path.split('.').map(str::to_string).collect();
        self.lookup_path(Scope::module(&module), &path)
    }

    /// The placeholder `path` refers to in `module`.
    pub fn placeholder(&self, module: &str, path: &str) -> Result<PlaceholderId, LatebindError> {
        match self.resolve(module, path)? {
            Resolved::Type(id) => Ok(id),
            _ => Err(HostError::NotAType(path.to_string()).into()),
        }
    }

    /// Construct the type `path` refers to in `module`.
    pub fn instantiate(
        &self,
        module: &str,
        path: &str,
        args: &[Argument],
    ) -> Result<Rc<Instance>, LatebindError> {
        let placeholder = self.placeholder(module, path)?;
        self.construct(placeholder, args)
    }

    /// Construct a placeholder through its registered implementation.
    pub fn construct(&self, placeholder: PlaceholderId, args: &[Argument]) -> Result<Rc<Instance>, LatebindError> {
        self.create(placeholder, args)
    }

    /// Whether `instance` is an instance of the type `path` refers to in `module`.
    pub fn is_instance(&self, instance: &Instance, module: &str, path: &str) -> Result<bool, LatebindError> {
        let placeholder = self.placeholder(module, path)?;
        Ok(dispatch::is_instance(&self.registry, instance, placeholder))
    }

    fn loaded_name(&self, module: &str) -> Result<QualifiedName, LatebindError> {
        let name = QualifiedName::from_dotted(module);
        if self.is_loaded(&name) {
            Ok(name)
        } else {
            Err(HostError::ModuleNotFound(module.to_string()).into())
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("modules", &self.loaded_modules())
            .field("placeholders", &self.registry.placeholder_count())
            .field("entry", &self.entry)
            .finish()
    }
}
