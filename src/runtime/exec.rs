//! Module loading and statement execution.

use std::rc::Rc;

use bumpalo::Bump;
use latebind_core::{ConcreteType, DeferredError, HostError, LatebindError, QualifiedName};
use latebind_parser::{ClassStmt, ImportFromStmt, ImportStmt, Parser, Stmt};
use tracing::debug;

use super::eval::ValueExpr;
use super::namespace::{Binding, Namespace};
use super::{ClassMembers, LoadedModule, ModuleState, Runtime};
use crate::deferred::{DeferredBlock, extract};
use crate::finder::ModuleSpec;
use crate::resolve::relative_module;
use crate::substitution::{self, RegisteredType};

fn unsupported(spec: &ModuleSpec, stmt: &Stmt<'_>) -> LatebindError {
    HostError::UnsupportedStatement {
        file: spec.origin.clone(),
        line: stmt.span().line,
        what: stmt.kind_name(),
    }
    .into()
}

impl Runtime {
    /// Load `name` and its parent packages unless already loaded.
    ///
    /// A module is entered into the module table before its body runs, so
    /// an import cycle sees it in the `Initializing` state. A module whose
    /// body fails is removed again.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn load(&mut self, name: &QualifiedName) -> Result<(), LatebindError> {
        if self.modules.contains_key(name) {
            return Ok(());
        }
        if let Some(parent) = name.parent() {
            self.load(&parent)?;
            // the parent package may have imported us
            if self.modules.contains_key(name) {
                return Ok(());
            }
        }

        let spec = self
            .finder
            .find_spec(name)
            .ok_or_else(|| HostError::ModuleNotFound(name.to_string()))?;
        let source = extract::read_source(&spec.origin, self.config.default_encoding()).map_err(|e| match e {
            DeferredError::Io { file, message } => LatebindError::from(HostError::Io { file, message }),
            other => other.into(),
        })?;

        let arena = Bump::new();
        let module = Parser::parse(&source, &arena).map_err(|errors| HostError::Parse {
            file: spec.origin.clone(),
            errors,
        })?;

        debug!(module = %name, file = %spec.origin.display(), package = spec.is_package, "loading module");
        self.modules.insert(
            name.clone(),
            LoadedModule {
                spec: spec.clone(),
                state: ModuleState::Initializing,
                namespace: Namespace::new(),
            },
        );

        match module.body().iter().try_for_each(|stmt| self.exec_stmt(&spec, stmt)) {
            Ok(()) => {
                if let Some(loaded) = self.modules.get_mut(name) {
                    loaded.state = ModuleState::Ready;
                }
                debug!(module = %name, "module ready");
                Ok(())
            }
            Err(error) => {
                self.modules.remove(name);
                Err(error)
            }
        }
    }

    fn exec_stmt(&mut self, spec: &ModuleSpec, stmt: &Stmt<'_>) -> Result<(), LatebindError> {
        match stmt {
            Stmt::Import(import) => self.exec_import(spec, import),
            Stmt::ImportFrom(import) => self.exec_import_from(spec, import),
            Stmt::Deferred(block) => {
                let deferred = DeferredBlock::enter(spec.clone(), block.span);
                let outcome = block.body.iter().try_for_each(|stmt| deferred.intercept(stmt));
                let bindings = deferred.exit(outcome, self.finder.as_ref(), &mut self.registry, &self.config)?;
                for binding in bindings {
                    self.bind(&spec.name, &binding.name, Binding::from(binding.item));
                }
                Ok(())
            }
            Stmt::Class(class) => {
                let registered = self.declare_class(spec, class, None)?;
                self.bind(&spec.name, class.name.name, Binding::Type(registered.placeholder()));
                Ok(())
            }
            Stmt::Pass(_) => Ok(()),
            other => Err(unsupported(spec, other)),
        }
    }

    // ========================================================================
    // Eager imports
    // ========================================================================

    fn exec_import(&mut self, spec: &ModuleSpec, import: &ImportStmt<'_>) -> Result<(), LatebindError> {
        for alias in import.names {
            let target = alias.name.to_qualified_name();
            self.load(&target)?;
            match alias.alias {
                Some(alias) => self.bind(&spec.name, alias.name, Binding::HostModule(target)),
                None => {
                    let top = target.top_level().to_string();
                    self.bind(&spec.name, &top, Binding::HostModule(QualifiedName::global(top.as_str())));
                }
            }
        }
        Ok(())
    }

    fn exec_import_from(&mut self, spec: &ModuleSpec, import: &ImportFromStmt<'_>) -> Result<(), LatebindError> {
        let module = import.module.as_ref().map(|m| m.to_qualified_name());
        let target = if import.level == 0 {
            module
        } else {
            relative_module(spec, import.level, module.as_ref())
        }
        .ok_or_else(|| HostError::ModuleNotFound(import.module_spelling()))?;
        self.load(&target)?;

        for alias in import.names {
            if alias.name.is_dotted() {
                return Err(HostError::UnsupportedStatement {
                    file: spec.origin.clone(),
                    line: alias.span.line,
                    what: "dotted name in eager from-import",
                }
                .into());
            }
            let name = alias.name.first();
            let binding = self.import_name(&target, name)?;
            let bound = alias.alias.map_or(name, |a| a.name);
            self.bind(&spec.name, bound, binding);
        }
        Ok(())
    }

    /// What `from target import name` binds.
    fn import_name(&mut self, target: &QualifiedName, name: &str) -> Result<Binding, LatebindError> {
        let loaded = self
            .modules
            .get(target)
            .ok_or_else(|| HostError::ModuleNotFound(target.to_string()))?;
        if let Some(binding) = loaded.namespace.get(name) {
            return Ok(binding.clone());
        }
        let initializing = loaded.state == ModuleState::Initializing;

        let child = target.child(name);
        if self.modules.contains_key(&child) || self.finder.find_spec(&child).is_some() {
            self.load(&child)?;
            return Ok(Binding::HostModule(child));
        }

        if initializing {
            Err(HostError::PartiallyInitialized {
                module: target.to_string(),
                name: name.to_string(),
            }
            .into())
        } else {
            Err(HostError::UnknownName {
                module: target.to_string(),
                name: name.to_string(),
            }
            .into())
        }
    }

    fn bind(&mut self, module: &QualifiedName, name: &str, binding: Binding) {
        if let Some(loaded) = self.modules.get_mut(module) {
            debug!(module = %module, name, kind = binding.kind_name(), "binding name");
            loaded.namespace.install(name, binding);
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Declare a class and register it as the implementation of its
    /// placeholder. Nested classes are registered before their enclosing
    /// class.
    fn declare_class(
        &mut self,
        spec: &ModuleSpec,
        class: &ClassStmt<'_>,
        outer: Option<&str>,
    ) -> Result<RegisteredType, LatebindError> {
        let qualname = match outer {
            Some(outer) => format!("{outer}.{}", class.name.name),
            None => class.name.name.to_string(),
        };

        let mut params = None;
        let mut constants = Vec::new();
        let mut statics = Vec::new();
        let mut fields = Vec::new();
        let mut post_init = Vec::new();
        for stmt in class.body {
            match stmt {
                Stmt::Init(init) => {
                    params = Some(init.params.iter().map(|p| p.name.to_string()).collect::<Vec<_>>());
                }
                Stmt::Static(member) => match ValueExpr::lower(member.value) {
                    ValueExpr::Literal(value) => constants.push((member.name.name.to_string(), value)),
                    expr => statics.push((member.name.name.to_string(), expr)),
                },
                Stmt::Field(member) => {
                    fields.push((member.name.name.to_string(), ValueExpr::lower(member.value)));
                }
                Stmt::PostInit(member) => {
                    post_init.push((member.name.name.to_string(), ValueExpr::lower(member.value)));
                }
                Stmt::Class(inner) => {
                    self.declare_class(spec, inner, Some(&qualname))?;
                }
                Stmt::Pass(_) => {}
                other => return Err(unsupported(spec, other)),
            }
        }

        let mut concrete = ConcreteType::new(spec.name.clone(), qualname.as_str())
            .with_origin(format!("{}:{}", spec.origin.display(), class.span.line));
        if let Some(params) = params {
            concrete = concrete.with_params(params);
        }
        if class.is_abstract {
            concrete = concrete.abstract_type();
        }
        for (name, value) in constants {
            concrete = concrete.with_static(name, value);
        }

        let registered = substitution::register(&mut self.registry, concrete)?;
        self.members.insert(
            registered.concrete().hash(),
            ClassMembers {
                module: spec.name.clone(),
                concrete: Rc::clone(registered.concrete()),
                fields,
                statics,
                post_init,
            },
        );
        debug!(class = %registered.name(), module = %spec.name, "declared class");
        Ok(registered)
    }
}
