//! Member expression evaluation.
//!
//! `field` members and non-literal `static` members are stored as owned
//! [`ValueExpr`] trees and evaluated on every access in the namespace of the
//! module that declared them, so they see deferred bindings that were only
//! usable after loading finished. `post_init` members are evaluated once per
//! instance, right after construction.

use std::cell::Cell;
use std::rc::Rc;

use latebind_core::{Argument, HostError, Instance, LatebindError, QualifiedName, Value};
use latebind_parser::{Expr, LiteralKind};
use latebind_registry::{ModuleId, PlaceholderId, RegistryItem};

use super::Runtime;
use super::namespace::{Binding, Namespace};
use crate::dispatch;

/// Budget of nested evaluation steps before giving up.
///
/// Every expression and every member read counts as one step, so a member
/// that recurses through constructor arguments uses up several steps per
/// level.
pub const MAX_EVAL_DEPTH: usize = 64;

/// One level of evaluation nesting; released on drop.
struct Step<'r> {
    depth: &'r Cell<usize>,
}

impl Drop for Step<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// An owned member expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    Literal(Value),
    /// Dotted path; a leading `self` refers to the instance.
    Path(Vec<String>),
    Call {
        callee: Box<ValueExpr>,
        args: Vec<(Option<String>, ValueExpr)>,
    },
    List(Vec<ValueExpr>),
}

impl ValueExpr {
    /// Copy a parsed expression out of its arena.
    pub fn lower(expr: &Expr<'_>) -> Self {
        match expr {
            Expr::Literal(lit) => ValueExpr::Literal(match lit.kind {
                LiteralKind::Int(v) => Value::Int(v),
                LiteralKind::Float(v) => Value::float(v),
                LiteralKind::String(s) => Value::Str(s.to_string()),
                LiteralKind::Bool(b) => Value::Bool(b),
                LiteralKind::None => Value::None,
            }),
            Expr::Path(path) => ValueExpr::Path(path.path.segments().map(str::to_string).collect()),
            Expr::Call(call) => ValueExpr::Call {
                callee: Box::new(ValueExpr::lower(call.callee)),
                args: call
                    .args
                    .iter()
                    .map(|arg| (arg.name.map(|n| n.name.to_string()), ValueExpr::lower(arg.value)))
                    .collect(),
            },
            Expr::List(list) => ValueExpr::List(list.items.iter().map(ValueExpr::lower).collect()),
        }
    }
}

/// Where an expression is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'s> {
    pub module: &'s QualifiedName,
    pub this: Option<&'s Rc<Instance>>,
}

impl<'s> Scope<'s> {
    pub fn module(module: &'s QualifiedName) -> Self {
        Self { module, this: None }
    }

    pub fn instance(module: &'s QualifiedName, this: &'s Rc<Instance>) -> Self {
        Self {
            module,
            this: Some(this),
        }
    }
}

/// Result of walking a dotted path.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    Type(PlaceholderId),
    Module(ModuleId),
    HostModule(QualifiedName),
    Namespace(&'a Namespace),
    Value(Value),
}

impl<'a> From<&'a Binding> for Resolved<'a> {
    fn from(binding: &'a Binding) -> Self {
        match binding {
            Binding::Type(id) => Resolved::Type(*id),
            Binding::Module(id) => Resolved::Module(*id),
            Binding::HostModule(name) => Resolved::HostModule(name.clone()),
            Binding::Namespace(ns) => Resolved::Namespace(ns),
        }
    }
}

impl From<RegistryItem> for Resolved<'_> {
    fn from(item: RegistryItem) -> Self {
        match item {
            RegistryItem::Module(id) => Resolved::Module(id),
            RegistryItem::Type(id) => Resolved::Type(id),
        }
    }
}

impl Runtime {
    /// Walk `path` starting in the namespace of `module`.
    pub(crate) fn lookup_path<'a>(
        &'a self,
        scope: Scope<'_>,
        path: &[String],
    ) -> Result<Resolved<'a>, LatebindError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(HostError::UnknownName {
                module: scope.module.to_string(),
                name: String::new(),
            }
            .into());
        };

        let mut current = match (first.as_str(), scope.this) {
            ("self", Some(this)) => Resolved::Value(Value::Object(Rc::clone(this))),
            _ => {
                let namespace = self
                    .namespace(scope.module)
                    .ok_or_else(|| HostError::ModuleNotFound(scope.module.to_string()))?;
                let binding = namespace.get(first).ok_or_else(|| HostError::UnknownName {
                    module: scope.module.to_string(),
                    name: first.clone(),
                })?;
                Resolved::from(binding)
            }
        };

        for (i, segment) in rest.iter().enumerate() {
            current = self.attribute(current, segment, || path[..=i].join("."))?;
        }
        Ok(current)
    }

    /// Look `name` up on an intermediate path result.
    fn attribute<'a>(
        &'a self,
        owner: Resolved<'a>,
        name: &str,
        owner_name: impl FnOnce() -> String,
    ) -> Result<Resolved<'a>, LatebindError> {
        let found = match owner {
            Resolved::HostModule(module) => self
                .namespace(&module)
                .and_then(|ns| ns.get(name))
                .map(Resolved::from)
                .or_else(|| {
                    let child = module.child(name);
                    self.is_loaded(&child).then_some(Resolved::HostModule(child))
                }),
            Resolved::Module(id) => self
                .registry
                .child(RegistryItem::Module(id), name)
                .map(Resolved::from),
            Resolved::Type(id) => {
                if let Some(item) = self.registry.child(RegistryItem::Type(id), name) {
                    Some(Resolved::from(item))
                } else if let Some(value) = self.registry.static_member(id, name) {
                    Some(Resolved::Value(value.clone()))
                } else {
                    self.lazy_static(id, name)?.map(Resolved::Value)
                }
            }
            Resolved::Namespace(ns) => ns.get(name).map(Resolved::from),
            Resolved::Value(Value::Object(instance)) => {
                return self.get_attr(&instance, name).map(Resolved::Value);
            }
            Resolved::Value(_) => None,
        };

        found.ok_or_else(|| {
            HostError::UnknownAttribute {
                owner: owner_name(),
                name: name.to_string(),
            }
            .into()
        })
    }

    fn step(&self) -> Step<'_> {
        self.depth.set(self.depth.get() + 1);
        Step { depth: &self.depth }
    }

    /// Enter the evaluation of member `name` of `owner`.
    fn enter_member(&self, owner: &QualifiedName, name: &str) -> Result<Step<'_>, LatebindError> {
        if self.depth.get() >= MAX_EVAL_DEPTH {
            return Err(HostError::RecursionLimit(format!("{owner}.{name}")).into());
        }
        Ok(self.step())
    }

    /// Evaluate a non-literal `static` member of the type behind `placeholder`.
    fn lazy_static(&self, placeholder: PlaceholderId, name: &str) -> Result<Option<Value>, LatebindError> {
        let Some(concrete) = self.registry.implementation(placeholder) else {
            return Ok(None);
        };
        let Some(members) = self.members.get(&concrete.hash()) else {
            return Ok(None);
        };
        let Some((_, expr)) = members.statics.iter().find(|(member, _)| member == name) else {
            return Ok(None);
        };
        let _step = self.enter_member(concrete.name(), name)?;
        self.eval(expr, Scope::module(&members.module)).map(Some)
    }

    /// Construct `placeholder` and run the `post_init` members of the
    /// concrete type on the new instance.
    pub(crate) fn create(&self, placeholder: PlaceholderId, args: &[Argument]) -> Result<Rc<Instance>, LatebindError> {
        let entry = self.entry.as_ref().map(ToString::to_string);
        let mut instance = dispatch::instantiate(&self.registry, placeholder, args, entry.as_deref())?;

        let Some(members) = self.members.get(&instance.concrete()) else {
            return Ok(instance);
        };
        for (name, expr) in &members.post_init {
            let value = {
                let _step = self.enter_member(instance.type_name(), name)?;
                self.eval(expr, Scope::instance(&members.module, &instance))?
            };
            let Some(target) = Rc::get_mut(&mut instance) else {
                return Err(HostError::PostInitSelfReference(format!("{}.{name}", members.concrete.name())).into());
            };
            target.set_field(name.as_str(), value);
        }
        Ok(instance)
    }

    /// Evaluate an expression to a value.
    pub(crate) fn eval(&self, expr: &ValueExpr, scope: Scope<'_>) -> Result<Value, LatebindError> {
        let _step = self.step();
        match expr {
            ValueExpr::Literal(value) => Ok(value.clone()),
            ValueExpr::Path(path) => match self.lookup_path(scope, path)? {
                Resolved::Value(value) => Ok(value),
                _ => Err(HostError::NotAValue(path.join(".")).into()),
            },
            ValueExpr::Call { callee, args } => {
                let ValueExpr::Path(path) = callee.as_ref() else {
                    return Err(HostError::NotAType(format!("{callee:?}")).into());
                };
                let Resolved::Type(placeholder) = self.lookup_path(scope, path)? else {
                    return Err(HostError::NotAType(path.join(".")).into());
                };
                let args = args
                    .iter()
                    .map(|(name, value)| {
                        let value = self.eval(value, scope)?;
                        Ok(Argument {
                            name: name.clone(),
                            value,
                        })
                    })
                    .collect::<Result<Vec<_>, LatebindError>>()?;
                self.create(placeholder, &args).map(Value::Object)
            }
            ValueExpr::List(items) => items
                .iter()
                .map(|item| self.eval(item, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }

    /// Read an attribute of an instance.
    ///
    /// Looks at instance fields first, then `field` members (evaluated now,
    /// in the declaring module), then static members.
    pub fn get_attr(&self, instance: &Rc<Instance>, name: &str) -> Result<Value, LatebindError> {
        if let Some(value) = instance.field(name) {
            return Ok(value.clone());
        }

        let unknown = || -> LatebindError {
            HostError::UnknownAttribute {
                owner: instance.type_name().to_string(),
                name: name.to_string(),
            }
            .into()
        };
        let Some(members) = self.members.get(&instance.concrete()) else {
            return Err(unknown());
        };

        if let Some((_, expr)) = members.fields.iter().find(|(field, _)| field == name) {
            let _step = self.enter_member(instance.type_name(), name)?;
            return self.eval(expr, Scope::instance(&members.module, instance));
        }

        if let Some(value) = members.concrete.static_member(name) {
            return Ok(value.clone());
        }
        if let Some((_, expr)) = members.statics.iter().find(|(member, _)| member == name) {
            let _step = self.enter_member(instance.type_name(), name)?;
            return self.eval(expr, Scope::module(&members.module));
        }
        Err(unknown())
    }
}
