//! Concrete implementations registered behind type placeholders.
//!
//! A [`ConcreteType`] is what a module supplies when it finishes declaring a
//! type: how to allocate an instance (always without arguments), how to
//! apply constructor arguments afterwards, an optional post-init hook, and
//! the static members that must stay reachable through the placeholder.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{Argument, Instance, InstanceError, QualifiedName, TypeHash, Value};

/// Zero-argument allocation step.
pub type Allocator = Box<dyn Fn(&QualifiedName, TypeHash) -> Result<Instance, InstanceError>>;

/// Per-instance initializer receiving the constructor arguments.
pub type Initializer = Box<dyn Fn(&mut Instance, &[Argument]) -> Result<(), InstanceError>>;

/// Hook run once the initializer has finished.
pub type PostInit = Box<dyn Fn(&mut Instance) -> Result<(), InstanceError>>;

/// The "real" type that implements a placeholder.
pub struct ConcreteType {
    module: QualifiedName,
    qualname: String,
    name: QualifiedName,
    origin: String,
    hash: TypeHash,
    allocate: Allocator,
    initialize: Option<Initializer>,
    post_init: Option<PostInit>,
    statics: Vec<(String, Value)>,
}

impl ConcreteType {
    /// Declare a concrete type `qualname` (possibly dotted for nested types)
    /// inside `module`.
    ///
    /// The default allocator produces an empty [`Instance`]; without an
    /// initializer any constructor argument is rejected.
    pub fn new(module: QualifiedName, qualname: impl Into<String>) -> Self {
        let qualname = qualname.into();
        let name = module.join(&qualname);
        let origin = name.to_string();
        let hash = TypeHash::from_concrete(&name.to_string(), &origin);
        Self {
            module,
            qualname,
            name,
            origin,
            hash,
            allocate: Box::new(|name, hash| Ok(Instance::new(name.clone(), hash))),
            initialize: None,
            post_init: None,
            statics: Vec::new(),
        }
    }

    /// Set where this type was declared (file and line, or a Rust path).
    ///
    /// The origin distinguishes competing declarations of the same name.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.hash = TypeHash::from_concrete(&self.name.to_string(), &self.origin);
        self
    }

    /// Replace the allocation step.
    pub fn with_allocator<F>(mut self, allocate: F) -> Self
    where
        F: Fn(&QualifiedName, TypeHash) -> Result<Instance, InstanceError> + 'static,
    {
        self.allocate = Box::new(allocate);
        self
    }

    /// Mark the type abstract: allocation always fails.
    pub fn abstract_type(self) -> Self {
        self.with_allocator(|name, _| Err(InstanceError::Abstract(name.to_string())))
    }

    /// Set a custom initializer.
    pub fn with_initializer<F>(mut self, initialize: F) -> Self
    where
        F: Fn(&mut Instance, &[Argument]) -> Result<(), InstanceError> + 'static,
    {
        self.initialize = Some(Box::new(initialize));
        self
    }

    /// Initializer that stores arguments as fields named after `params`.
    pub fn with_params<I, S>(self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = params.into_iter().map(Into::into).collect();
        self.with_initializer(move |instance, args| {
            for (name, value) in bind_arguments(&params, args)? {
                instance.set_field(name, value);
            }
            Ok(())
        })
    }

    /// Set a hook to run after every successful initialization.
    pub fn with_post_init<F>(mut self, post_init: F) -> Self
    where
        F: Fn(&mut Instance) -> Result<(), InstanceError> + 'static,
    {
        self.post_init = Some(Box::new(post_init));
        self
    }

    /// Add a static member.
    pub fn with_static(mut self, name: impl Into<String>, value: Value) -> Self {
        self.statics.push((name.into(), value));
        self
    }

    /// Module the type was declared in.
    pub fn module(&self) -> &QualifiedName {
        &self.module
    }

    /// Name inside the module, dotted for nested types (`Outer.Inner`).
    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    /// Fully qualified name (module + qualname).
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    pub fn statics(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.statics.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn static_member(&self, name: &str) -> Option<&Value> {
        self.statics.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Run the zero-argument allocation step.
    pub fn allocate(&self) -> Result<Instance, InstanceError> {
        (self.allocate)(&self.name, self.hash)
    }

    /// Apply constructor arguments to a freshly allocated instance.
    pub fn initialize(&self, instance: &mut Instance, args: &[Argument]) -> Result<(), InstanceError> {
        match &self.initialize {
            Some(init) => init(instance, args),
            None if args.is_empty() => Ok(()),
            None => Err(InstanceError::TooManyArguments {
                expected: 0,
                got: args.len(),
            }),
        }
    }

    /// Run the post-init hook, if any.
    pub fn post_init(&self, instance: &mut Instance) -> Result<(), InstanceError> {
        match &self.post_init {
            Some(hook) => hook(instance),
            None => Ok(()),
        }
    }

    pub fn has_post_init(&self) -> bool {
        self.post_init.is_some()
    }
}

impl fmt::Debug for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteType")
            .field("name", &self.name.to_string())
            .field("origin", &self.origin)
            .field("statics", &self.statics.len())
            .field("post_init", &self.post_init.is_some())
            .finish()
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (declared at {})", self.name, self.origin)
    }
}

/// Match constructor arguments to parameter names.
///
/// Positional arguments fill parameters in order, keyword arguments by name.
/// Every parameter must receive exactly one value.
pub fn bind_arguments(
    params: &[String],
    args: &[Argument],
) -> Result<FxHashMap<String, Value>, InstanceError> {
    let mut bound: FxHashMap<String, Value> = FxHashMap::default();
    let mut next_positional = 0;

    for arg in args {
        match &arg.name {
            None => {
                let Some(param) = params.get(next_positional) else {
                    return Err(InstanceError::TooManyArguments {
                        expected: params.len(),
                        got: args.len(),
                    });
                };
                next_positional += 1;
                if bound.insert(param.clone(), arg.value.clone()).is_some() {
                    return Err(InstanceError::DuplicateArgument(param.clone()));
                }
            }
            Some(name) => {
                if !params.contains(name) {
                    return Err(InstanceError::UnexpectedKeyword(name.clone()));
                }
                if bound.insert(name.clone(), arg.value.clone()).is_some() {
                    return Err(InstanceError::DuplicateArgument(name.clone()));
                }
            }
        }
    }

    if let Some(missing) = params.iter().find(|p| !bound.contains_key(*p)) {
        return Err(InstanceError::MissingArgument(missing.clone()));
    }
    Ok(bound)
}
