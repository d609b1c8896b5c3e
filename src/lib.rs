//! Latebind: deferred imports and class substitution for mutually
//! dependent modules.
//!
//! Modules written in the latebind source language (`.lb` files) can name
//! each other's types in a `deferred:` block without importing them first.
//! The block never runs. Instead each of its imports becomes a
//! *placeholder* in a shared [`Registry`]. When the module that really
//! declares the type is loaded, its class is recorded as the placeholder's
//! implementation, and constructing the placeholder from then on builds
//! the real class.
//!
//! The crate is split into:
//! - [`finder`] locating module source files
//! - [`deferred`] suspending, extracting and validating deferred blocks
//! - [`resolve`] mapping deferred imports to modules and type placeholders
//! - [`substitution`] registering concrete types against placeholders
//! - [`dispatch`] routing construction through the registry
//! - [`runtime`] the host that loads modules and evaluates members
//!
//! # Example
//!
//! ```
//! use latebind::{ConcreteType, QualifiedName, Registry, Value, register};
//!
//! let mut registry = Registry::new();
//! let module = QualifiedName::from_dotted("pkg.types.instance");
//!
//! // a deferred import creates the placeholder before the type exists
//! let placeholder = registry.get_or_create_type(&module, "Instance")?;
//! assert!(!registry.is_registered(placeholder));
//!
//! let registered = register(
//!     &mut registry,
//!     ConcreteType::new(module, "Instance").with_static("kind", Value::Str("instance".into())),
//! )?;
//! assert_eq!(registered.placeholder(), placeholder);
//! assert_eq!(registry.static_member(placeholder, "kind"), Some(&Value::Str("instance".into())));
//! # Ok::<(), latebind::LatebindError>(())
//! ```

pub mod config;
pub mod deferred;
pub mod dispatch;
pub mod finder;
pub mod resolve;
pub mod runtime;
pub mod substitution;

pub use config::{RelativeFallback, RuntimeConfig};
pub use deferred::{DeferredBinding, DeferredBlock};
pub use dispatch::{instantiate, is_instance};
pub use finder::{ModuleFinder, ModuleSpec, SourceTree};
pub use runtime::{Binding, LoadedModule, ModuleState, Namespace, Resolved, Runtime};
pub use substitution::{RegisteredType, register};

pub use latebind_core::{
    Argument, ConcreteType, DeferredError, DispatchError, HostError, Instance, InstanceError,
    LatebindError, ParseErrors, QualifiedName, RegistrationError, Span, TypeHash, Value,
};
pub use latebind_registry::{ModuleId, PlaceholderId, Registry, RegistryItem};
