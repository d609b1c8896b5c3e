//! Class substitution: connecting concrete types to their placeholders.
//!
//! Registering a [`ConcreteType`] finds (or creates) the placeholder for its
//! qualified name and records the concrete type as that placeholder's
//! implementation. Static members are copied onto the placeholder so code
//! holding only the placeholder still reaches them.
//!
//! ```
//! use latebind::{register, ConcreteType, QualifiedName, Registry, Value};
//!
//! let mut registry = Registry::new();
//! let module = QualifiedName::from_dotted("pkg.group");
//! let group = ConcreteType::new(module.clone(), "Group").with_static("test", Value::Int(1));
//!
//! let registered = register(&mut registry, group).unwrap();
//! assert_eq!(registered.name().to_string(), "pkg.group.Group");
//! assert_eq!(
//!     registry.static_member(registered.placeholder(), "test"),
//!     Some(&Value::Int(1))
//! );
//! ```

use std::rc::Rc;

use latebind_core::{ConcreteType, QualifiedName, RegistrationError};
use latebind_registry::{PlaceholderId, Registry};
use tracing::debug;

/// Handle returned by [`register`]; stands in for the concrete type at
/// call sites.
#[derive(Debug, Clone)]
pub struct RegisteredType {
    placeholder: PlaceholderId,
    concrete: Rc<ConcreteType>,
}

impl RegisteredType {
    pub fn placeholder(&self) -> PlaceholderId {
        self.placeholder
    }

    pub fn concrete(&self) -> &Rc<ConcreteType> {
        &self.concrete
    }

    pub fn name(&self) -> &QualifiedName {
        self.concrete.name()
    }
}

/// Record `concrete` as the implementation of the placeholder sharing its
/// qualified name.
///
/// A nested type (`Outer.Inner`) gets its own placeholder nested under the
/// enclosing one; each nesting level is registered separately. Fails with
/// `AlreadyRegistered` when the placeholder already has an implementation.
pub fn register(registry: &mut Registry, concrete: ConcreteType) -> Result<RegisteredType, RegistrationError> {
    let placeholder = registry.get_or_create_type(concrete.module(), concrete.qualname())?;
    let concrete = Rc::new(concrete);
    registry.record(placeholder, Rc::clone(&concrete))?;
    debug!(
        placeholder = %registry.placeholder_name(placeholder),
        concrete = %concrete,
        "registered concrete type"
    );

    for (name, value) in concrete.statics() {
        debug!(member = name, placeholder = %concrete.name(), "propagating static member");
        registry.set_static(placeholder, name, value.clone());
    }

    Ok(RegisteredType {
        placeholder,
        concrete,
    })
}
