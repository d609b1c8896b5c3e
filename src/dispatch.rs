//! Instantiation dispatch.
//!
//! Constructing a placeholder is routed to the concrete type recorded for
//! it. The concrete allocation step runs without arguments; the arguments
//! are applied afterwards by the concrete initializer, followed by the
//! post-init hook.

use std::rc::Rc;

use latebind_core::{Argument, DispatchError, Instance};
use latebind_registry::{PlaceholderId, Registry};
use tracing::debug;

/// Entry name used in diagnostics when the caller has none.
pub const UNKNOWN_ENTRY: &str = "<entry module>";

/// Construct an instance of `placeholder` through its registered
/// implementation.
///
/// `entry` names the program entry module for the `NotRegistered` hint.
pub fn instantiate(
    registry: &Registry,
    placeholder: PlaceholderId,
    args: &[Argument],
    entry: Option<&str>,
) -> Result<Rc<Instance>, DispatchError> {
    let name = registry.placeholder_name(placeholder);
    let Some(concrete) = registry.implementation(placeholder) else {
        return Err(DispatchError::NotRegistered {
            name: name.to_string(),
            entry: entry.unwrap_or(UNKNOWN_ENTRY).to_string(),
        });
    };

    debug!(placeholder = %name, concrete = %concrete.name(), "creating object of registered type");
    let mut instance = concrete
        .allocate()
        .map_err(|source| DispatchError::SubstitutionFailed {
            placeholder: name.to_string(),
            concrete: concrete.to_string(),
            source,
        })?;
    instance.set_placeholder(registry.placeholder_hash(placeholder));

    concrete
        .initialize(&mut instance, args)
        .map_err(|source| DispatchError::Initializer {
            concrete: concrete.name().to_string(),
            source,
        })?;

    concrete
        .post_init(&mut instance)
        .map_err(|source| DispatchError::PostInit {
            concrete: concrete.name().to_string(),
            source,
        })?;

    Ok(Rc::new(instance))
}

/// Whether `instance` was produced by the implementation of `placeholder`.
///
/// True for objects dispatched through the placeholder and for objects
/// allocated directly by its concrete type.
pub fn is_instance(registry: &Registry, instance: &Instance, placeholder: PlaceholderId) -> bool {
    if instance.placeholder() == registry.placeholder_hash(placeholder) {
        return true;
    }
    registry
        .implementation(placeholder)
        .is_some_and(|concrete| concrete.hash() == instance.concrete())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register;
    use latebind_core::{ConcreteType, InstanceError, QualifiedName, Value};

    fn module() -> QualifiedName {
        QualifiedName::from_dotted("pkg.instance")
    }

    #[test]
    fn unregistered_placeholder_fails_then_succeeds_after_registration() {
        let mut registry = Registry::new();
        let placeholder = registry.get_or_create_type(&module(), "Instance").unwrap();

        let err = instantiate(&registry, placeholder, &[], Some("main")).unwrap_err();
        assert_eq!(
            err,
            DispatchError::NotRegistered {
                name: "pkg.instance.Instance".into(),
                entry: "main".into()
            }
        );

        register(&mut registry, ConcreteType::new(module(), "Instance")).unwrap();
        let obj = instantiate(&registry, placeholder, &[], None).unwrap();
        assert_eq!(obj.type_name().to_string(), "pkg.instance.Instance");
        assert!(is_instance(&registry, &obj, placeholder));
    }

    #[test]
    fn arguments_go_to_the_initializer() {
        let mut registry = Registry::new();
        let registered = register(
            &mut registry,
            ConcreteType::new(module(), "Instance").with_params(["param"]),
        )
        .unwrap();

        let obj = instantiate(
            &registry,
            registered.placeholder(),
            &[Argument::keyword("param", Value::Int(100))],
            None,
        )
        .unwrap();
        assert_eq!(obj.field("param"), Some(&Value::Int(100)));

        let err = instantiate(&registry, registered.placeholder(), &[], None).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Initializer {
                source: InstanceError::MissingArgument(_),
                ..
            }
        ));
    }

    #[test]
    fn post_init_runs_after_the_initializer() {
        let mut registry = Registry::new();
        let registered = register(
            &mut registry,
            ConcreteType::new(module(), "Instance")
                .with_params(["param"])
                .with_post_init(|instance| {
                    let seen = instance.field("param").cloned().unwrap_or(Value::None);
                    instance.set_field("seen", seen);
                    Ok(())
                }),
        )
        .unwrap();

        let obj = instantiate(
            &registry,
            registered.placeholder(),
            &[Argument::positional(Value::Int(7))],
            None,
        )
        .unwrap();
        assert_eq!(obj.field("seen"), Some(&Value::Int(7)));
    }

    #[test]
    fn post_init_failure_is_reported() {
        let mut registry = Registry::new();
        let registered = register(
            &mut registry,
            ConcreteType::new(module(), "Instance")
                .with_post_init(|_| Err(InstanceError::Custom("not ready".into()))),
        )
        .unwrap();

        let err = instantiate(&registry, registered.placeholder(), &[], None).unwrap_err();
        assert_eq!(
            err,
            DispatchError::PostInit {
                concrete: "pkg.instance.Instance".into(),
                source: InstanceError::Custom("not ready".into()),
            }
        );
    }

    #[test]
    fn allocation_failure_is_wrapped() {
        let mut registry = Registry::new();
        let registered = register(
            &mut registry,
            ConcreteType::new(module(), "Base").abstract_type(),
        )
        .unwrap();

        let err = instantiate(&registry, registered.placeholder(), &[], None).unwrap_err();
        match err {
            DispatchError::SubstitutionFailed {
                placeholder, source, ..
            } => {
                assert_eq!(placeholder, "pkg.instance.Base");
                assert_eq!(source, InstanceError::Abstract("pkg.instance.Base".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_instance_is_not_outer_instance() {
        let mut registry = Registry::new();
        let outer = register(&mut registry, ConcreteType::new(module(), "Instance")).unwrap();
        let inner = register(&mut registry, ConcreteType::new(module(), "Instance.SubInstance")).unwrap();

        let obj = instantiate(&registry, inner.placeholder(), &[], None).unwrap();
        assert!(is_instance(&registry, &obj, inner.placeholder()));
        assert!(!is_instance(&registry, &obj, outer.placeholder()));
        assert_eq!(obj.type_name().simple_name(), "SubInstance");
    }

    #[test]
    fn directly_allocated_objects_count_as_instances() {
        let mut registry = Registry::new();
        let registered = register(&mut registry, ConcreteType::new(module(), "Instance")).unwrap();
        let direct = registered.concrete().allocate().unwrap();
        assert!(is_instance(&registry, &direct, registered.placeholder()));
    }
}
