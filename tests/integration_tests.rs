//! Integration tests loading the packages under `test_scripts/packages`.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use latebind::{
    Argument, Binding, DeferredError, DispatchError, HostError, Instance, LatebindError, QualifiedName,
    RegistrationError, RelativeFallback, Resolved, Runtime, RuntimeConfig, Value,
};

fn packages() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_scripts").join("packages")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn runtime() -> Runtime {
    init_tracing();
    RuntimeConfig::new().with_search_path(packages()).build()
}

fn object(value: Value) -> Rc<Instance> {
    match value {
        Value::Object(instance) => instance,
        other => panic!("expected an object, got {other}"),
    }
}

fn objects(value: Value) -> Vec<Rc<Instance>> {
    match value {
        Value::List(items) => items.into_iter().map(object).collect(),
        other => panic!("expected a list, got {other}"),
    }
}

// =============================================================================
// Bidirectional imports
// =============================================================================

#[test]
fn test_cc_one_bidirectional_imports() {
    let mut rt = runtime();
    rt.import("cc_one").unwrap();

    let main = rt.instantiate("cc_one", "Main", &[]).unwrap();
    let cases = [
        ("s", "S"),
        ("ms", "MS"),
        ("cc_am", "CC_AM"),
        ("nm", "NM"),
        ("an", "AN"),
        ("sma", "SMA"),
        ("asma", "ASMA"),
        ("cc_mm", "CC_MM"),
    ];
    for (field, exported) in cases {
        let value = object(rt.get_attr(&main, field).unwrap());
        assert!(rt.is_instance(&value, "cc_one", exported).unwrap(), "main.{field} is not {exported}");

        let back = object(rt.get_attr(&value, "main").unwrap());
        assert!(rt.is_instance(&back, "cc_one", "Main").unwrap(), "main.{field}.main is not Main");
    }
}

#[test]
fn test_cc_one_deferred_bindings() {
    let mut rt = runtime();
    rt.import("cc_one").unwrap();

    let main = QualifiedName::from_dotted("cc_one.main");
    let ns = rt.namespace(&main).unwrap();
    assert_eq!(
        ns.names(),
        vec!["AClass", "Class", "MClass", "Main", "amodule", "cc_one", "module", "smodule", "submodule"]
    );
    assert!(matches!(ns.lookup("cc_one.amodule"), Some(Binding::Module(_))));
    assert!(matches!(ns.lookup("module.submodule"), Some(Binding::Module(_))));

    // the aliased module is a different module from the plain one
    let smodule = rt.resolve("cc_one.main", "smodule").unwrap();
    let amodule = rt.resolve("cc_one.main", "amodule").unwrap();
    match (smodule, amodule) {
        (Resolved::Module(s), Resolved::Module(a)) => {
            assert_ne!(s, a);
            assert_eq!(rt.registry().module_name(s).to_string(), "cc_one.snmodule.smodule");
            assert_eq!(rt.registry().module_name(a).to_string(), "cc_one.asnmodule.smodule");
        }
        other => panic!("unexpected bindings: {other:?}"),
    }
}

#[test]
fn test_importing_a_submodule_first() {
    let mut rt = runtime();
    rt.import("cc_one.anmodule").unwrap();

    assert_eq!(rt.entry().map(ToString::to_string), Some("cc_one.anmodule".to_string()));
    let aclass = rt.instantiate("cc_one.anmodule", "AClass", &[]).unwrap();
    let main = object(rt.get_attr(&aclass, "main").unwrap());
    assert_eq!(main.type_name().to_string(), "cc_one.main.Main");
}

// =============================================================================
// Nested types, statics and packages
// =============================================================================

#[test]
fn test_instance_and_group() {
    let mut rt = runtime();
    rt.import("cc_one.types").unwrap();

    let instance = rt
        .instantiate("cc_one.types.instance", "Instance", &[Argument::keyword("param", Value::Int(7))])
        .unwrap();
    assert_eq!(rt.get_attr(&instance, "param").unwrap(), Value::Int(7));
    // post_init members are stored on the instance itself
    assert_eq!(instance.field("origin"), Some(&Value::Int(7)));
    assert_eq!(rt.get_attr(&instance, "kind").unwrap(), Value::Str("instance".into()));
    assert_eq!(
        rt.get_attr(&instance, "group_test").unwrap(),
        Value::Str("THIS IS STATIC METHOD TEST".into())
    );

    let group = object(rt.get_attr(&instance, "group").unwrap());
    assert_eq!(group.type_name().to_string(), "cc_one.types.group.Group");
    let params: Vec<Value> = objects(rt.get_attr(&group, "instances").unwrap())
        .iter()
        .map(|i| rt.get_attr(i, "param").unwrap())
        .collect();
    assert_eq!(params, vec![Value::Int(3), Value::Int(4)]);

    for sub in objects(rt.get_attr(&group, "subs2").unwrap()) {
        assert_eq!(sub.type_name().to_string(), "cc_one.types.group.subgroup.SubGroup");
        assert_eq!(objects(rt.get_attr(&sub, "instances").unwrap()).len(), 2);
    }
}

#[test]
fn test_nested_types() {
    let mut rt = runtime();
    rt.import("cc_one.types").unwrap();

    let instance = rt
        .instantiate("cc_one.types.instance", "Instance", &[Argument::positional(Value::Int(1))])
        .unwrap();
    let subs = objects(rt.get_attr(&instance, "subinstances").unwrap());
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].type_name().simple_name(), "SubSubInstance");
    assert!(rt
        .is_instance(&subs[0], "cc_one.types.instance", "Instance.SubInstance.SubSubInstance")
        .unwrap());
    assert!(!rt.is_instance(&subs[0], "cc_one.types.instance", "Instance").unwrap());

    let back = object(rt.get_attr(&subs[0], "instance").unwrap());
    assert_eq!(rt.get_attr(&back, "param").unwrap(), Value::Int(100));

    // a static constructing its own class is evaluated on access
    let groups = match rt
        .resolve("cc_one.types.instance", "Instance.SubInstance.SubSubInstance.groups")
        .unwrap()
    {
        Resolved::Value(value) => object(value),
        other => panic!("expected a value, got {other:?}"),
    };
    assert!(rt
        .is_instance(&groups, "cc_one.types.instance", "Instance.SubInstance.SubSubInstance")
        .unwrap());
    assert!(matches!(rt.get_attr(&subs[0], "groups").unwrap(), Value::Object(_)));

    // inner classes register before the class enclosing them
    let order: Vec<String> = rt
        .registry()
        .records()
        .map(|(name, _)| name.to_string())
        .filter(|name| name.starts_with("cc_one.types.instance"))
        .collect();
    assert_eq!(
        order,
        vec![
            "cc_one.types.instance.Instance.SubInstance.SubSubInstance",
            "cc_one.types.instance.Instance.SubInstance",
            "cc_one.types.instance.Instance",
        ]
    );
}

#[test]
fn test_mutual_cycle_in_either_order() {
    for first in ["cycle.left", "cycle.right"] {
        let mut rt = runtime();
        rt.import(first).unwrap();
        rt.import("cycle.left").unwrap();
        rt.import("cycle.right").unwrap();

        let left = rt.instantiate("cycle.left", "Left", &[Argument::positional(Value::Int(5))]).unwrap();
        let right = object(rt.get_attr(&left, "partner").unwrap());
        assert!(rt.is_instance(&right, "cycle.left", "Right").unwrap());
        assert_eq!(rt.get_attr(&right, "value").unwrap(), Value::Int(5));

        let again = object(rt.get_attr(&right, "partner").unwrap());
        assert!(rt.is_instance(&again, "cycle.right", "Left").unwrap());
    }
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_non_import_statements_are_reported_by_line() {
    let mut rt = runtime();
    let err = rt.import("broken.statements").unwrap_err();
    match err {
        LatebindError::Deferred(DeferredError::NonImportStatement { file, lines }) => {
            assert!(file.ends_with(Path::new("broken").join("statements.lb")));
            assert_eq!(lines, vec![3, 4, 5]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!rt.is_loaded(&QualifiedName::from_dotted("broken.statements")));
    assert!(rt.is_loaded(&QualifiedName::from_dotted("broken")));
}

#[test]
fn test_missing_relative_module() {
    let mut rt = runtime();
    let err = rt.import("broken.missing").unwrap_err();
    assert_eq!(
        err,
        LatebindError::Deferred(DeferredError::SpecNotFound {
            name: ".nowhere".into(),
            within: "broken.missing".into(),
        })
    );
    assert_eq!(
        err.to_string(),
        "could not find module spec for [.nowhere] within [broken.missing]"
    );
}

#[test]
fn test_dotted_name_through_submodule() {
    let mut rt = runtime();
    let err = rt.import("broken.nested").unwrap_err();
    assert_eq!(
        err,
        LatebindError::Deferred(DeferredError::UnexpectedNestedName {
            name: "group.Group".into(),
            module: "cc_one.types".into(),
            submodule: "cc_one.types.group".into(),
        })
    );
}

#[test]
fn test_unregistered_placeholder() {
    let mut rt = runtime();
    rt.import("broken.unregistered").unwrap();

    let haunted = rt.instantiate("broken.unregistered", "Haunted", &[]).unwrap();
    let err = rt.get_attr(&haunted, "ghost").unwrap_err();
    assert_eq!(
        err,
        LatebindError::Dispatch(DispatchError::NotRegistered {
            name: "broken.ghost.Ghost".into(),
            entry: "broken.unregistered".into(),
        })
    );
}

#[test]
fn test_duplicate_registration() {
    let mut rt = runtime();
    let err = rt.import("broken.duplicate").unwrap_err();
    match err {
        LatebindError::Registration(RegistrationError::AlreadyRegistered { name, existing, new }) => {
            assert_eq!(name, "broken.duplicate.Twice");
            assert!(existing.contains("duplicate.lb:1"), "{existing}");
            assert!(new.contains("duplicate.lb:4"), "{new}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_explicit_relative_imports() {
    let mut rt = runtime();
    rt.import("broken.explicit").unwrap();
    assert!(matches!(
        rt.resolve("broken.explicit", "Ghost").unwrap(),
        Resolved::Type(_)
    ));

    init_tracing();
    let mut strict = RuntimeConfig::new()
        .with_search_path(packages())
        .with_relative_fallback(RelativeFallback::Explicit)
        .build();
    let err = strict.import("broken.explicit").unwrap_err();
    assert_eq!(
        err,
        LatebindError::Deferred(DeferredError::SpecNotFound {
            name: "ghost".into(),
            within: "broken.explicit".into(),
        })
    );
}

#[test]
fn test_unknown_module() {
    let mut rt = runtime();
    let err = rt.import("cc_one.nope").unwrap_err();
    assert_eq!(err, LatebindError::Host(HostError::ModuleNotFound("cc_one.nope".into())));
}

// =============================================================================
// Source files
// =============================================================================

fn write_tree(files: &[(&str, &[u8])]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, bytes) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }
    dir
}

#[test]
fn test_encoding_marker() {
    let mut source = b"# -*- coding: latin-1 -*-\ndeferred:\n    from .other import Other\n\nclass Cafe:\n    static name = 'caf".to_vec();
    source.push(0xE9);
    source.extend_from_slice(b"'\n");
    let dir = write_tree(&[
        ("pkg/mod.lb", b"pass\n"),
        ("pkg/cafe.lb", &source),
        ("pkg/other.lb", b"class Other:\n    pass\n"),
    ]);

    init_tracing();
    let mut rt = RuntimeConfig::new().with_search_path(dir.path()).build();
    rt.import("pkg.cafe").unwrap();
    assert!(matches!(
        rt.resolve("pkg.cafe", "Cafe.name").unwrap(),
        Resolved::Value(Value::Str(name)) if name == "café"
    ));
}

#[test]
fn test_unsupported_encoding() {
    let dir = write_tree(&[("odd.lb", b"# coding: klingon\npass\n")]);
    let mut rt = RuntimeConfig::new().with_search_path(dir.path()).build();
    let err = rt.import("odd").unwrap_err();
    assert!(matches!(
        err,
        LatebindError::Deferred(DeferredError::UnsupportedEncoding { ref encoding, .. }) if encoding == "klingon"
    ));
}

#[test]
fn test_self_referencing_field_hits_recursion_limit() {
    let dir = write_tree(&[("loop.lb", b"class Loop:\n    field me = self.me\n")]);
    let mut rt = RuntimeConfig::new().with_search_path(dir.path()).build();
    rt.import("loop").unwrap();

    let instance = rt.instantiate("loop", "Loop", &[]).unwrap();
    let err = rt.get_attr(&instance, "me").unwrap_err();
    assert_eq!(err, LatebindError::Host(HostError::RecursionLimit("loop.Loop.me".into())));
}

#[test]
fn test_field_recursing_through_constructor_arguments_hits_recursion_limit() {
    let dir = write_tree(&[("loop.lb", b"class A:\n    init v\n    field x = A(v=self.x)\n")]);
    let mut rt = RuntimeConfig::new().with_search_path(dir.path()).build();
    rt.import("loop").unwrap();

    let instance = rt.instantiate("loop", "A", &[Argument::positional(Value::Int(1))]).unwrap();
    let err = rt.get_attr(&instance, "x").unwrap_err();
    assert_eq!(err, LatebindError::Host(HostError::RecursionLimit("loop.A.x".into())));

    // the depth budget is released after the failure
    assert_eq!(rt.get_attr(&instance, "v").unwrap(), Value::Int(1));
    let err = rt.get_attr(&instance, "x").unwrap_err();
    assert_eq!(err, LatebindError::Host(HostError::RecursionLimit("loop.A.x".into())));
}
