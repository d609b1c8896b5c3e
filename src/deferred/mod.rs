//! Deferred dependency blocks.
//!
//! A `deferred:` block looks like a run of ordinary imports but never runs.
//! Its body is suspended, its text is recovered from the source file, checked
//! to contain only imports, and each import is resolved to a registry module
//! node or type placeholder. The resulting [`DeferredBinding`]s are installed
//! into the owning module's namespace by the caller.
//!
//! Processing goes through four stages:
//! 1. [`suspend`] keeps the body from executing
//! 2. [`extract`] re-reads the block text from the file
//! 3. [`validate`] rejects anything but imports
//! 4. [`crate::resolve`] maps every import to a registry item

pub mod extract;
pub mod suspend;
pub mod validate;

use std::path::Path;

use latebind_core::{LatebindError, QualifiedName, Span};
use latebind_parser::Stmt;
use latebind_registry::{Registry, RegistryItem};
use tracing::debug;

use crate::RuntimeConfig;
use crate::finder::{ModuleFinder, ModuleSpec};
use crate::resolve::{ImportTarget, ResolvedImport, SpecResolver};

pub use extract::ExtractedBlock;
pub use suspend::{Interrupt, Suspension};
pub use validate::{ImportForm, ImportRequest};

/// A name to bind in the owning module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredBinding {
    /// Dotted binding path (`group`, or `pkg.group` for `import pkg.group`).
    pub name: String,
    pub item: RegistryItem,
    /// Qualified name the import resolved to.
    pub target: QualifiedName,
    /// Absolute line of the import.
    pub line: u32,
}

/// A deferred block being processed for its owning module.
#[derive(Debug)]
pub struct DeferredBlock {
    owner: ModuleSpec,
    suspension: Suspension,
}

impl DeferredBlock {
    /// Open the block whose `deferred:` marker is at `marker`.
    pub fn enter(owner: ModuleSpec, marker: Span) -> Self {
        Self {
            owner,
            suspension: Suspension::enter(marker),
        }
    }

    pub fn owner(&self) -> &ModuleSpec {
        &self.owner
    }

    pub fn file(&self) -> &Path {
        &self.owner.origin
    }

    pub fn marker_line(&self) -> u32 {
        self.suspension.marker().line
    }

    /// Offer a body statement for execution; it is always refused.
    pub fn intercept(&self, stmt: &Stmt<'_>) -> Result<(), Interrupt> {
        self.suspension.intercept(stmt)
    }

    /// Leave the block and turn its imports into bindings.
    pub fn exit(
        self,
        outcome: Result<(), Interrupt>,
        finder: &dyn ModuleFinder,
        registry: &mut Registry,
        config: &RuntimeConfig,
    ) -> Result<Vec<DeferredBinding>, LatebindError> {
        let DeferredBlock { owner, suspension } = self;
        let marker = suspension.exit(outcome)?;
        let source = extract::read_source(&owner.origin, config.default_encoding())?;
        let block = extract::extract_block(&source, &owner.origin, marker.line);
        resolve_block(&owner, &block, finder, registry, config)
    }

    /// Validate and resolve an already extracted block.
    pub fn bindings(
        &self,
        block: &ExtractedBlock,
        finder: &dyn ModuleFinder,
        registry: &mut Registry,
        config: &RuntimeConfig,
    ) -> Result<Vec<DeferredBinding>, LatebindError> {
        resolve_block(&self.owner, block, finder, registry, config)
    }
}

fn resolve_block(
    owner: &ModuleSpec,
    block: &ExtractedBlock,
    finder: &dyn ModuleFinder,
    registry: &mut Registry,
    config: &RuntimeConfig,
) -> Result<Vec<DeferredBinding>, LatebindError> {
    let imports = validate::validate_block(block)?;
    let resolver = SpecResolver::new(finder, owner, config.relative_fallback());

    let mut bindings = Vec::with_capacity(imports.len());
    for request in &imports {
        let resolved = resolver.resolve(request)?;
        let binding = bind(registry, resolved)?;
        debug!(
            target = %binding.target,
            binding = %binding.name,
            module = %owner.name,
            "deferred import"
        );
        bindings.push(binding);
    }
    Ok(bindings)
}

/// Create (or find) the registry item a resolved import refers to.
fn bind(registry: &mut Registry, resolved: ResolvedImport) -> Result<DeferredBinding, LatebindError> {
    let target = resolved.target.full_name();
    let item = match &resolved.target {
        ImportTarget::Module(name) => RegistryItem::Module(registry.get_or_create_module(name)?),
        ImportTarget::Type { module, qualname } => {
            let leaf = registry.get_or_create_type(module, qualname)?;
            match &resolved.bound_qualname {
                Some(outer) => RegistryItem::Type(registry.get_or_create_type(module, outer)?),
                None => RegistryItem::Type(leaf),
            }
        }
    };
    Ok(DeferredBinding {
        name: resolved.binding,
        item,
        target,
        line: resolved.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::SourceTree;
    use latebind_core::DeferredError;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        finder: SourceTree,
        config: RuntimeConfig,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (path, text) in files {
                let path = dir.path().join(path);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, text).unwrap();
            }
            let config = RuntimeConfig::new().with_search_path(dir.path());
            let finder = SourceTree::from_config(&config);
            Self {
                _dir: dir,
                finder,
                config,
            }
        }

        fn spec(&self, name: &str) -> ModuleSpec {
            self.finder.find_spec(&QualifiedName::from_dotted(name)).unwrap()
        }

        fn run(
            &self,
            owner: &str,
            marker_line: u32,
            registry: &mut Registry,
        ) -> Result<Vec<DeferredBinding>, LatebindError> {
            let block = DeferredBlock::enter(self.spec(owner), Span::point(marker_line, 1));
            let outcome = Err(Interrupt::Suspended {
                line: marker_line + 1,
            });
            block.exit(outcome, &self.finder, registry, &self.config)
        }
    }

    const MAIN: &str = "\
deferred:
    from .types.instance import Instance, Instance.SubInstance as Sub
    import app.types as types
    from . import types as t
";

    fn app() -> Fixture {
        Fixture::new(&[
            ("app/mod.lb", ""),
            ("app/main.lb", MAIN),
            ("app/types/mod.lb", ""),
            ("app/types/instance.lb", "class Instance:\n    pass\n"),
        ])
    }

    #[test]
    fn block_produces_bindings() {
        let fixture = app();
        let mut registry = Registry::new();
        let bindings = fixture.run("app.main", 1, &mut registry).unwrap();

        let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Instance", "Sub", "types", "t"]);

        let instance = registry
            .find_type(&QualifiedName::from_dotted("app.types.instance"), "Instance")
            .unwrap();
        let sub = registry
            .find_type(&QualifiedName::from_dotted("app.types.instance"), "Instance.SubInstance")
            .unwrap();
        assert_eq!(bindings[0].item, RegistryItem::Type(instance));
        assert_eq!(bindings[1].item, RegistryItem::Type(sub));
        assert_eq!(bindings[1].line, 2);
        assert!(matches!(bindings[2].item, RegistryItem::Module(_)));
        assert_eq!(bindings[2].item, bindings[3].item);
        assert_eq!(bindings[3].target.to_string(), "app.types");
    }

    #[test]
    fn bindings_resolve_an_extracted_block() {
        let fixture = app();
        let mut registry = Registry::new();
        let block = DeferredBlock::enter(fixture.spec("app.main"), Span::point(1, 1));
        let extracted = extract::extract_block(MAIN, block.file(), block.marker_line());
        let bindings = block
            .bindings(&extracted, &fixture.finder, &mut registry, &fixture.config)
            .unwrap();
        assert_eq!(bindings.len(), 4);
        assert_eq!(block.owner().name.to_string(), "app.main");
    }

    #[test]
    fn rerunning_a_block_yields_identical_items() {
        let fixture = app();
        let mut registry = Registry::new();
        let first = fixture.run("app.main", 1, &mut registry).unwrap();
        let second = fixture.run("app.main", 1, &mut registry).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_import_statement_is_fatal() {
        let fixture = Fixture::new(&[
            ("m.lb", "import x\ndeferred:\n    import x\n    y = 2\n"),
            ("x.lb", ""),
        ]);
        let mut registry = Registry::new();
        let err = fixture.run("m", 2, &mut registry).unwrap_err();
        match err {
            LatebindError::Deferred(DeferredError::NonImportStatement { file, lines }) => {
                assert!(file.ends_with("m.lb"));
                assert_eq!(lines, vec![4]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(registry.module_count(), 0);
    }

    #[test]
    fn failures_inside_the_block_propagate() {
        let fixture = app();
        let mut registry = Registry::new();
        let block = DeferredBlock::enter(fixture.spec("app.main"), Span::point(1, 1));
        let failure = LatebindError::from(DeferredError::SpecNotFound {
            name: "x".into(),
            within: "y".into(),
        });
        let err = block
            .exit(Err(Interrupt::Failed(failure.clone())), &fixture.finder, &mut registry, &fixture.config)
            .unwrap_err();
        assert_eq!(err, failure);
    }
}
