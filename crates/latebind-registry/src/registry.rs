//! Registry - the qualified-name registry and substitution record table.
//!
//! [`Registry`] mirrors the real module tree on demand. Deferred imports ask
//! it for module nodes and type placeholders by dotted name; the
//! substitution engine records which concrete type implements each
//! placeholder.
//!
//! # Identity
//!
//! Asking twice for the same qualified name returns the same
//! [`PlaceholderId`] / [`ModuleId`], whether the first request came from a
//! deferred import, from a registration, or from a nested-type lookup.
//!
//! # Example
//!
//! ```
//! use latebind_registry::Registry;
//! use latebind_core::QualifiedName;
//!
//! let mut registry = Registry::new();
//! let module = QualifiedName::from_dotted("pkg.instance");
//!
//! let inner = registry.get_or_create_type(&module, "Instance.SubInstance").unwrap();
//! let again = registry.get_or_create_type(&module, "Instance.SubInstance").unwrap();
//! assert_eq!(inner, again);
//! assert_eq!(registry.placeholder_count(), 2);
//! ```

use std::rc::Rc;

use latebind_core::{ConcreteType, QualifiedName, RegistrationError, TypeHash, Value};
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::namespace_tree::{NamespaceTree, NodeKind, RegistryNode};

/// Handle to a module node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(NodeIndex);

/// Handle to a type placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(NodeIndex);

impl ModuleId {
    pub fn index(self) -> NodeIndex {
        self.0
    }
}

impl PlaceholderId {
    pub fn index(self) -> NodeIndex {
        self.0
    }
}

/// A registry node as seen by lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryItem {
    Module(ModuleId),
    Type(PlaceholderId),
}

impl RegistryItem {
    fn index(self) -> NodeIndex {
        match self {
            RegistryItem::Module(id) => id.0,
            RegistryItem::Type(id) => id.0,
        }
    }
}

/// The concrete type recorded for a placeholder.
#[derive(Debug, Clone)]
pub struct SubstitutionRecord {
    concrete: Rc<ConcreteType>,
    sequence: usize,
}

impl SubstitutionRecord {
    pub fn concrete(&self) -> &Rc<ConcreteType> {
        &self.concrete
    }

    /// Position in registration order, starting at 0.
    pub fn sequence(&self) -> usize {
        self.sequence
    }
}

/// The qualified-name registry.
pub struct Registry {
    tree: NamespaceTree,
    records: FxHashMap<PlaceholderId, SubstitutionRecord>,
    /// Placeholders in registration order.
    order: Vec<PlaceholderId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tree: NamespaceTree::new(),
            records: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    // ========================================================================
    // Node creation
    // ========================================================================

    /// Get or create the module node for `name` and every ancestor package.
    pub fn get_or_create_module(&mut self, name: &QualifiedName) -> Result<ModuleId, RegistrationError> {
        validate(name)?;
        let segments = name.to_segments();
        if let Some(RegistryItem::Module(existing)) = self.lookup(name) {
            return Ok(existing);
        }

        let root = self.tree.root();
        let node = self.tree.get_or_create_path(root, &segments, NodeKind::Module)?;
        debug!(module = %name, "created registry module");
        Ok(ModuleId(node))
    }

    /// Get or create the placeholder for `qualname` (dotted for nested types)
    /// inside `module`.
    ///
    /// Every enclosing type along `qualname` gets its own placeholder, so
    /// `Outer.Inner` creates `Outer` first and nests `Inner` inside it.
    pub fn get_or_create_type(
        &mut self,
        module: &QualifiedName,
        qualname: &str,
    ) -> Result<PlaceholderId, RegistrationError> {
        let path = QualifiedName::try_from_dotted(qualname)
            .ok_or_else(|| RegistrationError::InvalidName(qualname.to_string()))?;
        let module_id = self.get_or_create_module(module)?;

        let mut current = module_id.0;
        for segment in path.segments() {
            let existing = self.tree.find_child(current, segment);
            current = self
                .tree
                .get_or_create_child(current, segment, NodeKind::Placeholder)?;
            if existing.is_none() {
                debug!(
                    placeholder = %self.tree.qualified_name(current),
                    "created registry placeholder"
                );
            }
        }
        Ok(PlaceholderId(current))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Find an existing module node.
    pub fn module(&self, name: &QualifiedName) -> Option<ModuleId> {
        match self.lookup(name)? {
            RegistryItem::Module(id) => Some(id),
            RegistryItem::Type(_) => None,
        }
    }

    /// Find an existing placeholder.
    pub fn find_type(&self, module: &QualifiedName, qualname: &str) -> Option<PlaceholderId> {
        match self.lookup(&module.join(qualname))? {
            RegistryItem::Type(id) => Some(id),
            RegistryItem::Module(_) => None,
        }
    }

    /// Find whatever node lives at `name`.
    pub fn lookup(&self, name: &QualifiedName) -> Option<RegistryItem> {
        let node = self.tree.get_path(&name.to_segments())?;
        self.item(node)
    }

    /// Find a direct child of a module node or placeholder.
    pub fn child(&self, parent: RegistryItem, name: &str) -> Option<RegistryItem> {
        let node = self.tree.find_child(parent.index(), name)?;
        self.item(node)
    }

    /// Find a placeholder by the hash of its qualified name.
    pub fn placeholder_by_hash(&self, hash: TypeHash) -> Option<PlaceholderId> {
        match self.item(self.tree.get_by_hash(hash)?)? {
            RegistryItem::Type(id) => Some(id),
            RegistryItem::Module(_) => None,
        }
    }

    fn item(&self, node: NodeIndex) -> Option<RegistryItem> {
        match self.tree.node(node)?.kind()? {
            NodeKind::Module => Some(RegistryItem::Module(ModuleId(node))),
            NodeKind::Placeholder => Some(RegistryItem::Type(PlaceholderId(node))),
        }
    }

    /// Qualified name of a module node or placeholder.
    pub fn qualified_name(&self, item: RegistryItem) -> QualifiedName {
        self.tree.qualified_name(item.index())
    }

    pub fn placeholder_name(&self, id: PlaceholderId) -> QualifiedName {
        self.tree.qualified_name(id.0)
    }

    pub fn module_name(&self, id: ModuleId) -> QualifiedName {
        self.tree.qualified_name(id.0)
    }

    /// Identity hash of a placeholder.
    pub fn placeholder_hash(&self, id: PlaceholderId) -> TypeHash {
        self.tree.node(id.0).map_or(TypeHash::EMPTY, RegistryNode::hash)
    }

    /// Number of placeholders created so far.
    pub fn placeholder_count(&self) -> usize {
        self.tree.count(NodeKind::Placeholder)
    }

    /// Number of module nodes created so far.
    pub fn module_count(&self) -> usize {
        self.tree.count(NodeKind::Module)
    }

    // ========================================================================
    // Static members
    // ========================================================================

    /// Set (or replace) a static member on a placeholder.
    pub fn set_static(&mut self, id: PlaceholderId, name: &str, value: Value) {
        if let Some(RegistryNode::Placeholder { statics, .. }) = self.tree.node_mut(id.0) {
            match statics.iter_mut().find(|(k, _)| k == name) {
                Some((_, slot)) => *slot = value,
                None => statics.push((name.to_string(), value)),
            }
        }
    }

    /// Read a static member propagated to a placeholder.
    pub fn static_member(&self, id: PlaceholderId, name: &str) -> Option<&Value> {
        match self.tree.node(id.0)? {
            RegistryNode::Placeholder { statics, .. } => {
                statics.iter().find(|(k, _)| k == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    // ========================================================================
    // Substitution records
    // ========================================================================

    /// Record `concrete` as the implementation of `placeholder`.
    ///
    /// Fails with `AlreadyRegistered` if the placeholder already has one;
    /// the existing record is left untouched.
    pub fn record(
        &mut self,
        placeholder: PlaceholderId,
        concrete: Rc<ConcreteType>,
    ) -> Result<&SubstitutionRecord, RegistrationError> {
        if let Some(existing) = self.records.get(&placeholder) {
            return Err(RegistrationError::AlreadyRegistered {
                name: self.placeholder_name(placeholder).to_string(),
                existing: existing.concrete.to_string(),
                new: concrete.to_string(),
            });
        }

        let sequence = self.order.len();
        self.order.push(placeholder);
        let record = self
            .records
            .entry(placeholder)
            .or_insert(SubstitutionRecord { concrete, sequence });
        Ok(record)
    }

    /// The concrete type recorded for a placeholder, if any.
    pub fn implementation(&self, placeholder: PlaceholderId) -> Option<&Rc<ConcreteType>> {
        self.records.get(&placeholder).map(|r| &r.concrete)
    }

    pub fn is_registered(&self, placeholder: PlaceholderId) -> bool {
        self.records.contains_key(&placeholder)
    }

    /// All substitution records in registration order.
    pub fn records(&self) -> impl Iterator<Item = (QualifiedName, &SubstitutionRecord)> + '_ {
        self.order.iter().filter_map(|id| {
            let record = self.records.get(id)?;
            Some((self.placeholder_name(*id), record))
        })
    }
}

/// Reject names with empty segments.
fn validate(name: &QualifiedName) -> Result<(), RegistrationError> {
    if name.segments().any(str::is_empty) {
        return Err(RegistrationError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::from_dotted(s)
    }

    fn concrete(module: &str, qualname: &str) -> Rc<ConcreteType> {
        Rc::new(ConcreteType::new(qn(module), qualname))
    }

    #[test]
    fn modules_are_created_with_ancestors() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut registry = Registry::new();
        let id = registry.get_or_create_module(&qn("pkg.types.group")).unwrap();
        assert_eq!(registry.module_name(id).to_string(), "pkg.types.group");
        assert_eq!(registry.module_count(), 3);
        assert!(registry.module(&qn("pkg.types")).is_some());
        assert_eq!(registry.get_or_create_module(&qn("pkg.types.group")).unwrap(), id);
    }

    #[test]
    fn nested_placeholders_are_identity_stable() {
        let mut registry = Registry::new();
        let module = qn("pkg.instance");
        let inner = registry
            .get_or_create_type(&module, "Instance.SubInstance.SubSubInstance")
            .unwrap();
        let outer = registry.find_type(&module, "Instance").unwrap();

        assert_eq!(registry.placeholder_count(), 3);
        assert_eq!(
            registry.child(RegistryItem::Type(outer), "SubInstance"),
            registry.lookup(&qn("pkg.instance.Instance.SubInstance"))
        );
        assert_eq!(
            registry.get_or_create_type(&module, "Instance.SubInstance.SubSubInstance").unwrap(),
            inner
        );
        assert_eq!(
            registry.placeholder_by_hash(qn("pkg.instance.Instance.SubInstance.SubSubInstance").to_type_hash()),
            Some(inner)
        );
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.get_or_create_type(&qn("m"), "A..B").unwrap_err(),
            RegistrationError::InvalidName("A..B".into())
        );
        let bad = QualifiedName::new("x", vec![String::new()]);
        assert!(matches!(
            registry.get_or_create_module(&bad),
            Err(RegistrationError::InvalidName(_))
        ));
    }

    #[test]
    fn module_where_placeholder_exists_is_a_mismatch() {
        let mut registry = Registry::new();
        registry.get_or_create_type(&qn("m"), "T").unwrap();
        assert!(matches!(
            registry.get_or_create_module(&qn("m.T")),
            Err(RegistrationError::KindMismatch { .. })
        ));
        assert!(registry.module(&qn("m.T")).is_none());
    }

    #[test]
    fn record_and_lookup_implementation() {
        let mut registry = Registry::new();
        let id = registry.get_or_create_type(&qn("m"), "T").unwrap();
        assert!(!registry.is_registered(id));

        let record = registry.record(id, concrete("m", "T")).unwrap();
        assert_eq!(record.sequence(), 0);
        assert_eq!(
            registry.implementation(id).map(|c| c.name().to_string()),
            Some("m.T".to_string())
        );
    }

    #[test]
    fn second_record_is_rejected_and_first_kept() {
        let mut registry = Registry::new();
        let id = registry.get_or_create_type(&qn("m"), "T").unwrap();
        let first = Rc::new(ConcreteType::new(qn("m"), "T").with_origin("a.lb:1"));
        let second = Rc::new(ConcreteType::new(qn("m"), "T").with_origin("b.lb:4"));
        registry.record(id, first.clone()).unwrap();

        let err = registry.record(id, second).unwrap_err();
        let RegistrationError::AlreadyRegistered { name, existing, new } = err else {
            panic!("expected AlreadyRegistered");
        };
        assert_eq!(name, "m.T");
        assert!(existing.contains("a.lb:1"));
        assert!(new.contains("b.lb:4"));
        assert!(Rc::ptr_eq(registry.implementation(id).unwrap(), &first));
    }

    #[test]
    fn records_iterate_in_registration_order() {
        let mut registry = Registry::new();
        for name in ["B", "A", "C"] {
            let id = registry.get_or_create_type(&qn("m"), name).unwrap();
            registry.record(id, concrete("m", name)).unwrap();
        }
        let names: Vec<String> = registry.records().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["m.B", "m.A", "m.C"]);
    }

    #[test]
    fn statics_are_set_and_replaced() {
        let mut registry = Registry::new();
        let id = registry.get_or_create_type(&qn("pkg.group"), "Group").unwrap();
        assert!(registry.static_member(id, "test").is_none());

        registry.set_static(id, "test", Value::Str("test".into()));
        registry.set_static(id, "test", Value::Str("changed".into()));
        assert_eq!(
            registry.static_member(id, "test"),
            Some(&Value::Str("changed".into()))
        );
    }
}
