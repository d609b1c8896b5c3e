//! Module namespaces.

use latebind_core::QualifiedName;
use latebind_registry::{ModuleId, PlaceholderId, RegistryItem};
use rustc_hash::FxHashMap;

/// What a name in a module namespace is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A type placeholder.
    Type(PlaceholderId),
    /// A registry module node (from a deferred import).
    Module(ModuleId),
    /// A loaded host module (from an eager import).
    HostModule(QualifiedName),
    /// Plain container created for a dotted binding name.
    Namespace(Namespace),
}

impl From<RegistryItem> for Binding {
    fn from(item: RegistryItem) -> Self {
        match item {
            RegistryItem::Module(id) => Binding::Module(id),
            RegistryItem::Type(id) => Binding::Type(id),
        }
    }
}

impl Binding {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Binding::Type(_) => "type",
            Binding::Module(_) | Binding::HostModule(_) => "module",
            Binding::Namespace(_) => "namespace",
        }
    }
}

/// Names bound in a module (or in a dotted-name container).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    entries: FxHashMap<String, Binding>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bind `name`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.entries.insert(name.into(), binding);
    }

    /// Bind a dotted path, creating intermediate namespaces.
    ///
    /// Existing intermediate namespaces are merged into; any other binding
    /// in the way is replaced by a fresh namespace.
    pub fn install(&mut self, path: &str, binding: Binding) {
        let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = self;
        for segment in segments {
            let slot = current
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Binding::Namespace(Namespace::new()));
            if !matches!(slot, Binding::Namespace(_)) {
                *slot = Binding::Namespace(Namespace::new());
            }
            let Binding::Namespace(ns) = slot else {
                return;
            };
            current = ns;
        }
        current.insert(last, binding);
    }

    /// Look up a dotted path through nested namespaces only.
    pub fn lookup(&self, path: &str) -> Option<&Binding> {
        let mut segments = path.split('.');
        let mut binding = self.get(segments.next()?)?;
        for segment in segments {
            match binding {
                Binding::Namespace(ns) => binding = ns.get(segment)?,
                _ => return None,
            }
        }
        Some(binding)
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> Binding {
        Binding::HostModule(QualifiedName::from_dotted(name))
    }

    #[test]
    fn install_creates_and_merges_namespaces() {
        let mut ns = Namespace::new();
        ns.install("module.submodule", host("pkg.module.submodule"));
        ns.install("module.other", host("pkg.module.other"));

        assert_eq!(ns.names(), vec!["module"]);
        assert_eq!(ns.lookup("module.submodule"), Some(&host("pkg.module.submodule")));
        assert_eq!(ns.lookup("module.other"), Some(&host("pkg.module.other")));
        assert!(matches!(ns.get("module"), Some(Binding::Namespace(inner)) if inner.len() == 2));
    }

    #[test]
    fn install_replaces_non_namespace_intermediate() {
        let mut ns = Namespace::new();
        ns.insert("a", host("a"));
        ns.install("a.b", host("a.b"));
        assert_eq!(ns.lookup("a.b"), Some(&host("a.b")));
        assert_eq!(ns.get("a").map(Binding::kind_name), Some("namespace"));
    }

    #[test]
    fn plain_names() {
        let mut ns = Namespace::new();
        assert!(ns.is_empty());
        ns.install("x", host("x"));
        assert!(ns.contains("x"));
        assert_eq!(ns.lookup("x.y"), None);
        assert_eq!(ns.lookup("missing"), None);
    }
}
