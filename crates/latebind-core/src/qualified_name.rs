use std::fmt;

/// Dotted name identifying a module or type across the whole program.
///
/// Used as the sole key for registry lookups. Module names look like
/// `pkg.sub`, type names like `pkg.sub.Widget` and nested types like
/// `pkg.sub.Widget.Inner`.
///
/// # Examples
///
/// ```
/// use latebind_core::QualifiedName;
///
/// let top = QualifiedName::global("pkg");
/// assert_eq!(top.to_string(), "pkg");
///
/// let widget = QualifiedName::new("Widget", vec!["pkg".into(), "sub".into()]);
/// assert_eq!(widget.to_string(), "pkg.sub.Widget");
///
/// let parsed = QualifiedName::from_dotted("pkg.sub.Widget");
/// assert_eq!(parsed, widget);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Last segment (e.g., "Widget", "sub")
    pub name: String,
    /// Leading segments (e.g., ["pkg", "sub"])
    /// Empty for a top-level name
    pub namespace: Vec<String>,
}

impl QualifiedName {
    /// Create a new qualified name with namespace.
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Create a top-level name.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Create from a dotted string, dropping empty segments.
    ///
    /// `"a..b"` and `"a.b."` both become `a.b`. Use [`try_from_dotted`](Self::try_from_dotted)
    /// when malformed names must be rejected.
    pub fn from_dotted(s: &str) -> Self {
        let parts: Vec<&str> = s.split('.').filter(|p| !p.is_empty()).collect();
        Self::from_parts(&parts).unwrap_or_else(|| Self::global(""))
    }

    /// Create from a dotted string, returning `None` if any segment is empty.
    pub fn try_from_dotted(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        Self::from_parts(&parts)
    }

    /// Create from individual segments. Returns `None` for an empty slice.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Option<Self> {
        let (name, namespace) = parts.split_last()?;
        Some(Self {
            name: name.as_ref().to_string(),
            namespace: namespace.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }

    /// Check if this is a top-level name.
    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Get the simple (last) segment.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Get the leading segments.
    pub fn namespace_path(&self) -> &[String] {
        &self.namespace
    }

    /// Iterate over all segments, first to last.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
    }

    /// All segments as owned strings.
    pub fn to_segments(&self) -> Vec<String> {
        self.segments().map(str::to_string).collect()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.namespace.len() + 1
    }

    /// First segment (the top-level package).
    pub fn top_level(&self) -> &str {
        self.namespace.first().unwrap_or(&self.name)
    }

    /// Compute the [`TypeHash`](crate::TypeHash) of this name.
    pub fn to_type_hash(&self) -> crate::TypeHash {
        crate::TypeHash::from_name(&self.to_string())
    }

    /// Create a child name below this one.
    ///
    /// Example: `pkg.sub` + `Widget` = `pkg.sub.Widget`
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut child_ns = self.namespace.clone();
        child_ns.push(self.name.clone());
        Self {
            name: name.into(),
            namespace: child_ns,
        }
    }

    /// Append a dotted suffix (`pkg` + `a.b` = `pkg.a.b`). Empty segments are skipped.
    pub fn join(&self, dotted: &str) -> Self {
        dotted
            .split('.')
            .filter(|p| !p.is_empty())
            .fold(self.clone(), |acc, part| acc.child(part))
    }

    /// Get the parent name (if any).
    ///
    /// Example: `pkg.sub.Widget` -> Some(`pkg.sub`)
    pub fn parent(&self) -> Option<Self> {
        let (name, namespace) = self.namespace.split_last()?;
        Some(Self {
            name: name.clone(),
            namespace: namespace.to_vec(),
        })
    }

    /// Whether `prefix` is this name or one of its ancestors.
    pub fn starts_with(&self, prefix: &QualifiedName) -> bool {
        prefix.depth() <= self.depth() && self.segments().zip(prefix.segments()).all(|(a, b)| a == b)
    }
}

/// Segment by segment, so a package sorts before everything inside it.
impl Ord for QualifiedName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.segments().cmp(other.segments())
    }
}

impl PartialOrd for QualifiedName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace.join("."), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_dotted(s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_dotted(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_name() {
        let name = QualifiedName::global("pkg");
        assert_eq!(name.name, "pkg");
        assert!(name.is_global());
        assert_eq!(name.to_string(), "pkg");
        assert_eq!(name.depth(), 1);
    }

    #[test]
    fn from_dotted_splits_segments() {
        let name = QualifiedName::from_dotted("cc_one.types.group");
        assert_eq!(name.simple_name(), "group");
        assert_eq!(name.namespace_path(), &["cc_one".to_string(), "types".to_string()]);
        assert_eq!(name.top_level(), "cc_one");
    }

    #[test]
    fn from_dotted_skips_empty_segments() {
        assert_eq!(QualifiedName::from_dotted("a..b.").to_string(), "a.b");
    }

    #[test]
    fn try_from_dotted_rejects_empty_segments() {
        assert!(QualifiedName::try_from_dotted("a..b").is_none());
        assert!(QualifiedName::try_from_dotted("").is_none());
        assert!(QualifiedName::try_from_dotted(".a").is_none());
        assert_eq!(
            QualifiedName::try_from_dotted("a.b").map(|q| q.to_string()),
            Some("a.b".to_string())
        );
    }

    #[test]
    fn child_and_parent() {
        let module = QualifiedName::from_dotted("pkg.sub");
        let widget = module.child("Widget");
        assert_eq!(widget.to_string(), "pkg.sub.Widget");
        assert_eq!(widget.parent(), Some(module));
        assert_eq!(QualifiedName::global("pkg").parent(), None);
    }

    #[test]
    fn join_dotted_suffix() {
        let base = QualifiedName::global("pkg");
        assert_eq!(base.join("a.b").to_string(), "pkg.a.b");
        assert_eq!(base.join("").to_string(), "pkg");
    }

    #[test]
    fn starts_with_prefix() {
        let name = QualifiedName::from_dotted("pkg.sub.Widget");
        assert!(name.starts_with(&QualifiedName::from_dotted("pkg.sub")));
        assert!(name.starts_with(&name.clone()));
        assert!(!name.starts_with(&QualifiedName::from_dotted("pkg.other")));
        assert!(!QualifiedName::global("pkg").starts_with(&name));
    }

    #[test]
    fn ordering_follows_segments() {
        let mut names: Vec<QualifiedName> = ["pkg.leaf", "pkg", "app.z", "pkg.a.b", "app"]
            .into_iter()
            .map(QualifiedName::from_dotted)
            .collect();
        names.sort();
        let sorted: Vec<String> = names.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, vec!["app", "app.z", "pkg", "pkg.a.b", "pkg.leaf"]);
    }

    #[test]
    fn segments_iterate_in_order() {
        let name = QualifiedName::from_dotted("a.b.c");
        assert_eq!(name.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
