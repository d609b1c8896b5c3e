//! Shared AST building blocks.

use std::fmt;

use latebind_core::{QualifiedName, Span};

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A dotted name such as `pkg.types.instance` or `Outer.Inner`.
///
/// Always has at least one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DottedName<'ast> {
    pub parts: &'ast [Ident<'ast>],
    pub span: Span,
}

impl<'ast> DottedName<'ast> {
    /// First segment.
    pub fn first(&self) -> &'ast str {
        self.parts.first().map_or("", |p| p.name)
    }

    /// Last segment.
    pub fn last(&self) -> &'ast str {
        self.parts.last().map_or("", |p| p.name)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether the name contains a dot.
    pub fn is_dotted(&self) -> bool {
        self.parts.len() > 1
    }

    pub fn segments(&self) -> impl Iterator<Item = &'ast str> + 'ast {
        self.parts.iter().map(|p| p.name)
    }

    /// The dot-joined spelling.
    pub fn to_dotted(&self) -> String {
        self.segments().collect::<Vec<_>>().join(".")
    }

    pub fn to_qualified_name(&self) -> QualifiedName {
        QualifiedName::from_dotted(&self.to_dotted())
    }
}

impl fmt::Display for DottedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(part.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_name_accessors() {
        let parts = [
            Ident::new("pkg", Span::new(1, 1, 3)),
            Ident::new("group", Span::new(1, 5, 5)),
        ];
        let name = DottedName {
            parts: &parts,
            span: Span::new(1, 1, 9),
        };
        assert_eq!(name.first(), "pkg");
        assert_eq!(name.last(), "group");
        assert!(name.is_dotted());
        assert_eq!(name.to_string(), "pkg.group");
        assert_eq!(name.to_qualified_name().to_string(), "pkg.group");
    }
}
