//! Statement AST nodes.
//!
//! Provides nodes for:
//! - Import statements (`import`, `from ... import`)
//! - Deferred dependency blocks
//! - Class declarations and their members (`init`, `static`, `field`)
//! - Anything else, kept as an opaque [`OtherStmt`]

use crate::ast::expr::Expr;
use crate::ast::node::{DottedName, Ident};
use latebind_core::Span;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `import a.b [as c], d`
    Import(ImportStmt<'ast>),
    /// `from [.]*a import X [as Y], Outer.Inner`
    ImportFrom(ImportFromStmt<'ast>),
    /// `deferred:` block
    Deferred(DeferredStmt<'ast>),
    /// `[abstract] class Name:`
    Class(&'ast ClassStmt<'ast>),
    /// `init p, q`
    Init(InitStmt<'ast>),
    /// `static name = expr`
    Static(MemberStmt<'ast>),
    /// `field name = expr`
    Field(MemberStmt<'ast>),
    /// `post_init name = expr`, stored on the instance after construction
    PostInit(MemberStmt<'ast>),
    /// `pass`
    Pass(PassStmt),
    /// Any statement the module language does not model.
    Other(OtherStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::Import(s) => s.span,
            Self::ImportFrom(s) => s.span,
            Self::Deferred(s) => s.span,
            Self::Class(s) => s.span,
            Self::Init(s) => s.span,
            Self::Static(s) => s.span,
            Self::Field(s) => s.span,
            Self::PostInit(s) => s.span,
            Self::Pass(s) => s.span,
            Self::Other(s) => s.span,
        }
    }

    /// Whether this is an `import` or `from ... import` statement.
    pub fn is_import(&self) -> bool {
        matches!(self, Self::Import(_) | Self::ImportFrom(_))
    }

    /// Short description used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Import(_) => "import",
            Self::ImportFrom(_) => "from-import",
            Self::Deferred(_) => "deferred block",
            Self::Class(_) => "class",
            Self::Init(_) => "init",
            Self::Static(_) => "static member",
            Self::Field(_) => "field member",
            Self::PostInit(_) => "post-init member",
            Self::Pass(_) => "pass",
            Self::Other(_) => "statement",
        }
    }
}

/// One imported name with an optional alias.
///
/// In `import a.b as c` the name is the module path; in
/// `from m import Outer.Inner as I` it is the (possibly nested) member name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportAlias<'ast> {
    pub name: DottedName<'ast>,
    pub alias: Option<Ident<'ast>>,
    pub span: Span,
}

/// `import a.b [as c], d`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportStmt<'ast> {
    pub names: &'ast [ImportAlias<'ast>],
    pub span: Span,
}

/// `from [.]*module import names`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportFromStmt<'ast> {
    /// Number of leading dots; 0 for an absolute import.
    pub level: u32,
    /// Module after the dots; `None` for `from . import x`.
    pub module: Option<DottedName<'ast>>,
    pub names: &'ast [ImportAlias<'ast>],
    pub span: Span,
}

impl<'ast> ImportFromStmt<'ast> {
    /// The module as written, dots included (`..group`).
    pub fn module_spelling(&self) -> String {
        let mut out = ".".repeat(self.level as usize);
        if let Some(module) = &self.module {
            out.push_str(&module.to_dotted());
        }
        out
    }
}

/// `deferred:` followed by an indented body.
///
/// The body is parsed like any block but never executed by the host; the
/// deferred engine re-reads the block source from the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredStmt<'ast> {
    pub body: &'ast [Stmt<'ast>],
    /// Location of the `deferred` marker.
    pub span: Span,
}

/// A class declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStmt<'ast> {
    pub name: Ident<'ast>,
    pub is_abstract: bool,
    pub body: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// `init p, q`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitStmt<'ast> {
    pub params: &'ast [Ident<'ast>],
    pub span: Span,
}

/// `static name = value` or `field name = value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberStmt<'ast> {
    pub name: Ident<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// `pass`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStmt {
    pub span: Span,
}

/// An unmodelled statement (assignment, call, `if ...:`, ...).
///
/// Keeps every source line the statement's own tokens touch and, for
/// statements that open an indented block, the parsed body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OtherStmt<'ast> {
    pub lines: &'ast [u32],
    pub body: &'ast [Stmt<'ast>],
    pub span: Span,
}
