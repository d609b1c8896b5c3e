//! Expression AST nodes.
//!
//! Member expressions are deliberately small: dotted paths, calls with
//! positional and keyword arguments, list displays and literals.

use crate::ast::node::{DottedName, Ident};
use latebind_core::Span;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Dotted path (`group.Group`, `self.param`)
    Path(PathExpr<'ast>),
    /// Call (`Instance(param=3)`)
    Call(&'ast CallExpr<'ast>),
    /// List display (`[a, b]`)
    List(ListExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Path(e) => e.span,
            Self::Call(e) => e.span,
            Self::List(e) => e.span,
        }
    }

    /// Whether the expression is a plain literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// A literal expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

/// Literal values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Int(i64),
    Float(f64),
    /// Decoded string content (escapes resolved).
    String(&'ast str),
    Bool(bool),
    None,
}

/// A dotted path starting at a name in scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathExpr<'ast> {
    pub path: DottedName<'ast>,
    pub span: Span,
}

impl<'ast> PathExpr<'ast> {
    /// Whether the path reads through `self`.
    pub fn is_self(&self) -> bool {
        self.path.first() == "self"
    }
}

/// A call expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: &'ast Expr<'ast>,
    pub args: &'ast [Arg<'ast>],
    pub span: Span,
}

/// A call argument, optionally named.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arg<'ast> {
    pub name: Option<Ident<'ast>>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// A list display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListExpr<'ast> {
    pub items: &'ast [Expr<'ast>],
    pub span: Span,
}
