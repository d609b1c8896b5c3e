//! Abstract Syntax Tree (AST) for latebind module sources.
//!
//! This module provides:
//! - AST node definitions for statements and member expressions
//! - Parser for transforming tokens into AST
//! - Visitor pattern for AST traversal
//!
//! # Example
//!
//! ```
//! use latebind_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//! deferred:
//!     from .group import Group
//!
//! class Instance:
//!     init param
//!     field group = Group()
//! "#;
//!
//! match Parser::parse(source, &arena) {
//!     Ok(module) => println!("Parsed successfully: {} statements", module.body().len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod node;

mod parser;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub mod visitor;

// Re-export error types from core
pub use latebind_core::{ParseError, ParseErrorKind, ParseErrors};

pub use expr::*;
pub use node::*;
pub use parser::Parser;
pub use stmt::*;

use latebind_core::Span;

/// A parsed module or deferred block.
///
/// All nodes are allocated in the arena passed to [`Parser::parse`] and stay
/// valid for its lifetime.
#[derive(Debug)]
pub struct Module<'ast> {
    body: &'ast [Stmt<'ast>],
    span: Span,
}

impl<'ast> Module<'ast> {
    pub(crate) fn new(body: &'ast [Stmt<'ast>], span: Span) -> Self {
        Self { body, span }
    }

    /// Top-level statements in source order.
    pub fn body(&self) -> &'ast [Stmt<'ast>] {
        self.body
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    #[test]
    fn parse_empty_source() {
        let arena = Bump::new();
        let module = Parser::parse("", &arena).unwrap();
        assert!(module.body().is_empty());
    }

    #[test]
    fn parse_comment_only_source() {
        let arena = Bump::new();
        let module = Parser::parse("# -*- coding: utf-8 -*-\n\n# nothing here\n", &arena).unwrap();
        assert!(module.body().is_empty());
    }

    #[test]
    fn parse_mixed_module() {
        let arena = Bump::new();
        let source = r#"
import pkg.types as types
from .instance import Instance

deferred:
    from ..group import Group

class Container:
    init items
    static label = "container"
    field group = Group(param=1)
"#;
        let module = Parser::parse(source, &arena).unwrap();
        let kinds: Vec<&str> = module.body().iter().map(Stmt::kind_name).collect();
        assert_eq!(kinds, vec!["import", "from-import", "deferred block", "class"]);
    }

    #[test]
    fn parse_reports_every_bad_line() {
        let arena = Bump::new();
        let source = "import\nfrom x import\npass\n";
        let errors = Parser::parse(source, &arena).unwrap_err();
        let lines: Vec<u32> = errors.iter().map(|e| e.span.line).collect();
        assert_eq!(lines, vec![1, 2]);
    }
}
