//! Visitor pattern for traversing the AST.
//!
//! This module provides a `Visitor` trait and corresponding `walk_*` functions
//! that enable traversal and analysis of latebind AST nodes.
//!
//! # Example: Collecting Import Lines
//!
//! ```
//! use latebind_parser::{visitor::Visitor, ImportFromStmt, Parser};
//! use bumpalo::Bump;
//!
//! struct FromImports {
//!     lines: Vec<u32>,
//! }
//!
//! impl<'ast> Visitor<'ast> for FromImports {
//!     fn visit_import_from(&mut self, stmt: &ImportFromStmt<'ast>) {
//!         self.lines.push(stmt.span.line);
//!     }
//! }
//!
//! let arena = Bump::new();
//! let module = Parser::parse("from a import B\ndeferred:\n    from .c import D\n", &arena).unwrap();
//!
//! let mut collector = FromImports { lines: Vec::new() };
//! collector.visit_module(&module);
//! assert_eq!(collector.lines, vec![1, 3]);
//! ```

use crate::ast::Module;
use crate::ast::expr::*;
use crate::ast::stmt::*;

/// Visitor trait for traversing AST nodes.
///
/// Each `visit_*` method corresponds to an AST node type and is called
/// when that node is encountered during traversal. The default implementations
/// call the corresponding `walk_*` function to continue traversal.
///
/// Override any `visit_*` method to customize behavior for specific node types.
pub trait Visitor<'ast>: Sized {
    /// Visit a module (root node).
    fn visit_module(&mut self, module: &Module<'ast>) {
        walk_module(self, module);
    }

    /// Visit a statement.
    fn visit_stmt(&mut self, stmt: &Stmt<'ast>) {
        walk_stmt(self, stmt);
    }

    fn visit_import(&mut self, _stmt: &ImportStmt<'ast>) {}

    fn visit_import_from(&mut self, _stmt: &ImportFromStmt<'ast>) {}

    /// Visit a deferred block.
    fn visit_deferred(&mut self, stmt: &DeferredStmt<'ast>) {
        walk_block(self, stmt.body);
    }

    /// Visit a class declaration.
    fn visit_class(&mut self, class: &ClassStmt<'ast>) {
        walk_block(self, class.body);
    }

    fn visit_init(&mut self, _stmt: &InitStmt<'ast>) {}

    /// Visit a `static` member.
    fn visit_static(&mut self, member: &MemberStmt<'ast>) {
        self.visit_expr(member.value);
    }

    /// Visit a `field` member.
    fn visit_field(&mut self, member: &MemberStmt<'ast>) {
        self.visit_expr(member.value);
    }

    /// Visit a `post_init` member.
    fn visit_post_init(&mut self, member: &MemberStmt<'ast>) {
        self.visit_expr(member.value);
    }

    fn visit_pass(&mut self, _stmt: &PassStmt) {}

    /// Visit an unmodelled statement.
    fn visit_other(&mut self, stmt: &OtherStmt<'ast>) {
        walk_block(self, stmt.body);
    }

    /// Visit an expression.
    fn visit_expr(&mut self, expr: &Expr<'ast>) {
        walk_expr(self, expr);
    }
}

/// Walk every top-level statement of a module.
pub fn walk_module<'ast, V: Visitor<'ast>>(visitor: &mut V, module: &Module<'ast>) {
    walk_block(visitor, module.body());
}

/// Walk a run of statements.
pub fn walk_block<'ast, V: Visitor<'ast>>(visitor: &mut V, body: &[Stmt<'ast>]) {
    for stmt in body {
        visitor.visit_stmt(stmt);
    }
}

/// Dispatch a statement to its `visit_*` method.
pub fn walk_stmt<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &Stmt<'ast>) {
    match stmt {
        Stmt::Import(s) => visitor.visit_import(s),
        Stmt::ImportFrom(s) => visitor.visit_import_from(s),
        Stmt::Deferred(s) => visitor.visit_deferred(s),
        Stmt::Class(s) => visitor.visit_class(s),
        Stmt::Init(s) => visitor.visit_init(s),
        Stmt::Static(s) => visitor.visit_static(s),
        Stmt::Field(s) => visitor.visit_field(s),
        Stmt::PostInit(s) => visitor.visit_post_init(s),
        Stmt::Pass(s) => visitor.visit_pass(s),
        Stmt::Other(s) => visitor.visit_other(s),
    }
}

/// Walk the sub-expressions of an expression.
pub fn walk_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &Expr<'ast>) {
    match expr {
        Expr::Literal(_) | Expr::Path(_) => {}
        Expr::Call(call) => {
            visitor.visit_expr(call.callee);
            for arg in call.args {
                visitor.visit_expr(arg.value);
            }
        }
        Expr::List(list) => {
            for item in list.items {
                visitor.visit_expr(item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parser;
    use bumpalo::Bump;

    #[derive(Default)]
    struct Counter {
        classes: Vec<String>,
        paths: usize,
        others: usize,
    }

    impl<'ast> Visitor<'ast> for Counter {
        fn visit_class(&mut self, class: &ClassStmt<'ast>) {
            self.classes.push(class.name.name.to_string());
            walk_block(self, class.body);
        }

        fn visit_expr(&mut self, expr: &Expr<'ast>) {
            if matches!(expr, Expr::Path(_)) {
                self.paths += 1;
            }
            walk_expr(self, expr);
        }

        fn visit_other(&mut self, stmt: &OtherStmt<'ast>) {
            self.others += 1;
            walk_block(self, stmt.body);
        }
    }

    #[test]
    fn walks_nested_classes_and_expressions() {
        let arena = Bump::new();
        let source = r#"
class Outer:
    field all = [Inner(a=x), y]
    class Inner:
        field me = self.a
if flag:
    z = 1
"#;
        let module = Parser::parse(source, &arena).unwrap();
        let mut counter = Counter::default();
        counter.visit_module(&module);

        assert_eq!(counter.classes, vec!["Outer", "Inner"]);
        // Inner, x, y, self.a
        assert_eq!(counter.paths, 4);
        assert_eq!(counter.others, 2);
    }
}
