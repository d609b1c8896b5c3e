//! Latebind Parser crate.
//!
//! This crate provides the lexer and parser for latebind module sources.
//! It includes:
//! - Indentation-aware lexical analysis (tokenization)
//! - Abstract Syntax Tree (AST) definitions, allocated in a bumpalo arena
//! - Parser for transforming tokens into AST, with line-level error recovery
//! - Visitor pattern for AST traversal
//!
//! The same parser handles whole module files and the de-indented text of a
//! deferred block, so import statements have a single definition.
//!
//! # Example
//!
//! ```
//! use latebind_parser::{Parser, Stmt};
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = "from ..instance import Instance\nimport pkg.group as group\n";
//!
//! let module = Parser::parse(source, &arena).expect("valid imports");
//! assert_eq!(module.body().len(), 2);
//! assert!(matches!(module.body()[0], Stmt::ImportFrom(_)));
//! ```

pub mod ast;
pub mod lexer;

pub use ast::visitor::{self, Visitor};
pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
