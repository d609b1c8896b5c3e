//! Core parser state and token helpers.
//!
//! Statement and expression parsing live in `stmt_parser` and
//! `expr_parser`; this file holds the token buffer, lookahead helpers and
//! the line-level error recovery shared by both.

use bumpalo::Bump;
use bumpalo::collections::Vec as BVec;
use latebind_core::{ParseError, ParseErrorKind, ParseErrors, Span};

use crate::ast::Module;
use crate::ast::node::Ident;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parser for latebind sources.
///
/// Lexes the whole input up front, then parses statements one logical line
/// at a time. A statement that fails to parse is recorded and skipped
/// (together with any block it opens) so every bad line is reported.
pub struct Parser<'ast> {
    tokens: Vec<Token<'ast>>,
    pos: usize,
    pub(crate) arena: &'ast Bump,
    errors: ParseErrors,
}

impl<'ast> Parser<'ast> {
    /// Parse a complete source text.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Module<'ast>, ParseErrors> {
        let mut parser = Self::with_source(source, arena);
        let module = parser.parse_module();
        if parser.errors.is_empty() {
            Ok(module)
        } else {
            Err(parser.errors)
        }
    }

    /// Parse as much as possible, returning the partial module and all errors.
    pub fn parse_lenient(source: &str, arena: &'ast Bump) -> (Module<'ast>, ParseErrors) {
        let mut parser = Self::with_source(source, arena);
        let module = parser.parse_module();
        (module, parser.errors)
    }

    fn with_source(source: &str, arena: &'ast Bump) -> Self {
        let (tokens, lex_errors) = Lexer::tokenize(source, arena);
        let mut errors = ParseErrors::new();
        for err in lex_errors {
            errors.push(err.into());
        }
        Self {
            tokens,
            pos: 0,
            arena,
            errors,
        }
    }

    fn parse_module(&mut self) -> Module<'ast> {
        let start = self.peek().span;
        let mut body = BVec::new_in(self.arena);

        while !self.is_eof() {
            match self.peek().kind {
                TokenKind::Newline | TokenKind::Dedent => {
                    self.advance();
                }
                TokenKind::Indent => {
                    let token = self.advance();
                    self.record(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.span,
                        "unexpected indent",
                    ));
                    self.skip_block_body();
                }
                _ => {
                    if let Some(stmt) = self.parse_statement_recovering() {
                        body.push(stmt);
                    }
                }
            }
        }

        Module::new(body.into_bump_slice(), start)
    }

    // =========================================
    // Token helpers
    // =========================================

    /// Current token. The buffer always ends with `Eof`.
    #[inline]
    pub(crate) fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    /// Token `n` positions ahead, clamped to the final `Eof`.
    pub(crate) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let idx = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    #[inline]
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token. `Eof` is never consumed.
    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let found = *self.peek();
        if found.kind == TokenKind::Eof {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                found.span,
                format!("expected {}", kind.description()),
            ));
        }
        Err(ParseError::expected_token(
            found.span,
            kind.description(),
            &found.describe(),
        ))
    }

    /// Consume an identifier.
    ///
    /// Soft keywords (`field`, `static`, `post_init`, `init`, `deferred`,
    /// `abstract`) are
    /// accepted as plain names here so they stay usable as module and member
    /// names.
    pub(crate) fn expect_ident(&mut self) -> Result<Ident<'ast>, ParseError> {
        let token = *self.peek();
        match token.kind {
            TokenKind::Identifier
            | TokenKind::Field
            | TokenKind::Static
            | TokenKind::PostInit
            | TokenKind::Init
            | TokenKind::Deferred
            | TokenKind::Abstract => {
                self.advance();
                Ok(Ident::new(token.lexeme, token.span))
            }
            _ => Err(ParseError::expected_identifier(token.span, &token.describe())),
        }
    }

    /// Expect the end of a logical line.
    pub(crate) fn expect_line_end(&mut self) -> Result<Span, ParseError> {
        if self.check(TokenKind::Eof) || self.check(TokenKind::Dedent) {
            return Ok(self.peek().span);
        }
        self.expect(TokenKind::Newline).map(|t| t.span)
    }

    // =========================================
    // Error recovery
    // =========================================

    pub(crate) fn record(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Parse one statement; on failure record the error and skip the rest
    /// of the logical line and any block it opens.
    pub(crate) fn parse_statement_recovering(&mut self) -> Option<crate::ast::Stmt<'ast>> {
        let start = self.pos;
        match self.parse_statement() {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.record(err);
                self.synchronize(start);
                None
            }
        }
    }

    /// Skip to the start of the next logical line.
    fn synchronize(&mut self, start: usize) {
        // Always make progress.
        if self.pos == start && !self.is_eof() && !self.check(TokenKind::Dedent) {
            self.advance();
        }
        while !self.is_eof() && !self.check(TokenKind::Newline) {
            if self.check(TokenKind::Indent) {
                self.advance();
                self.skip_block_body();
                return;
            }
            if self.check(TokenKind::Dedent) {
                return;
            }
            self.advance();
        }
        self.eat(TokenKind::Newline);
        if self.eat(TokenKind::Indent).is_some() {
            self.skip_block_body();
        }
    }

    /// Skip tokens up to and including the `Dedent` closing the block whose
    /// `Indent` was just consumed.
    pub(crate) fn skip_block_body(&mut self) {
        let mut depth = 1usize;
        while !self.is_eof() {
            match self.advance().kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_errors_are_parse_errors() {
        let arena = Bump::new();
        let errors = Parser::parse("import a $\n", &arena).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next().map(|e| e.kind),
            Some(ParseErrorKind::InvalidSyntax)
        );
    }

    #[test]
    fn unexpected_indent_skips_block() {
        let arena = Bump::new();
        let (module, errors) = Parser::parse_lenient("pass\n    import a\n    import b\npass\n", &arena);
        assert_eq!(errors.len(), 1);
        assert_eq!(module.body().len(), 2);
    }

    #[test]
    fn bad_block_header_skips_body() {
        let arena = Bump::new();
        let source = "class :\n    field x = 1\nimport ok\n";
        let (module, errors) = Parser::parse_lenient(source, &arena);
        assert_eq!(errors.len(), 1);
        assert_eq!(module.body().len(), 1);
        assert!(module.body()[0].is_import());
    }

    #[test]
    fn lenient_keeps_good_statements() {
        let arena = Bump::new();
        let (module, errors) = Parser::parse_lenient("import a\nimport\nimport b\n", &arena);
        assert_eq!(errors.len(), 1);
        assert_eq!(module.body().len(), 2);
    }

    #[test]
    fn soft_keywords_are_names() {
        let arena = Bump::new();
        let module = Parser::parse("import pkg.field as static\n", &arena).unwrap();
        assert_eq!(module.body().len(), 1);
    }
}
