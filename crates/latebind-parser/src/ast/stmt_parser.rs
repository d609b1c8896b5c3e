//! Statement parsing functions.
//!
//! Implements parsing of imports, deferred blocks, class declarations and
//! their members. Unknown statements are kept as [`OtherStmt`] with the
//! lines they cover so callers can reject them with precise locations.

use super::parser::Parser;
use crate::ast::node::{DottedName, Ident};
use crate::ast::stmt::*;
use crate::ast::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;

impl<'ast> Parser<'ast> {
    /// Parse a statement.
    ///
    /// This is the main entry point for statement parsing and dispatches
    /// to specific statement parsers based on the current token.
    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let next = self.peek_nth(1).kind;

        match self.peek().kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_import_from(),
            TokenKind::Deferred if next == TokenKind::Colon => self.parse_deferred(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Abstract if next == TokenKind::Class => self.parse_class(),
            TokenKind::Init if matches!(next, TokenKind::Identifier | TokenKind::Newline) => {
                self.parse_init()
            }
            TokenKind::Static | TokenKind::Field | TokenKind::PostInit if self.peek_nth(2).kind == TokenKind::Equal => {
                self.parse_member()
            }
            TokenKind::Pass => self.parse_pass(),
            _ => self.parse_other(),
        }
    }

    /// Parse an import statement.
    ///
    /// Grammar: `'import' DOTTED ('as' IDENT)? (',' DOTTED ('as' IDENT)?)*`
    pub fn parse_import(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start_span = self.expect(TokenKind::Import)?.span;

        let mut names = BVec::new_in(self.arena);
        names.push(self.parse_import_alias()?);
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.parse_import_alias()?);
        }
        self.expect_line_end()?;

        let end = names.last().map_or(start_span, |n: &ImportAlias<'ast>| n.span);
        Ok(Stmt::Import(ImportStmt {
            names: self.arena.alloc_slice_copy(&names),
            span: start_span.merge(end),
        }))
    }

    /// Parse a from-import statement.
    ///
    /// Grammar: `'from' '.'* DOTTED? 'import' (NAMES | '(' NAMES ','? ')')`
    pub fn parse_import_from(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start_span = self.expect(TokenKind::From)?.span;

        let mut level = 0u32;
        while self.eat(TokenKind::Dot).is_some() {
            level += 1;
        }

        let module = if self.check(TokenKind::Import) && level > 0 {
            None
        } else {
            Some(self.parse_dotted_name()?)
        };

        let import_span = self.expect(TokenKind::Import)?.span;

        let mut names = BVec::new_in(self.arena);
        if self.eat(TokenKind::LeftParen).is_some() {
            loop {
                names.push(self.parse_import_alias()?);
                if self.eat(TokenKind::Comma).is_none() || self.check(TokenKind::RightParen) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen)?;
        } else {
            names.push(self.parse_import_alias()?);
            while self.eat(TokenKind::Comma).is_some() {
                names.push(self.parse_import_alias()?);
            }
        }
        self.expect_line_end()?;

        let end = names.last().map_or(import_span, |n: &ImportAlias<'ast>| n.span);
        Ok(Stmt::ImportFrom(ImportFromStmt {
            level,
            module,
            names: self.arena.alloc_slice_copy(&names),
            span: start_span.merge(end),
        }))
    }

    /// Parse `DOTTED ('as' IDENT)?`.
    fn parse_import_alias(&mut self) -> Result<ImportAlias<'ast>, ParseError> {
        let name = self.parse_dotted_name()?;
        let alias = if self.eat(TokenKind::As).is_some() {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let span = alias.map_or(name.span, |a| name.span.merge(a.span));
        Ok(ImportAlias { name, alias, span })
    }

    /// Parse `IDENT ('.' IDENT)*`.
    pub(crate) fn parse_dotted_name(&mut self) -> Result<DottedName<'ast>, ParseError> {
        let mut parts = BVec::new_in(self.arena);
        let first = self.expect_ident()?;
        parts.push(first);
        let mut span = first.span;
        while self.eat(TokenKind::Dot).is_some() {
            let part = self.expect_ident()?;
            span = span.merge(part.span);
            parts.push(part);
        }
        Ok(DottedName {
            parts: self.arena.alloc_slice_copy(&parts),
            span,
        })
    }

    /// Parse a deferred dependency block.
    ///
    /// Grammar: `'deferred' ':' BLOCK`
    pub fn parse_deferred(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let span = self.expect(TokenKind::Deferred)?.span;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_block()?;
        Ok(Stmt::Deferred(DeferredStmt { body, span }))
    }

    /// Parse a class declaration.
    ///
    /// Grammar: `'abstract'? 'class' IDENT ':' BLOCK`
    pub fn parse_class(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let abstract_token = self.eat(TokenKind::Abstract);
        let class_token = self.expect(TokenKind::Class)?;
        let start_span = abstract_token.map_or(class_token.span, |t| t.span);

        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_block()?;

        Ok(Stmt::Class(self.arena.alloc(ClassStmt {
            name,
            is_abstract: abstract_token.is_some(),
            body,
            span: start_span.merge(name.span),
        })))
    }

    /// Parse an initializer parameter list.
    ///
    /// Grammar: `'init' (IDENT (',' IDENT)*)?`
    pub fn parse_init(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start_span = self.expect(TokenKind::Init)?.span;
        let mut params: BVec<'_, Ident<'ast>> = BVec::new_in(self.arena);

        if !self.check(TokenKind::Newline) {
            params.push(self.expect_ident()?);
            while self.eat(TokenKind::Comma).is_some() {
                params.push(self.expect_ident()?);
            }
        }
        self.expect_line_end()?;

        let span = params.last().map_or(start_span, |p| start_span.merge(p.span));
        Ok(Stmt::Init(InitStmt {
            params: self.arena.alloc_slice_copy(&params),
            span,
        }))
    }

    /// Parse a `static`, `field` or `post_init` member.
    ///
    /// Grammar: `('static' | 'field' | 'post_init') IDENT '=' EXPR`
    pub fn parse_member(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let keyword = self.advance();
        let name = self.expect_ident()?;
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        self.expect_line_end()?;

        let member = MemberStmt {
            name,
            value: self.arena.alloc(value),
            span: keyword.span.merge(value.span()),
        };
        Ok(match keyword.kind {
            TokenKind::Static => Stmt::Static(member),
            TokenKind::PostInit => Stmt::PostInit(member),
            _ => Stmt::Field(member),
        })
    }

    /// Parse `pass`.
    pub fn parse_pass(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let span = self.expect(TokenKind::Pass)?.span;
        self.expect_line_end()?;
        Ok(Stmt::Pass(PassStmt { span }))
    }

    /// Parse an unmodelled statement.
    ///
    /// Consumes the logical line, remembering each physical line it covers.
    /// A line ending in `:` followed by an indented block gets that block
    /// parsed as its body.
    pub fn parse_other(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start_span = self.peek().span;
        let mut lines: BVec<'_, u32> = BVec::new_in(self.arena);
        let mut last_kind = None;

        while !self.is_eof() && !self.check(TokenKind::Newline) && !self.check(TokenKind::Dedent) {
            let token = self.advance();
            if lines.last() != Some(&token.span.line) {
                lines.push(token.span.line);
            }
            last_kind = Some(token.kind);
        }
        self.eat(TokenKind::Newline);

        let body: &'ast [Stmt<'ast>] =
            if last_kind == Some(TokenKind::Colon) && self.eat(TokenKind::Indent).is_some() {
                self.parse_block_body()
            } else {
                &[]
            };

        Ok(Stmt::Other(OtherStmt {
            lines: self.arena.alloc_slice_copy(&lines),
            body,
            span: start_span,
        }))
    }

    /// Parse the block following a `:`.
    ///
    /// Either a single simple statement on the same line (`class A: pass`)
    /// or a newline followed by an indented run of statements.
    pub fn parse_block(&mut self) -> Result<&'ast [Stmt<'ast>], ParseError> {
        if !self.check(TokenKind::Newline) && !self.is_eof() {
            let stmt = self.parse_statement()?;
            return Ok(self.arena.alloc_slice_copy(&[stmt]));
        }

        self.eat(TokenKind::Newline);
        if self.eat(TokenKind::Indent).is_none() {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedBlock,
                self.peek().span,
                "expected an indented block",
            ));
        }
        Ok(self.parse_block_body())
    }

    /// Parse statements up to the `Dedent` closing the current block.
    fn parse_block_body(&mut self) -> &'ast [Stmt<'ast>] {
        let mut stmts = BVec::new_in(self.arena);

        while !self.is_eof() && !self.check(TokenKind::Dedent) {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            if let Some(indent) = self.eat(TokenKind::Indent) {
                self.record(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    indent.span,
                    "unexpected indent",
                ));
                self.skip_block_body();
                continue;
            }
            if let Some(stmt) = self.parse_statement_recovering() {
                stmts.push(stmt);
            }
        }
        self.eat(TokenKind::Dedent);

        stmts.into_bump_slice()
    }
}
