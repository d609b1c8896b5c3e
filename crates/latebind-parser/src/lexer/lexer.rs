//! Main lexer implementation for latebind sources.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Layout is
//! significant: the lexer tracks an indentation stack and synthesises
//! `Newline`, `Indent` and `Dedent` tokens. Line breaks inside brackets and
//! after a trailing backslash do not end a logical line; blank and
//! comment-only lines produce no tokens at all.
//!
//! The lexer copies all string content (identifiers, literals) into the arena,
//! allowing the source string to be freed after lexing completes.

use std::collections::VecDeque;

use bumpalo::Bump;
use latebind_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Width a tab advances the indentation to (next multiple of).
const TAB_WIDTH: u32 = 8;

/// Lexer for latebind source code.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated (persists).
pub struct Lexer<'src, 'ast> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Arena for allocating token lexemes.
    arena: &'ast Bump,
    /// Synthesised layout tokens waiting to be returned.
    pending: VecDeque<Token<'ast>>,
    /// Open indentation levels; always starts with 0.
    indents: Vec<u32>,
    /// Nesting depth of `(`, `[` and `{`.
    depth: u32,
    /// Next scan starts a physical line that may change indentation.
    at_line_start: bool,
    /// The current logical line produced at least one token.
    line_has_content: bool,
    /// Accumulated errors.
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            pending: VecDeque::new(),
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            line_has_content: false,
            errors: Vec::new(),
        }
    }

    /// Lex the whole source.
    ///
    /// The token list always ends with [`TokenKind::Eof`]; errors are
    /// returned alongside so the parser can report them with its own.
    pub fn tokenize(source: &'src str, arena: &'ast Bump) -> (Vec<Token<'ast>>, Vec<LexError>) {
        let mut lexer = Lexer::new(source, arena);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                break;
            }
        }
        (tokens, lexer.take_errors())
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    ///
    /// Once the end of input is reached every further call returns `Eof`.
    pub fn next_token(&mut self) -> Token<'ast> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }

            if self.at_line_start && self.depth == 0 {
                self.at_line_start = false;
                self.scan_indentation();
                continue;
            }

            self.skip_trivia();

            if self.cursor.is_eof() {
                return self.finish();
            }

            // Explicit line continuation.
            if self.cursor.check_str("\\\n") || self.cursor.check_str("\\\r\n") {
                self.cursor.advance();
                self.cursor.eat('\r');
                self.cursor.advance();
                continue;
            }

            if self.cursor.check(|c| c == '\n') {
                let line = self.cursor.line();
                let col = self.cursor.column();
                self.cursor.advance();
                if self.depth > 0 {
                    continue;
                }
                self.at_line_start = true;
                if self.line_has_content {
                    self.line_has_content = false;
                    return self.layout_token(TokenKind::Newline, Span::new(line, col, 1));
                }
                continue;
            }

            let line = self.cursor.line();
            let col = self.cursor.column();
            let offset = self.cursor.offset();
            if let Some(token) = self.scan_token(line, col, offset) {
                self.line_has_content = true;
                return token;
            }
        }
    }

    // =========================================
    // Internal: Layout
    // =========================================

    /// Measure the indentation of a fresh physical line and queue
    /// `Indent`/`Dedent` tokens for it.
    fn scan_indentation(&mut self) {
        let mut width = 0u32;
        loop {
            match self.cursor.peek() {
                Some(' ') => width += 1,
                Some('\t') => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                Some('\x0c') => width = 0,
                Some('\u{FEFF}') if self.cursor.offset() == 0 => {}
                _ => break,
            }
            self.cursor.advance();
        }

        // Blank and comment-only lines do not affect layout.
        match self.cursor.peek() {
            None | Some('\n' | '#') => return,
            Some('\r') if self.cursor.peek_nth(1).is_none_or(|c| c == '\n') => return,
            _ => {}
        }

        let line = self.cursor.line();
        let col = self.cursor.column();
        let current = self.current_indent();

        if width > current {
            self.indents.push(width);
            self.queue_layout(TokenKind::Indent, Span::point(line, col));
            return;
        }

        while width < self.current_indent() {
            self.indents.pop();
            self.queue_layout(TokenKind::Dedent, Span::point(line, col));
        }

        if width != self.current_indent() {
            self.errors.push(LexError::InconsistentDedent {
                span: Span::point(line, col),
            });
            // Treat the odd level as a new block so the rest of the file still lexes.
            self.indents.push(width);
        }
    }

    fn current_indent(&self) -> u32 {
        self.indents.last().copied().unwrap_or(0)
    }

    /// Produce the tokens that close the input: a final `Newline`, one
    /// `Dedent` per open block, then `Eof`.
    fn finish(&mut self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        if self.line_has_content {
            self.line_has_content = false;
            return self.layout_token(TokenKind::Newline, span);
        }
        if self.indents.len() > 1 {
            self.indents.pop();
            return self.layout_token(TokenKind::Dedent, span);
        }
        self.layout_token(TokenKind::Eof, span)
    }

    fn queue_layout(&mut self, kind: TokenKind, span: Span) {
        let token = self.layout_token(kind, span);
        self.pending.push_back(token);
    }

    fn layout_token(&self, kind: TokenKind, span: Span) -> Token<'ast> {
        Token::new(kind, self.arena.alloc_str(""), span)
    }

    /// Skip spaces, tabs, carriage returns and comments, stopping at a line break.
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(' ' | '\t' | '\x0c' | '\r') => {
                    self.cursor.advance();
                }
                Some('#') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    /// Scan one token starting at the current position.
    ///
    /// Returns `None` after recording an error for a character that cannot
    /// start any token.
    fn scan_token(&mut self, line: u32, col: u32, offset: u32) -> Option<Token<'ast>> {
        let ch = self.cursor.peek()?;
        let token = match ch {
            '"' | '\'' => self.scan_string(ch, line, col, offset),
            c if c.is_ascii_digit() => self.scan_number(line, col, offset),
            c if is_ident_start(c) => self.scan_identifier(line, col, offset),
            _ => return self.scan_punctuation(ch, line, col, offset),
        };
        Some(token)
    }

    /// Create a token from start position to current position.
    /// Copies the lexeme into the arena.
    fn make_token(&self, kind: TokenKind, line: u32, col: u32, offset: u32) -> Token<'ast> {
        let lexeme = self.cursor.slice_from(offset);
        let span = Span::new(line, col, lexeme.len() as u32);
        Token::new(kind, self.arena.alloc_str(lexeme), span)
    }

    fn scan_identifier(&mut self, line: u32, col: u32, offset: u32) -> Token<'ast> {
        let ident = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(ident).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, line, col, offset)
    }

    /// Scan a decimal integer or float (`12`, `1_000`, `3.5`, `2e10`).
    fn scan_number(&mut self, line: u32, col: u32, offset: u32) -> Token<'ast> {
        let mut kind = TokenKind::IntLiteral;
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            kind = TokenKind::FloatLiteral;
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        }

        if self.cursor.check(|c| c == 'e' || c == 'E') {
            let sign = usize::from(matches!(self.cursor.peek_nth(1), Some('+' | '-')));
            if self.cursor.peek_nth(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                kind = TokenKind::FloatLiteral;
                self.cursor.advance();
                if sign == 1 {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }

        if self.cursor.check(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            let lexeme = self.cursor.slice_from(offset);
            self.errors.push(LexError::InvalidNumber {
                span: Span::new(line, col, lexeme.len() as u32),
                detail: format!("invalid digits in '{lexeme}'"),
            });
        }

        self.make_token(kind, line, col, offset)
    }

    /// Scan a single-line string literal. The lexeme keeps its quotes and
    /// escapes; the parser decodes them.
    fn scan_string(&mut self, quote: char, line: u32, col: u32, offset: u32) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                Some(c) if c == quote => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.check(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                None | Some('\n') => {
                    self.errors.push(LexError::UnterminatedString {
                        span: Span::new(line, col, self.cursor.offset() - offset),
                    });
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        self.make_token(TokenKind::StringLiteral, line, col, offset)
    }

    fn scan_punctuation(&mut self, ch: char, line: u32, col: u32, offset: u32) -> Option<Token<'ast>> {
        self.cursor.advance();
        let kind = match ch {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '=' if self.cursor.eat('=') => TokenKind::Symbol,
            '=' => TokenKind::Equal,
            '(' => {
                self.depth += 1;
                TokenKind::LeftParen
            }
            ')' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RightParen
            }
            '[' => {
                self.depth += 1;
                TokenKind::LeftBracket
            }
            ']' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RightBracket
            }
            '{' => {
                self.depth += 1;
                TokenKind::Symbol
            }
            '}' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::Symbol
            }
            ';' => TokenKind::Symbol,
            '+' | '-' | '*' | '/' | '%' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '@' => {
                // Compound forms: `+=`, `**`, `//`, `->`, `<=`, ...
                if !self.cursor.eat('=') && !self.cursor.eat(ch) && ch == '-' {
                    self.cursor.eat('>');
                }
                TokenKind::Symbol
            }
            _ => {
                self.errors.push(LexError::UnexpectedChar {
                    ch,
                    span: Span::new(line, col, ch.len_utf8() as u32),
                });
                return None;
            }
        };
        Some(self.make_token(kind, line, col, offset))
    }
}

impl<'src, 'ast> Iterator for Lexer<'src, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
