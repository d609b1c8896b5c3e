//! Token types and definitions for the latebind lexer.

use latebind_core::Span;
use std::fmt;

/// A token from the source code.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is allocated,
/// so the source text can be dropped once lexing is done.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token (allocated in arena).
    pub lexeme: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Describe the token for diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier | TokenKind::Symbol => format!("'{}'", self.lexeme),
            kind => kind.description().to_string(),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All possible token types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Integer literal: `42`
    IntLiteral,
    /// Float literal: `3.14`
    FloatLiteral,
    /// String literal: `"hello"`, `'a'`
    StringLiteral,

    /// User-defined identifier
    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Import,
    From,
    As,
    Deferred,
    Class,
    Abstract,
    Field,
    Static,
    PostInit,
    Init,
    Pass,
    True,
    False,
    None,

    // =========================================
    // Punctuation
    // =========================================
    Dot,
    Comma,
    Colon,
    Equal,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    /// Any other operator character; only meaningful inside non-import statements.
    Symbol,

    // =========================================
    // Layout
    // =========================================
    /// End of a logical line.
    Newline,
    /// Indentation increased.
    Indent,
    /// Indentation decreased.
    Dedent,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn description(self) -> &'static str {
        match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Import => "'import'",
            TokenKind::From => "'from'",
            TokenKind::As => "'as'",
            TokenKind::Deferred => "'deferred'",
            TokenKind::Class => "'class'",
            TokenKind::Abstract => "'abstract'",
            TokenKind::Field => "'field'",
            TokenKind::Static => "'static'",
            TokenKind::PostInit => "'post_init'",
            TokenKind::Init => "'init'",
            TokenKind::Pass => "'pass'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::None => "'none'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Equal => "'='",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Symbol => "symbol",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of file",
        }
    }

    /// Whether this token only affects layout.
    pub fn is_layout(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof
        )
    }
}

/// Look up a keyword by its spelling.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "deferred" => TokenKind::Deferred,
        "class" => TokenKind::Class,
        "abstract" => TokenKind::Abstract,
        "field" => TokenKind::Field,
        "static" => TokenKind::Static,
        "post_init" => TokenKind::PostInit,
        "init" => TokenKind::Init,
        "pass" => TokenKind::Pass,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "none" => TokenKind::None,
        _ => return None,
    };
    Some(kind)
}
