//! Unified error types for latebind.
//!
//! ## Error Hierarchy
//!
//! ```text
//! LatebindError (top-level wrapper)
//! ├── ParseErrors       - parser errors (with ParseErrorKind)
//! │   └── LexError      - tokenization errors, reported as parse errors
//! ├── DeferredError     - deferred block extraction, validation and resolution
//! ├── RegistrationError - registry and substitution conflicts
//! ├── DispatchError     - instantiation of placeholders
//! ├── InstanceError     - allocation / initializer failures of concrete types
//! └── HostError         - module loading and evaluation in the host runtime
//! ```
//!
//! None of these are recoverable locally: each one points at a structural or
//! ordering defect in the caller's module graph and aborts the offending
//! import, declaration or instantiation.

use std::path::PathBuf;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not properly terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A dedent does not return to any enclosing indentation level.
    #[error("unindent does not match any outer indentation level at {span}")]
    InconsistentDedent { span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::InconsistentDedent { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// An expression was expected.
    ExpectedExpression,
    /// An indented block was expected.
    ExpectedBlock,
    /// A literal could not be interpreted.
    InvalidLiteral,
    /// The lexer rejected the input.
    InvalidSyntax,
}

impl ParseErrorKind {
    /// Get a human-readable description of this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedBlock => "expected indented block",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::InvalidSyntax => "invalid syntax",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// The same error moved down by `lines` lines.
    pub fn shifted(mut self, lines: u32) -> Self {
        self.span = self.span.shifted(lines);
        self
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::InvalidSyntax, err.span(), err.to_string())
    }
}

/// A collection of parse errors.
///
/// The parser recovers at line boundaries so several errors can be reported
/// at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }

    /// Move every error down by `lines` lines.
    pub fn shifted(self, lines: u32) -> Self {
        Self {
            errors: self.errors.into_iter().map(|e| e.shifted(lines)).collect(),
        }
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Deferred Block Errors
// ============================================================================

/// Errors raised while turning a deferred block into bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    /// The block contains statements other than imports.
    #[error(
        "non-import statement(s) in deferred block: {}:{}",
        file.display(),
        lines.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
    )]
    NonImportStatement { file: PathBuf, lines: Vec<u32> },

    /// An import could not be resolved to any module.
    #[error("could not find module spec for [{name}] within [{within}]")]
    SpecNotFound { name: String, within: String },

    /// A dotted imported name crosses a module boundary.
    #[error("unexpected dot in imported name [{name}] in {module}: [{submodule}] is a module")]
    UnexpectedNestedName {
        name: String,
        module: String,
        submodule: String,
    },

    /// The source file could not be read.
    #[error("cannot read {}: {message}", file.display())]
    Io { file: PathBuf, message: String },

    /// The encoding marker names an encoding that is not supported.
    #[error("unsupported source encoding '{encoding}' in {}", file.display())]
    UnsupportedEncoding { file: PathBuf, encoding: String },

    /// The file content is not valid in its declared encoding.
    #[error("{} is not valid {encoding}", file.display())]
    Decode { file: PathBuf, encoding: String },

    /// The block text does not parse.
    #[error("cannot parse deferred block in {}: {errors}", file.display())]
    Parse { file: PathBuf, errors: ParseErrors },
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised by the registry and the class substitution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A second concrete type claimed an already implemented placeholder.
    #[error("type {name} is already registered with {existing}, cannot register {new}")]
    AlreadyRegistered {
        name: String,
        existing: String,
        new: String,
    },

    /// A path segment exists but with the other kind (module vs type).
    #[error("{name} is a {found}, expected a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A qualified name with empty segments.
    #[error("invalid qualified name: '{0}'")]
    InvalidName(String),
}

// ============================================================================
// Instance / Dispatch Errors
// ============================================================================

/// Failures of a concrete type's allocation or initializer step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("cannot instantiate abstract type {0}")]
    Abstract(String),

    #[error("takes {expected} argument(s) but {got} were given")]
    TooManyArguments { expected: usize, got: usize },

    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    #[error("multiple values for argument '{0}'")]
    DuplicateArgument(String),

    #[error("{0}")]
    Custom(String),
}

/// Errors raised when constructing through a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No concrete implementation was recorded for the placeholder.
    #[error(
        "type {name} was not registered; the module declaring it must be imported \
         (directly or transitively), e.g. in the entry module: {entry}"
    )]
    NotRegistered { name: String, entry: String },

    /// The concrete allocation step failed.
    #[error("could not instantiate {placeholder} with registered type {concrete}: {source}")]
    SubstitutionFailed {
        placeholder: String,
        concrete: String,
        #[source]
        source: InstanceError,
    },

    /// The concrete initializer rejected the constructor arguments.
    #[error("{concrete}() {source}")]
    Initializer {
        concrete: String,
        #[source]
        source: InstanceError,
    },

    /// The post-init hook failed on a fully initialized instance.
    #[error("post-init of {concrete} failed: {source}")]
    PostInit {
        concrete: String,
        #[source]
        source: InstanceError,
    },
}

// ============================================================================
// Host Errors
// ============================================================================

/// Errors raised by the host runtime while loading modules and evaluating members.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no module named '{0}'")]
    ModuleNotFound(String),

    #[error("cannot read {}: {message}", file.display())]
    Io { file: PathBuf, message: String },

    #[error("cannot parse {}: {errors}", file.display())]
    Parse { file: PathBuf, errors: ParseErrors },

    /// Eager import of a name the partially initialised module has not bound yet.
    #[error(
        "cannot import name '{name}' from partially initialized module '{module}' \
         (most likely due to a circular import)"
    )]
    PartiallyInitialized { module: String, name: String },

    #[error("name '{name}' is not defined in module '{module}'")]
    UnknownName { module: String, name: String },

    #[error("{what} is not supported at {}:{line}", file.display())]
    UnsupportedStatement {
        file: PathBuf,
        line: u32,
        what: &'static str,
    },

    #[error("'{owner}' has no attribute '{name}'")]
    UnknownAttribute { owner: String, name: String },

    #[error("'{0}' is not a type")]
    NotAType(String),

    /// A path names a module, namespace or type where a value is needed.
    #[error("'{0}' is not a value")]
    NotAValue(String),

    /// Member evaluation nested too deeply (a field reading itself).
    #[error("maximum member evaluation depth exceeded while evaluating '{0}'")]
    RecursionLimit(String),

    /// A `post_init` member evaluated to something holding the instance itself.
    #[error("post-init member '{0}' cannot store a reference to its own instance")]
    PostInitSelfReference(String),
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Top-level error type for all latebind operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatebindError {
    #[error(transparent)]
    Parse(#[from] ParseErrors),

    #[error(transparent)]
    Deferred(#[from] DeferredError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl LatebindError {
    pub fn is_deferred(&self) -> bool {
        matches!(self, LatebindError::Deferred(_))
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, LatebindError::Registration(_))
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self, LatebindError::Dispatch(_))
    }

    pub fn is_host(&self) -> bool {
        matches!(self, LatebindError::Host(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
