//! Error types for every stage of the pipeline.
//!
//! Parsing and compiling never partially succeed: a statement either yields one
//! [`Term`](crate::term::Term) / [`Filter`](crate::filter::Filter) or one of the
//! errors below.

use std::fmt;

use thiserror::Error;

/// Line/column location inside the query text (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Where a token was being interpreted when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denotation {
    /// No left operand (prefix or standalone position).
    Prefix,
    /// After a left operand (infix or postfix position).
    Infix,
}

impl fmt::Display for Denotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denotation::Prefix => f.write_str("prefix"),
            Denotation::Infix => f.write_str("operator"),
        }
    }
}

/// Lexical, structural and configuration errors raised while parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("unterminated string literal starting at {0}")]
    UnterminatedString(Position),

    #[error("invalid escape sequence '\\{ch}' at {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("invalid numeric literal '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },

    #[error("unbalanced '{delimiter}' at {position}")]
    UnbalancedNesting { delimiter: char, position: Position },

    #[error("unknown token '{token}' at {position}")]
    UnknownToken { token: String, position: Position },

    /// A nesting character reached the scanner without a registered token.
    /// This is a missing registration, not bad input.
    #[error("no token registered for nesting character '{0}'")]
    UnknownNesting(String),

    #[error("unexpected {kind} '{token}' in {denotation} position")]
    Unexpected {
        kind: &'static str,
        token: String,
        denotation: Denotation,
    },

    #[error("unfulfilled expectation: expected '{expected}' but found '{found}'")]
    Expected { expected: String, found: String },

    #[error("unterminated list: expected '{0}'")]
    UnterminatedList(String),

    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),
}

impl ParseError {
    /// True when the error points at a broken language configuration rather
    /// than at the query text.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ParseError::UnknownNesting(_))
    }
}

/// Errors raised while turning a term tree into filters and extractors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("cannot build filter from unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Filter not specified: expression compiled to {0}")]
    FilterNotSpecified(&'static str),

    #[error("expression does not produce a value extractor: {0}")]
    ExtractorNotSpecified(&'static str),

    #[error("no extractor for property path '{0}'")]
    UnresolvedProperty(String),

    #[error("unbound variable {0}")]
    UnboundVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("unknown type '{0}' in new expression")]
    UnknownType(String),

    #[error("unknown statement '{0}'")]
    UnknownStatement(String),

    #[error("operator '{operator}' {reason}")]
    InvalidOperand {
        operator: String,
        reason: String,
    },

    #[error("unary minus requires a numeric literal, found {0}")]
    NonNumericNegation(String),

    #[error("numeric overflow negating {0}")]
    NegationOverflow(String),

    #[error("malformed term: {0}")]
    MalformedTerm(String),
}

impl CompileError {
    pub fn invalid_operand(operator: &str, reason: impl Into<String>) -> Self {
        CompileError::InvalidOperand {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while executing a prepared statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("cache '{0}' does not exist")]
    NoSuchCache(String),

    #[error("cache '{0}' already exists")]
    CacheExists(String),

    #[error("cannot read script '{path}': {reason}")]
    Source { path: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

/// Umbrella error for callers that go from text to results in one step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}
