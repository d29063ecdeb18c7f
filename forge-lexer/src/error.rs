use thiserror::Error;

/// A lexer failure, carrying enough context to be printed as one
/// diagnostic line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{line}: {what}")]
pub struct LexError {
    pub line: usize,
    pub what: String,
}

impl LexError {
    pub fn new(line: usize, what: impl Into<String>) -> Self {
        LexError { line, what: what.into() }
    }
}

pub type LexResult<T> = Result<T, LexError>;
