use thiserror::Error;

/// A model-consistency failure: a type request that can't be satisfied,
/// an instruction referencing a value from another function, and so on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{what}")]
pub struct ModelError {
    pub what: String,
}

impl ModelError {
    pub fn new(what: impl Into<String>) -> Self {
        ModelError { what: what.into() }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A syntactic failure while parsing IR source text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{line}: {what}")]
pub struct ParseError {
    pub line: usize,
    pub what: String,
}

impl ParseError {
    pub fn new(line: usize, what: impl Into<String>) -> Self {
        ParseError { line, what: what.into() }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum IrError {
    #[error(transparent)]
    Lex(#[from] forge_lexer::LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Model(#[from] ModelError),
}
