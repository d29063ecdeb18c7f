use thiserror::Error;

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
