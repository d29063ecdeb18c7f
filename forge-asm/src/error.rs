use thiserror::Error;

/// A writer invariant violation while printing assembly: a format
/// string with a mismatched formatee count, a lowered function with no
/// matching original function, and so on.
/// Fatal: the caller aborts the current output rather than emitting a
/// partial, inconsistent file.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("{0}")]
    Writer(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AsmError {
    pub fn writer(what: impl Into<String>) -> Self {
        AsmError::Writer(what.into())
    }
}

pub type AsmResult<T> = Result<T, AsmError>;
