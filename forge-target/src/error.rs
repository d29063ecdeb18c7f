use thiserror::Error;

/// A target-model validation failure: an unknown register class, a
/// dangling `result`/`clobber` reference, too many clobbers.
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
