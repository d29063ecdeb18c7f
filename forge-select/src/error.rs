use thiserror::Error;

/// A per-function lowering failure: recoverable, the pipeline
/// continues lowering other functions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{function_name}: {what}")]
pub struct LoweringError {
    pub function_name: String,
    pub what: String,
}

impl LoweringError {
    pub fn new(function_name: impl Into<String>, what: impl Into<String>) -> Self {
        LoweringError { function_name: function_name.into(), what: what.into() }
    }
}
