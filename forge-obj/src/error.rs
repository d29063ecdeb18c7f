use thiserror::Error;

/// A layout invariant violated while building an ELF file: a section
/// size overflows the file offset type, a program header references
/// an alignment that is not a power of two, and so on. Fatal: the
/// caller aborts the current output.
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("{0}")]
    Writer(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ObjError {
    pub fn writer(what: impl Into<String>) -> Self {
        ObjError::Writer(what.into())
    }
}

pub type ObjResult<T> = Result<T, ObjError>;
