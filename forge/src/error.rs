use thiserror::Error;

/// The umbrella error the facade returns, unifying every subsystem's own
/// precise error enum behind one type a driver can match on or just
/// print as a single diagnostic line.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("target description: {0}")]
    Tdl(#[from] forge_tdl::ParseError),
    #[error("target model: {0}")]
    Model(#[from] forge_target::ModelError),
    #[error("IR: {0}")]
    Ir(#[from] forge_ir::ParseError),
    #[error("assembly output: {0}")]
    Asm(#[from] forge_asm::AsmError),
    #[error("object output: {0}")]
    Obj(#[from] forge_obj::ObjError),
}

pub type CompileResult<T> = Result<T, CompileError>;
