//! Facade crate: the library surface a driver links against instead of
//! depending on each of the `forge-*` crates directly. Re-exports the
//! pieces a typical driver needs and wires the TDL-parse /
//! target-model-build / IR-parse / lowering / assembly-printing stages
//! into the two entry points in [`pipeline`].

mod cancel;
mod config;
mod error;
mod lexing;
mod pipeline;

pub use cancel::CancellationToken;
pub use config::PipelineOptions;
pub use error::{CompileError, CompileResult};
pub use lexing::lex_source;
pub use pipeline::{compile_to_assembly, gnu_as_syntax, write_object, AssemblyOutput};

// Re-exported so a driver can name target triples, build target models,
// and assemble section/program-header tables without adding the
// sub-crates to its own Cargo.toml.
pub use forge_asm::Outcome;
pub use forge_obj::{Bitness, ElfType, Endianness, Machine, ObjectWriter, OsAbi, ProgramHeaderDef, SectionDef};
pub use forge_select::LoweringError;
pub use forge_target::{Abi, Arch, Env, FileFormat, TargetModel, TargetTriple};
