//! Target triples and the in-memory target model generated from a
//! parsed target description, built directly in memory rather than
//! emitted as generated source.

mod error;
mod model;
mod triple;

pub use error::{ModelError, ModelResult};
pub use model::{build, DataEntry, DataField, Instruction, Register, RegisterClass, ResolvedFormat, ResolvedFormatee, TargetModel};
pub use triple::{Abi, Arch, Env, FileFormat, TargetTriple};
