//! Parser for the target description language: source text in, a
//! [`TargetOutput`] AST out. The AST is consumed by `forge-target` to
//! build an in-memory target model.

mod ast;
mod error;
mod parser;

pub use ast::{
    DataDecl, DataFieldDecl, Endian, FormatSpec, Formatee, InstrDecl, OperandKind, RegisterDecl,
    TargetOutput,
};
pub use error::ParseError;
pub use parser::parse;
