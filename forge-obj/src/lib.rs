//! A byte-exact ELF object writer: given a target machine, ABI, ELF
//! type, bitness, and endianness, plus a set of named section blobs
//! (and, optionally, a program header table), produces the file's
//! bytes directly — no intermediate relocatable symbol model, since
//! this crate stops at "emit bytes for these sections" (linking and
//! relocation processing are left to an external driver).

mod error;
mod program_header;
mod section;
mod types;
mod writer;

pub use error::{ObjError, ObjResult};
pub use program_header::{ProgramHeaderDef, PF_EXECUTABLE, PF_READABLE, PF_WRITABLE, PT_DYNAMIC, PT_INTERP, PT_LOAD, PT_NOTE, PT_NULL};
pub use section::SectionDef;
pub use types::{Bitness, ElfType, Endianness, Machine, OsAbi, SectionFlags, SectionType};
pub use writer::ObjectWriter;
