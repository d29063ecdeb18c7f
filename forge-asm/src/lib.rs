//! Target-aware assembly printing from a [`forge_select::LoweredOutput`]:
//! GNU-AS-flavored text, including the minimal ELF CFI and
//! section-type directives a linkable object needs.

mod error;
mod printer;
mod syntax;

pub use error::{AsmError, AsmResult};
pub use printer::{emit_instruction, print, print_cancellable, Outcome};
pub use syntax::{width_suffix, GnuAs, Syntax};
