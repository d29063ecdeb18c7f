//! Register/immediate rendering rules, factored out of the per-function
//! printing logic so an alternative assembler syntax can be added
//! without touching `printer.rs`.

use forge_target::{Arch, FileFormat};

/// How a concrete syntax renders the operand kinds a lowered
/// instruction can carry. GNU AS is the only implementation shipped
/// here; the trait exists so Intel/MASM-style syntaxes have somewhere
/// to attach later.
pub trait Syntax {
    /// Text written once before any function, or `None` if this syntax
    /// has no section prologue. GNU AS emits `.text` once, before all
    /// functions.
    fn section_prologue(&self, file_format: FileFormat) -> Option<&'static str>;

    /// Render a bare register name as this syntax's operand text.
    fn register(&self, name: &str) -> String;

    /// Render a signed immediate value as this syntax's operand text.
    fn immediate(&self, value: i64) -> String;
}

/// GNU Assembler syntax: `%reg` register prefix, `$imm` immediate
/// prefix on x86_64; bare lowercase register names and `#imm` on
/// AArch64.
pub struct GnuAs {
    pub arch: Arch,
}

impl GnuAs {
    pub fn new(arch: Arch) -> Self {
        GnuAs { arch }
    }
}

impl Syntax for GnuAs {
    fn section_prologue(&self, file_format: FileFormat) -> Option<&'static str> {
        match file_format {
            FileFormat::Elf => Some("\t.text\n"),
            _ => None,
        }
    }

    fn register(&self, name: &str) -> String {
        match self.arch {
            Arch::X86_64 => format!("%{}", name.to_ascii_lowercase()),
            _ => name.to_ascii_lowercase(),
        }
    }

    fn immediate(&self, value: i64) -> String {
        match self.arch {
            Arch::X86_64 => format!("${value}"),
            _ => format!("#{value}"),
        }
    }
}

/// GNU AS width suffix (`b`/`w`/`l`/`q`) for a register or memory
/// operand of the given width, for callers that want to append one to
/// a mnemonic. TDL format strings carry their own literal mnemonic text,
/// so the core does not apply this automatically; it is exposed for a
/// target description that wants to compute one.
pub fn width_suffix(width_bits: u32) -> Option<char> {
    match width_bits {
        8 => Some('b'),
        16 => Some('w'),
        32 => Some('l'),
        64 => Some('q'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x86_register_gets_percent_prefix() {
        let syntax = GnuAs::new(Arch::X86_64);
        assert_eq!(syntax.register("RAX"), "%rax");
    }

    #[test]
    fn aarch64_register_has_no_prefix() {
        let syntax = GnuAs::new(Arch::AArch64);
        assert_eq!(syntax.register("X0"), "x0");
    }

    #[test]
    fn x86_immediate_gets_dollar_prefix() {
        let syntax = GnuAs::new(Arch::X86_64);
        assert_eq!(syntax.immediate(-1), "$-1");
    }

    #[test]
    fn width_suffix_table() {
        assert_eq!(width_suffix(8), Some('b'));
        assert_eq!(width_suffix(16), Some('w'));
        assert_eq!(width_suffix(32), Some('l'));
        assert_eq!(width_suffix(64), Some('q'));
        assert_eq!(width_suffix(128), None);
    }
}
