#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    AArch64,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Unknown,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Env {
    Gnu,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Elf,
    MachO,
    Coff,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    SystemV,
    None,
}

/// A parsed `<arch>-<os>-<env>` triple, with `file_format` and `abi`
/// derived from `arch`/`os`/`env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetTriple {
    pub arch: Arch,
    pub os: Os,
    pub env: Env,
    pub file_format: FileFormat,
    pub abi: Abi,
}

impl TargetTriple {
    pub fn new(arch: Arch, os: Os, env: Env) -> Self {
        let file_format = match os {
            Os::Linux | Os::Unknown => FileFormat::Elf,
            Os::None => FileFormat::None,
        };
        let abi = match (arch, os) {
            (Arch::X86_64, Os::Linux | Os::Unknown) => Abi::SystemV,
            _ => Abi::None,
        };
        TargetTriple { arch, os, env, file_format, abi }
    }

    /// `true` iff `arch`, `os`, and `abi` are all non-`None`.
    pub fn is_valid(&self) -> bool {
        self.arch != Arch::None && self.os != Os::None && self.abi != Abi::None
    }

    /// Parse `<arch>-<os>-<env>`. Empty components map to `None`;
    /// unrecognized non-empty components also map to `None` rather
    /// than erroring, since the triple tables here have no
    /// "unrecognized" case to report.
    pub fn parse(s: &str) -> TargetTriple {
        let mut parts = s.splitn(3, '-');
        let arch = parts.next().unwrap_or("");
        let os = parts.next().unwrap_or("");
        let env = parts.next().unwrap_or("");

        let arch = match arch {
            "x86_64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::AArch64,
            _ => Arch::None,
        };
        let os = match os {
            "linux" => Os::Linux,
            "unknown" => Os::Unknown,
            _ => Os::None,
        };
        let env = match env {
            "gnu" => Env::Gnu,
            _ => Env::None,
        };
        TargetTriple::new(arch, os, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_triple_parses_as_valid() {
        let t = TargetTriple::parse("x86_64-linux-gnu");
        assert_eq!(t.arch, Arch::X86_64);
        assert_eq!(t.os, Os::Linux);
        assert_eq!(t.env, Env::Gnu);
        assert_eq!(t.file_format, FileFormat::Elf);
        assert_eq!(t.abi, Abi::SystemV);
        assert!(t.is_valid());
    }

    #[test]
    fn sparse_triple_parses_as_invalid() {
        let t = TargetTriple::parse("aarch64--");
        assert_eq!(t.arch, Arch::AArch64);
        assert_eq!(t.os, Os::None);
        assert_eq!(t.env, Env::None);
        assert_eq!(t.file_format, FileFormat::None);
        assert_eq!(t.abi, Abi::None);
        assert!(!t.is_valid());
    }
}
