use forge_target::{Abi, Arch};

/// `EI_CLASS`: whether addresses/offsets are 32 or 64 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    pub fn ehdr_size(self) -> u64 {
        match self {
            Bitness::Bits32 => 52,
            Bitness::Bits64 => 64,
        }
    }

    pub fn phdr_size(self) -> u64 {
        match self {
            Bitness::Bits32 => 32,
            Bitness::Bits64 => 56,
        }
    }

    pub fn shdr_size(self) -> u64 {
        match self {
            Bitness::Bits32 => 40,
            Bitness::Bits64 => 64,
        }
    }

    /// `EI_CLASS` value: `ELFCLASS32 = 1`, `ELFCLASS64 = 2`.
    fn ei_class(self) -> u8 {
        match self {
            Bitness::Bits32 => 1,
            Bitness::Bits64 => 2,
        }
    }
}

/// `EI_DATA` / byte order for every multi-byte field in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// `EI_DATA` value: `ELFDATA2LSB = 1`, `ELFDATA2MSB = 2`.
    fn ei_data(self) -> u8 {
        match self {
            Endianness::Little => 1,
            Endianness::Big => 2,
        }
    }
}

/// `e_type`: the ELF file's purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfType {
    Relocatable,
    Executable,
    SharedObject,
}

impl ElfType {
    fn et_value(self) -> u16 {
        match self {
            ElfType::Relocatable => 1,
            ElfType::Executable => 2,
            ElfType::SharedObject => 3,
        }
    }
}

/// `e_machine`, derived from a [`forge_target::Arch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    X86_64,
    AArch64,
}

impl Machine {
    pub fn from_arch(arch: Arch) -> Option<Machine> {
        match arch {
            Arch::X86_64 => Some(Machine::X86_64),
            Arch::AArch64 => Some(Machine::AArch64),
            Arch::None => None,
        }
    }

    fn em_value(self) -> u16 {
        match self {
            Machine::X86_64 => 62,
            Machine::AArch64 => 183,
        }
    }
}

/// `EI_OSABI`, derived from a [`forge_target::Abi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsAbi {
    SystemV,
}

impl OsAbi {
    pub fn from_abi(abi: Abi) -> Option<OsAbi> {
        match abi {
            Abi::SystemV => Some(OsAbi::SystemV),
            Abi::None => None,
        }
    }

    fn ei_osabi(self) -> u8 {
        match self {
            OsAbi::SystemV => 0,
        }
    }
}

/// `sh_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    Null,
    Progbits,
    Symtab,
    Strtab,
    Nobits,
}

impl SectionType {
    fn sh_type_value(self) -> u32 {
        match self {
            SectionType::Null => 0,
            SectionType::Progbits => 1,
            SectionType::Symtab => 2,
            SectionType::Strtab => 3,
            SectionType::Nobits => 8,
        }
    }
}

/// `sh_flags` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionFlags(u64);

impl SectionFlags {
    pub const NONE: SectionFlags = SectionFlags(0);
    pub const WRITE: SectionFlags = SectionFlags(0x1);
    pub const ALLOC: SectionFlags = SectionFlags(0x2);
    pub const EXECUTABLE: SectionFlags = SectionFlags(0x4);
    pub const MERGE: SectionFlags = SectionFlags(0x10);
    pub const STRINGS: SectionFlags = SectionFlags(0x20);

    pub const fn bits(self) -> u64 {
        self.0
    }
}

impl std::ops::BitOr for SectionFlags {
    type Output = SectionFlags;
    fn bitor(self, rhs: SectionFlags) -> SectionFlags {
        SectionFlags(self.0 | rhs.0)
    }
}

pub(crate) trait ByteSink {
    fn put_u8(&mut self, v: u8);
    fn put_u16(&mut self, v: u16, endian: Endianness);
    fn put_u32(&mut self, v: u32, endian: Endianness);
    fn put_u64(&mut self, v: u64, endian: Endianness);
}

impl ByteSink for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }
    fn put_u16(&mut self, v: u16, endian: Endianness) {
        match endian {
            Endianness::Little => self.extend_from_slice(&v.to_le_bytes()),
            Endianness::Big => self.extend_from_slice(&v.to_be_bytes()),
        }
    }
    fn put_u32(&mut self, v: u32, endian: Endianness) {
        match endian {
            Endianness::Little => self.extend_from_slice(&v.to_le_bytes()),
            Endianness::Big => self.extend_from_slice(&v.to_be_bytes()),
        }
    }
    fn put_u64(&mut self, v: u64, endian: Endianness) {
        match endian {
            Endianness::Little => self.extend_from_slice(&v.to_le_bytes()),
            Endianness::Big => self.extend_from_slice(&v.to_be_bytes()),
        }
    }
}

pub(crate) fn ei_class(bitness: Bitness) -> u8 {
    bitness.ei_class()
}

pub(crate) fn ei_data(endian: Endianness) -> u8 {
    endian.ei_data()
}

pub(crate) fn et_value(t: ElfType) -> u16 {
    t.et_value()
}

pub(crate) fn em_value(m: Machine) -> u16 {
    m.em_value()
}

pub(crate) fn osabi_value(a: OsAbi) -> u8 {
    a.ei_osabi()
}

pub(crate) fn sh_type_value(t: SectionType) -> u32 {
    t.sh_type_value()
}
