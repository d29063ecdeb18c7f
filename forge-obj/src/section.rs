use crate::types::{SectionFlags, SectionType};

/// A named blob destined for the section header table, carrying its
/// own type, flags, and alignment. `data: None` means a `SHT_NOBITS`
/// section (`.bss`): it occupies no file space but `size` bytes of
/// virtual memory.
#[derive(Debug, Clone)]
pub struct SectionDef {
    pub name: String,
    pub sh_type: SectionType,
    pub flags: SectionFlags,
    pub align: u64,
    pub data: Option<Vec<u8>>,
    pub size: u64,
}

impl SectionDef {
    /// `.text = ALLOC|EXEC`.
    pub fn text(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        SectionDef {
            name: ".text".to_string(),
            sh_type: SectionType::Progbits,
            flags: SectionFlags::ALLOC | SectionFlags::EXECUTABLE,
            align: 16,
            data: Some(data),
            size,
        }
    }

    /// `.data = ALLOC|WRITE`.
    pub fn data(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        SectionDef {
            name: ".data".to_string(),
            sh_type: SectionType::Progbits,
            flags: SectionFlags::ALLOC | SectionFlags::WRITE,
            align: 8,
            data: Some(data),
            size,
        }
    }

    /// `.rodata = ALLOC|STRINGS`.
    pub fn rodata(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        SectionDef {
            name: ".rodata".to_string(),
            sh_type: SectionType::Progbits,
            flags: SectionFlags::ALLOC | SectionFlags::STRINGS,
            align: 1,
            data: Some(data),
            size,
        }
    }

    /// `.bss = ALLOC|WRITE` as `NOBITS`: `size` bytes of
    /// zero-initialized memory, contributing nothing to file size.
    pub fn bss(size: u64) -> Self {
        SectionDef {
            name: ".bss".to_string(),
            sh_type: SectionType::Nobits,
            flags: SectionFlags::ALLOC | SectionFlags::WRITE,
            align: 8,
            data: None,
            size,
        }
    }

    pub fn file_size(&self) -> u64 {
        match &self.data {
            Some(bytes) => bytes.len() as u64,
            None => 0,
        }
    }
}
