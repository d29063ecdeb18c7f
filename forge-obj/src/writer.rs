//! The byte-exact ELF writer itself: header, section header table, and
//! an optional program header table, built in one append-then-patch
//! pass. Every multi-byte field is serialized directly in the target's
//! requested endianness — the writer never reads host endianness, so
//! the serialized bytes always match the requested endianness exactly,
//! host byte order notwithstanding.

use crate::error::{ObjError, ObjResult};
use crate::program_header::ProgramHeaderDef;
use crate::section::SectionDef;
use crate::types::{
    ei_class, ei_data, em_value, et_value, osabi_value, sh_type_value, Bitness, ByteSink, ElfType, Endianness,
    Machine, OsAbi, SectionFlags, SectionType,
};
use forge_target::TargetTriple;

/// Drives one ELF file's construction: the fixed, per-file parameters —
/// target machine, ABI, ELF type, bitness, endianness.
pub struct ObjectWriter {
    pub machine: Machine,
    pub osabi: OsAbi,
    pub elf_type: ElfType,
    pub bitness: Bitness,
    pub endian: Endianness,
    pub entry: u64,
}

impl ObjectWriter {
    pub fn new(machine: Machine, osabi: OsAbi, elf_type: ElfType, bitness: Bitness, endian: Endianness) -> Self {
        ObjectWriter { machine, osabi, elf_type, bitness, endian, entry: 0 }
    }

    /// Resolve `machine`/`osabi` from a [`TargetTriple`], erroring if
    /// the triple names an arch/abi this writer has no ELF mapping for.
    pub fn from_triple(triple: TargetTriple, elf_type: ElfType, bitness: Bitness, endian: Endianness) -> ObjResult<Self> {
        let machine = Machine::from_arch(triple.arch)
            .ok_or_else(|| ObjError::writer("triple's architecture has no ELF e_machine mapping"))?;
        let osabi =
            OsAbi::from_abi(triple.abi).ok_or_else(|| ObjError::writer("triple's ABI has no ELF OSABI mapping"))?;
        Ok(ObjectWriter::new(machine, osabi, elf_type, bitness, endian))
    }

    /// Build a complete ELF file: `sections` become the section header
    /// table (plus a synthesized `.shstrtab`); `program_headers` become
    /// the program header table verbatim.
    pub fn write_object(&self, sections: &[SectionDef], program_headers: &[ProgramHeaderDef]) -> ObjResult<Vec<u8>> {
        let bitness = self.bitness;
        let endian = self.endian;
        let ehsize = bitness.ehdr_size();
        let phentsize = bitness.phdr_size();
        let shentsize = bitness.shdr_size();

        if program_headers.len() > u16::MAX as usize {
            return Err(ObjError::writer("more than 65535 program headers"));
        }
        if sections.len() + 2 > u16::MAX as usize {
            return Err(ObjError::writer("more than 65535 sections"));
        }

        let phnum = program_headers.len() as u64;
        let phoff = if phnum > 0 { ehsize } else { 0 };
        let mut offset = ehsize + phnum * phentsize;

        // shstrtab: index 0 is the empty string, required by convention.
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::with_capacity(sections.len());
        for s in sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(s.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name_offset = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab");
        shstrtab.push(0);

        struct Placed {
            sh_offset: u64,
            sh_size: u64,
        }
        let mut placed = Vec::with_capacity(sections.len());
        for s in sections {
            let align = s.align.max(1);
            offset = align_up(offset, align);
            let sh_offset = offset;
            let file_size = s.file_size();
            offset += file_size;
            let sh_size = if s.data.is_some() { file_size } else { s.size };
            placed.push(Placed { sh_offset, sh_size });
        }

        let shstrtab_offset = offset;
        offset += shstrtab.len() as u64;

        let shdr_align = if bitness == Bitness::Bits64 { 8 } else { 4 };
        offset = align_up(offset, shdr_align);
        let shoff = offset;
        let shnum = 1 + sections.len() as u64 + 1; // null + sections + .shstrtab
        let shstrndx = shnum - 1;

        let total_size = shoff + shnum * shentsize;
        let mut buf = vec![0u8; total_size as usize];

        let ehdr = build_ehdr(self, phoff, phnum as u16, shoff, shnum as u16, shstrndx as u16);
        debug_assert_eq!(ehdr.len() as u64, ehsize);
        buf[..ehdr.len()].copy_from_slice(&ehdr);

        for (i, ph) in program_headers.iter().enumerate() {
            let phdr = build_phdr(bitness, endian, ph);
            let pos = (phoff + i as u64 * phentsize) as usize;
            buf[pos..pos + phdr.len()].copy_from_slice(&phdr);
        }

        for (s, p) in sections.iter().zip(placed.iter()) {
            if let Some(bytes) = &s.data {
                let pos = p.sh_offset as usize;
                buf[pos..pos + bytes.len()].copy_from_slice(bytes);
            }
        }
        {
            let pos = shstrtab_offset as usize;
            buf[pos..pos + shstrtab.len()].copy_from_slice(&shstrtab);
        }

        // null section header (index 0) stays all-zero.
        for (i, (s, p)) in sections.iter().zip(placed.iter()).enumerate() {
            let shdr = build_shdr(bitness, endian, name_offsets[i], s.sh_type, s.flags, s.align, p.sh_offset, p.sh_size);
            let pos = (shoff + (1 + i as u64) * shentsize) as usize;
            buf[pos..pos + shdr.len()].copy_from_slice(&shdr);
        }
        {
            let shdr = build_shdr(
                bitness,
                endian,
                shstrtab_name_offset,
                SectionType::Strtab,
                SectionFlags::NONE,
                1,
                shstrtab_offset,
                shstrtab.len() as u64,
            );
            let pos = (shoff + (shnum - 1) * shentsize) as usize;
            buf[pos..pos + shdr.len()].copy_from_slice(&shdr);
        }

        log::debug!(
            "forge-obj: wrote {} bytes, {} sections, {} program headers",
            buf.len(),
            sections.len(),
            program_headers.len()
        );
        Ok(buf)
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    if align <= 1 {
        return value;
    }
    (value + align - 1) / align * align
}

fn build_ehdr(w: &ObjectWriter, phoff: u64, phnum: u16, shoff: u64, shnum: u16, shstrndx: u16) -> Vec<u8> {
    let bitness = w.bitness;
    let endian = w.endian;
    let mut v = Vec::with_capacity(bitness.ehdr_size() as usize);

    v.put_u8(0x7F);
    v.put_u8(b'E');
    v.put_u8(b'L');
    v.put_u8(b'F');
    v.put_u8(ei_class(bitness));
    v.put_u8(ei_data(endian));
    v.put_u8(1); // EI_VERSION
    v.put_u8(osabi_value(w.osabi));
    v.put_u8(0); // EI_ABIVERSION
    v.extend_from_slice(&[0u8; 7]); // EI_PAD

    v.put_u16(et_value(w.elf_type), endian);
    v.put_u16(em_value(w.machine), endian);
    v.put_u32(1, endian); // e_version

    match bitness {
        Bitness::Bits32 => {
            v.put_u32(w.entry as u32, endian);
            v.put_u32(phoff as u32, endian);
            v.put_u32(shoff as u32, endian);
        }
        Bitness::Bits64 => {
            v.put_u64(w.entry, endian);
            v.put_u64(phoff, endian);
            v.put_u64(shoff, endian);
        }
    }

    v.put_u32(0, endian); // e_flags
    v.put_u16(bitness.ehdr_size() as u16, endian);
    v.put_u16(bitness.phdr_size() as u16, endian);
    v.put_u16(phnum, endian);
    v.put_u16(bitness.shdr_size() as u16, endian);
    v.put_u16(shnum, endian);
    v.put_u16(shstrndx, endian);

    v
}

fn build_phdr(bitness: Bitness, endian: Endianness, ph: &ProgramHeaderDef) -> Vec<u8> {
    let mut v = Vec::with_capacity(bitness.phdr_size() as usize);
    match bitness {
        Bitness::Bits32 => {
            v.put_u32(ph.p_type, endian);
            v.put_u32(ph.p_offset as u32, endian);
            v.put_u32(ph.p_vaddr as u32, endian);
            v.put_u32(ph.p_paddr as u32, endian);
            v.put_u32(ph.p_filesz as u32, endian);
            v.put_u32(ph.p_memsz as u32, endian);
            v.put_u32(ph.p_flags, endian);
            v.put_u32(ph.p_align as u32, endian);
        }
        Bitness::Bits64 => {
            v.put_u32(ph.p_type, endian);
            v.put_u32(ph.p_flags, endian);
            v.put_u64(ph.p_offset, endian);
            v.put_u64(ph.p_vaddr, endian);
            v.put_u64(ph.p_paddr, endian);
            v.put_u64(ph.p_filesz, endian);
            v.put_u64(ph.p_memsz, endian);
            v.put_u64(ph.p_align, endian);
        }
    }
    v
}

#[allow(clippy::too_many_arguments)]
fn build_shdr(
    bitness: Bitness,
    endian: Endianness,
    name_offset: u32,
    sh_type: SectionType,
    flags: SectionFlags,
    align: u64,
    sh_offset: u64,
    sh_size: u64,
) -> Vec<u8> {
    let mut v = Vec::with_capacity(bitness.shdr_size() as usize);
    v.put_u32(name_offset, endian);
    v.put_u32(sh_type_value(sh_type), endian);
    match bitness {
        Bitness::Bits32 => {
            v.put_u32(flags.bits() as u32, endian);
            v.put_u32(0, endian); // sh_addr
            v.put_u32(sh_offset as u32, endian);
            v.put_u32(sh_size as u32, endian);
            v.put_u32(0, endian); // sh_link
            v.put_u32(0, endian); // sh_info
            v.put_u32(align.max(1) as u32, endian);
            v.put_u32(0, endian); // sh_entsize
        }
        Bitness::Bits64 => {
            v.put_u64(flags.bits(), endian);
            v.put_u64(0, endian); // sh_addr
            v.put_u64(sh_offset, endian);
            v.put_u64(sh_size, endian);
            v.put_u32(0, endian); // sh_link
            v.put_u32(0, endian); // sh_info
            v.put_u64(align.max(1), endian);
            v.put_u64(0, endian); // sh_entsize
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(bitness: Bitness, endian: Endianness) -> ObjectWriter {
        ObjectWriter::new(Machine::X86_64, OsAbi::SystemV, ElfType::Relocatable, bitness, endian)
    }

    #[test]
    fn header_struct_sizes_match_the_elf_spec_constants() {
        assert_eq!(Bitness::Bits32.ehdr_size(), 52);
        assert_eq!(Bitness::Bits64.ehdr_size(), 64);
        assert_eq!(Bitness::Bits32.phdr_size(), 32);
        assert_eq!(Bitness::Bits64.phdr_size(), 56);
        assert_eq!(Bitness::Bits32.shdr_size(), 40);
        assert_eq!(Bitness::Bits64.shdr_size(), 64);
    }

    #[test]
    fn magic_bytes_and_ident_are_correct() {
        let w = writer(Bitness::Bits64, Endianness::Little);
        let bytes = w.write_object(&[], &[]).unwrap();
        assert_eq!(&bytes[0..4], b"\x7FELF");
        assert_eq!(bytes[4], 2); // ELFCLASS64
        assert_eq!(bytes[5], 1); // ELFDATA2LSB
    }

    #[test]
    fn e_machine_is_big_endian_swapped_bytes() {
        // A 64-bit header requested in big-endian byte order serializes
        // e_machine (62 = 0x3E) as bytes 0x00 0x3E at file offset 18,
        // the reverse of the little-endian byte order; this writer
        // reaches the swapped bytes directly from the endian parameter,
        // since it never reads host endianness.
        let w = writer(Bitness::Bits64, Endianness::Big);
        let bytes = w.write_object(&[], &[]).unwrap();
        assert_eq!(&bytes[18..20], &[0x00, 0x3E]);

        let w_le = writer(Bitness::Bits64, Endianness::Little);
        let bytes_le = w_le.write_object(&[], &[]).unwrap();
        assert_eq!(&bytes_le[18..20], &[0x3E, 0x00]);
    }

    #[test]
    fn section_and_shstrtab_round_trip() {
        let w = writer(Bitness::Bits64, Endianness::Little);
        let sections = vec![crate::section::SectionDef::text(vec![0x90, 0x90, 0xC3])];
        let bytes = w.write_object(&sections, &[]).unwrap();

        // e_shnum at offset 60 (64-bit): null + .text + .shstrtab = 3
        let shnum = u16::from_le_bytes([bytes[60], bytes[61]]);
        assert_eq!(shnum, 3);

        let shoff = u64::from_le_bytes(bytes[40..48].try_into().unwrap());
        let shstrndx = u16::from_le_bytes([bytes[62], bytes[63]]);
        assert_eq!(shstrndx, 2);

        // the .text section header is index 1; read back its sh_offset/sh_size
        let shentsize = 64usize;
        let text_shdr = &bytes[(shoff as usize + shentsize)..(shoff as usize + 2 * shentsize)];
        let sh_offset = u64::from_le_bytes(text_shdr[24..32].try_into().unwrap());
        let sh_size = u64::from_le_bytes(text_shdr[32..40].try_into().unwrap());
        assert_eq!(&bytes[sh_offset as usize..(sh_offset + sh_size) as usize], &[0x90, 0x90, 0xC3]);
    }

    #[test]
    fn bss_section_contributes_no_file_bytes() {
        let w = writer(Bitness::Bits64, Endianness::Little);
        let sections = vec![crate::section::SectionDef::bss(4096)];
        let bytes_with_bss = w.write_object(&sections, &[]).unwrap();

        let empty = w.write_object(&[], &[]).unwrap();
        // only the section header table and shstrtab grow; no 4096-byte
        // allocation appears in the file.
        assert!(bytes_with_bss.len() < empty.len() + 4096);
    }

    #[test]
    fn program_header_table_is_written_bit_exact() {
        let w = writer(Bitness::Bits64, Endianness::Little);
        let ph = ProgramHeaderDef {
            p_type: crate::program_header::PT_LOAD,
            p_flags: crate::program_header::PF_READABLE | crate::program_header::PF_EXECUTABLE,
            p_offset: 0,
            p_vaddr: 0x400000,
            p_paddr: 0x400000,
            p_filesz: 0x100,
            p_memsz: 0x100,
            p_align: 0x1000,
        };
        let bytes = w.write_object(&[], std::slice::from_ref(&ph)).unwrap();

        let phoff = u64::from_le_bytes(bytes[32..40].try_into().unwrap());
        assert_eq!(phoff, 64); // right after a 64-bit header
        let phdr = &bytes[phoff as usize..phoff as usize + 56];
        let p_vaddr = u64::from_le_bytes(phdr[16..24].try_into().unwrap());
        assert_eq!(p_vaddr, 0x400000);
    }
}
