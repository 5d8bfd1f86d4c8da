use super::ident::Class;
use crate::error::ParseResult;
use crate::source::ByteSource;
use byteorder::{ReadBytesExt, LE};
use goblin::elf::header::{ET_DYN, ET_EXEC, SIZEOF_IDENT};
use std::io::{Cursor, Read, Seek};

/// The ELF primary header that follows the identification block.
///
/// ELF32 and ELF64 share field order and count; only `e_entry`, `e_phoff` and
/// `e_shoff` change width. Those are widened to `u64` here so callers never
/// branch on the class again.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    /// Object file type (`ET_REL`, `ET_EXEC`, `ET_DYN`, ...).
    pub e_type: u16,

    /// Target architecture (e.g. `EM_X86_64` = 62).
    pub e_machine: u16,

    /// Object file version, normally `EV_CURRENT`.
    pub e_version: u32,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this header, identification block included.
    pub e_ehsize: u16,

    pub e_phentsize: u16,
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    pub e_shnum: u16,

    /// Index of the section header string table.
    ///
    /// That section holds the names of all other sections.
    pub e_shstrndx: u16,
}

impl ElfHeader {
    /// Decodes the header from the current position, which must be just past
    /// the identification block.
    ///
    /// Exactly `class.header_size() - 16` bytes are consumed; a short read is
    /// an I/O failure. No semantic validation happens here.
    pub fn parse<R: Read + Seek>(src: &mut ByteSource<R>, class: Class) -> ParseResult<Self> {
        let raw = src.read_exact(class.header_size() - SIZEOF_IDENT)?;
        let mut cur = Cursor::new(raw.as_slice());
        let word = class.word_reader();

        Ok(ElfHeader {
            e_type: cur.read_u16::<LE>()?,
            e_machine: cur.read_u16::<LE>()?,
            e_version: cur.read_u32::<LE>()?,
            e_entry: word(&mut cur)?,
            e_phoff: word(&mut cur)?,
            e_shoff: word(&mut cur)?,
            e_flags: cur.read_u32::<LE>()?,
            e_ehsize: cur.read_u16::<LE>()?,
            e_phentsize: cur.read_u16::<LE>()?,
            e_phnum: cur.read_u16::<LE>()?,
            e_shentsize: cur.read_u16::<LE>()?,
            e_shnum: cur.read_u16::<LE>()?,
            e_shstrndx: cur.read_u16::<LE>()?,
        })
    }

    pub fn entry_point(&self) -> u64 {
        self.e_entry
    }

    pub fn is_executable(&self) -> bool {
        self.e_type == ET_EXEC
    }

    pub fn is_shared_object(&self) -> bool {
        self.e_type == ET_DYN
    }

    /// Human-readable object type, e.g. "DYN".
    pub fn type_name(&self) -> &'static str {
        goblin::elf::header::et_to_str(self.e_type)
    }
}
