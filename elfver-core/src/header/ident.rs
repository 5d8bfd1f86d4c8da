use crate::error::{ParseError, ParseResult};
use crate::source::ByteSource;
use byteorder::{ReadBytesExt, LE};
use goblin::elf::header::{
    EI_ABIVERSION, EI_CLASS, EI_DATA, EI_OSABI, EI_VERSION, ELFCLASS32, ELFCLASS64, ELFDATA2LSB,
    ELFDATA2MSB, ELFMAG, EV_CURRENT, SELFMAG, SIZEOF_IDENT,
};
use std::io::{self, Cursor, Read, Seek};

/// Address width of the image, chosen once from `EI_CLASS`.
///
/// Every width-dependent layout (primary header, section header) is keyed off
/// this value instead of re-inspecting the raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            ELFCLASS32 => Some(Class::Elf32),
            ELFCLASS64 => Some(Class::Elf64),
            _ => None,
        }
    }

    pub fn is_64(self) -> bool {
        self == Class::Elf64
    }

    /// Size of the primary header including the identification block.
    pub fn header_size(self) -> usize {
        match self {
            Class::Elf32 => goblin::elf32::header::SIZEOF_EHDR,
            Class::Elf64 => goblin::elf64::header::SIZEOF_EHDR,
        }
    }

    /// Size of one section-header-table entry.
    pub fn section_entry_size(self) -> usize {
        match self {
            Class::Elf32 => goblin::elf32::section_header::SIZEOF_SHDR,
            Class::Elf64 => goblin::elf64::section_header::SIZEOF_SHDR,
        }
    }

    /// Decoder for address/offset/size fields: 4 bytes for ELF32, 8 for ELF64.
    ///
    /// Callers fetch it once per record and apply it to every wide field.
    pub(crate) fn word_reader(self) -> WordReader {
        match self {
            Class::Elf32 => read_word32,
            Class::Elf64 => read_word64,
        }
    }
}

pub(crate) type WordReader = fn(&mut Cursor<&[u8]>) -> io::Result<u64>;

fn read_word32(cur: &mut Cursor<&[u8]>) -> io::Result<u64> {
    cur.read_u32::<LE>().map(u64::from)
}

fn read_word64(cur: &mut Cursor<&[u8]>) -> io::Result<u64> {
    cur.read_u64::<LE>()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            ELFDATA2LSB => Some(Endianness::Little),
            ELFDATA2MSB => Some(Endianness::Big),
            _ => None,
        }
    }
}

/// The 16-byte `e_ident` prologue, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    pub magic: [u8; SELFMAG],
    pub class: Class,
    pub endianness: Endianness,
    pub version: u8,
    pub os_abi: u8,
    pub abi_version: u8,
}

impl Ident {
    /// Reads and validates the identification block at the current position.
    ///
    /// Checks run in a fixed order (length, magic, class, byte order,
    /// big-endian, version) and the first violation wins.
    pub fn parse<R: Read + Seek>(src: &mut ByteSource<R>) -> ParseResult<Self> {
        let raw = src.read_up_to(SIZEOF_IDENT)?;
        if raw.len() < SIZEOF_IDENT {
            return Err(ParseError::TruncatedIdent(raw.len()));
        }

        let mut magic = [0u8; SELFMAG];
        magic.copy_from_slice(&raw[..SELFMAG]);
        if &magic != ELFMAG {
            return Err(ParseError::InvalidMagic(magic));
        }

        let class =
            Class::from_raw(raw[EI_CLASS]).ok_or(ParseError::InvalidClass(raw[EI_CLASS]))?;
        let endianness = Endianness::from_raw(raw[EI_DATA])
            .ok_or(ParseError::InvalidEndianness(raw[EI_DATA]))?;
        if endianness == Endianness::Big {
            return Err(ParseError::BigEndian);
        }

        let version = raw[EI_VERSION];
        if version != EV_CURRENT {
            return Err(ParseError::UnsupportedVersion(version));
        }

        Ok(Ident {
            magic,
            class,
            endianness,
            version,
            os_abi: raw[EI_OSABI],
            abi_version: raw[EI_ABIVERSION],
        })
    }
}
