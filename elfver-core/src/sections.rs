use crate::error::{ParseError, ParseResult};
use crate::header::{Class, ElfHeader};
use crate::source::{table_offset, ByteSource};
use byteorder::{ReadBytesExt, LE};
use std::io::{Cursor, Read, Seek};

/// One entry of the section header table, widened to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset of the name in the section header string table.
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl SectionHeader {
    /// Decodes one entry at the current position using the layout for `class`.
    pub fn parse<R: Read + Seek>(src: &mut ByteSource<R>, class: Class) -> ParseResult<Self> {
        let raw = src.read_exact(class.section_entry_size())?;
        let mut cur = Cursor::new(raw.as_slice());
        let word = class.word_reader();

        Ok(SectionHeader {
            sh_name: cur.read_u32::<LE>()?,
            sh_type: cur.read_u32::<LE>()?,
            sh_flags: word(&mut cur)?,
            sh_addr: word(&mut cur)?,
            sh_offset: word(&mut cur)?,
            sh_size: word(&mut cur)?,
            sh_link: cur.read_u32::<LE>()?,
            sh_info: cur.read_u32::<LE>()?,
            sh_addralign: word(&mut cur)?,
            sh_entsize: word(&mut cur)?,
        })
    }

    /// e.g. "PROGBITS", "STRTAB".
    pub fn type_name(&self) -> &'static str {
        let name = goblin::elf::section_header::sht_to_str(self.sh_type);
        name.strip_prefix("SHT_").unwrap_or(name)
    }

    /// Reads exactly the bytes this section occupies in the file.
    ///
    /// Fails with an I/O error when `sh_offset + sh_size` runs past the end of
    /// the file; nothing is allocated in that case.
    pub fn read_region<R: Read + Seek>(&self, src: &mut ByteSource<R>) -> ParseResult<Vec<u8>> {
        src.read_range("section", self.sh_offset, self.sh_size)
    }
}

/// Raw bytes of a string table section.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    data: Vec<u8>,
}

impl StringTable {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes from `offset` up to the next NUL (or the end of the table).
    ///
    /// Offsets past the end resolve to an empty name.
    pub fn get_at(&self, offset: u32) -> &[u8] {
        let Some(tail) = self.data.get(offset as usize..) else {
            return &[];
        };
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        &tail[..end]
    }

    pub fn name_lossy(&self, offset: u32) -> String {
        String::from_utf8_lossy(self.get_at(offset)).into_owned()
    }
}

/// Walks the section header table of an already validated image.
pub struct SectionLocator<'a, R> {
    src: &'a mut ByteSource<R>,
    header: &'a ElfHeader,
    class: Class,
}

impl<'a, R: Read + Seek> SectionLocator<'a, R> {
    pub fn new(src: &'a mut ByteSource<R>, header: &'a ElfHeader, class: Class) -> Self {
        Self { src, header, class }
    }

    /// Parses entry `index` of the section header table.
    pub fn section_at(&mut self, index: u16) -> ParseResult<SectionHeader> {
        let offset = table_offset(
            "section header",
            self.header.e_shoff,
            u64::from(index),
            u64::from(self.header.e_shentsize),
            self.src.len(),
        )?;
        self.src.seek(offset)?;
        SectionHeader::parse(self.src, self.class)
    }

    /// Loads the section header string table named by `e_shstrndx`.
    pub fn string_table(&mut self) -> ParseResult<StringTable> {
        let shstr = self.section_at(self.header.e_shstrndx)?;
        let data = self
            .src
            .read_range("string table", shstr.sh_offset, shstr.sh_size)?;
        log::debug!(
            "Loaded string table: {} bytes at {:#x}",
            data.len(),
            shstr.sh_offset
        );
        Ok(StringTable::new(data))
    }

    /// Returns the lowest-indexed section whose name equals `name`.
    ///
    /// Every one of the `e_shnum` entries is parsed until a match is found;
    /// a miss therefore visits the whole table.
    pub fn find_by_name(&mut self, name: &str) -> ParseResult<SectionHeader> {
        let strtab = self.string_table()?;

        for index in 0..self.header.e_shnum {
            let sh = self.section_at(index)?;
            if strtab.get_at(sh.sh_name) == name.as_bytes() {
                log::debug!(
                    "Found {name} at index {index}: offset {:#x}, size {:#x}",
                    sh.sh_offset,
                    sh.sh_size
                );
                return Ok(sh);
            }
        }

        Err(ParseError::SectionNotFound(name.to_string()))
    }
}
