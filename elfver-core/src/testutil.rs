//! In-memory ELF images and helpers shared by the unit tests.

use crate::header::Class;
use byteorder::{WriteBytesExt, LE};
use goblin::elf::header::{ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFMAG, ET_DYN, EV_CURRENT};
use goblin::elf::section_header::{SHF_ALLOC, SHT_PROGBITS, SHT_STRTAB};
use std::cell::Cell;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::rc::Rc;
use tempfile::NamedTempFile;

struct FixtureSection {
    name: String,
    data: Vec<u8>,
    size: Option<u64>,
}

/// Builds a minimal little-endian ELF shared object.
///
/// Layout: primary header, section contents, `.shstrtab`, section header
/// table. Entry 0 is the null section and `.shstrtab` is always last.
pub struct ElfBuilder {
    class: Class,
    sections: Vec<FixtureSection>,
    shstrndx: Option<u16>,
}

impl ElfBuilder {
    pub fn new(class: Class) -> Self {
        Self {
            class,
            sections: Vec::new(),
            shstrndx: None,
        }
    }

    pub fn section(mut self, name: &str, data: &[u8]) -> Self {
        self.sections.push(FixtureSection {
            name: name.to_string(),
            data: data.to_vec(),
            size: None,
        });
        self
    }

    /// Adds a section whose header claims `size` bytes regardless of `data`.
    pub fn section_with_size(mut self, name: &str, data: &[u8], size: u64) -> Self {
        self.sections.push(FixtureSection {
            name: name.to_string(),
            data: data.to_vec(),
            size: Some(size),
        });
        self
    }

    pub fn shstrndx(mut self, index: u16) -> Self {
        self.shstrndx = Some(index);
        self
    }

    fn word(&self, out: &mut Vec<u8>, value: u64) {
        match self.class {
            Class::Elf32 => out.write_u32::<LE>(value as u32).unwrap(),
            Class::Elf64 => out.write_u64::<LE>(value).unwrap(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn section_header(
        &self,
        out: &mut Vec<u8>,
        name: u32,
        sh_type: u32,
        flags: u64,
        offset: u64,
        size: u64,
        align: u64,
    ) {
        out.write_u32::<LE>(name).unwrap();
        out.write_u32::<LE>(sh_type).unwrap();
        self.word(out, flags);
        self.word(out, offset);
        self.word(out, offset);
        self.word(out, size);
        out.write_u32::<LE>(0).unwrap();
        out.write_u32::<LE>(0).unwrap();
        self.word(out, align);
        self.word(out, 0);
    }

    pub fn build(self) -> Vec<u8> {
        let header_size = self.class.header_size();
        let mut body = vec![0u8; header_size];

        let mut placed = Vec::with_capacity(self.sections.len());
        let mut shstrtab = vec![0u8];
        for s in &self.sections {
            let name_off = shstrtab.len() as u32;
            shstrtab.extend_from_slice(s.name.as_bytes());
            shstrtab.push(0);

            let offset = body.len() as u64;
            body.extend_from_slice(&s.data);
            let size = s.size.unwrap_or(s.data.len() as u64);
            placed.push((name_off, offset, size));
        }

        let strtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");
        let strtab_offset = body.len() as u64;
        body.extend_from_slice(&shstrtab);
        while body.len() % 8 != 0 {
            body.push(0);
        }

        let shoff = body.len() as u64;
        let shnum = (self.sections.len() + 2) as u16;
        let shstrndx = self.shstrndx.unwrap_or(shnum - 1);

        let mut table = Vec::new();
        self.section_header(&mut table, 0, 0, 0, 0, 0, 0);
        for &(name, offset, size) in &placed {
            self.section_header(
                &mut table,
                name,
                SHT_PROGBITS,
                SHF_ALLOC as u64,
                offset,
                size,
                1,
            );
        }
        self.section_header(
            &mut table,
            strtab_name,
            SHT_STRTAB,
            0,
            strtab_offset,
            shstrtab.len() as u64,
            1,
        );
        body.extend_from_slice(&table);

        let mut head = Vec::with_capacity(header_size);
        head.extend_from_slice(ELFMAG);
        head.push(match self.class {
            Class::Elf32 => ELFCLASS32,
            Class::Elf64 => ELFCLASS64,
        });
        head.push(ELFDATA2LSB);
        head.push(EV_CURRENT);
        head.extend_from_slice(&[0u8; 9]);
        head.write_u16::<LE>(ET_DYN).unwrap();
        head.write_u16::<LE>(match self.class {
            Class::Elf32 => 3,
            Class::Elf64 => 62,
        })
        .unwrap();
        head.write_u32::<LE>(EV_CURRENT as u32).unwrap();
        self.word(&mut head, 0x1000);
        self.word(&mut head, 0);
        self.word(&mut head, shoff);
        head.write_u32::<LE>(0).unwrap();
        head.write_u16::<LE>(header_size as u16).unwrap();
        head.write_u16::<LE>(0).unwrap();
        head.write_u16::<LE>(0).unwrap();
        head.write_u16::<LE>(self.class.section_entry_size() as u16).unwrap();
        head.write_u16::<LE>(shnum).unwrap();
        head.write_u16::<LE>(shstrndx).unwrap();
        assert_eq!(head.len(), header_size);

        body[..header_size].copy_from_slice(&head);
        body
    }
}

/// `Read + Seek` wrapper that records how it was driven.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    pub seeks: usize,
    pub bytes_read: usize,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            seeks: 0,
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n;
        Ok(n)
    }
}

impl<R: Seek> Seek for CountingReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks += 1;
        self.inner.seek(pos)
    }
}

/// `Read + Seek` wrapper that flips a shared flag when it is dropped.
#[derive(Debug)]
pub struct ReleaseFlag<R> {
    inner: R,
    released: Rc<Cell<bool>>,
}

impl<R> ReleaseFlag<R> {
    pub fn new(inner: R) -> (Self, Rc<Cell<bool>>) {
        let released = Rc::new(Cell::new(false));
        let wrapper = Self {
            inner,
            released: Rc::clone(&released),
        };
        (wrapper, released)
    }
}

impl<R> Drop for ReleaseFlag<R> {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

impl<R: Read> Read for ReleaseFlag<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for ReleaseFlag<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Writes `bytes` to a named temp file that is deleted on drop.
pub fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("elfver-")
        .suffix(".so")
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
