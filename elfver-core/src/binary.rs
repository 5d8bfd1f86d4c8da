use crate::header::{ElfHeader, Ident};
use crate::sections::{SectionHeader, SectionLocator};
use crate::source::ByteSource;
use anyhow::{Context, Result};
use std::io::{Read, Seek};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Section {
    pub index: u16,
    pub name: String,
    pub header: SectionHeader,
}

/// Header-level view of an ELF image.
///
/// Built from the section header table and the section name string table
/// only; section contents are never read.
#[derive(Debug, Clone)]
pub struct Binary {
    pub path: String,
    pub ident: Ident,
    pub header: ElfHeader,
    pub sections: Vec<Section>,
}

impl Binary {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut src = ByteSource::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut binary = Self::from_source(&mut src)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        binary.path = path.display().to_string();
        Ok(binary)
    }

    pub fn from_source<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Self> {
        let ident = Ident::parse(src)?;
        let header = ElfHeader::parse(src, ident.class)?;

        let mut sections = Vec::with_capacity(usize::from(header.e_shnum));
        if header.e_shnum == 0 || header.e_shoff == 0 {
            log::warn!("No section header table (stripped binary?)");
        } else {
            if header.e_shstrndx >= header.e_shnum {
                log::warn!(
                    "String table index {} is outside the {} section headers",
                    header.e_shstrndx,
                    header.e_shnum
                );
            }

            let mut locator = SectionLocator::new(src, &header, ident.class);
            let strtab = locator
                .string_table()
                .context("Failed to load section name string table")?;
            for index in 0..header.e_shnum {
                let sh = locator
                    .section_at(index)
                    .with_context(|| format!("Failed to read section header {index}"))?;
                sections.push(Section {
                    index,
                    name: strtab.name_lossy(sh.sh_name),
                    header: sh,
                });
            }
            log::info!("Read {} section headers", sections.len());
        }

        Ok(Self {
            path: String::new(),
            ident,
            header,
            sections,
        })
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn entry_point(&self) -> u64 {
        self.header.entry_point()
    }
}
