//! Reads the QtWebEngine/Chromium version pair out of a shared library.
//!
//! Only the identification block, the primary header, the section header
//! table, the section name string table and the one target section are read,
//! so the cost is independent of the (often 100+ MB) library size.

use crate::error::ParseResult;
use crate::header::{ElfHeader, Ident};
use crate::sections::SectionLocator;
use crate::source::ByteSource;
use crate::version::{self, Versions};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Section that carries the user-agent string in QtWebEngineCore builds.
pub const DEFAULT_SECTION: &str = ".rodata";

/// File name of the library searched by [`versions_from_library_dir`].
pub const WEBENGINE_CORE_LIB: &str = "libQt5WebEngineCore.so";

/// Runs the whole pipeline on an already opened source.
pub fn parse_versions<R: Read + Seek>(
    src: &mut ByteSource<R>,
    section: &str,
) -> ParseResult<Versions> {
    let ident = Ident::parse(src)?;
    log::debug!("ELF ident: {:?}", ident);

    let header = ElfHeader::parse(src, ident.class)?;
    log::debug!(
        "Section table at {:#x}: {} entries of {} bytes, strings at index {}",
        header.e_shoff,
        header.e_shnum,
        header.e_shentsize,
        header.e_shstrndx
    );

    let sh = SectionLocator::new(src, &header, ident.class).find_by_name(section)?;
    let region = sh.read_region(src)?;
    version::extract(&region, section)
}

/// Takes ownership of `reader` and releases it before returning, on success
/// and on every failure path.
pub fn parse_from_reader<R: Read + Seek>(reader: R, section: &str) -> ParseResult<Versions> {
    let mut src = ByteSource::new(reader)?;
    parse_versions(&mut src, section)
}

/// Like [`versions_from_file`] but reports why no versions were found.
pub fn parse_from_path<P: AsRef<Path>>(path: P, section: &str) -> ParseResult<Versions> {
    parse_from_reader(File::open(path)?, section)
}

/// Best-effort version lookup.
///
/// A missing file yields `None` without any parsing. Every other failure is
/// logged at debug level and also collapsed into `None`, so callers can fall
/// back to a less precise detection method.
pub fn versions_from_file<P: AsRef<Path>>(path: P, section: &str) -> Option<Versions> {
    let path = path.as_ref();
    if !path.exists() {
        log::debug!("{} does not exist", path.display());
        return None;
    }

    match parse_from_path(path, section) {
        Ok(versions) => {
            log::debug!("Got versions from {}: {}", path.display(), versions);
            Some(versions)
        }
        Err(e) => {
            log::debug!("Failed to parse ELF: {e}");
            None
        }
    }
}

/// Looks for [`WEBENGINE_CORE_LIB`] inside `dir` and reads its `.rodata`.
pub fn versions_from_library_dir<P: AsRef<Path>>(dir: P) -> Option<Versions> {
    versions_from_file(dir.as_ref().join(WEBENGINE_CORE_LIB), DEFAULT_SECTION)
}
