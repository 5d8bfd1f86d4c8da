pub mod binary;
pub mod error;
pub mod header;
pub mod probe;
pub mod sections;
pub mod source;
pub mod version;

#[cfg(test)]
mod testutil;

pub use binary::*;
pub use error::{ErrorKind, ParseError, ParseResult};
pub use header::{Class, ElfHeader, Endianness, Ident};
pub use probe::*;
pub use sections::{SectionHeader, SectionLocator, StringTable};
pub use source::ByteSource;
pub use version::Versions;
