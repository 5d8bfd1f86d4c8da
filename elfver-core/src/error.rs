use std::io;
use thiserror::Error;

/// Coarse failure classes reported by the version lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Short read, seek/read error, or a byte range outside the file.
    Io,
    /// The identification block rejected the file.
    Format,
    /// The named section or the version marker is missing.
    NotFound,
    /// Captured version bytes were not ASCII.
    Decode,
}

/// Error type for every step of the ELF version lookup.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Underlying read or seek failure, including short reads.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A header-described byte range does not fit in the file.
    #[error("{what} range {offset:#x}+{size:#x} exceeds file length {len:#x}")]
    OutOfBounds {
        what: &'static str,
        offset: u64,
        size: u64,
        len: u64,
    },
    /// Fewer than 16 bytes were available for the identification block.
    #[error("identification block truncated ({0} bytes)")]
    TruncatedIdent(usize),
    /// First four bytes are not `\x7fELF`.
    #[error("invalid magic {0:02x?}")]
    InvalidMagic([u8; 4]),
    /// `EI_CLASS` is neither 32- nor 64-bit.
    #[error("invalid bitness {0}")]
    InvalidClass(u8),
    /// `EI_DATA` is neither little- nor big-endian.
    #[error("invalid endianness {0}")]
    InvalidEndianness(u8),
    #[error("big endian is unsupported")]
    BigEndian,
    /// `EI_VERSION` is not 1.
    #[error("only version 1 is supported, not {0}")]
    UnsupportedVersion(u8),
    #[error("no {0} section found")]
    SectionNotFound(String),
    /// The section exists but holds no version marker.
    #[error("no match in {0}")]
    NoVersionMatch(String),
    #[error("version string is not ASCII")]
    NonAscii,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::OutOfBounds { .. } => ErrorKind::Io,
            Self::TruncatedIdent(_)
            | Self::InvalidMagic(_)
            | Self::InvalidClass(_)
            | Self::InvalidEndianness(_)
            | Self::BigEndian
            | Self::UnsupportedVersion(_) => ErrorKind::Format,
            Self::SectionNotFound(_) | Self::NoVersionMatch(_) => ErrorKind::NotFound,
            Self::NonAscii => ErrorKind::Decode,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
