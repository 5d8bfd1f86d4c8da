use crate::error::{ParseError, ParseResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Random-access reader over an ELF image.
///
/// All reads are exact: a short read surfaces as [`ParseError::Io`], never as
/// a partially filled buffer. The stream length is captured once on
/// construction so header-described ranges can be checked before allocating.
#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    len: u64,
}

impl ByteSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> ByteSource<R> {
    pub fn new(mut inner: R) -> ParseResult<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the underlying stream in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn seek(&mut self, offset: u64) -> ParseResult<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn read_exact(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads up to `n` bytes, stopping early only at end of stream.
    pub fn read_up_to(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(n);
        (&mut self.inner).take(n as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Seeks to `offset` and reads exactly `size` bytes.
    ///
    /// The range is validated against the stream length first, so a corrupt
    /// size field cannot trigger a huge allocation.
    pub fn read_range(
        &mut self,
        what: &'static str,
        offset: u64,
        size: u64,
    ) -> ParseResult<Vec<u8>> {
        let len = self.len;
        let out_of_bounds = || ParseError::OutOfBounds {
            what,
            offset,
            size,
            len,
        };
        let end = offset.checked_add(size).ok_or_else(out_of_bounds)?;
        if end > self.len {
            return Err(out_of_bounds());
        }
        let size = usize::try_from(size).map_err(|_| out_of_bounds())?;

        self.seek(offset)?;
        self.read_exact(size)
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Computes `base + index * stride`, rejecting arithmetic overflow.
pub(crate) fn table_offset(
    what: &'static str,
    base: u64,
    index: u64,
    stride: u64,
    len: u64,
) -> ParseResult<u64> {
    index
        .checked_mul(stride)
        .and_then(|rel| base.checked_add(rel))
        .ok_or(ParseError::OutOfBounds {
            what,
            offset: base,
            size: index.saturating_mul(stride),
            len,
        })
}
