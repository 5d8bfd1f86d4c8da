use crate::error::{ParseError, ParseResult};
use std::fmt;

const MARKER: &[u8] = b"QtWebEngine/";
const SEPARATOR: &[u8] = b" Chrome/";

/// QtWebEngine and bundled Chromium versions, always found together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub webengine: String,
    pub chromium: String,
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QtWebEngine {} (Chromium {})", self.webengine, self.chromium)
    }
}

fn is_version_byte(b: &u8) -> bool {
    b.is_ascii_digit() || *b == b'.'
}

/// Length of the `[0-9.]+` run at the start of `bytes`.
fn version_len(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| is_version_byte(b)).count()
}

/// Tries to match `<version> Chrome/<version>` right after a marker.
fn match_after_marker(rest: &[u8]) -> Option<(&[u8], &[u8])> {
    let n = version_len(rest);
    if n == 0 {
        return None;
    }
    let tail = rest[n..].strip_prefix(SEPARATOR)?;
    let m = version_len(tail);
    if m == 0 {
        return None;
    }
    Some((&rest[..n], &tail[..m]))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let first = *needle.first()?;
    let mut pos = 0;
    while let Some(i) = haystack[pos..].iter().position(|&b| b == first) {
        let start = pos + i;
        if haystack[start..].starts_with(needle) {
            return Some(start);
        }
        pos = start + 1;
    }
    None
}

fn to_ascii(bytes: &[u8]) -> ParseResult<String> {
    if !bytes.is_ascii() {
        return Err(ParseError::NonAscii);
    }
    String::from_utf8(bytes.to_vec()).map_err(|_| ParseError::NonAscii)
}

/// Finds the leftmost `QtWebEngine/<v> Chrome/<v>` in `region`, where each
/// `<v>` is one or more digits and dots.
///
/// `section` only labels the not-found error.
pub fn extract(region: &[u8], section: &str) -> ParseResult<Versions> {
    let mut pos = 0;
    while let Some(i) = find(&region[pos..], MARKER) {
        let start = pos + i + MARKER.len();
        if let Some((webengine, chromium)) = match_after_marker(&region[start..]) {
            return Ok(Versions {
                webengine: to_ascii(webengine)?,
                chromium: to_ascii(chromium)?,
            });
        }
        pos += i + 1;
    }

    Err(ParseError::NoVersionMatch(section.to_string()))
}
