//! Entry filenames and their encoding detection.
//!
//! The format stores filenames as raw bytes in a fixed 257-byte field and
//! does not record which text encoding produced them. Archives written by
//! modern tools use UTF-8; older ones use the Windows single-byte ANSI
//! code page. Decoding therefore tries UTF-8 first and falls back to
//! Windows-1252; a name failing both is malformed.

use crate::error::{GroupError, GroupResult};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::fmt;

/// Maximum stored name length, fixed by the record's filename field.
pub const MAX_NAME_LEN: usize = 257;

/// An entry filename as stored on disk.
///
/// Keeps the original byte sequence so legacy-encoded names round-trip
/// bit-exactly; [`EntryName::decoded`] produces the text form used for
/// display, lookups, and filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryName {
    bytes: Vec<u8>,
}

impl EntryName {
    /// Create a name from raw on-disk bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`GroupError::NameContainsNul`] or
    /// [`GroupError::NameTooLong`]; names are NUL-free and at most
    /// [`MAX_NAME_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> GroupResult<Self> {
        if bytes.contains(&0) {
            return Err(GroupError::NameContainsNul);
        }
        if bytes.len() > MAX_NAME_LEN {
            return Err(GroupError::NameTooLong(bytes.len()));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// The raw bytes as stored in the record.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode the name, trying UTF-8 first and Windows-1252 second.
    ///
    /// # Errors
    ///
    /// Fails with [`GroupError::NameEncoding`] when neither decode
    /// succeeds.
    pub fn decoded(&self) -> GroupResult<Cow<'_, str>> {
        decode_text(&self.bytes)
    }

    /// Whether this name refers to the same entry as `name`.
    ///
    /// Compares the raw bytes first, then the decoded text, so a
    /// legacy-encoded stored name still matches its decoded form.
    pub fn matches(&self, name: &str) -> bool {
        self.bytes == name.as_bytes()
            || self.decoded().is_ok_and(|decoded| decoded == name)
    }
}

/// Decode stored text bytes: UTF-8 first, Windows-1252 second.
///
/// Shared by filenames and the header's author field, which carry the
/// same encoding ambiguity.
pub(crate) fn decode_text(bytes: &[u8]) -> GroupResult<Cow<'_, str>> {
    if let Ok(utf8) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(utf8));
    }
    let (decoded, _, had_errors) = WINDOWS_1252.decode(bytes);
    if had_errors {
        return Err(GroupError::NameEncoding(bytes.to_vec()));
    }
    Ok(decoded)
}

impl TryFrom<&str> for EntryName {
    type Error = GroupError;

    /// Create a name from text; stored as UTF-8 bytes.
    fn try_from(name: &str) -> GroupResult<Self> {
        Self::from_bytes(name.as_bytes())
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decoded() {
            Ok(decoded) => f.write_str(&decoded),
            Err(_) => write!(f, "{:02X?}", self.bytes),
        }
    }
}
