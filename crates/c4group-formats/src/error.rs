//! Error types for C4Group parsing and building

use c4group_crypto::ScrambleError;
use thiserror::Error;

/// C4Group format error type
///
/// Every variant is fatal to the load or save call that produced it; no
/// partial tree is handed out.
#[derive(Debug, Error)]
pub enum GroupError {
    /// The stream ended before a complete structure could be read
    #[error("truncated data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        /// Bytes the structure requires
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// The directory header does not start with the format's id string
    #[error("invalid group header id: {0:02X?}")]
    InvalidHeaderId([u8; 24]),

    /// The directory header carries a negative entry count
    #[error("invalid entry count: {0}")]
    InvalidEntryCount(i32),

    /// A serialized size or offset does not fit the format's 32-bit fields
    #[error("serialized size {0} exceeds the format's 32-bit limit")]
    SizeOverflow(u64),

    /// An entry filename is longer than the 257-byte record field
    #[error("entry name of {0} bytes exceeds the 257-byte field")]
    NameTooLong(usize),

    /// An entry filename contains a NUL byte
    #[error("entry name contains a NUL byte")]
    NameContainsNul,

    /// A stored string is neither UTF-8 nor Windows-1252
    #[error("stored text is neither UTF-8 nor Windows-1252: {0:02X?}")]
    NameEncoding(Vec<u8>),

    /// An entry's held content no longer matches its recorded size
    #[error("content of entry {name:?} is {actual} bytes, record says {expected}")]
    ContentSizeMismatch {
        /// Entry whose content is inconsistent
        name: String,
        /// Size the record carries
        expected: u32,
        /// Bytes actually held
        actual: u64,
    },

    /// Content was requested from an entry with no resolved stream position
    #[error("invalid content position for entry {0:?}")]
    InvalidContentPosition(String),

    /// Content was requested from a directory entry
    #[error("entry {0:?} is a directory, not a file")]
    NotAFile(String),

    /// The compression envelope could not be produced
    #[error("envelope compression failed: {0}")]
    Compression(String),

    /// The compression envelope could not be opened
    #[error("envelope decompression failed: {0}")]
    Decompression(String),

    /// Header obfuscation failed
    #[error("header obfuscation failed: {0}")]
    Scramble(#[from] ScrambleError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for C4Group operations
pub type GroupResult<T> = Result<T, GroupError>;
