//! The 204-byte directory header.
//!
//! Plaintext layout (little-endian), after unscrambling:
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 25   | id string, NUL-padded                   |
//! | 25     | 3    | padding                                 |
//! | 28     | 8    | version major, minor (2 x i32)          |
//! | 36     | 4    | entry count (i32)                       |
//! | 40     | 32   | author, NUL-padded                      |
//! | 72     | 32   | padding                                 |
//! | 104    | 4    | modification time (u32 epoch seconds)   |
//! | 108    | 4    | "original" field (u32, sentinel check)  |
//! | 112    | 92   | padding                                 |

use crate::error::{GroupError, GroupResult};
use binrw::{BinRead, BinResult, BinWrite};
use std::io::{Cursor, Read, Seek, Write};

pub use c4group_crypto::HEADER_SIZE;

/// Id string every directory header begins with.
pub const GROUP_ID: [u8; 24] = *b"RedWolf Design GrpFolder";

/// Value of the reserved field that marks an archive as original (not a
/// re-export of another format variant).
pub const ORIGINAL_SENTINEL: u32 = 1_234_567;

const AUTHOR_SIZE: usize = 32;

/// Parsed fixed fields of a directory header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHeader {
    /// Format version pair (major, minor)
    pub version: (i32, i32),
    /// Number of entry records following the header
    pub count: i32,
    /// Author field, raw bytes trimmed at the first NUL
    pub author: Vec<u8>,
    /// Modification time in epoch seconds, as stored
    pub modified: u32,
    /// Whether the reserved field equals the original-archive sentinel
    pub original: bool,
}

impl GroupHeader {
    /// Parse a header from its unscrambled plaintext bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`GroupError::InvalidHeaderId`] when the id string is
    /// missing; field parsing itself cannot fail on a 204-byte buffer.
    pub fn parse(plain: &[u8; HEADER_SIZE]) -> GroupResult<Self> {
        if plain[..GROUP_ID.len()] != GROUP_ID {
            let mut id = [0u8; 24];
            id.copy_from_slice(&plain[..GROUP_ID.len()]);
            return Err(GroupError::InvalidHeaderId(id));
        }

        let mut cursor = Cursor::new(&plain[..]);
        Ok(Self::read_options(&mut cursor, binrw::Endian::Little, ())?)
    }

    /// Serialize the header to its plaintext form, ready for scrambling.
    ///
    /// # Errors
    ///
    /// Fails only on writer errors, which a fixed-size in-memory buffer
    /// does not produce.
    pub fn build(&self) -> GroupResult<[u8; HEADER_SIZE]> {
        let mut plain = [0u8; HEADER_SIZE];
        let mut cursor = Cursor::new(&mut plain[..]);
        self.write_options(&mut cursor, binrw::Endian::Little, ())?;
        Ok(plain)
    }
}

impl BinRead for GroupHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let endian = binrw::Endian::Little;

        // Id and padding are validated by the caller and skipped here.
        let mut skip = [0u8; 28];
        reader.read_exact(&mut skip)?;

        let major = i32::read_options(reader, endian, ())?;
        let minor = i32::read_options(reader, endian, ())?;
        let count = i32::read_options(reader, endian, ())?;

        let mut author = [0u8; AUTHOR_SIZE];
        reader.read_exact(&mut author)?;
        let author_len = author
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(AUTHOR_SIZE);

        let mut skip = [0u8; 32];
        reader.read_exact(&mut skip)?;

        let modified = u32::read_options(reader, endian, ())?;
        let original = u32::read_options(reader, endian, ())?;

        Ok(Self {
            version: (major, minor),
            count,
            author: author[..author_len].to_vec(),
            modified,
            original: original == ORIGINAL_SENTINEL,
        })
    }
}

impl BinWrite for GroupHeader {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        let endian = binrw::Endian::Little;

        let mut id = [0u8; 28];
        id[..GROUP_ID.len()].copy_from_slice(&GROUP_ID);
        writer.write_all(&id)?;

        self.version.0.write_options(writer, endian, ())?;
        self.version.1.write_options(writer, endian, ())?;
        self.count.write_options(writer, endian, ())?;

        let mut author = [0u8; AUTHOR_SIZE];
        let len = self.author.len().min(AUTHOR_SIZE - 1);
        author[..len].copy_from_slice(&self.author[..len]);
        writer.write_all(&author)?;

        writer.write_all(&[0u8; 32])?;
        self.modified.write_options(writer, endian, ())?;
        let original = if self.original { ORIGINAL_SENTINEL } else { 0 };
        original.write_options(writer, endian, ())?;
        writer.write_all(&[0u8; 92])?;

        Ok(())
    }
}
