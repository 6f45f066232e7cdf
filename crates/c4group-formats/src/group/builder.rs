//! Recursive directory serialization.
//!
//! The inverse of the parser: header first (scrambled), then the record
//! table with freshly computed offsets, then content blocks in table
//! order. Offsets are cumulative serialized sizes, so the table fully
//! determines where every content block lands; nested directories
//! serialize recursively into their parent's content area.

use crate::error::{GroupError, GroupResult};
use crate::group::entry::{Directory, EntryKind, EntryRecord};
use crate::group::header::GroupHeader;
use binrw::BinWrite;
use c4group_crypto::scramble;
use std::io::{Cursor, Read, Seek, Write};

/// Serialize `dir` and everything below it.
///
/// `reader` backs lazy content reads for entries still referencing the
/// source stream. Entry `offset_to_file` fields (and directory entry
/// sizes) are refreshed in place with the values written.
pub(crate) fn write_directory<R: Read + Seek>(
    dir: &mut Directory,
    reader: &mut R,
) -> GroupResult<Vec<u8>> {
    let count = i32::try_from(dir.entries.len())
        .map_err(|_| GroupError::SizeOverflow(dir.entries.len() as u64))?;

    let header = GroupHeader {
        version: dir.version,
        count,
        author: encode_author(&dir.author),
        modified: dir.modified,
        original: dir.original,
    };
    let plain = header.build()?;

    let mut cursor = Cursor::new(Vec::new());
    cursor.write_all(&scramble(&plain)?)?;

    // Record table. Offsets restart at zero for every directory: they are
    // relative to the end of this directory's own table.
    let mut offset = 0u64;
    for entry in &mut dir.entries {
        let entry_size = entry.serialized_size();
        entry.offset_to_file =
            u32::try_from(offset).map_err(|_| GroupError::SizeOverflow(offset))?;
        if entry.is_directory() {
            entry.size = u32::try_from(entry_size)
                .map_err(|_| GroupError::SizeOverflow(entry_size))?;
        }

        let record = EntryRecord {
            name: entry.name.clone(),
            is_dir: entry.is_directory(),
            size: entry.size,
            offset_to_file: entry.offset_to_file,
            modified: entry.modified,
            crc: entry.crc,
            executable: entry.executable,
        };
        record.write_options(&mut cursor, binrw::Endian::Little, ())?;

        offset += entry_size;
    }

    // Content blocks, in table order.
    for entry in &mut dir.entries {
        match &mut entry.kind {
            EntryKind::File(_) => {
                let bytes = entry.content(reader)?;
                if bytes.len() as u64 != u64::from(entry.size) {
                    return Err(GroupError::ContentSizeMismatch {
                        name: entry.name.to_string(),
                        expected: entry.size,
                        actual: bytes.len() as u64,
                    });
                }
                cursor.write_all(&bytes)?;
            }
            EntryKind::Directory(sub) => {
                let block = write_directory(sub, reader)?;
                cursor.write_all(&block)?;
            }
        }
    }

    Ok(cursor.into_inner())
}

/// Encode the author field as UTF-8, truncated to the 31 bytes the header
/// can hold without losing its closing NUL.
fn encode_author(author: &str) -> Vec<u8> {
    let mut end = author.len().min(31);
    while !author.is_char_boundary(end) {
        end -= 1;
    }
    author.as_bytes()[..end].to_vec()
}
