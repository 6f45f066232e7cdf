//! Recursive directory loading.
//!
//! A directory's serialized form is its scrambled 204-byte header, then
//! `count` consecutive 316-byte entry records, then the concatenated
//! content blocks of the listed entries in table order. A child's absolute
//! content position is the owning header's offset plus header size, table
//! size, and the child's stored offset; nested directories are loaded
//! recursively from their computed position.

use crate::error::{GroupError, GroupResult};
use crate::group::entry::{Content, Directory, ENTRY_SIZE, Entry, EntryKind, EntryRecord};
use crate::group::header::GroupHeader;
use crate::group::name;
use binrw::BinRead;
use c4group_crypto::{HEADER_SIZE, unscramble};
use std::io::{Read, Seek, SeekFrom};

/// Load the directory whose header starts at `offset`.
pub(crate) fn read_directory<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
) -> GroupResult<Directory> {
    let stream_len = reader.seek(SeekFrom::End(0))?;

    let table_start = offset + HEADER_SIZE as u64;
    if stream_len < table_start {
        return Err(GroupError::TruncatedData {
            expected: table_start,
            actual: stream_len,
        });
    }

    reader.seek(SeekFrom::Start(offset))?;
    let mut scrambled = [0u8; HEADER_SIZE];
    reader.read_exact(&mut scrambled)?;
    let plain = unscramble(&scrambled)?;
    let header = GroupHeader::parse(&plain)?;

    let count = u64::try_from(header.count)
        .map_err(|_| GroupError::InvalidEntryCount(header.count))?;
    let content_base = table_start + count * ENTRY_SIZE as u64;
    if stream_len < content_base {
        return Err(GroupError::TruncatedData {
            expected: content_base,
            actual: stream_len,
        });
    }

    // The records are contiguous; read the whole table before recursing,
    // since loading a nested directory moves the stream.
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        records.push(EntryRecord::read_options(
            reader,
            binrw::Endian::Little,
            (),
        )?);
    }

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let position = content_base + u64::from(record.offset_to_file);
        let kind = if record.is_dir {
            EntryKind::Directory(read_directory(reader, position)?)
        } else {
            EntryKind::File(Content::NotLoaded { position })
        };
        entries.push(Entry {
            name: record.name,
            size: record.size,
            modified: record.modified,
            offset_to_file: record.offset_to_file,
            executable: record.executable,
            crc: record.crc,
            kind,
        });
    }

    Ok(Directory {
        author: name::decode_text(&header.author)?.into_owned(),
        version: header.version,
        original: header.original,
        modified: header.modified,
        entries,
    })
}
