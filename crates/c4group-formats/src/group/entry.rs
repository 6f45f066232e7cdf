//! Entry model and the 316-byte entry record codec.
//!
//! A directory's serialized form lists one fixed-size metadata record per
//! child. Record layout (little-endian):
//!
//! | offset | size | field                             |
//! |--------|------|-----------------------------------|
//! | 0      | 257  | filename, NUL-padded              |
//! | 257    | 3    | padding                           |
//! | 260    | 4    | packed flag (i32, always 1)       |
//! | 264    | 4    | is-directory flag (i32)           |
//! | 268    | 4    | size (u32)                        |
//! | 272    | 4    | padding                           |
//! | 276    | 4    | offset to content (u32)           |
//! | 280    | 4    | modification time (u32)           |
//! | 284    | 1    | CRC-present flag                  |
//! | 285    | 4    | CRC32 (u32)                       |
//! | 289    | 1    | executable flag                   |
//! | 290    | 26   | padding                           |

use crate::error::{GroupError, GroupResult};
use crate::group::name::EntryName;
use binrw::{BinRead, BinResult, BinWrite};
use c4group_crypto::{HEADER_SIZE, content_crc};
use std::io::{Read, Seek, SeekFrom, Write};

/// Size of one serialized entry record in bytes.
pub const ENTRY_SIZE: usize = 316;

const NAME_FIELD: usize = 257;

/// Content of a file entry.
///
/// Parsing resolves every file entry to a stream position; bytes are only
/// fetched when asked for. Packing replaces the lazy form with
/// materialized bytes read from the real filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// No bytes held and no stream position resolved. Reading fails until
    /// the entry is re-resolved by a load or given bytes explicitly.
    Unresolved,
    /// Content lives in the backing stream at this absolute offset.
    NotLoaded {
        /// Absolute byte offset of the content in the decompressed stream
        position: u64,
    },
    /// Content bytes held in memory.
    Loaded(Vec<u8>),
}

/// What an entry is: a leaf file or a nested directory.
///
/// The format only ever has these two kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Leaf file with its content state
    File(Content),
    /// Nested directory with its own header, records, and children
    Directory(Directory),
}

/// One member of a directory's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Filename as stored on disk
    pub name: EntryName,
    /// Content size in bytes (for directories, refreshed to the full
    /// serialized size on save)
    pub size: u32,
    /// Modification time in epoch seconds, as stored
    pub modified: u32,
    /// Byte distance from the end of the owning directory's record table
    /// to this entry's content (refreshed on save)
    pub offset_to_file: u32,
    /// Executable flag
    pub executable: bool,
    /// Content checksum, when the record's presence flag is set
    pub crc: Option<u32>,
    /// File or directory
    pub kind: EntryKind,
}

impl Entry {
    /// Create a file entry with materialized content.
    ///
    /// # Errors
    ///
    /// Fails with [`GroupError::SizeOverflow`] when the content does not
    /// fit the format's 32-bit size field.
    pub fn new_file(name: EntryName, content: Vec<u8>) -> GroupResult<Self> {
        let size = u32::try_from(content.len())
            .map_err(|_| GroupError::SizeOverflow(content.len() as u64))?;
        Ok(Self {
            name,
            size,
            modified: 0,
            offset_to_file: 0,
            executable: false,
            crc: Some(content_crc(&content)),
            kind: EntryKind::File(Content::Loaded(content)),
        })
    }

    /// Create a directory entry.
    pub fn new_directory(name: EntryName, directory: Directory) -> Self {
        Self {
            name,
            size: 0,
            modified: 0,
            offset_to_file: 0,
            executable: false,
            crc: None,
            kind: EntryKind::Directory(directory),
        }
    }

    /// Whether this entry is a nested directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory(_))
    }

    /// The nested directory, if this entry is one.
    pub fn directory(&self) -> Option<&Directory> {
        match &self.kind {
            EntryKind::Directory(dir) => Some(dir),
            EntryKind::File(_) => None,
        }
    }

    /// Mutable access to the nested directory, if this entry is one.
    pub fn directory_mut(&mut self) -> Option<&mut Directory> {
        match &mut self.kind {
            EntryKind::Directory(dir) => Some(dir),
            EntryKind::File(_) => None,
        }
    }

    /// Fetch this file entry's content.
    ///
    /// Materialized bytes are returned as-is. Otherwise the backing
    /// stream is read at the entry's resolved position; the stream's
    /// prior cursor is restored afterwards, so interleaved reads do not
    /// disturb each other.
    ///
    /// # Errors
    ///
    /// Fails with [`GroupError::NotAFile`] for directory entries and
    /// [`GroupError::InvalidContentPosition`] when no position was ever
    /// resolved.
    pub fn content<R: Read + Seek>(&self, reader: &mut R) -> GroupResult<Vec<u8>> {
        let content = match &self.kind {
            EntryKind::Directory(_) => {
                return Err(GroupError::NotAFile(self.name.to_string()));
            }
            EntryKind::File(content) => content,
        };

        match content {
            Content::Loaded(bytes) => Ok(bytes.clone()),
            Content::Unresolved => {
                Err(GroupError::InvalidContentPosition(self.name.to_string()))
            }
            Content::NotLoaded { position } => {
                let prev = reader.stream_position()?;
                let result = read_exact_at(reader, *position, self.size);
                reader.seek(SeekFrom::Start(prev))?;
                result
            }
        }
    }

    /// Materialize content, replacing the lazy path.
    ///
    /// Updates `size` and the checksum to match the new bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`GroupError::NotAFile`] for directory entries and
    /// [`GroupError::SizeOverflow`] for content beyond the 32-bit field.
    pub fn set_content(&mut self, content: Vec<u8>) -> GroupResult<()> {
        if self.is_directory() {
            return Err(GroupError::NotAFile(self.name.to_string()));
        }
        self.size = u32::try_from(content.len())
            .map_err(|_| GroupError::SizeOverflow(content.len() as u64))?;
        self.crc = Some(content_crc(&content));
        self.kind = EntryKind::File(Content::Loaded(content));
        Ok(())
    }

    /// Drop materialized content.
    ///
    /// Any previously resolved stream position is stale once content was
    /// materialized (offsets may have moved), so the next read fails
    /// until a load re-resolves the entry.
    pub fn clear_content(&mut self) {
        if let EntryKind::File(content) = &mut self.kind {
            *content = Content::Unresolved;
        }
    }

    /// Bytes this entry occupies in its owning directory's content block.
    pub fn serialized_size(&self) -> u64 {
        match &self.kind {
            EntryKind::File(_) => u64::from(self.size),
            EntryKind::Directory(dir) => dir.serialized_size(),
        }
    }
}

/// A directory node: the root of an archive or a nested entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Author field from the header
    pub author: String,
    /// Format version pair (major, minor)
    pub version: (i32, i32),
    /// Whether the header's reserved field carries the original-archive
    /// sentinel
    pub original: bool,
    /// Modification time in epoch seconds
    pub modified: u32,
    /// Children in on-disk order
    pub entries: Vec<Entry>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            author: String::new(),
            version: (0, 0),
            original: true,
            modified: 0,
            entries: Vec::new(),
        }
    }

    /// Look up a child by name.
    ///
    /// Names are unique within one directory, so the first match is the
    /// only one.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name.matches(name))
    }

    /// Look up a child by name, mutably.
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.name.matches(name))
    }

    /// Full serialized size of this directory: header, record table, and
    /// every child's content block.
    pub fn serialized_size(&self) -> u64 {
        HEADER_SIZE as u64
            + (ENTRY_SIZE * self.entries.len()) as u64
            + self
                .entries
                .iter()
                .map(Entry::serialized_size)
                .sum::<u64>()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

fn read_exact_at<R: Read + Seek>(
    reader: &mut R,
    position: u64,
    size: u32,
) -> GroupResult<Vec<u8>> {
    reader.seek(SeekFrom::Start(position))?;
    let mut buf = vec![0u8; size as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// One 316-byte metadata record, the serialized form of an [`Entry`]'s
/// fixed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryRecord {
    pub name: EntryName,
    pub is_dir: bool,
    pub size: u32,
    pub offset_to_file: u32,
    pub modified: u32,
    pub crc: Option<u32>,
    pub executable: bool,
}

impl BinRead for EntryRecord {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let endian = binrw::Endian::Little;
        let record_start = reader.stream_position().unwrap_or(0);

        let mut name_field = [0u8; NAME_FIELD];
        reader.read_exact(&mut name_field)?;
        let name_len = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_FIELD);
        let name = EntryName::from_bytes(&name_field[..name_len]).map_err(|e| {
            binrw::Error::Custom {
                pos: record_start,
                err: Box::new(e),
            }
        })?;

        let mut pad = [0u8; 3];
        reader.read_exact(&mut pad)?;
        let _packed = i32::read_options(reader, endian, ())?;
        let is_dir = i32::read_options(reader, endian, ())? != 0;
        let size = u32::read_options(reader, endian, ())?;
        let mut pad = [0u8; 4];
        reader.read_exact(&mut pad)?;
        let offset_to_file = u32::read_options(reader, endian, ())?;
        let modified = u32::read_options(reader, endian, ())?;
        let crc_flag = u8::read_options(reader, endian, ())?;
        let crc_value = u32::read_options(reader, endian, ())?;
        let executable = u8::read_options(reader, endian, ())? != 0;
        let mut pad = [0u8; 26];
        reader.read_exact(&mut pad)?;

        Ok(Self {
            name,
            is_dir,
            size,
            offset_to_file,
            modified,
            crc: (crc_flag != 0).then_some(crc_value),
            executable,
        })
    }
}

impl BinWrite for EntryRecord {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        let endian = binrw::Endian::Little;

        let mut name_field = [0u8; NAME_FIELD];
        let name = self.name.as_bytes();
        name_field[..name.len()].copy_from_slice(name);
        writer.write_all(&name_field)?;

        writer.write_all(&[0u8; 3])?;
        1i32.write_options(writer, endian, ())?;
        i32::from(self.is_dir).write_options(writer, endian, ())?;
        self.size.write_options(writer, endian, ())?;
        writer.write_all(&[0u8; 4])?;
        self.offset_to_file.write_options(writer, endian, ())?;
        self.modified.write_options(writer, endian, ())?;
        u8::from(self.crc.is_some()).write_options(writer, endian, ())?;
        self.crc.unwrap_or(0).write_options(writer, endian, ())?;
        u8::from(self.executable).write_options(writer, endian, ())?;
        writer.write_all(&[0u8; 26])?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn name(s: &str) -> EntryName {
        EntryName::try_from(s).expect("valid name")
    }

    fn sample_record() -> EntryRecord {
        EntryRecord {
            name: name("Readme.txt"),
            is_dir: false,
            size: 5,
            offset_to_file: 42,
            modified: 1_600_000_000,
            crc: Some(0xDEAD_BEEF),
            executable: true,
        }
    }

    fn write_record(record: &EntryRecord) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        record
            .write_options(&mut buf, binrw::Endian::Little, ())
            .expect("write should succeed");
        buf.into_inner()
    }

    #[test]
    fn test_record_field_positions() {
        let buf = write_record(&sample_record());
        assert_eq!(buf.len(), ENTRY_SIZE);

        assert_eq!(&buf[..10], b"Readme.txt");
        assert!(buf[10..257].iter().all(|&b| b == 0));
        assert_eq!(&buf[260..264], &1i32.to_le_bytes());
        assert_eq!(&buf[264..268], &0i32.to_le_bytes());
        assert_eq!(&buf[268..272], &5u32.to_le_bytes());
        assert_eq!(&buf[276..280], &42u32.to_le_bytes());
        assert_eq!(&buf[280..284], &1_600_000_000u32.to_le_bytes());
        assert_eq!(buf[284], 1);
        assert_eq!(&buf[285..289], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(buf[289], 1);
        assert!(buf[290..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record();
        let buf = write_record(&record);
        let parsed =
            EntryRecord::read_options(&mut Cursor::new(&buf), binrw::Endian::Little, ())
                .expect("read should succeed");
        assert_eq!(record, parsed);
    }

    #[test]
    fn test_record_without_crc() {
        let record = EntryRecord {
            crc: None,
            executable: false,
            ..sample_record()
        };
        let buf = write_record(&record);
        assert_eq!(buf[284], 0);
        assert_eq!(&buf[285..289], &[0u8; 4]);
        assert_eq!(buf[289], 0);

        let parsed =
            EntryRecord::read_options(&mut Cursor::new(&buf), binrw::Endian::Little, ())
                .expect("read should succeed");
        assert_eq!(parsed.crc, None);
        assert!(!parsed.executable);
    }

    #[test]
    fn test_directory_record_round_trip() {
        let record = EntryRecord {
            name: name("Sub"),
            is_dir: true,
            crc: None,
            ..sample_record()
        };
        let buf = write_record(&record);
        assert_eq!(&buf[264..268], &1i32.to_le_bytes());

        let parsed =
            EntryRecord::read_options(&mut Cursor::new(&buf), binrw::Endian::Little, ())
                .expect("read should succeed");
        assert!(parsed.is_dir);
    }

    #[test]
    fn test_lazy_content_restores_cursor() {
        let stream_bytes = b"prefix--hello--suffix".to_vec();
        let mut stream = Cursor::new(stream_bytes);
        stream.set_position(3);

        let entry = Entry {
            name: name("Readme.txt"),
            size: 5,
            modified: 0,
            offset_to_file: 0,
            executable: false,
            crc: None,
            kind: EntryKind::File(Content::NotLoaded { position: 8 }),
        };

        let content = entry.content(&mut stream).expect("content should read");
        assert_eq!(content, b"hello");
        assert_eq!(stream.position(), 3);
    }

    #[test]
    fn test_materialized_content_short_circuits() {
        let entry = Entry::new_file(name("a.bin"), vec![0x00, 0x01])
            .expect("new_file should succeed");
        // An empty stream: a seek-based read would fail immediately.
        let mut stream = Cursor::new(Vec::new());
        assert_eq!(
            entry.content(&mut stream).expect("content should read"),
            vec![0x00, 0x01]
        );
        assert_eq!(entry.size, 2);
        assert_eq!(entry.crc, Some(content_crc(&[0x00, 0x01])));
    }

    #[test]
    fn test_cleared_content_fails_until_reloaded() {
        let mut entry = Entry::new_file(name("a.bin"), vec![1, 2, 3])
            .expect("new_file should succeed");
        entry.clear_content();

        let mut stream = Cursor::new(vec![1, 2, 3]);
        assert!(matches!(
            entry.content(&mut stream),
            Err(GroupError::InvalidContentPosition(_))
        ));
    }

    #[test]
    fn test_directory_has_no_content() {
        let entry = Entry::new_directory(name("Sub"), Directory::new());
        let mut stream = Cursor::new(Vec::new());
        assert!(matches!(
            entry.content(&mut stream),
            Err(GroupError::NotAFile(_))
        ));
    }

    #[test]
    fn test_set_content_refreshes_metadata() {
        let mut entry = Entry::new_file(name("a.bin"), vec![1])
            .expect("new_file should succeed");
        entry
            .set_content(b"longer content".to_vec())
            .expect("set_content should succeed");
        assert_eq!(entry.size, 14);
        assert_eq!(entry.crc, Some(content_crc(b"longer content")));
    }

    #[test]
    fn test_serialized_sizes() {
        let file = Entry::new_file(name("Readme.txt"), b"hello".to_vec())
            .expect("new_file should succeed");
        assert_eq!(file.serialized_size(), 5);

        let mut sub = Directory::new();
        sub.entries.push(
            Entry::new_file(name("a.bin"), vec![0, 1]).expect("new_file should succeed"),
        );
        let dir = Entry::new_directory(name("Sub"), sub);
        assert_eq!(dir.serialized_size(), 204 + 316 + 2);

        let mut root = Directory::new();
        root.entries.push(file);
        root.entries.push(dir);
        assert_eq!(root.serialized_size(), 204 + 2 * 316 + 5 + (204 + 316 + 2));
    }

    #[test]
    fn test_lookup_by_name() {
        let mut dir = Directory::new();
        dir.entries.push(
            Entry::new_file(name("Readme.txt"), b"hello".to_vec())
                .expect("new_file should succeed"),
        );
        dir.entries
            .push(Entry::new_directory(name("Sub"), Directory::new()));

        assert!(dir.entry("Readme.txt").is_some());
        assert!(dir.entry("Sub").is_some_and(Entry::is_directory));
        assert!(dir.entry("missing.txt").is_none());

        let entry = dir.entry_mut("Readme.txt").expect("entry exists");
        entry.executable = true;
        assert!(dir.entry("Readme.txt").expect("entry exists").executable);
    }
}
