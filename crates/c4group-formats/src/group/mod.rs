//! The C4Group directory tree: model, parser, and builder.
//!
//! A group archive is a single root [`Directory`] serialized as a
//! scrambled header, a fixed-size record table, and concatenated content
//! blocks, the whole thing wrapped in the magic-doctored gzip envelope.
//! [`Group`] ties a parsed tree to the decompressed stream that backs its
//! lazy content reads for the duration of one load/save cycle.

mod builder;
pub mod entry;
pub mod header;
pub mod name;
mod parser;

pub use entry::{Content, Directory, ENTRY_SIZE, Entry, EntryKind};
pub use header::{GROUP_ID, GroupHeader, HEADER_SIZE, ORIGINAL_SENTINEL};
pub use name::{EntryName, MAX_NAME_LEN};

use crate::envelope;
use crate::error::GroupResult;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// A loaded archive: the root directory tree plus the stream its lazy
/// entries read from.
///
/// The stream is shared by every entry in the tree and must stay open for
/// as long as lazy content access is needed; it is consumed when the
/// group is built again.
#[derive(Debug)]
pub struct Group<R> {
    root: Directory,
    reader: R,
}

impl Group<Cursor<Vec<u8>>> {
    /// Read and parse an archive file.
    ///
    /// The file is read whole, unwrapped from its envelope, and parsed;
    /// the decompressed payload becomes the tree's backing stream.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and on any envelope or format error.
    pub fn open(path: impl AsRef<Path>) -> GroupResult<Self> {
        let disk = std::fs::read(path)?;
        let payload = envelope::unwrap(&disk)?;
        Self::parse(Cursor::new(payload))
    }

    /// Wrap an in-memory tree with an empty backing stream.
    ///
    /// Every file entry must hold materialized content; there is no
    /// stream to resolve lazy reads against.
    pub fn from_tree(root: Directory) -> Self {
        Self {
            root,
            reader: Cursor::new(Vec::new()),
        }
    }
}

impl<R: Read + Seek> Group<R> {
    /// Parse a serialized group body from an already-unwrapped stream.
    ///
    /// # Errors
    ///
    /// Fails on any structural error; no partial tree is returned.
    pub fn parse(mut reader: R) -> GroupResult<Self> {
        let root = parser::read_directory(&mut reader, 0)?;
        Ok(Self { root, reader })
    }

    /// The root directory.
    pub fn root(&self) -> &Directory {
        &self.root
    }

    /// The root directory, mutably.
    pub fn root_mut(&mut self) -> &mut Directory {
        &mut self.root
    }

    /// Borrow the tree and the backing stream at the same time.
    ///
    /// Walking the tree while fetching content needs both halves; a
    /// single method borrow would lock the whole group.
    pub fn split_mut(&mut self) -> (&mut Directory, &mut R) {
        (&mut self.root, &mut self.reader)
    }

    /// Serialize the tree to its group body (pre-envelope) form.
    ///
    /// Offsets and directory sizes are recomputed; lazy entries are read
    /// from the backing stream.
    ///
    /// # Errors
    ///
    /// Fails on any format error; see [`crate::error::GroupError`].
    pub fn build(&mut self) -> GroupResult<Vec<u8>> {
        let Self { root, reader } = self;
        builder::write_directory(root, reader)
    }

    /// Serialize, wrap in the envelope, and write to an archive file.
    ///
    /// # Errors
    ///
    /// Fails on format errors and on the final write.
    pub fn save_to(&mut self, path: impl AsRef<Path>) -> GroupResult<()> {
        let body = self.build()?;
        let disk = envelope::wrap(&body)?;
        std::fs::write(path, disk)?;
        Ok(())
    }
}
