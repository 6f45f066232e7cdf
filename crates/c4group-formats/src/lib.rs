//! Parser and builder for the C4Group archive container format
//!
//! C4Group is the container format of the Clonk engine family: a single
//! gzip stream with deliberately corrupted magic bytes wrapping a
//! recursive tree of named entries. Each directory serializes as an
//! obfuscated 204-byte header, a table of 316-byte entry records, and the
//! concatenated content of its children.
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: both parsing and building supported
//! - **Bit-Exact Layout**: field offsets match what third-party readers
//!   expect, including the envelope's two doctored magic bytes
//! - **Lazy Content**: entry bytes are fetched from the backing stream on
//!   demand and only materialized when explicitly set
//! - **Round-Trip Guarantee**: a built tree parses back to an equal tree
//!
//! # Examples
//!
//! ```
//! use c4group_formats::{Directory, Entry, EntryName, Group};
//!
//! let mut root = Directory::new();
//! root.author = "Tester".into();
//! root.version = (1, 0);
//! root.entries.push(Entry::new_file(
//!     EntryName::try_from("Readme.txt")?,
//!     b"hello".to_vec(),
//! )?);
//!
//! let mut group = Group::from_tree(root);
//! let body = group.build()?;
//!
//! let mut loaded = Group::parse(std::io::Cursor::new(body))?;
//! let (tree, stream) = loaded.split_mut();
//! let readme = tree.entry("Readme.txt").expect("entry exists");
//! assert_eq!(readme.content(stream)?, b"hello");
//! # Ok::<(), c4group_formats::GroupError>(())
//! ```

#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod group;

pub use error::{GroupError, GroupResult};
pub use group::{Content, Directory, Entry, EntryKind, EntryName, Group};
