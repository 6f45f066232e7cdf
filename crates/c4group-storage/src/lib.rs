//! Filesystem explode and pack operations for C4Group archives
//!
//! The codec in `c4group-formats` converts between archive bytes and an
//! in-memory tree; this crate converts between that tree and a live
//! directory tree on disk.
//!
//! - [`explode`] extracts an archive into real directories and files,
//!   guarding the source behind a numbered backup for the duration of the
//!   extraction.
//! - [`pack`] rebuilds the archive from such a directory tree, syncing
//!   the in-memory entries with what is actually on disk (updated files
//!   are re-read, vanished entries are dropped, new files and directories
//!   are discovered), then replaces the tree with the archive file.
//!
//! Both walk the tree recursively and run synchronously; one explode or
//! pack cycle completes before another may start on the same path.

#![warn(missing_docs)]

pub mod error;
pub mod explode;
pub mod pack;

pub use error::{StorageError, StorageResult};
pub use explode::{explode, explode_file};
pub use pack::{pack, pack_directory};
