//! Recursive rebuilding of an archive from a real directory tree.
//!
//! Packing is the inverse of exploding and runs depth-first: every
//! in-memory entry is synced against the directory tree on disk, then the
//! tree is removed and the serialized archive written in its place.
//!
//! Sync rules per entry: a matching real directory is recursed into; a
//! matching real file is re-read into materialized content; an entry with
//! no filesystem counterpart is dropped (deleted, not an error). Real
//! files and directories with no corresponding entry are discovered and
//! appended as new entries.

use crate::error::{StorageError, StorageResult};
use c4group_formats::{Directory, Entry, EntryKind, EntryName, Group};
use std::fs;
use std::io::{self, Read, Seek};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Attempts at removing a directory whose removal is transiently denied.
const REMOVE_ATTEMPTS: u32 = 3;

/// Rebuild the archive at `archive_path` from the directory tree of the
/// same name, syncing `group`'s entries with the files actually on disk.
///
/// After the sync the directory tree is removed (bottom-up, retrying
/// transient permission failures) and the serialized archive takes its
/// place.
///
/// # Errors
///
/// Fails with [`StorageError::NotADirectory`] when no directory tree
/// exists at the path, and with filesystem or format errors during the
/// sync, removal, or final write.
pub fn pack<R: Read + Seek>(
    group: &mut Group<R>,
    archive_path: impl AsRef<Path>,
) -> StorageResult<()> {
    let archive_path = archive_path.as_ref();
    if !archive_path.is_dir() {
        return Err(StorageError::NotADirectory(archive_path.to_path_buf()));
    }

    {
        let (root, reader) = group.split_mut();
        sync_directory(root, archive_path, reader)?;
    }

    group.save_to(archive_path)?;
    info!("packed {}", archive_path.display());
    Ok(())
}

/// Pack the directory tree at `path` into a fresh archive.
///
/// Every entry is discovered from disk; use [`pack`] with a previously
/// loaded group to carry over author, version, and entry metadata.
///
/// # Errors
///
/// Fails as [`pack`] does.
pub fn pack_directory(path: impl AsRef<Path>) -> StorageResult<()> {
    let mut group = Group::from_tree(Directory::new());
    pack(&mut group, path)
}

/// Sync one directory's entries with the real directory at `path`, then
/// remove that directory from disk.
fn sync_directory<R: Read + Seek>(
    dir: &mut Directory,
    path: &Path,
    reader: &mut R,
) -> StorageResult<()> {
    dir.modified = fs_mtime(path);

    // Existing entries first, in their stored order.
    let mut kept = Vec::with_capacity(dir.entries.len());
    for mut entry in std::mem::take(&mut dir.entries) {
        let entry_name = entry.name.decoded()?.into_owned();
        let child_path = path.join(&entry_name);

        match &mut entry.kind {
            EntryKind::Directory(sub) if child_path.is_dir() => {
                sync_directory(sub, &child_path, reader)?;
                entry.modified = sub.modified;
                kept.push(entry);
            }
            EntryKind::File(_) if child_path.is_file() => {
                let content = fs::read(&child_path)?;
                entry.modified = fs_mtime(&child_path);
                entry.set_content(content)?;
                kept.push(entry);
            }
            _ => {
                debug!("dropping entry {entry_name}: no filesystem counterpart");
            }
        }
    }

    // Then anything on disk the entry list does not know about.
    let mut discovered = Vec::new();
    for dir_entry in fs::read_dir(path)? {
        let file_name = dir_entry?.file_name();
        let Some(child_name) = file_name.to_str() else {
            warn!("skipping {:?}: not representable as text", file_name);
            continue;
        };
        if kept.iter().any(|e: &Entry| e.name.matches(child_name)) {
            continue;
        }
        discovered.push(child_name.to_string());
    }
    discovered.sort();

    for child_name in discovered {
        let child_path = path.join(&child_name);
        let entry_name = EntryName::try_from(child_name.as_str())?;
        debug!("discovered {}", child_path.display());

        if child_path.is_dir() {
            let modified = fs_mtime(&child_path);
            let mut sub = Directory::new();
            sub.author = dir.author.clone();
            sub.version = dir.version;
            sub.original = dir.original;
            sync_directory(&mut sub, &child_path, reader)?;
            let mut entry = Entry::new_directory(entry_name, sub);
            entry.modified = modified;
            kept.push(entry);
        } else {
            let metadata = fs::metadata(&child_path)?;
            let mut entry = Entry::new_file(entry_name, fs::read(&child_path)?)?;
            entry.modified = fs_mtime(&child_path);
            entry.executable = is_executable(&metadata);
            kept.push(entry);
        }
    }

    dir.entries = kept;
    remove_dir_all_retry(path)
}

/// Remove a directory tree, retrying a transiently denied removal.
fn remove_dir_all_retry(path: &Path) -> StorageResult<()> {
    let mut attempt = 1;
    loop {
        match fs::remove_dir_all(path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied && attempt < REMOVE_ATTEMPTS => {
                warn!(
                    "removal of {} denied (attempt {attempt}), retrying",
                    path.display()
                );
                std::thread::sleep(Duration::from_millis(50));
                attempt += 1;
            }
            Err(source) => {
                return Err(StorageError::RemoveDir {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// A path's modification time as u32 epoch seconds.
///
/// Timestamps the format cannot represent (pre-epoch, beyond 2106, or
/// unavailable on this filesystem) fall back to zero; this is the one
/// place corruption is tolerated rather than failed on.
fn fs_mtime(path: &Path) -> u32 {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            debug!("no modification time for {}: {e}", path.display());
            return 0;
        }
    };
    match modified
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ())
        .and_then(|d| u32::try_from(d.as_secs()).map_err(|_| ()))
    {
        Ok(secs) => secs,
        Err(()) => {
            warn!(
                "modification time of {} is outside the representable range",
                path.display()
            );
            0
        }
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_mtime_of_fresh_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("file.txt");
        fs::write(&path, b"x").expect("write should succeed");

        // A file written just now has a sane, representable mtime.
        let mtime = fs_mtime(&path);
        assert!(mtime > 0);
    }

    #[test]
    fn test_fs_mtime_of_missing_file_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        assert_eq!(fs_mtime(&dir.path().join("missing")), 0);
    }

    #[test]
    fn test_pack_requires_directory() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("not-there");
        assert!(matches!(
            pack_directory(&path),
            Err(StorageError::NotADirectory(_))
        ));
    }
}
