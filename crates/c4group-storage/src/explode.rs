//! Recursive extraction of an archive into a real directory tree.
//!
//! The archive file itself is renamed to a numbered backup before any
//! write happens, so a failing extraction can never clobber its source;
//! the backup is deleted only once the whole tree is on disk.

use crate::error::{StorageError, StorageResult};
use c4group_crypto::verify_crc;
use c4group_formats::{Directory, EntryKind, Group};
use std::ffi::OsStr;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extract `group` into a directory tree named after `archive_path`.
///
/// The archive at `archive_path` is first renamed to `<stem>.000` (stem
/// is the file name up to its first dot). A directory with the archive's
/// name is created in its place and the tree is written into it; on full
/// success the backup is removed again.
///
/// # Errors
///
/// Fails with [`StorageError::BackupExists`] or
/// [`StorageError::BackupRename`] before anything is written, and with
/// filesystem or format errors during extraction. A mid-tree failure
/// leaves already-written siblings and the backup in place.
pub fn explode<R: Read + Seek>(
    group: &mut Group<R>,
    archive_path: impl AsRef<Path>,
) -> StorageResult<()> {
    let archive_path = archive_path.as_ref();
    let backup = backup_path(archive_path)?;
    if backup.exists() {
        return Err(StorageError::BackupExists(backup));
    }
    fs::rename(archive_path, &backup).map_err(|source| StorageError::BackupRename {
        path: archive_path.to_path_buf(),
        source,
    })?;
    info!(
        "exploding {} (backup at {})",
        archive_path.display(),
        backup.display()
    );

    let (root, reader) = group.split_mut();
    create_dir(archive_path)?;
    write_tree(root, archive_path, reader)?;

    fs::remove_file(&backup)?;
    Ok(())
}

/// Open the archive at `path` and explode it in place.
///
/// # Errors
///
/// Fails as [`explode`] does, or earlier if the archive cannot be opened.
pub fn explode_file(path: impl AsRef<Path>) -> StorageResult<()> {
    let path = path.as_ref();
    let mut group = Group::open(path)?;
    explode(&mut group, path)
}

/// Write one directory's children below `path`, recursing into nested
/// directories.
fn write_tree<R: Read + Seek>(
    dir: &Directory,
    path: &Path,
    reader: &mut R,
) -> StorageResult<()> {
    for entry in &dir.entries {
        let entry_name = entry.name.decoded()?;
        let child_path = path.join(entry_name.as_ref());

        match &entry.kind {
            EntryKind::Directory(sub) => {
                create_dir(&child_path)?;
                write_tree(sub, &child_path, reader)?;
            }
            EntryKind::File(_) => {
                let content = entry.content(reader)?;
                if let Some(expected) = entry.crc
                    && !verify_crc(&content, expected)
                {
                    warn!("checksum mismatch for {}", child_path.display());
                }
                debug!(
                    "writing {} ({} bytes)",
                    child_path.display(),
                    content.len()
                );
                fs::write(&child_path, content)?;
                if entry.executable {
                    set_executable(&child_path)?;
                }
            }
        }
    }
    Ok(())
}

fn create_dir(path: &Path) -> StorageResult<()> {
    fs::create_dir(path).map_err(|source| StorageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Backup name for an archive: the file name up to its first dot, with a
/// `.000` suffix, next to the archive.
fn backup_path(archive_path: &Path) -> StorageResult<PathBuf> {
    let file_name = archive_path
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| StorageError::InvalidArchivePath(archive_path.to_path_buf()))?;
    let stem = file_name.split('.').next().unwrap_or(file_name);
    Ok(archive_path.with_file_name(format!("{stem}.000")))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> StorageResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> StorageResult<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_uses_first_dot() {
        let backup = backup_path(Path::new("/tmp/Scenario.ocs")).expect("valid path");
        assert_eq!(backup, Path::new("/tmp/Scenario.000"));

        // Multi-extension names back up under the shortest stem.
        let backup = backup_path(Path::new("/tmp/Pack.c4g.bak")).expect("valid path");
        assert_eq!(backup, Path::new("/tmp/Pack.000"));
    }

    #[test]
    fn test_backup_path_without_extension() {
        let backup = backup_path(Path::new("/tmp/Scenario")).expect("valid path");
        assert_eq!(backup, Path::new("/tmp/Scenario.000"));
    }

    #[test]
    fn test_backup_path_requires_file_name() {
        assert!(matches!(
            backup_path(Path::new("/")),
            Err(StorageError::InvalidArchivePath(_))
        ));
    }
}
