//! End-to-end archive round-trips through real files.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use c4group_formats::envelope::{DISK_MAGIC, GZIP_MAGIC};
use c4group_formats::{Directory, Entry, EntryName, Group};
use flate2::read::GzDecoder;
use pretty_assertions::assert_eq;
use std::io::Read;

fn name(s: &str) -> EntryName {
    EntryName::try_from(s).expect("valid name")
}

fn sample_tree() -> Directory {
    let mut sub = Directory::new();
    sub.author = "Tester".into();
    sub.version = (1, 0);
    sub.entries.push(
        Entry::new_file(name("a.bin"), vec![0x00, 0x01]).expect("new_file should succeed"),
    );

    let mut root = Directory::new();
    root.author = "Tester".into();
    root.version = (1, 0);
    root.entries.push(
        Entry::new_file(name("Readme.txt"), b"hello".to_vec())
            .expect("new_file should succeed"),
    );
    root.entries.push(Entry::new_directory(name("Sub"), sub));
    root
}

#[test]
fn save_and_open_through_file() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("scenario.c4g");

    let mut group = Group::from_tree(sample_tree());
    group.save_to(&path).expect("save should succeed");

    let mut loaded = Group::open(&path).expect("open should succeed");
    let (root, stream) = loaded.split_mut();

    assert_eq!(root.author, "Tester");
    assert_eq!(root.version, (1, 0));

    let readme = root.entry("Readme.txt").expect("entry exists");
    assert_eq!(readme.content(stream).expect("content should read"), b"hello");

    let sub = root
        .entry("Sub")
        .and_then(Entry::directory)
        .expect("Sub is a directory");
    let a_bin = sub.entry("a.bin").expect("entry exists");
    assert_eq!(
        a_bin.content(stream).expect("content should read"),
        vec![0x00, 0x01]
    );
}

#[test]
fn archive_on_disk_carries_doctored_magic() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("magic.c4g");

    let mut group = Group::from_tree(sample_tree());
    let body = group.build().expect("build should succeed");
    group.save_to(&path).expect("save should succeed");

    let mut disk = std::fs::read(&path).expect("archive should be readable");
    assert_eq!(disk[..2], DISK_MAGIC);

    // With the two magic bytes restored, a stock gzip decoder opens the
    // archive and yields the exact serialized body.
    disk[..2].copy_from_slice(&GZIP_MAGIC);
    let mut decoder = GzDecoder::new(disk.as_slice());
    let mut payload = Vec::new();
    decoder
        .read_to_end(&mut payload)
        .expect("patched archive should inflate");
    assert_eq!(payload, body);
}

#[test]
fn reopened_archive_rebuilds_identically() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("stable.c4g");

    let mut group = Group::from_tree(sample_tree());
    group.save_to(&path).expect("save should succeed");
    let body = group.build().expect("build should succeed");

    // A freshly opened archive, never materialized, rebuilds the same
    // body from its lazy entries.
    let mut reopened = Group::open(&path).expect("open should succeed");
    assert_eq!(reopened.build().expect("build should succeed"), body);
}
