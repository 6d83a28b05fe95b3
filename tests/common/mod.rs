//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use newcpio::{Entry, EntryContainer, FileType, read_archive, write_archive};

/// Builds a directory entry with sensible defaults.
pub fn dir_entry(name: &str, inode: u64) -> Entry {
    let mut entry = Entry::new(name, FileType::Directory);
    entry.set_mode(0o755);
    entry.nlink = 2;
    entry.inode = inode;
    entry
}

/// Builds a regular-file entry with the given payload.
pub fn file_entry(name: &str, inode: u64, data: &[u8]) -> Entry {
    let mut entry = Entry::new(name, FileType::Regular);
    entry.set_mode(0o644);
    entry.nlink = 1;
    entry.inode = inode;
    entry.mtime = 1_700_000_000;
    entry.set_data(data.to_vec());
    entry
}

/// Builds a symlink entry pointing at `target`.
pub fn symlink_entry(name: &str, inode: u64, target: &str) -> Entry {
    let mut entry = Entry::new(name, FileType::Symlink);
    entry.set_mode(0o777);
    entry.nlink = 1;
    entry.inode = inode;
    entry.set_data(target.as_bytes().to_vec());
    entry
}

/// A small rootfs-shaped container used by several test files:
/// a directory, a file under it, a top-level file, and a symlink.
pub fn sample_container() -> EntryContainer {
    let mut container = EntryContainer::new();
    container.insert(dir_entry("etc", 1));
    container.insert(file_entry("etc/hosts", 2, b"127.0.0.1 localhost\n"));
    container.insert(file_entry("init", 3, b"#!/bin/sh\nexec /sbin/real-init\n"));
    container.insert(symlink_entry("sbin", 4, "usr/sbin"));
    container
}

/// Serializes a container to newc bytes.
pub fn serialize(container: &EntryContainer) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_archive(&mut bytes, container).expect("serialization failed");
    bytes
}

/// Parses newc bytes back into a container.
pub fn parse(bytes: &[u8]) -> newcpio::Result<EntryContainer> {
    read_archive(&mut Cursor::new(bytes))
}

/// Writes a container to a plain (uncompressed) archive file on disk.
pub fn write_plain_archive(path: &Path, container: &EntryContainer) {
    std::fs::write(path, serialize(container)).expect("writing archive file failed");
}

/// Asserts that two containers hold the same entries in the same order,
/// comparing every field.
pub fn assert_containers_equal(left: &EntryContainer, right: &EntryContainer) {
    assert_eq!(left.len(), right.len(), "entry count differs");
    for (a, b) in left.entries().zip(right.entries()) {
        assert_eq!(a, b, "entry '{}' differs after round trip", a.name);
    }
}
