//! Ordered, path-keyed collection of entries with invariant-enforcing
//! mutation operations.
//!
//! The container pairs an insertion-order index with a path-to-entry map so
//! that uniqueness, parent-existence, and inode bookkeeping live in one set
//! of methods. Iteration order equals wire order: the sequence entries were
//! parsed or added in is the sequence they serialize back out in.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::entry::{Entry, FileType};
use crate::format::{DEFAULT_DEV, MODE_PERM_MASK};
use crate::{Error, Result};

/// Optional field updates applied by [`EntryContainer::modify`].
///
/// Each field is applied independently when present. Construct with the
/// builder methods:
///
/// ```rust
/// use newcpio::EntryUpdate;
///
/// let update = EntryUpdate::new().mode(0o600).uid(0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    /// New owner user id.
    pub uid: Option<u32>,
    /// New owner group id.
    pub gid: Option<u32>,
    /// New permission bits (file-type bits are masked off).
    pub mode: Option<u32>,
    /// New payload; only valid for regular files.
    pub data: Option<Vec<u8>>,
}

impl EntryUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the owner user id.
    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Sets the owner group id.
    pub fn gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    /// Sets the permission bits.
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the payload.
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none() && self.mode.is_none() && self.data.is_none()
    }
}

/// An ordered mapping from archive path to [`Entry`].
///
/// Invariants held after every successful operation:
///
/// 1. Names are unique.
/// 2. Entries added through [`add_path`][Self::add_path] have their parent
///    path already present (parsing does not require this).
/// 3. The next free inode strictly exceeds every inode present; overwriting
///    a path keeps that path's original inode and device field.
/// 4. Entry modes never carry file-type bits.
#[derive(Debug, Clone, Default)]
pub struct EntryContainer {
    order: Vec<String>,
    entries: HashMap<String, Entry>,
    next_inode: u64,
}

impl EntryContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the container holds no entries.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true if an entry with this exact name exists.
    ///
    /// Names are compared as-is, without normalization.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the entry with this name, if present.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Returns the smallest inode number strictly greater than every inode
    /// currently or previously present.
    pub fn next_inode(&self) -> u64 {
        self.next_inode
    }

    /// Iterates entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().map(|name| &self.entries[name])
    }

    /// Inserts an entry keyed by its name.
    ///
    /// An existing entry with the same name is replaced in place, keeping
    /// its position in the order. The inode watermark is advanced past the
    /// inserted entry's inode.
    pub fn insert(&mut self, entry: Entry) {
        self.next_inode = self.next_inode.max(entry.inode.saturating_add(1));
        let name = entry.name.clone();
        if self.entries.insert(name.clone(), entry).is_none() {
            self.order.push(name);
        }
    }

    /// Adds an entry at `archive_path`, reading metadata and contents from
    /// `source` on the file system.
    ///
    /// Metadata comes from the source's status without following symlinks.
    /// Regular files contribute their contents, symlinks their target
    /// string, directories an empty payload. If `archive_path` already
    /// exists it is overwritten with a warning, reusing the prior inode and
    /// device field; otherwise the next free inode and a zero-filled device
    /// field are used.
    ///
    /// # Errors
    ///
    /// - [`Error::FileAccess`] if the source cannot be read.
    /// - [`Error::ParentNotFound`] if `archive_path` has a non-empty parent
    ///   that is not in the container.
    /// - [`Error::UnsupportedFileType`] for sources that are neither
    ///   regular files, symlinks, nor directories.
    pub fn add_path(&mut self, source: &Path, archive_path: &str) -> Result<()> {
        let meta = fs::symlink_metadata(source).map_err(|e| Error::FileAccess {
            path: source.to_path_buf(),
            source: e,
        })?;

        if let Some(parent) = parent_path(archive_path) {
            if !self.contains(parent) {
                return Err(Error::ParentNotFound {
                    path: archive_path.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let (file_type, data) = if meta.file_type().is_file() {
            let data = fs::read(source).map_err(|e| Error::FileAccess {
                path: source.to_path_buf(),
                source: e,
            })?;
            (FileType::Regular, data)
        } else if meta.file_type().is_symlink() {
            let target = fs::read_link(source).map_err(|e| Error::FileAccess {
                path: source.to_path_buf(),
                source: e,
            })?;
            (FileType::Symlink, os_str_bytes(target.as_os_str()))
        } else if meta.file_type().is_dir() {
            (FileType::Directory, Vec::new())
        } else {
            return Err(Error::UnsupportedFileType {
                path: source.to_path_buf(),
            });
        };

        let (inode, dev) = match self.get(archive_path) {
            Some(existing) => {
                warn!("overwriting {archive_path}");
                (existing.inode, existing.dev)
            }
            None => (self.next_inode, DEFAULT_DEV),
        };

        let mut entry = Entry::new(archive_path, file_type);
        entry.set_mode(unix_mode(&meta));
        entry.uid = unix_uid(&meta);
        entry.gid = unix_gid(&meta);
        entry.nlink = unix_nlink(&meta);
        entry.mtime = unix_mtime(&meta);
        entry.inode = inode;
        entry.dev = dev;
        entry.set_data(data);
        self.insert(entry);
        Ok(())
    }

    /// Removes the entry at `archive_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] (after logging the miss) if the
    /// path is absent; the container is unchanged.
    pub fn delete(&mut self, archive_path: &str) -> Result<()> {
        if self.entries.remove(archive_path).is_none() {
            warn!("{archive_path} not found in the archive");
            return Err(Error::EntryNotFound {
                path: archive_path.to_string(),
            });
        }
        info!("removing {archive_path} from the archive");
        self.order.retain(|name| name != archive_path);
        Ok(())
    }

    /// Applies the fields of `update` to the entry at `archive_path`.
    ///
    /// Returns whether at least one field was actually changed. A data
    /// update is validated before anything is applied: if the entry is not
    /// a regular file the whole operation fails and the container keeps its
    /// prior state.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if the path is absent.
    /// - [`Error::NotARegularFile`] if `update.data` is set and the entry
    ///   is not a regular file.
    pub fn modify(&mut self, archive_path: &str, update: EntryUpdate) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(archive_path)
            .ok_or_else(|| Error::EntryNotFound {
                path: archive_path.to_string(),
            })?;

        if update.data.is_some() && !entry.is_file() {
            return Err(Error::NotARegularFile {
                path: archive_path.to_string(),
            });
        }

        let mut changed = false;
        if let Some(data) = update.data {
            info!("{archive_path}: updated data ({} bytes)", data.len());
            entry.set_data(data);
            changed = true;
        }
        if let Some(uid) = update.uid {
            info!("{archive_path}: [uid] {} => {uid}", entry.uid);
            entry.uid = uid;
            changed = true;
        }
        if let Some(gid) = update.gid {
            info!("{archive_path}: [gid] {} => {gid}", entry.gid);
            entry.gid = gid;
            changed = true;
        }
        if let Some(mode) = update.mode {
            info!(
                "{archive_path}: [mode] {:o} => {:o}",
                entry.mode,
                mode & MODE_PERM_MASK
            );
            entry.set_mode(mode);
            changed = true;
        }
        Ok(changed)
    }
}

/// Returns the parent of an archive path, or `None` for top-level names.
fn parent_path(name: &str) -> Option<&str> {
    match name.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => Some(parent),
        _ => None,
    }
}

#[cfg(unix)]
fn os_str_bytes(s: &std::ffi::OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_str_bytes(s: &std::ffi::OsStr) -> Vec<u8> {
    s.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn unix_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

#[cfg(unix)]
fn unix_uid(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.uid()
}

#[cfg(unix)]
fn unix_gid(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.gid()
}

#[cfg(unix)]
fn unix_nlink(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.nlink() as u32
}

#[cfg(unix)]
fn unix_mtime(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.mtime().max(0) as u64
}

#[cfg(not(unix))]
fn unix_mode(_meta: &fs::Metadata) -> u32 {
    0o644
}

#[cfg(not(unix))]
fn unix_uid(_meta: &fs::Metadata) -> u32 {
    0
}

#[cfg(not(unix))]
fn unix_gid(_meta: &fs::Metadata) -> u32 {
    0
}

#[cfg(not(unix))]
fn unix_nlink(_meta: &fs::Metadata) -> u32 {
    1
}

#[cfg(not(unix))]
fn unix_mtime(meta: &fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_entry(name: &str, inode: u64) -> Entry {
        let mut entry = Entry::new(name, FileType::Directory);
        entry.set_mode(0o755);
        entry.inode = inode;
        entry
    }

    fn file_entry(name: &str, inode: u64, data: &[u8]) -> Entry {
        let mut entry = Entry::new(name, FileType::Regular);
        entry.set_mode(0o644);
        entry.inode = inode;
        entry.set_data(data.to_vec());
        entry
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut container = EntryContainer::new();
        container.insert(dir_entry("etc", 1));
        container.insert(file_entry("etc/hosts", 2, b"127.0.0.1 localhost"));
        container.insert(dir_entry("bin", 3));

        let names: Vec<_> = container.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["etc", "etc/hosts", "bin"]);
    }

    #[test]
    fn test_insert_overwrite_keeps_position() {
        let mut container = EntryContainer::new();
        container.insert(dir_entry("etc", 1));
        container.insert(file_entry("etc/hosts", 2, b"old"));
        container.insert(dir_entry("bin", 3));
        container.insert(file_entry("etc/hosts", 2, b"new"));

        assert_eq!(container.len(), 3);
        let names: Vec<_> = container.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["etc", "etc/hosts", "bin"]);
        assert_eq!(container.get("etc/hosts").unwrap().data, b"new");
    }

    #[test]
    fn test_inode_watermark() {
        let mut container = EntryContainer::new();
        assert_eq!(container.next_inode(), 0);
        container.insert(dir_entry("etc", 7));
        assert_eq!(container.next_inode(), 8);
        container.insert(dir_entry("bin", 2));
        assert_eq!(container.next_inode(), 8);
    }

    #[test]
    fn test_delete_absent_leaves_container_unchanged() {
        let mut container = EntryContainer::new();
        container.insert(dir_entry("etc", 1));

        let err = container.delete("etc/hosts").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
        assert_eq!(container.len(), 1);

        container.delete("etc").unwrap();
        assert!(container.is_empty());
    }

    #[test]
    fn test_modify_mode_keeps_type() {
        let mut container = EntryContainer::new();
        container.insert(file_entry("etc/hosts", 1, b"x"));

        let changed = container
            .modify("etc/hosts", EntryUpdate::new().mode(0o100600))
            .unwrap();
        assert!(changed);

        let entry = container.get("etc/hosts").unwrap();
        assert_eq!(entry.mode, 0o600);
        assert_eq!(entry.file_type, FileType::Regular);
    }

    #[test]
    fn test_modify_data_on_directory_rejected_atomically() {
        let mut container = EntryContainer::new();
        container.insert(dir_entry("etc", 1));

        let err = container
            .modify("etc", EntryUpdate::new().uid(42).data(b"payload".as_slice()))
            .unwrap_err();
        assert!(matches!(err, Error::NotARegularFile { .. }));

        // The rejected update must not have applied the uid either.
        let entry = container.get("etc").unwrap();
        assert_eq!(entry.uid, 0);
        assert!(entry.data.is_empty());
    }

    #[test]
    fn test_modify_updates_data_and_size() {
        let mut container = EntryContainer::new();
        container.insert(file_entry("etc/hosts", 1, b"old"));

        let changed = container
            .modify("etc/hosts", EntryUpdate::new().data(b"longer payload".as_slice()))
            .unwrap();
        assert!(changed);
        let entry = container.get("etc/hosts").unwrap();
        assert_eq!(entry.data, b"longer payload");
        assert_eq!(entry.size, 14);
    }

    #[test]
    fn test_modify_absent_path() {
        let mut container = EntryContainer::new();
        let err = container
            .modify("missing", EntryUpdate::new().uid(1))
            .unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
    }

    #[test]
    fn test_modify_empty_update_reports_no_change() {
        let mut container = EntryContainer::new();
        container.insert(file_entry("etc/hosts", 1, b"x"));
        let changed = container.modify("etc/hosts", EntryUpdate::new()).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("a/b/c"), Some("a/b"));
        assert_eq!(parent_path("a/b"), Some("a"));
        assert_eq!(parent_path("a"), None);
        assert_eq!(parent_path("/a"), None);
    }

    mod add_path {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_add_regular_file() {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("hosts");
            let mut f = std::fs::File::create(&source).unwrap();
            f.write_all(b"127.0.0.1 localhost").unwrap();
            drop(f);

            let mut container = EntryContainer::new();
            container.insert(dir_entry("etc", 1));
            container.add_path(&source, "etc/hosts").unwrap();

            let entry = container.get("etc/hosts").unwrap();
            assert_eq!(entry.file_type, FileType::Regular);
            assert_eq!(entry.data, b"127.0.0.1 localhost");
            assert_eq!(entry.size, 19);
            assert_eq!(entry.inode, 2);
            assert_eq!(entry.mode & MODE_PERM_MASK, entry.mode);
        }

        #[test]
        fn test_add_missing_source() {
            let dir = tempfile::tempdir().unwrap();
            let mut container = EntryContainer::new();
            let err = container
                .add_path(&dir.path().join("missing"), "etc")
                .unwrap_err();
            assert!(matches!(err, Error::FileAccess { .. }));
        }

        #[test]
        fn test_add_missing_parent_leaves_container_unchanged() {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("file");
            std::fs::write(&source, b"data").unwrap();

            let mut container = EntryContainer::new();
            let err = container.add_path(&source, "a/b/c").unwrap_err();
            match err {
                Error::ParentNotFound { path, parent } => {
                    assert_eq!(path, "a/b/c");
                    assert_eq!(parent, "a/b");
                }
                e => panic!("expected ParentNotFound, got: {e:?}"),
            }
            assert!(container.is_empty());
        }

        #[test]
        fn test_add_top_level_needs_no_parent() {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("file");
            std::fs::write(&source, b"data").unwrap();

            let mut container = EntryContainer::new();
            container.add_path(&source, "init").unwrap();
            assert!(container.contains("init"));
        }

        #[test]
        fn test_add_overwrite_preserves_inode_and_dev() {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("file");
            std::fs::write(&source, b"new contents").unwrap();

            let mut container = EntryContainer::new();
            let mut existing = file_entry("init", 17, b"old");
            existing.dev[..2].copy_from_slice(b"ab");
            let dev = existing.dev;
            container.insert(existing);

            container.add_path(&source, "init").unwrap();
            let entry = container.get("init").unwrap();
            assert_eq!(entry.inode, 17);
            assert_eq!(entry.dev, dev);
            assert_eq!(entry.data, b"new contents");
        }

        #[test]
        fn test_add_new_path_allocates_monotonic_inode() {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("file");
            std::fs::write(&source, b"data").unwrap();

            let mut container = EntryContainer::new();
            container.insert(dir_entry("etc", 9));
            container.add_path(&source, "hosts").unwrap();

            let entry = container.get("hosts").unwrap();
            assert_eq!(entry.inode, 10);
            assert_eq!(entry.dev, DEFAULT_DEV);
            assert!(container.next_inode() > entry.inode);
        }

        #[cfg(unix)]
        #[test]
        fn test_add_symlink_stores_target() {
            let dir = tempfile::tempdir().unwrap();
            let link = dir.path().join("link");
            std::os::unix::fs::symlink("../bin/busybox", &link).unwrap();

            let mut container = EntryContainer::new();
            container.add_path(&link, "sbin").unwrap();

            let entry = container.get("sbin").unwrap();
            assert_eq!(entry.file_type, FileType::Symlink);
            assert_eq!(entry.data, b"../bin/busybox");
        }

        #[test]
        fn test_add_directory_has_empty_payload() {
            let dir = tempfile::tempdir().unwrap();
            let sub = dir.path().join("sub");
            std::fs::create_dir(&sub).unwrap();

            let mut container = EntryContainer::new();
            container.add_path(&sub, "var").unwrap();

            let entry = container.get("var").unwrap();
            assert_eq!(entry.file_type, FileType::Directory);
            assert!(entry.data.is_empty());
            assert_eq!(entry.size, 0);
        }
    }
}
