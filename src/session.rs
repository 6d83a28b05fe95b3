//! Load → mutate → save orchestration over one archive file.
//!
//! A [`Session`] owns its [`EntryContainer`] exclusively for its whole
//! lifetime. Mutations apply immediately in memory and flip a dirty flag;
//! nothing touches the file system until [`Session::save`]. The gzip filter
//! sits at the stream boundary only: decompression happens before the codec
//! reads, compression after it writes.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info, warn};

use crate::container::{EntryContainer, EntryUpdate};
use crate::entry::Entry;
use crate::read::read_archive;
use crate::write::write_archive;
use crate::{Error, Result};

/// Whether the archive byte stream is wrapped in a gzip filter.
///
/// This is session-level configuration, not part of the archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Raw newc bytes on disk.
    None,
    /// Gzip-wrapped newc bytes, the usual initramfs form. Written at the
    /// maximum compression level.
    #[default]
    Gzip,
}

/// An editing session over one archive file.
///
/// # Example
///
/// ```rust,no_run
/// use newcpio::{Compression, EntryUpdate, Session};
///
/// fn main() -> newcpio::Result<()> {
///     let mut session = Session::open("rootfs.cpio.gz", Compression::Gzip, None)?;
///     session.modify("etc/hostname", EntryUpdate::new().data(b"gateway\n".as_slice()))?;
///     session.delete("etc/motd")?;
///     session.save(None)?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    container: EntryContainer,
    compression: Compression,
    save_to: Option<PathBuf>,
    dirty: bool,
}

impl Session {
    /// Opens an archive file and parses it into memory.
    ///
    /// `save_to`, when given, becomes the default destination for
    /// [`save`][Self::save]; otherwise saves go back to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileAccess`] if the file cannot be opened and any
    /// codec error from parsing the stream.
    pub fn open(
        path: impl AsRef<Path>,
        compression: Compression,
        save_to: Option<PathBuf>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| Error::FileAccess {
            path: path.clone(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);

        let container = match compression {
            Compression::None => read_archive(&mut reader)?,
            Compression::Gzip => read_archive(&mut GzDecoder::new(reader))?,
        };
        debug!("loaded {} entries from {}", container.len(), path.display());

        Ok(Self {
            path,
            container,
            compression,
            save_to,
            dirty: false,
        })
    }

    /// Returns the archive file path this session was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the in-memory container.
    pub fn container(&self) -> &EntryContainer {
        &self.container
    }

    /// Iterates entries in archive order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.container.entries()
    }

    /// Returns true if unsaved mutations are pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Adds (or overwrites) `archive_path` from a file on disk.
    ///
    /// See [`EntryContainer::add_path`] for the rules applied.
    pub fn add(&mut self, source: &Path, archive_path: &str) -> Result<()> {
        info!(
            "add entry {} to {} [{archive_path}]",
            source.display(),
            self.path.display()
        );
        self.container.add_path(source, archive_path)?;
        self.dirty = true;
        Ok(())
    }

    /// Deletes `archive_path` from the container.
    pub fn delete(&mut self, archive_path: &str) -> Result<()> {
        info!("delete entry {archive_path} from {}", self.path.display());
        self.container.delete(archive_path)?;
        self.dirty = true;
        Ok(())
    }

    /// Applies `update` to the entry at `archive_path`.
    ///
    /// Returns whether anything changed; the dirty flag is only set when
    /// something did.
    pub fn modify(&mut self, archive_path: &str, update: EntryUpdate) -> Result<bool> {
        info!("modify entry {archive_path} in {}", self.path.display());
        let changed = self.container.modify(archive_path, update)?;
        if changed {
            self.dirty = true;
        }
        Ok(changed)
    }

    /// Materializes the container's entries under `target`.
    ///
    /// The target directory is created if absent. An existing non-empty
    /// target is refused unless `force` is set, in which case extraction
    /// proceeds with a warning and overwrites what it finds. Entries are
    /// written in container order: directories with their stored mode,
    /// regular files written then chmod'd (any existing file removed
    /// first) with their stored mtime restored, symlinks recreated (any
    /// existing symlink removed first). Other entry types are skipped with
    /// a warning.
    ///
    /// # Errors
    ///
    /// - [`Error::NotADirectory`] if `target` exists but is not a directory.
    /// - [`Error::DestinationNotEmpty`] if `target` has contents and
    ///   `force` is unset; nothing has been written in that case.
    /// - [`Error::FileAccess`] for file system failures, naming the path.
    pub fn unpack(&self, target: &Path, force: bool) -> Result<()> {
        info!("unpack {} to {}", self.path.display(), target.display());

        if !target.exists() {
            info!("creating directory {}", target.display());
            fs::create_dir_all(target).map_err(|e| access_error(target, e))?;
        }
        if !target.is_dir() {
            return Err(Error::NotADirectory {
                path: target.to_path_buf(),
            });
        }
        let mut dir_listing = fs::read_dir(target).map_err(|e| access_error(target, e))?;
        if dir_listing.next().is_some() {
            if force {
                warn!(
                    "{} is not empty; rewriting files at destination because of the force flag",
                    target.display()
                );
            } else {
                return Err(Error::DestinationNotEmpty {
                    path: target.to_path_buf(),
                });
            }
        }

        for entry in self.container.entries() {
            debug!("{}", entry.name);
            let dest = target.join(&entry.name);
            if entry.is_dir() {
                unpack_dir(entry, &dest)?;
            } else if entry.is_file() {
                unpack_file(entry, &dest)?;
            } else if entry.is_symlink() {
                unpack_symlink(entry, &dest)?;
            } else {
                warn!(
                    "failed to extract {}. File type: {}",
                    entry.name, entry.file_type
                );
            }
        }
        Ok(())
    }

    /// Serializes the container and persists it.
    ///
    /// The destination is `output` if given, else the session's configured
    /// save-to path, else the archive's own path — but when neither
    /// override exists and no mutation is pending, the save is skipped
    /// with a warning and `Ok(false)` is returned.
    ///
    /// The complete byte stream (gzip applied when configured) is built in
    /// memory before any of it reaches the destination; a partial archive
    /// is never flushed.
    pub fn save(&mut self, output: Option<&Path>) -> Result<bool> {
        let dest = if let Some(path) = output {
            path.to_path_buf()
        } else if let Some(path) = &self.save_to {
            path.clone()
        } else if !self.dirty {
            warn!("no modifications done, skipping file write");
            return Ok(false);
        } else {
            self.path.clone()
        };

        let mut raw = Vec::new();
        write_archive(&mut raw, &self.container)?;

        let bytes = match self.compression {
            Compression::None => raw,
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), GzLevel::best());
                encoder.write_all(&raw)?;
                encoder.finish()?
            }
        };

        info!("saving changes to {}", dest.display());
        fs::write(&dest, bytes).map_err(|e| access_error(&dest, e))?;
        self.dirty = false;
        Ok(true)
    }

    /// Building an archive from a directory tree is not supported.
    ///
    /// Always fails with [`Error::UnsupportedOperation`] rather than
    /// attempting partial behavior.
    pub fn pack(&mut self, _output: &Path, _source_dir: &Path) -> Result<()> {
        Err(Error::UnsupportedOperation { operation: "pack" })
    }
}

fn access_error(path: &Path, source: std::io::Error) -> Error {
    Error::FileAccess {
        path: path.to_path_buf(),
        source,
    }
}

fn unpack_dir(entry: &Entry, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| access_error(dest, e))?;
    set_mode(dest, entry.mode)?;
    Ok(())
}

fn unpack_file(entry: &Entry, dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_file(dest).map_err(|e| access_error(dest, e))?;
    }
    fs::write(dest, &entry.data).map_err(|e| access_error(dest, e))?;
    set_mode(dest, entry.mode)?;
    let mtime = FileTime::from_unix_time(entry.mtime as i64, 0);
    filetime::set_file_mtime(dest, mtime).map_err(|e| access_error(dest, e))?;
    Ok(())
}

#[cfg(unix)]
fn unpack_symlink(entry: &Entry, dest: &Path) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    if dest.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()) {
        fs::remove_file(dest).map_err(|e| access_error(dest, e))?;
    }
    let link_target = OsStr::from_bytes(&entry.data);
    std::os::unix::fs::symlink(link_target, dest).map_err(|e| access_error(dest, e))?;
    Ok(())
}

#[cfg(not(unix))]
fn unpack_symlink(entry: &Entry, _dest: &Path) -> Result<()> {
    warn!("symlink {} skipped on this platform", entry.name);
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| access_error(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileType;

    fn write_plain_archive(path: &Path, container: &EntryContainer) {
        let mut bytes = Vec::new();
        write_archive(&mut bytes, container).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn sample_container() -> EntryContainer {
        let mut container = EntryContainer::new();
        let mut dir = Entry::new("etc", FileType::Directory);
        dir.set_mode(0o755);
        dir.inode = 1;
        container.insert(dir);
        let mut file = Entry::new("etc/hosts", FileType::Regular);
        file.set_mode(0o644);
        file.inode = 2;
        file.set_data(b"127.0.0.1 localhost".to_vec());
        container.insert(file);
        container
    }

    #[test]
    fn test_open_plain_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("rootfs.cpio");
        write_plain_archive(&archive, &sample_container());

        let session = Session::open(&archive, Compression::None, None).unwrap();
        assert_eq!(session.container().len(), 2);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_open_missing_file() {
        let err = Session::open("/no/such/archive.cpio", Compression::None, None).unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn test_gzip_roundtrip_through_save() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("rootfs.cpio");
        let gz = dir.path().join("rootfs.cpio.gz");
        write_plain_archive(&plain, &sample_container());

        // Re-save the plain archive as gzip, then open it back.
        let mut session = Session::open(&plain, Compression::None, None).unwrap();
        session.compression = Compression::Gzip;
        assert!(session.save(Some(&gz)).unwrap());

        let reopened = Session::open(&gz, Compression::Gzip, None).unwrap();
        assert_eq!(reopened.container().len(), 2);
        assert_eq!(
            reopened.container().get("etc/hosts").unwrap().data,
            b"127.0.0.1 localhost"
        );
    }

    #[test]
    fn test_save_skipped_when_clean_and_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("rootfs.cpio");
        write_plain_archive(&archive, &sample_container());

        let before = fs::read(&archive).unwrap();
        let mut session = Session::open(&archive, Compression::None, None).unwrap();
        assert!(!session.save(None).unwrap());
        assert_eq!(fs::read(&archive).unwrap(), before);
    }

    #[test]
    fn test_save_clears_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("rootfs.cpio");
        write_plain_archive(&archive, &sample_container());

        let mut session = Session::open(&archive, Compression::None, None).unwrap();
        session.delete("etc/hosts").unwrap();
        assert!(session.is_dirty());
        assert!(session.save(None).unwrap());
        assert!(!session.is_dirty());

        let reopened = Session::open(&archive, Compression::None, None).unwrap();
        assert_eq!(reopened.container().len(), 1);
        assert!(reopened.container().contains("etc"));
    }

    #[test]
    fn test_save_to_default_destination() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("rootfs.cpio");
        let copy = dir.path().join("copy.cpio");
        write_plain_archive(&archive, &sample_container());

        // With a configured save-to, even a clean session writes there.
        let mut session =
            Session::open(&archive, Compression::None, Some(copy.clone())).unwrap();
        assert!(session.save(None).unwrap());
        assert!(copy.exists());
    }

    #[test]
    fn test_pack_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("rootfs.cpio");
        write_plain_archive(&archive, &sample_container());

        let mut session = Session::open(&archive, Compression::None, None).unwrap();
        let err = session
            .pack(&dir.path().join("out.cpio"), dir.path())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOperation { operation: "pack" }
        ));
    }
}
