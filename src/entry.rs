//! In-memory representation of one archive member.

use crate::format::{DEFAULT_DEV, DEV_FIELD_WIDTH, MODE_PERM_MASK, MODE_TYPE_MASK};
use crate::{Error, Result};

/// File type of an archive entry.
///
/// Derived from the file-type bits of the raw mode field at decode time and
/// re-applied at encode time; entries never store the raw bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Named pipe (FIFO).
    NamedPipe,
    /// Character device.
    CharDevice,
    /// Directory.
    Directory,
    /// Block device.
    BlockDevice,
    /// Regular file.
    Regular,
    /// Symbolic link; the entry payload is the link target.
    Symlink,
    /// Unix domain socket.
    Socket,
}

impl FileType {
    /// Decodes the file type from a raw mode field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if the type bits match none of the
    /// seven known kinds.
    pub fn from_mode(raw_mode: u32) -> Result<Self> {
        match raw_mode & MODE_TYPE_MASK {
            0o010000 => Ok(Self::NamedPipe),
            0o020000 => Ok(Self::CharDevice),
            0o040000 => Ok(Self::Directory),
            0o060000 => Ok(Self::BlockDevice),
            0o100000 => Ok(Self::Regular),
            0o120000 => Ok(Self::Symlink),
            0o140000 => Ok(Self::Socket),
            bits => Err(Error::InvalidFormat(format!(
                "unknown file type bits {bits:#o} in mode {raw_mode:#o}"
            ))),
        }
    }

    /// Returns the mode bits for this file type.
    pub fn bits(self) -> u32 {
        match self {
            Self::NamedPipe => 0o010000,
            Self::CharDevice => 0o020000,
            Self::Directory => 0o040000,
            Self::BlockDevice => 0o060000,
            Self::Regular => 0o100000,
            Self::Symlink => 0o120000,
            Self::Socket => 0o140000,
        }
    }

    /// Returns a short lowercase name, used by `list` output.
    pub fn name(self) -> &'static str {
        match self {
            Self::NamedPipe => "named_pipe",
            Self::CharDevice => "char_device",
            Self::Directory => "directory",
            Self::BlockDevice => "block_device",
            Self::Regular => "regular",
            Self::Symlink => "symlink",
            Self::Socket => "socket",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One archive member: metadata plus payload.
///
/// `data` holds the file contents for regular files, the link target bytes
/// for symlinks, and is empty for directories and special types. The `size`
/// field always equals `data.len()`; mutation paths keep the two in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Archive-relative path; the unique key within a container.
    pub name: String,
    /// Payload bytes.
    pub data: Vec<u8>,
    /// Permission bits only (`& 0o7777`); never carries file-type bits.
    pub mode: u32,
    /// File type, kept separate from `mode`.
    pub file_type: FileType,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Hard-link count, passed through opaquely.
    pub nlink: u32,
    /// Modification time, seconds since the epoch.
    pub mtime: u64,
    /// Payload length in bytes; equals `data.len()`.
    pub size: u64,
    /// Whether the record uses the `070702` checksum magic.
    pub has_crc: bool,
    /// Inode number, nominally for hard-link grouping.
    pub inode: u64,
    /// Opaque 32-byte device field.
    pub dev: [u8; DEV_FIELD_WIDTH],
}

impl Entry {
    /// Creates an entry with the given name and type, empty payload, and
    /// defaulted metadata.
    pub fn new(name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
            mode: 0,
            file_type,
            uid: 0,
            gid: 0,
            nlink: 0,
            mtime: 0,
            size: 0,
            has_crc: false,
            inode: 0,
            dev: DEFAULT_DEV,
        }
    }

    /// Replaces the payload, keeping `size` in sync.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.size = data.len() as u64;
        self.data = data;
    }

    /// Sets the permission bits, masking off any file-type bits.
    pub fn set_mode(&mut self, mode: u32) {
        self.mode = mode & MODE_PERM_MASK;
    }

    /// Returns the raw mode field for encoding: permissions plus type bits.
    pub fn raw_mode(&self) -> u32 {
        self.mode | self.file_type.bits()
    }

    /// Returns true if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns true if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::Regular
    }

    /// Returns true if this entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    /// Computes the additive payload checksum used by the `070702` variant:
    /// the sum of all payload bytes truncated to 32 bits.
    pub fn payload_checksum(&self) -> u32 {
        self.data
            .iter()
            .fold(0u32, |sum, &byte| sum.wrapping_add(u32::from(byte)))
    }
}
