//! Error types for CPIO archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with newc CPIO archives, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. You can
//! handle errors using pattern matching or the `?` operator:
//!
//! ```rust,no_run
//! use newcpio::{Compression, Session, Result};
//!
//! fn remove_entry(archive: &str, path: &str) -> Result<()> {
//!     let mut session = Session::open(archive, Compression::Gzip, None)?;
//!     session.delete(path)?;
//!     session.save(None)?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Effect |
//! |----------|----------|--------|
//! | Format | [`InvalidFormat`][Error::InvalidFormat], [`TruncatedPayload`][Error::TruncatedPayload], [`FieldOverflow`][Error::FieldOverflow] | Fatal to the whole open/write call |
//! | Validation | [`ParentNotFound`][Error::ParentNotFound], [`NotARegularFile`][Error::NotARegularFile], [`UnsupportedFileType`][Error::UnsupportedFileType] | The operation aborts, the container keeps its prior state |
//! | Lookup | [`EntryNotFound`][Error::EntryNotFound] | Reported; the caller decides whether to continue |
//! | I/O | [`Io`][Error::Io], [`FileAccess`][Error::FileAccess] | File system failures |
//! | Unpack | [`NotADirectory`][Error::NotADirectory], [`DestinationNotEmpty`][Error::DestinationNotEmpty] | Destination checks before anything is written |
//! | Unsupported | [`UnsupportedOperation`][Error::UnsupportedOperation] | Always fatal for that call |

use std::io;
use std::path::PathBuf;

/// The main error type for CPIO archive operations.
///
/// Each variant carries the context needed to diagnose the failure: the
/// offending archive path, header field, or byte counts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading or writing a stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive bytes do not form a valid newc CPIO stream.
    ///
    /// This covers a bad record magic, an undecodable hex field, and a
    /// header or name that ends before its declared width. Parsing always
    /// aborts on this error; a partially-read container is never returned.
    #[error("Invalid newc format: {0}")]
    InvalidFormat(String),

    /// A record payload ended before its declared `filesize`.
    #[error("Truncated payload for '{name}': expected {expected} bytes, got {actual}")]
    TruncatedPayload {
        /// Name of the entry whose payload was cut short.
        name: String,
        /// Declared payload size from the header.
        expected: u64,
        /// Bytes actually available.
        actual: u64,
    },

    /// A value does not fit its fixed-width ASCII-hex header field.
    #[error("Value {value:#x} does not fit header field '{field}'")]
    FieldOverflow {
        /// Header field name.
        field: &'static str,
        /// The value that overflowed.
        value: u64,
    },

    /// An entry was not found in the archive.
    ///
    /// Returned by delete and modify when the path is absent. The container
    /// is left unchanged; calling code decides whether to continue.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The parent directory of a new entry is not present in the archive.
    ///
    /// Directories must precede their children, so `add("a/b/c")` requires
    /// an entry named `a/b` to already exist.
    #[error("Cannot add '{path}': parent '{parent}' is not in the archive")]
    ParentNotFound {
        /// The path that was being added.
        path: String,
        /// The missing parent path.
        parent: String,
    },

    /// A data update was requested for an entry that is not a regular file.
    ///
    /// Directory and symlink payloads are immutable through `modify`.
    #[error("Cannot update data for '{path}': not a regular file")]
    NotARegularFile {
        /// The archive path of the entry.
        path: String,
    },

    /// A source file has a type the archive cannot represent via `add`.
    ///
    /// Only regular files, symlinks, and directories can be added from the
    /// file system.
    #[error("Unsupported file type: {path}")]
    UnsupportedFileType {
        /// The source path with the unsupported type.
        path: PathBuf,
    },

    /// A file system access failed for a specific path.
    #[error("Cannot access {path}: {source}", path = .path.display())]
    FileAccess {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The unpack destination exists but is not a directory.
    #[error("{path} is not a directory", path = .path.display())]
    NotADirectory {
        /// The unpack destination.
        path: PathBuf,
    },

    /// The unpack destination is a non-empty directory and `force` was not set.
    ///
    /// Nothing has been written when this error is returned.
    #[error("{path} is not empty; pass force to overwrite its contents", path = .path.display())]
    DestinationNotEmpty {
        /// The unpack destination.
        path: PathBuf,
    },

    /// The requested operation is not supported.
    ///
    /// `pack` (building an archive from a directory tree) always fails with
    /// this error rather than attempting partial behavior.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
}

/// A specialized `Result` type for CPIO archive operations.
pub type Result<T> = std::result::Result<T, Error>;
