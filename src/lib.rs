//! # newcpio
//!
//! A pure-Rust library for reading, editing, and writing CPIO archives in
//! the "newc" variant — the format used by Linux initramfs images.
//!
//! The whole archive is materialized in memory as an ordered, path-keyed
//! [`EntryContainer`]; file-level edit operations (add, delete, modify,
//! unpack, list) run against that container and a [`Session`] persists the
//! result, optionally through a gzip filter.
//!
//! ## Quick Start
//!
//! ### Listing an Archive
//!
//! ```rust,no_run
//! use newcpio::{Compression, Session, Result};
//!
//! fn main() -> Result<()> {
//!     let session = Session::open("rootfs.cpio.gz", Compression::Gzip, None)?;
//!     for entry in session.entries() {
//!         println!("{:>7o} {:>16} {}", entry.mode, entry.file_type, entry.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Editing an Archive
//!
//! ```rust,no_run
//! use newcpio::{Compression, EntryUpdate, Session, Result};
//!
//! fn main() -> Result<()> {
//!     let mut session = Session::open("rootfs.cpio.gz", Compression::Gzip, None)?;
//!
//!     // Replace a file's contents and tighten its permissions
//!     session.modify(
//!         "etc/shadow",
//!         EntryUpdate::new().mode(0o600).data(b"root:*:19000:0:99999:7:::\n".as_slice()),
//!     )?;
//!
//!     // Drop an entry; absence is a reported error, not a panic
//!     session.delete("etc/motd")?;
//!
//!     // Persist (recompressing with gzip) back to the original path
//!     session.save(None)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Working with Raw Streams
//!
//! The codec itself only sees `Read`/`Write` streams; [`Session`] is a thin
//! adapter that opens paths and applies the compression filter:
//!
//! ```rust
//! use newcpio::{read_archive, write_archive, Entry, EntryContainer, FileType};
//! use std::io::Cursor;
//!
//! # fn main() -> newcpio::Result<()> {
//! let mut container = EntryContainer::new();
//! let mut entry = Entry::new("init", FileType::Regular);
//! entry.set_mode(0o755);
//! entry.set_data(b"#!/bin/sh\n".to_vec());
//! container.insert(entry);
//!
//! let mut bytes = Vec::new();
//! write_archive(&mut bytes, &container)?;
//! let reparsed = read_archive(&mut Cursor::new(bytes))?;
//! assert_eq!(reparsed.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Format errors abort a whole
//! `open`/`write` call; validation and lookup errors abort only the
//! offending operation and leave the container in its prior valid state.
//!
//! ## Scope
//!
//! Only the newc header layout is supported ("newc+crc" as the
//! checksum-field magic variant, not the older binary or octal layouts).
//! Hard links are carried passively through the inode and device fields,
//! archives are edited wholly in memory by a single session, and `pack`
//! (building an archive from a directory tree) is deliberately
//! unsupported.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod container;
pub mod entry;
pub mod error;
pub mod format;
pub mod read;
pub mod session;
pub mod write;

pub use container::{EntryContainer, EntryUpdate};
pub use entry::{Entry, FileType};
pub use error::{Error, Result};
pub use read::read_archive;
pub use session::{Compression, Session};
pub use write::write_archive;
