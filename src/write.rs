//! Serializing an [`EntryContainer`] back into a newc archive stream.

use std::io::Write;

use crate::container::EntryContainer;
use crate::entry::Entry;
use crate::format::header::RawHeader;
use crate::format::{
    DEFAULT_DEV, HEADER_SIZE, MAGIC_NEWC, MAGIC_NEWC_CRC, TRAILER_NAME, padding_for,
};
use crate::Result;

/// Writes a container as a complete archive stream, trailer included.
///
/// Entries are emitted in container iteration order, each as header,
/// NUL-terminated name, alignment padding, payload, alignment padding. The
/// checksum field is recomputed from `has_crc` and the payload rather than
/// carried from a previous parse. The `TRAILER!!!` sentinel is appended
/// unconditionally, even for an empty container.
///
/// # Errors
///
/// - [`crate::Error::FieldOverflow`] when an entry's metadata does not fit
///   its fixed-width header field.
/// - [`crate::Error::Io`] for write failures.
pub fn write_archive<W: Write>(writer: &mut W, container: &EntryContainer) -> Result<()> {
    let mut written: u64 = 0;
    for entry in container.entries() {
        write_record(writer, entry, &mut written)?;
    }
    write_trailer(writer, &mut written)?;
    Ok(())
}

/// Encodes and writes one entry record.
fn write_record<W: Write>(writer: &mut W, entry: &Entry, written: &mut u64) -> Result<()> {
    let (magic, check) = if entry.has_crc {
        (*MAGIC_NEWC_CRC, u64::from(entry.payload_checksum()))
    } else {
        (*MAGIC_NEWC, 0)
    };

    let header = RawHeader {
        magic,
        ino: entry.inode,
        mode: u64::from(entry.raw_mode()),
        uid: u64::from(entry.uid),
        gid: u64::from(entry.gid),
        nlink: u64::from(entry.nlink),
        mtime: entry.mtime,
        filesize: entry.data.len() as u64,
        dev: entry.dev,
        namesize: entry.name.len() as u64 + 1,
        check,
    };

    writer.write_all(&header.encode()?)?;
    *written += HEADER_SIZE as u64;

    writer.write_all(entry.name.as_bytes())?;
    writer.write_all(&[0])?;
    *written += entry.name.len() as u64 + 1;
    write_padding(writer, written)?;

    writer.write_all(&entry.data)?;
    *written += entry.data.len() as u64;
    write_padding(writer, written)?;
    Ok(())
}

/// Writes the sentinel record that terminates the stream.
///
/// All numeric fields are zero except the name size; the magic is always
/// the no-checksum variant.
fn write_trailer<W: Write>(writer: &mut W, written: &mut u64) -> Result<()> {
    let header = RawHeader {
        magic: *MAGIC_NEWC,
        dev: DEFAULT_DEV,
        namesize: TRAILER_NAME.len() as u64 + 1,
        ..RawHeader::default()
    };

    writer.write_all(&header.encode()?)?;
    *written += HEADER_SIZE as u64;

    writer.write_all(TRAILER_NAME.as_bytes())?;
    writer.write_all(&[0])?;
    *written += TRAILER_NAME.len() as u64 + 1;
    write_padding(writer, written)?;
    Ok(())
}

/// Pads the stream with zero bytes to the next 4-byte boundary.
fn write_padding<W: Write>(writer: &mut W, written: &mut u64) -> Result<()> {
    let padding = padding_for(*written);
    if padding > 0 {
        writer.write_all(&[0u8; 3][..padding as usize])?;
        *written += padding;
    }
    Ok(())
}
