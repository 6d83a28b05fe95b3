//! Reading a newc archive stream into an [`EntryContainer`].

use std::io::Read;

use log::warn;

use crate::container::EntryContainer;
use crate::entry::{Entry, FileType};
use crate::format::header::RawHeader;
use crate::format::{
    HEADER_SIZE, MAGIC_NEWC, MAGIC_NEWC_CRC, MODE_PERM_MASK, TRAILER_NAME, padding_for,
};
use crate::{Error, Result};

/// Reads a full archive stream into a container.
///
/// The stream is consumed record by record until the `TRAILER!!!` sentinel;
/// no entry is materialized for the trailer itself. Records appearing later
/// in the stream overwrite earlier records with the same name, exactly as a
/// live overwrite would.
///
/// # Errors
///
/// - [`Error::InvalidFormat`] for an unknown record magic, an undecodable
///   header field, or a stream that ends inside a header or name.
/// - [`Error::TruncatedPayload`] when fewer than `filesize` payload bytes
///   are available.
/// - [`Error::Io`] for other read failures.
///
/// Any error aborts the whole load; a partially-parsed container is never
/// returned.
pub fn read_archive<R: Read>(reader: &mut R) -> Result<EntryContainer> {
    let mut container = EntryContainer::new();
    // Cumulative count drives the 4-byte alignment, as in the wire format.
    let mut consumed: u64 = 0;

    loop {
        let header = RawHeader::read_from(reader)?;
        consumed += HEADER_SIZE as u64;

        let has_crc = match &header.magic {
            m if m == MAGIC_NEWC => false,
            m if m == MAGIC_NEWC_CRC => true,
            other => {
                return Err(Error::InvalidFormat(format!(
                    "wrong magic: {other:02x?}"
                )));
            }
        };

        let name = read_name(reader, header.namesize)?;
        consumed += header.namesize;
        consume_padding(reader, &mut consumed)?;

        if name == TRAILER_NAME {
            break;
        }

        let data = read_payload(reader, &name, header.filesize)?;
        consumed += header.filesize;

        let raw_mode = header.mode as u32;
        let mut entry = Entry::new(name, FileType::from_mode(raw_mode)?);
        entry.mode = raw_mode & MODE_PERM_MASK;
        entry.uid = header.uid as u32;
        entry.gid = header.gid as u32;
        entry.nlink = header.nlink as u32;
        entry.mtime = header.mtime;
        entry.has_crc = has_crc;
        entry.inode = header.ino;
        entry.dev = header.dev;
        entry.set_data(data);
        container.insert(entry);

        consume_padding(reader, &mut consumed)?;
    }

    Ok(container)
}

/// Reads the NUL-terminated name field of one record.
///
/// The trailing NUL is dropped. A name that stops (at an interior NUL)
/// before its declared size is a non-fatal anomaly: it is logged and the
/// truncated name is used as-is.
fn read_name<R: Read>(reader: &mut R, namesize: u64) -> Result<String> {
    let mut buf = vec![0u8; namesize as usize];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::InvalidFormat("stream ended inside a record name".into())
        } else {
            Error::Io(e)
        }
    })?;

    let expected = buf.len().saturating_sub(1);
    let raw = &buf[..expected];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let name = std::str::from_utf8(&raw[..end])
        .map_err(|_| Error::InvalidFormat(format!("record name is not UTF-8: {raw:02x?}")))?;
    if name.len() < expected {
        warn!("{name} (expected: {expected}, actual: {})", name.len());
    }
    Ok(name.to_string())
}

/// Reads exactly `filesize` payload bytes for the named entry.
fn read_payload<R: Read>(reader: &mut R, name: &str, filesize: u64) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(filesize as usize);
    reader.take(filesize).read_to_end(&mut data)?;
    if (data.len() as u64) < filesize {
        return Err(Error::TruncatedPayload {
            name: name.to_string(),
            expected: filesize,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}

/// Discards alignment padding so `consumed` lands on a 4-byte boundary.
///
/// Padding bytes are not validated.
fn consume_padding<R: Read>(reader: &mut R, consumed: &mut u64) -> Result<()> {
    let padding = padding_for(*consumed);
    if padding > 0 {
        let mut buf = [0u8; 3];
        reader
            .read_exact(&mut buf[..padding as usize])
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    Error::InvalidFormat("stream ended inside alignment padding".into())
                } else {
                    Error::Io(e)
                }
            })?;
        *consumed += padding;
    }
    Ok(())
}
