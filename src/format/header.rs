//! The fixed 110-byte newc record header.
//!
//! Every record starts with eleven fixed-width fields. The magic and device
//! fields are kept as raw bytes; everything else is an unsigned integer
//! encoded as lowercase zero-padded ASCII hex.

use std::io::Read;

use crate::{Error, Result};

use super::{DEV_FIELD_WIDTH, HEADER_SIZE, HEX_FIELD_WIDTH, MAGIC_NEWC};

/// A decoded newc record header.
///
/// Field names follow the on-disk layout. `magic` and `dev` are opaque;
/// `dev` in particular is passed through unmodified so that rewriting an
/// archive preserves whatever device encoding the producer used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    /// Record magic (`070701` or `070702`).
    pub magic: [u8; 6],
    /// Inode number.
    pub ino: u64,
    /// Raw mode field (file-type bits and permission bits combined).
    pub mode: u64,
    /// Owner user id.
    pub uid: u64,
    /// Owner group id.
    pub gid: u64,
    /// Number of hard links.
    pub nlink: u64,
    /// Modification time, seconds since the epoch.
    pub mtime: u64,
    /// Payload length in bytes.
    pub filesize: u64,
    /// Opaque 32-byte device field, not parsed.
    pub dev: [u8; DEV_FIELD_WIDTH],
    /// Length of the name including its trailing NUL.
    pub namesize: u64,
    /// Checksum field (additive payload sum for `070702`, zero otherwise).
    pub check: u64,
}

impl Default for RawHeader {
    fn default() -> Self {
        Self {
            magic: *MAGIC_NEWC,
            ino: 0,
            mode: 0,
            uid: 0,
            gid: 0,
            nlink: 0,
            mtime: 0,
            filesize: 0,
            dev: super::DEFAULT_DEV,
            namesize: 0,
            check: 0,
        }
    }
}

impl RawHeader {
    /// Reads and decodes one header from a stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if the stream ends inside the header
    /// or a hex field does not decode, and [`Error::Io`] for other read
    /// failures. The magic is not validated here; the stream reader decides
    /// which magics are acceptable.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::InvalidFormat("stream ended inside a record header".into())
            } else {
                Error::Io(e)
            }
        })?;
        Self::decode(&buf)
    }

    /// Decodes a header from exactly [`HEADER_SIZE`] bytes.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut magic = [0u8; 6];
        magic.copy_from_slice(&buf[0..6]);

        let mut dev = [0u8; DEV_FIELD_WIDTH];
        dev.copy_from_slice(&buf[62..94]);

        Ok(Self {
            magic,
            ino: parse_hex_field(&buf[6..14], "c_ino")?,
            mode: parse_hex_field(&buf[14..22], "c_mode")?,
            uid: parse_hex_field(&buf[22..30], "c_uid")?,
            gid: parse_hex_field(&buf[30..38], "c_gid")?,
            nlink: parse_hex_field(&buf[38..46], "c_nlink")?,
            mtime: parse_hex_field(&buf[46..54], "c_mtime")?,
            filesize: parse_hex_field(&buf[54..62], "c_filesize")?,
            dev,
            namesize: parse_hex_field(&buf[94..102], "c_namesize")?,
            check: parse_hex_field(&buf[102..110], "c_check")?,
        })
    }

    /// Encodes this header into its 110-byte wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if a value does not fit the 8-digit
    /// hex width of its field.
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..6].copy_from_slice(&self.magic);
        encode_hex_field(&mut buf[6..14], self.ino, "c_ino")?;
        encode_hex_field(&mut buf[14..22], self.mode, "c_mode")?;
        encode_hex_field(&mut buf[22..30], self.uid, "c_uid")?;
        encode_hex_field(&mut buf[30..38], self.gid, "c_gid")?;
        encode_hex_field(&mut buf[38..46], self.nlink, "c_nlink")?;
        encode_hex_field(&mut buf[46..54], self.mtime, "c_mtime")?;
        encode_hex_field(&mut buf[54..62], self.filesize, "c_filesize")?;
        buf[62..94].copy_from_slice(&self.dev);
        encode_hex_field(&mut buf[94..102], self.namesize, "c_namesize")?;
        encode_hex_field(&mut buf[102..110], self.check, "c_check")?;
        Ok(buf)
    }
}

/// Parses one fixed-width ASCII-hex field as an unsigned integer.
fn parse_hex_field(field: &[u8], name: &'static str) -> Result<u64> {
    let text = std::str::from_utf8(field)
        .map_err(|_| Error::InvalidFormat(format!("{name} is not ASCII hex: {field:02x?}")))?;
    u64::from_str_radix(text, 16)
        .map_err(|_| Error::InvalidFormat(format!("{name} is not ASCII hex: {text:?}")))
}

/// Formats `value` as lowercase zero-padded hex into `field`.
fn encode_hex_field(field: &mut [u8], value: u64, name: &'static str) -> Result<()> {
    debug_assert_eq!(field.len(), HEX_FIELD_WIDTH);
    if value > 0xFFFF_FFFF {
        return Err(Error::FieldOverflow { field: name, value });
    }
    let text = format!("{value:08x}");
    field.copy_from_slice(text.as_bytes());
    Ok(())
}
