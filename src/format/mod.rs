//! newc CPIO wire-format constants and the record header codec.
//!
//! The newc variant encodes every numeric header field as fixed-width
//! lowercase ASCII hex. The constants here are shared between the header
//! codec, the stream reader, and the stream writer.

pub mod header;

/// Record magic for the plain newc variant (no payload checksum).
pub const MAGIC_NEWC: &[u8; 6] = b"070701";

/// Record magic for the checksum variant ("newc+crc").
///
/// The check field then holds the 32-bit additive sum of the payload bytes.
pub const MAGIC_NEWC_CRC: &[u8; 6] = b"070702";

/// Total size of one encoded record header in bytes.
pub const HEADER_SIZE: usize = 110;

/// Width in bytes of every numeric ASCII-hex header field.
pub const HEX_FIELD_WIDTH: usize = 8;

/// Width in bytes of the opaque device field.
pub const DEV_FIELD_WIDTH: usize = 32;

/// Name of the sentinel record that terminates an archive stream.
pub const TRAILER_NAME: &str = "TRAILER!!!";

/// Records are padded so that names and payloads start on this boundary.
pub const ALIGNMENT: u64 = 4;

/// Mask selecting the file-type bits of a raw mode field.
pub const MODE_TYPE_MASK: u32 = 0o170000;

/// Mask selecting the permission bits of a raw mode field.
pub const MODE_PERM_MASK: u32 = 0o7777;

/// Default value of the opaque device field for brand-new entries.
pub const DEFAULT_DEV: [u8; DEV_FIELD_WIDTH] = [b'0'; DEV_FIELD_WIDTH];

/// Returns the number of padding bytes needed after `position` to reach
/// the next 4-byte boundary.
pub fn padding_for(position: u64) -> u64 {
    (ALIGNMENT - (position % ALIGNMENT)) % ALIGNMENT
}
