//! Encoding and decoding of the fixed 512-byte ustar header record.
//!
//! [`HeaderRecord`] is the decoded, owned form of one header block. The raw
//! block layout is described by [`UstarBlock`], a zerocopy struct that lets
//! the codec address fields by name instead of by offset.
//!
//! Numeric fields are written as zero-padded octal ASCII terminated by NUL.
//! On read, GNU base-256 fields are also accepted: a leading `0x80` byte
//! marks a non-negative big-endian value in the remaining bytes, a leading
//! `0xff` byte marks a negative two's-complement value spanning the whole
//! field.

use std::borrow::Cow;
use std::fmt;

use log::trace;
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::BLOCK_SIZE;

/// Magic string for ustar headers ("ustar\0").
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// Version field for ustar headers ("00").
pub const USTAR_VERSION: &[u8; 2] = b"00";

/// Magic string written by GNU tar ("ustar ").
pub const GNU_MAGIC: &[u8; 6] = b"ustar ";

/// Version field written by GNU tar (" \0").
pub const GNU_VERSION: &[u8; 2] = b" \0";

/// Name of the synthetic entry carrying a GNU long name.
pub const GNU_LONG_LINK: &[u8] = b"././@LongLink";

/// Width of the `name` field.
pub const NAME_LEN: usize = 100;

/// Width of the `prefix` field.
pub const PREFIX_LEN: usize = 155;

/// Width of the `linkname` field.
pub const LINK_NAME_LEN: usize = 100;

/// Largest value an 8-byte numeric field (7 octal digits) can hold.
pub const MAX_OCTAL_8: u64 = 0o7777777;

/// Largest value a 12-byte numeric field (11 octal digits) can hold.
pub const MAX_OCTAL_12: u64 = 0o77777777777;

const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;

/// Errors that can occur when encoding or decoding a header block.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The magic field is set but does not identify a ustar header.
    #[error("invalid header magic: {0:?}")]
    InvalidMagic([u8; 6]),

    /// A numeric field is neither octal ASCII nor GNU base-256.
    #[error("invalid numeric field `{field}`: {bytes:?}")]
    InvalidNumericField {
        /// Name of the header field.
        field: &'static str,
        /// The raw field contents.
        bytes: Vec<u8>,
    },

    /// The stored checksum does not match the header contents.
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        /// The checksum value stored in the header.
        stored: u64,
        /// The checksum computed from the header bytes.
        computed: u64,
    },

    /// A string is longer than its header field.
    #[error("`{field}` is {len} bytes, field holds {limit}")]
    StringTooLong {
        /// Name of the header field.
        field: &'static str,
        /// Length of the value.
        len: usize,
        /// Width of the field.
        limit: usize,
    },

    /// A number cannot be written as octal in its header field.
    #[error("`{field}` value {value} does not fit the octal field")]
    NumericOverflow {
        /// Name of the header field.
        field: &'static str,
        /// The rejected value.
        value: i128,
    },
}

/// Result type for header operations.
pub type Result<T> = std::result::Result<T, HeaderError>;

/// Raw ustar header block with named fields.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct UstarBlock {
    /// File path name (null-terminated if shorter than 100 bytes).
    pub name: [u8; 100],
    /// File mode in octal ASCII.
    pub mode: [u8; 8],
    /// Owner user ID in octal ASCII.
    pub uid: [u8; 8],
    /// Owner group ID in octal ASCII.
    pub gid: [u8; 8],
    /// File size in octal ASCII.
    pub size: [u8; 12],
    /// Modification time as Unix timestamp in octal ASCII.
    pub mtime: [u8; 12],
    /// Header checksum in octal ASCII.
    pub checksum: [u8; 8],
    /// Entry type flag.
    pub typeflag: u8,
    /// Link target name for hard/symbolic links.
    pub linkname: [u8; 100],
    /// Magic string identifying the format.
    pub magic: [u8; 6],
    /// Format version.
    pub version: [u8; 2],
    /// Owner user name (null-terminated).
    pub uname: [u8; 32],
    /// Owner group name (null-terminated).
    pub gname: [u8; 32],
    /// Device major number in octal ASCII.
    pub devmajor: [u8; 8],
    /// Device minor number in octal ASCII.
    pub devminor: [u8; 8],
    /// Path prefix for names longer than 100 bytes.
    pub prefix: [u8; 155],
    /// Padding to fill the 512-byte block.
    pub pad: [u8; 12],
}

impl fmt::Debug for UstarBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UstarBlock")
            .field("name", &String::from_utf8_lossy(truncate_null(&self.name)))
            .field("typeflag", &self.typeflag)
            .field("magic", &self.magic)
            .finish_non_exhaustive()
    }
}

/// Tar entry type indicating the kind of object an entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file (type '0' or '\0' for old tar compatibility).
    Regular,
    /// Hard link to another file in the archive (type '1').
    Link,
    /// Symbolic link (type '2').
    Symlink,
    /// Character device (type '3').
    Char,
    /// Block device (type '4').
    Block,
    /// Directory (type '5').
    Directory,
    /// FIFO/named pipe (type '6').
    Fifo,
    /// GNU tar long name extension (type 'L').
    GnuLongName,
    /// PAX extended header for the next entry (type 'x').
    XHeader,
    /// Reserved or unknown type.
    Other(u8),
}

impl EntryType {
    /// Parse an entry type from a raw byte value.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | b'\0' => EntryType::Regular,
            b'1' => EntryType::Link,
            b'2' => EntryType::Symlink,
            b'3' => EntryType::Char,
            b'4' => EntryType::Block,
            b'5' => EntryType::Directory,
            b'6' => EntryType::Fifo,
            b'L' => EntryType::GnuLongName,
            b'x' => EntryType::XHeader,
            other => EntryType::Other(other),
        }
    }

    /// Convert an entry type to its raw byte representation.
    ///
    /// Note that `Regular` is encoded as '0', not '\0'.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            EntryType::Regular => b'0',
            EntryType::Link => b'1',
            EntryType::Symlink => b'2',
            EntryType::Char => b'3',
            EntryType::Block => b'4',
            EntryType::Directory => b'5',
            EntryType::Fifo => b'6',
            EntryType::GnuLongName => b'L',
            EntryType::XHeader => b'x',
            EntryType::Other(b) => b,
        }
    }
}

impl From<u8> for EntryType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<EntryType> for u8 {
    fn from(entry_type: EntryType) -> Self {
        entry_type.to_byte()
    }
}

/// Header dialect, detected from the magic and version fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderFormat {
    /// POSIX ustar: magic "ustar\0", version "00".
    #[default]
    Ustar,
    /// GNU tar: magic "ustar ", version " \0". The prefix area holds GNU
    /// fields and is not part of the path.
    Gnu,
    /// Pre-POSIX header with an empty magic field.
    Old,
}

impl HeaderFormat {
    fn detect(magic: &[u8; 6], version: &[u8; 2]) -> Result<Self> {
        let trimmed = trim_trailing(magic, |b| b == 0 || b == b' ');
        if trimmed.is_empty() {
            Ok(HeaderFormat::Old)
        } else if trimmed != b"ustar" {
            Err(HeaderError::InvalidMagic(*magic))
        } else if magic == GNU_MAGIC && version == GNU_VERSION {
            Ok(HeaderFormat::Gnu)
        } else {
            Ok(HeaderFormat::Ustar)
        }
    }
}

/// Decoded form of one 512-byte header block.
///
/// Records are transient: the reader decodes one per physical block and the
/// writer encodes one per header it emits.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// Entry name, or its trailing path components when `prefix` is set.
    pub name: Vec<u8>,
    /// Leading path components, joined to `name` with `/`.
    pub prefix: Vec<u8>,
    /// Permission and mode bits.
    pub mode: u32,
    /// Owner user ID.
    pub uid: u32,
    /// Owner group ID.
    pub gid: u32,
    /// Payload size in bytes. Decoding may yield a negative value; the
    /// reader rejects it.
    pub size: i64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
    /// Checksum as stored in the block. Ignored by [`HeaderRecord::encode`].
    pub checksum: u32,
    /// Entry type flag.
    pub entry_type: EntryType,
    /// Link target for hard and symbolic links.
    pub link_name: Vec<u8>,
    /// Owner user name.
    pub uname: Vec<u8>,
    /// Owner group name.
    pub gname: Vec<u8>,
    /// Device major number.
    pub devmajor: u32,
    /// Device minor number.
    pub devminor: u32,
    /// Header dialect the record was decoded from.
    pub format: HeaderFormat,
}

impl HeaderRecord {
    /// Create an empty ustar record of the given type.
    #[must_use]
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            name: Vec::new(),
            prefix: Vec::new(),
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            checksum: 0,
            entry_type,
            link_name: Vec::new(),
            uname: Vec::new(),
            gname: Vec::new(),
            devmajor: 0,
            devminor: 0,
            format: HeaderFormat::Ustar,
        }
    }

    /// Decode a header block.
    ///
    /// Returns `Ok(None)` for an all-zero block, which marks the end of an
    /// archive. The checksum is decoded but not verified; see
    /// [`verify_checksum`].
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidMagic`] if the magic field is set but is
    /// not `ustar`, or [`HeaderError::InvalidNumericField`] if a numeric field
    /// cannot be parsed.
    pub fn decode(block: &[u8; BLOCK_SIZE]) -> Result<Option<Self>> {
        if is_zero_block(block) {
            return Ok(None);
        }
        let raw: &UstarBlock = zerocopy::transmute_ref!(block);
        let format = HeaderFormat::detect(&raw.magic, &raw.version)?;
        let extended = format != HeaderFormat::Old;

        let record = Self {
            name: truncate_null(&raw.name).to_vec(),
            prefix: if format == HeaderFormat::Ustar {
                truncate_null(&raw.prefix).to_vec()
            } else {
                Vec::new()
            },
            mode: parse_u32("mode", &raw.mode)?,
            uid: parse_u32("uid", &raw.uid)?,
            gid: parse_u32("gid", &raw.gid)?,
            size: parse_numeric("size", &raw.size)?,
            mtime: parse_numeric("mtime", &raw.mtime)?,
            checksum: parse_u32("checksum", &raw.checksum)?,
            entry_type: EntryType::from_byte(raw.typeflag),
            link_name: truncate_null(&raw.linkname).to_vec(),
            uname: if extended {
                truncate_null(&raw.uname).to_vec()
            } else {
                Vec::new()
            },
            gname: if extended {
                truncate_null(&raw.gname).to_vec()
            } else {
                Vec::new()
            },
            devmajor: if extended {
                parse_u32("devmajor", &raw.devmajor)?
            } else {
                0
            },
            devminor: if extended {
                parse_u32("devminor", &raw.devminor)?
            } else {
                0
            },
            format,
        };
        trace!("decoded header {record:?}");
        Ok(Some(record))
    }

    /// Encode this record as a ustar header block with a fresh checksum.
    ///
    /// Numeric fields are always written as octal; values that do not fit
    /// are the caller's concern (the [`Writer`](crate::Writer) moves them into
    /// extension headers first).
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::StringTooLong`] or
    /// [`HeaderError::NumericOverflow`] if a value does not fit its field.
    pub fn encode(&self) -> Result<[u8; BLOCK_SIZE]> {
        let mut raw: UstarBlock = zerocopy::transmute!([0u8; BLOCK_SIZE]);

        encode_str("name", &mut raw.name, &self.name)?;
        encode_octal("mode", &mut raw.mode, self.mode.into())?;
        encode_octal("uid", &mut raw.uid, self.uid.into())?;
        encode_octal("gid", &mut raw.gid, self.gid.into())?;
        encode_octal("size", &mut raw.size, self.size.into())?;
        encode_octal("mtime", &mut raw.mtime, self.mtime.into())?;
        raw.checksum = [b' '; 8];
        raw.typeflag = self.entry_type.to_byte();
        encode_str("linkname", &mut raw.linkname, &self.link_name)?;
        raw.magic = *USTAR_MAGIC;
        raw.version = *USTAR_VERSION;
        encode_str("uname", &mut raw.uname, &self.uname)?;
        encode_str("gname", &mut raw.gname, &self.gname)?;
        encode_octal("devmajor", &mut raw.devmajor, self.devmajor.into())?;
        encode_octal("devminor", &mut raw.devminor, self.devminor.into())?;
        encode_str("prefix", &mut raw.prefix, &self.prefix)?;

        let mut block: [u8; BLOCK_SIZE] = zerocopy::transmute!(raw);
        let sum = checksum(&block);
        // Six digits, NUL, space: the layout historical tar writes.
        let digits = format!("{sum:06o}");
        block[148..154].copy_from_slice(digits.as_bytes());
        block[154] = 0;
        block[155] = b' ';
        trace!("encoded header {self:?} with checksum {sum}");
        Ok(block)
    }

    /// Returns true if this is a GNU long-name marker: type 'L' named
    /// `././@LongLink`.
    #[must_use]
    pub fn is_long_name_marker(&self) -> bool {
        self.entry_type == EntryType::GnuLongName && self.name == GNU_LONG_LINK
    }

    /// Returns true if this is a PAX extended header for the next entry.
    #[must_use]
    pub fn is_pax_header(&self) -> bool {
        self.entry_type == EntryType::XHeader
    }

    /// Returns true if the entry is a directory.
    ///
    /// Besides type '5', a regular-typed entry whose name ends with `/`
    /// counts as a directory: many producers mark directories only that way.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        match self.entry_type {
            EntryType::Directory => true,
            EntryType::Regular => self.name.ends_with(b"/"),
            _ => false,
        }
    }

    /// Returns true if the entry is a plain file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::Regular && !self.name.ends_with(b"/")
    }

    /// Returns true if the entry is a symbolic link.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.entry_type == EntryType::Symlink
    }

    /// Replace the name with a complete path and clear the prefix.
    ///
    /// This folds a GNU long name (or PAX `path`) into the header it applies to.
    pub fn set_long_name(&mut self, value: impl Into<Vec<u8>>) {
        self.name = value.into();
        self.prefix.clear();
    }

    /// The full path: `prefix/name`, or just `name` when there is no prefix.
    #[must_use]
    pub fn full_name(&self) -> Cow<'_, [u8]> {
        if self.prefix.is_empty() {
            Cow::Borrowed(&self.name)
        } else {
            let mut path = Vec::with_capacity(self.prefix.len() + 1 + self.name.len());
            path.extend_from_slice(&self.prefix);
            path.push(b'/');
            path.extend_from_slice(&self.name);
            Cow::Owned(path)
        }
    }

    /// The full path as a lossy UTF-8 string.
    #[must_use]
    pub fn full_name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.full_name()).into_owned()
    }
}

impl Default for HeaderRecord {
    fn default() -> Self {
        Self::new(EntryType::Regular)
    }
}

impl fmt::Debug for HeaderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderRecord")
            .field("path", &self.full_name_lossy())
            .field("entry_type", &self.entry_type)
            .field("size", &self.size)
            .field("mode", &format_args!("{:04o}", self.mode))
            .field("mtime", &self.mtime)
            .field("link_name", &String::from_utf8_lossy(&self.link_name))
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Verify the checksum stored in a header block.
///
/// Both the POSIX unsigned byte sum and the signed sum written by some
/// historical implementations are accepted.
///
/// # Errors
///
/// Returns [`HeaderError::ChecksumMismatch`] if neither sum matches, or
/// [`HeaderError::InvalidNumericField`] if the stored checksum cannot be parsed.
pub fn verify_checksum(block: &[u8; BLOCK_SIZE]) -> Result<()> {
    let raw: &UstarBlock = zerocopy::transmute_ref!(block);
    let stored = parse_numeric("checksum", &raw.checksum)?;
    let computed = checksum(block);
    if stored == i64::from(computed) || stored == signed_checksum(block) {
        Ok(())
    } else {
        Err(HeaderError::ChecksumMismatch {
            stored: stored as u64,
            computed: computed.into(),
        })
    }
}

/// Compute the header checksum.
///
/// This is the unsigned sum of all header bytes, treating the checksum
/// field (bytes 148..156) as spaces (0x20).
#[must_use]
pub fn checksum(block: &[u8; BLOCK_SIZE]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &byte)| {
            if CHECKSUM_RANGE.contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(byte)
            }
        })
        .sum()
}

fn signed_checksum(block: &[u8; BLOCK_SIZE]) -> i64 {
    block
        .iter()
        .enumerate()
        .map(|(i, &byte)| {
            if CHECKSUM_RANGE.contains(&i) {
                i64::from(b' ')
            } else {
                i64::from(byte as i8)
            }
        })
        .sum()
}

/// Check if a block is all zeros (an end-of-archive marker).
#[must_use]
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Split a path across the `prefix` and `name` fields.
///
/// Returns `(prefix, name)`; the prefix is empty when the path fits the name
/// field on its own. Longer paths are split at a `/` so that the tail fits
/// the 100-byte name field and the head fits the 155-byte prefix field. Of
/// the candidate split points, the one nearest the end of the path is used.
///
/// Returns `None` when no split works; such paths need a GNU long name.
#[must_use]
pub fn split_name(path: &[u8]) -> Option<(&[u8], &[u8])> {
    if path.len() <= NAME_LEN {
        return Some((&[], path));
    }
    // The prefix must be non-empty, or the leading `/` would be lost on read.
    let first = (path.len() - NAME_LEN - 1).max(1);
    // The name after the split must be non-empty.
    let last = PREFIX_LEN.min(path.len() - 2);
    if first > last {
        return None;
    }
    let pos = first + path[first..=last].iter().rposition(|&b| b == b'/')?;
    Some((&path[..pos], &path[pos + 1..]))
}

/// Parse an octal ASCII field into a u64.
///
/// Octal fields in tar headers are ASCII strings with optional leading
/// spaces and trailing spaces or null bytes. For example:
/// - `"0000644\0"` -> 420 (file mode 0644)
/// - `"     123 "` -> 83
///
/// # Errors
///
/// Returns [`HeaderError::InvalidNumericField`] if the field contains
/// characters other than spaces, digits 0-7, or null bytes, or overflows.
pub fn parse_octal(bytes: &[u8]) -> Result<u64> {
    let invalid = || HeaderError::InvalidNumericField {
        field: "octal",
        bytes: bytes.to_vec(),
    };
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    let mut value: u64 = 0;
    for &byte in &bytes[start..end] {
        if !(b'0'..=b'7').contains(&byte) {
            return Err(invalid());
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or_else(invalid)?;
    }
    Ok(value)
}

/// Parse a numeric field that may be octal ASCII or GNU base-256 encoded.
///
/// A field made only of octal digits, spaces and NULs is octal. Otherwise a
/// leading `0x80` byte marks a non-negative big-endian value in the
/// remaining bytes, and a leading `0xff` byte marks a negative value in
/// two's complement across all bytes.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidNumericField`] for any other content, or if
/// the value does not fit an `i64`.
pub fn parse_numeric(field: &'static str, bytes: &[u8]) -> Result<i64> {
    let invalid = || HeaderError::InvalidNumericField {
        field,
        bytes: bytes.to_vec(),
    };

    if bytes
        .iter()
        .all(|&b| matches!(b, b'0'..=b'7' | b' ' | b'\0'))
    {
        let value = parse_octal(bytes).map_err(|_| invalid())?;
        return i64::try_from(value).map_err(|_| invalid());
    }

    match bytes.first().copied() {
        Some(0x80) => {
            let mut value: u64 = 0;
            for &byte in &bytes[1..] {
                value = value
                    .checked_mul(256)
                    .and_then(|v| v.checked_add(u64::from(byte)))
                    .ok_or_else(invalid)?;
            }
            i64::try_from(value).map_err(|_| invalid())
        }
        Some(0xff) if bytes.len() <= 15 => {
            let unsigned = bytes
                .iter()
                .fold(0i128, |acc, &byte| (acc << 8) | i128::from(byte));
            let value = unsigned - (1i128 << (bytes.len() * 8));
            i64::try_from(value).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

fn parse_u32(field: &'static str, bytes: &[u8]) -> Result<u32> {
    let value = parse_numeric(field, bytes)?;
    u32::try_from(value).map_err(|_| HeaderError::InvalidNumericField {
        field,
        bytes: bytes.to_vec(),
    })
}

/// Write `value` as zero-padded octal followed by a NUL terminator.
fn encode_octal(field: &'static str, dst: &mut [u8], value: i128) -> Result<()> {
    let digits = dst.len() - 1;
    let max = 8i128.pow(digits as u32);
    if !(0..max).contains(&value) {
        return Err(HeaderError::NumericOverflow { field, value });
    }
    let text = format!("{value:0digits$o}");
    dst[..digits].copy_from_slice(text.as_bytes());
    dst[digits] = 0;
    Ok(())
}

fn encode_str(field: &'static str, dst: &mut [u8], value: &[u8]) -> Result<()> {
    if value.len() > dst.len() {
        return Err(HeaderError::StringTooLong {
            field,
            len: value.len(),
            limit: dst.len(),
        });
    }
    dst[..value.len()].copy_from_slice(value);
    Ok(())
}

/// Truncate a byte slice at the first null byte.
///
/// This is used to extract null-terminated strings from fixed-size fields.
/// If no null byte is found, returns the entire slice.
///
/// # Example
///
/// ```
/// use tar_codec::header::truncate_null;
///
/// assert_eq!(truncate_null(b"hello\0world"), b"hello");
/// assert_eq!(truncate_null(b"no null here"), b"no null here");
/// assert_eq!(truncate_null(b"\0empty"), b"");
/// ```
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

fn trim_trailing(bytes: &[u8], strip: impl Fn(u8) -> bool) -> &[u8] {
    let end = bytes.iter().rposition(|&b| !strip(b)).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Trim the payload of a GNU long-name entry down to the name itself.
///
/// The payload is a NUL-terminated string padded to a block boundary; when
/// no NUL is present, trailing whitespace padding is dropped instead.
#[must_use]
pub fn trim_long_name(payload: &[u8]) -> &[u8] {
    match payload.iter().position(|&b| b == 0) {
        Some(pos) => &payload[..pos],
        None => trim_trailing(payload, |b| b.is_ascii_whitespace()),
    }
}
