//! PAX extended header attributes.
//!
//! A PAX extended header (typeflag `x`) carries a payload of records of the
//! form `"<len> <key>=<value>\n"`, where `<len>` is the decimal length of the
//! whole record including the length digits themselves. The attributes apply
//! to the entry that immediately follows.

use std::collections::btree_map::{self, BTreeMap};

use thiserror::Error;

/// Key for the entry size, overriding the octal header field.
pub const PAX_SIZE: &str = "size";

/// Key for the entry path, overriding `prefix` and `name`.
pub const PAX_PATH: &str = "path";

/// Key for the modification time, in possibly fractional seconds.
pub const PAX_MTIME: &str = "mtime";

/// Rounds allowed for the record length to settle on a fixed point.
const MAX_LENGTH_ROUNDS: usize = 4;

/// Errors that can occur when parsing PAX extended headers.
#[derive(Debug, Error)]
pub enum PaxError {
    /// A record's length prefix is not a usable decimal length.
    #[error("malformed PAX record at offset {offset}: {reason}")]
    MalformedRecord {
        /// Byte offset of the record in the payload.
        offset: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A record claims more bytes than remain in the payload.
    #[error("PAX record at offset {offset} is {len} bytes, only {available} remain")]
    Truncated {
        /// Byte offset of the record in the payload.
        offset: usize,
        /// Length claimed by the record.
        len: usize,
        /// Bytes remaining in the payload.
        available: usize,
    },

    /// A known key has a value that cannot be interpreted.
    #[error("invalid PAX value for `{key}`: {value:?}")]
    InvalidValue {
        /// The attribute key.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Result type for PAX operations.
pub type Result<T> = std::result::Result<T, PaxError>;

/// A single raw PAX record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaxRecord<'a> {
    key: &'a [u8],
    value: &'a [u8],
}

impl<'a> PaxRecord<'a> {
    /// Returns the key as raw bytes.
    #[must_use]
    pub fn key_bytes(&self) -> &'a [u8] {
        self.key
    }

    /// Returns the value as raw bytes.
    #[must_use]
    pub fn value_bytes(&self) -> &'a [u8] {
        self.value
    }
}

/// Iterator over the raw records of a PAX payload.
///
/// Iteration stops at the end of the data, at trailing bytes that contain no
/// length separator (such as NUL padding), or after the first error.
///
/// # Example
///
/// ```
/// use tar_codec::pax::PaxRecords;
///
/// let data = b"20 path=foo/bar.txt\n";
/// let mut iter = PaxRecords::new(data);
/// let record = iter.next().unwrap().unwrap();
/// assert_eq!(record.key_bytes(), b"path");
/// assert_eq!(record.value_bytes(), b"foo/bar.txt");
/// assert!(iter.next().is_none());
/// ```
#[derive(Debug)]
pub struct PaxRecords<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> PaxRecords<'a> {
    /// Create a new iterator over PAX records.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    fn parse_next(&mut self) -> Result<Option<PaxRecord<'a>>> {
        loop {
            let data: &'a [u8] = self.data;
            let rest = &data[self.offset..];
            let Some(space) = rest.iter().position(|&b| b == b' ') else {
                return Ok(None);
            };
            let offset = self.offset;
            let malformed = |reason| PaxError::MalformedRecord { offset, reason };

            let digits = &rest[..space];
            if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
                return Err(malformed("length is not a decimal number"));
            }
            let len: usize = std::str::from_utf8(digits)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| malformed("length is out of range"))?;
            if len < space + 2 {
                return Err(malformed("length is shorter than its own prefix"));
            }
            if len > rest.len() {
                return Err(PaxError::Truncated {
                    offset,
                    len,
                    available: rest.len(),
                });
            }

            let body = &rest[space + 1..len];
            let body = body.strip_suffix(b"\n").unwrap_or(body);
            self.offset += len;

            // Records without a key/value separator carry nothing usable.
            if let Some(eq) = body.iter().position(|&b| b == b'=') {
                return Ok(Some(PaxRecord {
                    key: &body[..eq],
                    value: &body[eq + 1..],
                }));
            }
        }
    }
}

impl<'a> Iterator for PaxRecords<'a> {
    type Item = Result<PaxRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.parse_next().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

impl std::iter::FusedIterator for PaxRecords<'_> {}

/// Parsed PAX attributes, keyed and ordered by keyword.
///
/// Keys and values are kept as raw bytes: records such as
/// `SCHILY.xattr.*` carry binary values. UTF-8 is only required of the
/// values this codec interprets (`size`, `path` and `mtime`).
///
/// Formatting writes records in key order, so `parse(format(a)) == a` holds
/// but the bytes of a parsed payload are not necessarily reproduced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaxAttributes {
    attrs: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl PaxAttributes {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a PAX payload. Later records override earlier ones with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if a record length is malformed or runs past the end
    /// of the data.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut attrs = BTreeMap::new();
        for record in PaxRecords::new(data) {
            let record = record?;
            attrs.insert(record.key.to_vec(), record.value.to_vec());
        }
        Ok(Self { attrs })
    }

    /// Serialize into a PAX payload, one record per attribute in key order.
    #[must_use]
    pub fn format(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in &self.attrs {
            let len = record_len(key.len() + value.len());
            out.extend_from_slice(len.to_string().as_bytes());
            out.push(b' ');
            out.extend_from_slice(key);
            out.push(b'=');
            out.extend_from_slice(value);
            out.push(b'\n');
        }
        out
    }

    /// The `size` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`PaxError::InvalidValue`] if the value is not a decimal integer.
    pub fn size(&self) -> Result<Option<i64>> {
        self.parsed(PAX_SIZE)
    }

    /// The `mtime` attribute, in seconds since the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`PaxError::InvalidValue`] if the value is not a number.
    pub fn mtime(&self) -> Result<Option<f64>> {
        match self.parsed::<f64>(PAX_MTIME)? {
            Some(v) if !v.is_finite() => Err(PaxError::InvalidValue {
                key: PAX_MTIME,
                value: v.to_string(),
            }),
            mtime => Ok(mtime),
        }
    }

    /// The `path` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`PaxError::InvalidValue`] if the path is not UTF-8.
    pub fn path(&self) -> Result<Option<&str>> {
        self.text(PAX_PATH)
    }

    /// Set the `size` attribute.
    pub fn set_size(&mut self, size: u64) {
        self.insert(PAX_SIZE, size.to_string());
    }

    /// Set the `path` attribute.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.insert(PAX_PATH, path.into());
    }

    /// Set the `mtime` attribute to a whole number of seconds.
    pub fn set_mtime(&mut self, mtime: i64) {
        self.insert(PAX_MTIME, mtime.to_string());
    }

    /// Insert an attribute, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.attrs.insert(key.into(), value.into())
    }

    /// Look up an attribute whose value is UTF-8.
    ///
    /// Returns `None` for a missing key and for a binary value; use
    /// [`get_bytes`](Self::get_bytes) for those.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_bytes(key)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Look up the raw value of an attribute.
    #[must_use]
    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        self.attrs.get(key.as_bytes()).map(Vec::as_slice)
    }

    /// Iterate over the raw attributes in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.attrs.iter(),
        }
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns true if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    fn text(&self, key: &'static str) -> Result<Option<&str>> {
        self.get_bytes(key)
            .map(|value| {
                std::str::from_utf8(value).map_err(|_| PaxError::InvalidValue {
                    key,
                    value: String::from_utf8_lossy(value).into_owned(),
                })
            })
            .transpose()
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>> {
        self.text(key)?
            .map(|value| {
                value.trim().parse().map_err(|_| PaxError::InvalidValue {
                    key,
                    value: value.to_owned(),
                })
            })
            .transpose()
    }
}

/// Iterator over `(key, value)` byte pairs of [`PaxAttributes`], in key order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, Vec<u8>, Vec<u8>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| (key.as_slice(), value.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a PaxAttributes {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Length of the record `"<len> <key>=<value>\n"` for a key and value of
/// `content` bytes together, counting its own digits.
fn record_len(content: usize) -> usize {
    // Space, equals sign, newline.
    let body = content + 3;
    let mut len = body + decimal_digits(body);
    for _ in 0..MAX_LENGTH_ROUNDS {
        let next = body + decimal_digits(len);
        if next == len {
            break;
        }
        len = next;
    }
    len
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
