//! Bounds on what the reader buffers while resolving extension headers.

use super::error::{Result, StreamError};

/// Bounds applied by the [`Reader`](super::Reader).
///
/// GNU long names and PAX payloads are read into memory before the entry
/// they describe is yielded, so each is capped, as is the number of
/// extension headers that may precede one entry.
///
/// # Example
///
/// ```
/// use tar_codec::{Limits, Reader};
///
/// let limits = Limits {
///     max_pax_size: 64 * 1024,
///     ..Limits::default()
/// };
/// let reader = Reader::with_limits(tar_codec::Sequential::new(std::io::empty()), limits);
/// assert_eq!(reader.limits().max_pax_size, 65536);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Longest resolved entry path, in bytes. Default 4096.
    pub max_path_len: usize,

    /// Largest PAX extended header payload, in bytes. Default 1 MiB.
    pub max_pax_size: u64,

    /// Largest GNU long name payload, in bytes. The payload carries a
    /// trailing NUL, so this is one more than `max_path_len`. Default 4097.
    pub max_long_name_size: u64,

    /// Most extension headers allowed before one actual entry. Default 16.
    pub max_pending_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_path_len: 4096,
            max_pax_size: 1 << 20,
            max_long_name_size: 4097,
            max_pending_entries: 16,
        }
    }
}

impl Limits {
    /// Same as [`Limits::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// No effective bounds. Only for archives from a trusted producer.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            max_path_len: usize::MAX,
            max_pax_size: u64::MAX,
            max_long_name_size: u64::MAX,
            max_pending_entries: usize::MAX,
        }
    }

    /// Tight bounds for archives from untrusted sources.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_path_len: 1024,
            max_pax_size: 64 << 10,
            max_long_name_size: 1025,
            max_pending_entries: 4,
        }
    }

    pub(super) fn check_path(&self, len: usize) -> Result<()> {
        if len > self.max_path_len {
            return Err(StreamError::PathTooLong {
                len,
                limit: self.max_path_len,
            });
        }
        Ok(())
    }

    pub(super) fn check_pending(&self, count: usize) -> Result<()> {
        if count > self.max_pending_entries {
            return Err(StreamError::TooManyExtensionHeaders {
                count,
                limit: self.max_pending_entries,
            });
        }
        Ok(())
    }
}
