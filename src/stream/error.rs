//! Error types for tar stream reading and writing.

use std::io;

use thiserror::Error;

use crate::{HeaderError, PaxError};

/// Errors that can occur while reading or writing a tar stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// Header error (checksum, invalid numeric field, field overflow).
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// PAX extension parsing error.
    #[error("PAX error: {0}")]
    Pax(#[from] PaxError),

    /// The stream does not contain a valid tar archive.
    #[error("invalid tar stream: {0}")]
    InvalidTarStream(String),

    /// The stream ended inside a header, an extension or an entry payload.
    #[error("unexpected EOF at position {pos}")]
    UnexpectedEof {
        /// Position in the stream where EOF occurred.
        pos: u64,
    },

    /// The operation needs to seek but the stream cannot.
    #[error("operation requires a seekable stream")]
    NonSeekableStream,

    /// The writer was closed or the entry stream was invalidated.
    #[error("stream is closed")]
    ClosedStream,

    /// A link target does not fit the header field.
    #[error("file name too long: {len} bytes > {limit} bytes")]
    FileNameTooLong {
        /// Length of the name.
        len: usize,
        /// Width of the field.
        limit: usize,
    },

    /// More payload was written than the entry declared.
    #[error("write exceeds the declared entry size of {size} bytes")]
    WriteBoundaryOverflow {
        /// Declared entry size.
        size: u64,
    },

    /// An entry name cannot be stored.
    #[error("invalid entry name: {0}")]
    InvalidName(&'static str),

    /// Resolved path exceeds configured maximum length.
    #[error("path exceeds limit: {len} bytes > {limit} bytes")]
    PathTooLong {
        /// Actual path length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// An extension header payload exceeds its configured maximum size.
    #[error("{kind} exceeds limit: {size} bytes > {limit} bytes")]
    ExtensionTooLarge {
        /// Kind of extension header.
        kind: &'static str,
        /// Declared payload size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// Two extension headers of the same kind precede one entry.
    #[error("duplicate {0} without an intervening entry")]
    DuplicateExtension(&'static str),

    /// Too many consecutive extension headers (possible infinite loop or malicious archive).
    #[error("too many pending extension headers: {count} > {limit}")]
    TooManyExtensionHeaders {
        /// Number of pending extension headers.
        count: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

impl From<io::Error> for StreamError {
    /// Unwraps a `StreamError` that crossed an `std::io` boundary, such as a
    /// payload callback propagating an [`EntryWriter`](super::EntryWriter) error.
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<StreamError>()) {
            return StreamError::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<StreamError>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(inner)) => StreamError::Io(io::Error::new(kind, inner)),
            None => StreamError::Io(kind.into()),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(err) => err,
            StreamError::UnexpectedEof { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            err => io::Error::other(err),
        }
    }
}
