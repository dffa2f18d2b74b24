//! Streaming tar reader and writer with GNU long name and PAX support.
//!
//! # Reading
//!
//! The [`Reader`] walks an archive one header at a time. Extension headers
//! are consumed transparently and folded into the entry they precede:
//!
//! - **GNU long name (type 'L')**: replaces the entry's name
//! - **PAX extended header (type 'x')**: `size`, `path` and `mtime` override
//!   the entry's header fields
//!
//! Each actual entry is yielded as an [`EntryStream`], an [`std::io::Read`]
//! bounded to the entry's payload. Whatever the caller does not read is
//! skipped when the reader advances, by seeking when the source can.
//!
//! # Writing
//!
//! The [`Writer`] emits headers and payloads, choosing between the ustar
//! prefix field and a GNU long name for paths that do not fit the name
//! field, and falling back to PAX records for sizes and times the octal
//! fields cannot hold.
//!
//! # Limits
//!
//! The reader applies configurable [`Limits`] to extension headers, since
//! those are buffered in memory:
//!
//! - Maximum resolved path length
//! - Maximum PAX payload size
//! - Maximum GNU long name size
//! - Maximum consecutive extension headers
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{BufReader, Read};
//! use tar_codec::Reader;
//!
//! let file = File::open("archive.tar").unwrap();
//! let mut reader = Reader::seekable(BufReader::new(file));
//!
//! while let Some(mut entry) = reader.next_entry().unwrap() {
//!     println!("{} ({} bytes)", entry.header().full_name_lossy(), entry.header().size);
//!     if entry.header().is_file() {
//!         let mut content = Vec::new();
//!         entry.read_to_end(&mut content).unwrap();
//!     }
//! }
//! ```

mod entry;
mod error;
mod io;
mod limits;
mod reader;
mod writer;

pub use entry::EntryStream;
pub use error::{Result, StreamError};
pub use io::{ByteSink, ByteSource, Seekable, SeekableStream, Sequential};
pub use limits::Limits;
pub use reader::Reader;
pub use writer::{EntryWriter, Metadata, Writer};

#[cfg(test)]
mod tests;
