//! Streaming codec for POSIX `ustar` archives.
//!
//! This crate reads and writes tar archives over plain byte streams, with
//! the two extensions needed to interoperate with archives found in the
//! wild:
//!
//! - **GNU long names**: a `././@LongLink` entry (type `L`) whose payload is
//!   the path of the entry that follows it
//! - **PAX extended headers**: a type `x` entry whose payload carries
//!   `key=value` records; `size`, `path` and `mtime` are applied to the entry
//!   that follows it
//!
//! # Layout
//!
//! Every header is one 512-byte block:
//!
//! | Offset | Size | Field     | Description                              |
//! |--------|------|-----------|------------------------------------------|
//! | 0      | 100  | name      | File path (null-terminated if < 100)     |
//! | 100    | 8    | mode      | File mode in octal ASCII                 |
//! | 108    | 8    | uid       | Owner user ID in octal ASCII             |
//! | 116    | 8    | gid       | Owner group ID in octal ASCII            |
//! | 124    | 12   | size      | File size in octal ASCII                 |
//! | 136    | 12   | mtime     | Modification time (Unix epoch, octal)    |
//! | 148    | 8    | checksum  | Header checksum in octal ASCII           |
//! | 156    | 1    | typeflag  | Entry type (see [`EntryType`])           |
//! | 157    | 100  | linkname  | Link target for hard/symbolic links      |
//! | 257    | 6    | magic     | "ustar\0"                                |
//! | 263    | 2    | version   | "00"                                     |
//! | 265    | 32   | uname     | Owner user name                          |
//! | 297    | 32   | gname     | Owner group name                         |
//! | 329    | 8    | devmajor  | Device major number                      |
//! | 337    | 8    | devminor  | Device minor number                      |
//! | 345    | 155  | prefix    | Path prefix for long names               |
//!
//! Entry payloads follow their header and are padded with NUL bytes to the
//! next block boundary. An archive ends with two all-zero blocks.
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use tar_codec::{Metadata, Reader, Writer};
//!
//! let mut writer = Writer::sequential(Vec::new());
//! let meta = Metadata::new(0o644).with_size(5);
//! writer
//!     .add_file_simple("hello.txt", &meta, |out| {
//!         use std::io::Write;
//!         out.write_all(b"hello")
//!     })
//!     .unwrap();
//! writer.close().unwrap();
//! let archive = writer.into_inner().into_inner();
//!
//! let mut reader = Reader::sequential(archive.as_slice());
//! while let Some(mut entry) = reader.next_entry().unwrap() {
//!     let mut content = Vec::new();
//!     entry.read_to_end(&mut content).unwrap();
//!     assert_eq!(entry.header().full_name().as_ref(), b"hello.txt");
//!     assert_eq!(content, b"hello");
//! }
//! ```

pub mod header;
pub mod pax;
pub mod stream;

pub use header::{EntryType, HeaderError, HeaderFormat, HeaderRecord};
pub use pax::{PaxAttributes, PaxError};
pub use stream::{
    ByteSink, ByteSource, EntryStream, EntryWriter, Limits, Metadata, Reader, Seekable,
    SeekableStream, Sequential, StreamError, Writer,
};

/// Size of a tar block in bytes. Headers and payloads are aligned to it.
pub const BLOCK_SIZE: usize = 512;

/// Number of NUL bytes needed after `size` payload bytes to reach a block boundary.
#[must_use]
pub fn padding(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}
