//! Streaming tar writer.

use std::io::{self, Read, Write};

use log::{debug, trace};

use crate::header::{split_name, GNU_LONG_LINK, LINK_NAME_LEN, MAX_OCTAL_12, NAME_LEN};
use crate::{padding, EntryType, HeaderError, HeaderRecord, PaxAttributes, BLOCK_SIZE};

use super::error::{Result, StreamError};
use super::io::{ByteSink, Seekable, Sequential};

/// Name of the synthetic entry carrying PAX attributes.
const PAX_HEADER_NAME: &[u8] = b"././@PaxHeader";

/// Mode of the synthetic extension entries.
const EXTENSION_MODE: u32 = 0o644;

/// Per-entry attributes supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Permission and mode bits.
    pub mode: u32,
    /// Owner user ID.
    pub uid: u32,
    /// Owner group ID.
    pub gid: u32,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
    /// Declared payload size. Only [`Writer::add_file_simple`] uses it.
    pub size: u64,
    /// Owner user name.
    pub uname: String,
    /// Owner group name.
    pub gname: String,
}

impl Metadata {
    /// Metadata with the given mode and everything else zero.
    #[must_use]
    pub fn new(mode: u32) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the declared payload size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set the modification time.
    #[must_use]
    pub fn with_mtime(mut self, mtime: i64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Set the owner IDs.
    #[must_use]
    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Set the owner names.
    #[must_use]
    pub fn with_owner_names(mut self, uname: impl Into<String>, gname: impl Into<String>) -> Self {
        self.uname = uname.into();
        self.gname = gname.into();
        self
    }
}

/// Streaming tar writer.
///
/// # Example
///
/// ```
/// use std::io::{Cursor, Write};
/// use tar_codec::{Metadata, Writer};
///
/// let mut writer = Writer::seekable(Cursor::new(Vec::new()));
/// writer.mkdir("data", &Metadata::new(0o755)).unwrap();
/// writer
///     .add_file("data/log.txt", &Metadata::new(0o644), |out| {
///         writeln!(out, "size decided while writing")
///     })
///     .unwrap();
/// writer.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Writer<S> {
    sink: S,
    pos: u64,
    closed: bool,
}

impl<W: Write> Writer<Sequential<W>> {
    /// Create a writer over a stream that is only written front to back.
    pub fn sequential(writer: W) -> Self {
        Self::new(Sequential::new(writer))
    }
}

impl<W: Write + io::Seek> Writer<Seekable<W>> {
    /// Create a writer that can also back-patch headers with [`Writer::add_file`].
    pub fn seekable(writer: W) -> Self {
        Self::new(Seekable::new(writer))
    }
}

impl<S: ByteSink> Writer<S> {
    /// Create a writer.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pos: 0,
            closed: false,
        }
    }

    /// Add a regular file whose size is declared up front in `meta.size`.
    ///
    /// `payload` receives a sink bounded to the declared size. A write that
    /// would exceed it fails with [`StreamError::WriteBoundaryOverflow`]
    /// before any of its bytes are emitted; a payload shorter than declared is
    /// padded with NUL bytes.
    ///
    /// # Errors
    ///
    /// Fails on invalid names, I/O errors, or errors returned by `payload`.
    pub fn add_file_simple<F>(&mut self, name: impl AsRef<[u8]>, meta: &Metadata, payload: F) -> Result<()>
    where
        F: FnOnce(&mut EntryWriter<'_, S>) -> io::Result<()>,
    {
        self.ensure_open()?;
        let name = name.as_ref();
        validate_name(name)?;

        let mut header = base_header(EntryType::Regular, meta);
        let mut pax = PaxAttributes::new();
        if meta.size > MAX_OCTAL_12 {
            pax.set_size(meta.size);
        } else {
            header.size = meta.size as i64;
        }
        place_mtime(&mut header, &mut pax, meta.mtime);
        self.write_entry_header(name, header, &pax)?;

        let mut out = EntryWriter::new(self, Some(meta.size));
        let result = payload(&mut out);
        let (written, overflowed) = (out.written, out.overflowed);
        result.map_err(StreamError::from)?;
        if overflowed {
            return Err(StreamError::WriteBoundaryOverflow { size: meta.size });
        }

        self.write_zeros((meta.size - written) + padding(meta.size))
    }

    /// Add a regular file whose size is whatever `payload` writes.
    ///
    /// A placeholder header is written first and rewritten with the final
    /// size once the payload is complete. `meta.size` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NonSeekableStream`] if the sink cannot seek.
    /// Fails if the final size does not fit the octal size field, on invalid
    /// names, I/O errors, or errors returned by `payload`.
    pub fn add_file<F>(&mut self, name: impl AsRef<[u8]>, meta: &Metadata, payload: F) -> Result<()>
    where
        F: FnOnce(&mut EntryWriter<'_, S>) -> io::Result<()>,
    {
        self.ensure_open()?;
        if self.sink.seekable().is_none() {
            return Err(StreamError::NonSeekableStream);
        }
        let name = name.as_ref();
        validate_name(name)?;

        let mut header = base_header(EntryType::Regular, meta);
        let mut pax = PaxAttributes::new();
        place_mtime(&mut header, &mut pax, meta.mtime);
        let header = self.place_name(name, header)?;
        if !pax.is_empty() {
            self.write_pax(&pax)?;
        }

        let header_pos = self.sink_position()?;
        self.write_block(&header.encode()?)?;

        let mut out = EntryWriter::new(self, None);
        payload(&mut out).map_err(StreamError::from)?;
        let written = out.written;
        self.write_zeros(padding(written))?;

        let mut header = header;
        header.size = i64::try_from(written)
            .ok()
            .filter(|&size| size as u64 <= MAX_OCTAL_12)
            .ok_or(HeaderError::NumericOverflow {
                field: "size",
                value: written.into(),
            })?;
        let block = header.encode()?;
        let end = self.sink_position()?;
        self.seek_to(header_pos)?;
        self.sink.write_all(&block)?;
        self.seek_to(end)?;
        trace!("rewrote header at {header_pos} with size {written}");
        Ok(())
    }

    /// Add a directory entry.
    ///
    /// # Errors
    ///
    /// Fails on invalid names or I/O errors.
    pub fn mkdir(&mut self, name: impl AsRef<[u8]>, meta: &Metadata) -> Result<()> {
        self.ensure_open()?;
        let name = name.as_ref();
        validate_name(name)?;
        let mut header = base_header(EntryType::Directory, meta);
        let mut pax = PaxAttributes::new();
        place_mtime(&mut header, &mut pax, meta.mtime);
        self.write_entry_header(name, header, &pax)
    }

    /// Add a symbolic link to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::FileNameTooLong`] if the target does not fit
    /// the 100-byte link name field.
    pub fn symlink(
        &mut self,
        name: impl AsRef<[u8]>,
        target: impl AsRef<[u8]>,
        meta: &Metadata,
    ) -> Result<()> {
        self.add_link(EntryType::Symlink, name.as_ref(), target.as_ref(), meta)
    }

    /// Add a hard link to the earlier entry `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::FileNameTooLong`] if the target does not fit
    /// the 100-byte link name field.
    pub fn link(
        &mut self,
        name: impl AsRef<[u8]>,
        target: impl AsRef<[u8]>,
        meta: &Metadata,
    ) -> Result<()> {
        self.add_link(EntryType::Link, name.as_ref(), target.as_ref(), meta)
    }

    /// Flush the underlying sink.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ClosedStream`] after [`close`](Self::close).
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Write the end-of-archive marker and flush.
    ///
    /// Every later operation fails with [`StreamError::ClosedStream`].
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, or if the writer is already closed.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.write_zeros(2 * BLOCK_SIZE as u64)?;
        self.sink.flush()?;
        self.closed = true;
        debug!("closed archive at {} bytes", self.pos);
        Ok(())
    }

    /// Returns true once [`close`](Self::close) succeeded.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bytes written to the archive so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Gets a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the writer and return the underlying sink.
    ///
    /// This does not close the archive.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn add_link(&mut self, entry_type: EntryType, name: &[u8], target: &[u8], meta: &Metadata) -> Result<()> {
        self.ensure_open()?;
        validate_name(name)?;
        if target.len() > LINK_NAME_LEN {
            return Err(StreamError::FileNameTooLong {
                len: target.len(),
                limit: LINK_NAME_LEN,
            });
        }
        if target.contains(&0) {
            return Err(StreamError::InvalidName("link target contains NUL"));
        }
        let mut header = base_header(entry_type, meta);
        header.link_name = target.to_vec();
        let mut pax = PaxAttributes::new();
        place_mtime(&mut header, &mut pax, meta.mtime);
        self.write_entry_header(name, header, &pax)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StreamError::ClosedStream);
        }
        Ok(())
    }

    /// Write the extension headers `name` and `pax` need, then `header`.
    fn write_entry_header(&mut self, name: &[u8], header: HeaderRecord, pax: &PaxAttributes) -> Result<()> {
        let header = self.place_name(name, header)?;
        if !pax.is_empty() {
            self.write_pax(pax)?;
        }
        self.write_block(&header.encode()?)
    }

    /// Store `name` in the name and prefix fields, or emit a GNU long name
    /// entry when no split fits.
    fn place_name(&mut self, name: &[u8], mut header: HeaderRecord) -> Result<HeaderRecord> {
        match split_name(name) {
            Some((prefix, base)) => {
                header.prefix = prefix.to_vec();
                header.name = base.to_vec();
            }
            None => {
                self.write_long_name(name)?;
                header.name = name[..NAME_LEN].to_vec();
            }
        }
        Ok(header)
    }

    fn write_long_name(&mut self, name: &[u8]) -> Result<()> {
        // The payload is NUL terminated, and its size counts the NUL.
        let size = name.len() as u64 + 1;
        let mut header = HeaderRecord::new(EntryType::GnuLongName);
        header.name = GNU_LONG_LINK.to_vec();
        header.mode = EXTENSION_MODE;
        header.size = size as i64;
        debug!("GNU long name for {}", String::from_utf8_lossy(name));
        self.write_block(&header.encode()?)?;
        self.write_bytes(name)?;
        self.write_zeros(1 + padding(size))
    }

    fn write_pax(&mut self, pax: &PaxAttributes) -> Result<()> {
        let data = pax.format();
        let mut header = HeaderRecord::new(EntryType::XHeader);
        header.name = PAX_HEADER_NAME.to_vec();
        header.mode = EXTENSION_MODE;
        header.size = data.len() as i64;
        debug!("PAX extended header with {} record(s)", pax.len());
        self.write_block(&header.encode()?)?;
        self.write_bytes(&data)?;
        self.write_zeros(padding(data.len() as u64))
    }

    fn write_block(&mut self, block: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.write_bytes(block)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.sink.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    fn write_zeros(&mut self, len: u64) -> Result<()> {
        let copied = io::copy(&mut io::repeat(0).take(len), &mut self.sink)?;
        self.pos += copied;
        Ok(())
    }

    fn sink_position(&mut self) -> Result<u64> {
        let seek = self.sink.seekable().ok_or(StreamError::NonSeekableStream)?;
        Ok(seek.position()?)
    }

    fn seek_to(&mut self, pos: u64) -> Result<()> {
        let seek = self.sink.seekable().ok_or(StreamError::NonSeekableStream)?;
        seek.seek_absolute(pos)?;
        Ok(())
    }
}

/// Sink for one entry's payload, handed to the payload callbacks of
/// [`Writer::add_file_simple`] and [`Writer::add_file`].
#[derive(Debug)]
pub struct EntryWriter<'w, S> {
    writer: &'w mut Writer<S>,
    written: u64,
    limit: Option<u64>,
    overflowed: bool,
}

impl<'w, S: ByteSink> EntryWriter<'w, S> {
    fn new(writer: &'w mut Writer<S>, limit: Option<u64>) -> Self {
        Self {
            writer,
            written: 0,
            limit,
            overflowed: false,
        }
    }

    /// Payload bytes written so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Bytes that can still be written, if the size is bounded.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit - self.written)
    }
}

impl<S: ByteSink> Write for EntryWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(limit) = self.limit {
            if self.written + buf.len() as u64 > limit {
                self.overflowed = true;
                return Err(StreamError::WriteBoundaryOverflow { size: limit }.into());
            }
        }
        let n = self.writer.sink.write(buf)?;
        self.written += n as u64;
        self.writer.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.sink.flush()
    }
}

fn base_header(entry_type: EntryType, meta: &Metadata) -> HeaderRecord {
    HeaderRecord {
        mode: meta.mode,
        uid: meta.uid,
        gid: meta.gid,
        uname: meta.uname.as_bytes().to_vec(),
        gname: meta.gname.as_bytes().to_vec(),
        ..HeaderRecord::new(entry_type)
    }
}

/// Store `mtime` in the header, or in PAX when octal cannot express it.
fn place_mtime(header: &mut HeaderRecord, pax: &mut PaxAttributes, mtime: i64) {
    if (0..=MAX_OCTAL_12 as i64).contains(&mtime) {
        header.mtime = mtime;
    } else {
        pax.set_mtime(mtime);
        header.mtime = 0;
    }
}

fn validate_name(name: &[u8]) -> Result<()> {
    if name.is_empty() {
        return Err(StreamError::InvalidName("empty name"));
    }
    if name.contains(&0) {
        return Err(StreamError::InvalidName("name contains NUL"));
    }
    Ok(())
}
