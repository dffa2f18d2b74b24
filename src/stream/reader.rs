//! Streaming tar reader.

use std::io::{self, Read};

use log::{debug, trace, warn};

use crate::header::{trim_long_name, verify_checksum};
use crate::{padding, HeaderError, HeaderRecord, PaxAttributes, BLOCK_SIZE};

use super::entry::EntryStream;
use super::error::{Result, StreamError};
use super::io::{ByteSource, Seekable, Sequential};
use super::limits::Limits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Positioned at a header block.
    Scanning,
    /// Inside the payload of the entry last yielded.
    EntryOpen {
        size: u64,
        read: u64,
        /// Absolute offset of the payload, for seekable sources.
        start: Option<u64>,
    },
    /// An end-of-archive block or the end of the stream was reached.
    Terminated,
}

/// Extension headers seen since the last actual entry.
#[derive(Debug, Default)]
struct PendingExtensions {
    long_name: Option<Vec<u8>>,
    pax: Option<PaxAttributes>,
    count: usize,
}

impl PendingExtensions {
    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Streaming tar reader.
///
/// Yields one [`EntryStream`] per actual entry, with GNU long names and PAX
/// attributes already applied to its header.
///
/// # Example
///
/// ```
/// use tar_codec::Reader;
///
/// let archive = [0u8; 1024];
/// let mut reader = Reader::sequential(&archive[..]);
/// assert!(reader.next_entry().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct Reader<S> {
    source: S,
    limits: Limits,
    state: State,
    /// Position of the source at construction; `Some` only when seekable.
    init_pos: Option<u64>,
    /// Bytes consumed since construction or the last rewind.
    pos: u64,
}

impl<R: Read> Reader<Sequential<R>> {
    /// Create a reader over a stream that is only read front to back.
    pub fn sequential(reader: R) -> Self {
        Self::new(Sequential::new(reader))
    }
}

impl<R: Read + io::Seek> Reader<Seekable<R>> {
    /// Create a reader that seeks over unread payloads and can rewind.
    pub fn seekable(reader: R) -> Self {
        Self::new(Seekable::new(reader))
    }
}

impl<S: ByteSource> Reader<S> {
    /// Create a reader with default limits.
    pub fn new(source: S) -> Self {
        Self::with_limits(source, Limits::default())
    }

    /// Create a reader with custom limits.
    pub fn with_limits(mut source: S, limits: Limits) -> Self {
        let init_pos = source.seekable().and_then(|s| s.position().ok());
        Self {
            source,
            limits,
            state: State::Scanning,
            init_pos,
            pos: 0,
        }
    }

    /// Advance to the next actual entry.
    ///
    /// Any unread payload of the previous entry is skipped first. Returns
    /// `Ok(None)` at an end-of-archive block or at the end of the stream.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, truncated archives, invalid headers or checksums,
    /// malformed extension headers and extensions beyond the configured
    /// [`Limits`].
    pub fn next_entry(&mut self) -> Result<Option<EntryStream<'_, S>>> {
        match self.state {
            State::Terminated => return Ok(None),
            State::EntryOpen { .. } => self.finish_entry()?,
            State::Scanning => {}
        }

        let mut pending = PendingExtensions::default();
        loop {
            let Some(mut header) = self.read_header()? else {
                if !pending.is_empty() {
                    warn!(
                        "archive ends after {} extension header(s) with no entry",
                        pending.count
                    );
                }
                self.state = State::Terminated;
                return Ok(None);
            };

            if header.is_long_name_marker() {
                self.note_extension(&mut pending)?;
                if pending.long_name.is_some() {
                    return Err(StreamError::DuplicateExtension("GNU long name"));
                }
                let data =
                    self.read_extension("GNU long name", header.size, self.limits.max_long_name_size)?;
                let name = trim_long_name(&data).to_vec();
                debug!("GNU long name: {}", String::from_utf8_lossy(&name));
                pending.long_name = Some(name);
                continue;
            }

            if header.is_pax_header() {
                self.note_extension(&mut pending)?;
                if pending.pax.is_some() {
                    return Err(StreamError::DuplicateExtension("PAX extended header"));
                }
                let data =
                    self.read_extension("PAX extended header", header.size, self.limits.max_pax_size)?;
                let attrs = PaxAttributes::parse(&data)?;
                debug!("PAX extended header with {} record(s)", attrs.len());
                pending.pax = Some(attrs);
                continue;
            }

            if let Some(name) = pending.long_name.take() {
                header.set_long_name(name);
            }
            if let Some(attrs) = &pending.pax {
                apply_pax(&mut header, attrs)?;
            }
            if header.size < 0 {
                return Err(StreamError::InvalidTarStream(format!(
                    "negative size {} for {}",
                    header.size,
                    header.full_name_lossy()
                )));
            }
            self.limits.check_path(header.full_name().len())?;

            let size = header.size as u64;
            self.state = State::EntryOpen {
                size,
                read: 0,
                start: self.init_pos.map(|init| init + self.pos),
            };
            trace!("entry {header:?}");
            return Ok(Some(EntryStream::new(self, header, pending.pax)));
        }
    }

    /// Return to the position the source had when the reader was created.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NonSeekableStream`] if the source cannot seek.
    pub fn rewind(&mut self) -> Result<()> {
        let init = self.init_pos.ok_or(StreamError::NonSeekableStream)?;
        self.source
            .seekable()
            .ok_or(StreamError::NonSeekableStream)?
            .seek_absolute(init)?;
        self.pos = 0;
        self.state = State::Scanning;
        Ok(())
    }

    /// Bytes consumed since construction or the last rewind.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Returns true if the source can seek.
    #[must_use]
    pub fn is_seekable(&self) -> bool {
        self.init_pos.is_some()
    }

    /// Get the current limits.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read part of the open entry's payload.
    pub(super) fn read_payload(&mut self, buf: &mut [u8]) -> Result<usize> {
        let State::EntryOpen { size, read, .. } = &mut self.state else {
            return Err(StreamError::ClosedStream);
        };
        let remaining = *size - *read;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let len = remaining.min(buf.len() as u64) as usize;
        let n = loop {
            match self.source.read(&mut buf[..len]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            return Err(StreamError::UnexpectedEof { pos: self.pos });
        }
        *read += n as u64;
        self.pos += n as u64;
        Ok(n)
    }

    /// Move back to the start of the open entry's payload.
    pub(super) fn rewind_payload(&mut self) -> Result<()> {
        let State::EntryOpen { read, start, .. } = &mut self.state else {
            return Err(StreamError::ClosedStream);
        };
        let start = start.ok_or(StreamError::NonSeekableStream)?;
        self.source
            .seekable()
            .ok_or(StreamError::NonSeekableStream)?
            .seek_absolute(start)?;
        self.pos -= *read;
        *read = 0;
        Ok(())
    }

    /// Skip the rest of the open entry's payload and its padding.
    pub(super) fn finish_entry(&mut self) -> Result<()> {
        if let State::EntryOpen { size, read, .. } = self.state {
            self.skip((size - read) + padding(size))?;
            self.state = State::Scanning;
        }
        Ok(())
    }

    pub(super) fn entry_progress(&self) -> Option<(u64, u64)> {
        match self.state {
            State::EntryOpen { size, read, .. } => Some((read, size)),
            _ => None,
        }
    }

    fn note_extension(&self, pending: &mut PendingExtensions) -> Result<()> {
        pending.count += 1;
        self.limits.check_pending(pending.count)
    }

    /// Read the next header, or `None` at an end-of-archive block or the end
    /// of the stream.
    fn read_header(&mut self) -> Result<Option<HeaderRecord>> {
        let mut block = [0u8; BLOCK_SIZE];
        if !self.read_exact_or_eof(&mut block)? {
            return Ok(None);
        }
        let header = match HeaderRecord::decode(&block) {
            Ok(Some(header)) => header,
            Ok(None) => return Ok(None),
            Err(HeaderError::InvalidMagic(magic)) => {
                return Err(StreamError::InvalidTarStream(format!(
                    "bad magic {magic:?} in header at offset {}",
                    self.pos - BLOCK_SIZE as u64
                )))
            }
            Err(e) => return Err(e.into()),
        };
        verify_checksum(&block)?;
        if header.size < 0 {
            return Err(StreamError::InvalidTarStream(format!(
                "negative size {} in header at offset {}",
                header.size,
                self.pos - BLOCK_SIZE as u64
            )));
        }
        Ok(Some(header))
    }

    /// Read an extension payload and its padding.
    fn read_extension(&mut self, kind: &'static str, size: i64, limit: u64) -> Result<Vec<u8>> {
        let size = size as u64;
        if size > limit {
            return Err(StreamError::ExtensionTooLarge { kind, size, limit });
        }
        let len = usize::try_from(size)
            .map_err(|_| StreamError::ExtensionTooLarge { kind, size, limit })?;
        let mut data = vec![0u8; len];
        if !self.read_exact_or_eof(&mut data)? && len > 0 {
            return Err(StreamError::UnexpectedEof { pos: self.pos });
        }
        self.skip(padding(size))?;
        Ok(data)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        if let Some(seek) = self.source.seekable() {
            let mut remaining = len;
            while remaining > 0 {
                let step = remaining.min(i64::MAX as u64);
                seek.seek_relative(step as i64)?;
                remaining -= step;
            }
        } else {
            let copied = io::copy(&mut self.source.by_ref().take(len), &mut io::sink())?;
            if copied < len {
                return Err(StreamError::UnexpectedEof {
                    pos: self.pos + copied,
                });
            }
        }
        self.pos += len;
        Ok(())
    }

    /// Fail if an earlier seek went past the end of the stream.
    fn check_overrun(&mut self) -> Result<()> {
        let Some(seek) = self.source.seekable() else {
            return Ok(());
        };
        let end = seek.stream_len()?;
        if seek.position()? > end {
            let init = self.init_pos.unwrap_or(0);
            return Err(StreamError::UnexpectedEof {
                pos: end.saturating_sub(init),
            });
        }
        Ok(())
    }

    /// Fill `buf`, returning `false` on a clean EOF before the first byte.
    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut total = 0;
        while total < buf.len() {
            match self.source.read(&mut buf[total..]) {
                Ok(0) => {
                    if total == 0 {
                        self.check_overrun()?;
                        return Ok(false);
                    }
                    return Err(StreamError::UnexpectedEof {
                        pos: self.pos + total as u64,
                    });
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += total as u64;
        Ok(true)
    }
}

/// Apply PAX `size`, `path` and `mtime` to a header. PAX values take
/// precedence over the header fields and any GNU long name.
fn apply_pax(header: &mut HeaderRecord, attrs: &PaxAttributes) -> Result<()> {
    if let Some(size) = attrs.size()? {
        header.size = size;
    }
    if let Some(path) = attrs.path()? {
        header.set_long_name(path);
    }
    if let Some(mtime) = attrs.mtime()? {
        header.mtime = mtime.floor() as i64;
    }
    Ok(())
}
