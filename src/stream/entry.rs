//! Entry payload streams yielded by the reader.

use std::io::{self, Read};

use crate::{HeaderRecord, PaxAttributes};

use super::error::{Result, StreamError};
use super::io::ByteSource;
use super::reader::Reader;

/// One actual entry of an archive and a bounded stream over its payload.
///
/// The header has GNU long names and PAX attributes applied already. Reads
/// never go past the entry's size and return 0 at its end.
///
/// # Lifetime
///
/// The entry borrows the [`Reader`] mutably, so it is gone by the time the
/// reader advances. [`close`](Self::close) ends it early; reads after that
/// fail with [`StreamError::ClosedStream`].
#[derive(Debug)]
pub struct EntryStream<'r, S: ByteSource> {
    reader: &'r mut Reader<S>,
    header: HeaderRecord,
    pax: Option<PaxAttributes>,
    read: u64,
    invalidated: bool,
}

impl<'r, S: ByteSource> EntryStream<'r, S> {
    pub(super) fn new(
        reader: &'r mut Reader<S>,
        header: HeaderRecord,
        pax: Option<PaxAttributes>,
    ) -> Self {
        Self {
            reader,
            header,
            pax,
            read: 0,
            invalidated: false,
        }
    }

    /// The resolved header.
    #[must_use]
    pub fn header(&self) -> &HeaderRecord {
        &self.header
    }

    /// The PAX attributes that preceded this entry, if any.
    #[must_use]
    pub fn pax(&self) -> Option<&PaxAttributes> {
        self.pax.as_ref()
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.header.size as u64
    }

    /// Payload bytes read so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Returns true once the whole payload has been read.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.read >= self.size()
    }

    /// Returns true once the entry was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.invalidated
    }

    /// Move back to the start of the payload.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NonSeekableStream`] if the source cannot seek,
    /// or [`StreamError::ClosedStream`] after [`close`](Self::close).
    pub fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.reader.rewind_payload()?;
        self.read = 0;
        Ok(())
    }

    /// Skip the rest of the payload and invalidate the entry.
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if skipping the rest of the payload fails.
    pub fn close(&mut self) -> Result<()> {
        if self.invalidated {
            return Ok(());
        }
        self.invalidated = true;
        self.reader.finish_entry()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.invalidated {
            return Err(StreamError::ClosedStream);
        }
        debug_assert_eq!(
            self.reader.entry_progress(),
            Some((self.read, self.size()))
        );
        Ok(())
    }
}

impl<S: ByteSource> Read for EntryStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        let n = self.reader.read_payload(buf)?;
        self.read += n as u64;
        Ok(n)
    }
}
