//! Stream capabilities.
//!
//! Whether a stream can seek is fixed when it is wrapped: [`Sequential`]
//! streams never report a seek capability, [`Seekable`] ones always do. The
//! reader uses it to skip payloads cheaply and to rewind; the writer needs
//! it for entries whose size is only known after the payload is written.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Random access to a stream.
pub trait SeekableStream {
    /// Current absolute position.
    fn position(&mut self) -> io::Result<u64>;

    /// Move to an absolute position.
    fn seek_absolute(&mut self, pos: u64) -> io::Result<()>;

    /// Move relative to the current position.
    fn seek_relative(&mut self, offset: i64) -> io::Result<()>;

    /// Total length of the stream. The position is left unchanged.
    fn stream_len(&mut self) -> io::Result<u64>;
}

/// A byte stream the [`Reader`](super::Reader) can consume.
pub trait ByteSource: Read {
    /// Seek capability, if the stream has one.
    fn seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        None
    }
}

/// A byte stream the [`Writer`](super::Writer) can produce into.
pub trait ByteSink: Write {
    /// Seek capability, if the stream has one.
    fn seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        None
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        (**self).seekable()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        (**self).seekable()
    }
}

/// A stream used strictly front to back, even if the inner type could seek.
#[derive(Debug, Default)]
pub struct Sequential<T>(T);

impl<T> Sequential<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Gets a reference to the wrapped stream.
    pub fn get_ref(&self) -> &T {
        &self.0
    }

    /// Gets a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Read> Read for Sequential<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<T: Write> Write for Sequential<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<T: Read> ByteSource for Sequential<T> {}

impl<T: Write> ByteSink for Sequential<T> {}

/// A stream that supports random access.
#[derive(Debug, Default)]
pub struct Seekable<T>(T);

impl<T> Seekable<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Gets a reference to the wrapped stream.
    pub fn get_ref(&self) -> &T {
        &self.0
    }

    /// Gets a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Read> Read for Seekable<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<T: Write> Write for Seekable<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<T: Seek> SeekableStream for Seekable<T> {
    fn position(&mut self) -> io::Result<u64> {
        self.0.stream_position()
    }

    fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
        self.0.seek(SeekFrom::Start(pos)).map(drop)
    }

    fn seek_relative(&mut self, offset: i64) -> io::Result<()> {
        self.0.seek(SeekFrom::Current(offset)).map(drop)
    }

    fn stream_len(&mut self) -> io::Result<u64> {
        let pos = self.0.stream_position()?;
        let len = self.0.seek(SeekFrom::End(0))?;
        if pos != len {
            self.0.seek(SeekFrom::Start(pos))?;
        }
        Ok(len)
    }
}

impl<T: Read + Seek> ByteSource for Seekable<T> {
    fn seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        Some(self)
    }
}

impl<T: Write + Seek> ByteSink for Seekable<T> {
    fn seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        Some(self)
    }
}
