//! Byte-level observation of the stream boundary.
//!
//! [`Inspector`] wraps the sink or source of a writer or reader and hands a
//! copy of every byte that crosses it to an optional [`Observer`]. The
//! observer is fixed at construction and never sees or alters anything the
//! wrapped stream does not.

use std::fmt;
use std::io::{self, Read, Write};

/// Receives a copy of the raw bytes crossing a stream boundary.
pub trait Observer {
    /// Called with bytes accepted by the underlying sink, in order.
    fn on_write(&mut self, bytes: &[u8]) {
        let _ = bytes;
    }

    /// Called with bytes returned by the underlying source, in order.
    fn on_read(&mut self, bytes: &[u8]) {
        let _ = bytes;
    }
}

/// Observer that logs every chunk as hex at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_write(&mut self, bytes: &[u8]) {
        tracing::trace!(len = bytes.len(), bytes = %HexBytes(bytes), "wrote");
    }

    fn on_read(&mut self, bytes: &[u8]) {
        tracing::trace!(len = bytes.len(), bytes = %HexBytes(bytes), "read");
    }
}

struct HexBytes<'a>(&'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Pass-through wrapper around a sink or source.
pub struct Inspector<S> {
    inner: S,
    observer: Option<Box<dyn Observer>>,
}

impl<S> Inspector<S> {
    /// Wraps a stream without an observer.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            observer: None,
        }
    }

    /// Wraps a stream and reports its traffic to `observer`.
    pub fn with_observer(inner: S, observer: Box<dyn Observer>) -> Self {
        Self {
            inner,
            observer: Some(observer),
        }
    }

    /// Returns true if an observer is attached.
    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwraps the stream, dropping the observer.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: fmt::Debug> fmt::Debug for Inspector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inspector")
            .field("inner", &self.inner)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl<W: Write> Write for Inspector<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if let Some(observer) = self.observer.as_mut() {
            observer.on_write(&buf[..written]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<R: Read> Read for Inspector<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if let Some(observer) = self.observer.as_mut() {
            observer.on_read(&buf[..read]);
        }
        Ok(read)
    }
}
