//! Byte-stream abstraction beneath a connection.
//!
//! A [`Connection`](crate::Connection) shares one transport between its
//! reader and writer sides, so every method takes `&self`. Reads and writes
//! may run concurrently from different threads; `shutdown` must unblock both.

use std::{io, net::TcpStream, sync::Arc};

/// Reliable, ordered, bidirectional byte stream.
pub trait Transport: Send + Sync {
    /// Fill `buf` completely or fail.
    ///
    /// A stream that ends before `buf` is full reports
    /// `io::ErrorKind::UnexpectedEof`.
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `buf`.
    fn write_all(&self, buf: &[u8]) -> io::Result<()>;

    /// Tear down both directions of the stream.
    fn shutdown(&self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()> {
        io::Read::read_exact(&mut &*self, buf)
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut &*self, buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        match TcpStream::shutdown(self, std::net::Shutdown::Both) {
            // Peer already gone
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()> {
        io::Read::read_exact(&mut &*self, buf)
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut &*self, buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        match std::os::unix::net::UnixStream::shutdown(self, std::net::Shutdown::Both) {
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_exact(buf)
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        (**self).shutdown()
    }
}
