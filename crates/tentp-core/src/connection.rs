//! Blocking record connection over a [`Transport`].
//!
//! Presents a stream interface to the caller: writes are cut into sealed
//! `DATA` records, reads deliver decrypted payload bytes in order and report
//! a peer `CLOSE` as end-of-stream.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐   close() / peer CLOSE / fatal error   ┌────────┐
//! │ Open │───────────────────────────────────────>│ Closed │
//! └──────┘                                        └────────┘
//!    │
//!    │ counter wrap (per direction, sticky, connection stays Open)
//!    ↓
//!  that direction fails with CounterWrapped, the other keeps working
//! ```
//!
//! # Locking
//!
//! `write` and `close` serialize on the send-side mutex, which covers the
//! whole seal-and-transmit step so concurrent writers never interleave
//! records on the wire. The receive side has its own mutex; one reader at a
//! time is the supported usage. A reader and a writer may run in parallel.

use std::{
    io,
    sync::{
        Mutex, MutexGuard, PoisonError, TryLockError,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use bytes::{Buf, BytesMut};
use tentp_crypto::{Aes256Ctr, Authenticator, ChaCha20, Cipher, Poly1305};
use tentp_proto::{Command, MAX_PLAINTEXT_RECORD_LEN, ProtocolError, Record};

use crate::{
    codec::{header_wire_len, open_header, seal_record},
    error::TransportError,
    key_state::KeyState,
    transport::Transport,
};

/// Initial per-direction secrets, each exactly `C::KEY_SIZE` bytes.
///
/// The two ends must be built mirrored: one side's `send` is the other
/// side's `recv`.
#[derive(Clone, Copy)]
pub struct SessionKeys<'a> {
    /// Secret for records this side seals
    pub send: &'a [u8],
    /// Secret for records this side opens
    pub recv: &'a [u8],
}

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Records can flow in both directions
    Open,
    /// Closed locally, by the peer, or after a fatal error
    Closed,
}

/// Receive-side state, guarded by its own lock.
struct RecvHalf<C, A> {
    keys: KeyState<C, A>,
    /// Decrypted payload not yet handed to the caller
    queue: BytesMut,
    /// Peer sent CLOSE
    peer_closed: bool,
}

/// Encrypted, authenticated record connection.
///
/// Generic over the transport and the cipher / authenticator pairing. See
/// [`ChaChaPolyConnection`] and [`AesPolyConnection`] for the supported
/// suites.
pub struct Connection<T, C, A> {
    transport: T,
    send: Mutex<KeyState<C, A>>,
    recv: Mutex<RecvHalf<C, A>>,
    closed: AtomicBool,
}

/// ChaCha20 (64-bit nonce) with Poly1305.
pub type ChaChaPolyConnection<T> = Connection<T, ChaCha20, Poly1305>;

/// AES-256-CTR with Poly1305.
pub type AesPolyConnection<T> = Connection<T, Aes256Ctr, Poly1305>;

impl<T: Transport, C: Cipher, A: Authenticator> Connection<T, C, A> {
    /// Wrap an established transport.
    ///
    /// No handshake takes place; both ends must already share the secrets.
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidKeyLength` if either secret is not
    ///   `C::KEY_SIZE` bytes
    pub fn new(transport: T, keys: SessionKeys<'_>) -> Result<Self, TransportError> {
        let send = KeyState::new(keys.send)?;
        let recv = KeyState::new(keys.recv)?;

        tracing::debug!(cipher = C::NAME, authenticator = A::NAME, "connection opened");

        Ok(Self {
            transport,
            send: Mutex::new(send),
            recv: Mutex::new(RecvHalf { keys: recv, queue: BytesMut::new(), peer_closed: false }),
            closed: AtomicBool::new(false),
        })
    }

    /// Send up to [`MAX_PLAINTEXT_RECORD_LEN`] bytes of `buf` as one record.
    ///
    /// Returns the number of bytes consumed; callers loop to send more.
    ///
    /// # Errors
    ///
    /// - `TransportError::Protocol` if `buf` is empty (nothing is sent)
    /// - `TransportError::CounterWrapped` once the send direction is
    ///   exhausted (the connection stays open)
    /// - `TransportError::Closed` if the connection is closed
    /// - `TransportError::Io` on transport failure (the connection closes)
    pub fn write(&self, buf: &[u8]) -> Result<usize, TransportError> {
        self.write_padded(buf, 0)
    }

    /// Like [`Self::write`], but appends `padding` filler bytes to the
    /// record to hide the payload length.
    ///
    /// At most `MAX_PLAINTEXT_RECORD_LEN - padding` payload bytes are
    /// consumed.
    ///
    /// # Errors
    ///
    /// As [`Self::write`], plus `ProtocolError::InvalidPadding` if
    /// `padding > 255`.
    pub fn write_padded(&self, buf: &[u8], padding: usize) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Err(ProtocolError::InvalidMessageLength {
                length: 0,
                max: MAX_PLAINTEXT_RECORD_LEN,
            }
            .into());
        }
        if padding > usize::from(u8::MAX) {
            return Err(ProtocolError::InvalidPadding(padding).into());
        }

        let mut send = lock(&self.send);
        if let Some(err) = send.sticky_error() {
            return Err(err);
        }
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let len = buf.len().min(MAX_PLAINTEXT_RECORD_LEN - padding);
        let record = Record::new(Command::Data, &buf[..len], padding)?;

        let mut wire = BytesMut::new();
        let sent = seal_record(&mut *send, &record, &mut wire)
            .and_then(|counter| Ok((counter, self.transport.write_all(&wire)?)));

        match sent {
            Ok((counter, ())) => {
                tracing::debug!(counter, len, padding, "sent data record");
                Ok(len)
            },
            Err(err) => {
                send.clear();
                Err(self.fail(err))
            },
        }
    }

    /// Read decrypted payload bytes into `buf`.
    ///
    /// Returns `Ok(0)` at end-of-stream (the peer closed gracefully) or if
    /// `buf` is empty. Buffered payload from earlier records is delivered
    /// before any new record is read.
    ///
    /// # Errors
    ///
    /// - `TransportError::CounterWrapped` once the receive direction is
    ///   exhausted
    /// - `TransportError::Closed` if the connection was closed locally
    /// - `TransportError::InvalidTag` / `TransportError::Protocol` on a
    ///   forged or malformed record (the connection closes)
    /// - `TransportError::Io` on transport failure (the connection closes)
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut guard = lock(&self.recv);
        let recv = &mut *guard;

        loop {
            if !recv.queue.is_empty() {
                let n = buf.len().min(recv.queue.len());
                buf[..n].copy_from_slice(&recv.queue[..n]);
                recv.queue.advance(n);
                return Ok(n);
            }

            if let Some(err) = recv.keys.sticky_error() {
                return Err(err);
            }
            if recv.peer_closed {
                return Ok(0);
            }
            if self.is_closed() {
                return Err(TransportError::Closed);
            }

            let record = match self.read_record(&mut recv.keys) {
                Ok(record) => record,
                Err(err) => {
                    let err = self.fail(err);
                    self.wipe_after_read(recv);
                    return Err(err);
                },
            };

            match record.header.command_enum() {
                Some(Command::Data) => recv.queue.extend_from_slice(record.payload()),
                Some(Command::Close) => {
                    tracing::debug!("peer closed connection");
                    recv.peer_closed = true;
                    self.shutdown_transport();
                    self.wipe_after_read(recv);
                    return Ok(0);
                },
                None => {
                    let err = ProtocolError::InvalidCommand(record.header.command());
                    let err = self.fail(err.into());
                    self.wipe_after_read(recv);
                    return Err(err);
                },
            }
        }
    }

    /// Gracefully close the connection.
    ///
    /// Sends a `CLOSE` record on a best-effort basis, then shuts the
    /// transport down and wipes the keys of both directions. Closing an
    /// already closed connection sends nothing.
    ///
    /// # Errors
    ///
    /// - `TransportError::Io` if shutting down the transport fails
    pub fn close(&self) -> Result<(), TransportError> {
        let mut send = lock(&self.send);
        let result = if self.is_closed() {
            Ok(())
        } else {
            let mut wire = BytesMut::new();
            let sent = seal_record(&mut *send, &Record::empty(Command::Close), &mut wire)
                .and_then(|_| Ok(self.transport.write_all(&wire)?));
            if let Err(err) = sent {
                tracing::debug!(error = %err, "close record not sent");
            }
            self.force_close().map_err(TransportError::from)
        };
        send.clear();
        drop(send);

        // The transport is shut down, so a blocked reader has let go
        lock(&self.recv).keys.clear();
        result
    }

    /// Deadlines are not supported; always fails.
    ///
    /// # Errors
    ///
    /// - `TransportError::NotSupported`
    pub fn set_deadline(&self, _deadline: Option<Instant>) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Deadlines are not supported; always fails.
    ///
    /// # Errors
    ///
    /// - `TransportError::NotSupported`
    pub fn set_read_deadline(&self, _deadline: Option<Instant>) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Deadlines are not supported; always fails.
    ///
    /// # Errors
    ///
    /// - `TransportError::NotSupported`
    pub fn set_write_deadline(&self, _deadline: Option<Instant>) -> Result<(), TransportError> {
        Err(TransportError::NotSupported)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        if self.is_closed() { ConnectionState::Closed } else { ConnectionState::Open }
    }

    /// Records sealed so far. Waits for any write in progress.
    pub fn send_counter(&self) -> u64 {
        lock(&self.send).counter()
    }

    /// Records opened so far. Waits for any read in progress.
    pub fn recv_counter(&self) -> u64 {
        lock(&self.recv).keys.counter()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Read and open one full record.
    fn read_record(&self, keys: &mut KeyState<C, A>) -> Result<Record, TransportError> {
        let mut header = vec![0u8; header_wire_len::<A>()];
        self.transport.read_exact(&mut header)?;

        let opened = open_header(keys, &mut header)?;
        let mut body = BytesMut::zeroed(opened.body_wire_len());
        if !body.is_empty() {
            self.transport.read_exact(&mut body)?;
        }

        let record = opened.open_body(body)?;
        tracing::debug!(
            counter = keys.counter().wrapping_sub(1),
            len = record.header.length(),
            padding = record.header.padding_length(),
            "received record"
        );
        Ok(record)
    }

    /// Force-close after a fatal error and hand the error back.
    fn fail(&self, err: TransportError) -> TransportError {
        match &err {
            TransportError::InvalidTag => tracing::warn!("record failed authentication, closing"),
            _ => tracing::warn!(error = %err, "closing connection after error"),
        }
        self.shutdown_transport();
        err
    }

    /// Wipe keys once the receive direction is finished.
    ///
    /// The send key is skipped while a write holds its lock; `close` or
    /// drop wipes it then.
    fn wipe_after_read(&self, recv: &mut RecvHalf<C, A>) {
        recv.keys.clear();
        match self.send.try_lock() {
            Ok(mut send) => send.clear(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().clear(),
            Err(TryLockError::WouldBlock) => {},
        }
    }

    fn shutdown_transport(&self) {
        if let Err(err) = self.force_close() {
            tracing::debug!(error = %err, "transport shutdown failed");
        }
    }

    /// Mark closed and shut the transport down, once.
    fn force_close(&self) -> io::Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.transport.shutdown()
    }

    #[cfg(test)]
    fn force_counters(&self, send: u64, recv: u64) {
        lock(&self.send).force_counter(send);
        lock(&self.recv).keys.force_counter(recv);
    }
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, C, A> std::fmt::Debug for Connection<T, C, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T: Transport, C: Cipher, A: Authenticator> io::Read for &Connection<T, C, A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Connection::<T, C, A>::read(*self, buf).map_err(io::Error::from)
    }
}

impl<T: Transport, C: Cipher, A: Authenticator> io::Read for Connection<T, C, A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}

impl<T: Transport, C: Cipher, A: Authenticator> io::Write for &Connection<T, C, A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // io::Write permits empty writes
        if buf.is_empty() {
            return Ok(0);
        }
        Connection::<T, C, A>::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Records are transmitted whole by write
        Ok(())
    }
}

impl<T: Transport, C: Cipher, A: Authenticator> io::Write for Connection<T, C, A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
