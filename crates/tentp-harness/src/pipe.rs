//! In-memory duplex byte stream.
//!
//! [`memory_pair`] returns two connected [`MemoryTransport`] ends. Each
//! direction is a blocking pipe: reads wait until enough bytes arrive or the
//! pipe is shut down. Faults are injected on the write side:
//!
//! - [`MemoryTransport::tamper_outbound`] flips bits at a given offset of the
//!   outbound byte stream, simulating an active attacker on the wire
//! - [`MemoryTransport::fail_writes`] makes every subsequent write fail
//!
//! Every end counts its I/O calls so tests can assert that an operation
//! did (or did not) touch the transport.

#![allow(clippy::disallowed_types, reason = "Blocking pipes need Mutex and Condvar")]

use std::{
    collections::{BTreeMap, VecDeque},
    io,
    sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use tentp_core::Transport;

/// One direction of the duplex stream.
#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
}

#[derive(Default)]
struct PipeState {
    buffer: VecDeque<u8>,
    closed: bool,
    /// Bytes ever written into this pipe
    written: usize,
    /// Stream offset -> XOR mask, applied as bytes are written
    tamper: BTreeMap<usize, u8>,
}

impl Pipe {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        #[allow(clippy::expect_used)]
        self.state.lock().expect("pipe mutex poisoned")
    }

    fn close(&self) {
        self.lock().closed = true;
        self.readable.notify_all();
    }
}

/// I/O call counters for one end.
#[derive(Debug, Default)]
pub struct IoStats {
    reads: AtomicUsize,
    writes: AtomicUsize,
    bytes_written: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl IoStats {
    /// Number of `read_exact` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write_all` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Total bytes accepted by `write_all`.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written.load(Ordering::SeqCst)
    }

    /// Number of `shutdown` calls.
    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

/// One end of an in-memory duplex stream.
///
/// Cheap to clone; clones share the same pipes and counters.
#[derive(Clone)]
pub struct MemoryTransport {
    inbound: Arc<Pipe>,
    outbound: Arc<Pipe>,
    stats: Arc<IoStats>,
    fail_writes: Arc<AtomicBool>,
}

/// Create two connected ends.
pub fn memory_pair() -> (MemoryTransport, MemoryTransport) {
    let a_to_b = Arc::new(Pipe::default());
    let b_to_a = Arc::new(Pipe::default());

    let a = MemoryTransport {
        inbound: Arc::clone(&b_to_a),
        outbound: Arc::clone(&a_to_b),
        stats: Arc::default(),
        fail_writes: Arc::default(),
    };
    let b = MemoryTransport {
        inbound: a_to_b,
        outbound: b_to_a,
        stats: Arc::default(),
        fail_writes: Arc::default(),
    };
    (a, b)
}

impl MemoryTransport {
    /// I/O counters for this end.
    pub fn stats(&self) -> &IoStats {
        &self.stats
    }

    /// XOR `mask` into the byte at `offset` of this end's outbound stream.
    ///
    /// Offsets count every byte ever written by this end. Bytes already
    /// written are modified in place if still buffered.
    pub fn tamper_outbound(&self, offset: usize, mask: u8) {
        let mut pipe = self.outbound.lock();
        if offset < pipe.written {
            let buffered_from = pipe.written - pipe.buffer.len();
            let index = offset.checked_sub(buffered_from);
            if let Some(byte) = index.and_then(|i| pipe.buffer.get_mut(i)) {
                *byte ^= mask;
            }
        } else {
            *pipe.tamper.entry(offset).or_default() ^= mask;
        }
        tracing::debug!(offset, mask, "tamper scheduled on outbound stream");
    }

    /// Make every later `write_all` on this end fail with `BrokenPipe`.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Bytes written by the peer that this end has not read yet.
    pub fn inbound_len(&self) -> usize {
        self.inbound.lock().buffer.len()
    }

    /// True once either end has shut the stream down.
    pub fn is_shutdown(&self) -> bool {
        self.inbound.lock().closed
    }
}

impl Transport for MemoryTransport {
    fn read_exact(&self, buf: &mut [u8]) -> io::Result<()> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);

        let mut pipe = self.inbound.lock();
        while pipe.buffer.len() < buf.len() && !pipe.closed {
            #[allow(clippy::expect_used)]
            let next = self.inbound.readable.wait(pipe).expect("pipe mutex poisoned");
            pipe = next;
        }

        if pipe.buffer.len() < buf.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        io::Read::read_exact(&mut pipe.buffer, buf)
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::ErrorKind::BrokenPipe.into());
        }

        let mut pipe = self.outbound.lock();
        if pipe.closed {
            return Err(io::ErrorKind::BrokenPipe.into());
        }

        let end = pipe.written + buf.len();
        pipe.buffer.extend(buf);
        pipe.written = end;

        // Scheduled tampering that falls inside this write
        let later = pipe.tamper.split_off(&end);
        let hits = std::mem::replace(&mut pipe.tamper, later);
        for (offset, mask) in hits {
            let index = pipe.buffer.len() - (end - offset);
            pipe.buffer[index] ^= mask;
        }
        drop(pipe);

        self.stats.bytes_written.fetch_add(buf.len(), Ordering::SeqCst);
        self.outbound.readable.notify_all();
        Ok(())
    }

    fn shutdown(&self) -> io::Result<()> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);

        // Unread inbound data is discarded, as after a socket shutdown
        self.inbound.lock().buffer.clear();
        self.inbound.close();
        self.outbound.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn bytes_flow_both_ways() {
        let (a, b) = memory_pair();
        a.write_all(b"ping").unwrap();
        b.write_all(b"pong").unwrap();

        let mut buf = [0u8; 4];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn read_blocks_until_data_arrives() {
        let (a, b) = memory_pair();

        let reader = thread::spawn(move || {
            let mut buf = [0u8; 6];
            b.read_exact(&mut buf).map(|()| buf)
        });
        a.write_all(b"abc").unwrap();
        a.write_all(b"def").unwrap();

        assert_eq!(&reader.join().unwrap().unwrap(), b"abcdef");
    }

    #[test]
    fn shutdown_wakes_blocked_reader() {
        let (a, b) = memory_pair();
        let b2 = b.clone();

        let reader = thread::spawn(move || {
            let mut buf = [0u8; 1];
            b2.read_exact(&mut buf)
        });
        b.shutdown().unwrap();

        let err = reader.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(a.is_shutdown());
        assert_eq!(a.write_all(b"x").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn peer_drains_before_eof() {
        let (a, b) = memory_pair();
        a.write_all(b"tail").unwrap();
        a.shutdown().unwrap();

        let mut buf = [0u8; 4];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"tail");
        assert_eq!(b.read_exact(&mut buf).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn tamper_applies_to_future_and_buffered_bytes() {
        let (a, b) = memory_pair();
        a.write_all(&[0u8; 4]).unwrap();
        a.tamper_outbound(1, 0xFF);
        a.tamper_outbound(5, 0x01);
        a.write_all(&[0u8; 4]).unwrap();

        let mut buf = [0u8; 8];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0, 0xFF, 0, 0, 0, 0x01, 0, 0]);
    }

    #[test]
    fn counters_track_calls() {
        let (a, b) = memory_pair();
        a.write_all(b"12345").unwrap();
        let mut buf = [0u8; 5];
        b.read_exact(&mut buf).unwrap();

        assert_eq!(a.stats().writes(), 1);
        assert_eq!(a.stats().bytes_written(), 5);
        assert_eq!(a.stats().reads(), 0);
        assert_eq!(b.stats().reads(), 1);
        assert_eq!(b.inbound_len(), 0);
    }

    #[test]
    fn failed_writes_are_counted() {
        let (a, _b) = memory_pair();
        a.fail_writes();
        assert_eq!(a.write_all(b"x").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(a.stats().writes(), 1);
        assert_eq!(a.stats().bytes_written(), 0);
    }
}
