//! Fuzz target for `Connection::read` over hostile input
//!
//! The peer writes arbitrary bytes and hangs up; the local connection reads
//! until end-of-stream or error.
//!
//! # Invariants
//!
//! - Never panics and always terminates
//! - Any error leaves the connection closed
//! - No payload is delivered without an authentic record

#![no_main]

use libfuzzer_sys::fuzz_target;
use tentp_core::{ChaChaPolyConnection, ConnectionState, SessionKeys, Transport};
use tentp_harness::memory_pair;

const KEY: [u8; 40] = [0xA7; 40];

fuzz_target!(|data: &[u8]| {
    let (peer, local) = memory_pair();
    let Ok(conn) = ChaChaPolyConnection::new(local, SessionKeys { send: &KEY, recv: &KEY }) else {
        return;
    };

    if peer.write_all(data).is_err() || peer.shutdown().is_err() {
        return;
    }

    let mut buf = [0u8; 4096];
    match conn.read(&mut buf) {
        Ok(n) => assert_eq!(n, 0, "forged payload delivered"),
        Err(_) => assert_eq!(conn.state(), ConnectionState::Closed),
    }
});
