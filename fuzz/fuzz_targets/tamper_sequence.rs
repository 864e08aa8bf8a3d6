//! Fuzz target for in-flight tampering across a record sequence
//!
//! # Strategy
//!
//! - A sequence of writes with arbitrary sizes and padding
//! - At most one byte of the client's outbound stream flipped
//! - A graceful close at the end
//!
//! # Invariants
//!
//! - Bytes delivered to the server are always a prefix of what was written
//! - Without tampering the whole stream arrives, then end-of-stream
//! - With tampering the server never reaches end-of-stream; it fails with
//!   `InvalidTag`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tentp_core::TransportError;
use tentp_crypto::{ChaCha20, Poly1305};
use tentp_harness::connected_pair;

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    writes: Vec<Write>,
    tamper: Option<Tamper>,
}

#[derive(Debug, Arbitrary)]
struct Write {
    len: u16,
    padding: u8,
    fill: u8,
}

#[derive(Debug, Arbitrary)]
struct Tamper {
    offset: u32,
    mask: u8,
}

fuzz_target!(|scenario: Scenario| {
    let Ok((client, server)) = connected_pair::<ChaCha20, Poly1305>(scenario.seed) else {
        return;
    };

    let mut expected = Vec::new();
    for write in scenario.writes.iter().take(32) {
        let len = usize::from(write.len % 4096) + 1;
        let payload = vec![write.fill; len];
        let Ok(n) = client.write_padded(&payload, usize::from(write.padding)) else {
            return;
        };
        expected.extend_from_slice(&payload[..n]);
    }

    let written = client.transport().stats().bytes_written() + 24;
    let tampered = match &scenario.tamper {
        Some(t) if t.mask != 0 => {
            let offset = t.offset as usize % written;
            client.transport().tamper_outbound(offset, t.mask);
            true
        },
        _ => false,
    };
    if client.close().is_err() {
        return;
    }

    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    let outcome = loop {
        match server.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(err) => break Err(err),
        }
    };

    assert!(expected.starts_with(&received), "delivered bytes diverge from written bytes");
    if tampered {
        assert!(matches!(outcome, Err(TransportError::InvalidTag)), "tamper not detected");
    } else {
        assert!(outcome.is_ok());
        assert_eq!(received, expected);
    }
});
