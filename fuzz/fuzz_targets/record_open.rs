//! Fuzz target for the sans-IO record opener
//!
//! Feeds arbitrary bytes to `open_record` under a fixed key state.
//!
//! # Invariants
//!
//! - Never panics; malformed input returns an error or `Ok(None)`
//! - A failed open never advances the ratchet
//! - `Ok(None)` consumes nothing
//! - An opened record's body matches its header

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tentp_core::{KeyState, open_record};
use tentp_crypto::{ChaCha20, Poly1305};

const KEY: [u8; 40] = [0x5C; 40];

fuzz_target!(|data: &[u8]| {
    let Ok(mut state) = KeyState::<ChaCha20, Poly1305>::new(&KEY) else {
        return;
    };
    let mut src = BytesMut::from(data);
    let before = src.len();

    match open_record(&mut state, &mut src) {
        Ok(Some(record)) => {
            assert_eq!(record.body.len(), record.header.body_len());
            assert_eq!(state.counter(), 1);
        },
        Ok(None) => {
            assert_eq!(src.len(), before);
            assert_eq!(state.counter(), 0);
        },
        Err(_) => assert_eq!(state.counter(), 0),
    }
});
