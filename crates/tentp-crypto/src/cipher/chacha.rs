//! ChaCha20 keystream (original 64-bit nonce construction).

use ::chacha20::{
    ChaCha20Legacy,
    cipher::{KeyIvInit, StreamCipher},
};

use super::Cipher;
use crate::error::CryptoError;

/// ChaCha20 key length (32 bytes)
const CHACHA20_KEY_SIZE: usize = 32;

/// ChaCha20 legacy nonce length (8 bytes)
const CHACHA20_NONCE_SIZE: usize = 8;

/// ChaCha20 with a 64-bit nonce and 64-bit block counter.
///
/// The 40-byte record key is split as `key (32) ‖ nonce (8)`. Since every
/// record key is used for exactly one keystream, the nonce is just more key
/// material.
pub struct ChaCha20 {
    inner: ChaCha20Legacy,
}

impl Cipher for ChaCha20 {
    const KEY_SIZE: usize = CHACHA20_KEY_SIZE + CHACHA20_NONCE_SIZE;
    const NAME: &'static str = "chacha20";

    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        CryptoError::check_key_len(Self::NAME, Self::KEY_SIZE, key)?;

        let (key, nonce) = key.split_at(CHACHA20_KEY_SIZE);
        let Ok(inner) = ChaCha20Legacy::new_from_slices(key, nonce) else {
            unreachable!("chacha20 key and nonce lengths checked above");
        };

        Ok(Self { inner })
    }

    fn apply_keystream(&mut self, buf: &mut [u8]) {
        self.inner.apply_keystream(buf);
    }
}
