//! Keystream ciphers driving the record ratchet.
//!
//! A [`Cipher`] is keyed once per record and never used as a running stream
//! across records. Sender and receiver must draw from it in the identical
//! order, so both [`Cipher::keystream`] and [`Cipher::apply_keystream`]
//! consume the same underlying position.

mod aes_ctr;
mod chacha;

pub use aes_ctr::Aes256Ctr;
pub use chacha::ChaCha20;

use crate::{error::CryptoError, key::KeyMaterial};

/// Keystream-producing symmetric primitive.
pub trait Cipher: Sized + Send {
    /// Exact key length accepted by [`Cipher::new`].
    const KEY_SIZE: usize;

    /// Algorithm name for diagnostics.
    const NAME: &'static str;

    /// Key a fresh instance positioned at the start of the keystream.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` if `key.len() != KEY_SIZE`
    fn new(key: &[u8]) -> Result<Self, CryptoError>;

    /// XOR `buf` in place with the next `buf.len()` keystream bytes.
    ///
    /// Encryption and decryption are the same operation.
    fn apply_keystream(&mut self, buf: &mut [u8]);

    /// Draw the next `len` keystream bytes.
    fn keystream(&mut self, len: usize) -> KeyMaterial {
        let mut out = KeyMaterial::zeroed(len);
        self.apply_keystream(out.as_mut_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keystream_is_position_shared<C: Cipher>() {
        let key = vec![0x5Au8; C::KEY_SIZE];

        // keystream(a) then apply_keystream(b) must equal one keystream(a + b)
        let mut split = C::new(&key).unwrap();
        let head = split.keystream(37);
        let mut tail = vec![0u8; 91];
        split.apply_keystream(&mut tail);

        let mut whole = C::new(&key).unwrap();
        let all = whole.keystream(37 + 91);

        assert_eq!(head.as_bytes(), &all.as_bytes()[..37]);
        assert_eq!(&tail[..], &all.as_bytes()[37..]);
    }

    fn xor_round_trip<C: Cipher>() {
        let key = vec![0x11u8; C::KEY_SIZE];
        let plaintext = b"records are encrypted with the shared keystream".to_vec();

        let mut buf = plaintext.clone();
        C::new(&key).unwrap().apply_keystream(&mut buf);
        assert_ne!(buf, plaintext);

        C::new(&key).unwrap().apply_keystream(&mut buf);
        assert_eq!(buf, plaintext);
    }

    fn rejects_wrong_key_size<C: Cipher>() {
        for len in [0, C::KEY_SIZE - 1, C::KEY_SIZE + 1] {
            let result = C::new(&vec![0u8; len]);
            assert!(
                matches!(result, Err(CryptoError::InvalidKeyLength { expected, actual, .. })
                    if expected == C::KEY_SIZE && actual == len),
                "{} accepted a {len}-byte key",
                C::NAME
            );
        }
    }

    fn different_keys_diverge<C: Cipher>() {
        let mut a = C::new(&vec![0u8; C::KEY_SIZE]).unwrap();
        let mut b = C::new(&{
            let mut k = vec![0u8; C::KEY_SIZE];
            k[0] = 1;
            k
        })
        .unwrap();
        assert_ne!(a.keystream(64), b.keystream(64));
    }

    #[test]
    fn chacha20_contract() {
        keystream_is_position_shared::<ChaCha20>();
        xor_round_trip::<ChaCha20>();
        rejects_wrong_key_size::<ChaCha20>();
        different_keys_diverge::<ChaCha20>();
    }

    #[test]
    fn aes256_ctr_contract() {
        keystream_is_position_shared::<Aes256Ctr>();
        xor_round_trip::<Aes256Ctr>();
        rejects_wrong_key_size::<Aes256Ctr>();
        different_keys_diverge::<Aes256Ctr>();
    }
}
