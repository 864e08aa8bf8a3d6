//! Poly1305 one-time authenticator.

use ::poly1305::universal_hash::KeyInit;
use zeroize::Zeroize;

use super::Authenticator;
use crate::{error::CryptoError, key::KeyMaterial};

/// Poly1305 key length (32 bytes)
const POLY1305_KEY_SIZE: usize = 32;

/// Poly1305 tag size (16 bytes)
const POLY1305_TAG_SIZE: usize = 16;

/// Poly1305 over the unpadded concatenation of every `update` call.
///
/// Input is buffered and processed in one pass when the tag is requested,
/// since the record layer calls [`Authenticator::tag`] exactly once per
/// message and records are at most a few kilobytes.
pub struct Poly1305 {
    key: KeyMaterial,
    buffer: Vec<u8>,
}

impl Authenticator for Poly1305 {
    const KEY_SIZE: usize = POLY1305_KEY_SIZE;
    const TAG_SIZE: usize = POLY1305_TAG_SIZE;
    const NAME: &'static str = "poly1305";

    fn new(key: &[u8]) -> Result<Self, CryptoError> {
        CryptoError::check_key_len(Self::NAME, Self::KEY_SIZE, key)?;
        Ok(Self { key: KeyMaterial::new(key), buffer: Vec::new() })
    }

    fn update(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    fn tag(&self) -> Vec<u8> {
        if self.key.is_empty() {
            return Vec::new();
        }
        let Ok(mac) = ::poly1305::Poly1305::new_from_slice(self.key.as_bytes()) else {
            unreachable!("poly1305 key length checked at construction");
        };
        mac.compute_unpadded(&self.buffer).to_vec()
    }

    fn clear(&mut self) {
        self.key.clear();
        self.buffer.zeroize();
    }
}

impl Drop for Poly1305 {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc8439_key() -> Vec<u8> {
        hex::decode("85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b").unwrap()
    }

    #[test]
    fn rfc8439_test_vector() {
        // RFC 8439 section 2.5.2
        let mut mac = Poly1305::new(&rfc8439_key()).unwrap();
        mac.update(b"Cryptographic Forum Research Group");

        assert_eq!(mac.tag(), hex::decode("a8061dc1305136c6c22b8baf0c0127a9").unwrap());
    }

    #[test]
    fn split_updates_match_single_update() {
        let mut split = Poly1305::new(&rfc8439_key()).unwrap();
        split.update(b"Cryptographic ");
        split.update(b"Forum ");
        split.update(b"Research Group");

        let mut whole = Poly1305::new(&rfc8439_key()).unwrap();
        whole.update(b"Cryptographic Forum Research Group");

        assert_eq!(split.tag(), whole.tag());
    }

    #[test]
    fn tag_does_not_consume_input() {
        let mut mac = Poly1305::new(&rfc8439_key()).unwrap();
        mac.update(b"abc");
        assert_eq!(mac.tag(), mac.tag());
        assert_eq!(mac.tag().len(), Poly1305::TAG_SIZE);
    }

    #[test]
    fn verify_accepts_own_tag_and_rejects_others() {
        let mut mac = Poly1305::new(&rfc8439_key()).unwrap();
        mac.update(b"header bytes");
        let tag = mac.tag();
        assert!(mac.verify(&tag));

        let mut forged = tag.clone();
        forged[15] ^= 0x80;
        assert!(!mac.verify(&forged));
        assert!(!mac.verify(&tag[..15]));
    }

    #[test]
    fn cleared_instance_verifies_nothing() {
        let mut mac = Poly1305::new(&rfc8439_key()).unwrap();
        mac.update(b"Cryptographic Forum Research Group");
        let tag = mac.tag();

        mac.clear();
        assert!(mac.key.is_empty());
        assert!(mac.buffer.is_empty());
        assert!(mac.tag().is_empty());
        assert!(!mac.verify(&tag));
    }

    #[test]
    fn rejects_wrong_key_size() {
        assert!(matches!(
            Poly1305::new(&[0u8; 16]),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 16, .. })
        ));
    }
}
