//! One-time message authenticators.
//!
//! Each record draws two fresh authenticator keys from the ratchet, one for
//! the header and one for the body, so an [`Authenticator`] instance only
//! ever tags a single message.

mod poly;

pub use poly::Poly1305;
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

/// Keyed one-shot MAC over accumulated input.
///
/// [`Authenticator::clear`] wipes the key and accumulated input; dropping
/// an instance does the same.
pub trait Authenticator: Sized + Send {
    /// Exact key length accepted by [`Authenticator::new`].
    const KEY_SIZE: usize;

    /// Length of the tag returned by [`Authenticator::tag`].
    const TAG_SIZE: usize;

    /// Algorithm name for diagnostics.
    const NAME: &'static str;

    /// Key a fresh instance with an empty accumulator.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` if `key.len() != KEY_SIZE`
    fn new(key: &[u8]) -> Result<Self, CryptoError>;

    /// Append `data` to the authenticated input.
    fn update(&mut self, data: &[u8]);

    /// Tag over everything accumulated so far.
    ///
    /// Does not reset or consume the accumulated input.
    fn tag(&self) -> Vec<u8>;

    /// Wipe the key and accumulated input.
    ///
    /// A cleared instance returns an empty tag, so [`Authenticator::verify`]
    /// rejects every tag.
    fn clear(&mut self);

    /// Compare the current tag against `expected` in constant time.
    fn verify(&self, expected: &[u8]) -> bool {
        tags_equal(&self.tag(), expected)
    }
}

/// Constant-time tag equality. Slices of different length are never equal.
pub fn tags_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_tags_compare_equal() {
        assert!(tags_equal(&[1, 2, 3, 4], &[1, 2, 3, 4]));
    }

    #[test]
    fn single_bit_difference_is_detected() {
        let a = [0u8; 16];
        for byte in 0..16 {
            for bit in 0..8 {
                let mut b = a;
                b[byte] ^= 1 << bit;
                assert!(!tags_equal(&a, &b));
            }
        }
    }

    #[test]
    fn length_mismatch_is_unequal() {
        assert!(!tags_equal(&[0u8; 16], &[0u8; 15]));
        assert!(!tags_equal(&[], &[0u8]));
    }
}
