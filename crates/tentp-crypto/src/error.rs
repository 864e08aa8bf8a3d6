//! Error types for cipher and authenticator setup

use thiserror::Error;

/// Errors from keying a cryptographic capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Invalid key material length
    #[error("{algorithm}: invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Algorithm that rejected the key
        algorithm: &'static str,
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },
}

impl CryptoError {
    /// Check `key` against the exact length `expected`.
    pub(crate) fn check_key_len(
        algorithm: &'static str,
        expected: usize,
        key: &[u8],
    ) -> Result<(), Self> {
        if key.len() == expected {
            Ok(())
        } else {
            Err(Self::InvalidKeyLength { algorithm, expected, actual: key.len() })
        }
    }
}
