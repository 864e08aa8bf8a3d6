//! Owned key buffers that are wiped when replaced or dropped.

use std::fmt;

use zeroize::Zeroize;

/// Secret bytes: record keys, authenticator sub-keys, drawn keystream.
///
/// The buffer is zeroized on [`clear()`](Self::clear), on
/// [`replace()`](Self::replace) and on drop, so stale key material does not
/// outlive the record it belonged to.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    bytes: Vec<u8>,
}

impl KeyMaterial {
    /// Copy `bytes` into a new owned buffer.
    pub fn new(bytes: &[u8]) -> Self {
        Self { bytes: bytes.to_vec() }
    }

    /// All-zero buffer of `len` bytes, to be filled by a keystream.
    pub fn zeroed(len: usize) -> Self {
        Self { bytes: vec![0u8; len] }
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable key bytes.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the buffer holds no bytes (only after [`clear()`](Self::clear)).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Wipe the key and release it.
    pub fn clear(&mut self) {
        self.bytes.zeroize();
    }

    /// Wipe the current key and take ownership of `next`.
    pub fn replace(&mut self, next: Self) {
        self.clear();
        *self = next;
    }
}

impl AsRef<[u8]> for KeyMaterial {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

// Never print key bytes
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {}])", self.bytes.len())
    }
}
