//! Per-direction key state and the record key ratchet.
//!
//! # Ratchet
//!
//! Every record re-keys the cipher with the current record key and drains
//! its keystream in a fixed order:
//!
//! ```text
//! key_n ──► Cipher::new
//!              │
//!              ├─► auth_key_1   (Authenticator::KEY_SIZE)  header tag
//!              ├─► auth_key_2   (Authenticator::KEY_SIZE)  body tag
//!              ├─► header XOR   (8)
//!              ├─► body XOR     (length + padding, only if non-empty)
//!              └─► key_{n+1}    (Cipher::KEY_SIZE)
//! ```
//!
//! Sender and receiver must draw in exactly this order. No nonce travels on
//! the wire; both ends stay in step only because their `key` and `counter`
//! evolve identically. A single failed record therefore leaves the two
//! ratchets with no way to resynchronize.
//!
//! # Security Properties
//!
//! - Key Uniqueness: a record key is consumed by exactly one record
//! - Forward Secrecy: the previous key is wiped when the next one is installed
//! - Replay Binding: the record counter is authenticated into both tags

use std::marker::PhantomData;

use tentp_crypto::{Authenticator, Cipher, KeyMaterial};
use tentp_proto::COUNTER_LEN;

use crate::error::TransportError;

/// Mutable ratchet state for one direction of a connection.
///
/// # Invariants
///
/// - `key.len() == C::KEY_SIZE`
/// - `counter` counts records processed in this direction, modulo 2^64
/// - once `exhausted` is set it is never cleared
pub struct KeyState<C, A> {
    /// Current record key
    key: KeyMaterial,
    /// Records processed so far
    counter: u64,
    /// Set when `counter` wrapped back to zero
    exhausted: bool,
    _suite: PhantomData<fn() -> (C, A)>,
}

impl<C: Cipher, A: Authenticator> KeyState<C, A> {
    /// Create a key state from the initial shared secret for this direction.
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidKeyLength` if `key.len() != C::KEY_SIZE`
    pub fn new(key: &[u8]) -> Result<Self, TransportError> {
        if key.len() != C::KEY_SIZE {
            return Err(TransportError::InvalidKeyLength {
                expected: C::KEY_SIZE,
                actual: key.len(),
            });
        }

        Ok(Self {
            key: KeyMaterial::new(key),
            counter: 0,
            exhausted: false,
            _suite: PhantomData,
        })
    }

    /// Number of records processed in this direction.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Sticky terminal error for this direction, if any.
    pub fn sticky_error(&self) -> Option<TransportError> {
        self.exhausted.then_some(TransportError::CounterWrapped)
    }

    /// Start processing one record.
    ///
    /// Keys a fresh cipher with the current record key and draws both
    /// authenticator keys. The state itself only changes when the returned
    /// [`RecordKeys`] is [finished](RecordKeys::finish).
    ///
    /// # Errors
    ///
    /// - `TransportError::CounterWrapped` if this direction is exhausted
    /// - `TransportError::Closed` if the key was wiped
    pub fn begin_record(&mut self) -> Result<RecordKeys<'_, C, A>, TransportError> {
        if let Some(err) = self.sticky_error() {
            return Err(err);
        }
        if self.key.is_empty() {
            return Err(TransportError::Closed);
        }

        let Ok(mut cipher) = C::new(self.key.as_bytes()) else {
            unreachable!("record key length is fixed to the cipher key size");
        };

        let header_auth_key = cipher.keystream(A::KEY_SIZE);
        let body_auth_key = cipher.keystream(A::KEY_SIZE);
        let counter = self.counter.to_be_bytes();

        Ok(RecordKeys { state: self, cipher, header_auth_key, body_auth_key, counter })
    }

    /// Wipe the record key. No further records can be processed.
    pub fn clear(&mut self) {
        self.key.clear();
    }

    /// True once [`clear()`](Self::clear) has wiped the key.
    pub fn is_cleared(&self) -> bool {
        self.key.is_empty()
    }

    /// Install the next record key and advance the counter.
    fn advance(&mut self, next_key: KeyMaterial) {
        debug_assert_eq!(next_key.len(), C::KEY_SIZE);
        self.key.replace(next_key);

        self.counter = self.counter.wrapping_add(1);
        if self.counter == 0 {
            // Only the record just processed was valid; hope it was a CLOSE
            self.exhausted = true;
            tracing::warn!(cipher = C::NAME, "record counter wrapped, direction exhausted");
        }
    }

    #[cfg(test)]
    pub(crate) fn force_counter(&mut self, counter: u64) {
        self.counter = counter;
    }

    #[cfg(test)]
    pub(crate) fn key_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }
}

/// Key material for a single record, drawn from one [`KeyState`].
///
/// Holds the keyed cipher positioned just after the two authenticator keys.
/// Callers XOR the header, then the body (if any), then call
/// [`finish()`](Self::finish). Dropping it without finishing leaves the
/// state untouched, which only happens on paths that close the connection.
pub struct RecordKeys<'s, C, A> {
    state: &'s mut KeyState<C, A>,
    cipher: C,
    header_auth_key: KeyMaterial,
    body_auth_key: KeyMaterial,
    counter: [u8; COUNTER_LEN],
}

impl<C: Cipher, A: Authenticator> RecordKeys<'_, C, A> {
    /// Counter value identifying this record (before the post-record
    /// increment), big-endian.
    pub fn counter(&self) -> [u8; COUNTER_LEN] {
        self.counter
    }

    /// XOR the next keystream bytes into `buf`.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        self.cipher.apply_keystream(buf);
    }

    /// Tag over `counter ‖ encrypted_header`.
    pub fn header_tag(&self, encrypted_header: &[u8]) -> Vec<u8> {
        self.authenticator(&self.header_auth_key, encrypted_header).tag()
    }

    /// Tag over `counter ‖ encrypted_body`.
    pub fn body_tag(&self, encrypted_body: &[u8]) -> Vec<u8> {
        self.authenticator(&self.body_auth_key, encrypted_body).tag()
    }

    /// Constant-time check of a received header tag.
    pub fn verify_header(&self, encrypted_header: &[u8], tag: &[u8]) -> bool {
        self.authenticator(&self.header_auth_key, encrypted_header).verify(tag)
    }

    /// Constant-time check of a received body tag.
    pub fn verify_body(&self, encrypted_body: &[u8], tag: &[u8]) -> bool {
        self.authenticator(&self.body_auth_key, encrypted_body).verify(tag)
    }

    /// Draw the next record key and advance the owning state.
    ///
    /// Returns the counter of the record just processed.
    pub fn finish(mut self) -> u64 {
        let next_key = self.cipher.keystream(C::KEY_SIZE);
        let processed = u64::from_be_bytes(self.counter);
        self.state.advance(next_key);
        processed
    }

    fn authenticator(&self, key: &KeyMaterial, data: &[u8]) -> A {
        let Ok(mut mac) = A::new(key.as_bytes()) else {
            unreachable!("authenticator keys are drawn at the authenticator key size");
        };
        mac.update(&self.counter);
        mac.update(data);
        mac
    }
}
