//! Deterministic key generation for tests.
//!
//! Secrets come from a seeded `ChaCha20Rng`, so a failing test reproduces
//! from its seed alone.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tentp_core::SessionKeys;
use tentp_crypto::Cipher;

/// Seeded source of session secrets.
pub struct SeededKeys {
    rng: ChaCha20Rng,
}

impl SeededKeys {
    /// Create a generator from `seed`.
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha20Rng::seed_from_u64(seed) }
    }

    /// Next `len` random bytes.
    pub fn secret(&mut self, len: usize) -> Vec<u8> {
        let mut secret = vec![0u8; len];
        self.rng.fill_bytes(&mut secret);
        secret
    }

    /// Fresh per-direction secrets sized for cipher `C`.
    pub fn session<C: Cipher>(&mut self) -> SessionSecrets {
        SessionSecrets {
            client_to_server: self.secret(C::KEY_SIZE),
            server_to_client: self.secret(C::KEY_SIZE),
        }
    }
}

/// The two directional secrets of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSecrets {
    /// Secret for records sent by the client
    pub client_to_server: Vec<u8>,
    /// Secret for records sent by the server
    pub server_to_client: Vec<u8>,
}

impl SessionSecrets {
    /// Keys as seen from the client end.
    pub fn client(&self) -> SessionKeys<'_> {
        SessionKeys { send: &self.client_to_server, recv: &self.server_to_client }
    }

    /// Keys as seen from the server end.
    pub fn server(&self) -> SessionKeys<'_> {
        SessionKeys { send: &self.server_to_client, recv: &self.client_to_server }
    }
}

#[cfg(test)]
mod tests {
    use tentp_crypto::{Aes256Ctr, ChaCha20};

    use super::*;

    #[test]
    fn same_seed_same_secrets() {
        let a = SeededKeys::new(7).session::<ChaCha20>();
        let b = SeededKeys::new(7).session::<ChaCha20>();
        assert_eq!(a, b);
    }

    #[test]
    fn secrets_sized_for_cipher() {
        let mut keys = SeededKeys::new(1);
        let chacha = keys.session::<ChaCha20>();
        let aes = keys.session::<Aes256Ctr>();

        assert_eq!(chacha.client_to_server.len(), 40);
        assert_eq!(aes.server_to_client.len(), 48);
        assert_ne!(chacha.client_to_server, chacha.server_to_client);
    }

    #[test]
    fn ends_are_mirrored() {
        let secrets = SeededKeys::new(3).session::<ChaCha20>();
        assert_eq!(secrets.client().send, secrets.server().recv);
        assert_eq!(secrets.client().recv, secrets.server().send);
    }
}
