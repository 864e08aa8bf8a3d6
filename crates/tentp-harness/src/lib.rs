//! Test harness for the TENTP record layer.
//!
//! Provides an in-memory duplex [`Transport`](tentp_core::Transport) with
//! I/O counters and on-the-wire tampering, plus seeded key generation, so
//! connection behaviour can be tested deterministically without sockets.
//!
//! ```text
//!  client Connection                       server Connection
//!         │                                        │
//!   MemoryTransport ──── a_to_b pipe ────► MemoryTransport
//!         ◄────────────── b_to_a pipe ────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod keys;
pub mod pipe;

pub use keys::{SeededKeys, SessionSecrets};
pub use pipe::{IoStats, MemoryTransport, memory_pair};
use tentp_core::{Connection, TransportError};
use tentp_crypto::{Authenticator, Cipher};

/// Client and server connections over one in-memory stream.
pub type ConnectedPair<C, A> =
    (Connection<MemoryTransport, C, A>, Connection<MemoryTransport, C, A>);

/// Build a client/server pair with secrets derived from `seed`.
///
/// # Errors
///
/// Only if the cipher's key size disagrees with the generated secrets,
/// which cannot happen for well-formed cipher impls.
pub fn connected_pair<C: Cipher, A: Authenticator>(
    seed: u64,
) -> Result<ConnectedPair<C, A>, TransportError> {
    let secrets = SeededKeys::new(seed).session::<C>();
    let (client_end, server_end) = memory_pair();

    let client = Connection::new(client_end, secrets.client())?;
    let server = Connection::new(server_end, secrets.server())?;
    Ok((client, server))
}
