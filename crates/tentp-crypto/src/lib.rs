//! TENTP Cryptographic Capabilities
//!
//! The record layer only needs two primitives, described here as traits:
//!
//! - [`Cipher`]: a keystream generator. Keyed once per record, then drained
//!   sequentially for sub-keys, header/body encryption and the next record
//!   key.
//! - [`Authenticator`]: a one-time MAC producing a fixed-size tag over
//!   accumulated input, compared in constant time.
//!
//! # Key Lifecycle
//!
//! ```text
//! Record Key (KeyMaterial)
//!        │
//!        ▼ Cipher::new
//! Keystream ──► auth key 1 ──► Authenticator (header tag)
//!        │  ──► auth key 2 ──► Authenticator (body tag)
//!        │  ──► header / body XOR
//!        ▼
//! Next Record Key (old key wiped)
//! ```
//!
//! Instances are keyed at construction, so an un-keyed cipher or
//! authenticator cannot be observed. All key buffers are wiped on drop.
//!
//! # Provided Algorithms
//!
//! | Type | Role | Key size | Output |
//! |------|------|----------|--------|
//! | [`ChaCha20`] | cipher | 40 (key ‖ 64-bit nonce) | keystream |
//! | [`Aes256Ctr`] | cipher | 48 (key ‖ 128-bit IV) | keystream |
//! | [`Poly1305`] | authenticator | 32 | 16-byte tag |

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod cipher;
pub mod error;
pub mod key;

pub use auth::{Authenticator, Poly1305, tags_equal};
pub use cipher::{Aes256Ctr, ChaCha20, Cipher};
pub use error::CryptoError;
pub use key::KeyMaterial;
