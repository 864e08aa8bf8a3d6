//! TENTP wire types.
//!
//! A record is the unit of framing, encryption and authentication:
//!
//! ```text
//! ┌────────────┬──────────────────┬──────────┬────────────────────────┐
//! │ header_tag │ encrypted_header │ body_tag │ encrypted_body (L + P) │
//! │    (T)     │       (8)        │   (T)    │                        │
//! └────────────┴──────────────────┴──────────┴────────────────────────┘
//!                                  └──── present only if L + P > 0 ────┘
//! ```
//!
//! This crate only knows the plaintext layout ([`RecordHeader`], [`Record`]).
//! Tags and encryption are applied by the record codec in `tentp-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod header;
pub mod record;

pub use errors::{ProtocolError, Result};
pub use header::{Command, RecordHeader};
pub use record::Record;

/// Maximum plaintext carried by one record (payload plus padding).
pub const MAX_PLAINTEXT_RECORD_LEN: usize = 16383;

/// Size of the serialized record header.
pub const RECORD_HEADER_LEN: usize = RecordHeader::SIZE;

/// Size of the big-endian record counter bound into every tag.
pub const COUNTER_LEN: usize = 8;
