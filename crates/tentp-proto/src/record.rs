//! Plaintext record: header plus body.
//!
//! The body holds `length` payload bytes followed by `padding_length` filler
//! bytes. Padding is authenticated and encrypted like the payload but is
//! dropped before delivery.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    Command, MAX_PLAINTEXT_RECORD_LEN, RecordHeader,
    errors::{ProtocolError, Result},
};

/// Plaintext record (before sealing / after opening)
///
/// # Invariants
///
/// - `body.len() == header.body_len()`. Enforced by [`Record::new`] and
///   checked in debug builds by [`Record::from_parts`].
/// - `body.len() <= MAX_PLAINTEXT_RECORD_LEN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record header
    pub header: RecordHeader,

    /// Payload followed by padding; empty for bodiless records
    pub body: Bytes,
}

impl Record {
    /// Build a record carrying `payload` followed by `padding` zero bytes.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidPadding` if `padding > 255`
    /// - `ProtocolError::InvalidMessageLength` if `payload.len() + padding`
    ///   exceeds [`MAX_PLAINTEXT_RECORD_LEN`]
    pub fn new(command: Command, payload: &[u8], padding: usize) -> Result<Self> {
        let mut header = RecordHeader::new(command);
        if payload.is_empty() && padding == 0 {
            return Ok(Self { header, body: Bytes::new() });
        }

        let Ok(padding_length) = u8::try_from(padding) else {
            return Err(ProtocolError::InvalidPadding(padding));
        };

        let body_len = payload.len() + padding;
        if body_len > MAX_PLAINTEXT_RECORD_LEN {
            return Err(ProtocolError::InvalidMessageLength {
                length: body_len,
                max: MAX_PLAINTEXT_RECORD_LEN,
            });
        }

        // body_len <= MAX_PLAINTEXT_RECORD_LEN < u16::MAX
        header.set_length(payload.len() as u16);
        header.set_padding_length(padding_length);

        let mut body = BytesMut::with_capacity(body_len);
        body.put_slice(payload);
        body.put_bytes(0, padding);

        Ok(Self { header, body: body.freeze() })
    }

    /// Record with no payload and no padding.
    #[must_use]
    pub fn empty(command: Command) -> Self {
        Self { header: RecordHeader::new(command), body: Bytes::new() }
    }

    /// Reassemble a record from an opened header and decrypted body.
    #[must_use]
    pub fn from_parts(header: RecordHeader, body: Bytes) -> Self {
        debug_assert_eq!(body.len(), header.body_len());
        Self { header, body }
    }

    /// Payload bytes (body without padding).
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.body[..usize::from(self.header.length())]
    }

    /// Consume the record, keeping only the payload.
    #[must_use]
    pub fn into_payload(mut self) -> Bytes {
        self.body.truncate(usize::from(self.header.length()));
        self.body
    }

    /// True if nothing follows the header on the wire.
    #[must_use]
    pub fn is_bodiless(&self) -> bool {
        self.body.is_empty()
    }
}
