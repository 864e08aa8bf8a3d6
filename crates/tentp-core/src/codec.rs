//! Sans-IO record codec.
//!
//! Turns plaintext [`Record`]s into wire bytes and back, driving one
//! [`KeyState`] per call. Nothing here touches a socket; the connection layer
//! decides how many bytes to read and when.
//!
//! Opening is split in two so the header can be checked before any body
//! bytes are read:
//!
//! ```text
//! read T + 8 ──► open_header ──► HeaderOpened ──► read T + L + P ──► open_body
//!                 │ verify tag                       (skipped if L + P == 0)
//!                 │ decrypt
//!                 └ parse, bound L + P
//! ```
//!
//! The ratchet only advances once a record has been fully verified. On any
//! error the state is left where it was, but the caller must still treat the
//! connection as dead: the peer's ratchet has moved on regardless.

use bytes::{Buf, Bytes, BytesMut};
use tentp_crypto::{Authenticator, Cipher};
use tentp_proto::{ProtocolError, RECORD_HEADER_LEN, Record, RecordHeader};

use crate::{
    error::TransportError,
    key_state::{KeyState, RecordKeys},
};

/// Wire size of the header section: `header_tag ‖ encrypted_header`.
pub fn header_wire_len<A: Authenticator>() -> usize {
    A::TAG_SIZE + RECORD_HEADER_LEN
}

/// Wire size of the body section for `header`, zero if the record is bodiless.
pub fn body_wire_len<A: Authenticator>(header: &RecordHeader) -> usize {
    match header.body_len() {
        0 => 0,
        len => A::TAG_SIZE + len,
    }
}

/// Seal `record` with the next record key and append it to `dst`.
///
/// Returns the counter the record was sealed under.
///
/// # Errors
///
/// - `TransportError::CounterWrapped` if the state is exhausted; nothing is
///   appended in that case
pub fn seal_record<C: Cipher, A: Authenticator>(
    state: &mut KeyState<C, A>,
    record: &Record,
    dst: &mut BytesMut,
) -> Result<u64, TransportError> {
    let mut keys = state.begin_record()?;
    dst.reserve(header_wire_len::<A>() + body_wire_len::<A>(&record.header));

    let mut header = record.header.to_bytes();
    keys.apply_keystream(&mut header);
    dst.extend_from_slice(&keys.header_tag(&header));
    dst.extend_from_slice(&header);

    if !record.is_bodiless() {
        let mut body = BytesMut::from(&record.body[..]);
        keys.apply_keystream(&mut body);
        dst.extend_from_slice(&keys.body_tag(&body));
        dst.extend_from_slice(&body);
    }

    Ok(keys.finish())
}

/// Verify, decrypt and parse the header section of the next record.
///
/// `wire` must hold exactly [`header_wire_len`] bytes and is decrypted in
/// place.
///
/// # Errors
///
/// - `TransportError::CounterWrapped` if the state is exhausted
/// - `TransportError::Protocol` if `wire` has the wrong size or the header
///   announces more than the maximum record length
/// - `TransportError::InvalidTag` if the header tag does not verify
pub fn open_header<'s, C: Cipher, A: Authenticator>(
    state: &'s mut KeyState<C, A>,
    wire: &mut [u8],
) -> Result<HeaderOpened<'s, C, A>, TransportError> {
    if wire.len() != header_wire_len::<A>() {
        return Err(ProtocolError::InvalidHeaderLength {
            expected: header_wire_len::<A>(),
            actual: wire.len(),
        }
        .into());
    }

    let mut keys = state.begin_record()?;
    let (tag, encrypted) = wire.split_at_mut(A::TAG_SIZE);
    if !keys.verify_header(encrypted, tag) {
        return Err(TransportError::InvalidTag);
    }

    keys.apply_keystream(encrypted);
    let header = RecordHeader::from_bytes(encrypted)?;

    Ok(HeaderOpened { keys, header })
}

/// A record whose header has been authenticated but whose body has not yet
/// been read.
pub struct HeaderOpened<'s, C, A> {
    keys: RecordKeys<'s, C, A>,
    header: RecordHeader,
}

impl<C: Cipher, A: Authenticator> HeaderOpened<'_, C, A> {
    /// The authenticated, decrypted header.
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    /// Bytes to read from the wire before calling [`Self::open_body`].
    pub fn body_wire_len(&self) -> usize {
        body_wire_len::<A>(&self.header)
    }

    /// Verify and decrypt the body section, then advance the ratchet.
    ///
    /// `wire` must hold exactly [`Self::body_wire_len`] bytes (empty for
    /// bodiless records).
    ///
    /// # Errors
    ///
    /// - `TransportError::Protocol` if `wire` has the wrong size
    /// - `TransportError::InvalidTag` if the body tag does not verify
    pub fn open_body(mut self, mut wire: BytesMut) -> Result<Record, TransportError> {
        let expected = self.body_wire_len();
        if wire.len() != expected {
            return Err(ProtocolError::InvalidMessageLength { length: wire.len(), max: expected }.into());
        }

        if expected == 0 {
            self.keys.finish();
            return Ok(Record::from_parts(self.header, Bytes::new()));
        }

        let mut body = wire.split_off(A::TAG_SIZE);
        if !self.keys.verify_body(&body, &wire) {
            return Err(TransportError::InvalidTag);
        }

        self.keys.apply_keystream(&mut body);
        self.keys.finish();

        Ok(Record::from_parts(self.header, body.freeze()))
    }
}

/// Open one complete record from the front of `src`.
///
/// Returns `Ok(None)` without consuming anything if `src` does not yet hold
/// the whole record. Each call re-derives the record keys from the unchanged
/// state, so a partial record can simply be retried once more bytes arrive.
///
/// # Errors
///
/// Same as [`open_header`] and [`HeaderOpened::open_body`].
pub fn open_record<C: Cipher, A: Authenticator>(
    state: &mut KeyState<C, A>,
    src: &mut BytesMut,
) -> Result<Option<Record>, TransportError> {
    let header_len = header_wire_len::<A>();
    if src.len() < header_len {
        return Ok(None);
    }

    // Decrypt a copy; `src` stays untouched until the whole record is present
    let mut header_wire = src[..header_len].to_vec();
    let opened = open_header(state, &mut header_wire)?;
    let body_len = opened.body_wire_len();
    if src.len() < header_len + body_len {
        return Ok(None);
    }

    src.advance(header_len);
    let body_wire = src.split_to(body_len);
    opened.open_body(body_wire).map(Some)
}
