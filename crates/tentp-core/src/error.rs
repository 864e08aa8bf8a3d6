//! Error types for the TENTP transport.
//!
//! One enum covers the whole connection surface, grouped by how the
//! connection reacts:
//!
//! - configuration (`InvalidKeyLength`): the connection never opens
//! - decode / authentication (`Protocol`, `InvalidTag`): the ratchets may be
//!   desynchronized, so the connection is force-closed
//! - counter exhaustion (`CounterWrapped`): sticky for one direction, no I/O
//! - transport (`Io`): propagated and the connection is force-closed
//!
//! A graceful peer close is not an error; reads report it as end-of-stream.

use std::io;

use tentp_crypto::CryptoError;
use tentp_proto::ProtocolError;
use thiserror::Error;

/// Errors from connection construction, record processing and I/O.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Initial secret does not match the cipher's key size
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required key size
        expected: usize,
        /// Size of the provided secret
        actual: usize,
    },

    /// Malformed header, length, padding or command
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Header or body tag did not verify
    #[error("invalid auth tag")]
    InvalidTag,

    /// The record counter for this direction wrapped
    #[error("record counter wrapped")]
    CounterWrapped,

    /// Operation not supported by this protocol version
    #[error("operation not supported")]
    NotSupported,

    /// Connection was already closed
    #[error("connection closed")]
    Closed,

    /// Underlying transport error
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Returns true if this error tears down the whole connection.
    ///
    /// Counter exhaustion is deliberately not fatal: it poisons only the
    /// direction it occurred in.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Protocol(_) | Self::InvalidTag | Self::Io(_) | Self::Closed => true,
            Self::InvalidKeyLength { .. } | Self::CounterWrapped | Self::NotSupported => false,
        }
    }
}

impl From<CryptoError> for TransportError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyLength { expected, actual, .. } => {
                Self::InvalidKeyLength { expected, actual }
            },
        }
    }
}

/// Convert `TransportError` to `io::Error` for the `std::io` trait impls.
///
/// This is only for boundary conversion - internally we use `TransportError`.
impl From<TransportError> for io::Error {
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            TransportError::Io(inner) => inner.kind(),
            TransportError::InvalidKeyLength { .. } => io::ErrorKind::InvalidInput,
            TransportError::Protocol(ProtocolError::InvalidMessageLength { length: 0, .. }) => {
                io::ErrorKind::InvalidInput
            },
            TransportError::Protocol(_) | TransportError::InvalidTag => io::ErrorKind::InvalidData,
            TransportError::CounterWrapped => io::ErrorKind::Other,
            TransportError::NotSupported => io::ErrorKind::Unsupported,
            TransportError::Closed => io::ErrorKind::NotConnected,
        };
        match err {
            TransportError::Io(inner) => inner,
            other => Self::new(kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_and_decode_errors_are_fatal() {
        assert!(TransportError::InvalidTag.is_fatal());
        assert!(TransportError::Protocol(ProtocolError::InvalidCommand(9)).is_fatal());
        assert!(TransportError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).is_fatal());
    }

    #[test]
    fn counter_wrap_is_direction_sticky_not_fatal() {
        assert!(!TransportError::CounterWrapped.is_fatal());
        assert!(!TransportError::NotSupported.is_fatal());
    }

    #[test]
    fn crypto_key_length_maps_to_transport_key_length() {
        let err = TransportError::from(CryptoError::InvalidKeyLength {
            algorithm: "chacha20",
            expected: 40,
            actual: 32,
        });
        assert!(matches!(err, TransportError::InvalidKeyLength { expected: 40, actual: 32 }));
    }

    #[test]
    fn io_conversion_preserves_kind() {
        let err = io::Error::from(TransportError::InvalidTag);
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = io::Error::from(TransportError::NotSupported);
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let inner = io::Error::from(io::ErrorKind::BrokenPipe);
        let err = io::Error::from(TransportError::Io(inner));
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn empty_write_maps_to_invalid_input() {
        let err = io::Error::from(TransportError::Protocol(ProtocolError::InvalidMessageLength {
            length: 0,
            max: 16383,
        }));
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
