//! Record parsing and construction errors.

use thiserror::Error;

/// Result alias for record-level operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Structural errors in a record header or record body.
///
/// Every variant is fatal for a connection: once a decrypted header fails to
/// parse, the two ratchets can no longer be assumed to agree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Header buffer has the wrong size
    #[error("invalid header length: expected {expected}, got {actual}")]
    InvalidHeaderLength {
        /// Required header size
        expected: usize,
        /// Size of the buffer provided
        actual: usize,
    },

    /// Payload plus padding is empty where data is required, or too large
    #[error("invalid message length: {length} (max {max})")]
    InvalidMessageLength {
        /// Offending length (payload + padding)
        length: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Padding length does not fit the one-byte header field
    #[error("invalid padding length: {0} (max 255)")]
    InvalidPadding(usize),

    /// Record command byte is not a known command
    #[error("invalid command: {0:#04x}")]
    InvalidCommand(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::InvalidMessageLength { length: 16384, max: 16383 };
        assert_eq!(err.to_string(), "invalid message length: 16384 (max 16383)");

        assert_eq!(ProtocolError::InvalidCommand(0x7F).to_string(), "invalid command: 0x7f");
    }
}
