//! Record header with zero-copy parsing.
//!
//! The `RecordHeader` is a fixed 8-byte structure serialized as raw binary
//! (Big Endian). It is encrypted and authenticated as a unit before any body
//! bytes are read, so the receiver learns the body size only from an
//! authenticated header.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    MAX_PLAINTEXT_RECORD_LEN,
    errors::{ProtocolError, Result},
};

/// Record command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Application payload
    Data = 0,
    /// Graceful shutdown of the sending direction
    Close = 1,
}

impl Command {
    /// Wire value.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Data),
            1 => Some(Self::Close),
            _ => None,
        }
    }
}

/// Fixed 8-byte record header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays so that every 8-byte pattern is a
/// valid in-memory value; semantic checks happen in [`Self::from_bytes`].
///
/// # Invariants
///
/// - `length + padding_length <= MAX_PLAINTEXT_RECORD_LEN` for any header
///   returned by [`Self::from_bytes`].
/// - `reserved` is carried verbatim and never interpreted.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct RecordHeader {
    command: u8,        // Command byte (0 = DATA, 1 = CLOSE)
    length: [u8; 2],    // u16 payload length
    padding_length: u8, // filler bytes after the payload
    reserved: [u8; 4],  // u32, opaque
}

impl RecordHeader {
    /// Size of the serialized header (8 bytes)
    pub const SIZE: usize = 8;

    /// Header with the given command and no body.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self { command: command.to_u8(), length: [0; 2], padding_length: 0, reserved: [0; 4] }
    }

    /// Parse a decrypted header.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidHeaderLength` if `bytes` is not exactly 8 bytes
    /// - `ProtocolError::InvalidMessageLength` if `length + padding_length`
    ///   exceeds [`MAX_PLAINTEXT_RECORD_LEN`]
    ///
    /// The command byte is not validated here; unknown commands are a
    /// connection-level decision (see [`Self::command_enum`]).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::read_from_bytes(bytes).map_err(|_| {
            ProtocolError::InvalidHeaderLength { expected: Self::SIZE, actual: bytes.len() }
        })?;

        let body_len = header.body_len();
        if body_len > MAX_PLAINTEXT_RECORD_LEN {
            return Err(ProtocolError::InvalidMessageLength {
                length: body_len,
                max: MAX_PLAINTEXT_RECORD_LEN,
            });
        }

        Ok(header)
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Command as raw byte.
    #[must_use]
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Command as enum. `None` if unrecognized.
    #[must_use]
    pub fn command_enum(&self) -> Option<Command> {
        Command::from_u8(self.command)
    }

    /// Payload bytes delivered to the application.
    #[must_use]
    pub fn length(&self) -> u16 {
        u16::from_be_bytes(self.length)
    }

    /// Filler bytes following the payload.
    #[must_use]
    pub fn padding_length(&self) -> u8 {
        self.padding_length
    }

    /// Opaque reserved field.
    #[must_use]
    pub fn reserved(&self) -> u32 {
        u32::from_be_bytes(self.reserved)
    }

    /// Body size on the wire: payload plus padding.
    #[must_use]
    pub fn body_len(&self) -> usize {
        usize::from(self.length()) + usize::from(self.padding_length)
    }

    /// Update the command byte.
    pub fn set_command(&mut self, command: Command) {
        self.command = command.to_u8();
    }

    /// Set payload length. Callers keep `length + padding` within bounds.
    pub fn set_length(&mut self, length: u16) {
        self.length = length.to_be_bytes();
    }

    /// Set padding length.
    pub fn set_padding_length(&mut self, padding_length: u8) {
        self.padding_length = padding_length;
    }

    /// Set the reserved field.
    pub fn set_reserved(&mut self, reserved: u32) {
        self.reserved = reserved.to_be_bytes();
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl fmt::Debug for RecordHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHeader")
            .field("command", &format!("{:#04x}", self.command()))
            .field("length", &self.length())
            .field("padding_length", &self.padding_length())
            .field("reserved", &format!("{:#010x}", self.reserved()))
            .finish()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for RecordHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for RecordHeader {}
