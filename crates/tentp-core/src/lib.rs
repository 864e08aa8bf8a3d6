//! TENTP record layer: key ratchet, record codec and blocking connection.
//!
//! Turns any reliable byte stream into an encrypted, authenticated message
//! channel, given one pre-shared secret per direction. There is no
//! handshake; key agreement happens elsewhere.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Connection       write / read / close        │
//! ├──────────────────────────────────────────────┤
//! │ codec            seal_record / open_header   │  sans-IO
//! ├──────────────────────────────────────────────┤
//! │ KeyState         per-record key ratchet      │
//! ├──────────────────────────────────────────────┤
//! │ Transport        read_exact / write_all      │  TcpStream, UnixStream, ...
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Each direction has its own [`KeyState`]. Every record is sealed under a
//! fresh key drawn from the previous record's keystream, so compromise of
//! the current key reveals nothing about earlier records.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod connection;
pub mod error;
pub mod key_state;
pub mod transport;

pub use codec::{HeaderOpened, open_header, open_record, seal_record};
pub use connection::{
    AesPolyConnection, ChaChaPolyConnection, Connection, ConnectionState, SessionKeys,
};
pub use error::TransportError;
pub use key_state::{KeyState, RecordKeys};
pub use transport::Transport;
