//! TENTP command-line tool.
//!
//! Pipes stdin and stdout over one encrypted TCP connection, netcat style.
//!
//! # Usage
//!
//! ```bash
//! # Fresh secrets for both ends
//! tentp keygen --cipher chacha20
//!
//! # Listener
//! TENTP_SEND_KEY=<hex> TENTP_RECV_KEY=<hex> tentp listen --bind 127.0.0.1:7000
//!
//! # Connector (keys mirrored)
//! TENTP_SEND_KEY=<hex> TENTP_RECV_KEY=<hex> tentp connect --addr 127.0.0.1:7000
//! ```

use std::{
    error::Error,
    io::{self, Write},
    net::{TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use clap::{Parser, Subcommand, ValueEnum};
use rand::{RngCore, rngs::OsRng};
use tentp_core::{AesPolyConnection, ChaChaPolyConnection, Connection, SessionKeys, Transport};
use tentp_crypto::{Aes256Ctr, Authenticator, ChaCha20, Cipher};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// TENTP encrypted pipe
#[derive(Parser, Debug)]
#[command(name = "tentp")]
#[command(about = "Encrypted, authenticated stdin/stdout pipe over TCP")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accept one connection and pipe it to stdin/stdout
    Listen {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:7000")]
        bind: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Connect to a listener and pipe it to stdin/stdout
    Connect {
        /// Address of the listener
        #[arg(short, long)]
        addr: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Print fresh secrets for both ends of a session
    Keygen {
        /// Cipher the secrets are sized for
        #[arg(long, value_enum, default_value_t = Suite::Chacha20)]
        cipher: Suite,
    },
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    /// Cipher paired with Poly1305
    #[arg(long, value_enum, default_value_t = Suite::Chacha20)]
    cipher: Suite,

    /// Hex secret for records this end sends
    #[arg(long, env = "TENTP_SEND_KEY", hide_env_values = true)]
    send_key: String,

    /// Hex secret for records this end receives
    #[arg(long, env = "TENTP_RECV_KEY", hide_env_values = true)]
    recv_key: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Suite {
    /// ChaCha20 (64-bit nonce) + Poly1305
    Chacha20,
    /// AES-256-CTR + Poly1305
    Aes256,
}

impl Suite {
    fn key_size(self) -> usize {
        match self {
            Self::Chacha20 => ChaCha20::KEY_SIZE,
            Self::Aes256 => Aes256Ctr::KEY_SIZE,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries payload
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match args.command {
        Command::Listen { bind, session } => {
            let listener = TcpListener::bind(&bind)?;
            tracing::info!("Listening on {}", listener.local_addr()?);

            let (stream, peer) = listener.accept()?;
            tracing::info!("Accepted connection from {peer}");
            run(stream, &session)
        },
        Command::Connect { addr, session } => {
            let stream = TcpStream::connect(&addr)?;
            tracing::info!("Connected to {addr}");
            run(stream, &session)
        },
        Command::Keygen { cipher } => keygen(cipher),
    }
}

fn run<T: Transport + 'static>(transport: T, session: &SessionArgs) -> Result<(), Box<dyn Error>> {
    let send = hex::decode(session.send_key.trim())?;
    let recv = hex::decode(session.recv_key.trim())?;
    let keys = SessionKeys { send: &send, recv: &recv };

    match session.cipher {
        Suite::Chacha20 => pipe(ChaChaPolyConnection::new(transport, keys)?),
        Suite::Aes256 => pipe(AesPolyConnection::new(transport, keys)?),
    }
}

/// Copy stdin to the connection and the connection to stdout until the peer
/// closes or stdin ends.
fn pipe<T, C, A>(conn: Connection<T, C, A>) -> Result<(), Box<dyn Error>>
where
    T: Transport + 'static,
    C: Cipher + 'static,
    A: Authenticator + 'static,
{
    let conn = Arc::new(conn);
    let stdin_done = Arc::new(AtomicBool::new(false));

    // Detached: a blocked stdin read cannot be interrupted, the process
    // exit reaps it once the peer closes
    {
        let conn = Arc::clone(&conn);
        let stdin_done = Arc::clone(&stdin_done);
        thread::spawn(move || {
            match io::copy(&mut io::stdin().lock(), &mut &*conn) {
                Ok(bytes) => tracing::debug!(bytes, "stdin finished"),
                Err(err) => tracing::warn!(error = %err, "sending failed"),
            }
            stdin_done.store(true, Ordering::SeqCst);
            if let Err(err) = conn.close() {
                tracing::warn!(error = %err, "close failed");
            }
        });
    }

    let mut stdout = io::stdout().lock();
    let received = io::copy(&mut &*conn, &mut stdout);
    stdout.flush()?;

    match received {
        Ok(bytes) => {
            tracing::info!(bytes, "peer closed connection");
            Ok(())
        },
        // Our own close tore down the reader
        Err(_) if stdin_done.load(Ordering::SeqCst) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn keygen(cipher: Suite) -> Result<(), Box<dyn Error>> {
    let mut listener_to_connector = vec![0u8; cipher.key_size()];
    let mut connector_to_listener = vec![0u8; cipher.key_size()];
    OsRng.fill_bytes(&mut listener_to_connector);
    OsRng.fill_bytes(&mut connector_to_listener);

    let a = hex::encode(&listener_to_connector);
    let b = hex::encode(&connector_to_listener);

    let mut out = io::stdout().lock();
    writeln!(out, "# listener")?;
    writeln!(out, "TENTP_SEND_KEY={a}")?;
    writeln!(out, "TENTP_RECV_KEY={b}")?;
    writeln!(out, "# connector")?;
    writeln!(out, "TENTP_SEND_KEY={b}")?;
    writeln!(out, "TENTP_RECV_KEY={a}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn suite_key_sizes() {
        assert_eq!(Suite::Chacha20.key_size(), 40);
        assert_eq!(Suite::Aes256.key_size(), 48);
    }

    #[test]
    fn parses_connect_with_flags() {
        let args = Args::try_parse_from([
            "tentp",
            "connect",
            "--addr",
            "127.0.0.1:9000",
            "--cipher",
            "aes256",
            "--send-key",
            "00",
            "--recv-key",
            "11",
        ])
        .unwrap();

        let Command::Connect { addr, session } = args.command else {
            panic!("expected connect");
        };
        assert_eq!(addr, "127.0.0.1:9000");
        assert!(matches!(session.cipher, Suite::Aes256));
        assert_eq!(session.send_key, "00");
    }
}
