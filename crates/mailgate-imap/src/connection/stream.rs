//! Stream types for IMAP connections.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};
use tracing::debug;

use super::config::{Config, Security};
use crate::{Error, Result};

/// A blocking stream that can be either plaintext or TLS.
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl ImapStream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            Self::Plain(tcp) => tcp,
            Self::Tls(tls) => tls.get_ref(),
        }
    }

    /// Shuts down both halves of the TCP connection.
    ///
    /// # Errors
    ///
    /// Returns the socket error, if any.
    pub fn shutdown(&self) -> io::Result<()> {
        self.tcp().shutdown(std::net::Shutdown::Both)
    }
}

impl std::fmt::Debug for ImapStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_tls() { "Tls" } else { "Plain" };
        f.debug_tuple(kind).field(&self.tcp().peer_addr().ok()).finish()
    }
}

impl Read for ImapStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ImapStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Creates a TLS client configuration with the webpki root certificates.
#[must_use]
pub fn tls_config() -> Arc<ClientConfig> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Opens a connection according to the configured security mode.
///
/// # Errors
///
/// Returns `Error::Unsupported` for STARTTLS, an I/O error if no resolved
/// address accepts the connection, or a TLS error for an invalid host name.
pub fn connect(config: &Config) -> Result<ImapStream> {
    match config.security {
        Security::StartTls => Err(Error::Unsupported("STARTTLS")),
        Security::None => Ok(ImapStream::Plain(connect_tcp(config)?)),
        Security::Implicit => {
            let tcp = connect_tcp(config)?;
            let server_name = ServerName::try_from(config.host.clone())?;
            let conn = ClientConnection::new(tls_config(), server_name)?;
            Ok(ImapStream::Tls(Box::new(StreamOwned::new(conn, tcp))))
        }
    }
}

fn connect_tcp(config: &Config) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in (config.host.as_str(), config.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, config.connect_timeout) {
            Ok(tcp) => {
                debug!(%addr, "tcp connected");
                tcp.set_read_timeout(Some(config.io_timeout))?;
                tcp.set_write_timeout(Some(config.io_timeout))?;
                tcp.set_nodelay(true)?;
                return Ok(tcp);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(Error::Io(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {}", config.host),
        )
    })))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_config_builds() {
        assert!(!webpki_roots::TLS_SERVER_ROOTS.is_empty());
        let config = tls_config();
        assert!(config.alpn_protocols.is_empty());
    }

    #[test]
    fn test_starttls_is_declined() {
        let config = Config::builder("imap.example.com")
            .security(Security::StartTls)
            .build();
        assert!(matches!(
            connect(&config),
            Err(Error::Unsupported("STARTTLS"))
        ));
    }
}
