//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for IMAP protocol
//! - The blocking session that implements [`crate::Protocol`]

mod config;
mod framed;
mod session;
mod stream;

pub use config::{Config, ConfigBuilder, Security};
pub use framed::FramedStream;
pub use session::ImapSession;
pub use stream::{ImapStream, connect, tls_config};
