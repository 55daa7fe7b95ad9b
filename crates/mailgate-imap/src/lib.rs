//! # mailgate-imap
//!
//! The blocking IMAP engine behind `mailgate`.
//!
//! The crate has two halves:
//!
//! - [`Protocol`]: the primitive contract the adapter consumes. Every method
//!   runs one command to completion on the calling thread and returns owned
//!   data (UIDs, [`FetchRecord`]s, [`ListResponse`]s, COPYUID [`UidMap`]s).
//! - [`ImapSession`]: the production implementation. It tags and serializes
//!   [`Command`]s, frames server responses (literals included) and hands each
//!   one to `imap-proto` for parsing, over a rustls or plaintext
//!   [`ImapStream`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailgate_imap::{AccessMode, Config, ImapSession, Protocol, SearchCriteria};
//!
//! let config = Config::new("imap.example.com");
//! let mut session = ImapSession::connect(&config, "user@example.com", "password")?;
//!
//! for folder in session.list_folders()? {
//!     println!("Folder: {}", folder.name);
//! }
//!
//! session.select("INBOX", AccessMode::ReadOnly)?;
//! let unseen = session.search(&SearchCriteria::Unseen)?;
//! println!("{} unseen", unseen.len());
//!
//! session.logout()?;
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and serialization
//! - [`connection`]: Configuration, streams, framing and the session
//! - [`parser`]: `imap-proto` entry point and owned response types
//! - [`types`]: Core IMAP types (flags, mailboxes, UIDs, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
mod protocol;
pub mod types;

pub use command::{
    Command, FetchAttribute, SearchCriteria, StatusAttribute, StoreAction, TagGenerator,
    is_wire_safe,
};
pub use connection::{Config, ConfigBuilder, FramedStream, ImapSession, ImapStream, Security};
pub use error::{Error, Result};
pub use parser::{
    Address, BodyPart, BodyStructure, Disposition, Envelope, FetchMap, FetchRecord, StatusItem,
};
pub use protocol::{AccessMode, Protocol};
pub use types::{
    Capability, Flag, ListResponse, MailboxAttribute, MailboxStatus, Uid, UidMap, UidSet,
    UidValidity,
};

/// IMAP protocol version spoken by [`ImapSession`].
pub const IMAP_VERSION: &str = "IMAP4rev1";
