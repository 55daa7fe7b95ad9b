//! # mailgate-core
//!
//! Async message-store operations over a blocking IMAP session.
//!
//! A [`MailAdapter`] owns one authenticated session on a worker thread and
//! exposes UID-oriented operations on top of it:
//!
//! - querying a mailbox with paging, newest UID first
//! - fetching decoded bodies and attachments
//! - updating flags, moving, copying and deleting messages
//! - listing, creating, deleting and renaming folders
//! - a restricted raw command passthrough
//!
//! The adapter tracks which mailbox the server has selected and skips
//! redundant SELECT round trips.
//!
//! ```no_run
//! use mailgate_core::{ImapAccount, MailAdapter, Query, QueryOptions};
//!
//! # async fn run() -> mailgate_core::Result<()> {
//! let mut account = ImapAccount::with_email("alice@gmail.com");
//! account.password = "app-password".to_string();
//!
//! let adapter = MailAdapter::connect(&account).await?;
//! let unread = adapter
//!     .query("INBOX", &Query::Unseen, QueryOptions::default().page(20, 0))
//!     .await?;
//! println!("{} unread", unread.total_matches);
//! adapter.logout().await
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod error;
pub mod model;
mod query;
pub mod service;

pub use account::{ImapAccount, ValidationError, ValidationResult, validate_account};
pub use error::{Error, Result};
pub use mailgate_imap::{AccessMode, Security, Uid};
pub use model::{
    Address, AttachmentMetadata, ContentDescriptor, FlagSet, FolderDescriptor, FolderStatusRecord,
    MessageBody, MessageList, MessageRecord, StandardFlag,
};
pub use query::Query;
pub use service::{MailAdapter, QueryOptions, RawCommand, RawOutput, SelectionState};
