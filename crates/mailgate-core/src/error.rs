//! Error types for the adapter.

use mailgate_imap::Uid;
use thiserror::Error;

use crate::account::ValidationError;

/// Errors surfaced by [`MailAdapter`](crate::MailAdapter) operations.
///
/// Server and transport failures arrive as [`Error::Protocol`] and are passed
/// through without decoration; only the conditions the adapter itself
/// recognizes get their own variant.
#[derive(Debug, Error)]
pub enum Error {
    /// The mailbox could not be selected because it does not exist.
    #[error("Mailbox not found: {mailbox}")]
    MailboxNotFound {
        /// Mailbox name as given by the caller.
        mailbox: String,
    },

    /// The message or the requested body part is not on the server.
    #[error("Content not found: {mailbox} UID {uid} part {part}")]
    ContentNotFound {
        /// Mailbox name.
        mailbox: String,
        /// Message UID.
        uid: Uid,
        /// IMAP section path of the part.
        part: String,
    },

    /// The message disappeared while it was being updated.
    #[error("Message not found: {mailbox} UID {uid}")]
    MessageNotFound {
        /// Mailbox name.
        mailbox: String,
        /// Message UID.
        uid: Uid,
    },

    /// A raw command name is not in the dispatch table.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A raw command was given the wrong arguments.
    #[error("Invalid arguments for {command}: {reason}")]
    InvalidArguments {
        /// Command name.
        command: String,
        /// What was wrong.
        reason: String,
    },

    /// Fetched content could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] mailgate_mime::Error),

    /// The worker thread owning the session has stopped.
    #[error("Session closed")]
    SessionClosed,

    /// The account configuration is invalid.
    #[error("Invalid account configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    /// The server or the transport reported a failure.
    #[error(transparent)]
    Protocol(#[from] mailgate_imap::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

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
    fn protocol_errors_are_transparent() {
        let err: Error = mailgate_imap::Error::No("Mailbox is full".to_string()).into();
        assert_eq!(err.to_string(), "Server returned NO: Mailbox is full");
    }

    #[test]
    fn config_lists_every_problem() {
        let err = Error::Config(vec![ValidationError::EmptyHost, ValidationError::InvalidPort]);
        assert_eq!(
            err.to_string(),
            "Invalid account configuration: IMAP server is required; IMAP port must be 1-65535"
        );
    }

    #[test]
    fn content_not_found_names_the_part() {
        let err = Error::ContentNotFound {
            mailbox: "INBOX".to_string(),
            uid: Uid::new(7).unwrap(),
            part: "2.1".to_string(),
        };
        assert_eq!(err.to_string(), "Content not found: INBOX UID 7 part 2.1");
    }
}
