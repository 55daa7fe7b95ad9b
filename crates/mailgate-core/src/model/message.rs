//! Message records.

use chrono::{DateTime, FixedOffset};
use mailgate_imap::Uid;
use serde::{Deserialize, Serialize};

use super::flags::FlagSet;

/// An email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Display name, decoded.
    pub name: Option<String>,
    /// Local part.
    pub mailbox: String,
    /// Domain.
    pub host: String,
}

impl Address {
    /// Sentinel used when a message has no From address.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: None,
            mailbox: "unknown".to_string(),
            host: "unknown.com".to_string(),
        }
    }

    /// Returns `mailbox@host`.
    #[must_use]
    pub fn email(&self) -> String {
        format!("{}@{}", self.mailbox, self.host)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}@{}>", self.mailbox, self.host),
            None => write!(f, "{}@{}", self.mailbox, self.host),
        }
    }
}

/// What an attachment is, as described by the message structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    /// Lowercase `type/subtype`.
    pub mime_type: String,
    /// File name from the disposition or content-type parameters.
    pub filename: Option<String>,
    /// Encoded size in bytes.
    pub size: u32,
    /// Content-Transfer-Encoding, lowercase.
    pub encoding: String,
    /// Content-ID without angle brackets.
    pub content_id: Option<String>,
    /// Disposition kind, lowercase (`attachment`, `inline`).
    pub disposition: Option<String>,
}

/// An attachment whose bytes have not been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// Mailbox holding the message.
    pub mailbox: String,
    /// Message UID.
    pub uid: Uid,
    /// IMAP section path, e.g. `"2"` or `"1.3"`.
    pub part: String,
    /// Content description.
    pub content: ContentDescriptor,
}

/// A message as returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Message UID.
    pub uid: Uid,
    /// Mailbox the UID belongs to.
    pub mailbox: String,
    /// Message-ID header, or `<uid@mailbox>` when absent.
    pub message_id: String,
    /// First From address, or [`Address::unknown`].
    pub from: Address,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Decoded subject.
    pub subject: String,
    /// Server INTERNALDATE.
    pub date: Option<DateTime<FixedOffset>>,
    /// Flags.
    pub flags: FlagSet,
    /// RFC822 size in bytes.
    pub size: u32,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Plain-text body, when requested.
    pub body_text: Option<String>,
    /// HTML body, when requested.
    pub body_html: Option<String>,
    /// Attachments; `None` when not requested, `Some(empty)` when there are none.
    pub attachments: Option<Vec<AttachmentMetadata>>,
}

/// A page of query results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageList {
    /// Mailbox the query ran against, as given by the caller.
    pub mailbox: String,
    /// Matching messages in the page, highest UID first.
    pub messages: Vec<MessageRecord>,
    /// Number of messages matching the query.
    pub total_matches: usize,
    /// Number of messages in the mailbox.
    pub total_in_folder: u32,
}

/// Text bodies of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// First inline `text/plain` part.
    pub text: Option<String>,
    /// First inline `text/html` part.
    pub html: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display() {
        let addr = Address {
            name: Some("Alice".to_string()),
            mailbox: "alice".to_string(),
            host: "example.com".to_string(),
        };
        assert_eq!(addr.to_string(), "Alice <alice@example.com>");
        assert_eq!(addr.email(), "alice@example.com");
    }

    #[test]
    fn unknown_sentinel() {
        assert_eq!(Address::unknown().to_string(), "unknown@unknown.com");
    }
}
