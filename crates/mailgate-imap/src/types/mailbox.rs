//! Mailbox types.

use super::{Flag, Uid, UidValidity};

/// Mailbox status information from SELECT/EXAMINE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Sequence number of the first unseen message.
    ///
    /// This is a position, not a count of unseen messages.
    pub unseen: Option<u32>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined for this mailbox.
    pub flags: Vec<Flag>,
    /// Flags that can be permanently stored.
    pub permanent_flags: Vec<Flag>,
    /// Whether mailbox is read-only.
    pub read_only: bool,
}

/// LIST response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<String>,
    /// Mailbox name as sent by the server (modified UTF-7).
    pub name: String,
}

impl ListResponse {
    /// Returns true if the server advertised the attribute.
    #[must_use]
    pub fn has_attribute(&self, attribute: &MailboxAttribute) -> bool {
        self.attributes.contains(attribute)
    }
}

/// Mailbox attributes from LIST response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// No child levels can exist under this name.
    NoInferiors,
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox is marked for attention.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    // SPECIAL-USE mailbox attributes (RFC 6154)
    /// All messages (virtual mailbox).
    All,
    /// Mailbox is the archive folder.
    Archive,
    /// Mailbox is the drafts folder.
    Drafts,
    /// Flagged/starred messages (virtual mailbox).
    Flagged,
    /// Mailbox is the junk/spam folder.
    Junk,
    /// Mailbox is the sent folder.
    Sent,
    /// Mailbox is the trash folder.
    Trash,
    /// Mailbox is subscribed.
    Subscribed,
    /// Unknown attribute, kept verbatim.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses a mailbox attribute string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOINFERIORS" => Self::NoInferiors,
            "\\NOSELECT" => Self::NoSelect,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            // RFC 6154 SPECIAL-USE
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" => Self::Flagged,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            // Other
            "\\SUBSCRIBED" => Self::Subscribed,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Returns the attribute as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoInferiors => "\\Noinferiors",
            Self::NoSelect => "\\Noselect",
            Self::HasNoChildren => "\\HasNoChildren",
            Self::HasChildren => "\\HasChildren",
            Self::Marked => "\\Marked",
            Self::Unmarked => "\\Unmarked",
            Self::All => "\\All",
            Self::Archive => "\\Archive",
            Self::Drafts => "\\Drafts",
            Self::Flagged => "\\Flagged",
            Self::Junk => "\\Junk",
            Self::Sent => "\\Sent",
            Self::Trash => "\\Trash",
            Self::Subscribed => "\\Subscribed",
            Self::Unknown(s) => s,
        }
    }
}

impl std::fmt::Display for MailboxAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
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

    mod mailbox_status_tests {
        use super::*;

        #[test]
        fn default() {
            let status = MailboxStatus::default();
            assert_eq!(status.exists, 0);
            assert_eq!(status.recent, 0);
            assert!(status.unseen.is_none());
            assert!(status.uid_next.is_none());
            assert!(status.uid_validity.is_none());
            assert!(status.flags.is_empty());
            assert!(!status.read_only);
        }
    }

    mod list_response_tests {
        use super::*;

        #[test]
        fn has_attribute() {
            let resp = ListResponse {
                attributes: vec![MailboxAttribute::HasNoChildren, MailboxAttribute::Sent],
                delimiter: Some("/".to_string()),
                name: "Sent".to_string(),
            };
            assert!(resp.has_attribute(&MailboxAttribute::HasNoChildren));
            assert!(!resp.has_attribute(&MailboxAttribute::HasChildren));
        }
    }

    mod mailbox_attribute_tests {
        use super::*;

        #[test]
        fn parse_noselect() {
            assert_eq!(
                MailboxAttribute::parse("\\NoSelect"),
                MailboxAttribute::NoSelect
            );
            assert_eq!(
                MailboxAttribute::parse("\\NOSELECT"),
                MailboxAttribute::NoSelect
            );
        }

        #[test]
        fn parse_children() {
            assert_eq!(
                MailboxAttribute::parse("\\HasNoChildren"),
                MailboxAttribute::HasNoChildren
            );
            assert_eq!(
                MailboxAttribute::parse("\\haschildren"),
                MailboxAttribute::HasChildren
            );
        }

        #[test]
        fn parse_special_use() {
            assert_eq!(MailboxAttribute::parse("\\Trash"), MailboxAttribute::Trash);
            assert_eq!(MailboxAttribute::parse("\\Spam"), MailboxAttribute::Junk);
        }

        #[test]
        fn unknown_is_kept_verbatim() {
            let attr = MailboxAttribute::parse("\\X-Custom");
            assert_eq!(attr, MailboxAttribute::Unknown("\\X-Custom".to_string()));
            assert_eq!(attr.as_str(), "\\X-Custom");
        }

        #[test]
        fn display_parses_back() {
            for attr in [
                MailboxAttribute::NoSelect,
                MailboxAttribute::HasNoChildren,
                MailboxAttribute::Trash,
            ] {
                assert_eq!(MailboxAttribute::parse(&attr.to_string()), attr);
            }
        }
    }
}
