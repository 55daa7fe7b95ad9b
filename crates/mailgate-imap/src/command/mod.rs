//! IMAP command builder.
//!
//! This module provides types and serialization for the commands the
//! session issues. Mailbox names are passed through as given; callers
//! encode them to modified UTF-7 first.

mod serialize;
mod tag_generator;
mod types;

use crate::types::UidSet;
use crate::{Error, Result};

pub use serialize::is_wire_safe;
pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, SearchCriteria, StatusAttribute, StoreAction};

use serialize::{
    write_astring, write_fetch_attributes, write_search_criteria, write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    // Authenticated State Commands
    /// SELECT command, or EXAMINE when read-only.
    Select {
        /// Mailbox to select.
        mailbox: String,
        /// Issue EXAMINE instead of SELECT.
        read_only: bool,
    },
    /// CREATE command.
    Create {
        /// Mailbox to create.
        mailbox: String,
    },
    /// DELETE command.
    Delete {
        /// Mailbox to delete.
        mailbox: String,
    },
    /// RENAME command.
    Rename {
        /// Current mailbox name.
        from: String,
        /// New mailbox name.
        to: String,
    },
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// STATUS command.
    Status {
        /// Mailbox name.
        mailbox: String,
        /// Status items to request.
        items: Vec<StatusAttribute>,
    },

    // Selected State Commands
    /// EXPUNGE command.
    Expunge,
    /// UID SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
    },
    /// UID FETCH command.
    Fetch {
        /// UIDs to fetch.
        uids: UidSet,
        /// Items to fetch.
        items: Vec<FetchAttribute>,
    },
    /// UID STORE command.
    Store {
        /// UIDs to modify.
        uids: UidSet,
        /// Store action.
        action: StoreAction,
        /// Silent mode (no FETCH response).
        silent: bool,
    },
    /// UID COPY command.
    Copy {
        /// UIDs to copy.
        uids: UidSet,
        /// Target mailbox.
        mailbox: String,
    },
    /// UID MOVE command (RFC 6851).
    Move {
        /// UIDs to move.
        uids: UidSet,
        /// Target mailbox.
        mailbox: String,
    },

    /// Free-form command text, sent after the tag unchanged.
    Raw(String),
}

impl Command {
    /// Serializes the command to bytes with the given tag.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Select { mailbox, read_only } => {
                if *read_only {
                    buf.extend_from_slice(b"EXAMINE ");
                } else {
                    buf.extend_from_slice(b"SELECT ");
                }
                write_astring(&mut buf, mailbox);
            }

            Self::Create { mailbox } => {
                buf.extend_from_slice(b"CREATE ");
                write_astring(&mut buf, mailbox);
            }

            Self::Delete { mailbox } => {
                buf.extend_from_slice(b"DELETE ");
                write_astring(&mut buf, mailbox);
            }

            Self::Rename { from, to } => {
                buf.extend_from_slice(b"RENAME ");
                write_astring(&mut buf, from);
                buf.push(b' ');
                write_astring(&mut buf, to);
            }

            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Status { mailbox, items } => {
                buf.extend_from_slice(b"STATUS ");
                write_astring(&mut buf, mailbox);
                buf.extend_from_slice(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    buf.extend_from_slice(item.as_str().as_bytes());
                }
                buf.push(b')');
            }

            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),

            Self::Search { criteria } => {
                buf.extend_from_slice(b"UID SEARCH ");
                if !criteria.is_ascii() {
                    buf.extend_from_slice(b"CHARSET UTF-8 ");
                }
                write_search_criteria(&mut buf, criteria);
            }

            Self::Fetch { uids, items } => {
                buf.extend_from_slice(b"UID FETCH ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_attributes(&mut buf, items);
            }

            Self::Store {
                uids,
                action,
                silent,
            } => {
                buf.extend_from_slice(b"UID STORE ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action, *silent);
            }

            Self::Copy { uids, mailbox } => {
                buf.extend_from_slice(b"UID COPY ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_astring(&mut buf, mailbox);
            }

            Self::Move { uids, mailbox } => {
                buf.extend_from_slice(b"UID MOVE ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_astring(&mut buf, mailbox);
            }

            Self::Raw(line) => buf.extend_from_slice(line.trim_end_matches(['\r', '\n']).as_bytes()),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Checks that no argument would break out of the command line.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if any string argument contains CR,
    /// LF or NUL.
    pub fn check(&self) -> Result<()> {
        let safe = match self {
            Self::Login { username, password } => is_wire_safe(username) && is_wire_safe(password),
            Self::Select { mailbox, .. }
            | Self::Create { mailbox }
            | Self::Delete { mailbox }
            | Self::Status { mailbox, .. }
            | Self::Copy { mailbox, .. }
            | Self::Move { mailbox, .. } => is_wire_safe(mailbox),
            Self::Rename { from, to } => is_wire_safe(from) && is_wire_safe(to),
            Self::List { reference, pattern } => is_wire_safe(reference) && is_wire_safe(pattern),
            Self::Search { criteria } => criteria.is_wire_safe(),
            Self::Raw(line) => is_wire_safe(line.trim_end_matches(['\r', '\n'])),
            Self::Capability
            | Self::Noop
            | Self::Logout
            | Self::Expunge
            | Self::Fetch { .. }
            | Self::Store { .. } => true,
        };
        if safe {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "{} argument contains CR, LF or NUL",
                self.name()
            )))
        }
    }

    /// Returns the command name for logging; never includes arguments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Select {
                read_only: true, ..
            } => "EXAMINE",
            Self::Select { .. } => "SELECT",
            Self::Create { .. } => "CREATE",
            Self::Delete { .. } => "DELETE",
            Self::Rename { .. } => "RENAME",
            Self::List { .. } => "LIST",
            Self::Status { .. } => "STATUS",
            Self::Expunge => "EXPUNGE",
            Self::Search { .. } => "UID SEARCH",
            Self::Fetch { .. } => "UID FETCH",
            Self::Store { .. } => "UID STORE",
            Self::Copy { .. } => "UID COPY",
            Self::Move { .. } => "UID MOVE",
            Self::Raw(_) => "RAW",
        }
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
    use crate::types::{Flag, Uid};

    use super::*;

    fn uids(a: u32, b: u32) -> UidSet {
        UidSet::range(Uid::new(a).unwrap(), Uid::new(b).unwrap())
    }

    #[test]
    fn test_capability_command() {
        let cmd = Command::Capability;
        assert_eq!(cmd.serialize("A001"), b"A001 CAPABILITY\r\n");
    }

    #[test]
    fn test_login_command() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(cmd.serialize("A001"), b"A001 LOGIN user pass\r\n");
    }

    #[test]
    fn test_login_quoted() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 LOGIN user@example.com \"pass word\"\r\n"
        );
    }

    #[test]
    fn test_select_and_examine() {
        let select = Command::Select {
            mailbox: "INBOX".to_string(),
            read_only: false,
        };
        assert_eq!(select.serialize("A001"), b"A001 SELECT INBOX\r\n");

        let examine = Command::Select {
            mailbox: "Sent Items".to_string(),
            read_only: true,
        };
        assert_eq!(examine.serialize("A002"), b"A002 EXAMINE \"Sent Items\"\r\n");
    }

    #[test]
    fn test_list_command() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(cmd.serialize("A001"), b"A001 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn test_status_command() {
        let cmd = Command::Status {
            mailbox: "INBOX".to_string(),
            items: vec![
                StatusAttribute::Messages,
                StatusAttribute::Unseen,
                StatusAttribute::UidNext,
            ],
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 STATUS INBOX (MESSAGES UNSEEN UIDNEXT)\r\n"
        );
    }

    #[test]
    fn test_uid_fetch_command() {
        let cmd = Command::Fetch {
            uids: uids(1, 10),
            items: vec![FetchAttribute::Flags, FetchAttribute::Uid],
        };
        assert_eq!(cmd.serialize("A001"), b"A001 UID FETCH 1:10 (FLAGS UID)\r\n");
    }

    #[test]
    fn test_uid_store_command() {
        let cmd = Command::Store {
            uids: UidSet::single(Uid::new(42).unwrap()),
            action: StoreAction::AddFlags(vec![Flag::Seen]),
            silent: true,
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 UID STORE 42 +FLAGS.SILENT (\\Seen)\r\n"
        );
    }

    #[test]
    fn test_uid_search_command() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Unseen,
        };
        assert_eq!(cmd.serialize("A001"), b"A001 UID SEARCH UNSEEN\r\n");
    }

    #[test]
    fn test_uid_search_utf8() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Subject("Grüße".to_string()),
        };
        assert_eq!(
            cmd.serialize("A001"),
            "A001 UID SEARCH CHARSET UTF-8 SUBJECT {7}\r\nGrüße\r\n".as_bytes()
        );
    }

    #[test]
    fn test_check_rejects_line_breaks() {
        let search = Command::Search {
            criteria: SearchCriteria::Subject("x\r\nZ9 DELETE INBOX\r\n".to_string()),
        };
        assert!(matches!(search.check(), Err(Error::InvalidArgument(_))));

        let nested = Command::Search {
            criteria: SearchCriteria::Not(Box::new(SearchCriteria::Header(
                "X-Tag".to_string(),
                "a\nb".to_string(),
            ))),
        };
        assert!(nested.check().is_err());

        let login = Command::Login {
            username: "user".to_string(),
            password: "pa\0ss".to_string(),
        };
        assert!(login.check().is_err());

        assert!(Command::Raw("NOOP\r\nA9 LOGOUT".to_string()).check().is_err());
        assert!(Command::Raw("GETQUOTAROOT INBOX\r\n".to_string()).check().is_ok());
        assert!(
            Command::Search {
                criteria: SearchCriteria::Subject("Grüße".to_string()),
            }
            .check()
            .is_ok()
        );
    }

    #[test]
    fn test_uid_copy_and_move() {
        let copy = Command::Copy {
            uids: uids(3, 4),
            mailbox: "Archive".to_string(),
        };
        assert_eq!(copy.serialize("A001"), b"A001 UID COPY 3:4 Archive\r\n");

        let mv = Command::Move {
            uids: uids(3, 4),
            mailbox: "Archive".to_string(),
        };
        assert_eq!(mv.serialize("A002"), b"A002 UID MOVE 3:4 Archive\r\n");
    }

    #[test]
    fn test_raw_command() {
        let cmd = Command::Raw("GETQUOTAROOT INBOX\r\n".to_string());
        assert_eq!(cmd.serialize("A001"), b"A001 GETQUOTAROOT INBOX\r\n");
    }

    #[test]
    fn test_name_hides_arguments() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(cmd.name(), "LOGIN");
    }
}
