//! Core IMAP types.
//!
//! This module defines the fundamental types shared by the protocol
//! contract and the session, following RFC 3501 (`IMAP4rev1`).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod sequence;
mod uid_map;

pub use capability::Capability;
pub use flags::Flag;
pub(crate) use flags::write_flag_list;
pub use identifiers::{Uid, UidValidity};
pub use mailbox::{ListResponse, MailboxAttribute, MailboxStatus};
pub use sequence::UidSet;
pub use uid_map::UidMap;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_new() {
        assert!(Uid::new(0).is_none());
        assert!(Uid::new(1).is_some());
        assert_eq!(Uid::new(123).unwrap().get(), 123);
    }

    #[test]
    fn test_capability_parse() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("move"), Capability::Move);
        assert_eq!(
            Capability::parse("AUTH=PLAIN"),
            Capability::Auth("PLAIN".to_string())
        );
    }

    #[test]
    fn test_flag_parse() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\FLAGGED"), Flag::Flagged);
        assert_eq!(Flag::parse("custom"), Flag::Keyword("custom".to_string()));
    }

    #[test]
    fn test_uid_set_display() {
        let uids: Vec<Uid> = [1, 2, 3, 7].into_iter().filter_map(Uid::new).collect();
        assert_eq!(UidSet::from_uids(&uids).unwrap().to_string(), "1:3,7");
    }

    #[test]
    fn test_mailbox_attribute_parse() {
        assert_eq!(
            MailboxAttribute::parse("\\NoSelect"),
            MailboxAttribute::NoSelect
        );
        assert_eq!(
            MailboxAttribute::parse("\\HasChildren"),
            MailboxAttribute::HasChildren
        );
        assert_eq!(MailboxAttribute::parse("\\Trash"), MailboxAttribute::Trash);
    }
}
