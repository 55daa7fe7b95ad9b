//! Folder records.

use mailgate_imap::Uid;
use serde::{Deserialize, Serialize};

/// One mailbox as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDescriptor {
    /// Decoded (UTF-8) mailbox name, hierarchy delimiters included.
    pub name: String,
    /// False only when the server advertised `\HasNoChildren`.
    pub has_children: bool,
    /// Raw name attributes, e.g. `\Noselect`, `\Trash`.
    pub flags: Vec<String>,
}

impl FolderDescriptor {
    /// Descriptor used when a folder the adapter just created or renamed
    /// is not in the server's listing.
    #[must_use]
    pub fn unlisted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            has_children: false,
            flags: Vec::new(),
        }
    }

    /// Returns true if the attribute is present, ignoring case.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }
}

/// Message counters of a mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStatusRecord {
    /// Number of messages.
    pub message_count: u32,
    /// Number of messages without `\Seen`.
    pub unseen_count: u32,
    /// Predicted next UID, when the server reported one.
    pub uid_next: Option<Uid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_descriptor() {
        let folder = FolderDescriptor::unlisted("Projects");
        assert_eq!(folder.name, "Projects");
        assert!(!folder.has_children);
        assert!(folder.flags.is_empty());
    }

    #[test]
    fn has_flag_ignores_case() {
        let folder = FolderDescriptor {
            name: "[Gmail]".to_string(),
            has_children: true,
            flags: vec!["\\NoSelect".to_string()],
        };
        assert!(folder.has_flag("\\Noselect"));
        assert!(!folder.has_flag("\\Trash"));
    }
}
