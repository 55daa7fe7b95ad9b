//! The blocking primitive contract consumed by the adapter.
//!
//! Every method runs one protocol exchange to completion on the calling
//! thread. Implementations own exactly one connection and are never shared;
//! callers wanting concurrency run them on a dedicated worker.

use crate::Result;
use crate::command::{FetchAttribute, SearchCriteria, StatusAttribute};
use crate::parser::{FetchMap, StatusItem};
use crate::types::{Capability, Flag, ListResponse, MailboxStatus, Uid, UidMap, UidSet};

/// How a mailbox is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// EXAMINE: flags cannot change and nothing can be expunged.
    ReadOnly,
    /// SELECT: full access.
    ReadWrite,
}

impl AccessMode {
    /// Returns true for [`AccessMode::ReadOnly`].
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ReadOnly => "read-only",
            Self::ReadWrite => "read-write",
        })
    }
}

/// Blocking IMAP primitives for a single authenticated session.
///
/// Mailbox names are wire names (modified UTF-7). Message-level methods act
/// on the currently selected mailbox.
pub trait Protocol: Send + 'static {
    /// Selects (or examines) a mailbox.
    ///
    /// # Errors
    ///
    /// Returns `Error::No` when the server refuses, e.g. for a missing mailbox.
    fn select(&mut self, mailbox: &str, mode: AccessMode) -> Result<MailboxStatus>;

    /// Runs UID SEARCH and returns matching UIDs in server order.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>>;

    /// Runs UID FETCH. UIDs the server does not know are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn fetch(&mut self, uids: &UidSet, attributes: &[FetchAttribute]) -> Result<FetchMap>;

    /// Adds flags with `UID STORE +FLAGS.SILENT`.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn add_flags(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()>;

    /// Removes flags with `UID STORE -FLAGS.SILENT`.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn remove_flags(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()>;

    /// Copies messages; returns the COPYUID mapping when the server sent one.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn copy_messages(&mut self, uids: &UidSet, mailbox: &str) -> Result<Option<UidMap>>;

    /// Moves messages; returns the COPYUID mapping when the server sent one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unsupported("MOVE")` when the server lacks RFC 6851,
    /// otherwise the server or transport error.
    fn move_messages(&mut self, uids: &UidSet, mailbox: &str) -> Result<Option<UidMap>>;

    /// Permanently removes messages flagged `\Deleted`.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn expunge(&mut self) -> Result<()>;

    /// Lists every mailbox (`LIST "" "*"`).
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn list_folders(&mut self) -> Result<Vec<ListResponse>>;

    /// Runs STATUS for a mailbox.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn folder_status(&mut self, mailbox: &str, items: &[StatusAttribute]) -> Result<Vec<StatusItem>>;

    /// Creates a mailbox.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn create_folder(&mut self, mailbox: &str) -> Result<()>;

    /// Deletes a mailbox.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn delete_folder(&mut self, mailbox: &str) -> Result<()>;

    /// Renames a mailbox.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn rename_folder(&mut self, from: &str, to: &str) -> Result<()>;

    /// Sends NOOP.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn noop(&mut self) -> Result<()>;

    /// Returns the server capabilities, querying them if not yet known.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn capabilities(&mut self) -> Result<Vec<Capability>>;

    /// Sends a free-form command and returns the raw response transcript.
    ///
    /// # Errors
    ///
    /// Returns the server or transport error.
    fn raw_command(&mut self, command: &str) -> Result<Vec<u8>>;

    /// Sends LOGOUT.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    fn logout(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mode() {
        assert!(AccessMode::ReadOnly.is_read_only());
        assert!(!AccessMode::ReadWrite.is_read_only());
        assert_eq!(AccessMode::ReadWrite.to_string(), "read-write");
    }
}
