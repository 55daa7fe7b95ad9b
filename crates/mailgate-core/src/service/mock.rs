//! A recording [`Protocol`] for unit tests.

use std::sync::{Arc, Mutex};

use mailgate_imap::{
    AccessMode, Capability, Error, FetchAttribute, FetchMap, Flag, ListResponse, MailboxStatus,
    Protocol, Result, SearchCriteria, StatusAttribute, StatusItem, Uid, UidMap, UidSet,
};

/// Logs every call and succeeds with empty results, except for mailboxes
/// listed in `missing`, which SELECT refuses.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub missing: Vec<String>,
}

impl Recorder {
    fn log(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Protocol for Recorder {
    fn select(&mut self, mailbox: &str, mode: AccessMode) -> Result<MailboxStatus> {
        self.log(format!("select {mailbox} {mode}"));
        if self.missing.iter().any(|m| m == mailbox) {
            return Err(Error::No("Mailbox does not exist".to_string()));
        }
        Ok(MailboxStatus {
            read_only: mode.is_read_only(),
            ..MailboxStatus::default()
        })
    }

    fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        self.log(format!("search {criteria}"));
        Ok(Vec::new())
    }

    fn fetch(&mut self, uids: &UidSet, _attributes: &[FetchAttribute]) -> Result<FetchMap> {
        self.log(format!("fetch {uids}"));
        Ok(FetchMap::new())
    }

    fn add_flags(&mut self, uids: &UidSet, _flags: &[Flag]) -> Result<()> {
        self.log(format!("add_flags {uids}"));
        Ok(())
    }

    fn remove_flags(&mut self, uids: &UidSet, _flags: &[Flag]) -> Result<()> {
        self.log(format!("remove_flags {uids}"));
        Ok(())
    }

    fn copy_messages(&mut self, uids: &UidSet, mailbox: &str) -> Result<Option<UidMap>> {
        self.log(format!("copy {uids} {mailbox}"));
        Ok(None)
    }

    fn move_messages(&mut self, uids: &UidSet, mailbox: &str) -> Result<Option<UidMap>> {
        self.log(format!("move {uids} {mailbox}"));
        Ok(None)
    }

    fn expunge(&mut self) -> Result<()> {
        self.log("expunge".to_string());
        Ok(())
    }

    fn list_folders(&mut self) -> Result<Vec<ListResponse>> {
        self.log("list".to_string());
        Ok(Vec::new())
    }

    fn folder_status(&mut self, mailbox: &str, _items: &[StatusAttribute]) -> Result<Vec<StatusItem>> {
        self.log(format!("status {mailbox}"));
        Ok(Vec::new())
    }

    fn create_folder(&mut self, mailbox: &str) -> Result<()> {
        self.log(format!("create {mailbox}"));
        Ok(())
    }

    fn delete_folder(&mut self, mailbox: &str) -> Result<()> {
        self.log(format!("delete {mailbox}"));
        Ok(())
    }

    fn rename_folder(&mut self, from: &str, to: &str) -> Result<()> {
        self.log(format!("rename {from} {to}"));
        Ok(())
    }

    fn noop(&mut self) -> Result<()> {
        self.log("noop".to_string());
        Ok(())
    }

    fn capabilities(&mut self) -> Result<Vec<Capability>> {
        self.log("capabilities".to_string());
        Ok(vec![Capability::Imap4Rev1])
    }

    fn raw_command(&mut self, command: &str) -> Result<Vec<u8>> {
        self.log(format!("raw {command}"));
        Ok(Vec::new())
    }

    fn logout(&mut self) -> Result<()> {
        self.log("logout".to_string());
        Ok(())
    }
}
