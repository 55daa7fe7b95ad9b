//! The async mail adapter.
//!
//! [`MailAdapter`] turns caller-level operations into sequences of blocking
//! protocol calls run on a [`Bridge`] worker. Every operation that depends
//! on a selected mailbox holds the selection lock from its SELECT until its
//! last command, so operations never interleave on the wire.

use std::collections::BTreeMap;

use mailgate_imap::{
    AccessMode, FetchAttribute, FetchMap, FetchRecord, Flag, ImapSession, ImapStream, Protocol,
    SearchCriteria, Uid, UidSet,
};
use mailgate_mime::TransferEncoding;
use mailgate_mime::encoding::{decode_base64, decode_quoted_printable};
use mailgate_mime::utf7::encode_mailbox_name;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::bridge::Bridge;
use super::parse::{self, TextPart, TextParts};
use super::raw::{self, RawCommand, RawOutput, STATUS_ITEMS};
use super::selection::{SelectionCache, SelectionState};
use crate::account::{ImapAccount, validate_account};
use crate::model::{FlagSet, FolderDescriptor, FolderStatusRecord, MessageBody, MessageList};
use crate::query::Query;
use crate::{Error, Result};

/// Paging and content options for [`MailAdapter::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fetch and decode the text and HTML bodies.
    pub include_body: bool,
    /// List attachment metadata.
    pub include_attachments: bool,
    /// Page size; `None` returns every match. `Some(0)` counts matches
    /// without fetching any message.
    pub limit: Option<usize>,
    /// Number of newest matches to skip.
    pub offset: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            include_body: false,
            include_attachments: false,
            limit: None,
            offset: 0,
        }
    }
}

impl QueryOptions {
    /// Options that only count matches.
    #[must_use]
    pub fn count_only() -> Self {
        Self {
            limit: Some(0),
            ..Self::default()
        }
    }

    /// Sets the page window.
    #[must_use]
    pub const fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Also fetches message bodies.
    #[must_use]
    pub const fn with_body(mut self) -> Self {
        self.include_body = true;
        self
    }

    /// Also lists attachments.
    #[must_use]
    pub const fn with_attachments(mut self) -> Self {
        self.include_attachments = true;
        self
    }
}

/// Async message-store operations over one IMAP session.
///
/// The session lives on a dedicated worker thread; the adapter can be shared
/// behind an `Arc` and called from any task.
#[derive(Debug)]
pub struct MailAdapter<P = ImapSession<ImapStream>> {
    bridge: Bridge<P>,
    selection: Mutex<SelectionCache>,
    trash_mailbox: String,
}

impl MailAdapter {
    /// Validates the account, connects and logs in.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid account and the protocol error
    /// if connecting or authenticating fails.
    pub async fn connect(account: &ImapAccount) -> Result<Self> {
        validate_account(account).map_err(Error::Config)?;

        let config = account.connection_config();
        let username = account.username.clone();
        let password = account.password.clone();
        let session = tokio::task::spawn_blocking(move || {
            ImapSession::connect(&config, &username, &password)
        })
        .await
        .map_err(|_| Error::SessionClosed)??;

        info!(host = %account.host, user = %account.username, "adapter connected");
        Ok(Self::new(session)?.with_trash_mailbox(account.trash_mailbox.clone()))
    }
}

impl<P: Protocol> MailAdapter<P> {
    /// Wraps an authenticated session.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be started.
    pub fn new(protocol: P) -> Result<Self> {
        Ok(Self {
            bridge: Bridge::spawn(protocol)?,
            selection: Mutex::new(SelectionCache::new()),
            trash_mailbox: "Trash".to_string(),
        })
    }

    /// Sets the mailbox that non-permanent deletes copy into.
    #[must_use]
    pub fn with_trash_mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.trash_mailbox = mailbox.into();
        self
    }

    /// Returns the trash mailbox name.
    #[must_use]
    pub fn trash_mailbox(&self) -> &str {
        &self.trash_mailbox
    }

    /// Returns the cached selection state.
    pub async fn selection(&self) -> SelectionState {
        self.selection.lock().await.state().clone()
    }

    /// Searches a mailbox and returns one page of matches, newest UID first.
    ///
    /// Folder status is always read, so `total_in_folder` is filled even
    /// when `options.limit` is zero and nothing is fetched.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` if the mailbox does not exist, or
    /// the protocol error of any step.
    pub async fn query(
        &self,
        mailbox: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<MessageList> {
        let criteria = query.to_criteria();
        if !criteria.is_wire_safe() {
            return Err(Error::InvalidArguments {
                command: "query".to_string(),
                reason: "search text contains CR, LF or NUL".to_string(),
            });
        }

        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, mailbox, AccessMode::ReadOnly)
            .await?;

        let mut uids = self.bridge.run(move |p| p.search(&criteria)).await?;
        uids.sort_unstable_by(|a, b| b.cmp(a));
        uids.dedup();

        let status = self.status_locked(&mut selection, mailbox).await?;
        let mut list = MessageList {
            mailbox: mailbox.to_string(),
            messages: Vec::new(),
            total_matches: uids.len(),
            total_in_folder: status.message_count,
        };

        let page: Vec<Uid> = uids
            .into_iter()
            .skip(options.offset)
            .take(options.limit.unwrap_or(usize::MAX))
            .collect();
        let Some(set) = UidSet::from_uids(&page) else {
            debug!(mailbox, matches = list.total_matches, "query returned no page");
            return Ok(list);
        };

        let mut attributes = vec![
            FetchAttribute::Flags,
            FetchAttribute::Envelope,
            FetchAttribute::Rfc822Size,
            FetchAttribute::InternalDate,
        ];
        if options.include_body || options.include_attachments {
            attributes.push(FetchAttribute::BodyStructure);
        }
        let records = self.bridge.run(move |p| p.fetch(&set, &attributes)).await?;

        let mut bodies = if options.include_body {
            self.fetch_bodies(&records).await?
        } else {
            BTreeMap::new()
        };

        list.messages = page
            .iter()
            .filter_map(|uid| records.get(uid))
            .map(|record| {
                let mut message =
                    parse::message_record(mailbox, record, options.include_attachments);
                if let Some(body) = bodies.remove(&record.uid) {
                    message.body_text = body.text;
                    message.body_html = body.html;
                }
                message
            })
            .collect();

        debug!(
            mailbox,
            matches = list.total_matches,
            returned = list.messages.len(),
            "query complete"
        );
        Ok(list)
    }

    /// Fetches and decodes the text and HTML bodies of a message.
    ///
    /// A UID the server does not return yields an empty body.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` or the protocol error.
    pub async fn fetch_body(&self, mailbox: &str, uid: Uid) -> Result<MessageBody> {
        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, mailbox, AccessMode::ReadOnly)
            .await?;

        let records = self
            .bridge
            .run(move |p| p.fetch(&UidSet::single(uid), &[FetchAttribute::BodyStructure]))
            .await?;
        let mut bodies = self.fetch_bodies(&records).await?;
        Ok(bodies.remove(&uid).unwrap_or_default())
    }

    /// Fetches one body part and removes its transfer encoding.
    ///
    /// Parts whose encoding cannot be determined are decoded as Base64.
    ///
    /// # Errors
    ///
    /// Returns `Error::ContentNotFound` if the message or part is absent,
    /// `Error::Decode` if the content is not validly encoded.
    pub async fn fetch_attachment(&self, mailbox: &str, uid: Uid, part: &str) -> Result<Vec<u8>> {
        let not_found = || Error::ContentNotFound {
            mailbox: mailbox.to_string(),
            uid,
            part: part.to_string(),
        };
        if !is_part_path(part) {
            return Err(not_found());
        }

        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, mailbox, AccessMode::ReadOnly)
            .await?;

        let attributes = [
            FetchAttribute::BodyStructure,
            FetchAttribute::peek_section(part),
        ];
        let records = self
            .bridge
            .run(move |p| p.fetch(&UidSet::single(uid), &attributes))
            .await?;

        let record = records.get(&uid).ok_or_else(not_found)?;
        let data = record.section(part).ok_or_else(not_found)?;
        let encoding = record
            .body_structure
            .as_ref()
            .and_then(|structure| parse::find_part(structure, part))
            .map_or(TransferEncoding::Base64, |body| {
                TransferEncoding::parse(&body.encoding)
            });

        let decoded = match encoding {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(data))?,
            TransferEncoding::QuotedPrintable => decode_quoted_printable(data)?,
            TransferEncoding::SevenBit | TransferEncoding::EightBit | TransferEncoding::Binary => {
                data.to_vec()
            }
        };
        debug!(mailbox, %uid, part, encoded = data.len(), decoded = decoded.len(), "attachment fetched");
        Ok(decoded)
    }

    /// Adds and removes flags on a message and returns its resulting flags.
    ///
    /// # Errors
    ///
    /// Returns `Error::MessageNotFound` if the server no longer has the
    /// message, or the protocol error.
    pub async fn update_flags(
        &self,
        mailbox: &str,
        uid: Uid,
        add: &FlagSet,
        remove: &FlagSet,
    ) -> Result<FlagSet> {
        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, mailbox, AccessMode::ReadWrite)
            .await?;

        let flags = add.to_imap_flags();
        if !flags.is_empty() {
            self.bridge
                .run(move |p| p.add_flags(&UidSet::single(uid), &flags))
                .await?;
        }
        let flags = remove.to_imap_flags();
        if !flags.is_empty() {
            self.bridge
                .run(move |p| p.remove_flags(&UidSet::single(uid), &flags))
                .await?;
        }

        let records = self
            .bridge
            .run(move |p| p.fetch(&UidSet::single(uid), &[FetchAttribute::Flags]))
            .await?;
        let record = records.get(&uid).ok_or_else(|| Error::MessageNotFound {
            mailbox: mailbox.to_string(),
            uid,
        })?;
        Ok(FlagSet::parse(record.flags.iter().flatten()))
    }

    /// Moves a message and returns its UID in the destination, if the
    /// server reported one.
    ///
    /// Servers without MOVE get COPY, `\Deleted` and EXPUNGE instead.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` for a missing source mailbox, or the
    /// protocol error.
    pub async fn move_message(&self, uid: Uid, from: &str, to: &str) -> Result<Option<Uid>> {
        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, from, AccessMode::ReadWrite)
            .await?;

        let destination = encode_mailbox_name(to);
        let wire = destination.clone();
        match self
            .bridge
            .run(move |p| p.move_messages(&UidSet::single(uid), &wire))
            .await
        {
            Ok(mapping) => Ok(mapping.and_then(|m| m.get(uid))),
            Err(Error::Protocol(mailgate_imap::Error::Unsupported(_))) => {
                debug!(%uid, from, to, "MOVE unsupported, copying instead");
                let mapping = self
                    .bridge
                    .run(move |p| p.copy_messages(&UidSet::single(uid), &destination))
                    .await?;
                self.expunge_uid(uid).await?;
                Ok(mapping.and_then(|m| m.get(uid)))
            }
            Err(err) => Err(err),
        }
    }

    /// Copies a message and returns its UID in the destination, if the
    /// server reported one.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` for a missing source mailbox, or the
    /// protocol error.
    pub async fn copy_message(&self, uid: Uid, from: &str, to: &str) -> Result<Option<Uid>> {
        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, from, AccessMode::ReadOnly)
            .await?;

        let destination = encode_mailbox_name(to);
        let mapping = self
            .bridge
            .run(move |p| p.copy_messages(&UidSet::single(uid), &destination))
            .await?;
        Ok(mapping.and_then(|m| m.get(uid)))
    }

    /// Deletes a message.
    ///
    /// Unless `permanent` is set, or the message is already in the trash,
    /// it is first copied to the trash mailbox. A refused copy does not stop
    /// the delete.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` or the protocol error of the flag
    /// or expunge step.
    pub async fn delete_message(&self, mailbox: &str, uid: Uid, permanent: bool) -> Result<()> {
        let mut selection = self.selection.lock().await;
        selection
            .ensure(&self.bridge, mailbox, AccessMode::ReadWrite)
            .await?;

        if !permanent && mailbox != self.trash_mailbox {
            let trash = encode_mailbox_name(&self.trash_mailbox);
            match self
                .bridge
                .run(move |p| p.copy_messages(&UidSet::single(uid), &trash))
                .await
            {
                Ok(_) => {}
                Err(Error::Protocol(
                    err @ (mailgate_imap::Error::No(_) | mailgate_imap::Error::Bad(_)),
                )) => {
                    debug!(%uid, mailbox, trash = %self.trash_mailbox, error = %err, "copy to trash refused, deleting anyway");
                }
                Err(err) => return Err(err),
            }
        }

        self.expunge_uid(uid).await
    }

    /// Lists every folder on the server.
    ///
    /// # Errors
    ///
    /// Returns the protocol error.
    pub async fn list_folders(&self) -> Result<Vec<FolderDescriptor>> {
        let entries = self.bridge.run(|p| p.list_folders()).await?;
        Ok(entries.iter().map(parse::folder_descriptor).collect())
    }

    /// Reads message, unseen and next-UID counters for a folder.
    ///
    /// Servers that refuse STATUS are answered by examining the folder and
    /// searching it for unseen messages, which leaves it selected.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` if the fallback selection finds no
    /// such mailbox, or the protocol error.
    pub async fn folder_status(&self, mailbox: &str) -> Result<FolderStatusRecord> {
        let mut selection = self.selection.lock().await;
        self.status_locked(&mut selection, mailbox).await
    }

    /// Creates a folder and returns its listing.
    ///
    /// # Errors
    ///
    /// Returns the protocol error.
    pub async fn create_folder(&self, name: &str) -> Result<FolderDescriptor> {
        let wire = encode_mailbox_name(name);
        self.bridge.run(move |p| p.create_folder(&wire)).await?;
        info!(folder = name, "folder created");
        self.describe_folder(name).await
    }

    /// Deletes a folder.
    ///
    /// # Errors
    ///
    /// Returns the protocol error.
    pub async fn delete_folder(&self, name: &str) -> Result<()> {
        let mut selection = self.selection.lock().await;
        if selection.holds(name) {
            selection.invalidate();
        }

        let wire = encode_mailbox_name(name);
        self.bridge.run(move |p| p.delete_folder(&wire)).await?;
        info!(folder = name, "folder deleted");
        Ok(())
    }

    /// Renames a folder and returns the listing of its new name.
    ///
    /// # Errors
    ///
    /// Returns the protocol error.
    pub async fn rename_folder(&self, from: &str, to: &str) -> Result<FolderDescriptor> {
        let mut selection = self.selection.lock().await;
        if selection.holds(from) {
            selection.invalidate();
        }

        let (old, new) = (encode_mailbox_name(from), encode_mailbox_name(to));
        self.bridge.run(move |p| p.rename_folder(&old, &new)).await?;
        drop(selection);

        info!(from, to, "folder renamed");
        self.describe_folder(to).await
    }

    /// Runs one command from the restricted raw command table.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCommand` or `Error::InvalidArguments` before
    /// anything is sent, otherwise the protocol error.
    pub async fn raw_command(&self, name: &str, args: &[&str]) -> Result<RawOutput> {
        let command = RawCommand::parse(name, args)?;
        let mut selection = self.selection.lock().await;
        raw::execute(command, &self.bridge, &mut selection).await
    }

    /// Logs out and stops the worker.
    ///
    /// # Errors
    ///
    /// Returns the protocol error of LOGOUT; the worker stops regardless.
    pub async fn logout(self) -> Result<()> {
        let result = self.bridge.run(|p| p.logout()).await;
        drop(self);
        info!("adapter logged out");
        result
    }

    async fn status_locked(
        &self,
        selection: &mut SelectionCache,
        mailbox: &str,
    ) -> Result<FolderStatusRecord> {
        let wire = encode_mailbox_name(mailbox);
        match self
            .bridge
            .run(move |p| p.folder_status(&wire, &STATUS_ITEMS))
            .await
        {
            Ok(items) => Ok(parse::status_record(&items)),
            Err(Error::Protocol(err)) => {
                debug!(mailbox, error = %err, "STATUS failed, examining instead");
                let status = selection
                    .select(&self.bridge, mailbox, AccessMode::ReadOnly)
                    .await?;
                let unseen = self
                    .bridge
                    .run(|p| p.search(&SearchCriteria::Unseen))
                    .await?
                    .len();
                Ok(FolderStatusRecord {
                    message_count: status.exists,
                    unseen_count: u32::try_from(unseen).unwrap_or(u32::MAX),
                    uid_next: status.uid_next,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn expunge_uid(&self, uid: Uid) -> Result<()> {
        self.bridge
            .run(move |p| {
                p.add_flags(&UidSet::single(uid), &[Flag::Deleted])?;
                p.expunge()
            })
            .await
    }

    async fn describe_folder(&self, name: &str) -> Result<FolderDescriptor> {
        let listed = self.list_folders().await?;
        Ok(listed
            .into_iter()
            .find(|folder| folder.name == name)
            .unwrap_or_else(|| FolderDescriptor::unlisted(name)))
    }

    /// Fetches the text sections of every record with a body structure.
    ///
    /// Messages sharing the same part layout are fetched with one command.
    async fn fetch_bodies(&self, records: &FetchMap) -> Result<BTreeMap<Uid, MessageBody>> {
        let mut groups: BTreeMap<Vec<String>, Vec<Uid>> = BTreeMap::new();
        for record in records.values() {
            if let Some(structure) = &record.body_structure {
                let paths = parse::text_parts(structure).paths();
                if !paths.is_empty() {
                    groups.entry(paths).or_default().push(record.uid);
                }
            }
        }

        let mut bodies = BTreeMap::new();
        for (paths, uids) in groups {
            let Some(set) = UidSet::from_uids(&uids) else {
                continue;
            };
            let attributes: Vec<FetchAttribute> = paths
                .iter()
                .map(|path| FetchAttribute::peek_section(path.as_str()))
                .collect();
            let sections = self.bridge.run(move |p| p.fetch(&set, &attributes)).await?;

            for uid in uids {
                let (Some(record), Some(fetched)) = (records.get(&uid), sections.get(&uid)) else {
                    continue;
                };
                if let Some(structure) = &record.body_structure {
                    bodies.insert(uid, decode_body(&parse::text_parts(structure), fetched));
                }
            }
        }
        Ok(bodies)
    }
}

fn decode_body(parts: &TextParts<'_>, fetched: &FetchRecord) -> MessageBody {
    let decode = |part: Option<&TextPart<'_>>| {
        part.and_then(|part| fetched.section(&part.path).map(|data| part.decode(data)))
    };
    MessageBody {
        text: decode(parts.plain.as_ref()),
        html: decode(parts.html.as_ref()),
    }
}

/// Returns true for a dotted part number such as `2` or `1.3`.
///
/// Servers key returned sections by canonical numbers, so a segment with a
/// leading zero would never match the response.
fn is_part_path(part: &str) -> bool {
    !part.is_empty()
        && part.split('.').all(|n| {
            n.bytes().next().is_some_and(|b| (b'1'..=b'9').contains(&b))
                && n.bytes().all(|b| b.is_ascii_digit())
        })
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
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;
    use crate::service::mock::Recorder;

    fn adapter() -> (MailAdapter<Recorder>, Arc<StdMutex<Vec<String>>>) {
        let recorder = Recorder {
            missing: vec!["Gone".to_string()],
            ..Recorder::default()
        };
        let calls = Arc::clone(&recorder.calls);
        (MailAdapter::new(recorder).unwrap(), calls)
    }

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    mod options_tests {
        use super::*;

        #[test]
        fn defaults() {
            let options = QueryOptions::default();
            assert_eq!(options.limit, None);
            assert_eq!(options.offset, 0);
            assert!(!options.include_body);
            assert_eq!(QueryOptions::count_only().limit, Some(0));
        }

        #[test]
        fn builders() {
            let options = QueryOptions::default().page(10, 20).with_body().with_attachments();
            assert_eq!((options.limit, options.offset), (Some(10), 20));
            assert!(options.include_body && options.include_attachments);
        }

        #[test]
        fn part_paths() {
            assert!(is_part_path("2"));
            assert!(is_part_path("1.2.3"));
            assert!(!is_part_path(""));
            assert!(!is_part_path("1..2"));
            assert!(!is_part_path("HEADER"));
            assert!(!is_part_path("1]<0.10>"));
            assert!(!is_part_path("01"));
            assert!(!is_part_path("1.02"));
            assert!(!is_part_path("0"));
            assert!(is_part_path("10.1"));
        }
    }

    mod sequencing_tests {
        use super::*;

        #[tokio::test]
        async fn repeated_operations_share_one_select() {
            let (adapter, calls) = adapter();
            adapter
                .query("INBOX", &Query::All, QueryOptions::count_only())
                .await
                .unwrap();
            adapter.fetch_body("INBOX", uid(3)).await.unwrap();

            let calls = calls.lock().unwrap().clone();
            let selects = calls.iter().filter(|c| c.starts_with("select")).count();
            assert_eq!(selects, 1);
            assert_eq!(calls[0], "select INBOX read-only");
        }

        #[tokio::test]
        async fn mode_change_reselects() {
            let (adapter, calls) = adapter();
            adapter.fetch_body("INBOX", uid(3)).await.unwrap();
            adapter.delete_message("INBOX", uid(3), true).await.unwrap();

            let calls = calls.lock().unwrap().clone();
            assert_eq!(
                calls,
                vec![
                    "select INBOX read-only",
                    "fetch 3",
                    "select INBOX read-write",
                    "add_flags 3",
                    "expunge",
                ]
            );
        }

        #[tokio::test]
        async fn trash_copy_skipped_inside_trash() {
            let (adapter, calls) = adapter();
            adapter.delete_message("Trash", uid(9), false).await.unwrap();
            assert!(!calls.lock().unwrap().iter().any(|c| c.starts_with("copy")));

            adapter.delete_message("INBOX", uid(9), false).await.unwrap();
            assert!(calls.lock().unwrap().contains(&"copy 9 Trash".to_string()));
        }

        #[tokio::test]
        async fn missing_mailbox_leaves_cache_unselected() {
            let (adapter, _) = adapter();
            adapter.fetch_body("INBOX", uid(1)).await.unwrap();

            let err = adapter.fetch_body("Gone", uid(1)).await.unwrap_err();
            assert!(matches!(err, Error::MailboxNotFound { mailbox } if mailbox == "Gone"));
            assert_eq!(adapter.selection().await, SelectionState::Unselected);
        }

        #[tokio::test]
        async fn renaming_selected_folder_invalidates() {
            let (adapter, calls) = adapter();
            adapter.fetch_body("Work", uid(1)).await.unwrap();
            let folder = adapter.rename_folder("Work", "Projects").await.unwrap();

            assert_eq!(folder, FolderDescriptor::unlisted("Projects"));
            assert_eq!(adapter.selection().await, SelectionState::Unselected);
            assert!(calls.lock().unwrap().contains(&"rename Work Projects".to_string()));
        }

        #[tokio::test]
        async fn deleting_other_folder_keeps_selection() {
            let (adapter, _) = adapter();
            adapter.fetch_body("INBOX", uid(1)).await.unwrap();
            adapter.delete_folder("Old").await.unwrap();
            assert!(matches!(
                adapter.selection().await,
                SelectionState::Selected { mailbox, .. } if mailbox == "INBOX"
            ));
        }

        #[tokio::test]
        async fn folder_names_are_encoded() {
            let (adapter, calls) = adapter();
            adapter.create_folder("Entwürfe").await.unwrap();
            assert_eq!(calls.lock().unwrap()[0], "create Entw&APw-rfe");
        }

        #[tokio::test]
        async fn raw_select_invalidates() {
            let (adapter, calls) = adapter();
            adapter.fetch_body("INBOX", uid(1)).await.unwrap();
            let output = adapter
                .raw_command("select", &["Archive", "readonly"])
                .await
                .unwrap();
            assert!(matches!(output, RawOutput::Selected(_)));
            assert_eq!(adapter.selection().await, SelectionState::Unselected);

            adapter.fetch_body("INBOX", uid(1)).await.unwrap();
            let selects = calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.starts_with("select INBOX"))
                .count();
            assert_eq!(selects, 2);
        }

        #[tokio::test]
        async fn raw_rejects_before_sending() {
            let (adapter, calls) = adapter();
            assert!(matches!(
                adapter.raw_command("fetch", &["1"]).await,
                Err(Error::UnknownCommand(_))
            ));
            assert!(calls.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn logout_stops_worker() {
            let (adapter, calls) = adapter();
            adapter.logout().await.unwrap();
            assert_eq!(calls.lock().unwrap().last().unwrap(), "logout");
        }
    }
}
