//! End-to-end tests for `MailAdapter`.
//!
//! The adapter runs against `FakeServer`, an in-memory `Protocol` that keeps
//! a few mailboxes, honors the selected mailbox and records every primitive
//! call it receives.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use mailgate_core::{
    AccessMode, Error, FlagSet, FolderDescriptor, MailAdapter, Query, QueryOptions, RawOutput,
    SelectionState, StandardFlag, Uid,
};
use mailgate_imap::{
    Address, BodyPart, BodyStructure, Capability, Envelope, FetchAttribute, FetchMap,
    FetchRecord, Flag, ListResponse, MailboxAttribute, MailboxStatus, Protocol, SearchCriteria,
    StatusAttribute, StatusItem, UidMap, UidSet,
};
use mailgate_mime::encoding::encode_base64;
use tokio_test::assert_ok;

#[derive(Debug, Clone, Default)]
struct Message {
    uid: u32,
    flags: Vec<String>,
    subject: String,
    structure: Option<BodyStructure>,
    sections: BTreeMap<String, Vec<u8>>,
}

impl Message {
    fn new(uid: u32) -> Self {
        Self {
            uid,
            subject: format!("Message {uid}"),
            ..Self::default()
        }
    }

    fn flagged(mut self, flags: &[&str]) -> Self {
        self.flags = flags.iter().map(ToString::to_string).collect();
        self
    }

    fn with_part(mut self, path: &str, structure: BodyStructure, data: &[u8]) -> Self {
        self.structure = Some(structure);
        self.sections.insert(path.to_string(), data.to_vec());
        self
    }
}

#[derive(Debug, Default)]
struct Folder {
    messages: Vec<Message>,
    uid_next: u32,
    has_children: bool,
}

#[derive(Debug, Default)]
struct State {
    folders: BTreeMap<String, Folder>,
    selected: Option<String>,
    calls: Vec<String>,
    supports_move: bool,
    status_fails: bool,
    copyuid: bool,
    search_order: Option<Vec<u32>>,
    hidden: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct FakeServer(Arc<Mutex<State>>, Arc<Mutex<Option<mpsc::Receiver<()>>>>);

impl FakeServer {
    fn new() -> Self {
        let server = Self::default();
        server.add_folder("INBOX", 1);
        server.add_folder("Trash", 1);
        server
    }

    fn add_folder(&self, name: &str, uid_next: u32) {
        self.0.lock().unwrap().folders.insert(
            name.to_string(),
            Folder {
                uid_next,
                ..Folder::default()
            },
        );
    }

    fn add_message(&self, folder: &str, message: Message) {
        let mut state = self.0.lock().unwrap();
        let folder = state.folders.get_mut(folder).unwrap();
        folder.uid_next = folder.uid_next.max(message.uid + 1);
        folder.messages.push(message);
    }

    fn configure(&self, f: impl FnOnce(&mut State)) {
        f(&mut self.0.lock().unwrap());
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn uids(&self, folder: &str) -> Vec<u32> {
        let state = self.0.lock().unwrap();
        state.folders[folder].messages.iter().map(|m| m.uid).collect()
    }

    /// Makes the next SELECT block on the worker until the returned sender
    /// fires or is dropped.
    fn hold_next_select(&self) -> mpsc::Sender<()> {
        let (release, gate) = mpsc::channel();
        *self.1.lock().unwrap() = Some(gate);
        release
    }

    fn adapter(&self) -> MailAdapter<Self> {
        init_tracing();
        MailAdapter::new(self.clone()).unwrap()
    }
}

/// Honors `RUST_LOG` when debugging a failing test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn no(text: &str) -> mailgate_imap::Error {
    mailgate_imap::Error::No(text.to_string())
}

fn contains(set: &UidSet, uid: u32) -> bool {
    match set {
        UidSet::Single(u) => u.get() == uid,
        UidSet::Range(a, b) => (a.get()..=b.get()).contains(&uid),
        UidSet::RangeFrom(a) => uid >= a.get(),
        UidSet::All => true,
        UidSet::Set(sets) => sets.iter().any(|s| contains(s, uid)),
    }
}

impl State {
    fn log(&mut self, call: String) {
        self.calls.push(call);
    }

    fn selected(&mut self) -> mailgate_imap::Result<&mut Folder> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| mailgate_imap::Error::Bad("No mailbox selected".to_string()))?;
        Ok(self.folders.get_mut(&name).unwrap())
    }

    fn transfer(&mut self, uids: &UidSet, mailbox: &str, remove: bool) -> mailgate_imap::Result<Option<UidMap>> {
        if !self.folders.contains_key(mailbox) {
            return Err(no("[TRYCREATE] Mailbox does not exist"));
        }
        let copyuid = self.copyuid;
        let moving: Vec<Message> = {
            let source = self.selected()?;
            let picked = source
                .messages
                .iter()
                .filter(|m| contains(uids, m.uid))
                .cloned()
                .collect();
            if remove {
                source.messages.retain(|m| !contains(uids, m.uid));
            }
            picked
        };
        let destination = self.folders.get_mut(mailbox).unwrap();

        let mut source_uids = Vec::new();
        let mut destination_uids = Vec::new();
        for mut message in moving {
            source_uids.push(message.uid..=message.uid);
            message.uid = destination.uid_next;
            destination.uid_next += 1;
            destination_uids.push(message.uid..=message.uid);
            destination.messages.push(message);
        }

        if copyuid && !source_uids.is_empty() {
            Ok(UidMap::from_ranges(1, &source_uids, &destination_uids))
        } else {
            Ok(None)
        }
    }
}

impl Protocol for FakeServer {
    fn select(&mut self, mailbox: &str, mode: AccessMode) -> mailgate_imap::Result<MailboxStatus> {
        let gate = self.1.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        let mut state = self.0.lock().unwrap();
        state.log(format!("select {mailbox} {mode}"));
        state.selected = None;
        let folder = state
            .folders
            .get(mailbox)
            .ok_or_else(|| no("[NONEXISTENT] No such mailbox"))?;
        let status = MailboxStatus {
            exists: u32::try_from(folder.messages.len()).unwrap(),
            uid_next: Uid::new(folder.uid_next),
            read_only: mode.is_read_only(),
            ..MailboxStatus::default()
        };
        state.selected = Some(mailbox.to_string());
        Ok(status)
    }

    fn search(&mut self, criteria: &SearchCriteria) -> mailgate_imap::Result<Vec<Uid>> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("search {criteria}"));
        let order = state.search_order.clone();
        let folder = state.selected()?;
        let uids: Vec<u32> = match (criteria, order) {
            (SearchCriteria::Unseen, _) => folder
                .messages
                .iter()
                .filter(|m| !m.flags.iter().any(|f| f == "\\Seen"))
                .map(|m| m.uid)
                .collect(),
            (_, Some(order)) => order,
            (_, None) => folder.messages.iter().map(|m| m.uid).collect(),
        };
        Ok(uids.into_iter().filter_map(Uid::new).collect())
    }

    fn fetch(&mut self, uids: &UidSet, attributes: &[FetchAttribute]) -> mailgate_imap::Result<FetchMap> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("fetch {uids}"));
        let folder = state.selected()?;

        let mut map = FetchMap::new();
        for message in folder.messages.iter().filter(|m| contains(uids, m.uid)) {
            let uid = Uid::new(message.uid).unwrap();
            let mut record = FetchRecord::new(uid);
            for attribute in attributes {
                match attribute {
                    FetchAttribute::Flags => record.flags = Some(message.flags.clone()),
                    FetchAttribute::Envelope => {
                        record.envelope = Some(Envelope {
                            subject: Some(message.subject.clone().into_bytes()),
                            from: vec![Address {
                                name: Some(b"Alice".to_vec()),
                                mailbox: Some(b"alice".to_vec()),
                                host: Some(b"example.com".to_vec()),
                                ..Address::default()
                            }],
                            ..Envelope::default()
                        });
                    }
                    FetchAttribute::Rfc822Size => record.size = Some(1024),
                    FetchAttribute::InternalDate => {
                        record.internal_date = Some("01-Feb-2024 10:00:00 +0000".to_string());
                    }
                    FetchAttribute::BodyStructure => record.body_structure.clone_from(&message.structure),
                    FetchAttribute::Body {
                        section: Some(section),
                        ..
                    } => {
                        if let Some(data) = message.sections.get(section) {
                            record.sections.insert(section.clone(), data.clone());
                        }
                    }
                    FetchAttribute::Body { section: None, .. } | FetchAttribute::Uid => {}
                }
            }
            map.insert(uid, record);
        }
        Ok(map)
    }

    fn add_flags(&mut self, uids: &UidSet, flags: &[Flag]) -> mailgate_imap::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("store {uids} +{}", join(flags)));
        let folder = state.selected()?;
        for message in folder.messages.iter_mut().filter(|m| contains(uids, m.uid)) {
            for flag in flags {
                let token = flag.to_string();
                if !message.flags.contains(&token) {
                    message.flags.push(token);
                }
            }
        }
        Ok(())
    }

    fn remove_flags(&mut self, uids: &UidSet, flags: &[Flag]) -> mailgate_imap::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("store {uids} -{}", join(flags)));
        let folder = state.selected()?;
        let tokens: Vec<String> = flags.iter().map(ToString::to_string).collect();
        for message in folder.messages.iter_mut().filter(|m| contains(uids, m.uid)) {
            message.flags.retain(|f| !tokens.contains(f));
        }
        Ok(())
    }

    fn copy_messages(&mut self, uids: &UidSet, mailbox: &str) -> mailgate_imap::Result<Option<UidMap>> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("copy {uids} {mailbox}"));
        state.transfer(uids, mailbox, false)
    }

    fn move_messages(&mut self, uids: &UidSet, mailbox: &str) -> mailgate_imap::Result<Option<UidMap>> {
        let mut state = self.0.lock().unwrap();
        if !state.supports_move {
            return Err(mailgate_imap::Error::Unsupported("MOVE"));
        }
        state.log(format!("move {uids} {mailbox}"));
        state.transfer(uids, mailbox, true)
    }

    fn expunge(&mut self) -> mailgate_imap::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.log("expunge".to_string());
        let folder = state.selected()?;
        folder
            .messages
            .retain(|m| !m.flags.iter().any(|f| f == "\\Deleted"));
        Ok(())
    }

    fn list_folders(&mut self) -> mailgate_imap::Result<Vec<ListResponse>> {
        let mut state = self.0.lock().unwrap();
        state.log("list".to_string());
        Ok(state
            .folders
            .iter()
            .filter(|(name, _)| !state.hidden.contains(*name))
            .map(|(name, folder)| ListResponse {
                attributes: vec![if folder.has_children {
                    MailboxAttribute::HasChildren
                } else {
                    MailboxAttribute::HasNoChildren
                }],
                delimiter: Some("/".to_string()),
                name: name.clone(),
            })
            .collect())
    }

    fn folder_status(&mut self, mailbox: &str, items: &[StatusAttribute]) -> mailgate_imap::Result<Vec<StatusItem>> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("status {mailbox}"));
        if state.status_fails {
            return Err(mailgate_imap::Error::Bad("Unknown command STATUS".to_string()));
        }
        let folder = state
            .folders
            .get(mailbox)
            .ok_or_else(|| no("Mailbox does not exist"))?;
        let unseen = folder
            .messages
            .iter()
            .filter(|m| !m.flags.iter().any(|f| f == "\\Seen"))
            .count();
        Ok(items
            .iter()
            .filter_map(|item| match item {
                StatusAttribute::Messages => Some(StatusItem::Messages(
                    u32::try_from(folder.messages.len()).unwrap(),
                )),
                StatusAttribute::Unseen => Some(StatusItem::Unseen(u32::try_from(unseen).unwrap())),
                StatusAttribute::UidNext => Uid::new(folder.uid_next).map(StatusItem::UidNext),
                _ => None,
            })
            .collect())
    }

    fn create_folder(&mut self, mailbox: &str) -> mailgate_imap::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("create {mailbox}"));
        if state.folders.contains_key(mailbox) {
            return Err(no("[ALREADYEXISTS] Mailbox already exists"));
        }
        state.folders.insert(
            mailbox.to_string(),
            Folder {
                uid_next: 1,
                ..Folder::default()
            },
        );
        Ok(())
    }

    fn delete_folder(&mut self, mailbox: &str) -> mailgate_imap::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("delete {mailbox}"));
        state
            .folders
            .remove(mailbox)
            .map(|_| ())
            .ok_or_else(|| no("Mailbox does not exist"))
    }

    fn rename_folder(&mut self, from: &str, to: &str) -> mailgate_imap::Result<()> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("rename {from} {to}"));
        let folder = state
            .folders
            .remove(from)
            .ok_or_else(|| no("Mailbox does not exist"))?;
        state.folders.insert(to.to_string(), folder);
        if state.selected.as_deref() == Some(from) {
            state.selected = None;
        }
        Ok(())
    }

    fn noop(&mut self) -> mailgate_imap::Result<()> {
        self.0.lock().unwrap().log("noop".to_string());
        Ok(())
    }

    fn capabilities(&mut self) -> mailgate_imap::Result<Vec<Capability>> {
        let mut state = self.0.lock().unwrap();
        state.log("capability".to_string());
        let mut caps = vec![Capability::Imap4Rev1, Capability::UidPlus];
        if state.supports_move {
            caps.push(Capability::Move);
        }
        Ok(caps)
    }

    fn raw_command(&mut self, command: &str) -> mailgate_imap::Result<Vec<u8>> {
        let mut state = self.0.lock().unwrap();
        state.log(format!("raw {command}"));
        state.selected = None;
        Ok(format!("* OK {command}\r\n").into_bytes())
    }

    fn logout(&mut self) -> mailgate_imap::Result<()> {
        self.0.lock().unwrap().log("logout".to_string());
        Ok(())
    }
}

fn join(flags: &[Flag]) -> String {
    flags.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

fn part(media_type: &str, subtype: &str, encoding: &str) -> BodyPart {
    BodyPart {
        media_type: media_type.to_string(),
        subtype: subtype.to_string(),
        params: vec![("charset".to_string(), "utf-8".to_string())],
        encoding: encoding.to_string(),
        ..BodyPart::default()
    }
}

fn inbox_with(uids: &[u32]) -> FakeServer {
    let server = FakeServer::new();
    for &n in uids {
        server.add_message("INBOX", Message::new(n));
    }
    server
}

mod selection {
    use super::*;

    #[tokio::test]
    async fn identical_ensure_selects_once() {
        let server = inbox_with(&[1, 2]);
        server.add_folder("Sent", 1);
        server.add_message("Sent", Message::new(1));
        let adapter = server.adapter();

        assert_ok!(adapter.fetch_body("INBOX", uid(1)).await);
        assert_ok!(adapter.fetch_body("INBOX", uid(2)).await);
        assert_eq!(server.count("select"), 1);

        assert_ok!(adapter.fetch_body("Sent", uid(1)).await);
        assert_eq!(server.count("select"), 2);

        assert_ok!(
            adapter
                .update_flags("Sent", uid(1), &FlagSet::new(), &FlagSet::new())
                .await
        );
        assert_eq!(server.count("select"), 3);
        assert_eq!(server.calls().last().unwrap(), "fetch 1");
    }

    #[tokio::test]
    async fn missing_mailbox_is_not_found() {
        let server = inbox_with(&[1]);
        let adapter = server.adapter();
        assert_ok!(adapter.fetch_body("INBOX", uid(1)).await);

        let err = adapter
            .query("Nowhere", &Query::All, QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MailboxNotFound { mailbox } if mailbox == "Nowhere"));
        assert_eq!(adapter.selection().await, SelectionState::Unselected);

        assert_ok!(adapter.fetch_body("INBOX", uid(1)).await);
        assert_eq!(server.count("select INBOX"), 2);
    }

    #[tokio::test]
    async fn concurrent_operations_do_not_interleave() {
        let server = inbox_with(&[1, 2, 3]);
        server.add_folder("Sent", 1);
        server.add_message("Sent", Message::new(4));
        let adapter = Arc::new(server.adapter());

        let (a, b) = tokio::join!(
            adapter.query("INBOX", &Query::All, QueryOptions::default()),
            adapter.query("Sent", &Query::All, QueryOptions::default()),
        );
        assert_eq!(a.unwrap().messages.len(), 3);
        assert_eq!(b.unwrap().messages.len(), 1);

        let calls = server.calls();
        for (i, call) in calls.iter().enumerate() {
            if call.starts_with("select") {
                assert!(calls[i + 1].starts_with("search"), "{calls:?}");
            }
        }
    }
}

mod query {
    use super::*;

    #[tokio::test]
    async fn results_are_newest_first() {
        let server = inbox_with(&[3, 5, 7, 11]);
        server.configure(|s| s.search_order = Some(vec![3, 11, 7, 5]));
        let adapter = server.adapter();

        let list = adapter
            .query("INBOX", &Query::All, QueryOptions::default())
            .await
            .unwrap();
        let uids: Vec<u32> = list.messages.iter().map(|m| m.uid.get()).collect();
        assert_eq!(uids, vec![11, 7, 5, 3]);

        let page = adapter
            .query("INBOX", &Query::All, QueryOptions::default().page(2, 1))
            .await
            .unwrap();
        let uids: Vec<u32> = page.messages.iter().map(|m| m.uid.get()).collect();
        assert_eq!(uids, vec![7, 5]);
        assert_eq!(page.total_matches, 4);
    }

    #[tokio::test]
    async fn zero_limit_counts_without_fetching() {
        let server = inbox_with(&[1, 2, 3, 4, 5, 6, 7]);
        server.configure(|s| s.search_order = Some(vec![2, 3, 5, 6, 7]));
        let adapter = server.adapter();

        let list = adapter
            .query("INBOX", &Query::Unflagged, QueryOptions::count_only())
            .await
            .unwrap();
        assert!(list.messages.is_empty());
        assert_eq!(list.total_matches, 5);
        assert_eq!(list.total_in_folder, 7);
        assert_eq!(server.count("fetch"), 0);
    }

    #[tokio::test]
    async fn no_limit_returns_every_match() {
        let all: Vec<u32> = (1..=120).collect();
        let server = inbox_with(&all);
        let adapter = server.adapter();

        let list = adapter
            .query("INBOX", &Query::All, QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(list.mailbox, "INBOX");
        assert_eq!(list.total_matches, 120);
        assert_eq!(list.messages.len(), 120);
        assert_eq!(list.messages[0].uid.get(), 120);
        assert_eq!(list.messages[119].uid.get(), 1);
    }

    #[tokio::test]
    async fn line_breaks_in_search_text_are_rejected() {
        let server = inbox_with(&[1]);
        let adapter = server.adapter();

        for query in [
            Query::Subject("x\r\nZ9 DELETE INBOX\r\n".to_string()),
            Query::And(vec![
                Query::Unseen,
                Query::Header("X-Tag".to_string(), "a\nb".to_string()),
            ]),
            Query::Not(Box::new(Query::Keyword("nul\0".to_string()))),
        ] {
            let err = adapter
                .query("INBOX", &query, QueryOptions::default())
                .await
                .unwrap_err();
            assert!(
                matches!(err, Error::InvalidArguments { ref command, .. } if command == "query"),
                "{err}"
            );
        }
        assert!(server.calls().is_empty());

        let list = adapter
            .query("INBOX", &Query::Subject("Café".to_string()), QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(list.total_matches, 1);
    }

    #[tokio::test]
    async fn offset_past_end_returns_totals() {
        let server = inbox_with(&[1, 2]);
        let adapter = server.adapter();
        let list = adapter
            .query("INBOX", &Query::All, QueryOptions::default().page(10, 5))
            .await
            .unwrap();
        assert!(list.messages.is_empty());
        assert_eq!((list.total_matches, list.total_in_folder), (2, 2));
        assert_eq!(server.count("fetch"), 0);
    }

    #[tokio::test]
    async fn records_are_populated() {
        let server = FakeServer::new();
        server.add_message("INBOX", Message::new(9).flagged(&["\\Seen", "CustomFlag"]));
        let adapter = server.adapter();

        let list = adapter
            .query("INBOX", &Query::All, QueryOptions::default())
            .await
            .unwrap();
        let record = &list.messages[0];
        assert_eq!(record.mailbox, "INBOX");
        assert_eq!(record.subject, "Message 9");
        assert_eq!(record.from.email(), "alice@example.com");
        assert_eq!(record.message_id, "<9@INBOX>");
        assert_eq!(record.size, 1024);
        assert!(record.flags.contains(StandardFlag::Seen));
        assert!(record.flags.contains_custom("CustomFlag"));
        assert!(record.date.is_some());
        assert!(record.body_text.is_none());
        assert!(record.attachments.is_none());
    }

    #[tokio::test]
    async fn bodies_and_attachments_on_request() {
        let structure = BodyStructure::Multipart {
            subtype: "MIXED".to_string(),
            params: Vec::new(),
            bodies: vec![
                BodyStructure::Text {
                    part: part("TEXT", "PLAIN", "QUOTED-PRINTABLE"),
                    lines: 1,
                },
                BodyStructure::Basic(BodyPart {
                    params: vec![("name".to_string(), "report.pdf".to_string())],
                    size: 300,
                    ..part("APPLICATION", "PDF", "BASE64")
                }),
            ],
            disposition: None,
        };
        let server = FakeServer::new();
        server.add_message(
            "INBOX",
            Message::new(4).with_part("1", structure, b"Caf=C3=A9 at noon"),
        );
        let adapter = server.adapter();

        let list = adapter
            .query(
                "INBOX",
                &Query::All,
                QueryOptions::default().with_body().with_attachments(),
            )
            .await
            .unwrap();
        let record = &list.messages[0];
        assert_eq!(record.body_text.as_deref(), Some("Café at noon"));
        assert!(record.body_html.is_none());

        let attachments = record.attachments.as_ref().unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].part, "2");
        assert_eq!(attachments[0].content.filename.as_deref(), Some("report.pdf"));
    }
}

mod content {
    use super::*;

    #[tokio::test]
    async fn base64_attachment_decodes_exactly() {
        let original: Vec<u8> = (0..17_671u32).map(|i| u8::try_from(i * 31 % 251).unwrap()).collect();
        let encoded = encode_base64(&original);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert_eq!(wrapped.len(), 24_184);

        let structure = BodyStructure::Multipart {
            subtype: "MIXED".to_string(),
            params: Vec::new(),
            bodies: vec![
                BodyStructure::Text {
                    part: part("TEXT", "PLAIN", "7BIT"),
                    lines: 1,
                },
                BodyStructure::Basic(part("IMAGE", "PNG", "BASE64")),
            ],
            disposition: None,
        };
        let server = FakeServer::new();
        server.add_message(
            "INBOX",
            Message::new(8).with_part("2", structure, wrapped.as_bytes()),
        );
        let adapter = server.adapter();

        let content = adapter.fetch_attachment("INBOX", uid(8), "2").await.unwrap();
        assert_eq!(content.len(), 17_671);
        assert_eq!(content, original);
    }

    #[tokio::test]
    async fn missing_part_is_content_not_found() {
        let server = inbox_with(&[8]);
        let adapter = server.adapter();

        let err = adapter.fetch_attachment("INBOX", uid(8), "3").await.unwrap_err();
        assert!(matches!(err, Error::ContentNotFound { part, .. } if part == "3"));

        let err = adapter.fetch_attachment("INBOX", uid(99), "1").await.unwrap_err();
        assert!(matches!(err, Error::ContentNotFound { uid, .. } if uid.get() == 99));
    }

    #[tokio::test]
    async fn leading_zero_part_is_rejected_unsent() {
        let server = inbox_with(&[8]);
        let adapter = server.adapter();

        for path in ["01", "1.02", "0"] {
            let err = adapter.fetch_attachment("INBOX", uid(8), path).await.unwrap_err();
            assert!(matches!(err, Error::ContentNotFound { ref part, .. } if part == path));
        }
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_base64_is_decode_error() {
        let structure = BodyStructure::Basic(part("APPLICATION", "ZIP", "BASE64"));
        let server = FakeServer::new();
        server.add_message("INBOX", Message::new(2).with_part("1", structure, b"@@not base64@@"));
        let adapter = server.adapter();

        let err = adapter.fetch_attachment("INBOX", uid(2), "1").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_body_decodes_both_alternatives() {
        let structure = BodyStructure::Multipart {
            subtype: "ALTERNATIVE".to_string(),
            params: Vec::new(),
            bodies: vec![
                BodyStructure::Text {
                    part: part("TEXT", "PLAIN", "7BIT"),
                    lines: 1,
                },
                BodyStructure::Text {
                    part: part("TEXT", "HTML", "BASE64"),
                    lines: 1,
                },
            ],
            disposition: None,
        };
        let mut message = Message::new(6).with_part("1", structure, b"Hello");
        message
            .sections
            .insert("2".to_string(), encode_base64(b"<p>Hello</p>").into_bytes());
        let server = FakeServer::new();
        server.add_message("INBOX", message);
        let adapter = server.adapter();

        let body = adapter.fetch_body("INBOX", uid(6)).await.unwrap();
        assert_eq!(body.text.as_deref(), Some("Hello"));
        assert_eq!(body.html.as_deref(), Some("<p>Hello</p>"));
    }
}

mod mutation {
    use super::*;

    #[tokio::test]
    async fn flags_add_then_remove() {
        let server = FakeServer::new();
        server.add_message("INBOX", Message::new(5).flagged(&["\\Seen", "CustomFlag"]));
        let adapter = server.adapter();

        let flags = adapter
            .update_flags(
                "INBOX",
                uid(5),
                &FlagSet::new().with(StandardFlag::Flagged).with_custom("$Work"),
                &FlagSet::new().with(StandardFlag::Seen),
            )
            .await
            .unwrap();
        assert!(flags.contains(StandardFlag::Flagged));
        assert!(!flags.contains(StandardFlag::Seen));
        assert!(flags.contains_custom("CustomFlag"));
        assert!(flags.contains_custom("$Work"));

        let calls = server.calls();
        let add = calls.iter().position(|c| c.contains('+')).unwrap();
        let remove = calls.iter().position(|c| c.contains(" -")).unwrap();
        assert!(add < remove);
    }

    #[tokio::test]
    async fn recent_is_not_stored() {
        let server = FakeServer::new();
        server.add_message("INBOX", Message::new(5).flagged(&["\\Recent"]));
        let adapter = server.adapter();

        let flags = adapter
            .update_flags(
                "INBOX",
                uid(5),
                &FlagSet::new().with(StandardFlag::Recent).with(StandardFlag::Seen),
                &FlagSet::new().with(StandardFlag::Recent),
            )
            .await
            .unwrap();
        assert!(flags.contains(StandardFlag::Seen));
        assert!(flags.contains(StandardFlag::Recent));

        let stores: Vec<String> = server
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("store"))
            .collect();
        assert_eq!(stores, vec!["store 5 +\\Seen"]);
    }

    #[tokio::test]
    async fn vanished_message_is_not_found() {
        let server = inbox_with(&[1]);
        let adapter = server.adapter();
        let err = adapter
            .update_flags("INBOX", uid(77), &FlagSet::new().with(StandardFlag::Seen), &FlagSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MessageNotFound { uid, .. } if uid.get() == 77));
    }

    #[tokio::test]
    async fn move_reports_destination_uid() {
        let server = inbox_with(&[42]);
        server.add_folder("Archive", 100);
        server.configure(|s| {
            s.supports_move = true;
            s.copyuid = true;
        });
        let adapter = server.adapter();

        let moved = adapter.move_message(uid(42), "INBOX", "Archive").await.unwrap();
        assert_eq!(moved, Some(uid(100)));
        assert!(server.uids("INBOX").is_empty());
        assert_eq!(server.uids("Archive"), vec![100]);
        assert_eq!(server.count("expunge"), 0);
    }

    #[tokio::test]
    async fn move_falls_back_to_copy() {
        let server = inbox_with(&[42, 43]);
        server.add_folder("Archive", 100);
        server.configure(|s| s.copyuid = true);
        let adapter = server.adapter();

        let moved = adapter.move_message(uid(42), "INBOX", "Archive").await.unwrap();
        assert_eq!(moved, Some(uid(100)));
        assert_eq!(server.uids("INBOX"), vec![43]);
        assert_eq!(server.uids("Archive"), vec![100]);
        assert_eq!(
            server.calls()[1..],
            [
                "copy 42 Archive".to_string(),
                "store 42 +\\Deleted".to_string(),
                "expunge".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn move_without_copyuid_is_unknown() {
        let server = inbox_with(&[42]);
        server.add_folder("Archive", 100);
        let adapter = server.adapter();

        let moved = adapter.move_message(uid(42), "INBOX", "Archive").await.unwrap();
        assert_eq!(moved, None);
        assert_eq!(server.uids("Archive"), vec![100]);
    }

    #[tokio::test]
    async fn copy_keeps_source() {
        let server = inbox_with(&[7]);
        server.add_folder("Archive", 30);
        server.configure(|s| s.copyuid = true);
        let adapter = server.adapter();

        let copied = adapter.copy_message(uid(7), "INBOX", "Archive").await.unwrap();
        assert_eq!(copied, Some(uid(30)));
        assert_eq!(server.uids("INBOX"), vec![7]);
        assert_eq!(server.calls()[0], "select INBOX read-only");
    }

    #[tokio::test]
    async fn delete_copies_to_trash() {
        let server = inbox_with(&[3]);
        let adapter = server.adapter();

        adapter.delete_message("INBOX", uid(3), false).await.unwrap();
        assert!(server.uids("INBOX").is_empty());
        assert_eq!(server.uids("Trash").len(), 1);
    }

    #[tokio::test]
    async fn delete_survives_missing_trash() {
        let server = inbox_with(&[3]);
        server.configure(|s| {
            s.folders.remove("Trash");
        });
        let adapter = server.adapter();

        adapter.delete_message("INBOX", uid(3), false).await.unwrap();
        assert!(server.uids("INBOX").is_empty());
        assert_eq!(server.count("copy"), 1);
    }

    #[tokio::test]
    async fn permanent_delete_skips_trash() {
        let server = inbox_with(&[3]);
        let adapter = server.adapter().with_trash_mailbox("Bin");

        adapter.delete_message("INBOX", uid(3), true).await.unwrap();
        assert_eq!(server.count("copy"), 0);
        assert!(server.uids("INBOX").is_empty());
    }
}

mod folders {
    use super::*;

    #[tokio::test]
    async fn children_flags() {
        let server = FakeServer::new();
        server.configure(|s| s.folders.get_mut("INBOX").unwrap().has_children = true);
        let adapter = server.adapter();

        let folders = adapter.list_folders().await.unwrap();
        let inbox = folders.iter().find(|f| f.name == "INBOX").unwrap();
        let trash = folders.iter().find(|f| f.name == "Trash").unwrap();
        assert!(inbox.has_children);
        assert!(!trash.has_children);
        assert!(trash.has_flag("\\HasNoChildren"));
    }

    #[tokio::test]
    async fn status_counts() {
        let server = FakeServer::new();
        server.add_message("INBOX", Message::new(1).flagged(&["\\Seen"]));
        server.add_message("INBOX", Message::new(2));
        let adapter = server.adapter();

        let status = adapter.folder_status("INBOX").await.unwrap();
        assert_eq!(status.message_count, 2);
        assert_eq!(status.unseen_count, 1);
        assert_eq!(status.uid_next, Some(uid(3)));
        assert_eq!(adapter.selection().await, SelectionState::Unselected);
    }

    #[tokio::test]
    async fn status_falls_back_to_examine() {
        let server = FakeServer::new();
        server.add_message("INBOX", Message::new(1).flagged(&["\\Seen"]));
        server.add_message("INBOX", Message::new(2));
        server.add_message("INBOX", Message::new(3));
        server.configure(|s| s.status_fails = true);
        let adapter = server.adapter();

        let status = adapter.folder_status("INBOX").await.unwrap();
        assert_eq!(status.message_count, 3);
        assert_eq!(status.unseen_count, 2);
        assert_eq!(status.uid_next, Some(uid(4)));
        assert_eq!(
            adapter.selection().await,
            SelectionState::Selected {
                mailbox: "INBOX".to_string(),
                mode: AccessMode::ReadOnly
            }
        );

        assert_ok!(adapter.fetch_body("INBOX", uid(2)).await);
        assert_eq!(server.count("select"), 1);
    }

    #[tokio::test]
    async fn create_returns_listing_or_default() {
        let server = FakeServer::new();
        let adapter = server.adapter();

        let created = adapter.create_folder("Projects").await.unwrap();
        assert_eq!(created.name, "Projects");
        assert!(created.has_flag("\\HasNoChildren"));

        server.configure(|s| s.hidden.push("Later".to_string()));
        let hidden = adapter.create_folder("Later").await.unwrap();
        assert_eq!(hidden, FolderDescriptor::unlisted("Later"));
    }

    #[tokio::test]
    async fn rename_and_delete() {
        let server = inbox_with(&[1]);
        server.add_folder("Work", 1);
        let adapter = server.adapter();

        assert_ok!(adapter.fetch_body("Work", uid(1)).await);
        let renamed = adapter.rename_folder("Work", "Projects").await.unwrap();
        assert_eq!(renamed.name, "Projects");
        assert_eq!(adapter.selection().await, SelectionState::Unselected);

        adapter.delete_folder("Projects").await.unwrap();
        let names: Vec<String> = adapter
            .list_folders()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["INBOX", "Trash"]);
    }

    #[tokio::test]
    async fn failed_delete_is_passed_through() {
        let server = FakeServer::new();
        let adapter = server.adapter();
        let err = adapter.delete_folder("Ghost").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(mailgate_imap::Error::No(_))));
        assert_eq!(err.to_string(), mailgate_imap::Error::No("Mailbox does not exist".to_string()).to_string());
    }
}

mod raw {
    use super::*;

    #[tokio::test]
    async fn dispatches_known_commands() {
        let server = inbox_with(&[1, 2]);
        let adapter = server.adapter();

        let caps = adapter.raw_command("CAPABILITY", &[]).await.unwrap();
        assert!(matches!(caps, RawOutput::Capabilities(c) if c.contains(&"UIDPLUS".to_string())));

        assert_ok!(adapter.raw_command("examine", &["INBOX"]).await);
        let uids = adapter.raw_command("search", &[]).await.unwrap();
        assert_eq!(uids, RawOutput::Uids(vec![uid(1), uid(2)]));

        let text = adapter.raw_command("command", &["NAMESPACE"]).await.unwrap();
        assert_eq!(text, RawOutput::Text("* OK NAMESPACE\r\n".to_string()));
        assert_eq!(adapter.selection().await, SelectionState::Unselected);
    }

    #[tokio::test]
    async fn rejects_unknown_and_malformed() {
        let server = FakeServer::new();
        let adapter = server.adapter();

        assert!(matches!(
            adapter.raw_command("append", &["INBOX"]).await,
            Err(Error::UnknownCommand(_))
        ));
        assert!(matches!(
            adapter.raw_command("status", &[]).await,
            Err(Error::InvalidArguments { .. })
        ));
        assert!(matches!(
            adapter.raw_command("command", &["NOOP\r\nZ9 DELETE INBOX"]).await,
            Err(Error::InvalidArguments { .. })
        ));
        assert!(matches!(
            adapter.raw_command("search", &["SUBJECT", "\"a\r\nZ9 LOGOUT\""]).await,
            Err(Error::InvalidArguments { .. })
        ));
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_closes_session() {
        let server = FakeServer::new();
        let adapter = server.adapter();
        adapter.logout().await.unwrap();
        assert_eq!(server.calls(), vec!["logout"]);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn dropped_operation_leaves_selection_unselected() {
        let server = inbox_with(&[1, 2]);
        let adapter = server.adapter();
        let release = server.hold_next_select();

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            adapter.query("INBOX", &Query::All, QueryOptions::default()),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(adapter.selection().await, SelectionState::Unselected);
        assert_eq!(server.count("select"), 0);

        release.send(()).unwrap();
        for _ in 0..200 {
            if server.count("select") == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(server.calls(), vec!["select INBOX read-only"]);
        assert_eq!(adapter.selection().await, SelectionState::Unselected);

        let list = adapter
            .query("INBOX", &Query::All, QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(list.messages.len(), 2);
        assert_eq!(server.count("select"), 2);
        assert!(server.calls()[2].starts_with("search"), "{:?}", server.calls());
    }
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn query_is_strictly_descending(order in proptest::collection::vec(1u32..500, 0..40)) {
            let server = FakeServer::new();
            server.configure(|s| s.search_order = Some(order.clone()));
            let mut distinct = order.clone();
            distinct.sort_unstable();
            distinct.dedup();
            for &n in &distinct {
                server.add_message("INBOX", Message::new(n));
            }

            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let list = runtime.block_on(async {
                server
                    .adapter()
                    .query("INBOX", &Query::All, QueryOptions::default().page(1000, 0))
                    .await
                    .unwrap()
            });

            let uids: Vec<u32> = list.messages.iter().map(|m| m.uid.get()).collect();
            prop_assert!(uids.windows(2).all(|w| w[0] > w[1]));
            prop_assert_eq!(uids.len(), distinct.len());
            prop_assert_eq!(list.total_matches, distinct.len());
        }
    }
}
