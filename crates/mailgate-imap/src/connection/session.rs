//! Blocking IMAP session.
//!
//! `ImapSession` drives one connection: it writes tagged commands, reads
//! framed responses until the matching completion, and folds the untagged
//! data in between into owned results. It implements [`Protocol`].
//!
//! ## Example
//!
//! ```ignore
//! use mailgate_imap::{AccessMode, Config, ImapSession, Protocol};
//!
//! let config = Config::new("imap.example.com");
//! let mut session = ImapSession::connect(&config, "user@example.com", "password")?;
//! let status = session.select("INBOX", AccessMode::ReadOnly)?;
//! println!("{} messages", status.exists);
//! session.logout()?;
//! ```

use std::io::{Read, Write};

use imap_proto::{MailboxDatum, Response, ResponseCode, Status};

use super::config::Config;
use super::framed::{FramedStream, is_tagged};
use super::stream::{self, ImapStream};
use crate::command::{Command, FetchAttribute, SearchCriteria, StatusAttribute, StoreAction, TagGenerator};
use crate::parser::{self, FetchMap, StatusItem};
use crate::protocol::{AccessMode, Protocol};
use crate::types::{Capability, Flag, ListResponse, MailboxStatus, Uid, UidMap, UidSet, UidValidity};
use crate::{Error, Result};

/// Outcome of a command that completed with tagged OK.
struct Completion {
    /// Response code of the tagged OK.
    code: Option<ResponseCode<'static>>,
    /// Every response line received, tagged completion last.
    transcript: Vec<u8>,
}

/// A blocking, authenticated IMAP session over any byte stream.
#[derive(Debug)]
pub struct ImapSession<S> {
    framed: FramedStream<S>,
    tags: TagGenerator,
    capabilities: Vec<Capability>,
}

impl ImapSession<ImapStream> {
    /// Connects, reads the greeting and logs in.
    ///
    /// # Errors
    ///
    /// Returns connection, TLS, greeting or authentication errors.
    pub fn connect(config: &Config, username: &str, password: &str) -> Result<Self> {
        let stream = stream::connect(config)?;
        tracing::info!(host = %config.host, port = config.port, tls = stream.is_tls(), "connected");
        let mut session = Self::from_stream(stream)?;
        session.login(username, password)?;
        Ok(session)
    }
}

impl<S: Read + Write> ImapSession<S> {
    /// Wraps a connected stream and consumes the server greeting.
    ///
    /// # Errors
    ///
    /// Returns `Error::Bye` if the server rejects the connection, or a
    /// protocol error if the greeting is malformed.
    pub fn from_stream(stream: S) -> Result<Self> {
        let mut session = Self {
            framed: FramedStream::new(stream),
            tags: TagGenerator::default(),
            capabilities: Vec::new(),
        };

        let greeting = session.framed.read_response()?;
        match parser::parse_response(&greeting)? {
            Response::Data {
                status: Status::Ok | Status::PreAuth,
                code,
                ..
            } => {
                if let Some(ResponseCode::Capabilities(caps)) = code {
                    session.capabilities = caps.iter().map(parser::capability).collect();
                }
            }
            Response::Data {
                status: Status::Bye,
                information,
                ..
            } => return Err(Error::Bye(information.map(|s| s.to_string()).unwrap_or_default())),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(session)
    }

    /// Authenticates with LOGIN and refreshes the capability list.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the server refuses the credentials.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if self.capabilities.contains(&Capability::LoginDisabled) {
            return Err(Error::Auth("server advertises LOGINDISABLED".to_string()));
        }

        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        // Capabilities change after authentication; drop the pre-login set
        // unless the completion carries a fresh one.
        self.capabilities.clear();
        match self.execute(&command, |_| {}) {
            Ok(_) => {}
            Err(Error::No(text) | Error::Bad(text)) => return Err(Error::Auth(text)),
            Err(err) => return Err(err),
        }
        tracing::info!(username, "authenticated");

        if self.capabilities.is_empty() {
            self.execute(&Command::Capability, |_| {})?;
        }
        Ok(())
    }

    /// Returns true if the server advertised the capability.
    #[must_use]
    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.framed.get_ref()
    }

    /// Sends a command and reads responses up to its tagged completion.
    ///
    /// Untagged responses that parse are handed to `on_data`; capability
    /// updates are absorbed. Untagged lines `imap-proto` cannot parse are
    /// skipped, since servers send extension data this library never asks for.
    fn execute<F>(&mut self, command: &Command, mut on_data: F) -> Result<Completion>
    where
        F: FnMut(Response<'_>),
    {
        command.check()?;
        let tag = self.tags.next_tag();
        tracing::trace!(tag, command = command.name(), "send");
        let bytes = command.serialize(&tag);
        let mut chunks = literal_chunks(&bytes);
        let last = chunks.pop().unwrap_or_default();
        for chunk in chunks {
            self.framed.write_command(chunk)?;
            self.await_continuation(&tag)?;
        }
        self.framed.write_command(last)?;

        let mut transcript = Vec::new();
        loop {
            let raw = self.framed.read_response()?;
            transcript.extend_from_slice(&raw);

            if is_tagged(&raw, &tag) {
                return self.complete(&raw, &tag, transcript);
            }

            let response = match parser::parse_response(&raw) {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!(%err, "skipping unparsed untagged response");
                    continue;
                }
            };

            match response {
                Response::Capabilities(caps) => {
                    self.capabilities = caps.iter().map(parser::capability).collect();
                }
                Response::Data {
                    status: Status::Bye,
                    information,
                    ..
                } if !matches!(command, Command::Logout) => {
                    let text = information.map(|s| s.to_string()).unwrap_or_default();
                    tracing::info!(text, "BYE");
                    return Err(Error::Bye(text));
                }
                Response::Data {
                    code: Some(ResponseCode::Alert),
                    information,
                    ..
                } => {
                    tracing::warn!(text = information.as_deref().unwrap_or_default(), "ALERT");
                }
                Response::Continue { .. } => {
                    return Err(Error::Protocol(format!(
                        "unexpected continuation request for {}",
                        command.name()
                    )));
                }
                other => on_data(other),
            }
        }
    }

    /// Waits for the `+` that lets the client send the next literal.
    ///
    /// Untagged data before it is dropped. A tagged completion means the
    /// server refused the command before the literal was sent.
    fn await_continuation(&mut self, tag: &str) -> Result<()> {
        loop {
            let raw = self.framed.read_response()?;
            if raw.starts_with(b"+") {
                return Ok(());
            }
            if is_tagged(&raw, tag) {
                self.complete(&raw, tag, Vec::new())?;
                return Err(Error::Protocol(
                    "command completed before its literal was sent".to_string(),
                ));
            }
            tracing::debug!("untagged response while waiting for continuation");
        }
    }

    /// Interprets the tagged completion line.
    fn complete(&mut self, raw: &[u8], tag: &str, transcript: Vec<u8>) -> Result<Completion> {
        let (status, code, text) = match parser::parse_response(raw) {
            Ok(Response::Done {
                status,
                code,
                information,
                ..
            }) => (
                status,
                code.map(ResponseCode::into_owned),
                information.map(|s| s.to_string()).unwrap_or_default(),
            ),
            // Some servers put text in the completion that the grammar
            // rejects; classify by the status word alone.
            _ => fallback_status(raw, tag)?,
        };

        if let Some(ResponseCode::Capabilities(caps)) = &code {
            self.capabilities = caps.iter().map(parser::capability).collect();
        }

        match status {
            Status::Ok => Ok(Completion { code, transcript }),
            Status::No => Err(Error::No(text)),
            Status::Bad => Err(Error::Bad(text)),
            Status::Bye => Err(Error::Bye(text)),
            Status::PreAuth => Err(Error::Protocol(format!("tagged PREAUTH: {text}"))),
        }
    }

    fn store(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        let command = Command::Store {
            uids: uids.clone(),
            action,
            silent: true,
        };
        self.execute(&command, |_| {})?;
        Ok(())
    }

    /// Runs COPY or MOVE and collects the COPYUID mapping from either the
    /// tagged completion (COPY) or an untagged OK (MOVE, RFC 6851).
    fn transfer(&mut self, command: &Command) -> Result<Option<UidMap>> {
        let mut mapping = None;
        let completion = self.execute(command, |response| {
            if let Response::Data {
                status: Status::Ok,
                code: Some(code),
                ..
            } = &response
            {
                mapping = mapping.take().or_else(|| parser::copy_uid(code));
            }
        })?;
        Ok(mapping.or_else(|| completion.code.as_ref().and_then(parser::copy_uid)))
    }
}

/// Splits a serialized command after each literal header.
///
/// Arguments never contain CR or LF, so every CRLF but the last one ends a
/// `{n}` header and the server must answer with a continuation before the
/// following chunk goes out.
fn literal_chunks(bytes: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (i, pair) in bytes.windows(2).enumerate() {
        if pair == b"\r\n" {
            chunks.push(&bytes[start..i + 2]);
            start = i + 2;
        }
    }
    if start < bytes.len() {
        chunks.push(&bytes[start..]);
    }
    chunks
}

fn fallback_status(raw: &[u8], tag: &str) -> Result<(Status, Option<ResponseCode<'static>>, String)> {
    let line = String::from_utf8_lossy(raw);
    let rest = line[tag.len()..].trim();
    let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
    let status = match word.to_ascii_uppercase().as_str() {
        "OK" => Status::Ok,
        "NO" => Status::No,
        "BAD" => Status::Bad,
        "BYE" => Status::Bye,
        _ => return Err(Error::Protocol(format!("malformed completion: {}", line.trim_end()))),
    };
    Ok((status, None, text.to_string()))
}

fn apply_select_code(status: &mut MailboxStatus, code: &ResponseCode<'_>) {
    match code {
        ResponseCode::UidValidity(n) => status.uid_validity = UidValidity::new(*n),
        ResponseCode::UidNext(n) => status.uid_next = Uid::new(*n),
        ResponseCode::Unseen(n) => status.unseen = Some(*n),
        ResponseCode::PermanentFlags(flags) => {
            status.permanent_flags = flags.iter().map(|f| Flag::parse(f)).collect();
        }
        ResponseCode::ReadOnly => status.read_only = true,
        ResponseCode::ReadWrite => status.read_only = false,
        _ => {}
    }
}

impl<S: Read + Write + Send + 'static> Protocol for ImapSession<S> {
    fn select(&mut self, mailbox: &str, mode: AccessMode) -> Result<MailboxStatus> {
        let command = Command::Select {
            mailbox: mailbox.to_string(),
            read_only: mode.is_read_only(),
        };
        let mut status = MailboxStatus {
            read_only: mode.is_read_only(),
            ..MailboxStatus::default()
        };
        let completion = self.execute(&command, |response| match response {
            Response::MailboxData(MailboxDatum::Exists(n)) => status.exists = n,
            Response::MailboxData(MailboxDatum::Recent(n)) => status.recent = n,
            Response::MailboxData(MailboxDatum::Flags(flags)) => {
                status.flags = flags.iter().map(|f| Flag::parse(f)).collect();
            }
            Response::Data {
                code: Some(code), ..
            } => apply_select_code(&mut status, &code),
            _ => {}
        })?;
        if let Some(code) = &completion.code {
            apply_select_code(&mut status, code);
        }
        tracing::debug!(mailbox, %mode, exists = status.exists, "selected");
        Ok(status)
    }

    fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        let command = Command::Search {
            criteria: criteria.clone(),
        };
        let mut uids = Vec::new();
        self.execute(&command, |response| {
            if let Response::MailboxData(MailboxDatum::Search(ids)) = response {
                uids.extend(ids.into_iter().filter_map(Uid::new));
            }
        })?;
        Ok(uids)
    }

    fn fetch(&mut self, uids: &UidSet, attributes: &[FetchAttribute]) -> Result<FetchMap> {
        let mut items = attributes.to_vec();
        if !items.contains(&FetchAttribute::Uid) {
            items.insert(0, FetchAttribute::Uid);
        }
        let command = Command::Fetch {
            uids: uids.clone(),
            items,
        };

        let mut records = FetchMap::new();
        self.execute(&command, |response| {
            if let Response::Fetch(_, attrs) = response
                && let Some(record) = parser::fetch_record(&attrs)
            {
                match records.get_mut(&record.uid) {
                    Some(existing) => existing.merge(record),
                    None => {
                        records.insert(record.uid, record);
                    }
                }
            }
        })?;
        Ok(records)
    }

    fn add_flags(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()> {
        if flags.is_empty() {
            return Ok(());
        }
        self.store(uids, StoreAction::AddFlags(flags.to_vec()))
    }

    fn remove_flags(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()> {
        if flags.is_empty() {
            return Ok(());
        }
        self.store(uids, StoreAction::RemoveFlags(flags.to_vec()))
    }

    fn copy_messages(&mut self, uids: &UidSet, mailbox: &str) -> Result<Option<UidMap>> {
        self.transfer(&Command::Copy {
            uids: uids.clone(),
            mailbox: mailbox.to_string(),
        })
    }

    fn move_messages(&mut self, uids: &UidSet, mailbox: &str) -> Result<Option<UidMap>> {
        if !self.has_capability(&Capability::Move) {
            return Err(Error::Unsupported("MOVE"));
        }
        self.transfer(&Command::Move {
            uids: uids.clone(),
            mailbox: mailbox.to_string(),
        })
    }

    fn expunge(&mut self) -> Result<()> {
        self.execute(&Command::Expunge, |_| {})?;
        Ok(())
    }

    fn list_folders(&mut self) -> Result<Vec<ListResponse>> {
        let command = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        let mut folders = Vec::new();
        self.execute(&command, |response| {
            if let Response::MailboxData(MailboxDatum::List {
                name_attributes,
                delimiter,
                name,
            }) = response
            {
                folders.push(parser::list_response(
                    &name_attributes,
                    delimiter.as_deref(),
                    &name,
                ));
            }
        })?;
        Ok(folders)
    }

    fn folder_status(&mut self, mailbox: &str, items: &[StatusAttribute]) -> Result<Vec<StatusItem>> {
        let command = Command::Status {
            mailbox: mailbox.to_string(),
            items: items.to_vec(),
        };
        let mut result = Vec::new();
        self.execute(&command, |response| {
            if let Response::MailboxData(MailboxDatum::Status { status, .. }) = response {
                result.extend(parser::status_items(&status));
            }
        })?;
        Ok(result)
    }

    fn create_folder(&mut self, mailbox: &str) -> Result<()> {
        self.execute(
            &Command::Create {
                mailbox: mailbox.to_string(),
            },
            |_| {},
        )?;
        Ok(())
    }

    fn delete_folder(&mut self, mailbox: &str) -> Result<()> {
        self.execute(
            &Command::Delete {
                mailbox: mailbox.to_string(),
            },
            |_| {},
        )?;
        Ok(())
    }

    fn rename_folder(&mut self, from: &str, to: &str) -> Result<()> {
        self.execute(
            &Command::Rename {
                from: from.to_string(),
                to: to.to_string(),
            },
            |_| {},
        )?;
        Ok(())
    }

    fn noop(&mut self) -> Result<()> {
        self.execute(&Command::Noop, |_| {})?;
        Ok(())
    }

    fn capabilities(&mut self) -> Result<Vec<Capability>> {
        if self.capabilities.is_empty() {
            self.execute(&Command::Capability, |_| {})?;
        }
        Ok(self.capabilities.clone())
    }

    fn raw_command(&mut self, command: &str) -> Result<Vec<u8>> {
        let completion = self.execute(&Command::Raw(command.to_string()), |_| {})?;
        Ok(completion.transcript)
    }

    fn logout(&mut self) -> Result<()> {
        match self.execute(&Command::Logout, |_| {}) {
            Ok(_) => {}
            // Servers may close right after the untagged BYE.
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {}
            Err(err) => return Err(err),
        }
        tracing::info!("logged out");
        Ok(())
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
    use std::io::{self, Cursor};

    use super::*;

    /// Replays canned server output and records what the client wrote.
    #[derive(Debug)]
    struct Script {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session(server: &str) -> ImapSession<Script> {
        let input = format!("* OK [CAPABILITY IMAP4rev1 MOVE UIDPLUS] ready\r\n{server}");
        ImapSession::from_stream(Script {
            input: Cursor::new(input.into_bytes()),
            written: Vec::new(),
        })
        .unwrap()
    }

    fn written(session: &ImapSession<Script>) -> String {
        String::from_utf8(session.get_ref().written.clone()).unwrap()
    }

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    mod greeting_tests {
        use super::*;

        #[test]
        fn greeting_capabilities() {
            let s = session("");
            assert!(s.has_capability(&Capability::Move));
            assert!(s.has_capability(&Capability::UidPlus));
        }

        #[test]
        fn bye_greeting() {
            let err = ImapSession::from_stream(Script {
                input: Cursor::new(b"* BYE too many connections\r\n".to_vec()),
                written: Vec::new(),
            })
            .unwrap_err();
            assert!(matches!(err, Error::Bye(text) if text == "too many connections"));
        }
    }

    mod login_tests {
        use super::*;

        #[test]
        fn login_refreshes_capabilities() {
            let mut s = session(
                "A0000 OK [CAPABILITY IMAP4rev1 IDLE] Logged in\r\n",
            );
            s.login("user", "pass").unwrap();
            assert!(s.has_capability(&Capability::Idle));
            assert!(!s.has_capability(&Capability::Move));
            assert_eq!(written(&s), "A0000 LOGIN user pass\r\n");
        }

        #[test]
        fn login_queries_capabilities_when_absent() {
            let mut s = session(
                "A0000 OK Logged in\r\n\
                 * CAPABILITY IMAP4rev1 MOVE\r\n\
                 A0001 OK done\r\n",
            );
            s.login("user", "pass").unwrap();
            assert!(s.has_capability(&Capability::Move));
            assert!(written(&s).ends_with("A0001 CAPABILITY\r\n"));
        }

        #[test]
        fn rejected_login_is_auth_error() {
            let mut s = session("A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n");
            let err = s.login("user", "wrong").unwrap_err();
            assert!(matches!(err, Error::Auth(_)));
        }
    }

    mod select_tests {
        use super::*;

        #[test]
        fn select_collects_status() {
            let mut s = session(
                "* 172 EXISTS\r\n\
                 * 1 RECENT\r\n\
                 * OK [UNSEEN 12] Message 12 is first unseen\r\n\
                 * OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
                 * OK [UIDNEXT 4392] Predicted next UID\r\n\
                 * FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
                 * OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n\
                 A0000 OK [READ-WRITE] SELECT completed\r\n",
            );
            let status = s.select("INBOX", AccessMode::ReadWrite).unwrap();
            assert_eq!(status.exists, 172);
            assert_eq!(status.recent, 1);
            assert_eq!(status.unseen, Some(12));
            assert_eq!(status.uid_next, Some(uid(4392)));
            assert_eq!(status.uid_validity.unwrap().get(), 3857529045);
            assert_eq!(status.flags.len(), 5);
            assert!(!status.read_only);
            assert_eq!(written(&s), "A0000 SELECT INBOX\r\n");
        }

        #[test]
        fn examine_is_read_only() {
            let mut s = session("* 3 EXISTS\r\nA0000 OK [READ-ONLY] EXAMINE completed\r\n");
            let status = s.select("Archive", AccessMode::ReadOnly).unwrap();
            assert!(status.read_only);
            assert_eq!(written(&s), "A0000 EXAMINE Archive\r\n");
        }

        #[test]
        fn missing_mailbox_is_no() {
            let mut s = session("A0000 NO Mailbox does not exist\r\n");
            let err = s.select("Nope", AccessMode::ReadOnly).unwrap_err();
            assert!(matches!(err, Error::No(ref text) if text == "Mailbox does not exist"));
        }
    }

    mod message_tests {
        use super::*;

        #[test]
        fn search_returns_uids() {
            let mut s = session("* SEARCH 3 9 4\r\nA0000 OK SEARCH completed\r\n");
            let uids = s.search(&SearchCriteria::All).unwrap();
            assert_eq!(uids, vec![uid(3), uid(9), uid(4)]);
        }

        #[test]
        fn search_with_line_break_is_rejected_unsent() {
            let mut s = session("");
            let err = s
                .search(&SearchCriteria::Subject("x\r\nZ9 DELETE INBOX\r\n".to_string()))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
            assert!(written(&s).is_empty());
        }

        #[test]
        fn non_ascii_search_is_sent_as_literal() {
            let mut s = session(
                "+ Ready for literal data\r\n\
                 * SEARCH 12\r\n\
                 A0000 OK SEARCH completed\r\n",
            );
            let uids = s.search(&SearchCriteria::Subject("Café".to_string())).unwrap();
            assert_eq!(uids, vec![uid(12)]);
            assert_eq!(
                written(&s),
                "A0000 UID SEARCH CHARSET UTF-8 SUBJECT {5}\r\nCafé\r\n"
            );
        }

        #[test]
        fn literal_refused_by_server() {
            let mut s = session("A0000 NO [BADCHARSET (US-ASCII)] charset not supported\r\n");
            let err = s
                .search(&SearchCriteria::Subject("Café".to_string()))
                .unwrap_err();
            assert!(matches!(err, Error::No(_)));
            assert_eq!(written(&s), "A0000 UID SEARCH CHARSET UTF-8 SUBJECT {5}\r\n");
        }

        #[test]
        fn empty_search() {
            let mut s = session("* SEARCH\r\nA0000 OK SEARCH completed\r\n");
            assert!(s.search(&SearchCriteria::Unseen).unwrap().is_empty());
        }

        #[test]
        fn fetch_prepends_uid_and_merges() {
            let mut s = session(
                "* 1 FETCH (UID 7 FLAGS (\\Seen))\r\n\
                 * 1 FETCH (UID 7 RFC822.SIZE 99)\r\n\
                 * 2 FETCH (FLAGS (\\Deleted))\r\n\
                 A0000 OK FETCH completed\r\n",
            );
            let map = s
                .fetch(&UidSet::single(uid(7)), &[FetchAttribute::Flags])
                .unwrap();
            assert_eq!(written(&s), "A0000 UID FETCH 7 (UID FLAGS)\r\n");
            assert_eq!(map.len(), 1);
            let record = &map[&uid(7)];
            assert_eq!(record.size, Some(99));
            assert_eq!(record.flags.as_deref(), Some(&["\\Seen".to_string()][..]));
        }

        #[test]
        fn store_is_silent() {
            let mut s = session("A0000 OK STORE completed\r\n");
            s.add_flags(&UidSet::single(uid(5)), &[Flag::Flagged]).unwrap();
            s.remove_flags(&UidSet::single(uid(5)), &[]).unwrap();
            assert_eq!(written(&s), "A0000 UID STORE 5 +FLAGS.SILENT (\\Flagged)\r\n");
        }

        #[test]
        fn copy_reads_tagged_copyuid() {
            let mut s = session("A0000 OK [COPYUID 38505 42 100] COPY completed\r\n");
            let map = s
                .copy_messages(&UidSet::single(uid(42)), "Archive")
                .unwrap()
                .unwrap();
            assert_eq!(map.get(uid(42)), Some(uid(100)));
        }

        #[test]
        fn move_reads_untagged_copyuid() {
            let mut s = session(
                "* OK [COPYUID 38505 42 100] Moved\r\n\
                 * 1 EXPUNGE\r\n\
                 A0000 OK MOVE completed\r\n",
            );
            let map = s
                .move_messages(&UidSet::single(uid(42)), "Archive")
                .unwrap()
                .unwrap();
            assert_eq!(map.get(uid(42)), Some(uid(100)));
            assert_eq!(written(&s), "A0000 UID MOVE 42 Archive\r\n");
        }

        #[test]
        fn copy_without_uidplus() {
            let mut s = session("A0000 OK COPY completed\r\n");
            assert!(
                s.copy_messages(&UidSet::single(uid(1)), "Trash")
                    .unwrap()
                    .is_none()
            );
        }

        #[test]
        fn move_requires_capability() {
            let mut s = ImapSession::from_stream(Script {
                input: Cursor::new(b"* OK [CAPABILITY IMAP4rev1] ready\r\n".to_vec()),
                written: Vec::new(),
            })
            .unwrap();
            let err = s
                .move_messages(&UidSet::single(uid(1)), "Archive")
                .unwrap_err();
            assert!(matches!(err, Error::Unsupported("MOVE")));
            assert!(written(&s).is_empty());
        }
    }

    mod mailbox_tests {
        use super::*;

        #[test]
        fn list_folders() {
            let mut s = session(
                "* LIST (\\HasNoChildren) \"/\" INBOX\r\n\
                 * LIST (\\HasChildren \\Noselect) \"/\" \"[Gmail]\"\r\n\
                 * LIST (\\HasNoChildren \\Trash) \"/\" \"[Gmail]/Trash\"\r\n\
                 A0000 OK LIST completed\r\n",
            );
            let folders = s.list_folders().unwrap();
            assert_eq!(folders.len(), 3);
            assert_eq!(folders[1].name, "[Gmail]");
            assert!(folders[1].has_attribute(&crate::types::MailboxAttribute::NoSelect));
            assert_eq!(folders[2].name, "[Gmail]/Trash");
        }

        #[test]
        fn status() {
            let mut s = session(
                "* STATUS INBOX (MESSAGES 7 UNSEEN 2 UIDNEXT 44)\r\nA0000 OK STATUS completed\r\n",
            );
            let items = s
                .folder_status("INBOX", &[StatusAttribute::Messages])
                .unwrap();
            assert!(items.contains(&StatusItem::Messages(7)));
            assert!(items.contains(&StatusItem::Unseen(2)));
        }

        #[test]
        fn folder_lifecycle_commands() {
            let mut s = session(
                "A0000 OK CREATE completed\r\n\
                 A0001 OK RENAME completed\r\n\
                 A0002 OK DELETE completed\r\n",
            );
            s.create_folder("Projects").unwrap();
            s.rename_folder("Projects", "Old Projects").unwrap();
            s.delete_folder("Old Projects").unwrap();
            assert_eq!(
                written(&s),
                "A0000 CREATE Projects\r\n\
                 A0001 RENAME Projects \"Old Projects\"\r\n\
                 A0002 DELETE \"Old Projects\"\r\n"
            );
        }
    }

    mod completion_tests {
        use super::*;

        #[test]
        fn bad_is_error() {
            let mut s = session("A0000 BAD Command unknown\r\n");
            assert!(matches!(s.noop().unwrap_err(), Error::Bad(_)));
        }

        #[test]
        fn untagged_bye_aborts() {
            let mut s = session("* BYE Autologout; idle for too long\r\n");
            assert!(matches!(s.noop().unwrap_err(), Error::Bye(_)));
        }

        #[test]
        fn unparsable_untagged_is_skipped() {
            let mut s = session("* XWEIRD ((( garbage\r\nA0000 OK NOOP completed\r\n");
            s.noop().unwrap();
        }

        #[test]
        fn raw_command_returns_transcript() {
            let mut s = session("* QUOTAROOT INBOX \"\"\r\nA0000 OK Getquotaroot completed\r\n");
            let out = s.raw_command("GETQUOTAROOT INBOX").unwrap();
            assert_eq!(
                String::from_utf8(out).unwrap(),
                "* QUOTAROOT INBOX \"\"\r\nA0000 OK Getquotaroot completed\r\n"
            );
        }

        #[test]
        fn raw_command_with_line_break_is_rejected() {
            let mut s = session("");
            let err = s.raw_command("NOOP\r\nA9 DELETE INBOX").unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
            assert!(written(&s).is_empty());
        }

        #[test]
        fn chunks_split_after_literal_headers() {
            assert_eq!(literal_chunks(b"A1 NOOP\r\n"), vec![&b"A1 NOOP\r\n"[..]]);
            assert_eq!(
                literal_chunks(b"A1 X {2}\r\nab {1}\r\nc\r\n"),
                vec![&b"A1 X {2}\r\n"[..], &b"ab {1}\r\n"[..], &b"c\r\n"[..]]
            );
        }

        #[test]
        fn logout_tolerates_bye_and_eof() {
            let mut s = session("* BYE Logging out\r\n");
            s.logout().unwrap();
            assert_eq!(written(&s), "A0000 LOGOUT\r\n");
        }

        #[test]
        fn fallback_status_classifies_word() {
            let (status, code, text) = fallback_status(b"A0001 NO [WEIRD x y] nope\r\n", "A0001").unwrap();
            assert_eq!(status, Status::No);
            assert!(code.is_none());
            assert_eq!(text, "[WEIRD x y] nope");
            assert!(fallback_status(b"A0001 MAYBE\r\n", "A0001").is_err());
        }
    }
}
