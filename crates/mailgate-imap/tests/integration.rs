//! Integration tests for the IMAP session.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor, Read, Write};

use mailgate_imap::parser::parse_response;
use mailgate_imap::{
    AccessMode, BodyStructure, Capability, FetchAttribute, Flag, ImapSession, Protocol,
    SearchCriteria, Uid, UidSet,
};

/// Mock stream that returns predefined responses.
#[derive(Debug)]
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the session.
    sent: Vec<u8>,
}

impl MockStream {
    fn new(responses: &[u8]) -> Self {
        Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Vec::new(),
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.responses.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn sent(session: &ImapSession<MockStream>) -> String {
    String::from_utf8(session.get_ref().sent.clone()).unwrap()
}

fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

#[test]
fn test_parser_capability() {
    let parsed = parse_response(b"* CAPABILITY IMAP4rev1 IDLE NAMESPACE\r\n").unwrap();
    assert!(matches!(parsed, imap_proto::Response::Capabilities(caps) if caps.len() == 3));
}

#[test]
fn test_parser_exists() {
    let parsed = parse_response(b"* 23 EXISTS\r\n").unwrap();
    assert!(matches!(
        parsed,
        imap_proto::Response::MailboxData(imap_proto::MailboxDatum::Exists(23))
    ));
}

#[test]
fn test_full_session() {
    let script = b"* OK [CAPABILITY IMAP4rev1 UIDPLUS] Service Ready\r\n\
        A0000 OK [CAPABILITY IMAP4rev1 UIDPLUS MOVE] Logged in\r\n\
        * 4 EXISTS\r\n\
        * OK [UIDVALIDITY 1] UIDs valid\r\n\
        * OK [UIDNEXT 12] Predicted next UID\r\n\
        A0001 OK [READ-WRITE] SELECT completed\r\n\
        * SEARCH 11 3 7\r\n\
        A0002 OK SEARCH completed\r\n\
        * 3 FETCH (UID 11 FLAGS (\\Seen $Label1) RFC822.SIZE 2048 \
        INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" \
        BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"US-ASCII\") NIL NIL \"7BIT\" 3028 92))\r\n\
        A0003 OK FETCH completed\r\n\
        A0004 OK STORE completed\r\n\
        * OK [COPYUID 1 11 20] Moved\r\n\
        * 3 EXPUNGE\r\n\
        A0005 OK MOVE completed\r\n\
        * BYE logging out\r\n\
        A0006 OK LOGOUT completed\r\n";

    let mut session = ImapSession::from_stream(MockStream::new(script)).unwrap();
    session.login("user@example.com", "secret").unwrap();
    assert!(session.has_capability(&Capability::Move));

    let status = session.select("INBOX", AccessMode::ReadWrite).unwrap();
    assert_eq!(status.exists, 4);
    assert_eq!(status.uid_next, Some(uid(12)));

    let uids = session.search(&SearchCriteria::All).unwrap();
    assert_eq!(uids, vec![uid(11), uid(3), uid(7)]);

    let records = session
        .fetch(
            &UidSet::single(uid(11)),
            &[
                FetchAttribute::Flags,
                FetchAttribute::Rfc822Size,
                FetchAttribute::InternalDate,
                FetchAttribute::BodyStructure,
            ],
        )
        .unwrap();
    let record = &records[&uid(11)];
    assert_eq!(record.size, Some(2048));
    assert_eq!(
        record.internal_date.as_deref(),
        Some("17-Jul-1996 02:44:25 -0700")
    );
    assert!(matches!(
        record.body_structure,
        Some(BodyStructure::Text { lines: 92, .. })
    ));

    session
        .add_flags(&UidSet::single(uid(11)), &[Flag::Flagged])
        .unwrap();

    let mapping = session
        .move_messages(&UidSet::single(uid(11)), "Archive")
        .unwrap()
        .unwrap();
    assert_eq!(mapping.get(uid(11)), Some(uid(20)));

    session.logout().unwrap();

    let transcript = sent(&session);
    let lines: Vec<&str> = transcript.split_terminator("\r\n").collect();
    assert_eq!(
        lines,
        vec![
            "A0000 LOGIN user@example.com secret",
            "A0001 SELECT INBOX",
            "A0002 UID SEARCH ALL",
            "A0003 UID FETCH 11 (UID FLAGS RFC822.SIZE INTERNALDATE BODYSTRUCTURE)",
            "A0004 UID STORE 11 +FLAGS.SILENT (\\Flagged)",
            "A0005 UID MOVE 11 Archive",
            "A0006 LOGOUT",
        ]
    );
}

#[test]
fn test_fetch_body_literal() {
    let script = b"* OK ready\r\n\
        * 1 FETCH (UID 5 BODY[1] {11}\r\nhello\r\nworld)\r\n\
        A0000 OK FETCH completed\r\n";

    let mut session = ImapSession::from_stream(MockStream::new(script)).unwrap();
    let records = session
        .fetch(
            &UidSet::single(uid(5)),
            &[FetchAttribute::peek_section("1")],
        )
        .unwrap();
    assert_eq!(records[&uid(5)].section("1"), Some(&b"hello\r\nworld"[..]));
    assert_eq!(sent(&session), "A0000 UID FETCH 5 (UID BODY.PEEK[1])\r\n");
}

#[test]
fn test_copy_without_copyuid() {
    let script = b"* OK ready\r\nA0000 OK COPY completed\r\n";
    let mut session = ImapSession::from_stream(MockStream::new(script)).unwrap();
    let mapping = session
        .copy_messages(&UidSet::single(uid(2)), "Trash")
        .unwrap();
    assert!(mapping.is_none());
}

#[test]
fn test_flags_parsing() {
    assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
    assert_eq!(Flag::parse("\\Flagged"), Flag::Flagged);
    assert_eq!(Flag::parse("\\Deleted"), Flag::Deleted);
    assert_eq!(Flag::parse("\\Draft"), Flag::Draft);
    assert_eq!(Flag::parse("\\Answered"), Flag::Answered);
    assert_eq!(Flag::parse("\\Recent"), Flag::Recent);

    match Flag::parse("$Important") {
        Flag::Keyword(s) => assert_eq!(s, "$Important"),
        _ => panic!("Expected keyword flag"),
    }
}

#[test]
fn test_capability_parsing() {
    assert!(matches!(
        Capability::parse("IMAP4rev1"),
        Capability::Imap4Rev1
    ));
    assert!(matches!(Capability::parse("MOVE"), Capability::Move));

    match Capability::parse("AUTH=PLAIN") {
        Capability::Auth(mech) => assert_eq!(mech, "PLAIN"),
        _ => panic!("Expected AUTH capability"),
    }
}
