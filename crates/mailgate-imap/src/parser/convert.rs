//! Conversion from borrowed `imap-proto` values into owned library types.

use imap_proto::{
    AttributeValue, BodyParams, ContentDisposition, ContentEncoding, MessageSection,
    NameAttribute, ResponseCode, SectionPath, UidSetMember,
};

use crate::types::{Capability, ListResponse, MailboxAttribute, Uid, UidMap, UidValidity};

use super::types::{Address, BodyPart, BodyStructure, Disposition, Envelope, FetchRecord, StatusItem};

/// Builds a record from FETCH attributes.
///
/// Returns `None` when the response carries no UID; such responses are
/// unsolicited flag updates for sequence numbers this session never asked
/// about.
pub fn fetch_record(attrs: &[AttributeValue<'_>]) -> Option<FetchRecord> {
    let uid = attrs.iter().find_map(|attr| match attr {
        AttributeValue::Uid(n) => Uid::new(*n),
        _ => None,
    })?;

    let mut record = FetchRecord::new(uid);
    for attr in attrs {
        match attr {
            AttributeValue::Flags(flags) => {
                record.flags = Some(flags.iter().map(ToString::to_string).collect());
            }
            AttributeValue::Envelope(env) => record.envelope = Some(envelope(env)),
            AttributeValue::Rfc822Size(n) => record.size = Some(*n),
            AttributeValue::InternalDate(date) => record.internal_date = Some(date.to_string()),
            AttributeValue::BodyStructure(body) => {
                record.body_structure = Some(body_structure(body));
            }
            AttributeValue::BodySection {
                section,
                data: Some(data),
                ..
            } => {
                record
                    .sections
                    .insert(section_key(section.as_ref()), data.to_vec());
            }
            AttributeValue::Rfc822(Some(data)) => {
                record.sections.insert(String::new(), data.to_vec());
            }
            _ => {}
        }
    }
    Some(record)
}

/// Renders a section path the way it is written in a FETCH command.
fn section_key(section: Option<&SectionPath>) -> String {
    match section {
        None => String::new(),
        Some(SectionPath::Full(text)) => message_section(text).to_string(),
        Some(SectionPath::Part(path, text)) => {
            let mut key = path
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(".");
            if let Some(text) = text {
                key.push('.');
                key.push_str(message_section(text));
            }
            key
        }
    }
}

const fn message_section(section: &MessageSection) -> &'static str {
    match section {
        MessageSection::Header => "HEADER",
        MessageSection::Mime => "MIME",
        MessageSection::Text => "TEXT",
    }
}

/// Converts an envelope.
pub fn envelope(env: &imap_proto::Envelope<'_>) -> Envelope {
    Envelope {
        date: bytes(env.date.as_deref()),
        subject: bytes(env.subject.as_deref()),
        from: addresses(env.from.as_deref()),
        sender: addresses(env.sender.as_deref()),
        reply_to: addresses(env.reply_to.as_deref()),
        to: addresses(env.to.as_deref()),
        cc: addresses(env.cc.as_deref()),
        bcc: addresses(env.bcc.as_deref()),
        in_reply_to: bytes(env.in_reply_to.as_deref()),
        message_id: bytes(env.message_id.as_deref()),
    }
}

fn bytes(value: Option<&[u8]>) -> Option<Vec<u8>> {
    value.map(<[u8]>::to_vec)
}

fn addresses(list: Option<&[imap_proto::Address<'_>]>) -> Vec<Address> {
    list.unwrap_or_default()
        .iter()
        .map(|addr| Address {
            name: bytes(addr.name.as_deref()),
            adl: bytes(addr.adl.as_deref()),
            mailbox: bytes(addr.mailbox.as_deref()),
            host: bytes(addr.host.as_deref()),
        })
        .collect()
}

/// Converts a BODYSTRUCTURE tree.
pub fn body_structure(body: &imap_proto::BodyStructure<'_>) -> BodyStructure {
    use imap_proto::BodyStructure as Proto;

    match body {
        Proto::Basic { common, other, .. } => BodyStructure::Basic(body_part(common, other)),
        Proto::Text {
            common,
            other,
            lines,
            ..
        } => BodyStructure::Text {
            part: body_part(common, other),
            lines: *lines,
        },
        Proto::Message {
            common,
            other,
            envelope: env,
            body,
            lines,
            ..
        } => BodyStructure::Message {
            part: body_part(common, other),
            envelope: Box::new(envelope(env)),
            body: Box::new(body_structure(body)),
            lines: *lines,
        },
        Proto::Multipart { common, bodies, .. } => BodyStructure::Multipart {
            subtype: common.ty.subtype.to_string(),
            params: params(&common.ty.params),
            bodies: bodies.iter().map(body_structure).collect(),
            disposition: common.disposition.as_ref().map(disposition),
        },
    }
}

fn body_part(
    common: &imap_proto::BodyContentCommon<'_>,
    other: &imap_proto::BodyContentSinglePart<'_>,
) -> BodyPart {
    BodyPart {
        media_type: common.ty.ty.to_string(),
        subtype: common.ty.subtype.to_string(),
        params: params(&common.ty.params),
        id: other.id.as_ref().map(ToString::to_string),
        description: other.description.as_ref().map(ToString::to_string),
        encoding: encoding(&other.transfer_encoding),
        size: other.octets,
        disposition: common.disposition.as_ref().map(disposition),
    }
}

fn params(params: &BodyParams<'_>) -> Vec<(String, String)> {
    params
        .as_ref()
        .map(|list| {
            list.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn disposition(disposition: &ContentDisposition<'_>) -> Disposition {
    Disposition {
        kind: disposition.ty.to_string(),
        params: params(&disposition.params),
    }
}

fn encoding(encoding: &ContentEncoding<'_>) -> String {
    match encoding {
        ContentEncoding::SevenBit => "7BIT".to_string(),
        ContentEncoding::EightBit => "8BIT".to_string(),
        ContentEncoding::Binary => "BINARY".to_string(),
        ContentEncoding::Base64 => "BASE64".to_string(),
        ContentEncoding::QuotedPrintable => "QUOTED-PRINTABLE".to_string(),
        ContentEncoding::Other(other) => other.to_string(),
    }
}

/// Converts a LIST response.
pub fn list_response(
    attributes: &[NameAttribute<'_>],
    delimiter: Option<&str>,
    name: &str,
) -> ListResponse {
    ListResponse {
        attributes: attributes.iter().map(name_attribute).collect(),
        delimiter: delimiter.map(ToString::to_string),
        name: name.to_string(),
    }
}

fn name_attribute(attribute: &NameAttribute<'_>) -> MailboxAttribute {
    match attribute {
        NameAttribute::NoInferiors => MailboxAttribute::NoInferiors,
        NameAttribute::NoSelect => MailboxAttribute::NoSelect,
        NameAttribute::Marked => MailboxAttribute::Marked,
        NameAttribute::Unmarked => MailboxAttribute::Unmarked,
        NameAttribute::All => MailboxAttribute::All,
        NameAttribute::Archive => MailboxAttribute::Archive,
        NameAttribute::Drafts => MailboxAttribute::Drafts,
        NameAttribute::Flagged => MailboxAttribute::Flagged,
        NameAttribute::Junk => MailboxAttribute::Junk,
        NameAttribute::Sent => MailboxAttribute::Sent,
        NameAttribute::Trash => MailboxAttribute::Trash,
        NameAttribute::Extension(raw) => MailboxAttribute::parse(raw),
        other => MailboxAttribute::Unknown(format!("{other:?}")),
    }
}

/// Converts STATUS attributes, dropping those this library does not model.
pub fn status_items(attributes: &[imap_proto::StatusAttribute]) -> Vec<StatusItem> {
    use imap_proto::StatusAttribute as Proto;

    attributes
        .iter()
        .filter_map(|attr| match attr {
            Proto::Messages(n) => Some(StatusItem::Messages(*n)),
            Proto::Recent(n) => Some(StatusItem::Recent(*n)),
            Proto::Unseen(n) => Some(StatusItem::Unseen(*n)),
            Proto::UidNext(n) => Uid::new(*n).map(StatusItem::UidNext),
            Proto::UidValidity(n) => UidValidity::new(*n).map(StatusItem::UidValidity),
            _ => None,
        })
        .collect()
}

/// Converts a capability.
pub fn capability(capability: &imap_proto::Capability<'_>) -> Capability {
    match capability {
        imap_proto::Capability::Imap4rev1 => Capability::Imap4Rev1,
        imap_proto::Capability::Auth(mechanism) => Capability::Auth(mechanism.to_string()),
        imap_proto::Capability::Atom(atom) => Capability::parse(atom),
    }
}

/// Extracts the mapping from a `[COPYUID ...]` response code.
pub fn copy_uid(code: &ResponseCode<'_>) -> Option<UidMap> {
    match code {
        ResponseCode::CopyUid(validity, source, destination) => {
            UidMap::from_ranges(*validity, &ranges(source), &ranges(destination))
        }
        _ => None,
    }
}

fn ranges(members: &[UidSetMember]) -> Vec<std::ops::RangeInclusive<u32>> {
    members
        .iter()
        .map(|member| match member {
            UidSetMember::Uid(n) => *n..=*n,
            UidSetMember::UidRange(range) => range.clone(),
        })
        .collect()
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
    use imap_proto::{MailboxDatum, Response};

    use super::*;

    fn fetch(input: &[u8]) -> FetchRecord {
        match Response::from_bytes(input).unwrap().1 {
            Response::Fetch(_, attrs) => fetch_record(&attrs).unwrap(),
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    mod fetch_tests {
        use super::*;

        #[test]
        fn basic_attributes() {
            let record = fetch(
                b"* 1 FETCH (UID 42 FLAGS (\\Seen $Custom) RFC822.SIZE 1024 \
                  INTERNALDATE \"17-Jul-1996 02:44:25 -0700\")\r\n",
            );
            assert_eq!(record.uid.get(), 42);
            assert_eq!(
                record.flags.unwrap(),
                vec!["\\Seen".to_string(), "$Custom".to_string()]
            );
            assert_eq!(record.size, Some(1024));
            assert_eq!(
                record.internal_date.as_deref(),
                Some("17-Jul-1996 02:44:25 -0700")
            );
        }

        #[test]
        fn missing_uid_is_skipped() {
            let (_, resp) = Response::from_bytes(b"* 3 FETCH (FLAGS (\\Seen))\r\n").unwrap();
            match resp {
                Response::Fetch(_, attrs) => assert!(fetch_record(&attrs).is_none()),
                other => panic!("expected FETCH, got {other:?}"),
            }
        }

        #[test]
        fn body_section_literal() {
            let record = fetch(b"* 1 FETCH (UID 9 BODY[1.2] {5}\r\nhello)\r\n");
            assert_eq!(record.section("1.2"), Some(&b"hello"[..]));
        }

        #[test]
        fn nil_section_is_absent() {
            let record = fetch(b"* 1 FETCH (UID 9 BODY[2] NIL)\r\n");
            assert!(record.section("2").is_none());
        }

        #[test]
        fn envelope_fields() {
            let record = fetch(
                b"* 1 FETCH (UID 5 ENVELOPE (\"Mon, 1 Jan 2024 10:00:00 +0000\" \
                  \"=?UTF-8?B?SGVsbG8=?=\" ((\"Alice\" NIL \"alice\" \"example.com\")) \
                  NIL NIL ((NIL NIL \"bob\" \"example.org\")) NIL NIL \
                  \"<parent@example.com>\" \"<msg@example.com>\"))\r\n",
            );
            let env = record.envelope.unwrap();
            assert_eq!(env.subject.as_deref(), Some(&b"=?UTF-8?B?SGVsbG8=?="[..]));
            assert_eq!(env.from.len(), 1);
            assert_eq!(env.from[0].name.as_deref(), Some(&b"Alice"[..]));
            assert_eq!(env.from[0].host.as_deref(), Some(&b"example.com"[..]));
            assert!(env.to[0].name.is_none());
            assert!(env.cc.is_empty());
            assert_eq!(env.message_id.as_deref(), Some(&b"<msg@example.com>"[..]));
            assert_eq!(
                env.in_reply_to.as_deref(),
                Some(&b"<parent@example.com>"[..])
            );
        }
    }

    mod body_structure_tests {
        use super::*;

        const NESTED: &[u8] = b"* 1569 FETCH (UID 7 BODYSTRUCTURE (((\
            (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"ISO-8859-1\") NIL NIL \"QUOTED-PRINTABLE\" 833 30 NIL NIL NIL)\
            (\"TEXT\" \"HTML\" (\"CHARSET\" \"ISO-8859-1\") NIL NIL \"QUOTED-PRINTABLE\" 3412 62 NIL (\"INLINE\" NIL) NIL) \
            \"ALTERNATIVE\" (\"BOUNDARY\" \"2__=fgrths\") NIL NIL)\
            (\"IMAGE\" \"GIF\" (\"NAME\" \"485039.gif\") \"<2__=lgkfjr>\" NIL \"BASE64\" 64 NIL (\"INLINE\" (\"FILENAME\" \"485039.gif\")) NIL) \
            \"RELATED\" (\"BOUNDARY\" \"1__=fgrths\") NIL NIL)\
            (\"APPLICATION\" \"PDF\" (\"NAME\" \"title.pdf\") \"<1__=lgkfjr>\" NIL \"BASE64\" 333980 NIL (\"ATTACHMENT\" (\"FILENAME\" \"title.pdf\")) NIL) \
            \"MIXED\" (\"BOUNDARY\" \"0__=fgrths\") NIL NIL))\r\n";

        #[test]
        fn nested_multipart() {
            let record = fetch(NESTED);
            let BodyStructure::Multipart {
                subtype, bodies, ..
            } = record.body_structure.unwrap()
            else {
                panic!("expected multipart");
            };
            assert_eq!(subtype, "MIXED");
            assert_eq!(bodies.len(), 2);

            let pdf = bodies[1].part().unwrap();
            assert_eq!(pdf.mime_type(), "application/pdf");
            assert_eq!(pdf.encoding, "BASE64");
            assert_eq!(pdf.size, 333980);
            assert_eq!(pdf.id.as_deref(), Some("<1__=lgkfjr>"));
            let disposition = pdf.disposition.as_ref().unwrap();
            assert!(disposition.is_attachment());
            assert_eq!(disposition.param("filename"), Some("title.pdf"));
        }

        #[test]
        fn single_text_part() {
            let record = fetch(
                b"* 15 FETCH (UID 1 BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"iso-8859-1\") \
                  NIL NIL \"QUOTED-PRINTABLE\" 1315 42 NIL NIL NIL NIL))\r\n",
            );
            match record.body_structure.unwrap() {
                BodyStructure::Text { part, lines } => {
                    assert_eq!(lines, 42);
                    assert_eq!(part.param("charset"), Some("iso-8859-1"));
                    assert_eq!(part.encoding, "QUOTED-PRINTABLE");
                    assert!(part.disposition.is_none());
                }
                other => panic!("expected text part, got {other:?}"),
            }
        }
    }

    mod mailbox_tests {
        use super::*;

        #[test]
        fn list_attributes() {
            let (_, resp) =
                Response::from_bytes(b"* LIST (\\HasNoChildren \\Trash) \"/\" Trash\r\n").unwrap();
            let Response::MailboxData(MailboxDatum::List {
                name_attributes,
                delimiter,
                name,
            }) = resp
            else {
                panic!("expected LIST");
            };
            let list = list_response(&name_attributes, delimiter.as_deref(), &name);
            assert_eq!(list.name, "Trash");
            assert_eq!(list.delimiter.as_deref(), Some("/"));
            assert!(list.has_attribute(&MailboxAttribute::HasNoChildren));
            assert!(list.has_attribute(&MailboxAttribute::Trash));
        }

        #[test]
        fn status_attributes() {
            let (_, resp) =
                Response::from_bytes(b"* STATUS INBOX (MESSAGES 7 UNSEEN 2 UIDNEXT 44)\r\n")
                    .unwrap();
            let Response::MailboxData(MailboxDatum::Status { status, .. }) = resp else {
                panic!("expected STATUS");
            };
            assert_eq!(
                status_items(&status),
                vec![
                    StatusItem::Messages(7),
                    StatusItem::Unseen(2),
                    StatusItem::UidNext(Uid::new(44).unwrap()),
                ]
            );
        }
    }

    mod copy_uid_tests {
        use super::*;

        #[test]
        fn tagged_copyuid() {
            let (_, resp) =
                Response::from_bytes(b"A0003 OK [COPYUID 38505 42 100] Done\r\n").unwrap();
            let Response::Done {
                code: Some(code), ..
            } = resp
            else {
                panic!("expected tagged OK with code");
            };
            let map = copy_uid(&code).unwrap();
            assert_eq!(
                map.get(Uid::new(42).unwrap()),
                Some(Uid::new(100).unwrap())
            );
        }

        #[test]
        fn other_codes_are_ignored() {
            assert!(copy_uid(&ResponseCode::ReadOnly).is_none());
        }
    }

    #[test]
    fn capabilities() {
        assert_eq!(
            capability(&imap_proto::Capability::Imap4rev1),
            Capability::Imap4Rev1
        );
        assert_eq!(
            capability(&imap_proto::Capability::Atom("MOVE".into())),
            Capability::Move
        );
        assert_eq!(
            capability(&imap_proto::Capability::Auth("PLAIN".into())),
            Capability::Auth("PLAIN".to_string())
        );
    }
}
