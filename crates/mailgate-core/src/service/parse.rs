//! Conversion of protocol responses into domain records.
//!
//! Everything here is pure and infallible: malformed input degrades to
//! lossy text or an absent field rather than an error.

use chrono::{DateTime, FixedOffset};
use mailgate_imap::{
    BodyPart, BodyStructure, Envelope, FetchRecord, ListResponse, MailboxAttribute, StatusItem, Uid,
};
use mailgate_mime::encoding::{decode_charset, decode_header};
use mailgate_mime::utf7::decode_mailbox_name;
use mailgate_mime::{TransferEncoding, decode_text_part};

use crate::model::{
    Address, AttachmentMetadata, ContentDescriptor, FlagSet, FolderDescriptor, FolderStatusRecord,
    MessageRecord,
};

/// Decodes an optional header value, RFC 2047 encoded words included.
#[must_use]
pub fn decode_text(raw: Option<&[u8]>) -> String {
    raw.map(|bytes| decode_header(bytes).trim().to_string())
        .unwrap_or_default()
}

/// Converts one envelope address.
///
/// Group markers (no host) are skipped.
#[must_use]
pub fn parse_address(address: &mailgate_imap::Address) -> Option<Address> {
    let host = address.host.as_deref()?;
    let mailbox = address.mailbox.as_deref().unwrap_or_default();
    let name = address
        .name
        .as_deref()
        .map(|raw| decode_header(raw).trim().to_string())
        .filter(|name| !name.is_empty());

    Some(Address {
        name,
        mailbox: String::from_utf8_lossy(mailbox).into_owned(),
        host: String::from_utf8_lossy(host).into_owned(),
    })
}

/// Converts an envelope address list.
#[must_use]
pub fn parse_addresses(addresses: &[mailgate_imap::Address]) -> Vec<Address> {
    addresses.iter().filter_map(parse_address).collect()
}

/// Converts a LIST entry.
#[must_use]
pub fn folder_descriptor(entry: &ListResponse) -> FolderDescriptor {
    FolderDescriptor {
        name: decode_mailbox_name(&entry.name),
        has_children: !entry.has_attribute(&MailboxAttribute::HasNoChildren),
        flags: entry
            .attributes
            .iter()
            .map(|attr| attr.as_str().to_string())
            .collect(),
    }
}

/// Converts STATUS items; missing counters are zero.
#[must_use]
pub fn status_record(items: &[StatusItem]) -> FolderStatusRecord {
    let mut record = FolderStatusRecord::default();
    for item in items {
        match item {
            StatusItem::Messages(n) => record.message_count = *n,
            StatusItem::Unseen(n) => record.unseen_count = *n,
            StatusItem::UidNext(uid) => record.uid_next = Some(*uid),
            StatusItem::Recent(_) | StatusItem::UidValidity(_) => {}
        }
    }
    record
}

/// Parses an INTERNALDATE such as `17-Jul-1996 02:44:25 -0700`.
#[must_use]
pub fn parse_internal_date(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(date.trim(), "%d-%b-%Y %H:%M:%S %z").ok()
}

/// Builds a message record from fetched data.
///
/// Attachments are only reported when requested and the structure was
/// fetched; `Some(vec![])` means the message has none.
#[must_use]
pub fn message_record(mailbox: &str, record: &FetchRecord, include_attachments: bool) -> MessageRecord {
    let empty = Envelope::default();
    let envelope = record.envelope.as_ref().unwrap_or(&empty);
    let uid = record.uid;

    let message_id = header_token(envelope.message_id.as_deref())
        .unwrap_or_else(|| format!("<{uid}@{mailbox}>"));

    MessageRecord {
        uid,
        mailbox: mailbox.to_string(),
        message_id,
        from: envelope
            .from
            .iter()
            .find_map(parse_address)
            .unwrap_or_else(Address::unknown),
        to: parse_addresses(&envelope.to),
        cc: parse_addresses(&envelope.cc),
        subject: decode_text(envelope.subject.as_deref()),
        date: record.internal_date.as_deref().and_then(parse_internal_date),
        flags: FlagSet::parse(record.flags.iter().flatten()),
        size: record.size.unwrap_or(0),
        in_reply_to: header_token(envelope.in_reply_to.as_deref()),
        body_text: None,
        body_html: None,
        attachments: if include_attachments {
            record
                .body_structure
                .as_ref()
                .map(|structure| attachments(structure, mailbox, uid))
        } else {
            None
        },
    }
}

fn header_token(raw: Option<&[u8]>) -> Option<String> {
    raw.map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|value| !value.is_empty())
}

/// A leaf of the structure tree with its section path.
#[derive(Debug, Clone, Copy)]
struct Leaf<'a> {
    node: &'a BodyStructure,
    part: &'a BodyPart,
}

/// Visits every leaf in section-path order. `message/rfc822` parts are
/// leaves; their inner structure is not entered.
fn walk<'a>(node: &'a BodyStructure, path: &str, visit: &mut impl FnMut(String, Leaf<'a>)) {
    match node {
        BodyStructure::Multipart { bodies, .. } => {
            for (i, child) in bodies.iter().enumerate() {
                let child_path = if path.is_empty() {
                    (i + 1).to_string()
                } else {
                    format!("{path}.{}", i + 1)
                };
                walk(child, &child_path, visit);
            }
        }
        BodyStructure::Basic(part)
        | BodyStructure::Text { part, .. }
        | BodyStructure::Message { part, .. } => {
            let path = if path.is_empty() { "1" } else { path };
            visit(path.to_string(), Leaf { node, part });
        }
    }
}

fn filename(part: &BodyPart) -> Option<String> {
    let disposition = part.disposition.as_ref();
    let plain = disposition
        .and_then(|d| d.param("filename"))
        .or_else(|| part.param("name"));
    if let Some(name) = plain {
        return Some(decode_header(name.as_bytes()));
    }

    disposition
        .and_then(|d| d.param("filename*"))
        .or_else(|| part.param("name*"))
        .map(decode_extended_value)
}

/// Decodes an RFC 2231 extended value: `charset'language'percent-encoded`.
fn decode_extended_value(value: &str) -> String {
    let mut fields = value.splitn(3, '\'');
    let (Some(charset), Some(_language), Some(encoded)) = (fields.next(), fields.next(), fields.next())
    else {
        return value.to_string();
    };

    let mut bytes = Vec::with_capacity(encoded.len());
    let mut input = encoded.bytes();
    while let Some(b) = input.next() {
        if b == b'%' {
            let hex = [input.next().unwrap_or(b'0'), input.next().unwrap_or(b'0')];
            let decoded = std::str::from_utf8(&hex)
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            match decoded {
                Some(byte) => bytes.push(byte),
                None => {
                    bytes.push(b'%');
                    bytes.extend_from_slice(&hex);
                }
            }
        } else {
            bytes.push(b);
        }
    }

    decode_charset(&bytes, Some(charset))
}

fn is_attachment(leaf: Leaf<'_>) -> bool {
    if leaf
        .part
        .disposition
        .as_ref()
        .is_some_and(mailgate_imap::Disposition::is_attachment)
    {
        return true;
    }
    if filename(leaf.part).is_some() {
        return true;
    }
    !matches!(leaf.node, BodyStructure::Text { .. })
}

fn content_descriptor(part: &BodyPart) -> ContentDescriptor {
    ContentDescriptor {
        mime_type: part.mime_type(),
        filename: filename(part),
        size: part.size,
        encoding: part.encoding.to_ascii_lowercase(),
        content_id: part
            .id
            .as_deref()
            .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').to_string()),
        disposition: part
            .disposition
            .as_ref()
            .map(|d| d.kind.to_ascii_lowercase()),
    }
}

/// Lists the attachment parts of a message.
///
/// A leaf counts as an attachment when its disposition is `attachment`,
/// when it carries a file name, or when it is not text.
#[must_use]
pub fn attachments(structure: &BodyStructure, mailbox: &str, uid: Uid) -> Vec<AttachmentMetadata> {
    let mut found = Vec::new();
    walk(structure, "", &mut |path, leaf| {
        if is_attachment(leaf) {
            found.push(AttachmentMetadata {
                mailbox: mailbox.to_string(),
                uid,
                part: path,
                content: content_descriptor(leaf.part),
            });
        }
    });
    found
}

/// A text leaf chosen as a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart<'a> {
    /// Section path to fetch.
    pub path: String,
    /// Part fields, for decoding.
    pub part: &'a BodyPart,
}

impl TextPart<'_> {
    /// Reverses the transfer encoding and converts the charset.
    #[must_use]
    pub fn decode(&self, data: &[u8]) -> String {
        decode_text_part(
            data,
            TransferEncoding::parse(&self.part.encoding),
            self.part.param("charset"),
        )
    }
}

/// The first inline `text/plain` and `text/html` leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextParts<'a> {
    /// Plain-text body part.
    pub plain: Option<TextPart<'a>>,
    /// HTML body part.
    pub html: Option<TextPart<'a>>,
}

impl TextParts<'_> {
    /// Section paths to fetch, plain first.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.plain
            .iter()
            .chain(self.html.iter())
            .map(|p| p.path.clone())
            .collect()
    }
}

/// Finds the body parts to display.
#[must_use]
pub fn text_parts(structure: &BodyStructure) -> TextParts<'_> {
    let mut parts = TextParts::default();
    walk(structure, "", &mut |path, leaf| {
        if !matches!(leaf.node, BodyStructure::Text { .. }) || is_attachment(leaf) {
            return;
        }
        let slot = if leaf.part.subtype.eq_ignore_ascii_case("plain") {
            &mut parts.plain
        } else if leaf.part.subtype.eq_ignore_ascii_case("html") {
            &mut parts.html
        } else {
            return;
        };
        if slot.is_none() {
            *slot = Some(TextPart {
                path,
                part: leaf.part,
            });
        }
    });
    parts
}

/// Looks up a part by section path (`"1"`, `"2.3"`).
///
/// Paths below a `message/rfc822` part address the encapsulated message.
#[must_use]
pub fn find_part<'a>(structure: &'a BodyStructure, path: &str) -> Option<&'a BodyPart> {
    let mut node = structure;
    for (depth, segment) in path.split('.').enumerate() {
        let index = segment.parse::<usize>().ok()?.checked_sub(1)?;
        node = match node {
            BodyStructure::Multipart { bodies, .. } => bodies.get(index)?,
            _ if depth == 0 => {
                if index != 0 {
                    return None;
                }
                node
            }
            BodyStructure::Message { body, .. } => match body.as_ref() {
                BodyStructure::Multipart { bodies, .. } => bodies.get(index)?,
                single if index == 0 => single,
                _ => return None,
            },
            _ => return None,
        };
    }
    node.part()
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
    use mailgate_imap::Disposition;

    use super::*;
    use crate::model::StandardFlag;

    fn part(media_type: &str, subtype: &str) -> BodyPart {
        BodyPart {
            media_type: media_type.to_string(),
            subtype: subtype.to_string(),
            encoding: "7BIT".to_string(),
            size: 100,
            ..BodyPart::default()
        }
    }

    fn text(subtype: &str) -> BodyStructure {
        let mut p = part("TEXT", subtype);
        p.params = vec![("CHARSET".to_string(), "utf-8".to_string())];
        BodyStructure::Text { part: p, lines: 3 }
    }

    fn pdf(filename: &str) -> BodyStructure {
        let mut p = part("APPLICATION", "PDF");
        p.encoding = "BASE64".to_string();
        p.disposition = Some(Disposition {
            kind: "ATTACHMENT".to_string(),
            params: vec![("FILENAME".to_string(), filename.to_string())],
        });
        BodyStructure::Basic(p)
    }

    fn multipart(subtype: &str, bodies: Vec<BodyStructure>) -> BodyStructure {
        BodyStructure::Multipart {
            subtype: subtype.to_string(),
            params: Vec::new(),
            bodies,
            disposition: None,
        }
    }

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    fn imap_address(name: Option<&str>, mailbox: &str, host: Option<&str>) -> mailgate_imap::Address {
        mailgate_imap::Address {
            name: name.map(|n| n.as_bytes().to_vec()),
            adl: None,
            mailbox: Some(mailbox.as_bytes().to_vec()),
            host: host.map(|h| h.as_bytes().to_vec()),
        }
    }

    mod address_tests {
        use super::*;

        #[test]
        fn decodes_display_name() {
            let addr = parse_address(&imap_address(
                Some("=?UTF-8?Q?Andr=C3=A9?="),
                "andre",
                Some("example.com"),
            ))
            .unwrap();
            assert_eq!(addr.name.as_deref(), Some("André"));
            assert_eq!(addr.email(), "andre@example.com");
        }

        #[test]
        fn missing_name_is_none() {
            let addr = parse_address(&imap_address(None, "bob", Some("example.com"))).unwrap();
            assert_eq!(addr.name, None);
        }

        #[test]
        fn group_markers_are_skipped() {
            let list = vec![
                imap_address(None, "undisclosed-recipients", None),
                imap_address(None, "carol", Some("example.com")),
            ];
            let parsed = parse_addresses(&list);
            assert_eq!(parsed.len(), 1);
            assert_eq!(parsed[0].mailbox, "carol");
        }
    }

    mod folder_tests {
        use super::*;

        fn entry(name: &str, attrs: &[&str]) -> ListResponse {
            ListResponse {
                attributes: attrs.iter().map(|a| MailboxAttribute::parse(a)).collect(),
                delimiter: Some("/".to_string()),
                name: name.to_string(),
            }
        }

        #[test]
        fn has_no_children() {
            let folder = folder_descriptor(&entry("INBOX", &["\\HasNoChildren"]));
            assert!(!folder.has_children);
            assert_eq!(folder.flags, vec!["\\HasNoChildren"]);
        }

        #[test]
        fn children_unless_advertised_otherwise() {
            assert!(folder_descriptor(&entry("Work", &[])).has_children);
            assert!(folder_descriptor(&entry("Work", &["\\HasChildren"])).has_children);
            assert!(folder_descriptor(&entry("Work", &["\\Noselect"])).has_children);
        }

        #[test]
        fn decodes_utf7_names() {
            let folder = folder_descriptor(&entry("Entw&APw-rfe", &[]));
            assert_eq!(folder.name, "Entwürfe");
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn status_record_fields() {
            let record = status_record(&[
                StatusItem::Messages(7),
                StatusItem::Recent(1),
                StatusItem::Unseen(2),
                StatusItem::UidNext(uid(44)),
            ]);
            assert_eq!(record.message_count, 7);
            assert_eq!(record.unseen_count, 2);
            assert_eq!(record.uid_next, Some(uid(44)));
        }

        #[test]
        fn missing_counters_are_zero() {
            assert_eq!(status_record(&[]), FolderStatusRecord::default());
        }
    }

    mod record_tests {
        use super::*;

        #[test]
        fn fallbacks_for_missing_envelope() {
            let mut fetched = FetchRecord::new(uid(42));
            fetched.flags = Some(vec!["\\Seen".to_string(), "Work".to_string()]);
            let record = message_record("INBOX", &fetched, false);

            assert_eq!(record.message_id, "<42@INBOX>");
            assert_eq!(record.from, Address::unknown());
            assert!(record.to.is_empty());
            assert_eq!(record.subject, "");
            assert!(record.date.is_none());
            assert!(record.flags.contains(StandardFlag::Seen));
            assert!(record.flags.contains_custom("Work"));
            assert!(record.attachments.is_none());
        }

        #[test]
        fn envelope_fields() {
            let mut fetched = FetchRecord::new(uid(7));
            fetched.envelope = Some(Envelope {
                subject: Some(b"=?ISO-8859-1?Q?Caf=E9?=".to_vec()),
                from: vec![imap_address(Some("Alice"), "alice", Some("example.com"))],
                to: vec![imap_address(None, "bob", Some("example.com"))],
                message_id: Some(b"<abc@example.com>".to_vec()),
                in_reply_to: Some(b"<parent@example.com>".to_vec()),
                ..Envelope::default()
            });
            fetched.internal_date = Some(" 7-Feb-2024 09:05:00 +0100".to_string());
            fetched.size = Some(1234);
            let record = message_record("INBOX", &fetched, false);

            assert_eq!(record.subject, "Café");
            assert_eq!(record.from.name.as_deref(), Some("Alice"));
            assert_eq!(record.message_id, "<abc@example.com>");
            assert_eq!(record.in_reply_to.as_deref(), Some("<parent@example.com>"));
            assert_eq!(record.size, 1234);
            assert_eq!(
                record.date.unwrap().to_rfc3339(),
                "2024-02-07T09:05:00+01:00"
            );
        }

        #[test]
        fn attachments_none_vs_empty() {
            let mut fetched = FetchRecord::new(uid(1));
            fetched.body_structure = Some(text("PLAIN"));

            assert_eq!(message_record("INBOX", &fetched, true).attachments, Some(vec![]));
            assert_eq!(message_record("INBOX", &fetched, false).attachments, None);

            fetched.body_structure = None;
            assert_eq!(message_record("INBOX", &fetched, true).attachments, None);
        }
    }

    mod structure_tests {
        use super::*;

        #[test]
        fn nested_part_paths() {
            let structure = multipart(
                "MIXED",
                vec![
                    multipart("ALTERNATIVE", vec![text("PLAIN"), text("HTML")]),
                    pdf("report.pdf"),
                    multipart("MIXED", vec![text("PLAIN"), pdf("a.pdf")]),
                ],
            );
            let found = attachments(&structure, "INBOX", uid(9));
            let paths: Vec<&str> = found.iter().map(|a| a.part.as_str()).collect();
            assert_eq!(paths, vec!["2", "3.2"]);
            assert_eq!(found[0].content.filename.as_deref(), Some("report.pdf"));
            assert_eq!(found[0].content.mime_type, "application/pdf");
            assert_eq!(found[0].content.encoding, "base64");
            assert_eq!(found[0].content.disposition.as_deref(), Some("attachment"));
            assert_eq!(found[1].uid, uid(9));
        }

        #[test]
        fn single_part_root_is_one() {
            let found = attachments(&pdf("x.pdf"), "INBOX", uid(1));
            assert_eq!(found[0].part, "1");
        }

        #[test]
        fn inline_image_without_name_is_attachment() {
            let mut image = part("IMAGE", "PNG");
            image.id = Some("<logo@example>".to_string());
            let structure = multipart("RELATED", vec![text("HTML"), BodyStructure::Basic(image)]);
            let found = attachments(&structure, "INBOX", uid(1));
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].content.content_id.as_deref(), Some("logo@example"));
        }

        #[test]
        fn named_text_part_is_attachment() {
            let mut notes = part("TEXT", "PLAIN");
            notes.params = vec![("NAME".to_string(), "notes.txt".to_string())];
            let structure = multipart(
                "MIXED",
                vec![text("PLAIN"), BodyStructure::Text { part: notes, lines: 1 }],
            );
            let found = attachments(&structure, "INBOX", uid(1));
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].part, "2");
        }

        #[test]
        fn rfc822_is_not_descended() {
            let inner = multipart("MIXED", vec![text("PLAIN"), pdf("inner.pdf")]);
            let message = BodyStructure::Message {
                part: part("MESSAGE", "RFC822"),
                envelope: Box::new(Envelope::default()),
                body: Box::new(inner),
                lines: 40,
            };
            let structure = multipart("MIXED", vec![text("PLAIN"), message]);
            let found = attachments(&structure, "INBOX", uid(1));
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].part, "2");
            assert_eq!(found[0].content.mime_type, "message/rfc822");
        }

        #[test]
        fn extended_filename() {
            let mut p = part("APPLICATION", "OCTET-STREAM");
            p.disposition = Some(Disposition {
                kind: "attachment".to_string(),
                params: vec![(
                    "filename*".to_string(),
                    "utf-8''%E6%97%A5%E6%9C%AC.txt".to_string(),
                )],
            });
            assert_eq!(filename(&p).as_deref(), Some("日本.txt"));
        }
    }

    mod text_part_tests {
        use super::*;

        #[test]
        fn alternative_inside_mixed() {
            let structure = multipart(
                "MIXED",
                vec![
                    multipart("ALTERNATIVE", vec![text("PLAIN"), text("HTML")]),
                    pdf("report.pdf"),
                ],
            );
            let parts = text_parts(&structure);
            assert_eq!(parts.plain.as_ref().unwrap().path, "1.1");
            assert_eq!(parts.html.as_ref().unwrap().path, "1.2");
            assert_eq!(parts.paths(), vec!["1.1", "1.2"]);
        }

        #[test]
        fn single_part_plain() {
            let structure = text("PLAIN");
            let parts = text_parts(&structure);
            assert_eq!(parts.plain.unwrap().path, "1");
            assert!(parts.html.is_none());
        }

        #[test]
        fn attached_text_is_not_a_body() {
            let mut attached = part("TEXT", "HTML");
            attached.disposition = Some(Disposition {
                kind: "attachment".to_string(),
                params: Vec::new(),
            });
            let structure = multipart(
                "MIXED",
                vec![text("PLAIN"), BodyStructure::Text { part: attached, lines: 1 }],
            );
            assert!(text_parts(&structure).html.is_none());
        }

        #[test]
        fn decode_quoted_printable_latin1() {
            let mut p = part("TEXT", "PLAIN");
            p.encoding = "QUOTED-PRINTABLE".to_string();
            p.params = vec![("charset".to_string(), "iso-8859-1".to_string())];
            let text_part = TextPart {
                path: "1".to_string(),
                part: &p,
            };
            assert_eq!(text_part.decode(b"Caf=E9"), "Café");
        }
    }

    mod find_part_tests {
        use super::*;

        #[test]
        fn by_path() {
            let structure = multipart(
                "MIXED",
                vec![
                    multipart("ALTERNATIVE", vec![text("PLAIN"), text("HTML")]),
                    pdf("report.pdf"),
                ],
            );
            assert_eq!(find_part(&structure, "1.2").unwrap().subtype, "HTML");
            assert_eq!(find_part(&structure, "2").unwrap().subtype, "PDF");
            assert!(find_part(&structure, "1").is_none());
            assert!(find_part(&structure, "3").is_none());
            assert!(find_part(&structure, "0").is_none());
            assert!(find_part(&structure, "x").is_none());
        }

        #[test]
        fn single_part_root() {
            let structure = pdf("x.pdf");
            assert_eq!(find_part(&structure, "1").unwrap().subtype, "PDF");
            assert!(find_part(&structure, "2").is_none());
        }

        #[test]
        fn inside_rfc822() {
            let message = BodyStructure::Message {
                part: part("MESSAGE", "RFC822"),
                envelope: Box::new(Envelope::default()),
                body: Box::new(multipart("MIXED", vec![text("PLAIN"), pdf("inner.pdf")])),
                lines: 40,
            };
            let structure = multipart("MIXED", vec![text("PLAIN"), message]);
            assert_eq!(find_part(&structure, "2").unwrap().subtype, "RFC822");
            assert_eq!(find_part(&structure, "2.2").unwrap().subtype, "PDF");
        }
    }
}
