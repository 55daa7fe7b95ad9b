//! Owned response data types.
//!
//! Header-derived fields stay as raw bytes; decoding encoded words and
//! charsets is left to the consumer.

use std::collections::BTreeMap;

use crate::types::{Uid, UidValidity};

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<Vec<u8>>,
    /// Subject header.
    pub subject: Option<Vec<u8>>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<Vec<u8>>,
    /// Message-ID header.
    pub message_id: Option<Vec<u8>>,
}

/// Email address from envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Display name.
    pub name: Option<Vec<u8>>,
    /// Source route (obsolete).
    pub adl: Option<Vec<u8>>,
    /// Mailbox name (local part).
    pub mailbox: Option<Vec<u8>>,
    /// Host name (domain part).
    pub host: Option<Vec<u8>>,
}

/// Fields shared by every non-multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyPart {
    /// MIME type, e.g. `application`.
    pub media_type: String,
    /// MIME subtype, e.g. `pdf`.
    pub subtype: String,
    /// Content-Type parameters.
    pub params: Vec<(String, String)>,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding.
    pub encoding: String,
    /// Encoded size in bytes.
    pub size: u32,
    /// Content-Disposition, when the server sent extension data.
    pub disposition: Option<Disposition>,
}

impl BodyPart {
    /// Looks up a Content-Type parameter case-insensitively.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        find_param(&self.params, name)
    }

    /// Returns `type/subtype` in lowercase.
    #[must_use]
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype).to_lowercase()
    }
}

/// Content-Disposition from BODYSTRUCTURE extension data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disposition {
    /// Disposition type, e.g. `attachment` or `inline`.
    pub kind: String,
    /// Disposition parameters.
    pub params: Vec<(String, String)>,
}

impl Disposition {
    /// Looks up a disposition parameter case-insensitively.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        find_param(&self.params, name)
    }

    /// Returns true for `attachment` dispositions.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind.eq_ignore_ascii_case("attachment")
    }
}

fn find_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Body structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// Non-text single-part body.
    Basic(BodyPart),
    /// Text body.
    Text {
        /// Part fields.
        part: BodyPart,
        /// Size in lines.
        lines: u32,
    },
    /// Message/RFC822 body.
    Message {
        /// Part fields.
        part: BodyPart,
        /// Envelope of nested message.
        envelope: Box<Envelope>,
        /// Body structure of nested message.
        body: Box<Self>,
        /// Size in lines.
        lines: u32,
    },
    /// Multipart body.
    Multipart {
        /// Multipart subtype, e.g. `mixed`.
        subtype: String,
        /// Content-Type parameters.
        params: Vec<(String, String)>,
        /// Child body parts.
        bodies: Vec<Self>,
        /// Content-Disposition of the multipart itself.
        disposition: Option<Disposition>,
    },
}

impl BodyStructure {
    /// Returns the single-part fields, or `None` for multiparts.
    #[must_use]
    pub const fn part(&self) -> Option<&BodyPart> {
        match self {
            Self::Basic(part) | Self::Text { part, .. } | Self::Message { part, .. } => Some(part),
            Self::Multipart { .. } => None,
        }
    }
}

/// STATUS response item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusItem {
    /// Number of messages.
    Messages(u32),
    /// Number of recent messages.
    Recent(u32),
    /// Next UID.
    UidNext(Uid),
    /// UIDVALIDITY value.
    UidValidity(UidValidity),
    /// Number of unseen messages.
    Unseen(u32),
}

/// Data returned for one message by UID FETCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    /// Message UID.
    pub uid: Uid,
    /// Raw flag tokens, when FLAGS was fetched.
    pub flags: Option<Vec<String>>,
    /// Envelope, when ENVELOPE was fetched.
    pub envelope: Option<Envelope>,
    /// RFC822.SIZE.
    pub size: Option<u32>,
    /// INTERNALDATE as sent, e.g. `17-Jul-1996 02:44:25 -0700`.
    pub internal_date: Option<String>,
    /// BODYSTRUCTURE.
    pub body_structure: Option<BodyStructure>,
    /// Fetched body sections keyed by section specifier (`""` is the
    /// whole message, `"1.2"` a part, `"HEADER"` the header).
    pub sections: BTreeMap<String, Vec<u8>>,
}

impl FetchRecord {
    /// Creates an empty record for a UID.
    #[must_use]
    pub const fn new(uid: Uid) -> Self {
        Self {
            uid,
            flags: None,
            envelope: None,
            size: None,
            internal_date: None,
            body_structure: None,
            sections: BTreeMap::new(),
        }
    }

    /// Returns a fetched body section.
    #[must_use]
    pub fn section(&self, section: &str) -> Option<&[u8]> {
        self.sections.get(section).map(Vec::as_slice)
    }

    /// Merges a later FETCH response for the same message.
    pub fn merge(&mut self, other: Self) {
        if other.flags.is_some() {
            self.flags = other.flags;
        }
        if other.envelope.is_some() {
            self.envelope = other.envelope;
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.internal_date.is_some() {
            self.internal_date = other.internal_date;
        }
        if other.body_structure.is_some() {
            self.body_structure = other.body_structure;
        }
        self.sections.extend(other.sections);
    }
}

/// FETCH results keyed by UID.
pub type FetchMap = BTreeMap<Uid, FetchRecord>;

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
    use super::*;

    fn part(media_type: &str, subtype: &str) -> BodyPart {
        BodyPart {
            media_type: media_type.to_string(),
            subtype: subtype.to_string(),
            params: vec![("NAME".to_string(), "report.pdf".to_string())],
            encoding: "BASE64".to_string(),
            size: 100,
            ..BodyPart::default()
        }
    }

    #[test]
    fn param_lookup_ignores_case() {
        let p = part("APPLICATION", "PDF");
        assert_eq!(p.param("name"), Some("report.pdf"));
        assert_eq!(p.param("charset"), None);
        assert_eq!(p.mime_type(), "application/pdf");
    }

    #[test]
    fn disposition_kind() {
        let d = Disposition {
            kind: "ATTACHMENT".to_string(),
            params: vec![("filename".to_string(), "a.txt".to_string())],
        };
        assert!(d.is_attachment());
        assert_eq!(d.param("FILENAME"), Some("a.txt"));
    }

    #[test]
    fn structure_part() {
        let leaf = BodyStructure::Basic(part("image", "png"));
        assert!(leaf.part().is_some());
        let multi = BodyStructure::Multipart {
            subtype: "mixed".to_string(),
            params: vec![],
            bodies: vec![leaf],
            disposition: None,
        };
        assert!(multi.part().is_none());
    }

    #[test]
    fn merge_keeps_earlier_fields() {
        let uid = Uid::new(5).unwrap();
        let mut first = FetchRecord::new(uid);
        first.flags = Some(vec!["\\Seen".to_string()]);
        first.sections.insert("1".to_string(), b"one".to_vec());

        let mut second = FetchRecord::new(uid);
        second.size = Some(42);
        second.sections.insert("2".to_string(), b"two".to_vec());

        first.merge(second);
        assert_eq!(first.flags.as_deref(), Some(&["\\Seen".to_string()][..]));
        assert_eq!(first.size, Some(42));
        assert_eq!(first.section("1"), Some(&b"one"[..]));
        assert_eq!(first.section("2"), Some(&b"two"[..]));
    }
}
