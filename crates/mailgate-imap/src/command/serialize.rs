//! Command serialization helpers.

use crate::types::{Flag, write_flag_list};

use super::types::{FetchAttribute, SearchCriteria, StoreAction};

/// Writes an astring: an atom, a quoted string, or a synchronizing literal
/// when the value is not ASCII.
///
/// Literals are written as `{n}\r\n` followed by the bytes; the session
/// waits for a continuation request at each CRLF before sending the rest.
/// Callers must have checked the value with [`is_wire_safe`].
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if !s.is_ascii() {
        buf.extend_from_slice(format!("{{{}}}\r\n", s.len()).as_bytes());
        buf.extend_from_slice(s.as_bytes());
    } else if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Returns true if the text can be sent as a command argument.
///
/// CR and LF would end the command line early and NUL is not allowed
/// anywhere in IMAP, not even inside a literal.
#[must_use]
pub fn is_wire_safe(s: &str) -> bool {
    !s.bytes().any(|b| matches!(b, b'\r' | b'\n' | 0))
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b >= 0x7F
}

/// Writes FETCH attributes, parenthesized when there is more than one.
pub fn write_fetch_attributes(buf: &mut Vec<u8>, attrs: &[FetchAttribute]) {
    if let [single] = attrs {
        write_fetch_attribute(buf, single);
        return;
    }
    buf.push(b'(');
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        write_fetch_attribute(buf, attr);
    }
    buf.push(b')');
}

/// Writes a single FETCH attribute.
pub fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Envelope => buf.extend_from_slice(b"ENVELOPE"),
        FetchAttribute::BodyStructure => buf.extend_from_slice(b"BODYSTRUCTURE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body {
            section,
            peek,
            partial,
        } => {
            if *peek {
                buf.extend_from_slice(b"BODY.PEEK[");
            } else {
                buf.extend_from_slice(b"BODY[");
            }
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
            if let Some((start, len)) = partial {
                buf.extend_from_slice(format!("<{start}.{len}>").as_bytes());
            }
        }
    }
}

/// Writes a STORE action.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    let (prefix, flags): (&[u8], &[Flag]) = match action {
        StoreAction::AddFlags(f) => (b"+FLAGS", f),
        StoreAction::RemoveFlags(f) => (b"-FLAGS", f),
    };
    buf.extend_from_slice(prefix);
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.push(b' ');
    write_flag_list(buf, flags);
}

/// Writes SEARCH criteria.
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Answered => buf.extend_from_slice(b"ANSWERED"),
        SearchCriteria::Unanswered => buf.extend_from_slice(b"UNANSWERED"),
        SearchCriteria::Deleted => buf.extend_from_slice(b"DELETED"),
        SearchCriteria::Undeleted => buf.extend_from_slice(b"UNDELETED"),
        SearchCriteria::Draft => buf.extend_from_slice(b"DRAFT"),
        SearchCriteria::Undraft => buf.extend_from_slice(b"UNDRAFT"),
        SearchCriteria::Flagged => buf.extend_from_slice(b"FLAGGED"),
        SearchCriteria::Unflagged => buf.extend_from_slice(b"UNFLAGGED"),
        SearchCriteria::New => buf.extend_from_slice(b"NEW"),
        SearchCriteria::Seen => buf.extend_from_slice(b"SEEN"),
        SearchCriteria::Unseen => buf.extend_from_slice(b"UNSEEN"),
        SearchCriteria::Keyword(s) => write_keyed(buf, b"KEYWORD ", s),
        SearchCriteria::Unkeyword(s) => write_keyed(buf, b"UNKEYWORD ", s),
        SearchCriteria::UidSet(set) => {
            buf.extend_from_slice(b"UID ");
            buf.extend_from_slice(set.to_string().as_bytes());
        }
        SearchCriteria::Subject(s) => write_keyed(buf, b"SUBJECT ", s),
        SearchCriteria::From(s) => write_keyed(buf, b"FROM ", s),
        SearchCriteria::To(s) => write_keyed(buf, b"TO ", s),
        SearchCriteria::Cc(s) => write_keyed(buf, b"CC ", s),
        SearchCriteria::Body(s) => write_keyed(buf, b"BODY ", s),
        SearchCriteria::Text(s) => write_keyed(buf, b"TEXT ", s),
        SearchCriteria::Since(date) => {
            buf.extend_from_slice(b"SINCE ");
            buf.extend_from_slice(date.as_bytes());
        }
        SearchCriteria::Before(date) => {
            buf.extend_from_slice(b"BEFORE ");
            buf.extend_from_slice(date.as_bytes());
        }
        SearchCriteria::On(date) => {
            buf.extend_from_slice(b"ON ");
            buf.extend_from_slice(date.as_bytes());
        }
        SearchCriteria::Larger(size) => {
            buf.extend_from_slice(format!("LARGER {size}").as_bytes());
        }
        SearchCriteria::Smaller(size) => {
            buf.extend_from_slice(format!("SMALLER {size}").as_bytes());
        }
        SearchCriteria::Header(name, value) => {
            buf.extend_from_slice(b"HEADER ");
            write_astring(buf, name);
            buf.push(b' ');
            write_astring(buf, value);
        }
        SearchCriteria::And(criteria) => {
            if criteria.is_empty() {
                buf.extend_from_slice(b"ALL");
            }
            for (i, c) in criteria.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_criteria(buf, c);
            }
        }
        SearchCriteria::Or(a, b) => {
            buf.extend_from_slice(b"OR ");
            write_search_key(buf, a);
            buf.push(b' ');
            write_search_key(buf, b);
        }
        SearchCriteria::Not(c) => {
            buf.extend_from_slice(b"NOT ");
            write_search_key(buf, c);
        }
        SearchCriteria::Raw(s) => buf.extend_from_slice(s.as_bytes()),
    }
}

impl std::fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = Vec::new();
        write_search_criteria(&mut buf, self);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

/// Writes an operand of OR/NOT, which must be a single search key.
fn write_search_key(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    let grouped = match criteria {
        SearchCriteria::And(all) => all.len() > 1,
        SearchCriteria::Raw(s) => s.contains(' '),
        _ => false,
    };
    if grouped {
        buf.push(b'(');
        write_search_criteria(buf, criteria);
        buf.push(b')');
    } else {
        write_search_criteria(buf, criteria);
    }
}

fn write_keyed(buf: &mut Vec<u8>, key: &[u8], value: &str) {
    buf.extend_from_slice(key);
    write_astring(buf, value);
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
    use super::*;

    fn criteria(c: &SearchCriteria) -> String {
        let mut buf = Vec::new();
        write_search_criteria(&mut buf, c);
        String::from_utf8(buf).unwrap()
    }

    mod astring_tests {
        use super::*;

        fn astring(s: &str) -> String {
            let mut buf = Vec::new();
            write_astring(&mut buf, s);
            String::from_utf8(buf).unwrap()
        }

        #[test]
        fn atom_is_bare() {
            assert_eq!(astring("INBOX"), "INBOX");
            assert_eq!(astring("Entw&APw-rfe"), "Entw&APw-rfe");
        }

        #[test]
        fn non_ascii_is_literal() {
            assert_eq!(astring("Café"), "{5}\r\nCafé");
            assert_eq!(astring("日本"), "{6}\r\n日本");
        }

        #[test]
        fn wire_safety() {
            assert!(is_wire_safe("plain text"));
            assert!(is_wire_safe("Grüße"));
            assert!(!is_wire_safe("x\r\nZ9 DELETE INBOX"));
            assert!(!is_wire_safe("line\nbreak"));
            assert!(!is_wire_safe("nul\0byte"));
        }

        #[test]
        fn special_characters_are_quoted() {
            assert_eq!(astring(""), "\"\"");
            assert_eq!(astring("My Folder"), "\"My Folder\"");
            assert_eq!(astring("a\"b"), "\"a\\\"b\"");
            assert_eq!(astring("[Gmail]/All Mail"), "\"[Gmail]/All Mail\"");
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn flags() {
            assert_eq!(criteria(&SearchCriteria::Unseen), "UNSEEN");
            assert_eq!(
                criteria(&SearchCriteria::Keyword("$Label".to_string())),
                "KEYWORD $Label"
            );
        }

        #[test]
        fn conjunction() {
            let c = SearchCriteria::And(vec![
                SearchCriteria::Unseen,
                SearchCriteria::From("alice@example.com".to_string()),
            ]);
            assert_eq!(criteria(&c), "UNSEEN FROM alice@example.com");
        }

        #[test]
        fn empty_conjunction_is_all() {
            assert_eq!(criteria(&SearchCriteria::And(vec![])), "ALL");
        }

        #[test]
        fn or_groups_conjunctions() {
            let c = SearchCriteria::Or(
                Box::new(SearchCriteria::And(vec![
                    SearchCriteria::Seen,
                    SearchCriteria::Flagged,
                ])),
                Box::new(SearchCriteria::Subject("hello world".to_string())),
            );
            assert_eq!(criteria(&c), "OR (SEEN FLAGGED) SUBJECT \"hello world\"");
        }

        #[test]
        fn not() {
            let c = SearchCriteria::Not(Box::new(SearchCriteria::Deleted));
            assert_eq!(criteria(&c), "NOT DELETED");
        }

        #[test]
        fn dates_and_sizes() {
            assert_eq!(
                criteria(&SearchCriteria::Since("1-Feb-2024".to_string())),
                "SINCE 1-Feb-2024"
            );
            assert_eq!(criteria(&SearchCriteria::Larger(1024)), "LARGER 1024");
        }

        #[test]
        fn raw_passes_through() {
            assert_eq!(
                criteria(&SearchCriteria::Raw("X-GM-RAW \"has:attachment\"".to_string())),
                "X-GM-RAW \"has:attachment\""
            );
        }
    }

    mod fetch_tests {
        use super::*;

        fn attrs(a: &[FetchAttribute]) -> String {
            let mut buf = Vec::new();
            write_fetch_attributes(&mut buf, a);
            String::from_utf8(buf).unwrap()
        }

        #[test]
        fn single_is_bare() {
            assert_eq!(attrs(&[FetchAttribute::Flags]), "FLAGS");
        }

        #[test]
        fn list_is_parenthesized() {
            assert_eq!(
                attrs(&[
                    FetchAttribute::Uid,
                    FetchAttribute::Flags,
                    FetchAttribute::peek_section("1.2"),
                ]),
                "(UID FLAGS BODY.PEEK[1.2])"
            );
        }

        #[test]
        fn partial() {
            let attr = FetchAttribute::Body {
                section: None,
                peek: false,
                partial: Some((0, 512)),
            };
            assert_eq!(attrs(&[attr]), "BODY[]<0.512>");
        }
    }

    #[test]
    fn store_actions() {
        let mut buf = Vec::new();
        write_store_action(&mut buf, &StoreAction::AddFlags(vec![Flag::Seen]), false);
        assert_eq!(buf, b"+FLAGS (\\Seen)");

        let mut buf = Vec::new();
        write_store_action(&mut buf, &StoreAction::RemoveFlags(vec![Flag::Deleted]), true);
        assert_eq!(buf, b"-FLAGS.SILENT (\\Deleted)");
    }
}
