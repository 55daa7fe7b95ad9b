//! Modified UTF-7 mailbox names (RFC 3501 section 5.1.3).
//!
//! Mailbox names on the wire are 7-bit. Printable ASCII stands for itself,
//! `&-` stands for `&`, and any other run of characters is written as
//! `&` + base64 (with `,` in place of `/`) of its UTF-16BE form + `-`.
//!
//! The conversion itself is done by `utf7-imap`. Decoding checks every
//! shifted run first, since the crate assumes well-formed input and names
//! come straight from the server.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use utf7_imap::{decode_utf7_imap, encode_utf7_imap};

const MUTF7: GeneralPurpose = GeneralPurpose::new(
    &IMAP_MUTF7,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Decodes a modified UTF-7 mailbox name.
///
/// Shifted runs that are not valid base64 of UTF-16 are replaced with
/// U+FFFD and decoding carries on with the rest of the name.
#[must_use]
pub fn decode_mailbox_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let shifted = &rest[start + 1..];

        let Some(end) = shifted.find('-') else {
            // Unterminated shift: nothing after it can be trusted.
            out.push(char::REPLACEMENT_CHARACTER);
            return out;
        };

        let run = &rest[start..start + end + 2];
        if is_valid_run(&shifted[..end]) {
            out.push_str(&decode_utf7_imap(run.to_string()));
        } else {
            out.push(char::REPLACEMENT_CHARACTER);
        }
        rest = &shifted[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Returns true if the text between `&` and `-` decodes to whole UTF-16
/// characters. The empty run is the escaped ampersand.
fn is_valid_run(encoded: &str) -> bool {
    if encoded.is_empty() {
        return true;
    }
    let Ok(bytes) = MUTF7.decode(encoded) else {
        return false;
    };
    bytes.len() % 2 == 0
        && char::decode_utf16(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        )
        .all(|c| c.is_ok())
}

/// Encodes a mailbox name as modified UTF-7.
#[must_use]
pub fn encode_mailbox_name(name: &str) -> String {
    encode_utf7_imap(name.to_string())
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

    mod decode_tests {
        use super::*;

        #[test]
        fn plain_ascii() {
            assert_eq!(decode_mailbox_name("INBOX"), "INBOX");
            assert_eq!(decode_mailbox_name("Archive/2024"), "Archive/2024");
        }

        #[test]
        fn escaped_ampersand() {
            assert_eq!(decode_mailbox_name("Tom &- Jerry"), "Tom & Jerry");
        }

        #[test]
        fn non_ascii_runs() {
            assert_eq!(decode_mailbox_name("Entw&APw-rfe"), "Entwürfe");
            assert_eq!(decode_mailbox_name("&BB4EQgQ,BEAEMAQyBDsENQQ9BD0ESwQ1-"), "Отправленные");
            assert_eq!(decode_mailbox_name("&ZeVnLIqe-"), "日本語");
        }

        #[test]
        fn invalid_shift_is_substituted() {
            assert_eq!(decode_mailbox_name("Bad&*!-Name"), "Bad\u{FFFD}Name");
        }

        #[test]
        fn odd_byte_count_is_substituted() {
            assert_eq!(decode_mailbox_name("X&AA-Y"), "X\u{FFFD}Y");
        }

        #[test]
        fn unpaired_surrogate_is_substituted() {
            // 0xD800 alone
            assert_eq!(decode_mailbox_name("A&2AA-B"), "A\u{FFFD}B");
        }

        #[test]
        fn unterminated_shift() {
            assert_eq!(decode_mailbox_name("Draft&APw"), "Draft\u{FFFD}");
        }
    }

    mod encode_tests {
        use super::*;

        #[test]
        fn plain_ascii() {
            assert_eq!(encode_mailbox_name("Sent Items"), "Sent Items");
        }

        #[test]
        fn ampersand() {
            assert_eq!(encode_mailbox_name("A&B"), "A&-B");
        }

        #[test]
        fn non_ascii() {
            assert_eq!(encode_mailbox_name("Entwürfe"), "Entw&APw-rfe");
            assert_eq!(encode_mailbox_name("日本語"), "&ZeVnLIqe-");
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoded_names_decode_back(name in "\\PC{0,32}") {
                prop_assert_eq!(decode_mailbox_name(&encode_mailbox_name(&name)), name);
            }

            #[test]
            fn decoding_never_panics(name in "[ -~]{0,64}") {
                let _ = decode_mailbox_name(&name);
            }
        }
    }
}
