//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 header decoding and
//! charset-to-text conversion.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use charset::Charset;

use crate::error::{Error, Result};

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// Line breaks and other ASCII whitespace are ignored, so MIME bodies
/// wrapped at 76 columns decode directly.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let compact: Cow<'_, str> = if data.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(data.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(data)
    };
    STANDARD.decode(compact.as_bytes()).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut bytes = data.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        if byte != b'=' {
            result.push(byte);
            continue;
        }

        // Soft line break
        match bytes.peek() {
            Some(b'\r') => {
                bytes.next();
                if bytes.peek() == Some(&b'\n') {
                    bytes.next();
                }
                continue;
            }
            Some(b'\n') => {
                bytes.next();
                continue;
            }
            _ => {}
        }

        // Hex encoded byte
        let hi = bytes.next().and_then(hex_value);
        let lo = bytes.next().and_then(hex_value);
        match (hi, lo) {
            (Some(hi), Some(lo)) => result.push(hi << 4 | lo),
            _ => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(result)
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes a raw header value containing RFC 2047 encoded words.
///
/// Format of an encoded word: `=?charset?encoding?encoded-text?=`
///
/// The whole value is decoded first. If that fails, every encoded word is
/// decoded on its own and words that still fail are kept as raw text, so
/// this never fails. Bytes outside encoded words are read as UTF-8 with
/// replacement characters.
#[must_use]
pub fn decode_header(raw: &[u8]) -> String {
    if !raw.windows(2).any(|w| w == b"=?") {
        return String::from_utf8_lossy(raw).into_owned();
    }

    rfc2047_decoder::decode(raw).unwrap_or_else(|_| decode_header_segments(raw))
}

/// A piece of a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Encoded(&'a [u8]),
    Text(&'a [u8]),
}

fn decode_header_segments(raw: &[u8]) -> String {
    let segments = split_segments(raw);
    let mut out = String::with_capacity(raw.len());

    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            Segment::Encoded(word) => match rfc2047_decoder::decode(word) {
                Ok(decoded) => out.push_str(&decoded),
                Err(_) => out.push_str(&String::from_utf8_lossy(word)),
            },
            Segment::Text(text) => {
                // Whitespace between two encoded words is not displayed.
                let between_words = i > 0
                    && matches!(segments.get(i - 1), Some(Segment::Encoded(_)))
                    && matches!(segments.get(i + 1), Some(Segment::Encoded(_)))
                    && text.iter().all(u8::is_ascii_whitespace);
                if !between_words {
                    out.push_str(&String::from_utf8_lossy(text));
                }
            }
        }
    }

    out
}

fn split_segments(raw: &[u8]) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos + 1 < raw.len() {
        if raw[pos] == b'=' && raw[pos + 1] == b'?' {
            if let Some(len) = encoded_word_len(&raw[pos..]) {
                if text_start < pos {
                    segments.push(Segment::Text(&raw[text_start..pos]));
                }
                segments.push(Segment::Encoded(&raw[pos..pos + len]));
                pos += len;
                text_start = pos;
                continue;
            }
        }
        pos += 1;
    }

    if text_start < raw.len() {
        segments.push(Segment::Text(&raw[text_start..]));
    }

    segments
}

/// Returns the length of the encoded word at the start of `input`.
fn encoded_word_len(input: &[u8]) -> Option<usize> {
    let rest = input.strip_prefix(b"=?")?;
    let charset_end = rest.iter().position(|&b| b == b'?')?;
    let after_charset = &rest[charset_end + 1..];
    let encoding_end = after_charset.iter().position(|&b| b == b'?')?;
    let text = &after_charset[encoding_end + 1..];
    let text_end = text.windows(2).position(|w| w == b"?=")?;

    let len = 2 + charset_end + 1 + encoding_end + 1 + text_end + 2;
    if input[..len].iter().any(u8::is_ascii_whitespace) {
        return None;
    }
    Some(len)
}

/// Converts bytes in the given charset to text.
///
/// A missing charset means UTF-8. Unknown charsets and malformed input are
/// decoded lossily rather than rejected.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let label = charset
        .map(|c| c.trim().trim_matches('"'))
        .filter(|c| !c.is_empty())
        .unwrap_or("utf-8");

    match Charset::for_label(label.as_bytes()) {
        Some(charset) => charset.decode_without_bom_handling(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_decode_wrapped_lines() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxk\r\nIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_decode_mime_attachment_size() {
        let original: Vec<u8> = (0..17_671u32).map(|i| (i * 31 % 251) as u8).collect();
        let encoded = encode_base64(&original);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert_eq!(wrapped.len(), 24_184);

        let decoded = decode_base64(&wrapped).unwrap();
        assert_eq!(decoded.len(), 17_671);
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(decode_base64("not*base64!").is_err());
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable(b"Hello, World!").unwrap();
        assert_eq!(decoded, b"Hello, World!");

        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable(b"Hello=\r\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");

        let decoded = decode_quoted_printable(b"Hello=\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_incomplete_escape() {
        assert!(decode_quoted_printable(b"broken=4").is_err());
        assert!(decode_quoted_printable(b"broken=ZZ").is_err());
    }

    #[test]
    fn test_decode_header_plain() {
        assert_eq!(decode_header(b"Hello"), "Hello");
        assert_eq!(decode_header(b""), "");
    }

    #[test]
    fn test_decode_header_base64_word() {
        assert_eq!(decode_header(b"=?UTF-8?B?SGVsbG8gV29ybGQ=?="), "Hello World");
        assert_eq!(decode_header(b"=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_decode_header_q_word() {
        assert_eq!(decode_header(b"=?utf-8?Q?H=C3=A9llo?="), "Héllo");
        assert_eq!(decode_header(b"=?iso-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_decode_header_mixed_text() {
        assert_eq!(
            decode_header(b"Re: =?utf-8?B?SMOpbGxv?= there"),
            "Re: Héllo there"
        );
    }

    #[test]
    fn test_decode_header_adjacent_words_join() {
        assert_eq!(
            decode_header(b"=?utf-8?Q?Hello?= =?utf-8?Q?World?="),
            "HelloWorld"
        );
    }

    #[test]
    fn test_segments_keep_raw_on_bad_word() {
        let raw = b"Subject =?utf-8?B?SMOpbGxv?= and =?bogus?X?abc?=";
        let decoded = decode_header_segments(raw);
        assert_eq!(decoded, "Subject Héllo and =?bogus?X?abc?=");
    }

    #[test]
    fn test_decode_header_invalid_utf8_is_lossy() {
        let decoded = decode_header(b"caf\xe9");
        assert_eq!(decoded, "caf\u{FFFD}");
    }

    #[test]
    fn test_split_segments() {
        let segments = split_segments(b"a =?x?B?YQ==?= b");
        assert_eq!(
            segments,
            vec![
                Segment::Text(b"a "),
                Segment::Encoded(b"=?x?B?YQ==?="),
                Segment::Text(b" b"),
            ]
        );
    }

    #[test]
    fn test_encoded_word_len_rejects_whitespace() {
        assert_eq!(encoded_word_len(b"=?utf-8?Q?a b?="), None);
        assert_eq!(encoded_word_len(b"=?utf-8?Q?ab?= tail"), Some(14));
        assert_eq!(encoded_word_len(b"=?unterminated"), None);
    }

    #[test]
    fn test_decode_charset() {
        assert_eq!(decode_charset("héllo".as_bytes(), None), "héllo");
        assert_eq!(decode_charset(b"caf\xe9", Some("ISO-8859-1")), "café");
        assert_eq!(decode_charset(b"caf\xe9", Some("\"latin1\"")), "café");
        assert_eq!(decode_charset(b"plain", Some("x-unknown")), "plain");
        assert_eq!(decode_charset(b"bad\xff", Some("utf-8")), "bad\u{FFFD}");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decode_header_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
                let _ = decode_header(&raw);
            }

            #[test]
            fn plain_ascii_header_is_unchanged(text in "[a-zA-Z0-9 ,.:]{0,64}") {
                prop_assert_eq!(decode_header(text.as_bytes()), text);
            }

            #[test]
            fn base64_survives_line_wrapping(data in proptest::collection::vec(any::<u8>(), 0..512)) {
                let encoded = encode_base64(&data);
                let wrapped = encoded
                    .as_bytes()
                    .chunks(76)
                    .map(|line| String::from_utf8_lossy(line).into_owned())
                    .collect::<Vec<_>>()
                    .join("\r\n");
                prop_assert_eq!(decode_base64(&wrapped).unwrap(), data);
            }
        }
    }
}
