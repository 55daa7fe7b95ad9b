//! Content-Transfer-Encoding handling for fetched body parts.

use std::fmt;

use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    #[default]
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Reverses this transfer encoding.
    ///
    /// Malformed encoded data is returned unchanged.
    #[must_use]
    pub fn decode(self, data: &[u8]) -> Vec<u8> {
        let decoded = match self {
            Self::Base64 => decode_base64(&String::from_utf8_lossy(data)),
            Self::QuotedPrintable => decode_quoted_printable(data),
            Self::SevenBit | Self::EightBit | Self::Binary => return data.to_vec(),
        };
        decoded.unwrap_or_else(|_| data.to_vec())
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Decodes a fetched text part to a string.
///
/// Reverses the transfer encoding, then converts from `charset`.
#[must_use]
pub fn decode_text_part(data: &[u8], encoding: TransferEncoding, charset: Option<&str>) -> String {
    decode_charset(&encoding.decode(data), charset)
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

    #[test]
    fn parse_known_encodings() {
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse(" quoted-printable "),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("8bit"), TransferEncoding::EightBit);
        assert_eq!(TransferEncoding::parse("binary"), TransferEncoding::Binary);
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::SevenBit);
    }

    #[test]
    fn display() {
        assert_eq!(TransferEncoding::QuotedPrintable.to_string(), "quoted-printable");
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn decode_base64_part() {
        let decoded = TransferEncoding::Base64.decode(b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n");
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn malformed_part_is_returned_unchanged() {
        assert_eq!(TransferEncoding::Base64.decode(b"%%%"), b"%%%");
        assert_eq!(TransferEncoding::QuotedPrintable.decode(b"a=Z"), b"a=Z");
    }

    #[test]
    fn text_part_with_charset() {
        let text = decode_text_part(b"caf=E9", TransferEncoding::QuotedPrintable, Some("iso-8859-1"));
        assert_eq!(text, "café");

        let text = decode_text_part("plain ü".as_bytes(), TransferEncoding::EightBit, None);
        assert_eq!(text, "plain ü");
    }
}
