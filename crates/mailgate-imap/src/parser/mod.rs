//! IMAP response parsing.
//!
//! The response grammar is handled by `imap-proto`; this module wraps its
//! entry point and converts the borrowed values it produces into owned
//! types that outlive the read buffer.
//!
//! # Example
//!
//! ```
//! use mailgate_imap::parser::parse_response;
//!
//! let response = parse_response(b"* OK IMAP4rev1 server ready\r\n").unwrap();
//! assert!(matches!(response, imap_proto::Response::Data { .. }));
//! ```

mod convert;
mod types;

pub(crate) use convert::{capability, copy_uid, fetch_record, list_response, status_items};
pub use types::{
    Address, BodyPart, BodyStructure, Disposition, Envelope, FetchMap, FetchRecord, StatusItem,
};

use crate::error::{Error, Result};

/// Parses one complete response, including any literals it carries.
///
/// # Errors
///
/// Returns `Error::Parse` if the bytes are not a well-formed response or
/// are followed by trailing data.
pub fn parse_response(input: &[u8]) -> Result<imap_proto::Response<'_>> {
    match imap_proto::Response::from_bytes(input) {
        Ok((rest, response)) if rest.is_empty() => Ok(response),
        Ok((rest, _)) => Err(Error::Parse {
            position: input.len() - rest.len(),
            message: "trailing data after response".to_string(),
        }),
        Err(err) => Err(Error::Parse {
            position: 0,
            message: format!("{err:?}: {}", String::from_utf8_lossy(truncate(input))),
        }),
    }
}

fn truncate(input: &[u8]) -> &[u8] {
    &input[..input.len().min(120)]
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
    use imap_proto::{Response, Status};

    use super::*;

    #[test]
    fn tagged_completion() {
        let resp = parse_response(b"A0001 NO [TRYCREATE] Mailbox does not exist\r\n").unwrap();
        match resp {
            Response::Done {
                tag,
                status,
                information,
                ..
            } => {
                assert_eq!(tag.0, "A0001");
                assert_eq!(status, Status::No);
                assert_eq!(information.as_deref(), Some("Mailbox does not exist"));
            }
            other => panic!("expected tagged response, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_response(b"\x00\x01 nonsense\r\n").unwrap_err();
        assert!(matches!(err, Error::Parse { position: 0, .. }));
    }

    #[test]
    fn trailing_data_is_rejected() {
        let err = parse_response(b"* 3 EXISTS\r\n* 0 RECENT\r\n").unwrap_err();
        assert!(matches!(err, Error::Parse { position: 12, .. }));
    }
}
