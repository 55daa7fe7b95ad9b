//! # mailgate-mime
//!
//! Decoding helpers for the data an IMAP server hands back.
//!
//! ## Features
//!
//! - **Header decoding**: RFC 2047 encoded words, per segment, never failing
//! - **Transfer encodings**: Base64 and Quoted-Printable body parts
//! - **Charsets**: Any WHATWG charset label, lossy on malformed input
//! - **Mailbox names**: Modified UTF-7 (RFC 3501 section 5.1.3)
//!
//! ## Quick Start
//!
//! ```
//! use mailgate_mime::encoding::decode_header;
//! use mailgate_mime::utf7::decode_mailbox_name;
//!
//! assert_eq!(decode_header(b"=?UTF-8?B?SGVsbG8gV29ybGQ=?="), "Hello World");
//! assert_eq!(decode_mailbox_name("Entw&APw-rfe"), "Entwürfe");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod transfer;

pub mod encoding;
pub mod utf7;

pub use error::{Error, Result};
pub use transfer::{TransferEncoding, decode_text_part};
