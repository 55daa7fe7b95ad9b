//! Framed I/O for IMAP protocol.
//!
//! IMAP uses CRLF-terminated lines with support for literals.
//! This module provides buffered blocking reads and writes with proper
//! handling of the IMAP framing.

use std::io::{self, BufRead, BufReader, Read, Write};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Framed connection for IMAP protocol.
///
/// Handles line-based reading with literal support and unbuffered writing.
#[derive(Debug)]
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S: Read + Write> FramedStream<S> {
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
        }
    }

    /// Reads a complete IMAP response, handling literals.
    ///
    /// IMAP responses can contain literals in the format `{n}\r\n<n bytes>`.
    /// This method reads the entire response including any embedded literals.
    ///
    /// # Errors
    ///
    /// Returns an I/O error on read failure or EOF, and `Error::Protocol`
    /// when a line or literal exceeds the size limits.
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            let line = self.read_line()?;
            response.extend_from_slice(&line);

            let Some(literal_len) = parse_literal_length(&line) else {
                break;
            };
            if literal_len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let start = response.len();
            response.resize(start + literal_len, 0);
            self.reader.read_exact(&mut response[start..])?;
        }

        Ok(response)
    }

    /// Reads a single CRLF-terminated line.
    fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            // A CR may end one read and its LF start the next.
            if line.last() == Some(&b'\r') && buf[0] == b'\n' {
                line.push(b'\n');
                self.reader.consume(1);
                break;
            }

            if let Some(pos) = find_crlf(buf) {
                line.extend_from_slice(&buf[..pos + 2]);
                self.reader.consume(pos + 2);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }

        Ok(line)
    }

    /// Writes a serialized command and flushes it.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Any buffered data is lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal length from the end of a line.
///
/// Matches patterns like `{123}\r\n` or `{123+}\r\n` (non-synchronizing).
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;
    let line = line.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Returns true if a framed response is the tagged completion for `tag`.
pub fn is_tagged(response: &[u8], tag: &str) -> bool {
    response
        .strip_prefix(tag.as_bytes())
        .is_some_and(|rest| rest.first() == Some(&b' '))
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
    use std::io::Cursor;

    use super::*;

    /// Reads from a fixed script in small chunks and records writes.
    struct Chunked {
        input: Cursor<Vec<u8>>,
        chunk: usize,
        written: Vec<u8>,
    }

    impl Chunked {
        fn new(input: &[u8], chunk: usize) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                chunk,
                written: Vec::new(),
            }
        }
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk);
            self.input.read(&mut buf[..n])
        }
    }

    impl Write for Chunked {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"hello\r\n"), Some(5));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"no newline"), None);
        assert_eq!(find_crlf(b"just\n"), None);
    }

    #[test]
    fn test_parse_literal_length() {
        assert_eq!(parse_literal_length(b"BODY {123}\r\n"), Some(123));
        assert_eq!(parse_literal_length(b"BODY {123+}\r\n"), Some(123));
        assert_eq!(parse_literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(parse_literal_length(b"no literal\r\n"), None);
        assert_eq!(parse_literal_length(b"incomplete {123"), None);
        assert_eq!(parse_literal_length(b"wrong {abc}\r\n"), None);
        assert_eq!(parse_literal_length(b"empty {}\r\n"), None);
    }

    #[test]
    fn test_read_simple_line() {
        let mut framed = FramedStream::new(Chunked::new(b"* OK ready\r\n", 64));
        assert_eq!(framed.read_response().unwrap(), b"* OK ready\r\n");
    }

    #[test]
    fn test_read_with_literal() {
        let mut framed = FramedStream::new(Chunked::new(b"* 1 FETCH (BODY {5}\r\nhello)\r\n", 64));
        assert_eq!(
            framed.read_response().unwrap(),
            b"* 1 FETCH (BODY {5}\r\nhello)\r\n"
        );
    }

    #[test]
    fn test_literal_containing_crlf() {
        let input = b"* 1 FETCH (BODY[] {7}\r\na\r\nb\r\n\r)\r\nA1 OK\r\n";
        let mut framed = FramedStream::new(Chunked::new(input, 3));
        assert_eq!(
            framed.read_response().unwrap(),
            b"* 1 FETCH (BODY[] {7}\r\na\r\nb\r\n\r)\r\n"
        );
        assert_eq!(framed.read_response().unwrap(), b"A1 OK\r\n");
    }

    #[test]
    fn test_crlf_split_across_reads() {
        let mut framed = FramedStream::new(Chunked::new(b"* OK\r\n* BYE\r\n", 5));
        assert_eq!(framed.read_response().unwrap(), b"* OK\r\n");
        assert_eq!(framed.read_response().unwrap(), b"* BYE\r\n");
    }

    #[test]
    fn test_eof_is_an_error() {
        let mut framed = FramedStream::new(Chunked::new(b"* OK partial", 64));
        assert!(matches!(framed.read_response(), Err(Error::Io(_))));
    }

    #[test]
    fn test_literal_size_validation() {
        let header = format!("* 1 FETCH (BODY {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mut framed = FramedStream::new(Chunked::new(header.as_bytes(), 64));
        let err = framed.read_response().unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[test]
    fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mut framed = FramedStream::new(Chunked::new(long_line.as_bytes(), DEFAULT_BUFFER_SIZE));
        let err = framed.read_response().unwrap_err();
        assert!(err.to_string().contains("line too long"));
    }

    #[test]
    fn test_write_command() {
        let mut framed = FramedStream::new(Chunked::new(b"", 64));
        framed.write_command(b"A001 NOOP\r\n").unwrap();
        assert_eq!(framed.into_inner().written, b"A001 NOOP\r\n");
    }

    #[test]
    fn test_is_tagged() {
        assert!(is_tagged(b"A0001 OK done\r\n", "A0001"));
        assert!(!is_tagged(b"A00011 OK done\r\n", "A0001"));
        assert!(!is_tagged(b"* OK untagged\r\n", "A0001"));
    }
}
