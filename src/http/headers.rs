//! A case-insensitive header map, and a byte-at-a-time response
//! preamble parser built against it.
//!
//! `reqwest` already parses status lines and headers for every real call
//! this crate makes; [`HeaderParser`] exists anyway because the documented
//! transport contract is defined against a raw, per-line header callback,
//! and that contract is worth testing on its own rather than only
//! indirectly through whatever `reqwest` happens to do.

use crate::error::{Error, ErrorKind, Result};

/// An ordered header list with case-insensitive name lookup. Multiple
/// headers with the same name (case-insensitively) are preserved in
/// insertion order, matching HTTP's own multi-value semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        HeaderMap::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHead {
    pub http_version: String,
    pub status_code: u16,
    pub reason: String,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StatusLine {
        http_version: String,
        status_code: u16,
        reason: String,
    },
    Header {
        name: String,
        value: String,
    },
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Parsing,
    Done,
}

/// Fed one byte at a time (matching a transport's per-line callback,
/// which in practice hands over a buffer that may split anywhere). Yields
/// one [`Event`] per completed line.
pub struct HeaderParser {
    state: State,
    line_buf: Vec<u8>,
    got_status_line: bool,
}

impl Default for HeaderParser {
    fn default() -> Self {
        HeaderParser::new()
    }
}

impl HeaderParser {
    pub fn new() -> Self {
        HeaderParser {
            state: State::Parsing,
            line_buf: Vec::with_capacity(128),
            got_status_line: false,
        }
    }

    pub fn feed_byte(&mut self, b: u8) -> Result<Option<Event>> {
        if self.state == State::Done {
            return Ok(None);
        }
        if b != b'\n' {
            self.line_buf.push(b);
            return Ok(None);
        }
        let mut line = std::mem::take(&mut self.line_buf);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.is_empty() {
            self.state = State::Done;
            return Ok(Some(Event::End));
        }
        if !self.got_status_line {
            self.got_status_line = true;
            parse_status_line(&line).map(Some)
        } else {
            parse_header_line(&line).map(Some)
        }
    }

    /// Feeds a whole preamble (status line + headers + terminating blank
    /// line) and assembles the result, for callers that already have the
    /// bytes in hand rather than a byte-at-a-time callback.
    pub fn parse_all(bytes: &[u8]) -> Result<ResponseHead> {
        let mut parser = HeaderParser::new();
        let mut http_version = None;
        let mut status_code = None;
        let mut reason = None;
        let mut headers = HeaderMap::new();
        for &b in bytes {
            match parser.feed_byte(b)? {
                Some(Event::StatusLine {
                    http_version: v,
                    status_code: c,
                    reason: r,
                }) => {
                    http_version = Some(v);
                    status_code = Some(c);
                    reason = Some(r);
                }
                Some(Event::Header { name, value }) => headers.insert(name, value),
                Some(Event::End) => break,
                None => {}
            }
        }
        Ok(ResponseHead {
            http_version: http_version.ok_or_else(|| {
                Error::new(ErrorKind::HttpInvalidHeaderSyntax, "missing status line")
            })?,
            status_code: status_code
                .ok_or_else(|| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "missing status code"))?,
            reason: reason.unwrap_or_default(),
            headers,
        })
    }
}

fn parse_status_line(line: &[u8]) -> Result<Event> {
    let line = std::str::from_utf8(line)
        .map_err(|_| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "status line is not UTF-8"))?;
    let mut parts = line.splitn(3, ' ');
    let http_version = parts
        .next()
        .ok_or_else(|| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "empty status line"))?
        .to_string();
    let status_code: u16 = parts
        .next()
        .ok_or_else(|| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "missing status code"))?
        .parse()
        .map_err(|_| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "non-numeric status code"))?;
    let reason = parts.next().unwrap_or("").to_string();
    Ok(Event::StatusLine {
        http_version,
        status_code,
        reason,
    })
}

fn parse_header_line(line: &[u8]) -> Result<Event> {
    let line = std::str::from_utf8(line)
        .map_err(|_| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "header line is not UTF-8"))?;
    let colon = line
        .find(':')
        .ok_or_else(|| Error::new(ErrorKind::HttpInvalidHeaderSyntax, "header line missing ':'"))?;
    let name = line[..colon].trim().to_string();
    let value = line[colon + 1..].trim().to_string();
    Ok(Event::Header { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_line_and_headers() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nX-Reqid: abc\r\n\r\n";
        let head = HeaderParser::parse_all(raw).unwrap();
        assert_eq!(head.http_version, "HTTP/1.1");
        assert_eq!(head.status_code, 200);
        assert_eq!(head.reason, "OK");
        assert_eq!(head.headers.get("content-type"), Some("application/json"));
        assert_eq!(head.headers.get("X-REQID"), Some("abc"));
    }

    #[test]
    fn rejects_missing_status_code() {
        let raw = b"HTTP/1.1\r\n\r\n";
        assert!(HeaderParser::parse_all(raw).is_err());
    }

    #[test]
    fn byte_at_a_time_feed_resumes_across_calls() {
        let mut parser = HeaderParser::new();
        let mut events = Vec::new();
        for &b in b"HTTP/1.1 404 Not Found\r\nA: b\r\n\r\n" {
            if let Some(ev) = parser.feed_byte(b).unwrap() {
                events.push(ev);
            }
        }
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], Event::End));
    }
}
