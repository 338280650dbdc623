//! A pushdown formatter, symmetric to [`parser::Parser`](crate::json::parser::Parser):
//! it walks a [`Value`] tree with an explicit frame stack (so its own
//! nesting depth, unlike the parser's, is bounded only by the depth of the
//! tree already resident in memory) and drains its output through
//! caller-supplied buffers of any size. A buffer that is too small to hold
//! the next atomic token (a whole string, a whole number) is not an error:
//! [`Outcome::OutOfBuffer`] just means "call again with a fresh buffer, I
//! have more queued."

use crate::bytestr::ByteString;
use crate::json::{JsonArray, JsonObject, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    OutOfBuffer,
}

enum Frame<'v> {
    Object {
        iter: Box<dyn Iterator<Item = (&'v ByteString, &'v Value)> + 'v>,
        first: bool,
        depth: usize,
    },
    Array {
        iter: Box<dyn Iterator<Item = &'v Value> + 'v>,
        first: bool,
        depth: usize,
    },
}

/// Formatting options. Pretty-printing and escaping everything outside
/// ASCII both default to off, matching a wire-compact encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub pretty: bool,
    pub escape_non_ascii: bool,
}

pub struct Formatter<'v> {
    root: Option<&'v Value>,
    stack: Vec<Frame<'v>>,
    pending: Vec<u8>,
    pending_pos: usize,
    finished: bool,
    options: Options,
}

impl<'v> Formatter<'v> {
    pub fn new(value: &'v Value) -> Self {
        Formatter::with_options(value, Options::default())
    }

    pub fn with_options(value: &'v Value, options: Options) -> Self {
        Formatter {
            root: Some(value),
            stack: Vec::new(),
            pending: Vec::new(),
            pending_pos: 0,
            finished: false,
            options,
        }
    }

    /// Writes as much of the document as fits in `out`, returning how many
    /// bytes were written. Call again with a fresh buffer while the
    /// outcome is [`Outcome::OutOfBuffer`].
    pub fn write(&mut self, out: &mut [u8]) -> (Outcome, usize) {
        let mut written = 0usize;
        loop {
            if self.pending_pos < self.pending.len() {
                let avail = out.len() - written;
                if avail == 0 {
                    return (Outcome::OutOfBuffer, written);
                }
                let n = avail.min(self.pending.len() - self.pending_pos);
                out[written..written + n]
                    .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                written += n;
                self.pending_pos += n;
                if self.pending_pos < self.pending.len() {
                    return (Outcome::OutOfBuffer, written);
                }
                self.pending.clear();
                self.pending_pos = 0;
            }
            if self.finished {
                return (Outcome::Done, written);
            }
            self.advance();
        }
    }

    /// Renders the whole document into an owned buffer, growing it as
    /// needed. Convenience wrapper for callers that don't care about
    /// bounded-memory streaming.
    pub fn to_vec(value: &Value, options: Options) -> Vec<u8> {
        let mut fmt = Formatter::with_options(value, options);
        let mut out = vec![0u8; 256];
        let mut total = 0usize;
        loop {
            let (outcome, written) = fmt.write(&mut out[total..]);
            total += written;
            match outcome {
                Outcome::Done => {
                    out.truncate(total);
                    return out;
                }
                Outcome::OutOfBuffer => {
                    let new_len = out.len() * 2;
                    out.resize(new_len, 0);
                }
            }
        }
    }

    fn advance(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            match frame {
                Frame::Object { iter, first, depth } => {
                    let depth = *depth;
                    let next = iter.next();
                    match next {
                        Some((k, v)) => {
                            let was_first = *first;
                            if let Some(Frame::Object { first, .. }) = self.stack.last_mut() {
                                *first = false;
                            }
                            if !was_first {
                                self.pending.push(b',');
                            }
                            self.write_indent(depth);
                            write_escaped_string(&mut self.pending, k.as_bytes(), self.options);
                            self.pending.push(b':');
                            if self.options.pretty {
                                self.pending.push(b' ');
                            }
                            self.emit_child(v, depth);
                        }
                        None => {
                            self.stack.pop();
                            if depth > 0 {
                                self.write_indent(depth - 1);
                            }
                            self.pending.push(b'}');
                            self.after_close();
                        }
                    }
                }
                Frame::Array { iter, first, depth } => {
                    let depth = *depth;
                    let next = iter.next();
                    match next {
                        Some(v) => {
                            let was_first = *first;
                            if let Some(Frame::Array { first, .. }) = self.stack.last_mut() {
                                *first = false;
                            }
                            if !was_first {
                                self.pending.push(b',');
                            }
                            self.write_indent(depth);
                            self.emit_child(v, depth);
                        }
                        None => {
                            self.stack.pop();
                            if depth > 0 {
                                self.write_indent(depth - 1);
                            }
                            self.pending.push(b']');
                            self.after_close();
                        }
                    }
                }
            }
            return;
        }

        match self.root.take() {
            Some(v) => self.emit_child(v, 0),
            None => self.finished = true,
        }
    }

    fn after_close(&mut self) {
        if self.stack.is_empty() {
            self.finished = true;
        }
    }

    fn emit_child(&mut self, v: &'v Value, depth: usize) {
        match v {
            Value::Object(o) => {
                self.pending.push(b'{');
                if o.is_empty() {
                    self.pending.push(b'}');
                    self.after_close_inline();
                } else {
                    self.stack.push(Frame::Object {
                        iter: Box::new(o.iter()),
                        first: true,
                        depth: depth + 1,
                    });
                }
            }
            Value::Array(a) => {
                self.pending.push(b'[');
                if a.is_empty() {
                    self.pending.push(b']');
                    self.after_close_inline();
                } else {
                    self.stack.push(Frame::Array {
                        iter: Box::new(a.iter()),
                        first: true,
                        depth: depth + 1,
                    });
                }
            }
            scalar => write_scalar(&mut self.pending, scalar, self.options),
        }
    }

    /// Handles the empty-container fast path: both brackets were written
    /// immediately above without pushing a frame, so closing bookkeeping
    /// runs here instead of in `advance`'s `None` arm.
    fn after_close_inline(&mut self) {
        if self.stack.is_empty() && self.root.is_none() {
            self.finished = true;
        }
    }

    fn write_indent(&mut self, depth: usize) {
        if !self.options.pretty {
            return;
        }
        self.pending.push(b'\n');
        for _ in 0..depth {
            self.pending.push(b' ');
            self.pending.push(b' ');
        }
    }
}

fn write_scalar(out: &mut Vec<u8>, v: &Value, options: Options) {
    match v {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Float(f) => out.extend_from_slice(format!("{f:.6}").as_bytes()),
        Value::Str(s) => write_escaped_string(out, s.as_bytes(), options),
        Value::Object(_) | Value::Array(_) => unreachable!("containers go through emit_child"),
    }
}

fn write_escaped_string(out: &mut Vec<u8>, bytes: &[u8], options: Options) {
    out.push(b'"');
    match std::str::from_utf8(bytes) {
        Ok(s) => {
            for c in s.chars() {
                write_escaped_char(out, c, options.escape_non_ascii);
            }
        }
        Err(_) => {
            // Not valid UTF-8: pass the raw bytes through unescaped rather
            // than corrupt them by guessing at codepoint boundaries.
            out.extend_from_slice(bytes);
        }
    }
    out.push(b'"');
}

fn write_escaped_char(out: &mut Vec<u8>, c: char, escape_non_ascii: bool) {
    match c {
        '"' => out.extend_from_slice(b"\\\""),
        '\\' => out.extend_from_slice(b"\\\\"),
        '\u{08}' => out.extend_from_slice(b"\\b"),
        '\u{0C}' => out.extend_from_slice(b"\\f"),
        '\n' => out.extend_from_slice(b"\\n"),
        '\r' => out.extend_from_slice(b"\\r"),
        '\t' => out.extend_from_slice(b"\\t"),
        c if (c as u32) < 0x20 => {
            out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
        }
        c if escape_non_ascii && !c.is_ascii() => {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.extend_from_slice(format!("\\u{:04x}", unit).as_bytes());
            }
        }
        c => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parser::Parser;

    fn roundtrip(src: &str) -> Value {
        let mut parser = Parser::parse_object();
        let (outcome, _) = parser.feed(src.as_bytes());
        match outcome {
            crate::json::parser::Outcome::Done(v) => v,
            other => panic!("unexpected parse outcome: {:?}", other),
        }
    }

    #[test]
    fn compact_roundtrip() {
        let value = roundtrip(r#"{"a":1,"b":[1,2,3],"c":null}"#);
        let rendered = Formatter::to_vec(&value, Options::default());
        let rendered_str = String::from_utf8(rendered).unwrap();
        assert_eq!(rendered_str, r#"{"a":1,"b":[1,2,3],"c":null}"#);
    }

    #[test]
    fn empty_containers() {
        let value = roundtrip(r#"{"a":{},"b":[]}"#);
        let rendered = String::from_utf8(Formatter::to_vec(&value, Options::default())).unwrap();
        assert_eq!(rendered, r#"{"a":{},"b":[]}"#);
    }

    #[test]
    fn small_buffer_forces_multiple_writes() {
        let value = roundtrip(r#"{"k":"a pretty long string value to overflow a tiny buffer"}"#);
        let mut fmt = Formatter::new(&value);
        let mut out = [0u8; 8];
        let mut total = Vec::new();
        loop {
            let (outcome, n) = fmt.write(&mut out);
            total.extend_from_slice(&out[..n]);
            if outcome == Outcome::Done {
                break;
            }
        }
        assert_eq!(
            String::from_utf8(total).unwrap(),
            r#"{"k":"a pretty long string value to overflow a tiny buffer"}"#
        );
    }

    #[test]
    fn escapes_control_and_quote_characters() {
        let v = Value::Str("line\n\"quoted\"\ttab".into());
        let rendered = String::from_utf8(Formatter::to_vec(&v, Options::default())).unwrap();
        assert_eq!(rendered, r#""line\n\"quoted\"\ttab""#);
    }

    #[test]
    fn floats_render_fixed_point_with_six_decimals() {
        let v = Value::Float(456.456);
        let rendered = String::from_utf8(Formatter::to_vec(&v, Options::default())).unwrap();
        assert_eq!(rendered, "456.456000");
    }

    #[test]
    fn pretty_printing_indents_nested_objects() {
        let value = roundtrip(r#"{"a":{"b":1}}"#);
        let rendered = String::from_utf8(Formatter::to_vec(
            &value,
            Options {
                pretty: true,
                escape_non_ascii: false,
            },
        ))
        .unwrap();
        assert!(rendered.contains("\n  \"a\": {\n    \"b\": 1\n  }\n"));
    }
}
