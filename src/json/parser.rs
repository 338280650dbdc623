//! A bounded-depth, explicit-stack pushdown parser built on top of
//! [`tokenizer::Tokenizer`](crate::json::tokenizer::Tokenizer).
//!
//! The parser never recurses: every nested object/array is a frame pushed
//! onto `stack`, so a hostile or merely deep document is bounded by
//! `depth_limit` (default [`crate::constants::JSON_DEFAULT_DEPTH_LIMIT`])
//! rather than by the call stack.

use std::num::IntErrorKind;

use crate::bytestr::ByteString;
use crate::json::tokenizer::{Outcome as TokenOutcome, Token, Tokenizer};
use crate::json::{JsonArray, JsonObject, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done(Value),
    NeedMore,
    Malformed(String),
    TooManyLevels,
    /// An integer literal exceeded `i64`'s range. `true` means it
    /// overflowed the upper bound, `false` the lower bound.
    Overflow(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ObjStatus {
    ExpectKeyOrClose,
    ExpectColon,
    ExpectValue,
    ExpectCommaOrClose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ArrStatus {
    ExpectValueOrClose,
    ExpectCommaOrClose,
}

enum Frame {
    Object {
        obj: JsonObject,
        pending_key: Option<ByteString>,
        status: ObjStatus,
    },
    Array {
        arr: JsonArray,
        status: ArrStatus,
    },
}

/// Which container the top-level document must open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Object,
    Array,
}

pub struct Parser {
    tokenizer: Tokenizer,
    root_kind: RootKind,
    stack: Vec<Frame>,
    depth_limit: usize,
    started: bool,
    done: bool,
}

impl Parser {
    pub fn parse_object() -> Self {
        Parser::with_depth_limit(RootKind::Object, crate::constants::JSON_DEFAULT_DEPTH_LIMIT)
    }

    pub fn parse_array() -> Self {
        Parser::with_depth_limit(RootKind::Array, crate::constants::JSON_DEFAULT_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(root_kind: RootKind, depth_limit: usize) -> Self {
        Parser {
            tokenizer: Tokenizer::new(),
            root_kind,
            stack: Vec::with_capacity(depth_limit),
            depth_limit: depth_limit.max(1),
            started: false,
            done: false,
        }
    }

    /// Feeds a chunk of input, advancing the parse as far as possible.
    /// Call again with the next chunk on [`Outcome::NeedMore`]. Once
    /// [`Outcome::Done`] is returned the parser is finished; further calls
    /// are a caller error.
    pub fn feed(&mut self, input: &[u8]) -> (Outcome, usize) {
        debug_assert!(!self.done, "feed called again after a completed parse");
        let mut pos = 0usize;
        loop {
            let (token_outcome, consumed) = self.tokenizer.next_token(&input[pos..]);
            pos += consumed;
            let token = match token_outcome {
                TokenOutcome::Token(t) => t,
                TokenOutcome::NeedMore => return (Outcome::NeedMore, pos),
                TokenOutcome::InputEnd => return (Outcome::NeedMore, pos),
                TokenOutcome::Malformed(msg) => return (Outcome::Malformed(msg), pos),
                TokenOutcome::TextTooLong => {
                    return (
                        Outcome::Malformed("a lexeme exceeded the text accumulator".into()),
                        pos,
                    )
                }
            };

            match self.drive(token) {
                Ok(Some(value)) => {
                    self.done = true;
                    return (Outcome::Done(value), pos);
                }
                Ok(None) => continue,
                Err(Outcome::TooManyLevels) => return (Outcome::TooManyLevels, pos),
                Err(Outcome::Malformed(msg)) => return (Outcome::Malformed(msg), pos),
                Err(other) => return (other, pos),
            }
        }
    }

    fn drive(&mut self, token: Token) -> Result<Option<Value>, Outcome> {
        if !self.started {
            return self.drive_root(token);
        }
        match self.stack.last().expect("started implies a frame") {
            Frame::Object { status, .. } => self.drive_object(*status, token),
            Frame::Array { status, .. } => self.drive_array(*status, token),
        }
    }

    fn drive_root(&mut self, token: Token) -> Result<Option<Value>, Outcome> {
        match (self.root_kind, token) {
            (RootKind::Object, Token::OpenBrace) => {
                self.push_object()?;
                self.started = true;
                Ok(None)
            }
            (RootKind::Array, Token::OpenBracket) => {
                self.push_array()?;
                self.started = true;
                Ok(None)
            }
            _ => Err(Outcome::Malformed(format!(
                "document must start with a{}",
                match self.root_kind {
                    RootKind::Object => "n object",
                    RootKind::Array => " array",
                }
            ))),
        }
    }

    fn push_object(&mut self) -> Result<(), Outcome> {
        if self.stack.len() >= self.depth_limit {
            return Err(Outcome::TooManyLevels);
        }
        self.stack.push(Frame::Object {
            obj: JsonObject::new(),
            pending_key: None,
            status: ObjStatus::ExpectKeyOrClose,
        });
        Ok(())
    }

    fn push_array(&mut self) -> Result<(), Outcome> {
        if self.stack.len() >= self.depth_limit {
            return Err(Outcome::TooManyLevels);
        }
        self.stack.push(Frame::Array {
            arr: JsonArray::new(),
            status: ArrStatus::ExpectValueOrClose,
        });
        Ok(())
    }

    fn drive_object(&mut self, status: ObjStatus, token: Token) -> Result<Option<Value>, Outcome> {
        match status {
            ObjStatus::ExpectKeyOrClose => match token {
                Token::CloseBrace => self.close_current_frame(),
                Token::String(s) => {
                    if let Some(Frame::Object {
                        pending_key, status, ..
                    }) = self.stack.last_mut()
                    {
                        *pending_key = Some(s);
                        *status = ObjStatus::ExpectColon;
                    }
                    Ok(None)
                }
                other => Err(Outcome::Malformed(format!(
                    "expected an object key or '}}', found {:?}",
                    other
                ))),
            },
            ObjStatus::ExpectColon => match token {
                Token::Colon => {
                    if let Some(Frame::Object { status, .. }) = self.stack.last_mut() {
                        *status = ObjStatus::ExpectValue;
                    }
                    Ok(None)
                }
                other => Err(Outcome::Malformed(format!(
                    "expected ':', found {:?}",
                    other
                ))),
            },
            ObjStatus::ExpectValue => self.drive_value_position(token),
            ObjStatus::ExpectCommaOrClose => match token {
                Token::CloseBrace => self.close_current_frame(),
                Token::Comma => {
                    if let Some(Frame::Object { status, .. }) = self.stack.last_mut() {
                        *status = ObjStatus::ExpectKeyOrClose;
                    }
                    Ok(None)
                }
                other => Err(Outcome::Malformed(format!(
                    "expected ',' or '}}', found {:?}",
                    other
                ))),
            },
        }
    }

    fn drive_array(&mut self, status: ArrStatus, token: Token) -> Result<Option<Value>, Outcome> {
        match status {
            ArrStatus::ExpectValueOrClose => match token {
                Token::CloseBracket => self.close_current_frame(),
                other => self.drive_value_position(other),
            },
            ArrStatus::ExpectCommaOrClose => match token {
                Token::CloseBracket => self.close_current_frame(),
                Token::Comma => {
                    if let Some(Frame::Array { status, .. }) = self.stack.last_mut() {
                        *status = ArrStatus::ExpectValueOrClose;
                    }
                    Ok(None)
                }
                other => Err(Outcome::Malformed(format!(
                    "expected ',' or ']', found {:?}",
                    other
                ))),
            },
        }
    }

    /// Handles a token appearing where a value is expected: either a
    /// scalar (attached immediately) or the opening of a nested container
    /// (pushed as a new frame). `Token::Null` always produces `Value::Null`
    /// here, in an array element position as much as an object value
    /// position — there is no implicit coercion to `Value::Bool(false)`.
    fn drive_value_position(&mut self, token: Token) -> Result<Option<Value>, Outcome> {
        match token {
            Token::OpenBrace => {
                self.push_object()?;
                Ok(None)
            }
            Token::OpenBracket => {
                self.push_array()?;
                Ok(None)
            }
            Token::String(s) => self.attach(Value::Str(s)),
            Token::Integer(text) => self.attach(parse_integer(&text)?),
            Token::Number(text) => self.attach(parse_float(&text)?),
            Token::True => self.attach(Value::Bool(true)),
            Token::False => self.attach(Value::Bool(false)),
            Token::Null => self.attach(Value::Null),
            other => Err(Outcome::Malformed(format!(
                "expected a value, found {:?}",
                other
            ))),
        }
    }

    fn close_current_frame(&mut self) -> Result<Option<Value>, Outcome> {
        let frame = self.stack.pop().expect("close called with an open frame");
        let value = match frame {
            Frame::Object { obj, .. } => Value::Object(obj),
            Frame::Array { arr, .. } => Value::Array(arr),
        };
        self.attach(value)
    }

    fn attach(&mut self, value: Value) -> Result<Option<Value>, Outcome> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(Frame::Object {
                obj,
                pending_key,
                status,
            }) => {
                let key = pending_key
                    .take()
                    .expect("a completed value always has a pending key");
                obj.set(key, value)
                    .map_err(|e| Outcome::Malformed(e.to_string()))?;
                *status = ObjStatus::ExpectCommaOrClose;
                Ok(None)
            }
            Some(Frame::Array { arr, status }) => {
                arr.push(value)
                    .map_err(|e| Outcome::Malformed(e.to_string()))?;
                *status = ArrStatus::ExpectCommaOrClose;
                Ok(None)
            }
        }
    }
}

fn parse_integer(text: &str) -> Result<Value, Outcome> {
    match text.parse::<i64>() {
        Ok(v) => Ok(Value::Int(v)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Err(Outcome::Overflow(true)),
            IntErrorKind::NegOverflow => Err(Outcome::Overflow(false)),
            _ => Err(Outcome::Malformed(format!("invalid integer literal {}", text))),
        },
    }
}

fn parse_float(text: &str) -> Result<Value, Outcome> {
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| Outcome::Malformed(format!("invalid numeric literal {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_object_str(s: &str) -> Outcome {
        let mut parser = Parser::parse_object();
        let bytes = s.as_bytes();
        let (outcome, consumed) = parser.feed(bytes);
        if matches!(outcome, Outcome::NeedMore) {
            let (outcome2, _) = parser.feed(&bytes[consumed..]);
            return outcome2;
        }
        outcome
    }

    #[test]
    fn parses_flat_object() {
        let outcome = parse_object_str(r#"{"a":1,"b":"two","c":true,"d":null}"#);
        match outcome {
            Outcome::Done(Value::Object(obj)) => {
                assert_eq!(obj.get(b"a"), Some(&Value::Int(1)));
                assert_eq!(obj.get(b"b").unwrap().as_str().unwrap().as_str().unwrap(), "two");
                assert_eq!(obj.get(b"c"), Some(&Value::Bool(true)));
                assert_eq!(obj.get(b"d"), Some(&Value::Null));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn null_in_array_element_is_null_not_false() {
        let mut parser = Parser::parse_array();
        let (outcome, _) = parser.feed(br#"[null, false, null]"#);
        match outcome {
            Outcome::Done(Value::Array(arr)) => {
                assert_eq!(arr.get(0), Some(&Value::Null));
                assert_eq!(arr.get(1), Some(&Value::Bool(false)));
                assert_eq!(arr.get(2), Some(&Value::Null));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn nested_containers_respect_depth_limit() {
        let mut parser = Parser::with_depth_limit(RootKind::Array, 2);
        let (outcome, _) = parser.feed(b"[[[]]]");
        assert_eq!(outcome, Outcome::TooManyLevels);
    }

    #[test]
    fn resumes_across_chunks() {
        let mut parser = Parser::parse_object();
        let (outcome, consumed) = parser.feed(br#"{"a":"hel"#);
        assert_eq!(outcome, Outcome::NeedMore);
        let (outcome, _) = parser.feed(br#"lo"}"#);
        match outcome {
            Outcome::Done(Value::Object(obj)) => {
                assert_eq!(
                    obj.get(b"a").unwrap().as_str().unwrap().as_str().unwrap(),
                    "hello"
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let _ = consumed;
    }

    #[test]
    fn rejects_mismatched_root_kind() {
        let mut parser = Parser::parse_object();
        let (outcome, _) = parser.feed(b"[]");
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }

    #[test]
    fn positive_integer_overflow_is_reported_as_upper_bound() {
        let mut parser = Parser::parse_array();
        let (outcome, _) = parser.feed(b"[99999999999999999999999]");
        assert_eq!(outcome, Outcome::Overflow(true));
    }

    #[test]
    fn negative_integer_overflow_is_reported_as_lower_bound() {
        let mut parser = Parser::parse_array();
        let (outcome, _) = parser.feed(b"[-99999999999999999999999]");
        assert_eq!(outcome, Outcome::Overflow(false));
    }
}
